//! Types de données pour le crate formations

use std::collections::HashMap;
use std::fmt;

/// Sentinelle "non spécifié", distincte d'une valeur absente
pub const NON_SPECIFIE: &str = "Non spécifié";

/// Table normalisée: noms de colonnes uniques et lignes brutes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Noms de colonnes normalisés, dans l'ordre de première apparition
    pub columns: Vec<String>,

    /// Lignes de la table
    pub rows: Vec<RawRecord>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Une ligne source: nom de colonne normalisé -> valeur texte
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// Insère une valeur (la dernière colonne vue l'emporte en cas de collision)
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Valeur d'un champ, `None` si absent ou vide
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::default();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Provinces wallonnes (ensemble fermé) et sentinelle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Province {
    Hainaut,
    Liege,
    Namur,
    Luxembourg,
    BrabantWallon,
    NonSpecifie,
}

impl Province {
    /// Les cinq provinces, dans l'ordre de recherche textuelle
    pub const ALL: [Province; 5] = [
        Province::Hainaut,
        Province::Liege,
        Province::Namur,
        Province::Luxembourg,
        Province::BrabantWallon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Province::Hainaut => "Hainaut",
            Province::Liege => "Liège",
            Province::Namur => "Namur",
            Province::Luxembourg => "Luxembourg",
            Province::BrabantWallon => "Brabant wallon",
            Province::NonSpecifie => NON_SPECIFIE,
        }
    }

    /// Retrouve une province depuis son nom (insensible à la casse)
    ///
    /// La sentinelle n'est pas reconnue: un nom hors des cinq provinces
    /// donne `None`.
    pub fn from_name(name: &str) -> Option<Province> {
        let needle = name.trim().to_lowercase();
        Province::ALL
            .into_iter()
            .find(|p| p.name().to_lowercase() == needle)
    }

    pub fn is_specified(&self) -> bool {
        *self != Province::NonSpecifie
    }

    /// Centroïde approximatif (lat, lon) utilisé pour la carte
    pub fn centroid(&self) -> Option<(f64, f64)> {
        match self {
            Province::Hainaut => Some((50.4, 3.8)),
            Province::Liege => Some((50.6, 5.6)),
            Province::Namur => Some((50.5, 4.9)),
            Province::Luxembourg => Some((50.0, 5.5)),
            Province::BrabantWallon => Some((50.7, 4.6)),
            Province::NonSpecifie => None,
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catégorie de durée issue des drapeaux courte/moyenne/longue
///
/// Indépendante de `duree_heures`: les deux peuvent se contredire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategorieDuree {
    Courte,
    Moyenne,
    Longue,
    NonSpecifie,
}

impl CategorieDuree {
    pub const ALL: [CategorieDuree; 4] = [
        CategorieDuree::Courte,
        CategorieDuree::Moyenne,
        CategorieDuree::Longue,
        CategorieDuree::NonSpecifie,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CategorieDuree::Courte => "Courte",
            CategorieDuree::Moyenne => "Moyenne",
            CategorieDuree::Longue => "Longue",
            CategorieDuree::NonSpecifie => NON_SPECIFIE,
        }
    }

    pub fn from_label(label: &str) -> Option<CategorieDuree> {
        let needle = label.trim().to_lowercase();
        CategorieDuree::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == needle)
    }
}

impl fmt::Display for CategorieDuree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coordonnées WGS84, toujours complètes (jamais de latitude sans longitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Une formation normalisée, éventuellement enrichie
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    /// Ligne source complète
    pub record: RawRecord,

    /// Texte de localisation (champ logique `localisation`)
    pub localisation: Option<String>,

    /// Province devinée depuis le texte, avant tout enrichissement
    pub province_extraite: Option<Province>,

    /// Province finale (après complément par le référentiel)
    pub province: Option<Province>,

    /// Durée normalisée en heures
    pub duree_heures: Option<u64>,

    /// Catégorie de durée (absente si les drapeaux ne sont pas tous présents)
    pub categorie_duree: Option<CategorieDuree>,

    pub ville: Option<String>,
    pub arrondissement: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Formation {
    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }
}
