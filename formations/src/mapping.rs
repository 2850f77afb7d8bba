//! Résolution des champs logiques vers les colonnes réellement présentes

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::types::RawRecord;

/// Valeur "vraie" des drapeaux booléens de la source
pub const OUI: &str = "OUI";
/// Valeur "fausse" des drapeaux booléens de la source
pub const NON: &str = "NON";

/// Champ logique attendu dans la table principale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Concept {
    Intitule,
    Organisme,
    Denomination,
    Domaine,
    Public,
    Modalite,
    Localisation,
    Duree,
    Courte,
    Moyenne,
    Longue,
    Qualifiante,
    Certifiante,
}

impl Concept {
    pub const ALL: [Concept; 13] = [
        Concept::Intitule,
        Concept::Organisme,
        Concept::Denomination,
        Concept::Domaine,
        Concept::Public,
        Concept::Modalite,
        Concept::Localisation,
        Concept::Duree,
        Concept::Courte,
        Concept::Moyenne,
        Concept::Longue,
        Concept::Qualifiante,
        Concept::Certifiante,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Concept::Intitule => "intitule",
            Concept::Organisme => "organisme",
            Concept::Denomination => "denomination",
            Concept::Domaine => "domaine",
            Concept::Public => "public",
            Concept::Modalite => "modalite",
            Concept::Localisation => "localisation",
            Concept::Duree => "duree",
            Concept::Courte => "courte",
            Concept::Moyenne => "moyenne",
            Concept::Longue => "longue",
            Concept::Qualifiante => "qualifiante",
            Concept::Certifiante => "certifiante",
        }
    }

    /// Noms de colonnes acceptés, par ordre de préférence
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Concept::Intitule => &["intitule", "intitulé", "titre"],
            Concept::Organisme => &["type_organisme", "organisme", "operateur"],
            Concept::Denomination => &["denomination_sociale", "denomination_commerciale"],
            Concept::Domaine => &["domaine", "categorie"],
            Concept::Public => &["public", "cible"],
            Concept::Modalite => &["modalite", "modalité", "format"],
            Concept::Localisation => &["localisation_potentielle", "localisation", "lieu"],
            Concept::Duree => &["duree", "durée"],
            Concept::Courte => &["courte"],
            Concept::Moyenne => &["moyenne"],
            Concept::Longue => &["longue"],
            Concept::Qualifiante => &["qualifiante"],
            Concept::Certifiante => &["certifiante"],
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Association champ logique -> colonne, résolue une fois après chargement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapping {
    resolved: BTreeMap<Concept, String>,
    missing: Vec<Concept>,
}

impl FieldMapping {
    /// Résout chaque champ logique sur le premier synonyme présent
    ///
    /// Les champs introuvables sont journalisés: la fonctionnalité qui en
    /// dépend est désactivée, sans erreur.
    pub fn resolve(columns: &[String]) -> Self {
        let mut mapping = FieldMapping::default();

        for concept in Concept::ALL {
            let found = concept
                .synonyms()
                .iter()
                .find(|s| columns.iter().any(|c| c.as_str() == **s));

            match found {
                Some(column) => {
                    debug!(concept = concept.key(), column = *column, "Champ résolu");
                    mapping.resolved.insert(concept, (*column).to_string());
                }
                None => mapping.missing.push(concept),
            }
        }

        if !mapping.missing.is_empty() {
            let names: Vec<&str> = mapping.missing.iter().map(|c| c.key()).collect();
            warn!(missing = ?names, "Champs logiques absents de la source");
        }

        mapping
    }

    /// Colonne associée à un champ logique
    pub fn column(&self, concept: Concept) -> Option<&str> {
        self.resolved.get(&concept).map(String::as_str)
    }

    pub fn has(&self, concept: Concept) -> bool {
        self.resolved.contains_key(&concept)
    }

    /// Champs logiques introuvables
    pub fn missing(&self) -> &[Concept] {
        &self.missing
    }

    /// Valeur d'un champ logique pour une ligne
    pub fn value<'a>(&self, record: &'a RawRecord, concept: Concept) -> Option<&'a str> {
        record.get(self.column(concept)?)
    }

    /// Drapeau OUI/NON; toute autre valeur donne `None`
    pub fn flag(&self, record: &RawRecord, concept: Concept) -> Option<bool> {
        match self.value(record, concept)? {
            OUI => Some(true),
            NON => Some(false),
            _ => None,
        }
    }
}
