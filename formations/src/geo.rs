//! Index géographique construit depuis le référentiel des codes postaux

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::loader::ReferenceTable;
use crate::types::Table;

pub const MUNICIPALITY_FIELD: &str = "municipality_name_(french)";
pub const ARRONDISSEMENT_FIELD: &str = "arrondissement_name_(french)";
pub const PROVINCE_FIELD: &str = "province_name_(french)";
pub const GEO_POINT_FIELD: &str = "_geo_point";

/// Normalise un nom de lieu pour la jointure: trim + minuscules
pub fn normalize_place(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Une entrée du référentiel
///
/// `geo_point` reste le texte composite "lat,lon"; il est parsé au moment
/// de la jointure.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoEntry {
    pub municipality: String,
    pub arrondissement: Option<String>,
    pub province: Option<String>,
    pub geo_point: Option<String>,
}

/// Index commune normalisée -> entrée (au plus une entrée par commune)
#[derive(Debug, Clone, Default)]
pub struct GeoIndex {
    entries: HashMap<String, GeoEntry>,
    duplicates: usize,
}

impl GeoIndex {
    /// Construit l'index; pour une commune en double, la première ligne gagne
    pub fn build(table: &Table) -> Self {
        let mut index = GeoIndex::default();

        for row in &table.rows {
            let Some(municipality) = row.get(MUNICIPALITY_FIELD) else {
                continue;
            };
            let key = normalize_place(municipality);

            if index.entries.contains_key(&key) {
                index.duplicates += 1;
                continue;
            }

            index.entries.insert(
                key,
                GeoEntry {
                    municipality: municipality.trim().to_string(),
                    arrondissement: row.get(ARRONDISSEMENT_FIELD).map(|s| s.trim().to_string()),
                    province: row.get(PROVINCE_FIELD).map(|s| s.trim().to_string()),
                    geo_point: row.get(GEO_POINT_FIELD).map(str::to_string),
                },
            );
        }

        debug!(
            entries = index.entries.len(),
            duplicates = index.duplicates,
            "Index géographique construit"
        );
        index
    }

    /// Recherche une localisation (normalisée comme les clés)
    pub fn lookup(&self, location: &str) -> Option<&GeoEntry> {
        self.entries.get(&normalize_place(location))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nombre de lignes écartées car leur commune était déjà indexée
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Référentiel disponible ou non
///
/// `Unavailable` signifie que l'enrichissement ne peut pas tourner, ce qui
/// diffère d'un index disponible qui ne trouve rien.
#[derive(Debug, Clone)]
pub enum GeoReference {
    Available(GeoIndex),
    Unavailable { reason: String },
}

impl GeoReference {
    /// Aucun référentiel fourni
    pub fn none() -> Self {
        GeoReference::Unavailable {
            reason: "aucun référentiel géographique fourni".to_string(),
        }
    }

    /// Construit la référence depuis un référentiel chargé
    pub fn from_reference(reference: &ReferenceTable) -> Self {
        if let Some(warning) = &reference.warning {
            return GeoReference::Unavailable {
                reason: warning.clone(),
            };
        }

        if !reference.table.has_column(MUNICIPALITY_FIELD) {
            let reason = format!("colonne '{}' absente du référentiel", MUNICIPALITY_FIELD);
            warn!("{}", reason);
            return GeoReference::Unavailable { reason };
        }

        let index = GeoIndex::build(&reference.table);
        if index.is_empty() {
            let reason = "référentiel géographique vide".to_string();
            warn!("{}", reason);
            return GeoReference::Unavailable { reason };
        }

        info!(communes = index.len(), "Référentiel géographique disponible");
        GeoReference::Available(index)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, GeoReference::Available(_))
    }
}
