//! # formations
//!
//! Chargement, normalisation et enrichissement géographique du cadastre des
//! formations TIC en Wallonie.
//!
//! ## Pipeline
//!
//! - Chargement CSV avec détection du séparateur (`;`, `,`, tabulation)
//! - Résolution des champs logiques par synonymes (`FieldMapping`)
//! - Normalisation des durées en heures et extraction de la province
//! - Jointure avec le référentiel des codes postaux (commune, arrondissement,
//!   province, coordonnées)
//! - Vues agrégées pour la présentation (filtres, comptages, statistiques)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formations::{loader, parser::DurationScale, Dataset, GeoReference};
//!
//! let bytes = std::fs::read("data/formations_clean.csv")?;
//! let reference = loader::load_reference_path(Path::new("data/codes_postaux.csv"));
//! let geo = GeoReference::from_reference(&reference);
//!
//! let dataset = Dataset::build("formations_clean.csv", &bytes, &geo, &DurationScale::default())?;
//! for formation in &dataset.formations {
//!     println!("{:?} {:?}", formation.province, formation.duree_heures);
//! }
//! ```

pub mod cache;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod loader;
pub mod mapping;
pub mod normalize;
pub mod parser;
pub mod types;
pub mod views;

pub use cache::TableCache;
pub use enrich::{enrich, EnrichOutcome, EnrichStats, Enriched};
pub use error::FormationsError;
pub use geo::GeoReference;
pub use mapping::{Concept, FieldMapping};
pub use parser::DurationScale;
pub use types::{CategorieDuree, Coordinates, Formation, Province, RawRecord, Table, NON_SPECIFIE};

use tracing::info;

/// Table enrichie prête pour la présentation
///
/// Source unique de vérité pour une interaction: immuable une fois construite.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Nom de la source (chemin ou nom du fichier importé)
    pub source_name: String,

    /// Séparateur détecté
    pub delimiter: u8,

    /// Colonnes normalisées de la source
    pub columns: Vec<String>,

    /// Champs logiques résolus
    pub mapping: FieldMapping,

    /// Formations normalisées et enrichies
    pub formations: Vec<Formation>,

    /// Issue de l'enrichissement géographique
    pub outcome: EnrichOutcome,

    /// Durées présentes dans la source mais sans nombre exploitable
    pub unparsed_durations: usize,
}

impl Dataset {
    /// Charge, normalise et enrichit la table principale
    ///
    /// # Errors
    ///
    /// Retourne `FormationsError` si la source n'est pas décodable ou si
    /// aucun séparateur ne donne une structure tabulaire reconnue. Les
    /// anomalies ligne à ligne ne sont jamais des erreurs.
    pub fn build(
        source_name: &str,
        bytes: &[u8],
        reference: &GeoReference,
        scale: &DurationScale,
    ) -> Result<Self, FormationsError> {
        let loaded = loader::load_table(source_name, bytes)?;
        let mapping = FieldMapping::resolve(&loaded.table.columns);
        let normalized = normalize::build_formations(&loaded.table, &mapping, scale);

        let unparsed_durations = normalized
            .iter()
            .filter(|f| f.duree_heures.is_none() && mapping.value(&f.record, Concept::Duree).is_some())
            .count();

        let Enriched {
            formations,
            outcome,
        } = enrich(&normalized, reference);

        info!(
            source = source_name,
            formations = formations.len(),
            unparsed_durations,
            "Jeu de données prêt"
        );

        Ok(Self {
            source_name: source_name.to_string(),
            delimiter: loaded.delimiter,
            columns: loaded.table.columns,
            mapping,
            formations,
            outcome,
            unparsed_durations,
        })
    }

    /// Toutes les formations, en références (entrée des vues)
    pub fn all(&self) -> Vec<&Formation> {
        self.formations.iter().collect()
    }

    /// Formations retenues par un filtre
    pub fn filtered(&self, filter: &views::Filter) -> Vec<&Formation> {
        views::apply(&self.formations, filter, &self.mapping)
    }

    /// Colonnes affichées par défaut
    pub fn display_columns(&self) -> Vec<views::Column> {
        views::display_columns(&self.mapping, &self.columns)
    }

    /// Colonnes exportées: affichage, plus les colonnes enrichies si demandé
    pub fn export_columns(&self, enriched: bool) -> Vec<views::Column> {
        let columns = self.display_columns();
        if enriched {
            views::with_enriched(columns)
        } else {
            columns
        }
    }
}
