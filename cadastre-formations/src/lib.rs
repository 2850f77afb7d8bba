//! # cadastre-formations
//!
//! Exploration du cadastre des formations TIC en Wallonie depuis la ligne
//! de commande.
//!
//! ## Features
//!
//! - Résumé du jeu de données enrichi (rapport d'exécution + vues)
//! - Export CSV filtré (`;`, UTF-8 avec BOM)
//! - Export GeoJSON pour la carte (par formation ou par province)
//! - Session d'exploration interactive avec cache des chargements
//!
//! ## Usage CLI
//!
//! ```bash
//! # Résumé (commande par défaut)
//! cadastre-formations --input data/formations_clean.csv --reference data/codes_postaux.csv
//!
//! # Export des formations qualifiantes du Hainaut
//! cadastre-formations export-csv --output hainaut.csv --province Hainaut --qualifiante
//!
//! # Carte par province
//! cadastre-formations to-geojson --output carte.geojson --by-province
//! ```

pub mod config;
pub mod export;
pub mod report;
pub mod session;

pub use config::{Config, Sources};
pub use report::{ReferenceStatus, RunReport};
pub use session::{apply_command, Command, Session};
