//! Parsers de champs: un texte brut -> une valeur typée
//!
//! Fonctions pures, sans I/O ni état partagé.

pub mod duration;
pub mod province;

pub use duration::{parse_duration, DurationScale};
pub use province::extract_province;
