//! Exports de la table enrichie
//!
//! - CSV `;` en UTF-8 avec BOM, rechargeable par le chargeur
//! - GeoJSON (EPSG:4326) pour la carte

pub mod csv;
pub mod geojson;

pub use self::csv::{export_csv, write_csv};
pub use self::geojson::{export_to_geojson, GeoJsonMode};
