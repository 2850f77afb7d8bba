//! Export vers GeoJSON avec geozero (streaming)
//!
//! Deux vues de la carte: un point par formation géolocalisée, ou un point
//! par province (centroïde approximatif) portant le nombre de formations.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Geometry, Point};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::info;

use formations::views::province_counts;
use formations::{Concept, FieldMapping, Formation, Province};

/// Système de coordonnées des points exportés (WGS84)
pub const EPSG_WGS84: u32 = 4326;

/// Vue exportée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeoJsonMode {
    /// Un point par formation ayant des coordonnées
    #[default]
    Formations,
    /// Un point par province, au centroïde
    Provinces,
}

enum Property {
    Text(String),
    Count(usize),
}

struct MapFeature {
    id: String,
    geometry: Geometry<f64>,
    properties: Vec<(&'static str, Property)>,
}

/// Exporte la carte en GeoJSON; retourne le nombre de points écrits
pub fn export_to_geojson(
    formations: &[&Formation],
    mapping: &FieldMapping,
    mode: GeoJsonMode,
    output_path: &Path,
) -> Result<usize> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    let features = match mode {
        GeoJsonMode::Formations => formation_features(formations, mapping),
        GeoJsonMode::Provinces => province_features(formations),
    };
    write_collection(&mut writer, &features)?;
    writer.flush()?;

    info!(
        output = %output_path.display(),
        mode = ?mode,
        points = features.len(),
        "Export GeoJSON terminé"
    );
    Ok(features.len())
}

fn formation_features(formations: &[&Formation], mapping: &FieldMapping) -> Vec<MapFeature> {
    formations
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            let coords = f.coordinates?;
            let mut properties = Vec::new();
            let text = [
                ("intitule", mapping.value(&f.record, Concept::Intitule).map(str::to_string)),
                ("province", f.province.map(|p| p.name().to_string())),
                ("ville", f.ville.clone()),
                ("arrondissement", f.arrondissement.clone()),
            ];
            for (key, value) in text {
                if let Some(value) = value {
                    properties.push((key, Property::Text(value)));
                }
            }

            Some(MapFeature {
                id: i.to_string(),
                geometry: Geometry::Point(Point::new(coords.longitude, coords.latitude)),
                properties,
            })
        })
        .collect()
}

fn province_features(formations: &[&Formation]) -> Vec<MapFeature> {
    province_counts(formations)
        .into_iter()
        .filter_map(|(name, count)| {
            let (lat, lon) = Province::from_name(&name)?.centroid()?;
            Some(MapFeature {
                id: name.clone(),
                geometry: Geometry::Point(Point::new(lon, lat)),
                properties: vec![
                    ("province", Property::Text(name)),
                    ("formations", Property::Count(count)),
                ],
            })
        })
        .collect()
}

fn write_collection<W: Write>(writer: &mut W, features: &[MapFeature]) -> Result<()> {
    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        EPSG_WGS84
    )?;

    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, feature)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, feature: &MapFeature) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&feature.id)
    )?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in feature.properties.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        match value {
            Property::Text(text) => write!(writer, r#""{}":"{}""#, key, escape_json(text))?,
            Property::Count(count) => write!(writer, r#""{}":{}"#, key, count)?,
        }
    }
    write!(writer, "}}}}")?;

    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
