//! Chargement des sources tabulaires (détection du séparateur et de l'encodage)

use std::borrow::Cow;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::types::{RawRecord, Table};
use crate::FormationsError;

/// Séparateurs candidats, essayés dans cet ordre
pub const DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Un séparateur est retenu s'il produit strictement plus de colonnes
pub const MIN_COLUMNS: usize = 5;

/// Séparateur fixe du référentiel des codes postaux
pub const REFERENCE_DELIMITER: u8 = b';';

/// Encodages essayés pour le référentiel, dans cet ordre
pub const REFERENCE_ENCODINGS: [&str; 4] = ["utf-8", "latin1", "iso-8859-1", "windows-1252"];

const BOM: char = '\u{feff}';

/// Table principale chargée avec le séparateur détecté
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub delimiter: u8,
}

/// Référentiel chargé, éventuellement vide
///
/// Un référentiel illisible n'est pas une erreur: la table est vide et
/// `warning` explique pourquoi.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub table: Table,
    pub encoding: Option<&'static Encoding>,
    pub warning: Option<String>,
}

impl ReferenceTable {
    fn unavailable(reason: String) -> Self {
        warn!("{}", reason);
        Self {
            table: Table::default(),
            encoding: None,
            warning: Some(reason),
        }
    }
}

/// Normalise un nom de colonne: trim, minuscules, espaces -> `_`
pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Lit un fichier entier en mémoire
pub fn read_source(path: &Path) -> Result<Vec<u8>, FormationsError> {
    Ok(std::fs::read(path)?)
}

/// Charge la table principale (UTF-8, séparateur auto-détecté)
///
/// # Errors
///
/// `FormationsError::Encoding` si la source n'est pas de l'UTF-8 valide,
/// `FormationsError::Parse` si aucun séparateur ne donne un en-tête de plus de
/// `MIN_COLUMNS` colonnes.
pub fn load_table(source_name: &str, bytes: &[u8]) -> Result<LoadedTable, FormationsError> {
    let text = simdutf8::basic::from_utf8(bytes)
        .map_err(|e| FormationsError::encoding_error(source_name, e.to_string()))?;
    let text = strip_bom(text);

    for delimiter in DELIMITERS {
        match parse_with_delimiter(text, delimiter) {
            Ok((table, header_len)) if header_len > MIN_COLUMNS => {
                info!(
                    source = source_name,
                    delimiter = %(delimiter as char).escape_default(),
                    columns = table.columns.len(),
                    rows = table.rows.len(),
                    "Table chargée"
                );
                return Ok(LoadedTable { table, delimiter });
            }
            Ok((_, header_len)) => {
                debug!(
                    delimiter = %(delimiter as char).escape_default(),
                    header_len, "Séparateur rejeté: trop peu de colonnes"
                );
            }
            Err(e) => {
                debug!(
                    delimiter = %(delimiter as char).escape_default(),
                    error = %e, "Séparateur rejeté: lecture impossible"
                );
            }
        }
    }

    Err(FormationsError::unrecognized_structure(source_name))
}

/// Charge le référentiel géographique (séparateur `;`, encodage auto-détecté)
pub fn load_reference(source_name: &str, bytes: &[u8]) -> ReferenceTable {
    let Some((text, encoding)) = decode_reference(bytes) else {
        return ReferenceTable::unavailable(format!(
            "{}: aucun encodage ne décode le référentiel ({})",
            source_name,
            REFERENCE_ENCODINGS.join(", ")
        ));
    };

    match parse_with_delimiter(strip_bom(&text), REFERENCE_DELIMITER) {
        Ok((table, _)) => {
            info!(
                source = source_name,
                encoding = encoding.name(),
                rows = table.rows.len(),
                "Référentiel chargé"
            );
            ReferenceTable {
                table,
                encoding: Some(encoding),
                warning: None,
            }
        }
        Err(e) => ReferenceTable::unavailable(format!(
            "{}: référentiel illisible: {}",
            source_name, e
        )),
    }
}

/// Charge le référentiel depuis un fichier; un fichier illisible donne un
/// référentiel vide avec avertissement
pub fn load_reference_path(path: &Path) -> ReferenceTable {
    let name = path.display().to_string();
    match read_source(path) {
        Ok(bytes) => load_reference(&name, &bytes),
        Err(e) => ReferenceTable::unavailable(format!("{}: {}", name, e)),
    }
}

/// Essaie chaque encodage candidat, retient le premier qui décode sans erreur
fn decode_reference(bytes: &[u8]) -> Option<(Cow<'_, str>, &'static Encoding)> {
    for label in REFERENCE_ENCODINGS {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            continue;
        };

        if encoding == encoding_rs::UTF_8 {
            if let Ok(text) = simdutf8::basic::from_utf8(bytes) {
                return Some((Cow::Borrowed(text), encoding));
            }
            debug!(encoding = label, "Décodage échoué");
            continue;
        }

        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Some((text, encoding));
        }
        debug!(encoding = label, "Décodage échoué");
    }
    None
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

/// Parse le texte avec un séparateur donné
///
/// Retourne la table normalisée et le nombre de colonnes brutes de l'en-tête.
/// Seul l'en-tête décide du séparateur: une ligne plus courte laisse ses
/// derniers champs absents, une ligne plus longue perd ses champs en trop.
fn parse_with_delimiter(text: &str, delimiter: u8) -> Result<(Table, usize), csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_field_name)
        .collect();

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for name in &headers {
        if !columns.contains(name) {
            columns.push(name.clone());
        }
    }

    let mut rows = Vec::new();
    let mut ragged = 0usize;
    for record in reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            ragged += 1;
        }
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        rows.push(row);
    }

    if ragged > 0 && headers.len() > MIN_COLUMNS {
        warn!(
            delimiter = %(delimiter as char).escape_default(),
            ragged,
            "Lignes dont le nombre de champs diffère de l'en-tête"
        );
    }

    Ok((Table { columns, rows }, headers.len()))
}
