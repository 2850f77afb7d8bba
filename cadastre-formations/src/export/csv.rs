//! Export CSV

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use formations::views::Column;
use formations::Formation;

/// Marque d'ordre des octets UTF-8
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Séparateur de l'export
pub const EXPORT_DELIMITER: u8 = b';';

/// Écrit les formations: BOM, en-tête puis une ligne par formation
///
/// Les valeurs absentes deviennent des champs vides.
pub fn write_csv<W: Write>(mut out: W, formations: &[&Formation], columns: &[Column]) -> Result<()> {
    out.write_all(UTF8_BOM)?;

    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(out);

    writer.write_record(columns.iter().map(Column::header))?;
    for formation in formations {
        let row: Vec<String> = columns
            .iter()
            .map(|c| c.value(formation).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Exporte vers un fichier
pub fn export_csv(path: &Path, formations: &[&Formation], columns: &[Column]) -> Result<()> {
    let file =
        File::create(path).context(format!("Failed to create file: {}", path.display()))?;
    write_csv(BufWriter::new(file), formations, columns)?;

    info!(
        output = %path.display(),
        rows = formations.len(),
        columns = columns.len(),
        "Export CSV terminé"
    );
    Ok(())
}
