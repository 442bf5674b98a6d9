use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs, io::Cursor, path::Path};
use tracing::{debug, trace};

use super::{utils::clean_str, RawTable};

/// Guess the field delimiter from the first non-empty line. Exports from the
/// hotel system in Spanish locales use `;`, everything else uses `,`.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let semis = first.matches(';').count();
    let commas = first.matches(',').count();
    if semis > commas {
        b';'
    } else {
        b','
    }
}

/// Read a whole CSV file into a [`RawTable`]. No header handling happens here:
/// the first record is just row 0.
///
/// The csv reader drops empty lines; they are put back as empty rows so that
/// row `i` is always line `i + 1` of the file.
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    let bytes = fs::read(path).with_context(|| format!("opening `{}`", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let delimiter = sniff_delimiter(&text);
    trace!(delimiter = %(delimiter as char), "sniffed delimiter");

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(text.as_bytes()));

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        if let Some(pos) = record.position() {
            while (rows.len() as u64) + 1 < pos.line() {
                rows.push(Vec::new());
            }
        }
        rows.push(record.iter().map(clean_str).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());
    debug!(rows = rows.len(), name = %name, "read CSV table");
    Ok(RawTable::new(name, rows))
}
