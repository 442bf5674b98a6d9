// src/sheet/mod.rs
//! Tabular file access shared by the grid cleaner and the reservation
//! processor. Every input, whether a CSV file or a workbook sheet, is reduced
//! to a [`RawTable`] of trimmed strings before any domain parsing happens.

pub mod delimited;
pub mod utils;
pub mod write;
pub mod xlsx;

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, instrument};

/// One sheet (or one CSV file) as rows of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Sheet name; the file stem for CSV inputs.
    pub name: String,
    /// Every row in file order, blank rows included so line numbers stay true.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Index of the first row that has any non-blank cell.
    pub fn first_non_blank_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| !utils::is_blank_row(r))
    }

    pub fn is_empty(&self) -> bool {
        self.first_non_blank_row().is_none()
    }
}

/// A row that was read but left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Sheet (or file stem) the row came from.
    pub table: String,
    /// 1-based line/row number as a spreadsheet user would see it.
    pub line: usize,
    pub reason: String,
}

impl SkippedRow {
    pub fn new(table: &str, line: usize, reason: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

/// Supported tabular containers, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(TableFormat::Workbook),
            _ => bail!(
                "unsupported file type `{}` (expected .csv, .xlsx, .xls or .ods)",
                path.display()
            ),
        }
    }
}

/// Load every sheet of `path` as raw tables. A CSV file yields exactly one table.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_tables(path: impl AsRef<Path>) -> Result<Vec<RawTable>> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("input file `{}` not found", path.display());
    }
    let tables = match TableFormat::from_path(path)? {
        TableFormat::Csv => vec![delimited::read_csv_table(path)
            .with_context(|| format!("reading CSV `{}`", path.display()))?],
        TableFormat::Workbook => xlsx::read_workbook_tables(path)
            .with_context(|| format!("reading workbook `{}`", path.display()))?,
    };
    debug!(tables = tables.len(), "loaded tables");
    Ok(tables)
}
