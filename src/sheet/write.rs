use anyhow::{bail, Context, Result};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use std::{collections::BTreeSet, path::Path};
use tracing::debug;

use super::TableFormat;

/// Excel worksheet maximum row count.
pub const EXCEL_MAX_ROWS: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const EXCEL_MAX_COLS: usize = 16_384;
/// Excel sheet name maximum length.
pub const EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
const EXCEL_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// One worksheet to write. Row 0 is the header row.
pub struct SheetOut<'a> {
    pub name: &'a str,
    pub rows: &'a [Vec<String>],
    /// Columns whose non-blank cells are written as numbers.
    pub numeric_cols: &'a [usize],
}

/// Outputs are written as `.csv` or `.xlsx` only.
pub fn output_format(path: &Path) -> Result<TableFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(TableFormat::Csv),
        "xlsx" => Ok(TableFormat::Workbook),
        _ => bail!(
            "cannot write `{}`: output must be .csv or .xlsx",
            path.display()
        ),
    }
}

pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if EXCEL_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return "Sheet".to_string();
    }
    cleaned.chars().take(EXCEL_SHEET_NAME_MAX).collect()
}

/// Write rows as a comma-separated file; blank cells stay empty fields.
pub fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating `{}`", path.display()))?;
    for row in rows {
        wtr.write_record(row)
            .with_context(|| format!("writing `{}`", path.display()))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing `{}`", path.display()))?;
    Ok(())
}

/// Write several sheets into one `.xlsx` workbook at `path`.
pub fn write_workbook(path: &Path, sheets: &[SheetOut<'_>]) -> Result<()> {
    let fmt_header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let mut workbook = Workbook::new();
    let mut used_names = BTreeSet::new();

    for sheet in sheets {
        if sheet.rows.len() > EXCEL_MAX_ROWS {
            bail!(
                "sheet `{}` has {} rows, more than Excel allows",
                sheet.name,
                sheet.rows.len()
            );
        }
        let widest = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
        if widest > EXCEL_MAX_COLS {
            bail!(
                "sheet `{}` has {} columns, more than Excel allows",
                sheet.name,
                widest
            );
        }
        let name = sanitize_sheet_name(sheet.name);
        if !used_names.insert(name.to_lowercase()) {
            bail!("duplicate sheet name `{}`", name);
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32;
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = u16::try_from(c).context("too many columns for a worksheet")?;
                if r == 0 {
                    worksheet.write_string_with_format(r, col, value, &fmt_header)?;
                } else if sheet.numeric_cols.contains(&c) {
                    match value.parse::<f64>() {
                        Ok(n) => worksheet.write_number(r, col, n)?,
                        Err(_) => worksheet.write_string(r, col, value)?,
                    };
                } else {
                    worksheet.write_string(r, col, value)?;
                }
            }
        }
        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
        debug!(sheet = %name, rows = sheet.rows.len(), "wrote worksheet");
    }

    workbook
        .save(path)
        .with_context(|| format!("saving workbook `{}`", path.display()))?;
    Ok(())
}
