use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, trace};

use super::{
    utils::{clean_str, format_number},
    RawTable,
};
use crate::dates::{format_iso, from_excel_serial};

/// Render one workbook cell as the text a user would read in it.
/// Native date cells become ISO dates so later parsing sees one format.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => clean_str(s),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            from_excel_serial(serial)
                .map(format_iso)
                .unwrap_or_else(|| format_number(serial))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => clean_str(s),
        Data::Error(e) => {
            trace!(error = %e, "cell holds a formula error; treating as blank");
            String::new()
        }
    }
}

/// Read every worksheet of the workbook at `path`, in workbook order.
///
/// calamine trims the used range, so rows and columns before the range start
/// are padded back in; row `i` of the result is spreadsheet row `i + 1`.
pub fn read_workbook_tables(path: &Path) -> Result<Vec<RawTable>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook `{}`", path.display()))?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("reading sheet `{}` of `{}`", name, path.display()))?;

        let (row_start, col_start) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_start];
        for row in range.rows() {
            let mut cells = vec![String::new(); col_start];
            cells.extend(row.iter().map(cell_to_string));
            rows.push(cells);
        }
        debug!(sheet = %name, rows = rows.len(), "read worksheet");
        tables.push(RawTable::new(name, rows));
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_render_like_typed_text() {
        assert_eq!(cell_to_string(&Data::Float(101.0)), "101");
        assert_eq!(cell_to_string(&Data::Int(2)), "2");
        assert_eq!(cell_to_string(&Data::String("  R ".into())), "R");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
