// src/reservations/write.rs
use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::{record::Reservation, summary::Summary};
use crate::{
    dates::format_iso,
    sheet::{
        write::{output_format, write_csv, write_workbook, SheetOut},
        TableFormat,
    },
};

pub const RESERVATIONS_SHEET: &str = "Reservas";
pub const SUMMARY_SHEET: &str = "Resumen";

pub const HEADER: [&str; 10] = [
    "room",
    "check_in",
    "check_out",
    "guest",
    "status",
    "guest_name",
    "pax",
    "services",
    "voucher",
    "source",
];

/// Columns written as numbers in workbooks: room and pax.
const NUMERIC_COLS: [usize; 2] = [0, 6];

fn record_row(r: &Reservation) -> Vec<String> {
    vec![
        r.room.to_string(),
        format_iso(r.check_in),
        format_iso(r.check_out),
        r.guest.clone(),
        r.status.as_str().to_string(),
        r.guest_name.clone(),
        r.pax.map(|p| p.to_string()).unwrap_or_default(),
        r.services.clone(),
        r.voucher.clone(),
        r.source.as_str().to_string(),
    ]
}

pub fn reservation_rows(records: &[Reservation]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(HEADER.iter().map(|h| h.to_string()).collect());
    rows.extend(records.iter().map(record_row));
    rows
}

/// Write the consolidated set to `path` (`.csv` or `.xlsx`).
pub fn write_reservations(records: &[Reservation], summary: &Summary, path: &Path) -> Result<()> {
    write_reservations_as(records, summary, path, output_format(path)?)
}

/// CSV holds the records only; workbooks also get the summary sheet.
pub fn write_reservations_as(
    records: &[Reservation],
    summary: &Summary,
    path: &Path,
    format: TableFormat,
) -> Result<()> {
    let rows = reservation_rows(records);
    debug!(records = records.len(), ?format, "writing reservations");
    match format {
        TableFormat::Csv => write_csv(path, &rows),
        TableFormat::Workbook => {
            let summary_rows = summary.rows();
            write_workbook(
                path,
                &[
                    SheetOut {
                        name: RESERVATIONS_SHEET,
                        rows: &rows,
                        numeric_cols: &NUMERIC_COLS,
                    },
                    SheetOut {
                        name: SUMMARY_SHEET,
                        rows: &summary_rows,
                        numeric_cols: &[1],
                    },
                ],
            )
        }
    }
}
