// src/grid/clean.rs
use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::{GridReport, OccupancyGrid, OccupancyState};
use crate::{
    dates::parse_date,
    rooms::{is_known_room, parse_room, Floor, RoomId},
    sheet::{
        load_tables,
        utils::{clean_str, is_blank_row},
        RawTable, SkippedRow,
    },
};

/// Layout of a grid sheet, read from its first non-blank row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridHeader {
    /// 0-based index of the header row.
    pub row: usize,
    pub room_col: usize,
    pub date_cols: Vec<(usize, NaiveDate)>,
    /// Non-blank header labels that are neither the room label nor a date.
    pub dropped: Vec<String>,
}

impl GridHeader {
    /// The first non-blank, non-date header cell labels the room column
    /// (`HAB` in the hotel workbook, which leaves column A empty). Every cell
    /// that parses as a date is a date column.
    pub fn detect(table: &RawTable) -> Option<Self> {
        let row = table.first_non_blank_row()?;
        let mut room_col = None;
        let mut date_cols = Vec::new();
        let mut dropped = Vec::new();

        for (col, raw) in table.rows[row].iter().enumerate() {
            let label = clean_str(raw);
            if label.is_empty() {
                continue;
            }
            if let Some(date) = parse_date(&label) {
                date_cols.push((col, date));
            } else if room_col.is_none() {
                room_col = Some(col);
            } else {
                dropped.push(label);
            }
        }

        Some(Self {
            row,
            room_col: room_col?,
            date_cols,
            dropped,
        })
    }
}

fn cell(row: &[String], col: usize) -> String {
    row.get(col).map(|c| clean_str(c)).unwrap_or_default()
}

/// Normalize one grid sheet into (room, date, state) cells.
///
/// Row handling: blank rows are skipped silently; a row with a blank room
/// cell but filled date cells belongs to the room above it (a merged room
/// cell leaves only its top-left value); rows whose room cell is not a known
/// room are skipped with a warning.
pub fn normalize_table(table: &RawTable, floors: &[Floor], report: &mut GridReport) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new();
    let header = match GridHeader::detect(table) {
        Some(h) => h,
        None => {
            warn!(sheet = %table.name, "no grid header row; sheet ignored");
            return grid;
        }
    };

    for label in &header.dropped {
        warn!(sheet = %table.name, column = %label, "header is not a date; column dropped");
        report.dropped_columns.push(format!("{}!{}", table.name, label));
    }
    if header.date_cols.is_empty() {
        warn!(sheet = %table.name, "header row has no date columns");
    }
    for &(_, date) in &header.date_cols {
        grid.add_date(date);
    }

    let skip = |report: &mut GridReport, line: usize, reason: String| {
        warn!(sheet = %table.name, line, reason = %reason, "row skipped");
        report
            .skipped_rows
            .push(SkippedRow::new(&table.name, line, reason));
    };

    let mut last_room: Option<RoomId> = None;
    for (idx, row) in table.rows.iter().enumerate().skip(header.row + 1) {
        let line = idx + 1;
        let room_cell = cell(row, header.room_col);
        let has_states = header
            .date_cols
            .iter()
            .any(|&(col, _)| !cell(row, col).is_empty());

        // A blank row closes any merged room region above it.
        if is_blank_row(row) || (room_cell.is_empty() && !has_states) {
            report.blank_rows += 1;
            last_room = None;
            continue;
        }
        report.rows_read += 1;

        let room = if room_cell.is_empty() {
            match last_room {
                Some(r) => {
                    debug!(sheet = %table.name, line, room = r, "merged room cell");
                    report.merged_rows += 1;
                    r
                }
                None => {
                    skip(report, line, "blank room cell with no room above".to_string());
                    continue;
                }
            }
        } else {
            match parse_room(&room_cell) {
                Some(r) if is_known_room(floors, r) => r,
                Some(r) => {
                    skip(report, line, format!("room {} is not on any configured floor", r));
                    last_room = None;
                    continue;
                }
                None => {
                    skip(report, line, format!("`{}` is not a room number", room_cell));
                    last_room = None;
                    continue;
                }
            }
        };

        last_room = Some(room);
        grid.add_room(room);
        for &(col, date) in &header.date_cols {
            grid.set(room, date, OccupancyState::from_cell(&cell(row, col)));
        }
    }

    grid
}

/// Read a grid workbook (or CSV) and normalize it.
///
/// Sheets named like a configured floor are read; when none is, the first
/// sheet is. It is fatal when no selected sheet has a header row.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_grid(path: &Path, floors: &[Floor]) -> Result<(OccupancyGrid, GridReport)> {
    let tables = load_tables(path)?;

    let mut selected: Vec<&RawTable> = tables
        .iter()
        .filter(|t| {
            floors
                .iter()
                .any(|f| f.name.trim().eq_ignore_ascii_case(t.name.trim()))
        })
        .collect();
    if selected.is_empty() {
        if let Some(first) = tables.first() {
            debug!(sheet = %first.name, "no floor sheets; using first sheet");
            selected.push(first);
        }
    }

    let mut report = GridReport::default();
    let mut grid = OccupancyGrid::new();
    let mut with_header = 0;
    for table in selected {
        report.sheets_read += 1;
        if GridHeader::detect(table).is_some() {
            with_header += 1;
        }
        let sheet_grid = normalize_table(table, floors, &mut report);
        grid.merge(&sheet_grid);
    }
    if with_header == 0 {
        bail!("`{}` has no grid header row", path.display());
    }

    report.rooms = grid.rooms().count();
    report.dates = grid.dates().count();
    report.occupied_cells = grid.occupied();
    info!(
        sheets = report.sheets_read,
        rows = report.rows_read,
        skipped = report.skipped_rows.len(),
        "grid read"
    );
    Ok((grid, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::default_floors;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            "PISO 1",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[test]
    fn header_finds_room_label_after_empty_column() {
        let t = table(&[
            &["", "", ""],
            &["", "HAB", "05/01/2026", "OBS", "46028"],
        ]);
        let h = GridHeader::detect(&t).unwrap();
        assert_eq!(h.row, 1);
        assert_eq!(h.room_col, 1);
        assert_eq!(h.date_cols, vec![(2, d(5)), (4, d(6))]);
        assert_eq!(h.dropped, vec!["OBS".to_string()]);
    }

    #[test]
    fn header_without_room_label_is_rejected() {
        let t = table(&[&["2026-01-05", "2026-01-06"]]);
        assert!(GridHeader::detect(&t).is_none());
        assert!(GridHeader::detect(&table(&[&[""]])).is_none());
    }

    #[test]
    fn merged_room_cell_continues_previous_room() {
        let t = table(&[
            &["HAB", "2026-01-05", "2026-01-06"],
            &["101", "R", ""],
            &["", "", "R"],
            &["", "", ""],
            &["102", "", "B"],
        ]);
        let mut report = GridReport::default();
        let g = normalize_table(&t, &default_floors(), &mut report);
        assert_eq!(g.state(101, d(5)), OccupancyState::Reserved);
        assert_eq!(g.state(101, d(6)), OccupancyState::Reserved);
        assert_eq!(g.state(102, d(6)), OccupancyState::Blocked);
        assert_eq!(report.merged_rows, 1);
        assert_eq!(report.blank_rows, 1);
        assert!(report.skipped_rows.is_empty());
    }

    #[test]
    fn blank_separator_ends_a_merged_room() {
        let t = table(&[
            &["HAB", "2026-01-05", "2026-01-06"],
            &["101", "R", ""],
            &["", "", ""],
            &["", "", "B"],
            &["102", "R", ""],
        ]);
        let mut report = GridReport::default();
        let g = normalize_table(&t, &default_floors(), &mut report);
        assert_eq!(g.state(101, d(6)), OccupancyState::Empty);
        assert_eq!(report.merged_rows, 0);
        assert_eq!(report.skipped_rows.len(), 1);
        assert_eq!(report.skipped_rows[0].line, 4);
        assert_eq!(g.state(102, d(5)), OccupancyState::Reserved);
    }

    #[test]
    fn orphan_rows_are_skipped_not_fatal() {
        let t = table(&[
            &["HAB", "2026-01-05"],
            &["", "R"],
            &["TOTAL", "4"],
            &["", "R"],
            &["500", "R"],
        ]);
        let mut report = GridReport::default();
        let g = normalize_table(&t, &default_floors(), &mut report);
        assert!(g.is_empty());
        let lines: Vec<usize> = report.skipped_rows.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
        assert!(report.skipped_rows[3].reason.contains("500"));
    }

    #[test]
    fn duplicate_date_columns_merge_by_precedence() {
        let t = table(&[
            &["HAB", "2026-01-05", "05/01/2026"],
            &["101", "R", "B"],
            &["101", "", "R"],
        ]);
        let mut report = GridReport::default();
        let g = normalize_table(&t, &default_floors(), &mut report);
        assert_eq!(g.state(101, d(5)), OccupancyState::Blocked);
        assert_eq!(g.dates().count(), 1);
    }
}
