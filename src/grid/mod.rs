// src/grid/mod.rs
//! Room × date occupancy grids: reading messy grid workbooks, normalizing
//! them, and writing the canonical layout back out.

pub mod cell;
pub mod clean;
pub mod write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};
use tracing::{info, instrument};

use crate::{
    backup::{purge_backups, replace_file},
    config::Config,
    rooms::RoomId,
    sheet::{write::output_format, SkippedRow},
};
pub use cell::OccupancyState;
pub use clean::{normalize_table, read_grid};
pub use write::{ensure_writable, write_grid, write_grid_as};

/// Normalized occupancy table. Only non-empty states are stored; every
/// (room, date) pair of the known rooms and dates not in `cells` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    rooms: BTreeSet<RoomId>,
    dates: BTreeSet<NaiveDate>,
    cells: BTreeMap<(RoomId, NaiveDate), OccupancyState>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, room: RoomId) {
        self.rooms.insert(room);
    }

    pub fn add_date(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    /// Record a state, keeping the stronger one if the cell is already set.
    pub fn set(&mut self, room: RoomId, date: NaiveDate, state: OccupancyState) {
        self.rooms.insert(room);
        self.dates.insert(date);
        if state.is_empty() {
            return;
        }
        let slot = self.cells.entry((room, date)).or_default();
        *slot = (*slot).max(state);
    }

    pub fn state(&self, room: RoomId, date: NaiveDate) -> OccupancyState {
        self.cells.get(&(room, date)).copied().unwrap_or_default()
    }

    pub fn rooms(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.iter().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Every (room, date, state) triple, empty cells included, ordered by
    /// room then date.
    pub fn cells(&self) -> impl Iterator<Item = (RoomId, NaiveDate, OccupancyState)> + '_ {
        self.rooms.iter().flat_map(move |&room| {
            self.dates
                .iter()
                .map(move |&date| (room, date, self.state(room, date)))
        })
    }

    /// Number of non-empty cells.
    pub fn occupied(&self) -> usize {
        self.cells.len()
    }

    /// Fold another grid into this one with the usual precedence.
    pub fn merge(&mut self, other: &OccupancyGrid) {
        self.rooms.extend(other.rooms.iter().copied());
        self.dates.extend(other.dates.iter().copied());
        for (&(room, date), &state) in &other.cells {
            self.set(room, date, state);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// What a grid clean run saw and did.
#[derive(Debug, Clone, Default)]
pub struct GridReport {
    pub sheets_read: usize,
    pub rows_read: usize,
    pub blank_rows: usize,
    /// Rows pulled into the room above them (merged room cells).
    pub merged_rows: usize,
    pub skipped_rows: Vec<SkippedRow>,
    /// Header cells that were not dates, as `sheet!label`.
    pub dropped_columns: Vec<String>,
    pub rooms: usize,
    pub dates: usize,
    pub occupied_cells: usize,
    pub backups_purged: usize,
}

/// Grid Cleaner entry point: read `input`, normalize, write `output`.
#[instrument(level = "info", skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn clean_grid_file(input: &Path, output: &Path, config: &Config) -> Result<GridReport> {
    let (grid, mut report) = read_grid(input, &config.floors)?;

    if config.backup.purge_on_clean {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        report.backups_purged = purge_backups(dir)?;
    }

    let format = output_format(output)?;
    replace_file(output, config.backup.enabled, |tmp| {
        write_grid_as(&grid, tmp, format, &config.floors)
    })
    .with_context(|| format!("writing cleaned grid `{}`", output.display()))?;

    info!(
        rooms = report.rooms,
        dates = report.dates,
        occupied = report.occupied_cells,
        skipped = report.skipped_rows.len(),
        "grid cleaned"
    );
    Ok(report)
}
