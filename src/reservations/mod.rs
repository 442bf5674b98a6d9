// src/reservations/mod.rs
//! Reservation exports: parsing the current and historical files, merging
//! them into one consolidated set, and projecting that set onto the grid.

pub mod distribute;
pub mod merge;
pub mod parse;
pub mod record;
pub mod summary;
pub mod write;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, instrument};

use crate::{
    backup::replace_file,
    config::Config,
    grid::{ensure_writable, write_grid_as},
    sheet::{write::output_format, SkippedRow},
};
pub use distribute::reservations_to_grid;
pub use merge::{merge_sources, MergeOutcome};
pub use parse::{parse_table, read_reservations, ParsedSource};
pub use record::{Reservation, ReservationKey, Source, Status};
pub use summary::Summary;
pub use write::write_reservations;

/// What a reservation processing run read, merged and wrote.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    pub current_rows: usize,
    pub historical_rows: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub duplicates: usize,
    pub superseded: usize,
    pub overlaps_dropped: usize,
    pub overlaps_reported: usize,
    pub summary: Summary,
    /// Reserved cells in the distributed grid, when one was written.
    pub grid_occupied: Option<usize>,
}

/// Reservation Processor entry point: read both sources, merge, write the
/// consolidated file and, when `grid_output` is given, the distributed grid.
#[instrument(level = "info", skip_all, fields(current = %current.display(), historical = %historical.display(), output = %output.display()))]
pub fn process_files(
    current: &Path,
    historical: &Path,
    output: &Path,
    grid_output: Option<&Path>,
    config: &Config,
) -> Result<ProcessReport> {
    // Check output paths before doing any reading.
    let out_format = output_format(output)?;
    let grid_format = grid_output.map(output_format).transpose()?;

    let cur = read_reservations(current, Source::Current, &config.floors)
        .with_context(|| format!("reading current reservations `{}`", current.display()))?;
    let hist = read_reservations(historical, Source::Historical, &config.floors)
        .with_context(|| format!("reading historical reservations `{}`", historical.display()))?;

    let merged = merge_sources(&cur.records, &hist.records);
    let summary = Summary::from_reservations(&merged.records);

    // Build and check the grid before either file is replaced.
    let grid = match (grid_output, grid_format) {
        (Some(path), Some(format)) => {
            let grid = reservations_to_grid(&merged.records, &config.floors);
            ensure_writable(&grid, format)
                .with_context(|| format!("distributed grid `{}`", path.display()))?;
            Some((path, format, grid))
        }
        _ => None,
    };

    replace_file(output, config.backup.enabled, |tmp| {
        write::write_reservations_as(&merged.records, &summary, tmp, out_format)
    })
    .with_context(|| format!("writing reservations `{}`", output.display()))?;

    let mut grid_occupied = None;
    if let Some((path, format, grid)) = grid {
        replace_file(path, config.backup.enabled, |tmp| {
            write_grid_as(&grid, tmp, format, &config.floors)
        })
        .with_context(|| format!("writing distributed grid `{}`", path.display()))?;
        info!(path = %path.display(), occupied = grid.occupied(), "grid distributed");
        grid_occupied = Some(grid.occupied());
    }

    let mut skipped_rows = cur.skipped;
    skipped_rows.extend(hist.skipped);

    let report = ProcessReport {
        current_rows: cur.rows_read,
        historical_rows: hist.rows_read,
        skipped_rows,
        duplicates: merged.duplicates,
        superseded: merged.superseded,
        overlaps_dropped: merged.overlaps_dropped,
        overlaps_reported: merged.overlaps_reported.len(),
        summary,
        grid_occupied,
    };
    info!(
        kept = report.summary.total_reservations,
        skipped = report.skipped_rows.len(),
        duplicates = report.duplicates,
        superseded = report.superseded,
        overlaps_dropped = report.overlaps_dropped,
        "reservations processed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::{read_grid, OccupancyState},
        logging::init_test_logging,
    };
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn current_row_wins_and_bad_rows_are_counted() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let current = dir.path().join("current.csv");
        let historical = dir.path().join("historical.csv");
        fs::write(
            &current,
            "101,2026-01-05,2026-01-07,booked\n\
             102,,2026-01-07,booked\n",
        )?;
        fs::write(
            &historical,
            "room;check_in;check_out;status\n\
             101;05/01/2026;06/01/2026;cancelled\n\
             103;2025-12-28;2025-12-30;completed\n",
        )?;
        let output = dir.path().join("merged.csv");

        let report = process_files(&current, &historical, &output, None, &Config::default())?;
        assert_eq!(report.current_rows, 2);
        assert_eq!(report.historical_rows, 2);
        assert_eq!(report.skipped_rows.len(), 1);
        assert_eq!(report.superseded, 1);
        assert_eq!(report.summary.total_reservations, 2);
        assert_eq!(report.grid_occupied, None);

        let text = fs::read_to_string(&output)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "101,2026-01-05,2026-01-07,,booked,,,,,current");
        assert_eq!(lines[2], "103,2025-12-28,2025-12-30,,completed,,,,,historical");
        Ok(())
    }

    #[test]
    fn distributed_grid_reads_back_as_a_grid() -> Result<()> {
        let dir = tempdir()?;
        let current = dir.path().join("current.csv");
        let historical = dir.path().join("historical.csv");
        fs::write(&current, "room,check_in,check_out\n222,2026-01-05,2026-01-07\n")?;
        fs::write(&historical, "room,check_in,check_out\n")?;
        let output = dir.path().join("merged.xlsx");
        let grid_out = dir.path().join("grilla.xlsx");

        let config = Config::default();
        let report = process_files(&current, &historical, &output, Some(&grid_out), &config)?;
        assert_eq!(report.grid_occupied, Some(2));

        let (grid, _) = read_grid(&grid_out, &config.floors)?;
        let jan = |d| NaiveDate::from_ymd_opt(2026, 1, d).unwrap();
        assert_eq!(grid.state(222, jan(5)), OccupancyState::Reserved);
        assert_eq!(grid.state(222, jan(6)), OccupancyState::Reserved);
        assert_eq!(grid.state(101, jan(5)), OccupancyState::Empty);
        assert_eq!(grid.rooms().count(), 53);
        Ok(())
    }

    #[test]
    fn implausible_year_is_a_skipped_row() -> Result<()> {
        let dir = tempdir()?;
        let current = dir.path().join("current.csv");
        let historical = dir.path().join("historical.csv");
        fs::write(
            &current,
            "102,05/01/0026,07/01/2026,booked\n\
             101,2026-01-05,2026-01-07,booked\n",
        )?;
        fs::write(&historical, "room,check_in,check_out\n")?;
        let output = dir.path().join("merged.csv");
        let grid_out = dir.path().join("g.xlsx");

        let report = process_files(&current, &historical, &output, Some(&grid_out), &Config::default())?;
        assert_eq!(report.skipped_rows.len(), 1);
        assert!(report.skipped_rows[0].reason.contains("check-in"));
        assert_eq!(report.summary.total_reservations, 1);
        assert_eq!(report.grid_occupied, Some(2));
        Ok(())
    }

    #[test]
    fn oversized_grid_fails_before_any_output_is_replaced() -> Result<()> {
        let dir = tempdir()?;
        let current = dir.path().join("current.csv");
        let historical = dir.path().join("historical.csv");
        fs::write(&current, "101,2026-01-05,2099-01-05,booked\n")?;
        fs::write(&historical, "room,check_in,check_out\n")?;
        let output = dir.path().join("merged.csv");
        let grid_out = dir.path().join("g.xlsx");
        fs::write(&output, "previous")?;

        let err = process_files(&current, &historical, &output, Some(&grid_out), &Config::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("more than an Excel sheet can hold"));
        assert_eq!(fs::read_to_string(&output)?, "previous");
        assert!(!grid_out.exists());
        Ok(())
    }

    #[test]
    fn missing_input_is_fatal_and_output_untouched() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("merged.csv");
        fs::write(&output, "previous")?;
        let err = process_files(
            &dir.path().join("nope.csv"),
            &dir.path().join("nope2.csv"),
            &output,
            None,
            &Config::default(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("nope.csv"));
        assert_eq!(fs::read_to_string(&output)?, "previous");
        Ok(())
    }

    #[test]
    fn unsupported_output_extension_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let err = process_files(
            &dir.path().join("a.csv"),
            &dir.path().join("b.csv"),
            &dir.path().join("out.json"),
            None,
            &Config::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains(".csv or .xlsx"));
    }
}
