use anyhow::{bail, Result};
use paxgrid::{config::Config, grid::clean_grid_file, logging::init_tracing};
use std::{env, path::PathBuf};
use tracing::{info, warn};

const USAGE: &str = "usage: clean_grid <INPUT> <OUTPUT>";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (input, output) = match args.as_slice() {
        [input, output] => (PathBuf::from(input), PathBuf::from(output)),
        _ => bail!(USAGE),
    };

    let config = Config::load()?;
    let report = clean_grid_file(&input, &output, &config)?;

    for row in &report.skipped_rows {
        warn!(sheet = %row.table, line = row.line, reason = %row.reason, "skipped");
    }
    info!(
        sheets = report.sheets_read,
        rows = report.rows_read,
        blank = report.blank_rows,
        merged = report.merged_rows,
        skipped = report.skipped_rows.len(),
        dropped_columns = ?report.dropped_columns,
        backups_purged = report.backups_purged,
        output = %output.display(),
        "done"
    );
    Ok(())
}
