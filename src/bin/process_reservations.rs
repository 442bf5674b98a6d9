use anyhow::{bail, Result};
use paxgrid::{config::Config, logging::init_tracing, reservations::process_files};
use std::{env, path::PathBuf};
use tracing::info;

const USAGE: &str = "usage: process_reservations <CURRENT> <HISTORICAL> <OUTPUT> [GRID_OUTPUT]";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    let (current, historical, output, grid_output) = match args.as_slice() {
        [c, h, o] => (c, h, o, None),
        [c, h, o, g] => (c, h, o, Some(g.as_path())),
        _ => bail!(USAGE),
    };

    let config = Config::load()?;
    let report = process_files(current, historical, output, grid_output, &config)?;

    info!(
        current_rows = report.current_rows,
        historical_rows = report.historical_rows,
        skipped = report.skipped_rows.len(),
        overlaps_reported = report.overlaps_reported,
        grid_occupied = ?report.grid_occupied,
        output = %output.display(),
        "done"
    );
    info!(summary = %serde_json::to_string(&report.summary)?, "summary");
    Ok(())
}
