use anyhow::{bail, Result};
use std::path::Path;
use tracing::debug;

use super::OccupancyGrid;
use crate::{
    dates::format_iso,
    rooms::{Floor, RoomId},
    sheet::{
        write::{output_format, write_csv, write_workbook, SheetOut, EXCEL_MAX_COLS},
        TableFormat,
    },
};

/// Label of the room column in cleaned grids.
pub const ROOM_HEADER: &str = "HAB";

/// Header row plus one row per room, dates ascending, canonical tokens.
pub fn grid_rows(grid: &OccupancyGrid, rooms: &[RoomId]) -> Vec<Vec<String>> {
    let mut header = vec![ROOM_HEADER.to_string()];
    header.extend(grid.dates().map(format_iso));

    let mut rows = Vec::with_capacity(rooms.len() + 1);
    rows.push(header);
    for &room in rooms {
        let mut row = vec![room.to_string()];
        row.extend(
            grid.dates()
                .map(|date| grid.state(room, date).as_token().to_string()),
        );
        rows.push(row);
    }
    rows
}

/// Fail early when `grid` cannot be written as `format`: a workbook sheet
/// holds the room column plus one column per date.
pub fn ensure_writable(grid: &OccupancyGrid, format: TableFormat) -> Result<()> {
    if format == TableFormat::Workbook {
        let cols = grid.dates().count() + 1;
        if cols > EXCEL_MAX_COLS {
            bail!(
                "grid spans {} dates, more than an Excel sheet can hold ({} columns)",
                cols - 1,
                EXCEL_MAX_COLS
            );
        }
    }
    Ok(())
}

/// Write `grid` to `path`, choosing CSV or XLSX by its extension.
pub fn write_grid(grid: &OccupancyGrid, path: &Path, floors: &[Floor]) -> Result<()> {
    write_grid_as(grid, path, output_format(path)?, floors)
}

/// CSV gets every room in one table. XLSX gets one sheet per floor that has
/// rooms in the grid, named after the floor so it reads back as a grid.
pub fn write_grid_as(
    grid: &OccupancyGrid,
    path: &Path,
    format: TableFormat,
    floors: &[Floor],
) -> Result<()> {
    ensure_writable(grid, format)?;
    match format {
        TableFormat::Csv => {
            let rooms: Vec<RoomId> = grid.rooms().collect();
            write_csv(path, &grid_rows(grid, &rooms))
        }
        TableFormat::Workbook => {
            let mut per_floor: Vec<(&str, Vec<Vec<String>>)> = Vec::new();
            for floor in floors {
                let rooms: Vec<RoomId> = grid.rooms().filter(|&r| floor.contains(r)).collect();
                if rooms.is_empty() {
                    continue;
                }
                per_floor.push((floor.name.as_str(), grid_rows(grid, &rooms)));
            }
            if per_floor.is_empty() {
                if let Some(first) = floors.first() {
                    per_floor.push((first.name.as_str(), grid_rows(grid, &[])));
                }
            }
            debug!(sheets = per_floor.len(), "writing grid workbook");

            let sheets: Vec<SheetOut<'_>> = per_floor
                .iter()
                .map(|(name, rows)| SheetOut {
                    name,
                    rows,
                    numeric_cols: &[0],
                })
                .collect();
            write_workbook(path, &sheets)
        }
    }
}
