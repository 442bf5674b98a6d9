// src/reservations/parse.rs
use anyhow::{bail, Result};
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, info, instrument, trace, warn};

use super::record::{Reservation, Source, Status};
use crate::{
    dates::parse_date,
    rooms::{is_known_room, parse_room, Floor},
    sheet::{
        load_tables,
        utils::{clean_str, fold_text, is_blank_row},
        RawTable, SkippedRow,
    },
};

/// Reservation attributes that can be read from an input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Room,
    CheckIn,
    CheckOut,
    Status,
    Guest,
    GuestName,
    Pax,
    Services,
    Voucher,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Room => "room",
            Column::CheckIn => "check_in",
            Column::CheckOut => "check_out",
            Column::Status => "status",
            Column::Guest => "guest",
            Column::GuestName => "guest_name",
            Column::Pax => "pax",
            Column::Services => "services",
            Column::Voucher => "voucher",
        }
    }
}

pub const REQUIRED: [Column; 3] = [Column::Room, Column::CheckIn, Column::CheckOut];

/// Header aliases, already folded (lowercase, no accents). Covers the hotel
/// system export, the `Ingresos` sheet headers and plain English names.
const ALIASES: [(Column, &[&str]); 9] = [
    (
        Column::Room,
        &["room", "nro. habitacion", "nro habitacion", "habitacion", "hab"],
    ),
    (
        Column::CheckIn,
        &["check_in", "check in", "checkin", "fecha de ingreso", "ingreso", "in"],
    ),
    (
        Column::CheckOut,
        &["check_out", "check out", "checkout", "fecha de egreso", "egreso", "out"],
    ),
    (Column::Status, &["status", "estado"]),
    (
        Column::Guest,
        &["guest", "guest_id", "nro. doc.", "nro doc", "n.º", "n.o", "dni", "documento"],
    ),
    (
        Column::GuestName,
        &["guest_name", "apellido y nombre", "nombre", "huesped"],
    ),
    (Column::Pax, &["pax", "plazas ocupadas", "plazas"]),
    (Column::Services, &["services", "servicios", "map", "comida"]),
    (Column::Voucher, &["voucher"]),
];

/// Positional layout of headerless files: `room, check_in, check_out, status, guest`.
const POSITIONAL: [Column; 5] = [
    Column::Room,
    Column::CheckIn,
    Column::CheckOut,
    Column::Status,
    Column::Guest,
];

/// Where each known column sits in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    cols: BTreeMap<Column, usize>,
}

impl ColumnMap {
    /// Match header cells against the alias table. The first header cell
    /// matching a column wins; unknown headers are ignored.
    pub fn from_header(header: &[String]) -> Self {
        let mut cols = BTreeMap::new();
        for (idx, raw) in header.iter().enumerate() {
            let folded = fold_text(raw);
            if folded.is_empty() {
                continue;
            }
            let hit = ALIASES
                .iter()
                .find(|(_, names)| names.contains(&folded.as_str()));
            match hit {
                Some((col, _)) => {
                    cols.entry(*col).or_insert(idx);
                }
                None => trace!(header = %raw, "ignoring column"),
            }
        }
        Self { cols }
    }

    pub fn positional() -> Self {
        Self {
            cols: POSITIONAL.iter().enumerate().map(|(i, c)| (*c, i)).collect(),
        }
    }

    pub fn get(&self, col: Column) -> Option<usize> {
        self.cols.get(&col).copied()
    }

    /// No header cell matched any known column.
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED
            .iter()
            .filter(|c| !self.cols.contains_key(c))
            .map(|c| c.as_str())
            .collect()
    }

    fn cell(&self, row: &[String], col: Column) -> String {
        self.get(col)
            .and_then(|i| row.get(i))
            .map(|c| clean_str(c))
            .unwrap_or_default()
    }
}

/// One input file after parsing.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub source: Source,
    pub records: Vec<Reservation>,
    pub skipped: Vec<SkippedRow>,
    /// Non-blank data rows seen, whether kept or skipped.
    pub rows_read: usize,
}

impl ParsedSource {
    pub fn empty(source: Source) -> Self {
        Self {
            source,
            records: Vec::new(),
            skipped: Vec::new(),
            rows_read: 0,
        }
    }
}

/// How many leading non-blank rows are looked at to tell a headerless file
/// from one with an unrecognized header.
const DATA_SNIFF_ROWS: usize = 5;

/// A row is data, not a header, when it starts with a room number followed
/// by a date.
fn looks_like_data(row: &[String]) -> bool {
    let first = row.first().map(|c| clean_str(c)).unwrap_or_default();
    let second = row.get(1).map(|c| clean_str(c)).unwrap_or_default();
    parse_room(&first).is_some() && parse_date(&second).is_some()
}

/// Turn one data row into a reservation, or the reason it cannot be one.
pub fn parse_row(
    row: &[String],
    map: &ColumnMap,
    source: Source,
    floors: &[Floor],
) -> std::result::Result<Reservation, String> {
    let room_cell = map.cell(row, Column::Room);
    if room_cell.is_empty() {
        return Err("missing room".to_string());
    }
    let room = parse_room(&room_cell).ok_or_else(|| format!("`{}` is not a room number", room_cell))?;
    if !is_known_room(floors, room) {
        return Err(format!("room {} is not on any configured floor", room));
    }

    let date = |col: Column, what: &str| -> std::result::Result<_, String> {
        let raw = map.cell(row, col);
        if raw.is_empty() {
            return Err(format!("missing {} date", what));
        }
        parse_date(&raw).ok_or_else(|| format!("unparsable {} date `{}`", what, raw))
    };
    let check_in = date(Column::CheckIn, "check-in")?;
    let check_out = date(Column::CheckOut, "check-out")?;
    if check_out <= check_in {
        return Err(format!(
            "check-out {} is not after check-in {}",
            check_out, check_in
        ));
    }

    let status_cell = map.cell(row, Column::Status);
    let status = Status::from_str(&status_cell)
        .ok_or_else(|| format!("unknown status `{}`", status_cell))?;

    let pax_cell = map.cell(row, Column::Pax);
    let pax = if pax_cell.is_empty() {
        None
    } else {
        let parsed = pax_cell.parse::<u32>().ok();
        if parsed.is_none() {
            debug!(pax = %pax_cell, "ignoring non-numeric pax");
        }
        parsed
    };

    Ok(Reservation {
        room,
        check_in,
        check_out,
        guest: map.cell(row, Column::Guest),
        status,
        guest_name: map.cell(row, Column::GuestName),
        pax,
        services: map.cell(row, Column::Services),
        voucher: map.cell(row, Column::Voucher),
        source,
    })
}

/// Parse one reservation table. Unparsable rows are logged and collected in
/// `skipped`; only a header row without the required columns is an error.
pub fn parse_table(table: &RawTable, source: Source, floors: &[Floor]) -> Result<ParsedSource> {
    let mut parsed = ParsedSource::empty(source);
    let first = match table.first_non_blank_row() {
        Some(i) => i,
        None => return Ok(parsed),
    };

    // A first row without a single known header name is data when any of the
    // leading rows reads as data; the first row itself may be malformed.
    let header_map = ColumnMap::from_header(&table.rows[first]);
    let headerless = header_map.is_empty()
        && table.rows[first..]
            .iter()
            .filter(|r| !is_blank_row(r))
            .take(DATA_SNIFF_ROWS)
            .any(|r| looks_like_data(r));
    let (map, data_start) = if header_map.missing_required().is_empty() {
        (header_map, first + 1)
    } else if headerless {
        debug!(table = %table.name, "no header row; reading columns by position");
        (ColumnMap::positional(), first)
    } else {
        bail!(
            "`{}` is missing required column(s): {}",
            table.name,
            header_map.missing_required().join(", ")
        );
    };

    for (idx, row) in table.rows.iter().enumerate().skip(data_start) {
        if is_blank_row(row) {
            continue;
        }
        parsed.rows_read += 1;
        let line = idx + 1;
        match parse_row(row, &map, source, floors) {
            Ok(r) => parsed.records.push(r),
            Err(reason) => {
                warn!(table = %table.name, source = source.as_str(), line, reason = %reason, "row skipped");
                parsed
                    .skipped
                    .push(SkippedRow::new(&table.name, line, reason));
            }
        }
    }
    Ok(parsed)
}

/// Read a reservation file. Workbooks use their first sheet that has rows.
#[instrument(level = "info", skip_all, fields(path = %path.display(), source = source.as_str()))]
pub fn read_reservations(path: &Path, source: Source, floors: &[Floor]) -> Result<ParsedSource> {
    let tables = load_tables(path)?;
    let table = match tables.iter().find(|t| !t.is_empty()) {
        Some(t) => t,
        None => {
            warn!("file has no rows");
            return Ok(ParsedSource::empty(source));
        }
    };
    let parsed = parse_table(table, source, floors)?;
    info!(
        kept = parsed.records.len(),
        skipped = parsed.skipped.len(),
        "reservations read"
    );
    Ok(parsed)
}
