// src/rooms.rs
use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sheet::utils::fold_text;

pub type RoomId = u32;

/// `101`, `101.0`, `Hab 101`, `HAB. 101`, `habitación 101`
static ROOM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:hab(?:itacion)?\.?\s*)?(\d{1,6})(?:\.0+)?$").expect("valid regex")
});

/// A floor of the hotel: a contiguous room-number range, which is also the
/// worksheet name in grid workbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub name: String,
    pub first_room: RoomId,
    pub last_room: RoomId,
}

impl Floor {
    pub fn new(name: impl Into<String>, first_room: RoomId, last_room: RoomId) -> Self {
        Self {
            name: name.into(),
            first_room,
            last_room,
        }
    }

    pub fn contains(&self, room: RoomId) -> bool {
        (self.first_room..=self.last_room).contains(&room)
    }

    pub fn rooms(&self) -> impl Iterator<Item = RoomId> {
        self.first_room..=self.last_room
    }
}

/// Floor layout of the hotel as it appears in the Grilla de Pax workbook.
pub fn default_floors() -> Vec<Floor> {
    vec![
        Floor::new("PISO 1", 101, 121),
        Floor::new("PISO 2", 222, 242),
        Floor::new("PISO 3", 343, 353),
    ]
}

/// Reject empty names, inverted ranges, duplicate names and overlapping ranges.
pub fn validate_floors(floors: &[Floor]) -> Result<()> {
    if floors.is_empty() {
        bail!("no floors configured");
    }
    for (i, f) in floors.iter().enumerate() {
        if f.name.trim().is_empty() {
            bail!("floor #{} has an empty name", i + 1);
        }
        if f.first_room > f.last_room {
            bail!(
                "floor `{}` has first_room {} after last_room {}",
                f.name,
                f.first_room,
                f.last_room
            );
        }
        for other in &floors[..i] {
            if other.name.eq_ignore_ascii_case(&f.name) {
                bail!("floor `{}` is configured twice", f.name);
            }
            if f.first_room <= other.last_room && other.first_room <= f.last_room {
                bail!("floors `{}` and `{}` overlap", other.name, f.name);
            }
        }
    }
    Ok(())
}

/// Floor holding `room`, if the room is known.
pub fn floor_for(floors: &[Floor], room: RoomId) -> Option<&Floor> {
    floors.iter().find(|f| f.contains(room))
}

pub fn is_known_room(floors: &[Floor], room: RoomId) -> bool {
    floor_for(floors, room).is_some()
}

/// Parse a room cell. Only the number is kept; whether the room exists is
/// decided separately with [`is_known_room`].
pub fn parse_room(raw: &str) -> Option<RoomId> {
    let folded = fold_text(raw);
    ROOM.captures(&folded)?.get(1)?.as_str().parse().ok()
}
