// src/reservations/distribute.rs
use tracing::debug;

use super::record::{Reservation, Status};
use crate::{
    grid::{OccupancyGrid, OccupancyState},
    rooms::Floor,
};

/// Project reservations onto an occupancy grid covering every configured
/// room. Each night of a non-cancelled stay is reserved; the grid's dates
/// span the first check-in to the last night with no gaps.
pub fn reservations_to_grid(records: &[Reservation], floors: &[Floor]) -> OccupancyGrid {
    let mut grid = OccupancyGrid::new();
    for room in floors.iter().flat_map(|f| f.rooms()) {
        grid.add_room(room);
    }

    let live: Vec<&Reservation> = records
        .iter()
        .filter(|r| r.status != Status::Cancelled)
        .collect();

    let first = live.iter().map(|r| r.check_in).min();
    let last = live.iter().map(|r| r.check_out).max();
    if let (Some(first), Some(last)) = (first, last) {
        for date in first.iter_days().take_while(|d| *d < last) {
            grid.add_date(date);
        }
    }

    for r in live {
        if !floors.iter().any(|f| f.contains(r.room)) {
            debug!(room = r.room, "room outside configured floors; not distributed");
            continue;
        }
        for night in r.nights() {
            grid.set(r.room, night, OccupancyState::Reserved);
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reservations::record::{sample, Source},
        rooms::default_floors,
    };
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[test]
    fn nights_are_reserved_and_cancellations_ignored() {
        let records = vec![
            sample(101, "2026-01-05", "2026-01-07", Status::Booked, Source::Current),
            sample(222, "2026-01-09", "2026-01-10", Status::Completed, Source::Historical),
            sample(343, "2026-01-01", "2026-01-20", Status::Cancelled, Source::Current),
        ];
        let grid = reservations_to_grid(&records, &default_floors());

        assert_eq!(grid.rooms().count(), 21 + 21 + 11);
        let dates: Vec<NaiveDate> = grid.dates().collect();
        assert_eq!(dates.first(), Some(&d(5)));
        assert_eq!(dates.last(), Some(&d(9)));
        assert_eq!(dates.len(), 5);

        assert_eq!(grid.state(101, d(5)), OccupancyState::Reserved);
        assert_eq!(grid.state(101, d(6)), OccupancyState::Reserved);
        assert_eq!(grid.state(101, d(7)), OccupancyState::Empty);
        assert_eq!(grid.state(222, d(9)), OccupancyState::Reserved);
        assert_eq!(grid.state(343, d(6)), OccupancyState::Empty);
        assert_eq!(grid.occupied(), 3);
    }

    #[test]
    fn no_reservations_gives_rooms_without_dates() {
        let grid = reservations_to_grid(&[], &default_floors());
        assert!(!grid.is_empty());
        assert_eq!(grid.dates().count(), 0);
    }
}
