// src/reservations/summary.rs
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::record::{Reservation, Status};
use crate::sheet::utils::fold_text;

/// Services text (folded) that counts as half board.
const HALF_BOARD: [&str; 2] = ["media pension", "all inclusive"];

/// Headline numbers for a consolidated reservation set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_reservations: usize,
    /// Guests over non-cancelled reservations; a row without pax counts one.
    pub total_pax: u64,
    pub distinct_rooms: usize,
    pub half_board: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl Summary {
    pub fn from_reservations(records: &[Reservation]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut rooms = BTreeSet::new();
        let mut total_pax = 0u64;
        let mut half_board = 0;

        for r in records {
            *by_status.entry(r.status.as_str().to_string()).or_insert(0) += 1;
            rooms.insert(r.room);
            if r.status != Status::Cancelled {
                total_pax += u64::from(r.pax.unwrap_or(1));
            }
            let services = fold_text(&r.services);
            if HALF_BOARD.iter().any(|k| services.contains(*k)) {
                half_board += 1;
            }
        }

        Self {
            total_reservations: records.len(),
            total_pax,
            distinct_rooms: rooms.len(),
            half_board,
            by_status,
        }
    }

    /// Two-column `metric, value` rows, header first.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["metric".to_string(), "value".to_string()],
            vec!["total_reservations".to_string(), self.total_reservations.to_string()],
            vec!["total_pax".to_string(), self.total_pax.to_string()],
            vec!["distinct_rooms".to_string(), self.distinct_rooms.to_string()],
            vec!["half_board".to_string(), self.half_board.to_string()],
        ];
        for (status, count) in &self.by_status {
            rows.push(vec![format!("status_{}", status), count.to_string()]);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::record::{sample, Source};

    #[test]
    fn counts_pax_rooms_and_meal_plans() {
        let mut a = sample(101, "2026-01-05", "2026-01-07", Status::Booked, Source::Current);
        a.pax = Some(3);
        a.services = "Media Pensión".to_string();
        let mut b = sample(101, "2026-01-08", "2026-01-09", Status::Cancelled, Source::Current);
        b.pax = Some(4);
        b.services = "MEDIA PENSION".to_string();
        let mut c = sample(222, "2026-01-05", "2026-01-06", Status::Completed, Source::Historical);
        c.services = "Desayuno".to_string();

        let s = Summary::from_reservations(&[a, b, c]);
        assert_eq!(s.total_reservations, 3);
        assert_eq!(s.total_pax, 4);
        assert_eq!(s.distinct_rooms, 2);
        assert_eq!(s.half_board, 2);
        assert_eq!(s.by_status.get("cancelled"), Some(&1));
        assert_eq!(s.by_status.get("booked"), Some(&1));
    }

    #[test]
    fn summary_rows_list_every_status_seen() {
        let s = Summary::from_reservations(&[sample(
            101,
            "2026-01-05",
            "2026-01-07",
            Status::Booked,
            Source::Current,
        )]);
        let rows = s.rows();
        assert_eq!(rows[0], vec!["metric", "value"]);
        assert_eq!(rows.last().unwrap(), &vec!["status_booked".to_string(), "1".to_string()]);
    }
}
