// src/reservations/merge.rs
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::record::{Reservation, ReservationKey, Source};

/// Consolidated reservations and what happened on the way.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Ordered by (room, check-in).
    pub records: Vec<Reservation>,
    /// Same-source rows replaced by a later row with the same key.
    pub duplicates: usize,
    /// Historical rows replaced by a current row with the same key.
    pub superseded: usize,
    /// Booked historical rows dropped because a booked current row overlaps them.
    pub overlaps_dropped: usize,
    /// Overlapping booked pairs from one source, kept but reported.
    pub overlaps_reported: Vec<(ReservationKey, ReservationKey)>,
}

/// Merge both sources on (room, check-in). Current beats historical; within
/// one source the later row wins.
pub fn merge_sources(current: &[Reservation], historical: &[Reservation]) -> MergeOutcome {
    let mut out = MergeOutcome::default();
    let mut by_key: BTreeMap<ReservationKey, Reservation> = BTreeMap::new();

    for r in historical.iter().chain(current) {
        match by_key.insert(r.key(), r.clone()) {
            None => {}
            Some(prev) if prev.source == r.source => {
                debug!(room = r.room, check_in = %r.check_in, source = r.source.as_str(), "later row replaces duplicate");
                out.duplicates += 1;
            }
            Some(_) => {
                debug!(room = r.room, check_in = %r.check_in, "current row supersedes historical");
                out.superseded += 1;
            }
        }
    }

    let merged: Vec<Reservation> = by_key.into_values().collect();
    let mut dropped = vec![false; merged.len()];

    // Records are sorted by room then check-in, so overlaps are only
    // possible within a run of the same room.
    let mut start = 0;
    while start < merged.len() {
        let room = merged[start].room;
        let end = merged[start..]
            .iter()
            .position(|r| r.room != room)
            .map_or(merged.len(), |n| start + n);

        for i in start..end {
            for j in (i + 1)..end {
                let (a, b) = (&merged[i], &merged[j]);
                if b.check_in >= a.check_out {
                    break;
                }
                if !a.is_active() || !b.is_active() || dropped[i] || dropped[j] {
                    continue;
                }
                if a.source == b.source {
                    warn!(
                        room,
                        first = %a.check_in,
                        second = %b.check_in,
                        source = a.source.as_str(),
                        "overlapping bookings"
                    );
                    out.overlaps_reported.push((a.key(), b.key()));
                } else {
                    let loser = if a.source == Source::Historical { i } else { j };
                    warn!(
                        room,
                        check_in = %merged[loser].check_in,
                        "historical booking overlaps a current one; dropped"
                    );
                    dropped[loser] = true;
                    out.overlaps_dropped += 1;
                }
            }
        }
        start = end;
    }

    out.records = merged
        .into_iter()
        .zip(dropped)
        .filter_map(|(r, gone)| (!gone).then_some(r))
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservations::record::{sample, Status};

    #[test]
    fn current_wins_on_same_key() {
        let current = vec![sample(101, "2026-01-05", "2026-01-07", Status::Booked, Source::Current)];
        let historical = vec![sample(101, "2026-01-05", "2026-01-06", Status::Cancelled, Source::Historical)];
        let out = merge_sources(&current, &historical);
        assert_eq!(out.records, current);
        assert_eq!(out.superseded, 1);
        assert_eq!(out.duplicates, 0);
    }

    #[test]
    fn later_row_wins_within_a_source() {
        let first = sample(102, "2026-01-05", "2026-01-06", Status::Booked, Source::Current);
        let second = sample(102, "2026-01-05", "2026-01-08", Status::Booked, Source::Current);
        let out = merge_sources(&[first, second.clone()], &[]);
        assert_eq!(out.records, vec![second]);
        assert_eq!(out.duplicates, 1);
    }

    #[test]
    fn output_is_ordered_by_room_then_check_in() {
        let current = vec![
            sample(222, "2026-01-01", "2026-01-02", Status::Booked, Source::Current),
            sample(101, "2026-01-09", "2026-01-10", Status::Booked, Source::Current),
        ];
        let historical = vec![sample(101, "2025-12-20", "2025-12-22", Status::Completed, Source::Historical)];
        let out = merge_sources(&current, &historical);
        let keys: Vec<_> = out.records.iter().map(|r| (r.room, r.check_in.to_string())).collect();
        assert_eq!(
            keys,
            vec![
                (101, "2025-12-20".to_string()),
                (101, "2026-01-09".to_string()),
                (222, "2026-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn historical_booking_overlapping_current_is_dropped() {
        let current = vec![sample(101, "2026-01-06", "2026-01-09", Status::Booked, Source::Current)];
        let historical = vec![
            sample(101, "2026-01-04", "2026-01-07", Status::Booked, Source::Historical),
            sample(101, "2026-01-01", "2026-01-04", Status::Booked, Source::Historical),
        ];
        let out = merge_sources(&current, &historical);
        assert_eq!(out.overlaps_dropped, 1);
        let starts: Vec<String> = out.records.iter().map(|r| r.check_in.to_string()).collect();
        assert_eq!(starts, vec!["2026-01-01", "2026-01-06"]);
    }

    #[test]
    fn same_source_overlaps_are_reported_not_dropped() {
        let current = vec![
            sample(101, "2026-01-05", "2026-01-08", Status::Booked, Source::Current),
            sample(101, "2026-01-07", "2026-01-09", Status::Booked, Source::Current),
            sample(101, "2026-01-06", "2026-01-07", Status::Cancelled, Source::Current),
        ];
        let out = merge_sources(&current, &[]);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.overlaps_dropped, 0);
        assert_eq!(out.overlaps_reported.len(), 1);
        let (a, b) = out.overlaps_reported[0];
        assert_eq!(a.1.to_string(), "2026-01-05");
        assert_eq!(b.1.to_string(), "2026-01-07");
    }
}
