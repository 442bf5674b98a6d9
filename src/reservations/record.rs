// src/reservations/record.rs
use chrono::NaiveDate;

use crate::{rooms::RoomId, sheet::utils::fold_text};

/// Lifecycle of a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Booked,
    Cancelled,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Booked => "booked",
            Status::Cancelled => "cancelled",
            Status::Completed => "completed",
        }
    }

    /// Map status text from the hotel system (Spanish) or plain English.
    /// A blank status means the reservation is simply booked.
    pub fn from_str(s: &str) -> Option<Self> {
        match fold_text(s).replace(['-', '_'], " ").as_str() {
            "" | "booked" | "confirmed" | "confirmada" | "confirmado" | "reservada"
            | "reservado" | "pendiente" | "in house" | "alojado" | "check in" => {
                Some(Status::Booked)
            }
            "cancelled" | "canceled" | "cancelada" | "cancelado" | "anulada" | "anulado"
            | "no show" => Some(Status::Cancelled),
            "completed" | "checked out" | "check out" | "finalizada" | "finalizado"
            | "egresado" | "egresada" => Some(Status::Completed),
            _ => None,
        }
    }
}

/// Which input a reservation came from. Current data wins over history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Historical,
    Current,
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Historical => "historical",
            Source::Current => "current",
        }
    }
}

/// Identity of a reservation: one room cannot start two stays on one day.
pub type ReservationKey = (RoomId, NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub room: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Guest identifier: document number when the export has one.
    pub guest: String,
    pub status: Status,
    pub guest_name: String,
    pub pax: Option<u32>,
    /// Meal plan as typed in the export ("Media Pensión", ...).
    pub services: String,
    pub voucher: String,
    pub source: Source,
}

impl Reservation {
    pub fn key(&self) -> ReservationKey {
        (self.room, self.check_in)
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Booked
    }

    /// Stays are half-open `[check_in, check_out)`: a checkout and a check-in
    /// on the same day do not overlap.
    pub fn overlaps(&self, other: &Reservation) -> bool {
        self.room == other.room
            && self.check_in < other.check_out
            && other.check_in < self.check_out
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d < end)
    }
}

#[cfg(test)]
pub(crate) fn sample(room: RoomId, check_in: &str, check_out: &str, status: Status, source: Source) -> Reservation {
    Reservation {
        room,
        check_in: check_in.parse().expect("ISO date"),
        check_out: check_out.parse().expect("ISO date"),
        guest: String::new(),
        status,
        guest_name: String::new(),
        pax: None,
        services: String::new(),
        voucher: String::new(),
        source,
    }
}
