pub mod backup;
pub mod config;
pub mod dates;
pub mod grid;
pub mod logging;
pub mod reservations;
pub mod rooms;
pub mod sheet;
