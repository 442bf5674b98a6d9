use crate::sheet::utils::fold_text;

/// Occupancy of one room on one night.
///
/// Variant order is the merge precedence: when two cells claim the same
/// room and date, the greater state wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OccupancyState {
    #[default]
    Empty,
    Reserved,
    Blocked,
}

const EMPTY_WORDS: [&str; 7] = ["-", "0", "libre", "free", "empty", "vacio", "disponible"];
const BLOCKED_WORDS: [&str; 9] = [
    "b",
    "bloq",
    "bloqueado",
    "bloqueada",
    "blocked",
    "mant",
    "mantenimiento",
    "fuera de servicio",
    "oos",
];

impl OccupancyState {
    /// Token written into cleaned grids; reading it back gives the same state.
    pub fn as_token(&self) -> &'static str {
        match self {
            OccupancyState::Empty => "",
            OccupancyState::Reserved => "R",
            OccupancyState::Blocked => "B",
        }
    }

    /// Classify a raw grid cell. Any text that is neither an empty marker nor a
    /// blocking marker is a reservation (guest names are often typed straight
    /// into the grid).
    pub fn from_cell(raw: &str) -> Self {
        let folded = fold_text(raw);
        if folded.is_empty() || EMPTY_WORDS.contains(&folded.as_str()) {
            OccupancyState::Empty
        } else if BLOCKED_WORDS.contains(&folded.as_str()) {
            OccupancyState::Blocked
        } else {
            OccupancyState::Reserved
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == OccupancyState::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_markers() {
        use OccupancyState::*;
        for (raw, want) in [
            ("", Empty),
            ("  ", Empty),
            ("-", Empty),
            ("Libre", Empty),
            ("vacío", Empty),
            ("R", Reserved),
            ("x", Reserved),
            ("Reservado", Reserved),
            ("GOMEZ, ANA", Reserved),
            ("B", Blocked),
            ("Bloqueado", Blocked),
            (" Fuera de  servicio ", Blocked),
            ("MANT", Blocked),
        ] {
            assert_eq!(OccupancyState::from_cell(raw), want, "input {raw:?}");
        }
    }

    #[test]
    fn tokens_read_back_to_the_same_state() {
        for s in [
            OccupancyState::Empty,
            OccupancyState::Reserved,
            OccupancyState::Blocked,
        ] {
            assert_eq!(OccupancyState::from_cell(s.as_token()), s);
        }
    }

    #[test]
    fn precedence_is_blocked_then_reserved() {
        assert!(OccupancyState::Blocked > OccupancyState::Reserved);
        assert!(OccupancyState::Reserved > OccupancyState::Empty);
    }
}
