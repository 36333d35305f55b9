//! Position references and the annotations that use them (ties, lyrics)

use serde::{Deserialize, Serialize};

/// Index pair locating an element: `(measureIndex, noteIndex)` on the wire.
///
/// Positions are not object references. Any mutation that removes or shifts
/// elements can leave a position pointing at a different element or nothing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    #[serde(rename = "measureIndex")]
    pub measure_index: usize,
    #[serde(rename = "noteIndex")]
    pub element_index: usize,
}

impl Position {
    pub fn new(measure_index: usize, element_index: usize) -> Self {
        Self {
            measure_index,
            element_index,
        }
    }
}

/// A tie between two note positions, in declaration order
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tie {
    pub start: Position,
    pub end: Position,
}

impl Tie {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Lyric text attached to one note or rest
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lyric {
    #[serde(rename = "measureIndex")]
    pub measure_index: usize,
    #[serde(rename = "noteIndex")]
    pub element_index: usize,
    pub text: String,
}

impl Lyric {
    pub fn position(&self) -> Position {
        Position::new(self.measure_index, self.element_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wire_names() {
        let tie = Tie::new(Position::new(0, 0), Position::new(0, 1));
        let json = serde_json::to_string(&tie).unwrap();
        assert_eq!(
            json,
            r#"{"start":{"measureIndex":0,"noteIndex":0},"end":{"measureIndex":0,"noteIndex":1}}"#
        );
    }

    #[test]
    fn test_positions_order_by_document_order() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
    }
}
