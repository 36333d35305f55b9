//! Lyric input: field state, composition handling and navigation

pub mod input;
pub mod navigation;

pub use input::{FieldState, FieldUpdate, KeyOutcome, LyricCoordinator};
pub use navigation::{next_eligible, prev_eligible, split_text};
