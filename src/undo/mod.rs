use crate::models::elements::Element;
use crate::models::notation::{Lyric, Tie};
use crate::models::settings::{KeySignature, Skin, TimeSignature};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of snapshots kept in the log
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Full deep copy of the editable state at one point in time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub title: String,
    pub measures: Vec<Vec<Element>>,
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub tempo: u16,
    pub lyrics: Vec<Lyric>,
    pub show_lyrics: bool,
    pub show_fingering: bool,
    pub skin: Skin,
    pub ties: Vec<Tie>,
}

/// Bounded linear undo/redo log of snapshots with a cursor.
///
/// `cursor` always indexes the snapshot that matches the live document.
/// Pushing while the cursor is behind the end discards the forward tail.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create an empty history with the given capacity (at least one entry)
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_size: max_size.max(1),
        }
    }

    /// Record a new state after a mutation
    pub fn push(&mut self, snapshot: Snapshot) {
        // Truncate any redo history when a new state is recorded
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(snapshot);
        self.cursor = self.entries.len() - 1;

        // Enforce max size
        if self.entries.len() > self.max_size {
            self.entries.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Step back one state; `None` at the oldest retained entry
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one state; `None` at the newest entry
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Drop every entry and start over from a single state
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Snapshot the cursor currently points at
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }
}
