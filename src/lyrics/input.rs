//! Lyric input coordination
//!
//! Tracks the live state of every bound lyric field so that text typed
//! through an input method is never lost. While a composition is open the
//! field's value is cached as pending and nothing is written to the model;
//! a forced sync before every save or structural render writes each field's
//! pending value (or, failing that, its committed value) into the model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::navigation::{next_eligible, prev_eligible, split_text};
use crate::html_layout::Frame;
use crate::models::{Element, Position, ScoreModel};

/// Live state of one lyric field
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FieldState {
    /// Value last written to the model
    pub committed: String,
    /// Latest value seen while typing or composing
    pub pending: Option<String>,
    pub composing: bool,
}

impl FieldState {
    fn bound(value: &str) -> Self {
        Self {
            committed: value.to_string(),
            pending: None,
            composing: false,
        }
    }

    /// Value a forced sync writes
    pub fn effective(&self) -> &str {
        self.pending.as_deref().unwrap_or(&self.committed)
    }
}

/// Field value JavaScript must write back into an input element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldUpdate {
    #[serde(flatten)]
    pub position: Position,
    pub value: String,
}

/// Result of a keydown in a lyric field
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct KeyOutcome {
    pub prevent_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Position>,
}

/// Coordinates lyric fields with the document model
#[derive(Clone, Debug, Default)]
pub struct LyricCoordinator {
    fields: BTreeMap<Position, FieldState>,
}

impl LyricCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, pos: Position) -> Option<&FieldState> {
        self.fields.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bind a field reflecting the model value
    pub fn bind(&mut self, pos: Position, value: &str) {
        self.fields.insert(pos, FieldState::bound(value));
    }

    /// Replace every binding
    pub fn rebind<'a>(&mut self, fields: impl IntoIterator<Item = (Position, &'a str)>) {
        self.fields.clear();
        for (pos, value) in fields {
            self.bind(pos, value);
        }
    }

    /// Overwrite every bound field with the model's lyric after a history
    /// step. Pending and composing state is discarded, and fields whose
    /// element no longer takes lyrics are dropped. Returns the values
    /// JavaScript must write into the inputs still on screen.
    pub fn restore_from(&mut self, model: &ScoreModel) -> Vec<FieldUpdate> {
        let restored: Vec<FieldUpdate> = if model.settings.show_lyrics {
            self.fields
                .keys()
                .filter(|pos| model.element_at(**pos).map(Element::accepts_lyric).unwrap_or(false))
                .map(|pos| FieldUpdate {
                    position: *pos,
                    value: model.lyric_at(*pos).to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        self.rebind(restored.iter().map(|f| (f.position, f.value.as_str())));
        restored
    }

    /// Drop the fields of one measure row
    pub fn unbind_measure(&mut self, measure_index: usize) {
        self.fields.retain(|pos, _| pos.measure_index != measure_index);
    }

    /// Follow a render frame: rows that were replaced or removed lose their
    /// fields, and every lyric field in the new rows is bound.
    pub fn apply_frame(&mut self, frame: &Frame) {
        if frame.rebuild {
            self.fields.clear();
        }
        for measure_index in frame.removed() {
            self.unbind_measure(measure_index);
        }
        for measure in frame.upserted() {
            self.unbind_measure(measure.measure_index);
            for node in &measure.elements {
                if let Some(lyric) = &node.lyric {
                    self.bind(node.position(), &lyric.value);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Composition events
    // ------------------------------------------------------------------

    pub fn composition_start(&mut self, pos: Position, value: &str) {
        let Some(field) = self.bound_mut(pos, "composition") else {
            return;
        };
        field.composing = true;
        field.pending = Some(value.to_string());
    }

    pub fn composition_update(&mut self, pos: Position, value: &str) {
        self.composition_start(pos, value);
    }

    /// Close the composition and cache the final composed text
    pub fn composition_end(&mut self, pos: Position, value: &str) {
        let Some(field) = self.bound_mut(pos, "composition") else {
            return;
        };
        field.composing = false;
        field.pending = Some(value.to_string());
    }

    pub fn has_active_composition(&self) -> bool {
        self.fields.values().any(|f| f.composing)
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Handle an input event. Outside a composition the value is committed
    /// immediately; multi-character input is distributed across the
    /// following fields. Returns the field values JavaScript must set.
    pub fn on_input(&mut self, model: &mut ScoreModel, pos: Position, value: &str) -> Vec<FieldUpdate> {
        let Some(field) = self.bound_mut(pos, "input") else {
            return Vec::new();
        };
        field.pending = Some(value.to_string());
        if field.composing {
            return Vec::new();
        }

        if value.chars().count() > 1 {
            return self.distribute_text(model, pos, value);
        }
        self.commit(model, pos, value);
        Vec::new()
    }

    /// Space and Enter move forward; Backspace in an empty field moves back
    pub fn on_keydown(&self, model: &ScoreModel, pos: Position, key: &str, value: &str) -> KeyOutcome {
        match key {
            " " | "Space" | "Enter" => KeyOutcome {
                prevent_default: true,
                focus: next_eligible(model, pos),
            },
            "Backspace" if value.is_empty() => KeyOutcome {
                prevent_default: true,
                focus: prev_eligible(model, pos),
            },
            _ => KeyOutcome::default(),
        }
    }

    /// Write the first unit of `text` at `pos` and the remaining units at the
    /// following eligible positions, stopping at the end of the score.
    pub fn distribute_text(&mut self, model: &mut ScoreModel, pos: Position, text: &str) -> Vec<FieldUpdate> {
        let mut units = split_text(text).into_iter();
        let first = units.next().unwrap_or_default();

        let mut updates = vec![FieldUpdate {
            position: pos,
            value: first.clone(),
        }];
        self.commit(model, pos, &first);

        let mut cursor = pos;
        for unit in units {
            let Some(next) = next_eligible(model, cursor) else {
                log::debug!("distribute_text: ran out of fields at {:?}", cursor);
                break;
            };
            cursor = next;
            self.commit(model, next, &unit);
            updates.push(FieldUpdate {
                position: next,
                value: unit,
            });
        }
        updates
    }

    /// Forced sync: write every field's effective value into the model.
    /// Returns true when the model changed.
    pub fn sync_all(&mut self, model: &mut ScoreModel) -> bool {
        let mut changed = false;
        for (pos, field) in self.fields.iter_mut() {
            let value = field.effective().to_string();
            changed |= model.set_lyric(*pos, &value);
            field.committed = value;
            if !field.composing {
                field.pending = None;
            }
        }
        changed
    }

    fn commit(&mut self, model: &mut ScoreModel, pos: Position, value: &str) {
        model.set_lyric(pos, value);
        // Rows outside the virtual window have no field to track
        if let Some(field) = self.fields.get_mut(&pos) {
            field.committed = value.to_string();
            field.pending = None;
        }
    }

    fn bound_mut(&mut self, pos: Position, event: &str) -> Option<&mut FieldState> {
        let field = self.fields.get_mut(&pos);
        if field.is_none() {
            log::warn!("{} event for unbound lyric field {:?}", event, pos);
        }
        field
    }
}
