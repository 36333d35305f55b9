//! Document model for the score editor
//!
//! [`ScoreModel`] is the single source of truth for the score during a
//! session. Every structural mutation goes through it and records a snapshot
//! in the owned [`History`]. Out-of-range or ill-typed targets are absorbed as
//! no-ops: the mutator returns `false` and nothing is recorded.

use chrono::{DateTime, SecondsFormat, Utc};

use super::document::{DocumentSettings, ScoreDocument, DEFAULT_TITLE, DOCUMENT_VERSION};
use super::elements::{Duration, Element, Modifier, Octave, RestGroup};
use super::notation::{Lyric, Position, Tie};
use super::settings::{clamp_tempo, KeySignature, Settings, Skin, TimeSignature};
use crate::undo::{History, Snapshot, DEFAULT_HISTORY_LIMIT};

/// Format a timestamp the way the persistence API stores them
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a fresh draft identity
pub fn generate_score_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Notifications emitted by the model and drained by the editor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelEvent {
    /// An element or measure was appended; the view scrolls to it
    ElementAdded { measure_index: usize },
}

/// The live score plus its undo history
#[derive(Clone, Debug)]
pub struct ScoreModel {
    pub score_id: String,
    pub owner_user_id: Option<String>,
    pub created_at: Option<String>,
    pub title: String,
    pub measures: Vec<Vec<Element>>,
    pub ties: Vec<Tie>,
    pub lyrics: Vec<Lyric>,
    pub settings: Settings,
    history: History,
    events: Vec<ModelEvent>,
}

impl Default for ScoreModel {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl ScoreModel {
    /// A blank score with a generated draft identity and one empty measure
    pub fn new(history_limit: usize) -> Self {
        let mut model = Self {
            score_id: generate_score_id(),
            owner_user_id: None,
            created_at: Some(timestamp(Utc::now())),
            title: DEFAULT_TITLE.to_string(),
            measures: vec![Vec::new()],
            ties: Vec::new(),
            lyrics: Vec::new(),
            settings: Settings::default(),
            history: History::new(history_limit),
            events: Vec::new(),
        };
        model.save_state();
        model
    }

    // ------------------------------------------------------------------
    // Resolvers
    // ------------------------------------------------------------------

    pub fn element_at(&self, pos: Position) -> Option<&Element> {
        self.measures
            .get(pos.measure_index)
            .and_then(|m| m.get(pos.element_index))
    }

    fn element_at_mut(&mut self, pos: Position) -> Option<&mut Element> {
        self.measures
            .get_mut(pos.measure_index)
            .and_then(|m| m.get_mut(pos.element_index))
    }

    /// The element at `pos` if, and only if, it is a note
    pub fn resolve_note(&self, pos: Position) -> Option<&Element> {
        self.element_at(pos).filter(|el| el.is_note())
    }

    /// Lyric text at `pos` (empty when none)
    pub fn lyric_at(&self, pos: Position) -> &str {
        self.lyrics
            .iter()
            .find(|l| l.position() == pos)
            .map(|l| l.text.as_str())
            .unwrap_or("")
    }

    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    pub fn element_count(&self) -> usize {
        self.measures.iter().map(Vec::len).sum()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Drain notifications raised since the last call
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Local fallback storage key for this score
    pub fn storage_key(&self) -> String {
        let id = if self.score_id.is_empty() {
            "default"
        } else {
            self.score_id.as_str()
        };
        format!("score:{}", id)
    }

    // ------------------------------------------------------------------
    // Structural mutations
    // ------------------------------------------------------------------

    /// Append an element to the last measure
    pub fn add_element(&mut self, element: Element) -> bool {
        if self.measures.is_empty() {
            self.measures.push(Vec::new());
        }
        let last = self.measures.len() - 1;
        self.measures[last].push(element);
        self.save_state();
        self.events.push(ModelEvent::ElementAdded { measure_index: last });
        true
    }

    /// Append a rest from the palette. Whole and half rests become groups of
    /// quarter rests (4 and 2 cells) so each cell can carry its own lyric.
    pub fn add_rest(&mut self, duration: Duration) -> bool {
        let (count, group) = match duration {
            Duration::Whole => (4, Some(RestGroup::Full)),
            Duration::Half => (2, Some(RestGroup::Half)),
            _ => (1, None),
        };
        let cell_duration = if group.is_some() { Duration::Quarter } else { duration };
        for _ in 0..count {
            self.add_element(Element::rest(cell_duration, group));
        }
        true
    }

    /// Append an empty measure
    pub fn add_measure(&mut self) -> bool {
        self.measures.push(Vec::new());
        self.save_state();
        self.events.push(ModelEvent::ElementAdded {
            measure_index: self.measures.len() - 1,
        });
        true
    }

    /// Remove one element. Ties and lyrics keep their indices; any that now
    /// point elsewhere simply stop resolving.
    pub fn delete_element(&mut self, pos: Position) -> bool {
        let Some(measure) = self.measures.get_mut(pos.measure_index) else {
            log::debug!("delete_element: measure {} out of range", pos.measure_index);
            return false;
        };
        if pos.element_index >= measure.len() {
            log::debug!("delete_element: element {:?} out of range", pos);
            return false;
        }
        measure.remove(pos.element_index);
        self.save_state();
        true
    }

    pub fn set_modifier(&mut self, pos: Position, modifier: Modifier) -> bool {
        let changed = self
            .element_at_mut(pos)
            .map(|el| el.apply_modifier(modifier))
            .unwrap_or(false);
        if changed {
            self.save_state();
        }
        changed
    }

    /// Toggle the octave marker of a note (choosing the current marker clears it)
    pub fn set_octave(&mut self, pos: Position, octave: Octave) -> bool {
        let changed = self
            .element_at_mut(pos)
            .map(|el| el.toggle_octave(octave))
            .unwrap_or(false);
        if changed {
            self.save_state();
        }
        changed
    }

    /// Change the duration class of a note or rest.
    ///
    /// The run of extension cells directly after the element is replaced by
    /// the count the new duration requires (3 for whole, 1 for half, else 0).
    pub fn set_duration(&mut self, pos: Position, duration: Duration) -> bool {
        let Some(measure) = self.measures.get_mut(pos.measure_index) else {
            return false;
        };
        let Some(element) = measure.get_mut(pos.element_index) else {
            return false;
        };
        if !element.set_duration(duration) {
            return false;
        }

        let first = pos.element_index + 1;
        let existing = measure[first..]
            .iter()
            .take_while(|el| el.is_extension())
            .count();
        measure.drain(first..first + existing);
        for i in 0..duration.extension_count() {
            measure.insert(first + i, Element::extension());
        }

        self.save_state();
        true
    }

    /// Tie two notes. Ties are append-only; both endpoints must currently be
    /// distinct notes.
    pub fn add_tie(&mut self, start: Position, end: Position) -> bool {
        if start == end || self.resolve_note(start).is_none() || self.resolve_note(end).is_none() {
            log::debug!("add_tie: rejected {:?} -> {:?}", start, end);
            return false;
        }
        self.ties.push(Tie::new(start, end));
        self.save_state();
        true
    }

    /// Write the lyric at `pos`; empty (after trimming) text removes it
    pub fn set_lyric(&mut self, pos: Position, text: &str) -> bool {
        let text = text.trim();
        if self.lyric_at(pos) == text {
            return false;
        }
        if !text.is_empty() && !self.element_at(pos).map(Element::accepts_lyric).unwrap_or(false) {
            log::debug!("set_lyric: {:?} does not take lyrics", pos);
            return false;
        }

        self.lyrics.retain(|l| l.position() != pos);
        if !text.is_empty() {
            self.lyrics.push(Lyric {
                measure_index: pos.measure_index,
                element_index: pos.element_index,
                text: text.to_string(),
            });
        }
        self.save_state();
        true
    }

    pub fn clear_all_lyrics(&mut self) -> bool {
        self.lyrics.clear();
        self.save_state();
        true
    }

    // ------------------------------------------------------------------
    // Settings mutations
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_string();
        self.save_state();
        true
    }

    pub fn set_key_signature(&mut self, key: KeySignature) -> bool {
        self.update_setting(|s| &mut s.key_signature, key)
    }

    pub fn set_time_signature(&mut self, meter: TimeSignature) -> bool {
        self.update_setting(|s| &mut s.time_signature, meter)
    }

    pub fn set_tempo(&mut self, tempo: i64) -> bool {
        self.update_setting(|s| &mut s.tempo, clamp_tempo(tempo))
    }

    pub fn set_skin(&mut self, skin: Skin) -> bool {
        self.update_setting(|s| &mut s.skin, skin)
    }

    pub fn set_show_lyrics(&mut self, show: bool) -> bool {
        self.update_setting(|s| &mut s.show_lyrics, show)
    }

    pub fn set_show_fingering(&mut self, show: bool) -> bool {
        self.update_setting(|s| &mut s.show_fingering, show)
    }

    fn update_setting<T: PartialEq>(&mut self, field: impl FnOnce(&mut Settings) -> &mut T, value: T) -> bool {
        let slot = field(&mut self.settings);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.save_state();
        true
    }

    /// Replace the draft identity with the durable one issued by the host
    pub fn promote_identity(&mut self, score_id: &str) {
        self.score_id = score_id.to_string();
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            measures: self.measures.clone(),
            key_signature: self.settings.key_signature,
            time_signature: self.settings.time_signature,
            tempo: self.settings.tempo,
            lyrics: self.lyrics.clone(),
            show_lyrics: self.settings.show_lyrics,
            show_fingering: self.settings.show_fingering,
            skin: self.settings.skin,
            ties: self.ties.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.title = snapshot.title;
        self.measures = snapshot.measures;
        self.settings.key_signature = snapshot.key_signature;
        self.settings.time_signature = snapshot.time_signature;
        self.settings.tempo = snapshot.tempo;
        self.lyrics = snapshot.lyrics;
        self.settings.show_lyrics = snapshot.show_lyrics;
        self.settings.show_fingering = snapshot.show_fingering;
        self.settings.skin = snapshot.skin;
        self.ties = snapshot.ties;
    }

    fn save_state(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
    }

    /// Step back one snapshot; false at the oldest retained state
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Step forward one snapshot; false at the newest state
    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize the score, stamping `updatedAt` with the current time
    pub fn to_document(&self) -> ScoreDocument {
        self.to_document_at(Utc::now())
    }

    pub fn to_document_at(&self, now: DateTime<Utc>) -> ScoreDocument {
        let now = timestamp(now);
        ScoreDocument {
            version: DOCUMENT_VERSION.to_string(),
            score_id: self.score_id.clone(),
            owner_user_id: self.owner_user_id.clone(),
            title: self.title.clone(),
            measures: self.measures.clone(),
            ties: self.ties.clone(),
            lyrics: self.lyrics.clone(),
            settings: DocumentSettings {
                key_signature: self.settings.key_signature,
                time_signature: self.settings.time_signature,
                tempo: self.settings.tempo,
                skin: self.settings.skin,
                show_lyrics: self.settings.show_lyrics,
                show_fingering: None,
            },
            created_at: Some(self.created_at.clone().unwrap_or_else(|| now.clone())),
            updated_at: Some(now),
        }
    }

    /// Replace every field from an external document. The fingering overlay
    /// always starts hidden. The load itself is recorded as a new snapshot.
    pub fn load_from_document(&mut self, doc: ScoreDocument) {
        let doc = doc.normalized();
        if !doc.score_id.is_empty() {
            self.score_id = doc.score_id;
        }
        if doc.owner_user_id.is_some() {
            self.owner_user_id = doc.owner_user_id;
        }
        self.created_at = Some(doc.created_at.unwrap_or_else(|| timestamp(Utc::now())));
        self.title = doc.title;
        self.measures = doc.measures;
        self.ties = doc.ties;
        self.lyrics = doc.lyrics;
        self.settings = Settings {
            key_signature: doc.settings.key_signature,
            time_signature: doc.settings.time_signature,
            tempo: doc.settings.tempo,
            skin: doc.settings.skin,
            show_lyrics: doc.settings.show_lyrics,
            show_fingering: false,
        };
        self.save_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::elements::{Degree, SpecialKind};

    fn pos(m: usize, e: usize) -> Position {
        Position::new(m, e)
    }

    #[test]
    fn test_blank_model() {
        let model = ScoreModel::default();
        assert_eq!(model.measures, vec![Vec::<Element>::new()]);
        assert_eq!(model.settings.tempo, 120);
        assert_eq!(model.history().len(), 1);
        assert!(!model.can_undo());
    }

    #[test]
    fn test_add_element_emits_event() {
        let mut model = ScoreModel::default();
        model.add_measure();
        model.add_element(Element::note(Degree::One));

        assert_eq!(model.measures[1].len(), 1);
        assert_eq!(
            model.take_events(),
            vec![
                ModelEvent::ElementAdded { measure_index: 1 },
                ModelEvent::ElementAdded { measure_index: 1 },
            ]
        );
        assert!(model.take_events().is_empty());
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut model = ScoreModel::default();
        let before = model.history().len();
        assert!(!model.delete_element(pos(0, 0)));
        assert!(!model.delete_element(pos(7, 0)));
        assert_eq!(model.history().len(), before);
    }

    #[test]
    fn test_set_duration_replaces_extensions() {
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::One));
        model.add_element(Element::note(Degree::Two));

        model.set_duration(pos(0, 0), Duration::Whole);
        assert_eq!(model.measures[0].len(), 5);
        assert!(model.measures[0][1..4].iter().all(Element::is_extension));
        assert!(model.measures[0][4].is_note());

        model.set_duration(pos(0, 0), Duration::Half);
        assert_eq!(model.measures[0].len(), 3);
        assert!(model.measures[0][1].is_extension());

        model.set_duration(pos(0, 0), Duration::Eighth);
        assert_eq!(model.measures[0].len(), 2);
        assert_eq!(model.measures[0][0].duration(), Some(Duration::Eighth));
    }

    #[test]
    fn test_set_duration_ignores_specials() {
        let mut model = ScoreModel::default();
        model.add_element(Element::special(SpecialKind::Bar));
        assert!(!model.set_duration(pos(0, 0), Duration::Whole));
        assert_eq!(model.measures[0].len(), 1);
    }

    #[test]
    fn test_add_rest_groups() {
        let mut model = ScoreModel::default();
        model.add_rest(Duration::Whole);
        model.add_rest(Duration::Half);
        model.add_rest(Duration::Eighth);

        let measure = &model.measures[0];
        assert_eq!(measure.len(), 7);
        assert_eq!(measure[0], Element::rest(Duration::Quarter, Some(RestGroup::Full)));
        assert_eq!(measure[5], Element::rest(Duration::Quarter, Some(RestGroup::Half)));
        assert_eq!(measure[6], Element::rest(Duration::Eighth, None));
    }

    #[test]
    fn test_tie_requires_notes() {
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::One));
        model.add_element(Element::rest(Duration::Quarter, None));
        model.add_element(Element::note(Degree::Two));

        assert!(!model.add_tie(pos(0, 0), pos(0, 1)));
        assert!(!model.add_tie(pos(0, 0), pos(0, 0)));
        assert!(model.add_tie(pos(0, 2), pos(0, 0)));
        assert_eq!(model.ties.len(), 1);
    }

    #[test]
    fn test_lyrics_replace_and_delete() {
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::One));
        model.add_element(Element::special(SpecialKind::Bar));

        assert!(model.set_lyric(pos(0, 0), " la "));
        assert!(model.set_lyric(pos(0, 0), "li"));
        assert_eq!(model.lyrics.len(), 1);
        assert_eq!(model.lyric_at(pos(0, 0)), "li");
        assert!(!model.set_lyric(pos(0, 0), "li"));

        assert!(!model.set_lyric(pos(0, 1), "x"));
        assert!(model.set_lyric(pos(0, 0), "   "));
        assert!(model.lyrics.is_empty());
    }

    #[test]
    fn test_undo_restores_title_and_tempo() {
        let mut model = ScoreModel::default();
        model.set_title("Song");
        model.set_tempo(90);

        assert!(model.undo());
        assert_eq!(model.settings.tempo, 120);
        assert!(model.undo());
        assert_eq!(model.title, DEFAULT_TITLE);
        assert!(!model.undo());
    }

    #[test]
    fn test_to_document_preserves_created_at() {
        let mut model = ScoreModel::default();
        model.created_at = Some("2024-01-01T00:00:00.000Z".to_string());
        let now = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.010Z")
            .unwrap()
            .with_timezone(&Utc);

        let doc = model.to_document_at(now);
        assert_eq!(doc.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(doc.updated_at.as_deref(), Some("2024-05-06T07:08:09.010Z"));
        assert_eq!(doc.settings.show_fingering, None);
    }

    #[test]
    fn test_load_resets_fingering() {
        let mut model = ScoreModel::default();
        let mut doc = ScoreDocument::blank("persisted");
        doc.settings.show_fingering = Some(true);

        model.load_from_document(doc);
        assert_eq!(model.score_id, "persisted");
        assert!(!model.settings.show_fingering);
        assert_eq!(model.storage_key(), "score:persisted");
    }
}
