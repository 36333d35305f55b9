//! Editor session
//!
//! [`Editor`] ties the document model, render engine, lyric coordinator and
//! persistence bridge together and sequences them for each input event:
//! lyric sync, mutation (which records its snapshot), then a render request.
//! Time is supplied by the caller; [`Editor::tick`] fires whatever timers are
//! due and [`Update::next_deadline`] says when to call it again.

use serde::Serialize;
use serde_json::Value;

use crate::bridge::{HostChannel, Inbound, LocalStore, MemoryStore, Notice, PersistenceBridge, RecordingChannel, SaveKind};
use crate::config::EditorConfig;
use crate::html_layout::{Frame, RenderConfig, RenderEngine, RenderStats, TieCurve, TieGeometry, TieMeasurements, Viewport};
use crate::lyrics::{FieldUpdate, KeyOutcome, LyricCoordinator};
use crate::models::{
    Degree, Duration, Element, KeySignature, Modifier, ModelEvent, Octave, Position, ScoreDocument, ScoreModel,
    Skin, SpecialKind, TimeSignature,
};

/// Everything JavaScript must apply after one call
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,

    /// Lyric input values to write back into the DOM
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldUpdate>,

    /// Blur composing lyric fields so the platform commits them
    pub commit_compositions: bool,

    pub can_undo: bool,
    pub can_redo: bool,

    /// When to call `tick` next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_deadline: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingSave {
    at: f64,
    kind: SaveKind,
}

/// One editing session
pub struct Editor<S = MemoryStore, C = RecordingChannel> {
    config: EditorConfig,
    model: ScoreModel,
    renderer: RenderEngine,
    lyrics: LyricCoordinator,
    ties: TieGeometry,
    bridge: PersistenceBridge<S, C>,
    pending_save: Option<PendingSave>,
}

impl<S: LocalStore, C: HostChannel> Editor<S, C> {
    /// Create a session with a blank score
    ///
    /// # Arguments
    /// * `config` - Timing and layout configuration
    /// * `origin` - The editor's own origin
    /// * `store` - Local fallback store
    /// * `channel` - Channel to the host page
    pub fn new(config: EditorConfig, origin: impl Into<String>, store: S, channel: C) -> Self {
        let bridge = PersistenceBridge::new(origin, store, channel, config.autosave_interval_ms);
        Self {
            model: ScoreModel::new(config.history_limit),
            renderer: RenderEngine::new(RenderConfig::from_config(&config)),
            lyrics: LyricCoordinator::new(),
            ties: TieGeometry::from_config(&config),
            bridge,
            pending_save: None,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn model(&self) -> &ScoreModel {
        &self.model
    }

    pub fn renderer(&self) -> &RenderEngine {
        &self.renderer
    }

    pub fn lyrics(&self) -> &LyricCoordinator {
        &self.lyrics
    }

    pub fn bridge(&self) -> &PersistenceBridge<S, C> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut PersistenceBridge<S, C> {
        &mut self.bridge
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// The message listener is installed: announce readiness and draw the
    /// initial frame
    pub fn start(&mut self, now: f64) -> Update {
        self.bridge.mark_ready(now);
        let frame = self.renderer.render(&self.model, true);
        self.lyrics.apply_frame(&frame);
        self.update(Some(frame))
    }

    /// Fire due timers: deferred render, delayed save, autosave
    pub fn tick(&mut self, now: f64) -> Update {
        let frame = self.renderer.tick(&self.model, now);
        if let Some(frame) = &frame {
            self.lyrics.apply_frame(frame);
        }
        let mut update = self.update(frame);

        if let Some(pending) = self.pending_save {
            if now >= pending.at {
                self.pending_save = None;
                update.notices.push(self.perform_save(pending.kind));
            }
        }

        if self.bridge.autosave_due(now) {
            let save = self.save_now(now, SaveKind::Auto);
            update.notices.extend(save.notices);
            update.commit_compositions |= save.commit_compositions;
        }

        update.next_deadline = self.next_deadline();
        update
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<f64> {
        [
            self.renderer.next_deadline(),
            self.pending_save.map(|p| p.at),
            self.bridge.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .reduce(f64::min)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Save now, or after a short delay when a composition is still open
    pub fn save_now(&mut self, now: f64, kind: SaveKind) -> Update {
        if self.lyrics.has_active_composition() {
            log::debug!("composition open, delaying save");
            self.pending_save = Some(PendingSave {
                at: now + self.config.composition_commit_delay_ms,
                kind,
            });
            let mut update = self.update(None);
            update.commit_compositions = true;
            return update;
        }

        let notice = self.perform_save(kind);
        let mut update = self.update(None);
        update.notices.push(notice);
        update
    }

    fn perform_save(&mut self, kind: SaveKind) -> Notice {
        self.lyrics.sync_all(&mut self.model);
        self.bridge.save(&self.model, kind)
    }

    /// Route a message from the host page
    pub fn handle_message(&mut self, origin: &str, data: Value, now: f64) -> Update {
        match self.bridge.handle_message(&mut self.model, origin, data) {
            Inbound::Loaded => self.render_now(now, true),
            Inbound::CreateFailed(notice) => {
                let mut update = self.update(None);
                update.notices.push(notice);
                update
            }
            Inbound::Promoted { .. } | Inbound::Ignored | Inbound::Dropped => self.update(None),
        }
    }

    /// Replace the score with `doc` and redraw
    pub fn load_document(&mut self, doc: ScoreDocument, now: f64) -> Update {
        self.model.load_from_document(doc);
        self.render_now(now, true)
    }

    /// Restore the local copy of `score_id`
    pub fn restore_local(&mut self, score_id: &str, now: f64) -> Update {
        if self.bridge.restore_local(&mut self.model, score_id) {
            self.render_now(now, true)
        } else {
            self.update(None)
        }
    }

    pub fn to_document(&mut self) -> ScoreDocument {
        self.lyrics.sync_all(&mut self.model);
        self.model.to_document()
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn add_note(&mut self, degree: Degree, now: f64) -> Update {
        self.edit(now, |m| m.add_element(Element::note(degree)))
    }

    pub fn add_rest(&mut self, duration: Duration, now: f64) -> Update {
        self.edit(now, |m| m.add_rest(duration))
    }

    pub fn add_extension(&mut self, now: f64) -> Update {
        self.edit(now, |m| m.add_element(Element::extension()))
    }

    pub fn add_special(&mut self, kind: SpecialKind, now: f64) -> Update {
        self.edit(now, |m| m.add_element(Element::special(kind)))
    }

    pub fn add_measure(&mut self, now: f64) -> Update {
        self.edit(now, ScoreModel::add_measure)
    }

    pub fn delete_element(&mut self, pos: Position, now: f64) -> Update {
        self.edit(now, |m| m.delete_element(pos))
    }

    pub fn set_modifier(&mut self, pos: Position, modifier: Modifier, now: f64) -> Update {
        self.edit(now, |m| m.set_modifier(pos, modifier))
    }

    pub fn set_octave(&mut self, pos: Position, octave: Octave, now: f64) -> Update {
        self.edit(now, |m| m.set_octave(pos, octave))
    }

    pub fn set_duration(&mut self, pos: Position, duration: Duration, now: f64) -> Update {
        self.edit(now, |m| m.set_duration(pos, duration))
    }

    pub fn add_tie(&mut self, start: Position, end: Position, now: f64) -> Update {
        self.edit(now, |m| m.add_tie(start, end))
    }

    pub fn set_title(&mut self, title: &str, now: f64) -> Update {
        self.edit(now, |m| m.set_title(title))
    }

    pub fn set_key_signature(&mut self, key: KeySignature, now: f64) -> Update {
        self.edit(now, |m| m.set_key_signature(key))
    }

    pub fn set_time_signature(&mut self, meter: TimeSignature, now: f64) -> Update {
        self.edit(now, |m| m.set_time_signature(meter))
    }

    pub fn set_tempo(&mut self, tempo: i64, now: f64) -> Update {
        self.edit(now, |m| m.set_tempo(tempo))
    }

    pub fn set_skin(&mut self, skin: Skin, now: f64) -> Update {
        self.edit(now, |m| m.set_skin(skin))
    }

    pub fn set_show_lyrics(&mut self, show: bool, now: f64) -> Update {
        self.edit(now, |m| m.set_show_lyrics(show))
    }

    pub fn set_show_fingering(&mut self, show: bool, now: f64) -> Update {
        self.edit(now, |m| m.set_show_fingering(show))
    }

    pub fn clear_lyrics(&mut self, now: f64) -> Update {
        self.edit(now, ScoreModel::clear_all_lyrics)
    }

    pub fn undo(&mut self, now: f64) -> Update {
        self.step_history(now, ScoreModel::undo)
    }

    pub fn redo(&mut self, now: f64) -> Update {
        self.step_history(now, ScoreModel::redo)
    }

    /// Sync lyric fields, apply `mutate`, and request a render if it acted
    fn edit(&mut self, now: f64, mutate: impl FnOnce(&mut ScoreModel) -> bool) -> Update {
        self.lyrics.sync_all(&mut self.model);
        if !mutate(&mut self.model) {
            return self.update(None);
        }
        for event in self.model.take_events() {
            let ModelEvent::ElementAdded { measure_index } = event;
            self.renderer.note_element_added(&self.model, measure_index);
        }
        self.render_now(now, false)
    }

    /// Restore a snapshot. Field state is overwritten from the restored
    /// model rather than synced into it, even when the render is deferred.
    fn step_history(&mut self, now: f64, step: impl FnOnce(&mut ScoreModel) -> bool) -> Update {
        if !step(&mut self.model) {
            return self.update(None);
        }
        self.model.take_events();
        let fields = self.lyrics.restore_from(&self.model);
        let mut update = self.render_now(now, false);
        if update.frame.is_none() {
            update.fields = fields;
        }
        update
    }

    // ------------------------------------------------------------------
    // Lyric fields
    // ------------------------------------------------------------------

    pub fn composition_start(&mut self, pos: Position, value: &str) {
        self.lyrics.composition_start(pos, value);
    }

    pub fn composition_update(&mut self, pos: Position, value: &str) {
        self.lyrics.composition_update(pos, value);
    }

    pub fn composition_end(&mut self, pos: Position, value: &str) {
        self.lyrics.composition_end(pos, value);
    }

    pub fn lyric_input(&mut self, pos: Position, value: &str) -> Update {
        let fields = self.lyrics.on_input(&mut self.model, pos, value);
        let mut update = self.update(None);
        update.fields = fields;
        update
    }

    /// Spread pasted text over the lyric fields starting at `pos`
    pub fn distribute_text(&mut self, pos: Position, text: &str) -> Update {
        let fields = self.lyrics.distribute_text(&mut self.model, pos, text);
        let mut update = self.update(None);
        update.fields = fields;
        update
    }

    pub fn lyric_keydown(&self, pos: Position, key: &str, value: &str) -> KeyOutcome {
        self.lyrics.on_keydown(&self.model, pos, key, value)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Request a render; `force` rebuilds the container
    pub fn render(&mut self, now: f64, force: bool) -> Update {
        self.lyrics.sync_all(&mut self.model);
        self.render_now(now, force)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Update {
        let frame = self.renderer.set_viewport(&self.model, viewport);
        if let Some(frame) = &frame {
            self.lyrics.apply_frame(frame);
        }
        self.update(frame)
    }

    /// Tie pass, run after the host laid out the last frame
    pub fn resolve_ties(&self, measurements: &TieMeasurements) -> Vec<TieCurve> {
        self.ties.resolve(&self.model, measurements)
    }

    pub fn report_image(&mut self, src: &str, loaded: bool, now: f64) -> Update {
        if self.renderer.report_image(src, loaded) {
            self.render_now(now, false)
        } else {
            self.update(None)
        }
    }

    pub fn clear_caches(&mut self) {
        self.renderer.clear_caches();
    }

    pub fn stats(&self) -> RenderStats {
        self.renderer.stats(&self.model)
    }

    fn render_now(&mut self, now: f64, force: bool) -> Update {
        let frame = self.renderer.request(&self.model, now, force);
        if let Some(frame) = &frame {
            self.lyrics.apply_frame(frame);
        }
        self.update(frame)
    }

    fn update(&self, frame: Option<Frame>) -> Update {
        Update {
            frame,
            can_undo: self.model.can_undo(),
            can_redo: self.model.can_redo(),
            next_deadline: self.next_deadline(),
            ..Update::default()
        }
    }
}

impl Editor {
    /// A session backed by in-memory store and channel
    pub fn in_memory(config: EditorConfig, origin: impl Into<String>) -> Self {
        Self::new(config, origin, MemoryStore::new(), RecordingChannel::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Identity;

    const ORIGIN: &str = "https://scores.example";

    fn editor() -> Editor {
        let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
        editor.start(0.0);
        editor
    }

    #[test]
    fn test_edit_renders_and_scrolls() {
        let mut editor = editor();
        let update = editor.add_note(Degree::One, 100.0);
        let frame = update.frame.expect("rendered");
        assert_eq!(frame.scroll, Some(crate::html_layout::ScrollTarget::Bottom));
        assert!(update.can_undo);
    }

    #[test]
    fn test_rejected_edit_does_not_render() {
        let mut editor = editor();
        let update = editor.delete_element(Position::new(0, 3), 100.0);
        assert!(update.frame.is_none());
        assert!(!update.can_undo);
    }

    #[test]
    fn test_burst_renders_once_deferred() {
        let mut editor = editor();
        assert!(editor.add_note(Degree::One, 100.0).frame.is_some());
        assert!(editor.add_note(Degree::Two, 105.0).frame.is_none());
        let update = editor.add_note(Degree::Three, 110.0);
        assert!(update.frame.is_none());
        assert_eq!(update.next_deadline, Some(126.0));

        let frame = editor.tick(126.0).frame.expect("deferred render");
        assert!(frame.rebuild);
        assert_eq!(frame.upserted().next().map(|m| m.elements.len()), Some(3));
    }

    #[test]
    fn test_save_waits_for_composition() {
        let mut editor = editor();
        editor.add_note(Degree::One, 100.0);
        editor.set_show_lyrics(true, 200.0);

        let pos = Position::new(0, 0);
        editor.composition_start(pos, "h");
        let update = editor.save_now(300.0, SaveKind::Manual);
        assert!(update.commit_compositions);
        assert!(update.notices.is_empty());
        assert_eq!(update.next_deadline, Some(420.0));

        editor.composition_end(pos, "好");
        let update = editor.tick(420.0);
        assert_eq!(update.notices.len(), 1);
        assert_eq!(editor.model().lyric_at(pos), "好");
        assert_eq!(editor.bridge().identity(), Identity::Creating);
    }

    #[test]
    fn test_autosave_fires_on_tick() {
        let mut editor = editor();
        assert!(editor.tick(59_000.0).notices.is_empty());
        let update = editor.tick(60_000.0);
        assert_eq!(update.notices.len(), 1);
        assert_eq!(editor.bridge().channel().types(), vec!["iframe:ready", "score:create"]);
    }
}
