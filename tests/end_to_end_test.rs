// Complete editing session: draft, edits, save, reload in a fresh editor

use pretty_assertions::assert_eq;
use serde_json::json;

use score_editor_wasm::bridge::{Envelope, LocalStore, SaveKind};
use score_editor_wasm::config::EditorConfig;
use score_editor_wasm::lyrics::FieldUpdate;
use score_editor_wasm::models::{Degree, KeySignature, Modifier, ScoreDocument, Tie};
use score_editor_wasm::{Editor, Position};

const ORIGIN: &str = "https://scores.example";

fn pos(m: usize, e: usize) -> Position {
    Position::new(m, e)
}

#[test]
fn test_tied_notes_survive_save_and_reload() {
    let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
    editor.start(0.0);
    assert_eq!(editor.model().measures, vec![vec![]]);

    editor.add_note(Degree::One, 100.0);
    editor.add_note(Degree::Two, 200.0);
    let update = editor.add_tie(pos(0, 0), pos(0, 1), 300.0);
    assert!(update.frame.expect("tie renders").ties_pending);

    editor.save_now(400.0, SaveKind::Manual);
    let created = editor
        .bridge_mut()
        .channel_mut()
        .take()
        .into_iter()
        .find_map(|(envelope, _)| match envelope {
            Envelope::Create(doc) => Some(*doc),
            _ => None,
        })
        .expect("create posted");

    // The local copy matches what was sent to the host
    let key = format!("score:{}", created.score_id);
    let local = editor.bridge().store().get(&key).unwrap().expect("local copy");
    assert_eq!(ScoreDocument::from_json(&local).unwrap(), created);

    let mut reloaded = Editor::in_memory(EditorConfig::default(), ORIGIN);
    reloaded.start(0.0);
    let update = reloaded.handle_message(ORIGIN, json!({"type": "score:load", "payload": created}), 10.0);
    assert!(update.frame.expect("load renders").rebuild);

    let model = reloaded.model();
    assert_eq!(model.measures[0].len(), 2);
    assert_eq!(model.ties, vec![Tie::new(pos(0, 0), pos(0, 1))]);
    assert!(model.resolve_note(pos(0, 0)).is_some());
    assert!(model.resolve_note(pos(0, 1)).is_some());
}

#[test]
fn test_undo_through_editor_updates_flags() {
    let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
    editor.start(0.0);
    assert!(!editor.undo(50.0).can_undo);

    editor.add_note(Degree::Four, 100.0);
    editor.set_modifier(pos(0, 0), Modifier::Sharp, 200.0);
    editor.set_key_signature(KeySignature::F, 300.0);

    let update = editor.undo(400.0);
    assert!(update.can_redo);
    assert_eq!(update.frame.expect("undo renders").header.signature, "C 4/4");

    editor.undo(500.0);
    assert!(editor.model().element_at(pos(0, 0)).unwrap().modifiers().is_empty());

    let update = editor.redo(600.0);
    assert_eq!(editor.model().element_at(pos(0, 0)).unwrap().modifiers(), &[Modifier::Sharp]);
    assert!(update.can_redo);
}

#[test]
fn test_restore_local_copy() {
    let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
    editor.start(0.0);
    editor.set_title("草稿", 100.0);
    editor.save_now(200.0, SaveKind::Auto);
    let id = editor.model().score_id.clone();

    editor.set_title("改过", 300.0);
    let update = editor.restore_local(&id, 400.0);
    assert_eq!(update.frame.expect("restore renders").header.title, "草稿");
    assert!(editor.restore_local("nope", 500.0).frame.is_none());
}

#[test]
fn test_document_snapshot_syncs_lyrics() {
    let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
    editor.start(0.0);
    editor.add_note(Degree::Five, 100.0);
    editor.set_show_lyrics(true, 200.0);

    editor.composition_start(pos(0, 0), "y");
    editor.composition_end(pos(0, 0), "月");
    let doc = editor.to_document();
    assert_eq!(doc.lyrics.len(), 1);
    assert_eq!(doc.lyrics[0].text, "月");
    assert!(doc.settings.show_lyrics);
}

#[test]
fn test_rapid_undo_with_lyrics_keeps_redo_tail() {
    let mut editor = Editor::in_memory(EditorConfig::default(), ORIGIN);
    editor.start(0.0);
    editor.add_note(Degree::One, 100.0);
    editor.set_show_lyrics(true, 200.0);

    let at = pos(0, 0);
    editor.lyric_input(at, "a");
    editor.lyric_input(at, "b");
    assert_eq!(editor.model().lyric_at(at), "b");

    assert!(editor.undo(1_000.0).frame.is_some());
    assert_eq!(editor.model().lyric_at(at), "a");

    // Inside the throttle interval: no frame, but the field still follows the model
    let update = editor.undo(1_005.0);
    assert!(update.frame.is_none());
    assert_eq!(update.fields, vec![FieldUpdate { position: at, value: String::new() }]);
    assert_eq!(editor.model().lyric_at(at), "");

    let update = editor.undo(1_010.0);
    assert!(update.frame.is_none());
    assert!(update.can_redo);
    assert!(!editor.model().settings.show_lyrics);

    for now in [1_015.0, 1_020.0, 1_025.0] {
        editor.redo(now);
    }
    assert_eq!(editor.model().lyric_at(at), "b");
    assert!(!editor.model().can_redo());
    assert!(editor.model().can_undo());

    let deadline = editor.next_deadline().expect("deferred render pending");
    assert!(editor.tick(deadline).frame.is_some());
    assert_eq!(editor.lyrics().field(at).map(|f| f.committed.as_str()), Some("b"));
}
