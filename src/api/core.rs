//! WASM API for the score editor
//!
//! The editor session lives in WASM memory; JavaScript calls these functions
//! with DOM events and timestamps (`performance.now()`) and applies the
//! returned `Update` objects.

use lazy_static::lazy_static;
use std::sync::Mutex;
use wasm_bindgen::prelude::*;

use super::helpers::{deserialize, parse_token, serialize, validation_error};
use super::web::{current_origin, ParentChannel, WebStorage};
use crate::bridge::SaveKind;
use crate::config::EditorConfig;
use crate::editor::{Editor, Update};
use crate::html_layout::{TieMeasurements, Viewport};
use crate::models::{Position, ScoreDocument};
use crate::{wasm_info, wasm_warn};

type WebEditor = Editor<WebStorage, ParentChannel>;

// WASM-owned editor session (canonical source of truth)
lazy_static! {
    static ref EDITOR: Mutex<Option<WebEditor>> = Mutex::new(None);
}

fn with_editor<T>(f: impl FnOnce(&mut WebEditor) -> T) -> Result<T, JsValue> {
    let mut guard = EDITOR
        .lock()
        .map_err(|_| validation_error("Editor state lock poisoned"))?;
    let editor = guard
        .as_mut()
        .ok_or_else(|| JsValue::from_str("Editor not initialized"))?;
    Ok(f(editor))
}

fn apply(context: &str, f: impl FnOnce(&mut WebEditor) -> Update) -> Result<JsValue, JsValue> {
    let update = with_editor(f)?;
    serialize(&update, context)
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create the editor session
///
/// # Parameters
/// - `config_js`: Partial `EditorConfig` object, or `undefined` for defaults
#[wasm_bindgen(js_name = initEditor)]
pub fn init_editor(config_js: JsValue) -> Result<(), JsValue> {
    let config: EditorConfig = if config_js.is_undefined() || config_js.is_null() {
        EditorConfig::default()
    } else {
        deserialize(config_js, "Config deserialization error")?
    };

    let origin = current_origin().ok_or_else(|| validation_error("Cannot determine page origin"))?;
    wasm_info!("initEditor: origin={}, virtualThreshold={}", origin, config.virtual_threshold);

    let editor = Editor::new(config, origin, WebStorage, ParentChannel);
    let mut guard = EDITOR
        .lock()
        .map_err(|_| validation_error("Editor state lock poisoned"))?;
    *guard = Some(editor);
    Ok(())
}

/// Announce readiness to the host and draw the first frame
#[wasm_bindgen(js_name = startEditor)]
pub fn start_editor(now: f64) -> Result<JsValue, JsValue> {
    apply("startEditor", |e| e.start(now))
}

/// Fire due timers
#[wasm_bindgen(js_name = tick)]
pub fn tick(now: f64) -> Result<JsValue, JsValue> {
    apply("tick", |e| e.tick(now))
}

// ============================================================================
// Editing
// ============================================================================

#[wasm_bindgen(js_name = addNote)]
pub fn add_note(degree: &str, now: f64) -> Result<JsValue, JsValue> {
    let degree = parse_token(degree, "degree")?;
    apply("addNote", |e| e.add_note(degree, now))
}

#[wasm_bindgen(js_name = addRest)]
pub fn add_rest(duration: &str, now: f64) -> Result<JsValue, JsValue> {
    let duration = parse_token(duration, "duration")?;
    apply("addRest", |e| e.add_rest(duration, now))
}

#[wasm_bindgen(js_name = addExtension)]
pub fn add_extension(now: f64) -> Result<JsValue, JsValue> {
    apply("addExtension", |e| e.add_extension(now))
}

#[wasm_bindgen(js_name = addSpecial)]
pub fn add_special(kind: &str, now: f64) -> Result<JsValue, JsValue> {
    let kind = parse_token(kind, "special symbol")?;
    apply("addSpecial", |e| e.add_special(kind, now))
}

#[wasm_bindgen(js_name = addMeasure)]
pub fn add_measure(now: f64) -> Result<JsValue, JsValue> {
    apply("addMeasure", |e| e.add_measure(now))
}

#[wasm_bindgen(js_name = deleteElement)]
pub fn delete_element(measure_index: usize, note_index: usize, now: f64) -> Result<JsValue, JsValue> {
    let pos = Position::new(measure_index, note_index);
    apply("deleteElement", |e| e.delete_element(pos, now))
}

#[wasm_bindgen(js_name = setModifier)]
pub fn set_modifier(measure_index: usize, note_index: usize, modifier: &str, now: f64) -> Result<JsValue, JsValue> {
    let modifier = parse_token(modifier, "modifier")?;
    let pos = Position::new(measure_index, note_index);
    apply("setModifier", |e| e.set_modifier(pos, modifier, now))
}

#[wasm_bindgen(js_name = setOctave)]
pub fn set_octave(measure_index: usize, note_index: usize, octave: &str, now: f64) -> Result<JsValue, JsValue> {
    let octave = parse_token(octave, "octave")?;
    let pos = Position::new(measure_index, note_index);
    apply("setOctave", |e| e.set_octave(pos, octave, now))
}

#[wasm_bindgen(js_name = setDuration)]
pub fn set_duration(measure_index: usize, note_index: usize, duration: &str, now: f64) -> Result<JsValue, JsValue> {
    let duration = parse_token(duration, "duration")?;
    let pos = Position::new(measure_index, note_index);
    apply("setDuration", |e| e.set_duration(pos, duration, now))
}

#[wasm_bindgen(js_name = addTie)]
pub fn add_tie(
    start_measure: usize,
    start_note: usize,
    end_measure: usize,
    end_note: usize,
    now: f64,
) -> Result<JsValue, JsValue> {
    let start = Position::new(start_measure, start_note);
    let end = Position::new(end_measure, end_note);
    apply("addTie", |e| e.add_tie(start, end, now))
}

#[wasm_bindgen(js_name = setTitle)]
pub fn set_title(title: &str, now: f64) -> Result<JsValue, JsValue> {
    apply("setTitle", |e| e.set_title(title, now))
}

#[wasm_bindgen(js_name = setKeySignature)]
pub fn set_key_signature(key: &str, now: f64) -> Result<JsValue, JsValue> {
    let key = parse_token(key, "key signature")?;
    apply("setKeySignature", |e| e.set_key_signature(key, now))
}

#[wasm_bindgen(js_name = setTimeSignature)]
pub fn set_time_signature(meter: &str, now: f64) -> Result<JsValue, JsValue> {
    let meter = parse_token(meter, "time signature")?;
    apply("setTimeSignature", |e| e.set_time_signature(meter, now))
}

#[wasm_bindgen(js_name = setTempo)]
pub fn set_tempo(tempo: f64, now: f64) -> Result<JsValue, JsValue> {
    if !tempo.is_finite() {
        return Err(validation_error(format!("Invalid tempo: {}", tempo)));
    }
    apply("setTempo", |e| e.set_tempo(tempo.round() as i64, now))
}

#[wasm_bindgen(js_name = setSkin)]
pub fn set_skin(skin: &str, now: f64) -> Result<JsValue, JsValue> {
    let skin = parse_token(skin, "skin")?;
    apply("setSkin", |e| e.set_skin(skin, now))
}

#[wasm_bindgen(js_name = setShowLyrics)]
pub fn set_show_lyrics(show: bool, now: f64) -> Result<JsValue, JsValue> {
    apply("setShowLyrics", |e| e.set_show_lyrics(show, now))
}

#[wasm_bindgen(js_name = setShowFingering)]
pub fn set_show_fingering(show: bool, now: f64) -> Result<JsValue, JsValue> {
    apply("setShowFingering", |e| e.set_show_fingering(show, now))
}

#[wasm_bindgen(js_name = clearLyrics)]
pub fn clear_lyrics(now: f64) -> Result<JsValue, JsValue> {
    apply("clearLyrics", |e| e.clear_lyrics(now))
}

#[wasm_bindgen(js_name = undo)]
pub fn undo(now: f64) -> Result<JsValue, JsValue> {
    apply("undo", |e| e.undo(now))
}

#[wasm_bindgen(js_name = redo)]
pub fn redo(now: f64) -> Result<JsValue, JsValue> {
    apply("redo", |e| e.redo(now))
}

// ============================================================================
// Lyric fields
// ============================================================================

#[wasm_bindgen(js_name = compositionStart)]
pub fn composition_start(measure_index: usize, note_index: usize, value: &str) -> Result<(), JsValue> {
    with_editor(|e| e.composition_start(Position::new(measure_index, note_index), value))
}

#[wasm_bindgen(js_name = compositionUpdate)]
pub fn composition_update(measure_index: usize, note_index: usize, value: &str) -> Result<(), JsValue> {
    with_editor(|e| e.composition_update(Position::new(measure_index, note_index), value))
}

#[wasm_bindgen(js_name = compositionEnd)]
pub fn composition_end(measure_index: usize, note_index: usize, value: &str) -> Result<(), JsValue> {
    with_editor(|e| e.composition_end(Position::new(measure_index, note_index), value))
}

#[wasm_bindgen(js_name = lyricInput)]
pub fn lyric_input(measure_index: usize, note_index: usize, value: &str) -> Result<JsValue, JsValue> {
    apply("lyricInput", |e| e.lyric_input(Position::new(measure_index, note_index), value))
}

#[wasm_bindgen(js_name = distributeText)]
pub fn distribute_text(measure_index: usize, note_index: usize, text: &str) -> Result<JsValue, JsValue> {
    apply("distributeText", |e| e.distribute_text(Position::new(measure_index, note_index), text))
}

/// Keyboard navigation between lyric fields
///
/// # Returns
/// `{preventDefault, focus?: {measureIndex, noteIndex}}`
#[wasm_bindgen(js_name = lyricKeydown)]
pub fn lyric_keydown(measure_index: usize, note_index: usize, key: &str, value: &str) -> Result<JsValue, JsValue> {
    let outcome = with_editor(|e| e.lyric_keydown(Position::new(measure_index, note_index), key, value))?;
    serialize(&outcome, "lyricKeydown")
}

// ============================================================================
// Rendering
// ============================================================================

#[wasm_bindgen(js_name = render)]
pub fn render(now: f64, force: bool) -> Result<JsValue, JsValue> {
    apply("render", |e| e.render(now, force))
}

#[wasm_bindgen(js_name = setViewport)]
pub fn set_viewport(scroll_top: f64, height: f64) -> Result<JsValue, JsValue> {
    apply("setViewport", |e| e.set_viewport(Viewport::new(scroll_top, height)))
}

/// Compute tie arcs from measured node boxes
///
/// # Parameters
/// - `measurements_js`: `{container: Rect, nodes: [{measureIndex, noteIndex, rect}]}`
#[wasm_bindgen(js_name = resolveTies)]
pub fn resolve_ties(measurements_js: JsValue) -> Result<JsValue, JsValue> {
    let measurements: TieMeasurements = deserialize(measurements_js, "Tie measurement deserialization error")?;
    let curves = with_editor(|e| e.resolve_ties(&measurements))?;
    serialize(&curves, "resolveTies")
}

#[wasm_bindgen(js_name = reportImage)]
pub fn report_image(src: &str, loaded: bool, now: f64) -> Result<JsValue, JsValue> {
    apply("reportImage", |e| e.report_image(src, loaded, now))
}

#[wasm_bindgen(js_name = clearCaches)]
pub fn clear_caches() -> Result<(), JsValue> {
    with_editor(|e| e.clear_caches())
}

#[wasm_bindgen(js_name = getRenderStats)]
pub fn get_render_stats() -> Result<JsValue, JsValue> {
    let stats = with_editor(|e| e.stats())?;
    serialize(&stats, "getRenderStats")
}

// ============================================================================
// Persistence
// ============================================================================

#[wasm_bindgen(js_name = saveNow)]
pub fn save_now(now: f64) -> Result<JsValue, JsValue> {
    apply("saveNow", |e| e.save_now(now, SaveKind::Manual))
}

/// Route a `message` event from the host page
#[wasm_bindgen(js_name = handleMessage)]
pub fn handle_message(origin: &str, data: JsValue, now: f64) -> Result<JsValue, JsValue> {
    let data: serde_json::Value = match serde_wasm_bindgen::from_value(data) {
        Ok(data) => data,
        Err(e) => {
            wasm_warn!("Ignoring undecodable message from {}: {}", origin, e);
            serde_json::Value::Null
        }
    };
    apply("handleMessage", |e| e.handle_message(origin, data, now))
}

#[wasm_bindgen(js_name = loadDocument)]
pub fn load_document(doc_js: JsValue, now: f64) -> Result<JsValue, JsValue> {
    let doc: ScoreDocument = deserialize(doc_js, "Document deserialization error")?;
    apply("loadDocument", |e| e.load_document(doc, now))
}

#[wasm_bindgen(js_name = restoreLocal)]
pub fn restore_local(score_id: &str, now: f64) -> Result<JsValue, JsValue> {
    apply("restoreLocal", |e| e.restore_local(score_id, now))
}

#[wasm_bindgen(js_name = getDocument)]
pub fn get_document() -> Result<JsValue, JsValue> {
    let doc = with_editor(|e| e.to_document())?;
    serialize(&doc, "getDocument")
}

/// Earliest pending timer, or `undefined` when nothing is scheduled
#[wasm_bindgen(js_name = getNextDeadline)]
pub fn get_next_deadline() -> Result<Option<f64>, JsValue> {
    with_editor(|e| e.next_deadline())
}
