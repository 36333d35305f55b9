//! WASM build test
//!
//! This module tests that the WASM module can be built and the exported
//! session functions work inside a browser.

use score_editor_wasm::api;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_editor_session() {
    api::init_editor(JsValue::UNDEFINED).unwrap();
    let update = api::start_editor(0.0).unwrap();
    assert!(update.is_object());

    let update = api::add_note("1", 100.0).unwrap();
    assert!(update.is_object());
    assert!(api::get_next_deadline().is_ok());
}

#[wasm_bindgen_test]
fn test_invalid_tokens_are_rejected() {
    api::init_editor(JsValue::UNDEFINED).unwrap();
    assert!(api::add_note("8", 0.0).is_err());
    assert!(api::add_rest("1/3", 0.0).is_err());
    assert!(api::set_key_signature("H", 0.0).is_err());
    assert!(api::set_tempo(f64::NAN, 0.0).is_err());
}

#[wasm_bindgen_test]
fn test_document_round_trip() {
    api::init_editor(JsValue::UNDEFINED).unwrap();
    api::add_note("5", 100.0).unwrap();

    let doc = api::get_document().unwrap();
    api::load_document(doc, 200.0).unwrap();
    let stats = api::get_render_stats().unwrap();
    assert!(stats.is_object());
}
