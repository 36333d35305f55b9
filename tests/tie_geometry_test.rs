// Tie arcs computed from measured layout boxes

use pretty_assertions::assert_eq;
use score_editor_wasm::config::EditorConfig;
use score_editor_wasm::html_layout::{NodeBox, Rect, TieGeometry, TieMeasurements};
use score_editor_wasm::models::{Degree, Duration, Element, Position, ScoreModel};
use score_editor_wasm::Editor;

fn pos(m: usize, e: usize) -> Position {
    Position::new(m, e)
}

fn node(position: Position, left: f64, top: f64) -> NodeBox {
    NodeBox {
        position,
        rect: Rect::new(left, top, 20.0, 30.0),
    }
}

fn tied_pair() -> ScoreModel {
    let mut model = ScoreModel::default();
    model.add_element(Element::note(Degree::One));
    model.add_element(Element::note(Degree::One));
    model.add_tie(pos(0, 0), pos(0, 1));
    model
}

#[test]
fn test_arc_sits_above_both_notes() {
    let model = tied_pair();
    let measurements = TieMeasurements {
        container: Rect::new(10.0, 100.0, 800.0, 600.0),
        nodes: vec![node(pos(0, 0), 40.0, 200.0), node(pos(0, 1), 120.0, 210.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert_eq!(curves.len(), 1);
    let curve = &curves[0];

    // Centers at 50 and 130 relative to the page, 40 and 120 in the container
    assert_eq!(curve.left, 40.0);
    assert_eq!(curve.width, 80.0);
    // Average top 205, minus container top 100, minus 8 above
    assert_eq!(curve.top, 97.0);
    assert!(!curve.reversed);
    assert_eq!(curve.control_x, 80.0);
    assert_eq!(curve.control_y, 77.0);
    assert_eq!(curve.path, "M 40 97 Q 80 77 120 97");
}

#[test]
fn test_tie_to_the_left_is_reversed() {
    let mut model = tied_pair();
    model.add_tie(pos(0, 1), pos(0, 0));
    let measurements = TieMeasurements {
        container: Rect::default(),
        nodes: vec![node(pos(0, 0), 0.0, 50.0), node(pos(0, 1), 100.0, 50.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert_eq!(curves.len(), 2);
    assert!(!curves[0].reversed);
    assert!(curves[1].reversed);
    assert_eq!(curves[1].left, curves[0].left);
    assert_eq!(curves[1].width, curves[0].width);
}

#[test]
fn test_short_ties_use_minimum_width() {
    let model = tied_pair();
    let measurements = TieMeasurements {
        container: Rect::default(),
        nodes: vec![node(pos(0, 0), 0.0, 50.0), node(pos(0, 1), 5.0, 50.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert_eq!(curves[0].width, 20.0);
}

#[test]
fn test_tie_to_deleted_note_is_not_drawn() {
    let mut model = tied_pair();
    model.delete_element(pos(0, 1));
    let measurements = TieMeasurements {
        container: Rect::default(),
        nodes: vec![node(pos(0, 0), 0.0, 50.0), node(pos(0, 1), 100.0, 50.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert!(curves.is_empty());
}

#[test]
fn test_endpoint_replaced_by_rest_is_not_drawn() {
    let mut model = tied_pair();
    model.delete_element(pos(0, 1));
    model.add_rest(Duration::Quarter);
    let measurements = TieMeasurements {
        container: Rect::default(),
        nodes: vec![node(pos(0, 0), 0.0, 50.0), node(pos(0, 1), 100.0, 50.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert!(curves.is_empty());
}

#[test]
fn test_unmeasured_endpoint_is_skipped() {
    let model = tied_pair();
    let measurements = TieMeasurements {
        container: Rect::default(),
        nodes: vec![node(pos(0, 0), 0.0, 50.0)],
    };

    let curves = TieGeometry::from_config(&EditorConfig::default()).resolve(&model, &measurements);
    assert!(curves.is_empty());
}

#[test]
fn test_measurements_decode_from_layout_json() {
    let measurements: TieMeasurements = serde_json::from_value(serde_json::json!({
        "container": {"left": 0, "top": 0, "width": 600, "height": 400},
        "nodes": [
            {"measureIndex": 0, "noteIndex": 0, "rect": {"left": 0, "top": 40, "width": 20, "height": 30}},
            {"measureIndex": 0, "noteIndex": 1, "rect": {"left": 60, "top": 40, "width": 20, "height": 30}}
        ]
    }))
    .expect("decode");

    let mut editor = Editor::in_memory(EditorConfig::default(), "https://scores.example");
    editor.start(0.0);
    editor.add_note(Degree::Three, 100.0);
    editor.add_note(Degree::Three, 200.0);
    editor.add_tie(pos(0, 0), pos(0, 1), 300.0);

    let curves = editor.resolve_ties(&measurements);
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].path, "M 10 32 Q 40 17 70 32");
}
