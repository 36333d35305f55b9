//! Tie geometry (quadratic Bézier arcs)
//!
//! Ties are drawn after layout. JavaScript measures the bounding boxes of the
//! rendered element nodes and hands them back; this module turns each tie
//! into an absolutely positioned arc relative to the score container.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::models::{Position, ScoreModel};

/// Bounding box in page coordinates
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Measured box of one rendered element node
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NodeBox {
    #[serde(flatten)]
    pub position: Position,
    pub rect: Rect,
}

/// Layout measurements for the tie pass
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TieMeasurements {
    pub container: Rect,
    pub nodes: Vec<NodeBox>,
}

/// A tie ready to draw, in container coordinates
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TieCurve {
    pub start: Position,
    pub end: Position,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    /// The end note lies left of the start note
    pub reversed: bool,
    pub control_x: f64,
    pub control_y: f64,
    /// SVG path of the arc
    pub path: String,
}

/// Geometry parameters for tie arcs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TieGeometry {
    pub min_width: f64,
    pub offset_above: f64,
    pub curvature: f64,
}

impl TieGeometry {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            min_width: config.tie_min_width,
            offset_above: config.tie_offset_above,
            curvature: config.tie_curvature,
        }
    }

    /// Resolve every tie of the model against the measured boxes.
    ///
    /// Ties whose endpoints were not rendered (outside the virtual window) or
    /// no longer resolve to notes are skipped.
    pub fn resolve(&self, model: &ScoreModel, measurements: &TieMeasurements) -> Vec<TieCurve> {
        let boxes: HashMap<Position, Rect> = measurements
            .nodes
            .iter()
            .map(|node| (node.position, node.rect))
            .collect();

        model
            .ties
            .iter()
            .filter_map(|tie| {
                if model.resolve_note(tie.start).is_none() || model.resolve_note(tie.end).is_none() {
                    log::debug!("tie {:?} -> {:?} no longer resolves", tie.start, tie.end);
                    return None;
                }
                let start = boxes.get(&tie.start)?;
                let end = boxes.get(&tie.end)?;
                Some(self.curve(tie.start, tie.end, start, end, &measurements.container))
            })
            .collect()
    }

    fn curve(&self, start: Position, end: Position, start_box: &Rect, end_box: &Rect, container: &Rect) -> TieCurve {
        let start_x = start_box.center_x() - container.left;
        let end_x = end_box.center_x() - container.left;
        let reversed = end_box.left < start_box.left;

        let left = start_x.min(end_x);
        let width = (end_x - start_x).abs().max(self.min_width);
        let top = (start_box.top + end_box.top) / 2.0 - container.top - self.offset_above;

        let (control_x, control_y) = control_point(left, top, left + width, top, self.curvature);
        let path = arc_path(left, top, left + width, top, self.curvature);

        TieCurve {
            start,
            end,
            left,
            top,
            width,
            reversed,
            control_x,
            control_y,
            path,
        }
    }
}

/// Control point of a quadratic arc bulging upward by `width * curvature`
pub fn control_point(start_x: f64, start_y: f64, end_x: f64, end_y: f64, curvature: f64) -> (f64, f64) {
    let height = (end_x - start_x) * curvature;
    let mid_x = (start_x + end_x) / 2.0;
    let mid_y = (start_y + end_y) / 2.0 - height;
    (mid_x, mid_y)
}

/// SVG path for a quadratic arc
pub fn arc_path(start_x: f64, start_y: f64, end_x: f64, end_y: f64, curvature: f64) -> String {
    let (cx, cy) = control_point(start_x, start_y, end_x, end_y, curvature);
    format!("M {} {} Q {} {} {} {}", start_x, start_y, cx, cy, end_x, end_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Degree, Element};

    fn geometry() -> TieGeometry {
        TieGeometry::from_config(&EditorConfig::default())
    }

    fn node(m: usize, e: usize, left: f64, top: f64) -> NodeBox {
        NodeBox {
            position: Position::new(m, e),
            rect: Rect::new(left, top, 20.0, 30.0),
        }
    }

    fn two_notes() -> ScoreModel {
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::One));
        model.add_element(Element::note(Degree::Two));
        model
    }

    #[test]
    fn test_curve_between_neighbours() {
        let mut model = two_notes();
        model.add_tie(Position::new(0, 0), Position::new(0, 1));

        let measurements = TieMeasurements {
            container: Rect::new(10.0, 100.0, 800.0, 600.0),
            nodes: vec![node(0, 0, 50.0, 200.0), node(0, 1, 110.0, 204.0)],
        };
        let curves = geometry().resolve(&model, &measurements);

        assert_eq!(curves.len(), 1);
        let curve = &curves[0];
        assert_eq!(curve.left, 50.0);
        assert_eq!(curve.width, 60.0);
        assert_eq!(curve.top, 94.0);
        assert!(!curve.reversed);
        assert_eq!(curve.control_y, 94.0 - 15.0);
        assert_eq!(curve.path, "M 50 94 Q 80 79 110 94");
    }

    #[test]
    fn test_minimum_width_and_reversal() {
        let mut model = two_notes();
        model.add_tie(Position::new(0, 1), Position::new(0, 0));

        let measurements = TieMeasurements {
            container: Rect::new(0.0, 0.0, 800.0, 600.0),
            nodes: vec![node(0, 0, 100.0, 50.0), node(0, 1, 105.0, 50.0)],
        };
        let curves = geometry().resolve(&model, &measurements);

        assert_eq!(curves[0].width, 20.0);
        assert_eq!(curves[0].left, 110.0);
        assert!(curves[0].reversed);
    }

    #[test]
    fn test_missing_box_is_skipped() {
        let mut model = two_notes();
        model.add_tie(Position::new(0, 0), Position::new(0, 1));

        let measurements = TieMeasurements {
            container: Rect::default(),
            nodes: vec![node(0, 0, 0.0, 0.0)],
        };
        assert!(geometry().resolve(&model, &measurements).is_empty());
    }
}
