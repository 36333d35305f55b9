//! Display List for score rendering
//!
//! This module defines the output structure returned from the render engine to
//! JavaScript. A [`Frame`] is a patch: JavaScript applies its measure
//! operations to the score container without computing anything itself.

use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Which materialization strategy produced a frame
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Every measure is rebuilt on every pass
    Full,
    /// Only measures near the viewport exist
    Virtual,
}

/// Container sizing instructions
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContainerSizing {
    /// Size to content, never smaller than `min_height`
    Auto {
        #[serde(rename = "minHeight")]
        min_height: f64,
    },
    /// Fixed total height so the scrollbar reflects the whole score
    Fixed { height: f64 },
}

/// Title block drawn above the measures
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoreHeader {
    pub title: String,
    /// Key and meter, e.g. "C 4/4"
    pub signature: String,
}

/// Where the editor should scroll after an element was appended
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScrollTarget {
    /// Scroll to the bottom of the container
    Bottom,
    /// Scroll to an absolute offset
    Offset { top: f64 },
}

/// One child of a rendered element, in document order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "part", rename_all = "camelCase")]
pub enum GlyphPart {
    /// Primary digit of a note or rest
    Main { class: String, text: String },
    /// Accidental or augmentation dot
    Modifier { class: String, text: String },
    /// Underlines beneath the glyph
    DurationMark { class: String, lines: u8 },
    /// Octave dot above or below
    OctaveDot { class: String, text: String },
    /// Fingering diagram image
    Fingering { src: String, alt: String },
    /// Fixed text content (continuation glyph or structural symbol)
    Content { text: String },
}

/// Lyric text field attached to a note or rest
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LyricField {
    pub value: String,
}

/// A single element with all rendering information
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub measure_index: usize,
    pub element_index: usize,

    /// Element discriminant ("note", "rest", "extension", "special")
    pub kind: String,

    /// CSS classes, starting with "score-note"
    pub classes: Vec<String>,

    /// Children in draw order
    pub parts: Vec<GlyphPart>,

    /// Structural marker name for special elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<String>,

    /// Lyric field, present only in lyrics mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyric: Option<LyricField>,
}

impl ElementNode {
    pub fn position(&self) -> Position {
        Position::new(self.measure_index, self.element_index)
    }

    /// The fingering image of this node, if any
    pub fn fingering_src(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            GlyphPart::Fingering { src, .. } => Some(src.as_str()),
            _ => None,
        })
    }
}

/// A measure row and its elements
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureNode {
    pub measure_index: usize,
    /// Row height in virtual mode; absent when sized by content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    pub elements: Vec<ElementNode>,
}

/// Operation on the measure rows of the container
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum MeasureOp {
    /// Insert the measure at its index order, replacing any existing row
    Upsert { measure: MeasureNode },
    /// Remove the row for this measure index
    Remove {
        #[serde(rename = "measureIndex")]
        measure_index: usize,
    },
}

/// Result of one render pass
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub mode: RenderMode,

    /// Clear the container (and any DOM caches) before applying `ops`
    pub rebuild: bool,

    pub header: ScoreHeader,

    /// Container classes: skin plus lyrics/fingering mode flags
    pub container_classes: Vec<String>,

    pub sizing: ContainerSizing,

    pub ops: Vec<MeasureOp>,

    /// The tie geometry pass must run after this frame is laid out
    pub ties_pending: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollTarget>,
}

impl Frame {
    /// Measures inserted or replaced by this frame
    pub fn upserted(&self) -> impl Iterator<Item = &MeasureNode> {
        self.ops.iter().filter_map(|op| match op {
            MeasureOp::Upsert { measure } => Some(measure),
            MeasureOp::Remove { .. } => None,
        })
    }

    /// Measure indices removed by this frame
    pub fn removed(&self) -> impl Iterator<Item = usize> + '_ {
        self.ops.iter().filter_map(|op| match op {
            MeasureOp::Remove { measure_index } => Some(*measure_index),
            MeasureOp::Upsert { .. } => None,
        })
    }
}

/// Cache and materialization counters
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderStats {
    pub total_measures: usize,
    pub visible_measures: usize,
    pub template_cache_size: usize,
    pub image_cache_size: usize,
    pub materialized_measures: usize,
}
