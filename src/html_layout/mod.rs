//! HTML Render Engine
//!
//! This module computes what the score container should contain, generating
//! [`Frame`] patches with all classes, glyphs and sizing data needed for
//! JavaScript to update the DOM, plus the tie arcs drawn after layout.

pub mod curves;
pub mod display_list;
pub mod document;
pub mod element;
pub mod throttle;
pub mod viewport;

pub use curves::{NodeBox, Rect, TieCurve, TieGeometry, TieMeasurements};
pub use display_list::{
    ContainerSizing, ElementNode, Frame, GlyphPart, LyricField, MeasureNode, MeasureOp, RenderMode,
    RenderStats, ScoreHeader, ScrollTarget,
};
pub use document::{RenderConfig, RenderEngine};
pub use element::{ElementRenderer, ImageCache, ImageState};
pub use throttle::{RenderThrottle, Schedule};
pub use viewport::{visible_range, Viewport};
