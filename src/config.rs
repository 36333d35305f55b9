//! Editor configuration
//!
//! Every timing and layout constant the engine uses lives here. The host may
//! pass a partial object to `initEditor`; missing fields take the defaults.

use serde::{Deserialize, Serialize};

/// Configuration for the editor engine
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Estimated height of one measure row in pixels
    pub row_height: f64,

    /// Extra rows materialized above and below the viewport
    pub buffer_size: usize,

    /// Measure count above which virtual windowing is used
    pub virtual_threshold: usize,

    /// Minimum interval between two executed renders
    pub render_throttle_ms: f64,

    /// Period of the autosave timer
    pub autosave_interval_ms: f64,

    /// How long the host waits for `iframe:ready` before sending `load` anyway
    pub ready_fallback_ms: f64,

    /// Maximum number of history snapshots
    pub history_limit: usize,

    /// Minimum width of a tie curve
    pub tie_min_width: f64,

    /// Distance of a tie above the average top of its notes
    pub tie_offset_above: f64,

    /// Tie curvature relative to its width
    pub tie_curvature: f64,

    /// Delay before saving while a composition is still open
    pub composition_commit_delay_ms: f64,

    /// Minimum container height in full-materialization mode
    pub traditional_min_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            row_height: 120.0,
            buffer_size: 3,
            virtual_threshold: 20,
            render_throttle_ms: 16.0,
            autosave_interval_ms: 60_000.0,
            ready_fallback_ms: 1_000.0,
            history_limit: 50,
            tie_min_width: 20.0,
            tie_offset_above: 8.0,
            tie_curvature: 0.25,
            composition_commit_delay_ms: 120.0,
            traditional_min_height: 500.0,
        }
    }
}
