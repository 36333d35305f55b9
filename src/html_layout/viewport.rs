//! Viewport windowing for long scores

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Scroll state of the score container as reported by JavaScript
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub scroll_top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, height: f64) -> Self {
        Self { scroll_top, height }
    }
}

/// Measures that must exist for the given scroll position.
///
/// `start = floor(scrollTop / rowHeight)`; the window runs from
/// `start - buffer` (clamped at 0) to `start + ceil(height / rowHeight) + buffer`
/// (clamped at the last measure). Returns `None` when nothing is in range.
pub fn visible_range(
    viewport: Viewport,
    measure_count: usize,
    row_height: f64,
    buffer: usize,
) -> Option<RangeInclusive<usize>> {
    if measure_count == 0 || row_height <= 0.0 {
        return None;
    }

    let start = (viewport.scroll_top.max(0.0) / row_height).floor() as usize;
    let rows = (viewport.height.max(0.0) / row_height).ceil() as usize;
    let end = (start + rows + buffer).min(measure_count - 1);
    let first = start.saturating_sub(buffer);

    if first > end {
        return None;
    }
    Some(first..=end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_at_top() {
        let range = visible_range(Viewport::new(0.0, 600.0), 100, 120.0, 3);
        assert_eq!(range, Some(0..=8));
    }

    #[test]
    fn test_window_scrolled() {
        // start = 10, rows = 5
        let range = visible_range(Viewport::new(1250.0, 600.0), 100, 120.0, 3);
        assert_eq!(range, Some(7..=18));
    }

    #[test]
    fn test_window_clamped_to_last_measure() {
        let range = visible_range(Viewport::new(2800.0, 600.0), 25, 120.0, 3);
        assert_eq!(range, Some(20..=24));
    }

    #[test]
    fn test_scrolled_past_end() {
        assert_eq!(visible_range(Viewport::new(12_000.0, 600.0), 25, 120.0, 3), None);
        assert_eq!(visible_range(Viewport::new(0.0, 600.0), 0, 120.0, 3), None);
    }
}
