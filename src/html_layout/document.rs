//! Document-level render computation
//!
//! This module contains the main entry point for rendering: it takes the
//! score model and the current viewport and produces a [`Frame`] patch.
//!
//! Two strategies exist. Short scores are fully materialized on every pass.
//! Long scores (more measures than the virtual threshold) only materialize the
//! measures inside the scroll window; a row is re-sent only when its content
//! fingerprint changed. Switching strategy always rebuilds the container.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;

use super::display_list::*;
use super::element::ElementRenderer;
use super::throttle::{RenderThrottle, Schedule};
use super::viewport::{visible_range, Viewport};
use crate::config::EditorConfig;
use crate::models::{Position, ScoreModel};

/// Layout parameters for the render engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub row_height: f64,
    pub buffer_size: usize,
    pub virtual_threshold: usize,
    pub throttle_ms: f64,
    pub traditional_min_height: f64,
}

impl RenderConfig {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            row_height: config.row_height,
            buffer_size: config.buffer_size,
            virtual_threshold: config.virtual_threshold,
            throttle_ms: config.render_throttle_ms,
            traditional_min_height: config.traditional_min_height,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

/// Main render engine producing frames for JavaScript
#[derive(Clone, Debug)]
pub struct RenderEngine {
    config: RenderConfig,
    mode: Option<RenderMode>,
    elements: ElementRenderer,
    throttle: RenderThrottle,
    viewport: Viewport,
    /// Materialized measure rows and the fingerprint they were built from
    materialized: BTreeMap<usize, u64>,
    image_epoch: u64,
    pending_scroll: Option<ScrollTarget>,
}

impl RenderEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            mode: None,
            elements: ElementRenderer::new(),
            throttle: RenderThrottle::new(config.throttle_ms),
            viewport: Viewport::default(),
            materialized: BTreeMap::new(),
            image_epoch: 0,
            pending_scroll: None,
        }
    }

    /// Strategy of the last executed pass
    pub fn mode(&self) -> Option<RenderMode> {
        self.mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Strategy the model calls for
    pub fn mode_for(&self, measure_count: usize) -> RenderMode {
        if measure_count > self.config.virtual_threshold {
            RenderMode::Virtual
        } else {
            RenderMode::Full
        }
    }

    /// Request a render at `now`.
    ///
    /// Returns the frame when the pass runs immediately, or `None` when it was
    /// coalesced into the deferred pass reported by [`next_deadline`](Self::next_deadline).
    pub fn request(&mut self, model: &ScoreModel, now: f64, force: bool) -> Option<Frame> {
        match self.throttle.request(now, force) {
            Schedule::Now => Some(self.render(model, force)),
            Schedule::Deferred { at } => {
                log::debug!("render deferred until {}", at);
                None
            }
        }
    }

    /// Run the deferred pass if it is due. The deferred pass is forced.
    pub fn tick(&mut self, model: &ScoreModel, now: f64) -> Option<Frame> {
        if self.throttle.poll(now) {
            Some(self.render(model, true))
        } else {
            None
        }
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.throttle.deadline()
    }

    /// Update the scroll state. In virtual mode a frame is produced when the
    /// visible window changed.
    pub fn set_viewport(&mut self, model: &ScoreModel, viewport: Viewport) -> Option<Frame> {
        let before = self.window(model.measure_count());
        self.viewport = viewport;

        if self.mode != Some(RenderMode::Virtual) || self.mode_for(model.measure_count()) != RenderMode::Virtual {
            return None;
        }
        if self.window(model.measure_count()) == before {
            return None;
        }
        Some(self.render(model, false))
    }

    /// Remember that an element was appended to `measure_index`; the next
    /// frame carries the scroll target.
    pub fn note_element_added(&mut self, model: &ScoreModel, measure_index: usize) {
        let target = if self.mode_for(model.measure_count()) == RenderMode::Full {
            ScrollTarget::Bottom
        } else {
            let top = (measure_index as f64 * self.config.row_height - self.viewport.height / 2.0).max(0.0);
            self.viewport.scroll_top = top;
            ScrollTarget::Offset { top }
        };
        self.pending_scroll = Some(target);
    }

    /// Record a fingering image load outcome. Returns true when the score
    /// must be re-rendered without the image.
    pub fn report_image(&mut self, src: &str, loaded: bool) -> bool {
        if self.elements.report_image(src, loaded) {
            self.image_epoch += 1;
            true
        } else {
            false
        }
    }

    /// Drop every cache; the next pass rebuilds the container
    pub fn clear_caches(&mut self) {
        self.elements.clear();
        self.materialized.clear();
        self.mode = None;
        log::debug!("render caches cleared");
    }

    pub fn stats(&self, model: &ScoreModel) -> RenderStats {
        let count = model.measure_count();
        let visible = match self.mode_for(count) {
            RenderMode::Full => count,
            RenderMode::Virtual => self.window(count).map(|r| r.count()).unwrap_or(0),
        };
        RenderStats {
            total_measures: count,
            visible_measures: visible,
            template_cache_size: self.elements.template_count(),
            image_cache_size: self.elements.images().len(),
            materialized_measures: self.materialized.len(),
        }
    }

    /// Execute one render pass now, bypassing the throttle
    ///
    /// # Arguments
    /// * `model` - The score to render
    /// * `force` - Rebuild the container and drop cached templates
    pub fn render(&mut self, model: &ScoreModel, force: bool) -> Frame {
        let count = model.measure_count();
        let mode = self.mode_for(count);
        let rebuild = force || self.mode != Some(mode);

        if rebuild {
            if self.mode.is_some() && self.mode != Some(mode) {
                log::info!("render mode switch to {:?} at {} measures", mode, count);
            }
            self.elements.clear_templates();
            self.materialized.clear();
        }
        self.mode = Some(mode);

        let mut ops = Vec::new();
        match mode {
            RenderMode::Full => {
                for index in self.stale_rows(|i| i >= count) {
                    ops.push(MeasureOp::Remove { measure_index: index });
                }
                for index in 0..count {
                    let node = self.build_measure(model, index, None);
                    let fingerprint = self.fingerprint(model, index);
                    self.materialized.insert(index, fingerprint);
                    ops.push(MeasureOp::Upsert { measure: node });
                }
            }
            RenderMode::Virtual => {
                let window = self.window(count);
                let in_window = |i: usize| window.as_ref().map(|r| r.contains(&i)).unwrap_or(false);

                for index in self.stale_rows(|i| !in_window(i)) {
                    ops.push(MeasureOp::Remove { measure_index: index });
                }
                if let Some(range) = window.clone() {
                    for index in range {
                        let fingerprint = self.fingerprint(model, index);
                        if self.materialized.get(&index) == Some(&fingerprint) {
                            continue;
                        }
                        let row_height = self.config.row_height;
                        let node = self.build_measure(model, index, Some(row_height));
                        self.materialized.insert(index, fingerprint);
                        ops.push(MeasureOp::Upsert { measure: node });
                    }
                }
            }
        }

        let sizing = match mode {
            RenderMode::Full => ContainerSizing::Auto {
                min_height: self
                    .config
                    .traditional_min_height
                    .max(count as f64 * self.config.row_height),
            },
            RenderMode::Virtual => ContainerSizing::Fixed {
                height: count as f64 * self.config.row_height,
            },
        };

        Frame {
            mode,
            rebuild,
            header: header(model),
            container_classes: container_classes(model),
            sizing,
            ties_pending: rebuild || !ops.is_empty(),
            ops,
            scroll: self.pending_scroll.take(),
        }
    }

    fn window(&self, count: usize) -> Option<RangeInclusive<usize>> {
        visible_range(self.viewport, count, self.config.row_height, self.config.buffer_size)
    }

    /// Remove and return materialized rows matching `stale`
    fn stale_rows(&mut self, stale: impl Fn(usize) -> bool) -> Vec<usize> {
        let rows: Vec<usize> = self.materialized.keys().copied().filter(|i| stale(*i)).collect();
        for index in &rows {
            self.materialized.remove(index);
        }
        rows
    }

    fn build_measure(&mut self, model: &ScoreModel, measure_index: usize, min_height: Option<f64>) -> MeasureNode {
        let key = model.settings.key_signature;
        let show_fingering = model.settings.show_fingering;
        let show_lyrics = model.settings.show_lyrics;

        let elements = model.measures[measure_index]
            .iter()
            .enumerate()
            .map(|(element_index, element)| {
                let pos = Position::new(measure_index, element_index);
                let lyric = show_lyrics.then(|| model.lyric_at(pos));
                self.elements.build_node(element, pos, key, show_fingering, lyric)
            })
            .collect();

        MeasureNode {
            measure_index,
            min_height,
            elements,
        }
    }

    /// Hash of everything a measure row is built from
    fn fingerprint(&self, model: &ScoreModel, measure_index: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        measure_index.hash(&mut hasher);
        model.measures[measure_index].hash(&mut hasher);
        model.settings.key_signature.hash(&mut hasher);
        model.settings.show_fingering.hash(&mut hasher);
        model.settings.show_lyrics.hash(&mut hasher);
        self.image_epoch.hash(&mut hasher);
        if model.settings.show_lyrics {
            for lyric in model.lyrics.iter().filter(|l| l.measure_index == measure_index) {
                lyric.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

fn header(model: &ScoreModel) -> ScoreHeader {
    ScoreHeader {
        title: model.title.clone(),
        signature: format!(
            "{} {}",
            model.settings.key_signature.as_str(),
            model.settings.time_signature.as_str()
        ),
    }
}

fn container_classes(model: &ScoreModel) -> Vec<String> {
    let mut classes = vec![model.settings.skin.class_name().to_string()];
    if model.settings.show_lyrics {
        classes.push("lyrics-mode".to_string());
    }
    if model.settings.show_fingering {
        classes.push("fingering-mode".to_string());
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Degree, Element, KeySignature, Skin};

    fn model_with_measures(count: usize) -> ScoreModel {
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::One));
        for _ in 1..count {
            model.add_measure();
            model.add_element(Element::note(Degree::Three));
        }
        model
    }

    #[test]
    fn test_full_mode_materializes_everything() {
        let model = model_with_measures(5);
        let mut engine = RenderEngine::default();

        let frame = engine.render(&model, false);
        assert_eq!(frame.mode, RenderMode::Full);
        assert!(frame.rebuild);
        assert_eq!(frame.upserted().count(), 5);
        assert_eq!(frame.sizing, ContainerSizing::Auto { min_height: 600.0 });

        let frame = engine.render(&model, false);
        assert!(!frame.rebuild);
        assert_eq!(frame.upserted().count(), 5);
    }

    #[test]
    fn test_traditional_min_height() {
        let model = model_with_measures(2);
        let frame = RenderEngine::default().render(&model, false);
        assert_eq!(frame.sizing, ContainerSizing::Auto { min_height: 500.0 });
    }

    #[test]
    fn test_virtual_mode_only_resends_changed_rows() {
        let mut model = model_with_measures(30);
        let mut engine = RenderEngine::default();
        engine.set_viewport(&model, Viewport::new(0.0, 600.0));

        let frame = engine.render(&model, false);
        assert_eq!(frame.mode, RenderMode::Virtual);
        assert_eq!(frame.upserted().count(), 9);
        assert_eq!(frame.sizing, ContainerSizing::Fixed { height: 3600.0 });

        let frame = engine.render(&model, false);
        assert!(frame.ops.is_empty());
        assert!(!frame.ties_pending);

        model.set_modifier(Position::new(2, 0), crate::models::Modifier::Sharp);
        let frame = engine.render(&model, false);
        let changed: Vec<usize> = frame.upserted().map(|m| m.measure_index).collect();
        assert_eq!(changed, vec![2]);
    }

    #[test]
    fn test_scrolling_evicts_rows() {
        let model = model_with_measures(30);
        let mut engine = RenderEngine::default();
        engine.set_viewport(&model, Viewport::new(0.0, 600.0));
        engine.render(&model, false);

        let frame = engine
            .set_viewport(&model, Viewport::new(1200.0, 600.0))
            .expect("window moved");
        let removed: Vec<usize> = frame.removed().collect();
        assert_eq!(removed, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(engine.stats(&model).materialized_measures, 12);

        assert!(engine.set_viewport(&model, Viewport::new(1210.0, 600.0)).is_none());
    }

    #[test]
    fn test_header_and_classes() {
        let mut model = model_with_measures(1);
        model.set_key_signature(KeySignature::G);
        model.set_skin(Skin::LightBlue);
        model.set_show_lyrics(true);

        let frame = RenderEngine::default().render(&model, false);
        assert_eq!(frame.header.signature, "G 4/4");
        assert_eq!(frame.container_classes, vec!["skin-light-blue", "lyrics-mode"]);
    }

    #[test]
    fn test_scroll_target() {
        let short = model_with_measures(3);
        let mut engine = RenderEngine::default();
        engine.note_element_added(&short, 2);
        assert_eq!(engine.render(&short, false).scroll, Some(ScrollTarget::Bottom));
        assert_eq!(engine.render(&short, false).scroll, None);

        let long = model_with_measures(40);
        engine.set_viewport(&long, Viewport::new(0.0, 600.0));
        engine.note_element_added(&long, 39);
        let frame = engine.render(&long, false);
        assert_eq!(frame.scroll, Some(ScrollTarget::Offset { top: 39.0 * 120.0 - 300.0 }));
        assert!(frame.upserted().any(|m| m.measure_index == 39));
    }

    #[test]
    fn test_clear_caches_forces_rebuild() {
        let model = model_with_measures(2);
        let mut engine = RenderEngine::default();
        engine.render(&model, false);
        assert!(engine.stats(&model).template_cache_size > 0);

        engine.clear_caches();
        assert_eq!(engine.stats(&model).template_cache_size, 0);
        assert!(engine.render(&model, false).rebuild);
    }
}
