//! Element-level rendering
//!
//! Builds the [`ElementNode`] for one element: CSS classes and glyph parts.
//! Glyph parts depend only on the element, the key signature and whether the
//! fingering overlay is on, so they are cached per (element, key, overlay).

use std::collections::HashMap;

use super::display_list::{ElementNode, GlyphPart, LyricField};
use crate::fingering::fingering_for;
use crate::models::{Duration, Element, KeySignature, Modifier, Octave, Position, RestGroup};

/// Load state of a fingering image as reported by JavaScript
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Loaded,
    Failed,
}

/// Fingering images seen by the renderer
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    states: HashMap<String, ImageState>,
}

impl ImageCache {
    pub fn state(&self, src: &str) -> Option<ImageState> {
        self.states.get(src).copied()
    }

    pub fn is_failed(&self, src: &str) -> bool {
        self.state(src) == Some(ImageState::Failed)
    }

    /// Remember a source the first time a node references it
    pub fn track(&mut self, src: &str) {
        self.states
            .entry(src.to_string())
            .or_insert(ImageState::Pending);
    }

    /// Record a load outcome. Returns true when the image newly failed.
    pub fn report(&mut self, src: &str, loaded: bool) -> bool {
        let next = if loaded { ImageState::Loaded } else { ImageState::Failed };
        let previous = self.states.insert(src.to_string(), next);
        !loaded && previous != Some(ImageState::Failed)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Template {
    classes: Vec<String>,
    parts: Vec<GlyphPart>,
    special: Option<String>,
}

type TemplateKey = (Element, KeySignature, bool);

/// Builds element nodes, reusing cached templates
#[derive(Clone, Debug, Default)]
pub struct ElementRenderer {
    templates: HashMap<TemplateKey, Template>,
    images: ImageCache,
}

impl ElementRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the node for one element.
    ///
    /// # Arguments
    /// * `element` - The element to render
    /// * `pos` - Its position, carried on the node for event delegation
    /// * `key` - Key signature used to resolve fingering diagrams
    /// * `show_fingering` - Whether fingering images are drawn
    /// * `lyric` - Lyric text when lyrics mode is on (ignored for non-lyric elements)
    pub fn build_node(
        &mut self,
        element: &Element,
        pos: Position,
        key: KeySignature,
        show_fingering: bool,
        lyric: Option<&str>,
    ) -> ElementNode {
        let cache_key = (element.clone(), key, show_fingering);
        let template = match self.templates.get(&cache_key) {
            Some(template) => template.clone(),
            None => {
                let template = self.build_template(element, key, show_fingering);
                self.templates.insert(cache_key, template.clone());
                template
            }
        };

        let mut classes = template.classes;
        let lyric = match lyric {
            Some(text) if element.accepts_lyric() => {
                classes.push("has-lyrics-input".to_string());
                Some(LyricField {
                    value: text.to_string(),
                })
            }
            _ => None,
        };

        ElementNode {
            measure_index: pos.measure_index,
            element_index: pos.element_index,
            kind: element.type_name().to_string(),
            classes,
            parts: template.parts,
            special: template.special,
            lyric,
        }
    }

    fn build_template(&mut self, element: &Element, key: KeySignature, show_fingering: bool) -> Template {
        let mut classes = vec!["score-note".to_string()];
        let mut parts = Vec::new();
        let mut special = None;

        match element {
            Element::Note {
                degree,
                duration,
                modifiers,
                octave,
            } => {
                parts.push(GlyphPart::Main {
                    class: "main-note".to_string(),
                    text: degree.glyph().to_string(),
                });
                push_modifiers(&mut parts, modifiers);
                push_duration_mark(&mut parts, *duration);
                match octave {
                    Some(Octave::High) => parts.push(GlyphPart::OctaveDot {
                        class: "high-dot".to_string(),
                        text: "·".to_string(),
                    }),
                    Some(Octave::Low) => parts.push(GlyphPart::OctaveDot {
                        class: "low-dot".to_string(),
                        text: "·".to_string(),
                    }),
                    None => {}
                }
                if show_fingering {
                    if let Some(src) = fingering_for(key, *degree, *octave) {
                        if !self.images.is_failed(src) {
                            self.images.track(src);
                            parts.push(GlyphPart::Fingering {
                                src: src.to_string(),
                                alt: format!("指法图 {}", degree.glyph()),
                            });
                        }
                    }
                }
            }
            Element::Rest {
                value,
                duration,
                modifiers,
                rest_group,
            } => {
                match rest_group {
                    Some(RestGroup::Full) => classes.push("rest-group-full".to_string()),
                    Some(RestGroup::Half) => classes.push("rest-group-half".to_string()),
                    None => {}
                }
                parts.push(GlyphPart::Main {
                    class: "main-rest".to_string(),
                    text: value.clone(),
                });
                push_modifiers(&mut parts, modifiers);
                push_duration_mark(&mut parts, *duration);
            }
            Element::Extension { value, .. } => {
                classes.push("extension-mark".to_string());
                parts.push(GlyphPart::Content { text: value.clone() });
            }
            Element::Special { kind } => {
                special = Some(kind.as_str().to_string());
                if let Some(symbol) = kind.symbol() {
                    parts.push(GlyphPart::Content {
                        text: symbol.to_string(),
                    });
                }
            }
        }

        Template {
            classes,
            parts,
            special,
        }
    }

    /// Record an image load outcome. A new failure drops every cached
    /// template so nodes referencing the image are rebuilt without it.
    pub fn report_image(&mut self, src: &str, loaded: bool) -> bool {
        let failed = self.images.report(src, loaded);
        if failed {
            log::debug!("fingering image failed: {}", src);
            self.templates.clear();
        }
        failed
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Drop cached templates; image states survive
    pub fn clear_templates(&mut self) {
        self.templates.clear();
    }

    /// Drop cached templates and image states
    pub fn clear(&mut self) {
        self.templates.clear();
        self.images.clear();
    }
}

fn push_modifiers(parts: &mut Vec<GlyphPart>, modifiers: &[Modifier]) {
    for modifier in modifiers {
        parts.push(GlyphPart::Modifier {
            class: format!("modifier {}", modifier.class_name()),
            text: modifier.glyph().to_string(),
        });
    }
}

fn push_duration_mark(parts: &mut Vec<GlyphPart>, duration: Duration) {
    if let Some(class) = duration.marker_class() {
        parts.push(GlyphPart::DurationMark {
            class: format!("duration-mark {}", class),
            lines: duration.beam_count(),
        });
    }
}
