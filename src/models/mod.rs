//! Models module for the score editor
//!
//! This module contains the document model and every data type it owns:
//! elements, settings, position references, and the serialized document.

pub mod core;
pub mod document;
pub mod elements;
pub mod notation;
pub mod serde_helpers;
pub mod settings;

// Re-export commonly used types
pub use self::core::{generate_score_id, timestamp, ModelEvent, ScoreModel};
pub use document::{DocumentSettings, ScoreDocument, DEFAULT_TITLE, DOCUMENT_VERSION};
pub use elements::*;
pub use notation::{Lyric, Position, Tie};
pub use settings::{KeySignature, Settings, Skin, TimeSignature};
