//! Numeric Notation Score Editor WASM Module
//!
//! Engine of a browser-hosted jianpu editor: the score document model with
//! bounded undo history, a display-list renderer with virtual windowing, tie
//! geometry, IME-safe lyric input, and the message bridge to the host page.

pub mod api;
pub mod bridge;
pub mod config;
pub mod editor;
pub mod fingering;
pub mod html_layout;
pub mod lyrics;
pub mod models;
pub mod undo;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editor::{Editor, Update};
pub use models::core::*;
pub use models::elements::*;
pub use models::notation::*;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        wasm_warn!("logger already initialized: {}", e);
    }

    log::info!("Score editor WASM module initialized");
}
