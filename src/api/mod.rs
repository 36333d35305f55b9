//! Score Editor WASM API
//!
//! This module provides the JavaScript-facing API for the score editor.
//!
//! # Module Structure
//!
//! - `helpers`: Shared utilities for serialization, token parsing, error handling, and logging
//! - `web`: Browser implementations of the local store and host channel
//! - `core`: The exported functions, operating on the WASM-owned editor session

pub mod helpers;
pub mod web;
pub mod core;

pub use self::core::*;
