//! Browser implementations of the persistence seams
//!
//! Nothing here holds a DOM handle between calls: the window, its storage and
//! its parent are looked up on every operation.

use serde::Serialize;

use crate::bridge::{BridgeError, Envelope, HostChannel, LocalStore, StoreError};

fn storage() -> Result<web_sys::Storage, StoreError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StoreError::Unavailable)
}

/// Origin of the editor page, e.g. "https://scores.example"
pub fn current_origin() -> Option<String> {
    web_sys::window().and_then(|w| w.location().origin().ok())
}

/// `window.localStorage`
#[derive(Clone, Copy, Debug, Default)]
pub struct WebStorage;

impl LocalStore for WebStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        storage()?.get_item(key).map_err(|e| StoreError::ReadFailed {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        storage()?.set_item(key, value).map_err(|e| StoreError::WriteFailed {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        storage()?.remove_item(key).map_err(|e| StoreError::WriteFailed {
            key: key.to_string(),
            message: format!("{:?}", e),
        })
    }
}

/// `window.parent.postMessage` with an explicit target origin
#[derive(Clone, Copy, Debug, Default)]
pub struct ParentChannel;

impl HostChannel for ParentChannel {
    fn post(&mut self, envelope: &Envelope, target_origin: &str) -> Result<(), BridgeError> {
        let window = web_sys::window().ok_or_else(|| BridgeError::PostFailed("no window".to_string()))?;
        let parent = window
            .parent()
            .ok()
            .flatten()
            .ok_or_else(|| BridgeError::PostFailed("no parent window".to_string()))?;

        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let message = envelope
            .serialize(&serializer)
            .map_err(|e| BridgeError::PostFailed(e.to_string()))?;

        parent
            .post_message(&message, target_origin)
            .map_err(|e| BridgeError::PostFailed(format!("{:?}", e)))
    }
}
