//! Local fallback store and host channel seams
//!
//! The browser implementations (`window.localStorage`, `window.parent.postMessage`)
//! live in the API layer; the in-memory versions here back the tests and any
//! embedding without a DOM.

use std::collections::HashMap;

use super::errors::{BridgeError, StoreError};
use super::messages::Envelope;

/// Key/value storage for the local copy of each score
pub trait LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Outbound side of the frame/host message channel
pub trait HostChannel {
    /// Post `envelope` restricted to `target_origin`
    fn post(&mut self, envelope: &Envelope, target_origin: &str) -> Result<(), BridgeError>;
}

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, as with an exhausted quota
    pub fn rejecting() -> Self {
        Self {
            entries: HashMap::new(),
            reject_writes: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::WriteFailed {
                key: key.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Channel that records every posted message
#[derive(Clone, Debug, Default)]
pub struct RecordingChannel {
    pub sent: Vec<(Envelope, String)>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type names of the posted messages, in order
    pub fn types(&self) -> Vec<&'static str> {
        self.sent.iter().map(|(env, _)| env.type_name()).collect()
    }

    pub fn take(&mut self) -> Vec<(Envelope, String)> {
        std::mem::take(&mut self.sent)
    }
}

impl HostChannel for RecordingChannel {
    fn post(&mut self, envelope: &Envelope, target_origin: &str) -> Result<(), BridgeError> {
        self.sent.push((envelope.clone(), target_origin.to_string()));
        Ok(())
    }
}
