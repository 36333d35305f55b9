//! Host-page side of the message protocol
//!
//! The host fetches the score named in its URL, holds the `score:load`
//! message until the editor frame reports `iframe:ready` (or the fallback
//! delay elapses), and forwards the editor's save and create requests to the
//! persistence API.

use serde_json::Value;

use super::errors::BridgeError;
use super::messages::{CreatedPayload, Envelope, OriginGuard};
use super::store::HostChannel;
use crate::models::ScoreDocument;

/// Persistence API consumed by the host page
pub trait ScoreApi {
    /// `GET /scores/{id}`
    fn fetch(&mut self, score_id: &str) -> Result<Option<ScoreDocument>, BridgeError>;

    /// `POST /scores/{id}`
    fn save(&mut self, doc: &ScoreDocument) -> Result<(), BridgeError>;

    /// `POST /scores`, returning the durable id
    fn create(&mut self, doc: &ScoreDocument) -> Result<String, BridgeError>;
}

/// Relays messages between the host page, its API and the editor frame
#[derive(Debug)]
pub struct HostRelay<A, C> {
    guard: OriginGuard,
    api: A,
    /// Channel into the editor frame
    frame: C,
    editor_ready: bool,
    pending_load: Option<ScoreDocument>,
    fallback_at: Option<f64>,
    ready_fallback_ms: f64,
    current_score_id: Option<String>,
}

impl<A: ScoreApi, C: HostChannel> HostRelay<A, C> {
    pub fn new(origin: impl Into<String>, api: A, frame: C, ready_fallback_ms: f64) -> Self {
        Self {
            guard: OriginGuard::new(origin),
            api,
            frame,
            editor_ready: false,
            pending_load: None,
            fallback_at: None,
            ready_fallback_ms,
            current_score_id: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn frame(&self) -> &C {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut C {
        &mut self.frame
    }

    /// Score id currently shown in the page URL
    pub fn current_score_id(&self) -> Option<&str> {
        self.current_score_id.as_deref()
    }

    pub fn editor_ready(&self) -> bool {
        self.editor_ready
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending_load.is_some()
    }

    /// Open the score named in the page URL. The load is posted once the
    /// editor is ready, or after the fallback delay.
    pub fn open(&mut self, score_id: &str, now: f64) -> Result<(), BridgeError> {
        self.current_score_id = Some(score_id.to_string());
        let Some(doc) = self.api.fetch(score_id)? else {
            log::info!("score {} not found, editor starts blank", score_id);
            return Ok(());
        };

        if self.editor_ready {
            return self.post_load(doc);
        }
        self.pending_load = Some(doc);
        self.fallback_at = Some(now + self.ready_fallback_ms);
        Ok(())
    }

    /// Route one message from the editor frame
    pub fn handle_message(&mut self, origin: &str, data: Value) -> Result<(), BridgeError> {
        let Some(envelope) = self.guard.admit(origin, data)? else {
            return Ok(());
        };

        match envelope {
            Envelope::Ready => {
                self.editor_ready = true;
                self.fallback_at = None;
                if let Some(doc) = self.pending_load.take() {
                    self.post_load(doc)?;
                }
            }
            Envelope::Autosave(doc) => {
                if let Err(err) = self.api.save(&doc) {
                    log::warn!("autosave failed: {}", err);
                }
            }
            Envelope::Create(doc) => {
                let reply = match self.create_score(&doc) {
                    Ok(score_id) => CreatedPayload::ok(score_id),
                    Err(err) => CreatedPayload::failed(err.to_string()),
                };
                self.post(&Envelope::Created(reply))?;
            }
            Envelope::UpdateUrl(payload) => {
                log::info!("page URL now points at {}", payload.score_id);
                self.current_score_id = Some(payload.score_id);
            }
            other => log::debug!("ignoring {} on the host side", other.type_name()),
        }
        Ok(())
    }

    /// Post the held load if the fallback delay elapsed
    pub fn tick(&mut self, now: f64) -> Result<(), BridgeError> {
        match self.fallback_at {
            Some(at) if now >= at => {
                self.fallback_at = None;
                if let Some(doc) = self.pending_load.take() {
                    log::debug!("editor not ready after fallback, posting load anyway");
                    self.post_load(doc)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.fallback_at
    }

    fn create_score(&mut self, doc: &ScoreDocument) -> Result<String, BridgeError> {
        let score_id = self.api.create(doc)?;
        if score_id.trim().is_empty() {
            return Err(BridgeError::Api("create returned an empty score id".to_string()));
        }
        Ok(score_id)
    }

    fn post_load(&mut self, doc: ScoreDocument) -> Result<(), BridgeError> {
        self.post(&Envelope::Load(Box::new(doc)))
    }

    fn post(&mut self, envelope: &Envelope) -> Result<(), BridgeError> {
        let origin = self.guard.origin().to_string();
        self.frame.post(envelope, &origin)
    }
}
