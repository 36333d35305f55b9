//! Editor-side persistence bridge
//!
//! Owns the ready handshake, the autosave timer, the local fallback copy and
//! the draft → durable identity promotion. Every save writes the local store
//! first and then notifies the host; a store failure never blocks the host
//! notification and a host failure never discards the local copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::BridgeError;
use super::messages::{CreatedPayload, Envelope, OriginGuard, UpdateUrlPayload};
use super::store::{HostChannel, LocalStore};
use crate::models::{ScoreDocument, ScoreModel};

/// Pointer to the last saved score, per owner when known
pub fn last_opened_key(owner_user_id: Option<&str>) -> String {
    match owner_user_id {
        Some(owner) => format!("lastOpenedScoreId:{}", owner),
        None => "lastOpenedScoreId".to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Booting,
    Ready,
}

/// Persistence identity of the open score
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Identity {
    /// Locally generated id, never created on the host
    Draft,
    /// Create request sent, awaiting `score:created`
    Creating,
    /// Id issued by the host
    Durable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveKind {
    Manual,
    Auto,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Manual,
    Auto,
    Error,
}

/// Transient message shown to the user
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn saved(kind: SaveKind) -> Self {
        match kind {
            SaveKind::Manual => Self {
                kind: NoticeKind::Manual,
                message: "已保存".to_string(),
            },
            SaveKind::Auto => Self {
                kind: NoticeKind::Auto,
                message: "已自动保存".to_string(),
            },
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// What an inbound message did
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Foreign origin or undecodable data
    Dropped,
    /// Valid message with nothing to do in the current state
    Ignored,
    /// The model was replaced by a host document
    Loaded,
    /// The draft received its durable id
    Promoted { score_id: String },
    /// The host refused to create the score
    CreateFailed(Notice),
}

/// Bridge between the editor frame and its host page
#[derive(Debug)]
pub struct PersistenceBridge<S, C> {
    guard: OriginGuard,
    store: S,
    channel: C,
    lifecycle: Lifecycle,
    identity: Identity,
    autosave_interval_ms: f64,
    next_autosave: Option<f64>,
    /// A save happened while the create request was in flight
    resave_after_create: bool,
}

impl<S: LocalStore, C: HostChannel> PersistenceBridge<S, C> {
    /// # Arguments
    /// * `origin` - The editor's own origin; inbound messages must match it
    /// * `store` - Local fallback store
    /// * `channel` - Outbound channel to the host page
    /// * `autosave_interval_ms` - Autosave period
    pub fn new(origin: impl Into<String>, store: S, channel: C, autosave_interval_ms: f64) -> Self {
        Self {
            guard: OriginGuard::new(origin),
            store,
            channel,
            lifecycle: Lifecycle::Booting,
            identity: Identity::Draft,
            autosave_interval_ms,
            next_autosave: None,
            resave_after_create: false,
        }
    }

    pub fn origin(&self) -> &str {
        self.guard.origin()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Announce that the message listener is installed and start the
    /// autosave timer. Only the first call has any effect.
    pub fn mark_ready(&mut self, now: f64) -> bool {
        if self.lifecycle == Lifecycle::Ready {
            return false;
        }
        self.lifecycle = Lifecycle::Ready;
        self.next_autosave = Some(now + self.autosave_interval_ms);
        if let Err(err) = self.post(&Envelope::Ready) {
            log::warn!("ready notification failed: {}", err);
        }
        log::info!("editor ready, autosave every {} ms", self.autosave_interval_ms);
        true
    }

    /// True when the autosave timer fired; the timer is re-armed
    pub fn autosave_due(&mut self, now: f64) -> bool {
        match self.next_autosave {
            Some(at) if now >= at => {
                self.next_autosave = Some(now + self.autosave_interval_ms);
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.next_autosave
    }

    /// Route one inbound message
    pub fn handle_message(&mut self, model: &mut ScoreModel, origin: &str, data: Value) -> Inbound {
        let envelope = match self.guard.admit(origin, data) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Inbound::Dropped,
            Err(err) => {
                log::debug!("ignoring inbound message: {}", err);
                return Inbound::Dropped;
            }
        };

        match envelope {
            Envelope::Load(doc) => {
                model.load_from_document(*doc);
                self.identity = Identity::Durable;
                self.resave_after_create = false;
                log::info!("loaded score {} from host", model.score_id);
                Inbound::Loaded
            }
            Envelope::Created(payload) => self.on_created(model, payload),
            other => {
                log::debug!("ignoring {} on the editor side", other.type_name());
                Inbound::Ignored
            }
        }
    }

    fn on_created(&mut self, model: &mut ScoreModel, payload: CreatedPayload) -> Inbound {
        if self.identity != Identity::Creating {
            log::debug!("unexpected score:created in {:?}", self.identity);
            return Inbound::Ignored;
        }

        match payload {
            CreatedPayload {
                success: true,
                score_id: Some(score_id),
                ..
            } if !score_id.is_empty() => {
                model.promote_identity(&score_id);
                self.identity = Identity::Durable;
                if let Err(err) = self.post(&Envelope::UpdateUrl(UpdateUrlPayload {
                    score_id: score_id.clone(),
                })) {
                    log::warn!("updateUrl failed: {}", err);
                }

                // Local copy under the durable key; replay a save made mid-flight
                let doc = model.to_document();
                self.write_local(&doc);
                if std::mem::take(&mut self.resave_after_create) {
                    if let Err(err) = self.post(&Envelope::Autosave(Box::new(doc))) {
                        log::warn!("autosave after create failed: {}", err);
                    }
                }
                log::info!("score promoted to {}", score_id);
                Inbound::Promoted { score_id }
            }
            payload => {
                self.identity = Identity::Draft;
                self.resave_after_create = false;
                let reason = payload.error.unwrap_or_else(|| "unknown error".to_string());
                log::warn!("score creation failed: {}", reason);
                Inbound::CreateFailed(Notice::error(format!("创建乐谱失败：{}", reason)))
            }
        }
    }

    /// Persist the model: local copy first, then the host.
    ///
    /// A draft is sent as `score:create` (once); a durable score as
    /// `score:autosave`. While a create is in flight only the local copy is
    /// written and the host save is replayed after promotion.
    pub fn save(&mut self, model: &ScoreModel, kind: SaveKind) -> Notice {
        let doc = model.to_document();
        let stored = self.write_local(&doc);

        let sent = match self.identity {
            Identity::Draft => {
                self.identity = Identity::Creating;
                self.post(&Envelope::Create(Box::new(doc)))
            }
            Identity::Creating => {
                self.resave_after_create = true;
                Ok(())
            }
            Identity::Durable => self.post(&Envelope::Autosave(Box::new(doc))),
        };

        match (stored, sent) {
            (_, Err(err)) => {
                log::warn!("host save failed: {}", err);
                if self.identity == Identity::Creating {
                    self.identity = Identity::Draft;
                }
                Notice::error("保存失败，已保留本地副本")
            }
            (false, Ok(())) => Notice::error("本地保存失败"),
            (true, Ok(())) => Notice::saved(kind),
        }
    }

    /// Restore the local copy of `score_id`, if one exists
    pub fn restore_local(&mut self, model: &mut ScoreModel, score_id: &str) -> bool {
        let key = format!("score:{}", score_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("reading local copy failed: {}", err);
                return false;
            }
        };
        match ScoreDocument::from_json(&raw) {
            Ok(doc) => {
                model.load_from_document(doc);
                log::info!("restored local copy {}", key);
                true
            }
            Err(err) => {
                log::warn!("local copy {} is unreadable: {}", key, err);
                false
            }
        }
    }

    fn write_local(&mut self, doc: &ScoreDocument) -> bool {
        let result = doc
            .to_json()
            .map_err(BridgeError::from)
            .and_then(|json| {
                self.store.set(&format!("score:{}", storage_id(doc)), &json)?;
                self.store
                    .set(&last_opened_key(doc.owner_user_id.as_deref()), &doc.score_id)?;
                Ok(())
            });

        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("local save failed: {}", err);
                false
            }
        }
    }

    fn post(&mut self, envelope: &Envelope) -> Result<(), BridgeError> {
        let origin = self.guard.origin().to_string();
        self.channel.post(envelope, &origin)
    }
}

fn storage_id(doc: &ScoreDocument) -> &str {
    if doc.score_id.is_empty() {
        "default"
    } else {
        &doc.score_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::store::{MemoryStore, RecordingChannel};
    use crate::models::{Degree, Element};
    use serde_json::json;

    const ORIGIN: &str = "https://scores.example";

    fn bridge() -> PersistenceBridge<MemoryStore, RecordingChannel> {
        PersistenceBridge::new(ORIGIN, MemoryStore::new(), RecordingChannel::new(), 60_000.0)
    }

    #[test]
    fn test_ready_once() {
        let mut bridge = bridge();
        assert!(bridge.mark_ready(0.0));
        assert!(!bridge.mark_ready(10.0));
        assert_eq!(bridge.channel().types(), vec!["iframe:ready"]);
        assert_eq!(bridge.channel().sent[0].1, ORIGIN);
        assert_eq!(bridge.next_deadline(), Some(60_000.0));
    }

    #[test]
    fn test_autosave_timer_rearms() {
        let mut bridge = bridge();
        assert!(!bridge.autosave_due(1_000_000.0));
        bridge.mark_ready(0.0);
        assert!(!bridge.autosave_due(59_999.0));
        assert!(bridge.autosave_due(60_000.0));
        assert_eq!(bridge.next_deadline(), Some(120_000.0));
    }

    #[test]
    fn test_draft_save_creates_once() {
        let mut bridge = bridge();
        let model = ScoreModel::default();

        assert_eq!(bridge.save(&model, SaveKind::Manual).kind, NoticeKind::Manual);
        assert_eq!(bridge.identity(), Identity::Creating);
        bridge.save(&model, SaveKind::Auto);

        assert_eq!(bridge.channel().types(), vec!["score:create"]);
        assert!(bridge.store().get(&model.storage_key()).unwrap().is_some());
        assert_eq!(
            bridge.store().get("lastOpenedScoreId").unwrap(),
            Some(model.score_id.clone())
        );
    }

    #[test]
    fn test_created_promotes_and_replays() {
        let mut bridge = bridge();
        let mut model = ScoreModel::default();
        bridge.save(&model, SaveKind::Manual);
        model.add_element(Element::note(Degree::One));
        bridge.save(&model, SaveKind::Auto);

        let outcome = bridge.handle_message(
            &mut model,
            ORIGIN,
            json!({"type": "score:created", "payload": {"success": true, "scoreId": "srv-1"}}),
        );
        assert_eq!(outcome, Inbound::Promoted { score_id: "srv-1".into() });
        assert_eq!(model.score_id, "srv-1");
        assert_eq!(bridge.identity(), Identity::Durable);
        assert_eq!(
            bridge.channel().types(),
            vec!["score:create", "score:updateUrl", "score:autosave"]
        );
        assert!(bridge.store().get("score:srv-1").unwrap().is_some());
    }

    #[test]
    fn test_failed_create_returns_to_draft() {
        let mut bridge = bridge();
        let mut model = ScoreModel::default();
        bridge.save(&model, SaveKind::Manual);

        let outcome = bridge.handle_message(
            &mut model,
            ORIGIN,
            json!({"type": "score:created", "payload": {"success": false, "error": "quota"}}),
        );
        assert!(matches!(outcome, Inbound::CreateFailed(ref n) if n.kind == NoticeKind::Error));
        assert_eq!(bridge.identity(), Identity::Draft);
        assert!(bridge.store().get(&model.storage_key()).unwrap().is_some());
    }

    #[test]
    fn test_foreign_origin_is_dropped() {
        let mut bridge = bridge();
        let mut model = ScoreModel::default();
        let before = model.title.clone();

        let mut doc = ScoreDocument::blank("x");
        doc.title = "Injected".into();
        let data = json!({"type": "score:load", "payload": doc});
        assert_eq!(bridge.handle_message(&mut model, "https://evil.example", data), Inbound::Dropped);
        assert_eq!(model.title, before);
        assert_eq!(bridge.identity(), Identity::Draft);
    }

    #[test]
    fn test_store_failure_still_notifies_host() {
        let mut bridge = PersistenceBridge::new(ORIGIN, MemoryStore::rejecting(), RecordingChannel::new(), 60_000.0);
        let model = ScoreModel::default();
        let notice = bridge.save(&model, SaveKind::Manual);
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(bridge.channel().types(), vec!["score:create"]);
    }

    #[test]
    fn test_restore_local() {
        let mut bridge = bridge();
        let mut model = ScoreModel::default();
        model.add_element(Element::note(Degree::Four));
        bridge.save(&model, SaveKind::Manual);
        let id = model.score_id.clone();

        let mut fresh = ScoreModel::default();
        assert!(bridge.restore_local(&mut fresh, &id));
        assert_eq!(fresh.measures, model.measures);
        assert!(!bridge.restore_local(&mut fresh, "missing"));
    }
}
