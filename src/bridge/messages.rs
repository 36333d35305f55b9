//! Message envelopes exchanged between the editor frame and its host page
//!
//! Every message is `{type, payload?}`. Inbound messages are only accepted
//! from the editor's own origin; outbound messages name that origin as their
//! explicit target.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::BridgeError;
use crate::models::ScoreDocument;

pub const LOAD: &str = "score:load";
pub const READY: &str = "iframe:ready";
pub const AUTOSAVE: &str = "score:autosave";
pub const CREATE: &str = "score:create";
pub const CREATED: &str = "score:created";
pub const UPDATE_URL: &str = "score:updateUrl";

/// Reply to a create request
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreatedPayload {
    pub fn ok(score_id: impl Into<String>) -> Self {
        Self {
            success: true,
            score_id: Some(score_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            score_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUrlPayload {
    pub score_id: String,
}

/// A protocol message
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum Envelope {
    /// host → editor: replace the document
    #[serde(rename = "score:load")]
    Load(Box<ScoreDocument>),

    /// editor → host: listener installed
    #[serde(rename = "iframe:ready")]
    Ready,

    /// editor → host: persist this document
    #[serde(rename = "score:autosave")]
    Autosave(Box<ScoreDocument>),

    /// editor → host: create a durable record for a draft
    #[serde(rename = "score:create")]
    Create(Box<ScoreDocument>),

    /// host → editor: outcome of a create request
    #[serde(rename = "score:created")]
    Created(CreatedPayload),

    /// editor → host: rewrite the page URL to the durable id
    #[serde(rename = "score:updateUrl")]
    UpdateUrl(UpdateUrlPayload),
}

impl Envelope {
    pub fn type_name(&self) -> &'static str {
        match self {
            Envelope::Load(_) => LOAD,
            Envelope::Ready => READY,
            Envelope::Autosave(_) => AUTOSAVE,
            Envelope::Create(_) => CREATE,
            Envelope::Created(_) => CREATED,
            Envelope::UpdateUrl(_) => UPDATE_URL,
        }
    }

    /// Decode raw message data
    pub fn from_value(data: Value) -> Result<Self, BridgeError> {
        let kind = data
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Malformed("missing type".to_string()))?
            .to_string();

        match kind.as_str() {
            READY => return Ok(Envelope::Ready),
            LOAD | AUTOSAVE | CREATE | CREATED | UPDATE_URL => {}
            _ => return Err(BridgeError::UnknownType(kind)),
        }

        if data.get("payload").map(Value::is_null).unwrap_or(true) {
            return Err(BridgeError::MissingPayload(kind));
        }
        Ok(serde_json::from_value(data)?)
    }

    pub fn to_value(&self) -> Result<Value, BridgeError> {
        serde_json::to_value(self).map_err(|e| BridgeError::PostFailed(e.to_string()))
    }
}

/// Same-origin guard for inbound messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginGuard {
    origin: String,
}

impl OriginGuard {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// The explicit target origin for outbound messages
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn accepts(&self, origin: &str) -> bool {
        origin == self.origin
    }

    /// Decode a message if it comes from our own origin
    pub fn admit(&self, origin: &str, data: Value) -> Result<Option<Envelope>, BridgeError> {
        if !self.accepts(origin) {
            log::debug!("dropping message from foreign origin {}", origin);
            return Ok(None);
        }
        Envelope::from_value(data).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ready_has_no_payload() {
        let value = Envelope::Ready.to_value().unwrap();
        assert_eq!(value, json!({"type": "iframe:ready"}));
        assert_eq!(Envelope::from_value(value).unwrap(), Envelope::Ready);
    }

    #[test]
    fn test_created_decodes() {
        let msg = Envelope::from_value(json!({
            "type": "score:created",
            "payload": {"success": true, "scoreId": "abc"}
        }))
        .unwrap();
        assert_eq!(msg, Envelope::Created(CreatedPayload::ok("abc")));
    }

    #[test]
    fn test_update_url_encodes() {
        let msg = Envelope::UpdateUrl(UpdateUrlPayload {
            score_id: "abc".into(),
        });
        assert_eq!(
            msg.to_value().unwrap(),
            json!({"type": "score:updateUrl", "payload": {"scoreId": "abc"}})
        );
    }

    #[test]
    fn test_rejects_unknown_and_empty() {
        assert!(matches!(
            Envelope::from_value(json!({"type": "other"})),
            Err(BridgeError::UnknownType(_))
        ));
        assert!(matches!(
            Envelope::from_value(json!({"type": "score:load"})),
            Err(BridgeError::MissingPayload(_))
        ));
        assert!(matches!(Envelope::from_value(json!("text")), Err(BridgeError::Malformed(_))));
    }

    #[test]
    fn test_origin_guard() {
        let guard = OriginGuard::new("https://scores.example");
        let data = json!({"type": "iframe:ready"});
        assert_eq!(guard.admit("https://evil.example", data.clone()).unwrap(), None);
        assert_eq!(guard.admit("https://scores.example", data).unwrap(), Some(Envelope::Ready));
    }
}
