//! Persistence bridge between the editor frame and its host page

pub mod errors;
pub mod messages;
pub mod persistence;
pub mod relay;
pub mod store;

pub use errors::{BridgeError, StoreError};
pub use messages::{CreatedPayload, Envelope, OriginGuard, UpdateUrlPayload};
pub use persistence::{last_opened_key, Identity, Inbound, Lifecycle, Notice, NoticeKind, PersistenceBridge, SaveKind};
pub use relay::{HostRelay, ScoreApi};
pub use store::{HostChannel, LocalStore, MemoryStore, RecordingChannel};
