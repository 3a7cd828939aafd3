// The backend capability consumed by the config engine.
//
// Everything above this trait is pure and synchronous; backend calls are
// the only suspension points in the system. Implementations own their own
// connection pooling; the engine only issues calls through the trait.

use async_trait::async_trait;

use crate::error::ApiError;

/// Raw payload as it travels over the wire: a JSON value whose shape the
/// core interprets (object fields as maps, membership fields as arrays).
pub type RawPayload = serde_json::Value;

/// Abstract configuration-tree backend.
///
/// `path` is always a fully-resolved tree address (an XPath-style string
/// produced by the core's resolver). The four operations mirror the
/// appliance's config API verbs:
///
/// - `get`: read the node, `None` if it does not exist
/// - `set`: create the node (merge semantics on the appliance side)
/// - `edit`: replace the node
/// - `delete`: remove the node
///
/// All four may fail with a connectivity error (retryable) or a semantic
/// error (final). Implementations must be safe for concurrent outstanding
/// calls; the upper layers impose no ordering across paths.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<RawPayload>, ApiError>;

    async fn set(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError>;

    async fn edit(&self, path: &str, payload: &RawPayload) -> Result<(), ApiError>;

    async fn delete(&self, path: &str) -> Result<(), ApiError>;
}
