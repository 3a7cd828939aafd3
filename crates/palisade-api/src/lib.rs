//! Transport layer for palisade.
//!
//! Defines the [`ConfigBackend`] capability every config engine consumes,
//! the backend error taxonomy, the retry-with-backoff resilience wrapper,
//! and a reference HTTP backend speaking the JSON config-gateway protocol.
//! `palisade-core` maps [`ApiError`] into domain-level diagnostics.

pub mod backend;
pub mod error;
pub mod http;
pub mod retry;
pub mod transport;

pub use backend::{ConfigBackend, RawPayload};
pub use error::ApiError;
pub use http::HttpBackend;
pub use retry::{RetryPolicy, with_retry};
pub use transport::{TlsMode, TransportConfig};
