// ── Core error types ──
//
// User-facing errors from palisade-core. Consumers never see HTTP status
// codes or envelope details directly; the `From<palisade_api::ApiError>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Validation ───────────────────────────────────────────────────
    /// An identity or field rule was violated. Never retried; always
    /// reports the failing field and the expected shape.
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Unsupported object type passed to the resolver. Fatal to the
    /// single request, never to a whole sequencer run.
    #[error("Unknown object type: {object_type}")]
    UnknownType { object_type: String },

    // ── Backend errors ───────────────────────────────────────────────
    /// Transient network failure that survived every retry attempt.
    #[error("Connectivity failure: {message}")]
    Connectivity { message: String },

    /// The appliance rejected a well-formed request.
    #[error("Backend rejected request: {message}")]
    Semantic {
        message: String,
        code: Option<String>,
    },

    /// No object exists at the resolved address.
    #[error("Not found: {object_type} '{identity}'")]
    NotFound {
        object_type: String,
        identity: String,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Shorthand for a validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for failures that should abort a sequencer run
    /// rather than letting later steps proceed against a dead backend.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<palisade_api::ApiError> for EngineError {
    fn from(err: palisade_api::ApiError) -> Self {
        use palisade_api::ApiError;

        match err {
            ApiError::Connectivity { message } => EngineError::Connectivity { message },
            ApiError::Transport(e) => {
                if e.is_timeout() || e.is_connect() {
                    EngineError::Connectivity {
                        message: e.to_string(),
                    }
                } else {
                    EngineError::Semantic {
                        message: e.to_string(),
                        code: None,
                    }
                }
            }
            ApiError::Tls(message) => EngineError::Connectivity {
                message: format!("TLS error: {message}"),
            },
            ApiError::Semantic { message, code } => EngineError::Semantic { message, code },
            ApiError::Authentication { message } => EngineError::Semantic {
                message: format!("authentication failed: {message}"),
                code: None,
            },
            ApiError::InvalidUrl(e) => EngineError::Internal(format!("invalid URL: {e}")),
            ApiError::Deserialization { message, body: _ } => {
                EngineError::Internal(format!("deserialization error: {message}"))
            }
        }
    }
}
