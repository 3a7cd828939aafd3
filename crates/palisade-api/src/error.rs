use thiserror::Error;

/// Top-level error type for the `palisade-api` crate.
///
/// Every backend failure is either *connectivity* (the appliance could not
/// be reached; worth retrying) or *semantic* (the appliance rejected the
/// request; retrying cannot help). `palisade-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum ApiError {
    // ── Connectivity ────────────────────────────────────────────────
    /// The appliance could not be reached (gateway down, upstream timeout).
    #[error("Connectivity failure: {message}")]
    Connectivity { message: String },

    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Semantic ────────────────────────────────────────────────────
    /// The appliance rejected an otherwise well-formed request
    /// (bad content, authorization, unknown node).
    #[error("Backend rejected request: {message}")]
    Semantic {
        message: String,
        /// Appliance-specific error code (e.g. `"7"` for missing object).
        code: Option<String>,
    },

    /// Invalid API key or missing credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl ApiError {
    /// Shorthand for a semantic rejection without an appliance code.
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic {
            message: message.into(),
            code: None,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Only connectivity-class failures qualify; semantic rejections are
    /// final on first occurrence.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connectivity { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the appliance reported "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Semantic { code: Some(c), .. } if c == "7")
    }

    /// Extract the appliance error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Semantic { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
