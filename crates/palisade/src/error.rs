//! CLI error types with miette diagnostics.
//!
//! Maps engine and config errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use palisade_core::EngineError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    /// A workflow finished with at least one failed or suspended step.
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the gateway: {message}")]
    #[diagnostic(
        code(palisade::connection_failed),
        help(
            "Check that the appliance is reachable and the gateway URL is correct.\n\
             Self-signed certificate? Use --insecure (-k) or set ca_cert in your profile."
        )
    )]
    Connection { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(palisade::auth_failed),
        help("Verify the API key for this profile. Run: palisade config init")
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(palisade::no_credentials),
        help(
            "Configure credentials with: palisade config init\n\
             Or set the PALISADE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{object_type} '{identity}' not found")]
    #[diagnostic(
        code(palisade::not_found),
        help("Run: palisade {object_type} list to see what exists in this scope")
    )]
    NotFound {
        object_type: String,
        identity: String,
    },

    // ── Gateway semantics ────────────────────────────────────────────

    #[error("Gateway rejected the request: {message}")]
    #[diagnostic(code(palisade::gateway_error))]
    Gateway {
        message: String,
        code: Option<String>,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(palisade::validation))]
    Validation { field: String, reason: String },

    #[error("Unsupported object type '{object_type}'")]
    #[diagnostic(
        code(palisade::unknown_type),
        help(
            "Supported types: address, address-group, service, service-group,\n\
             security-rule, tag"
        )
    )]
    UnknownType { object_type: String },

    // ── Workflow ─────────────────────────────────────────────────────

    #[error("Workflow did not complete: {reason}")]
    #[diagnostic(code(palisade::workflow_incomplete))]
    WorkflowIncomplete { reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(palisade::profile_not_found),
        help("Create one with: palisade config init")
    )]
    ProfileNotFound { name: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(palisade::no_config),
        help(
            "Create one with: palisade config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(palisade::config))]
    Config(#[from] palisade_config::ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(palisade::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid workflow file: {0}")]
    #[diagnostic(code(palisade::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),

    #[error("{message}")]
    #[diagnostic(code(palisade::internal))]
    Internal { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::UnknownType { .. } => exit_code::USAGE,
            Self::WorkflowIncomplete { .. } => exit_code::PARTIAL,
            _ => exit_code::GENERAL,
        }
    }
}

// ── EngineError → CliError mapping ───────────────────────────────────

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { field, message } => Self::Validation {
                field,
                reason: message,
            },
            EngineError::UnknownType { object_type } => Self::UnknownType { object_type },
            EngineError::Connectivity { message } => Self::Connection { message },
            EngineError::Semantic { message, code } => Self::Gateway { message, code },
            EngineError::NotFound {
                object_type,
                identity,
            } => Self::NotFound {
                object_type,
                identity,
            },
            EngineError::Internal(message) => Self::Internal { message },
        }
    }
}
