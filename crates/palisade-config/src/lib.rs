//! Shared configuration for the palisade CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation into the connection settings the gateway backend
//! needs. The CLI adds flag-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use palisade_api::{TlsMode, TransportConfig};
use palisade_core::{ContextSpec, DeviceContext};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}' in config")]
    UnknownProfile { profile: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to the configured default name.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .map(ToOwned::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        self.profiles
            .get_key_value(name.as_str())
            .map(|(k, v)| (k.as_str(), v))
            .ok_or(ConfigError::UnknownProfile { profile: name })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named gateway profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway base URL (e.g., "https://10.0.0.1").
    pub gateway: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Scope selection for this profile; fields map onto the context
    /// priority rules (template > template-stack > device-group >
    /// shared > vsys).
    #[serde(flatten)]
    pub context: ContextSpec,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,

    /// Override read-cache TTL in seconds.
    pub cache_ttl: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "palisade", "palisade").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("palisade");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path (tests, `--config` flag).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PALISADE_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key from the credential chain: named env var, then
/// system keyring, then plaintext in the config file.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new("palisade", &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Connection settings ─────────────────────────────────────────────

/// Everything needed to open a gateway connection for one profile.
#[derive(Debug)]
pub struct GatewaySettings {
    pub url: Url,
    pub api_key: SecretString,
    pub transport: TransportConfig,
    pub context: DeviceContext,
    pub cache_ttl: Option<Duration>,
}

/// Build connection settings from a profile, resolving credentials and
/// normalizing the scope fields into a concrete context.
pub fn profile_to_settings(
    profile: &Profile,
    profile_name: &str,
) -> Result<GatewaySettings, ConfigError> {
    let url: Url = profile
        .gateway
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "gateway".into(),
            reason: format!("invalid URL: {}", profile.gateway),
        })?;

    let api_key = resolve_api_key(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::DangerAcceptInvalid // appliances typically self-signed
    };

    let transport = TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout)),
    };

    Ok(GatewaySettings {
        url,
        api_key,
        transport,
        context: profile.context.clone().into_context(),
        cache_ttl: profile.cache_ttl.map(Duration::from_secs),
    })
}
