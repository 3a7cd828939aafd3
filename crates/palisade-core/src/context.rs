// ── Device context model ──
//
// Which logical region of the config tree an operation targets: a named
// vsys on a single firewall, or one of four manager-level scopes. Resolved
// once per session, passed by value everywhere, never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default sub-scope for single firewalls.
pub const DEFAULT_VSYS: &str = "vsys1";

// ── Scope ───────────────────────────────────────────────────────────

/// Manager-level scope selector. Exactly one applies per context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Shared,
    DeviceGroup(String),
    Template(String),
    TemplateStack(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::DeviceGroup(name) => write!(f, "device-group:{name}"),
            Self::Template(name) => write!(f, "template:{name}"),
            Self::TemplateStack(name) => write!(f, "template-stack:{name}"),
        }
    }
}

// ── DeviceContext ───────────────────────────────────────────────────

/// Immutable per-connection facts about the target appliance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceContext {
    /// A single firewall; operations target the named vsys.
    Firewall { vsys: String },
    /// A centralized manager; operations target one scope.
    Manager { scope: Scope },
}

impl DeviceContext {
    pub fn firewall(vsys: impl Into<String>) -> Self {
        Self::Firewall { vsys: vsys.into() }
    }

    pub fn manager(scope: Scope) -> Self {
        Self::Manager { scope }
    }

    /// Stable label identifying the scope, used as the cache's
    /// scope-invalidation key (`vsys:vsys1`, `device-group:Branch`, ...).
    pub fn scope_label(&self) -> String {
        match self {
            Self::Firewall { vsys } => format!("vsys:{vsys}"),
            Self::Manager { scope } => scope.to_string(),
        }
    }
}

impl Default for DeviceContext {
    /// An entirely empty context still targets `vsys1`; callers that
    /// predate multi-scope support rely on this.
    fn default() -> Self {
        Self::Firewall {
            vsys: DEFAULT_VSYS.into(),
        }
    }
}

// ── ContextSpec ─────────────────────────────────────────────────────

/// Loosely-validated context fields as a config file or CLI produces them.
///
/// Normalizes into a [`DeviceContext`] via [`ContextSpec::into_context`],
/// applying the fixed scope priority when several manager fields are set:
/// template > template-stack > device-group > shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsys: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_stack: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shared: bool,
}

impl ContextSpec {
    /// Normalize into a concrete context.
    ///
    /// The manager fields are consulted in priority order; empty strings
    /// count as unset. A spec with no manager field at all is a firewall
    /// context with the (possibly defaulted) vsys.
    pub fn into_context(self) -> DeviceContext {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        if let Some(name) = non_empty(self.template) {
            return DeviceContext::manager(Scope::Template(name));
        }
        if let Some(name) = non_empty(self.template_stack) {
            return DeviceContext::manager(Scope::TemplateStack(name));
        }
        if let Some(name) = non_empty(self.device_group) {
            return DeviceContext::manager(Scope::DeviceGroup(name));
        }
        if self.shared {
            return DeviceContext::manager(Scope::Shared);
        }

        DeviceContext::Firewall {
            vsys: non_empty(self.vsys).unwrap_or_else(|| DEFAULT_VSYS.into()),
        }
    }
}
