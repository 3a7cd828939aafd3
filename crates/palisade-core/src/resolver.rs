// ── Path resolver ──
//
// Turns (object type, identity, context) into a concrete tree address.
// Scope handling is an ordered rule table evaluated in priority order
// (template > template-stack > device-group > shared > firewall vsys),
// not a pile of nested conditionals; the priority stays explicit and
// testable. Unknown object types are rejected earlier, at
// [`ObjectType::parse`], so resolution itself is a pure total function.

use crate::context::DeviceContext;
use crate::context::Scope;
use crate::schema::ObjectType;

const DEVICE_ROOT: &str = "/config/devices/entry[@name='localhost.localdomain']";

// ── ConfigPath ──────────────────────────────────────────────────────

/// A resolved tree address plus the context it was resolved under.
///
/// Two descriptors with identical type+identity but different contexts
/// resolve to different paths and are independent entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub xpath: String,
    pub context: DeviceContext,
}

impl ConfigPath {
    pub fn scope_label(&self) -> String {
        self.context.scope_label()
    }
}

// ── Scope rule table ────────────────────────────────────────────────

/// One (predicate, template) pair. Rules are consulted top to bottom;
/// the first one that renders wins.
struct ScopeRule {
    render: fn(&DeviceContext) -> Option<String>,
}

static SCOPE_RULES: &[ScopeRule] = &[
    ScopeRule {
        render: |ctx| match ctx {
            DeviceContext::Manager {
                scope: Scope::Template(name),
            } => Some(format!(
                "{DEVICE_ROOT}/template/entry[@name='{name}']/config/shared"
            )),
            _ => None,
        },
    },
    ScopeRule {
        render: |ctx| match ctx {
            DeviceContext::Manager {
                scope: Scope::TemplateStack(name),
            } => Some(format!(
                "{DEVICE_ROOT}/template-stack/entry[@name='{name}']/config/shared"
            )),
            _ => None,
        },
    },
    ScopeRule {
        render: |ctx| match ctx {
            DeviceContext::Manager {
                scope: Scope::DeviceGroup(name),
            } => Some(format!("{DEVICE_ROOT}/device-group/entry[@name='{name}']")),
            _ => None,
        },
    },
    ScopeRule {
        render: |ctx| match ctx {
            DeviceContext::Manager {
                scope: Scope::Shared,
            } => Some("/config/shared".to_owned()),
            _ => None,
        },
    },
    ScopeRule {
        render: |ctx| match ctx {
            DeviceContext::Firewall { vsys } => {
                Some(format!("{DEVICE_ROOT}/vsys/entry[@name='{vsys}']"))
            }
            _ => None,
        },
    },
];

fn scope_prefix(context: &DeviceContext) -> String {
    for rule in SCOPE_RULES {
        if let Some(prefix) = (rule.render)(context) {
            return prefix;
        }
    }
    // The table covers every DeviceContext variant.
    unreachable!("no scope rule matched context {context:?}")
}

/// Tree node for the type under the given scope. Security rules live in
/// the pre-rulebase on manager scopes and the plain rulebase elsewhere.
fn node_for(object_type: ObjectType, context: &DeviceContext) -> &'static str {
    if object_type == ObjectType::SecurityRule {
        return match context {
            DeviceContext::Manager {
                scope: Scope::Shared | Scope::DeviceGroup(_),
            } => "pre-rulebase/security/rules",
            _ => "rulebase/security/rules",
        };
    }
    object_type.node()
}

// ── Resolution ──────────────────────────────────────────────────────

/// Resolve the address of one named object.
///
/// Pure: identical inputs always yield an identical path string.
pub fn resolve(object_type: ObjectType, identity: &str, context: &DeviceContext) -> ConfigPath {
    let prefix = scope_prefix(context);
    let node = node_for(object_type, context);
    ConfigPath {
        xpath: format!("{prefix}/{node}/entry[@name='{identity}']"),
        context: context.clone(),
    }
}

/// Resolve the "list all of this type" address; the entry set without
/// the trailing identity predicate.
pub fn resolve_all(object_type: ObjectType, context: &DeviceContext) -> ConfigPath {
    let prefix = scope_prefix(context);
    let node = node_for(object_type, context);
    ConfigPath {
        xpath: format!("{prefix}/{node}/entry"),
        context: context.clone(),
    }
}
