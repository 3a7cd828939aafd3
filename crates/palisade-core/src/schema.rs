// ── Declarative per-type schema tables ──
//
// One table per object type drives both the validator and the diff
// engine, so the field lists exist exactly once. Rules are data, not
// code: required-one-of groups, enumerated values, pattern-checked
// scalars, and set-semantics list fields.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::EngineError;

// ── ObjectType ──────────────────────────────────────────────────────

/// Logical object types the engine manages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    SecurityRule,
    Tag,
}

impl ObjectType {
    /// Parse a caller-supplied type name, producing the typed error the
    /// resolver contract requires for unsupported types.
    pub fn parse(name: &str) -> Result<Self, EngineError> {
        name.parse().map_err(|_| EngineError::UnknownType {
            object_type: name.to_owned(),
        })
    }

    /// Tree node this type lives under, relative to a scope prefix.
    /// Security rules are positioned inside a rulebase, which differs
    /// between firewall and manager scopes; the resolver handles that.
    pub(crate) fn node(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::AddressGroup => "address-group",
            Self::Service => "service",
            Self::ServiceGroup => "service-group",
            Self::SecurityRule => "rules",
            Self::Tag => "tag",
        }
    }
}

// ── Field rules ─────────────────────────────────────────────────────

/// Value-shape check applied to a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Dotted quad with octets 0–255 and optional /0–32 prefix.
    CidrOrHost,
    /// `start-end` pair of valid addresses.
    AddressRange,
    /// At least one separator; must not itself be a raw IP.
    DomainName,
    /// Single port, dash range, or comma list, each 1–65535.
    PortSpec,
}

/// Declarative rule attached to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Value must be one of the listed literals.
    OneOf(&'static [&'static str]),
    /// Value must match the pattern.
    Pattern(PatternKind),
}

/// Expected shape of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
}

/// Schema entry for a single field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rule: Option<FieldRule>,
    /// List compared as a multiset (membership semantics) in diffs.
    pub set_semantics: bool,
}

const fn scalar(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Scalar,
        rule: None,
        set_semantics: false,
    }
}

const fn checked(name: &'static str, rule: FieldRule) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Scalar,
        rule: Some(rule),
        set_semantics: false,
    }
}

const fn members(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::List,
        rule: None,
        set_semantics: true,
    }
}

/// Full schema for one object type.
#[derive(Debug, Clone, Copy)]
pub struct TypeSchema {
    pub object_type: ObjectType,
    pub fields: &'static [FieldSpec],
    /// Groups where exactly one member field must be present.
    pub required_one_of: &'static [&'static [&'static str]],
}

impl TypeSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ── Tables ──────────────────────────────────────────────────────────

/// Administrative/metadata fields the appliance attaches to every node.
/// Excluded from diffing entirely; they must never cause a false
/// "changed" verdict.
pub const ADMIN_FIELDS: &[&str] = &["@admin", "@dirty-id", "@time", "@uuid", "@loc"];

static ADDRESS: TypeSchema = TypeSchema {
    object_type: ObjectType::Address,
    fields: &[
        checked("network", FieldRule::Pattern(PatternKind::CidrOrHost)),
        checked("range", FieldRule::Pattern(PatternKind::AddressRange)),
        checked("domain-name", FieldRule::Pattern(PatternKind::DomainName)),
        scalar("description"),
        members("tags"),
    ],
    required_one_of: &[&["network", "range", "domain-name"]],
};

static ADDRESS_GROUP: TypeSchema = TypeSchema {
    object_type: ObjectType::AddressGroup,
    fields: &[members("members"), scalar("description"), members("tags")],
    required_one_of: &[&["members"]],
};

static SERVICE: TypeSchema = TypeSchema {
    object_type: ObjectType::Service,
    fields: &[
        checked("protocol", FieldRule::OneOf(&["tcp", "udp"])),
        checked("port", FieldRule::Pattern(PatternKind::PortSpec)),
        scalar("description"),
        members("tags"),
    ],
    required_one_of: &[&["protocol"], &["port"]],
};

static SERVICE_GROUP: TypeSchema = TypeSchema {
    object_type: ObjectType::ServiceGroup,
    fields: &[members("members"), members("tags")],
    required_one_of: &[&["members"]],
};

static SECURITY_RULE: TypeSchema = TypeSchema {
    object_type: ObjectType::SecurityRule,
    fields: &[
        checked("action", FieldRule::OneOf(&["allow", "deny", "drop"])),
        members("from"),
        members("to"),
        members("source"),
        members("destination"),
        members("service"),
        scalar("description"),
        members("tags"),
    ],
    required_one_of: &[&["action"]],
};

static TAG: TypeSchema = TypeSchema {
    object_type: ObjectType::Tag,
    fields: &[scalar("color"), scalar("comments")],
    required_one_of: &[],
};

/// Look up the schema table for an object type.
pub fn schema_for(object_type: ObjectType) -> &'static TypeSchema {
    match object_type {
        ObjectType::Address => &ADDRESS,
        ObjectType::AddressGroup => &ADDRESS_GROUP,
        ObjectType::Service => &SERVICE,
        ObjectType::ServiceGroup => &SERVICE_GROUP,
        ObjectType::SecurityRule => &SECURITY_RULE,
        ObjectType::Tag => &TAG,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn parse_known_and_unknown_types() {
        assert_eq!(ObjectType::parse("address").unwrap(), ObjectType::Address);
        assert_eq!(
            ObjectType::parse("security-rule").unwrap(),
            ObjectType::SecurityRule
        );
        let err = ObjectType::parse("widget").unwrap_err();
        assert!(matches!(err, EngineError::UnknownType { object_type } if object_type == "widget"));
    }

    #[test]
    fn every_type_has_a_schema() {
        for t in ObjectType::iter() {
            let schema = schema_for(t);
            assert_eq!(schema.object_type, t);
        }
    }

    #[test]
    fn address_requires_exactly_one_locator() {
        let schema = schema_for(ObjectType::Address);
        assert_eq!(schema.required_one_of.len(), 1);
        assert_eq!(schema.required_one_of[0], ["network", "range", "domain-name"]);
    }

    #[test]
    fn tag_fields_are_set_semantics() {
        let schema = schema_for(ObjectType::Address);
        assert!(schema.field("tags").unwrap().set_semantics);
        assert!(!schema.field("description").unwrap().set_semantics);
    }
}
