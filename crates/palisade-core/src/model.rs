// ── Typed record builders for object payloads ──
//
// Strongly-typed request structs for each object type. Callers that know
// the shape at compile time build these instead of hand-assembling field
// maps; each converts into a `Payload` whose field names match the
// schema tables in `schema.rs`.

use serde::{Deserialize, Serialize};

use crate::payload::{Payload, Value};
use crate::schema::ObjectType;

// ── Address ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(rename = "domain-name", skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ── Service ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceObject {
    pub protocol: String,
    pub port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ── Groups ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupObject {
    pub members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ── Security rule ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRuleObject {
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// ── Tag ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

// ── Tagged union over all object records ───────────────────────────

/// A typed object record tagged by its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectRecord {
    Address(AddressObject),
    AddressGroup(GroupObject),
    Service(ServiceObject),
    ServiceGroup(GroupObject),
    SecurityRule(SecurityRuleObject),
    Tag(TagObject),
}

impl ObjectRecord {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Address(_) => ObjectType::Address,
            Self::AddressGroup(_) => ObjectType::AddressGroup,
            Self::Service(_) => ObjectType::Service,
            Self::ServiceGroup(_) => ObjectType::ServiceGroup,
            Self::SecurityRule(_) => ObjectType::SecurityRule,
            Self::Tag(_) => ObjectType::Tag,
        }
    }

    /// Flatten into the engine's field-map shape.
    pub fn into_payload(self) -> Payload {
        let mut p = Payload::new();
        match self {
            Self::Address(a) => {
                put_opt(&mut p, "network", a.network);
                put_opt(&mut p, "range", a.range);
                put_opt(&mut p, "domain-name", a.domain_name);
                put_opt(&mut p, "description", a.description);
                put_list(&mut p, "tags", a.tags);
            }
            Self::AddressGroup(g) | Self::ServiceGroup(g) => {
                put_list(&mut p, "members", g.members);
                put_opt(&mut p, "description", g.description);
                put_list(&mut p, "tags", g.tags);
            }
            Self::Service(s) => {
                p.insert("protocol".into(), Value::Scalar(s.protocol));
                p.insert("port".into(), Value::Scalar(s.port));
                put_opt(&mut p, "description", s.description);
                put_list(&mut p, "tags", s.tags);
            }
            Self::SecurityRule(r) => {
                p.insert("action".into(), Value::Scalar(r.action));
                put_list(&mut p, "from", r.from);
                put_list(&mut p, "to", r.to);
                put_list(&mut p, "source", r.source);
                put_list(&mut p, "destination", r.destination);
                put_list(&mut p, "service", r.service);
                put_opt(&mut p, "description", r.description);
                put_list(&mut p, "tags", r.tags);
            }
            Self::Tag(t) => {
                put_opt(&mut p, "color", t.color);
                put_opt(&mut p, "comments", t.comments);
            }
        }
        p
    }
}

fn put_opt(p: &mut Payload, field: &str, value: Option<String>) {
    if let Some(v) = value {
        p.insert(field.to_owned(), Value::Scalar(v));
    }
}

fn put_list(p: &mut Payload, field: &str, values: Vec<String>) {
    if !values.is_empty() {
        p.insert(
            field.to_owned(),
            Value::List(values.into_iter().map(Value::Scalar).collect()),
        );
    }
}
