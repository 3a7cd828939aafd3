// ── Validator ──
//
// Identity and field validation against the declarative schema tables.
// Synchronous, deterministic, never touches the network. The first
// violated rule is reported with the field name and the expected shape.

use std::net::Ipv4Addr;

use crate::error::EngineError;
use crate::payload::Payload;
use crate::schema::{FieldRule, ObjectType, PatternKind, schema_for};

const MAX_IDENTITY_LEN: usize = 63;

// ── Identity rules ──────────────────────────────────────────────────

/// Validate an object identity.
///
/// 1–63 characters; must not start with an underscore or a space; must
/// not contain consecutive spaces; charset is alphanumerics plus
/// hyphen, underscore, period, and space.
pub fn validate_identity(identity: &str) -> Result<(), EngineError> {
    if identity.is_empty() {
        return Err(EngineError::validation("name", "must not be empty"));
    }
    if identity.chars().count() > MAX_IDENTITY_LEN {
        return Err(EngineError::validation(
            "name",
            format!("must be at most {MAX_IDENTITY_LEN} characters"),
        ));
    }
    if identity.starts_with('_') || identity.starts_with(' ') {
        return Err(EngineError::validation(
            "name",
            "must not start with an underscore or a space",
        ));
    }
    if identity.contains("  ") {
        return Err(EngineError::validation(
            "name",
            "must not contain consecutive spaces",
        ));
    }
    if let Some(bad) = identity
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')))
    {
        return Err(EngineError::validation(
            "name",
            format!("invalid character '{bad}': allowed are alphanumerics, '-', '_', '.', ' '"),
        ));
    }
    Ok(())
}

// ── Field rules ─────────────────────────────────────────────────────

/// Validate an object payload against its type's schema table.
pub fn validate_fields(object_type: ObjectType, payload: &Payload) -> Result<(), EngineError> {
    let schema = schema_for(object_type);

    // Required-one-of groups: exactly one member must be present.
    for group in schema.required_one_of {
        let present: Vec<&str> = group
            .iter()
            .copied()
            .filter(|f| payload.contains_key(*f))
            .collect();
        match present.len() {
            1 => {}
            0 => {
                return Err(EngineError::validation(
                    group.join("|"),
                    format!("exactly one of [{}] is required", group.join(", ")),
                ));
            }
            _ => {
                return Err(EngineError::validation(
                    present.join("|"),
                    format!(
                        "fields [{}] are mutually exclusive; provide exactly one",
                        present.join(", ")
                    ),
                ));
            }
        }
    }

    // Per-field value rules.
    for (field, value) in payload {
        let Some(spec) = schema.field(field) else {
            continue; // unknown fields pass through; the appliance owns them
        };
        let Some(rule) = spec.rule else { continue };
        let Some(scalar) = value.as_scalar() else {
            return Err(EngineError::validation(
                field.clone(),
                "expected a scalar value",
            ));
        };
        check_rule(field, scalar, rule)?;
    }

    Ok(())
}

fn check_rule(field: &str, value: &str, rule: FieldRule) -> Result<(), EngineError> {
    match rule {
        FieldRule::OneOf(options) => {
            if options.contains(&value) {
                Ok(())
            } else {
                Err(EngineError::validation(
                    field,
                    format!("expected one of [{}], got '{value}'", options.join(", ")),
                ))
            }
        }
        FieldRule::Pattern(kind) => check_pattern(field, value, kind),
    }
}

fn check_pattern(field: &str, value: &str, kind: PatternKind) -> Result<(), EngineError> {
    let ok = match kind {
        PatternKind::CidrOrHost => is_cidr_or_host(value),
        PatternKind::AddressRange => is_address_range(value),
        PatternKind::DomainName => is_domain_name(value),
        PatternKind::PortSpec => is_port_spec(value),
    };
    if ok {
        return Ok(());
    }
    let expected = match kind {
        PatternKind::CidrOrHost => "a dotted-quad address with optional /0-32 prefix",
        PatternKind::AddressRange => "a 'start-end' pair of valid addresses",
        PatternKind::DomainName => "a domain name (not a raw IP address)",
        PatternKind::PortSpec => "a port, port range, or comma-separated port list (1-65535)",
    };
    Err(EngineError::validation(
        field,
        format!("expected {expected}, got '{value}'"),
    ))
}

// ── Pattern primitives ──────────────────────────────────────────────

fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_cidr_or_host(s: &str) -> bool {
    match s.split_once('/') {
        Some((addr, prefix)) => {
            is_ipv4(addr) && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
        }
        None => is_ipv4(s),
    }
}

fn is_address_range(s: &str) -> bool {
    s.split_once('-')
        .is_some_and(|(start, end)| is_ipv4(start) && is_ipv4(end))
}

fn is_domain_name(s: &str) -> bool {
    s.contains('.') && !is_ipv4(s) && !s.is_empty()
}

fn is_port(s: &str) -> bool {
    s.parse::<u16>().is_ok_and(|p| p >= 1)
}

fn is_port_spec(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.split(',').all(|piece| match piece.split_once('-') {
        Some((lo, hi)) => is_port(lo) && is_port(hi),
        None => is_port(piece),
    })
}
