//! Object command handlers: one generic CRUD surface for every type.

use std::sync::Arc;

use dialoguer::Confirm;
use std::io::IsTerminal;
use tabled::Tabled;

use palisade_core::schema::{FieldKind, schema_for};
use palisade_core::{
    ApprovalDecision, ApprovalGate, ConfigEngine, CrudOutcome, CrudRequest, DeviceContext,
    ObjectType, Payload, SkipReason, Value,
};

use crate::approval::PromptGate;
use crate::cli::{GlobalOpts, ObjectArgs, ObjectCommand};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

fn object_row(payload: &Payload) -> ObjectRow {
    ObjectRow {
        name: object_name(payload),
        fields: payload
            .iter()
            .filter(|(k, _)| !k.starts_with('@'))
            .map(|(k, v)| format!("{k}={}", render_value(v)))
            .collect::<Vec<_>>()
            .join("  "),
    }
}

fn object_name(payload: &Payload) -> String {
    payload
        .get("@name")
        .and_then(Value::as_scalar)
        .unwrap_or("-")
        .to_owned()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Scalar(s) => s.clone(),
        Value::List(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Map(_) => "{...}".into(),
    }
}

fn object_detail(payload: &Payload) -> String {
    payload
        .iter()
        .map(|(k, v)| format!("{k}: {}", render_value(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Field parsing ───────────────────────────────────────────────────

/// Parse `key=value` assignments into a payload. Values for list-shaped
/// fields split on commas; everything else stays a scalar.
fn parse_fields(object_type: ObjectType, fields: &[String]) -> Result<Payload, CliError> {
    let schema = schema_for(object_type);
    let mut payload = Payload::new();

    for assignment in fields {
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(CliError::Validation {
                field: "field".into(),
                reason: format!("expected KEY=VALUE, got '{assignment}'"),
            });
        };
        let key = key.trim();
        let is_list = schema
            .field(key)
            .is_some_and(|spec| spec.kind == FieldKind::List);
        let parsed = if is_list {
            Value::list(value.split(',').map(str::trim))
        } else {
            Value::scalar(value.trim())
        };
        payload.insert(key.to_owned(), parsed);
    }

    Ok(payload)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    engine: &Arc<ConfigEngine>,
    object_type: ObjectType,
    args: ObjectArgs,
    context: DeviceContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ObjectCommand::List => {
            let outcome = engine
                .perform(CrudRequest::list(object_type, context))
                .await?;
            let CrudOutcome::Listed { items, .. } = outcome else {
                return Ok(());
            };
            let out = output::render_list(&global.output, &items, object_row, object_name);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ObjectCommand::Get { name } => {
            let outcome = engine
                .perform(CrudRequest::read(object_type, name, context))
                .await?;
            let CrudOutcome::Read { payload, .. } = outcome else {
                return Ok(());
            };
            let out = output::render_single(&global.output, &payload, object_detail, object_name);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ObjectCommand::Set { name, fields } => {
            let payload = parse_fields(object_type, &fields)?;
            let outcome = engine
                .perform(CrudRequest::create(
                    object_type,
                    name.clone(),
                    payload.clone(),
                    context.clone(),
                ))
                .await?;
            report_push(engine, object_type, &name, payload, context, outcome, global).await
        }

        ObjectCommand::Update { name, fields } => {
            let payload = parse_fields(object_type, &fields)?;
            let outcome = engine
                .perform(CrudRequest::update(object_type, name, payload, context))
                .await?;
            report_outcome(&outcome, global);
            Ok(())
        }

        ObjectCommand::Delete { name } => {
            confirm_delete(object_type, &name, global)?;
            let outcome = engine
                .perform(CrudRequest::delete(object_type, name, context))
                .await?;
            report_outcome(&outcome, global);
            Ok(())
        }
    }
}

/// Handle a `set` result: a collision with a changed object goes
/// through the approval gate before becoming an update.
async fn report_push(
    engine: &Arc<ConfigEngine>,
    object_type: ObjectType,
    name: &str,
    desired: Payload,
    context: DeviceContext,
    outcome: CrudOutcome,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let CrudOutcome::Skipped {
        reason: SkipReason::ExistsWithChanges,
        diff: Some(diff),
        ..
    } = &outcome
    else {
        report_outcome(&outcome, global);
        return Ok(());
    };

    let gate = PromptGate::new(global.yes);
    let description = format!("{object_type} '{name}' exists with different fields:");
    match gate.approve(&description, diff).await {
        ApprovalDecision::Approved => {
            let updated = engine
                .perform(CrudRequest::update(object_type, name, desired, context))
                .await?;
            report_outcome(&updated, global);
            Ok(())
        }
        ApprovalDecision::Rejected | ApprovalDecision::Deferred => {
            output::print_output(&diff.summary(), global.quiet);
            output::print_output("no changes applied", global.quiet);
            Ok(())
        }
    }
}

fn report_outcome(outcome: &CrudOutcome, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let line = match outcome {
        CrudOutcome::Created { path } => {
            format!("{} {path}", output::status_word("created", color))
        }
        CrudOutcome::Updated { path, diff } => format!(
            "{} {path}\n{}",
            output::status_word("updated", color),
            diff.summary()
        ),
        CrudOutcome::Deleted { path } => {
            format!("{} {path}", output::status_word("deleted", color))
        }
        CrudOutcome::Skipped { path, reason, .. } => {
            let why = match reason {
                SkipReason::Unchanged => "already up to date",
                SkipReason::ExistsWithChanges => "exists with different fields",
            };
            format!("{} {path} ({why})", output::status_word("skipped", color))
        }
        CrudOutcome::Read { .. } | CrudOutcome::Listed { .. } => String::new(),
    };
    output::print_output(&line, global.quiet);
}

fn confirm_delete(
    object_type: ObjectType,
    name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if global.yes {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "delete".into(),
            reason: "refusing to delete without confirmation; pass --yes (-y)".into(),
        });
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete {object_type} '{name}'?"))
        .default(false)
        .interact()
        .map_err(|e| CliError::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {e}"),
        })?;
    if confirmed {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "delete".into(),
            reason: "aborted by user".into(),
        })
    }
}
