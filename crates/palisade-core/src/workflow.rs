// ── Step sequencer ──
//
// Executes an ordered list of operations strictly sequentially: later
// steps may depend on earlier mutations. Each step is independently
// scored, a continuation judgment runs after every step, detected
// changes gate on external approval, and a soft step budget forces a
// graceful `Partial` stop with headroom left for result formatting.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::DeviceContext;
use crate::crud::{ConfigEngine, CrudOp, CrudOutcome, CrudRequest, SkipReason};
use crate::diff::ConfigDiff;
use crate::payload::{self, Payload};
use crate::schema::ObjectType;

/// Fraction of the nominal budget the sequencer will actually spend on
/// steps; the rest is headroom for reporting that must still complete.
const BUDGET_SOFT_FRACTION_PERCENT: usize = 60;

// ── Step specification ──────────────────────────────────────────────

/// One step of a workflow. Object types arrive as strings so an
/// unsupported type fails that step, not the whole run's parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum StepSpec {
    Operation {
        description: String,
        operation: CrudOp,
        object_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identity: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Approval {
        description: String,
    },
}

impl StepSpec {
    pub fn description(&self) -> &str {
        match self {
            Self::Operation { description, .. } | Self::Approval { description } => description,
        }
    }
}

// ── Step results ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
    AwaitingApproval,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub status: StepStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Terminal (or per-step continuation) verdict for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Continue,
    Complete,
    Partial,
    Aborted,
}

/// Everything a caller gets back from one sequencer invocation.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub results: Vec<StepResult>,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ── Approval gate ───────────────────────────────────────────────────

/// External approval verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
    /// No signal available right now; the step stays suspended and the
    /// run ends `Partial`.
    Deferred,
}

/// External collaborator consulted before a detected change is applied.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn approve(&self, description: &str, diff: &ConfigDiff) -> ApprovalDecision;
}

/// Gate that approves everything (`--yes` flows, tests).
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn approve(&self, _description: &str, _diff: &ConfigDiff) -> ApprovalDecision {
        ApprovalDecision::Approved
    }
}

/// Gate that rejects everything (non-interactive safety default).
pub struct AutoReject;

#[async_trait]
impl ApprovalGate for AutoReject {
    async fn approve(&self, _description: &str, _diff: &ConfigDiff) -> ApprovalDecision {
        ApprovalDecision::Rejected
    }
}

// ── Sequencer ───────────────────────────────────────────────────────

struct StepExecution {
    result: StepResult,
    /// A failure that makes running further steps pointless.
    fatal: bool,
    /// The step is waiting on an approval signal that never arrived.
    suspended: bool,
}

pub struct StepSequencer {
    engine: Arc<ConfigEngine>,
    gate: Arc<dyn ApprovalGate>,
    cancel: CancellationToken,
}

fn soft_limit(budget: usize) -> usize {
    if budget == 0 {
        return 0;
    }
    (budget * BUDGET_SOFT_FRACTION_PERCENT / 100).max(1)
}

impl StepSequencer {
    pub fn new(engine: Arc<ConfigEngine>, gate: Arc<dyn ApprovalGate>) -> Self {
        Self {
            engine,
            gate,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token; cancellation is honored between
    /// steps, never in the middle of one.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the steps in order under the given budget and context.
    pub async fn run(
        &self,
        steps: Vec<StepSpec>,
        budget: usize,
        context: DeviceContext,
    ) -> WorkflowRun {
        let limit = soft_limit(budget);
        let total = steps.len();
        let mut results: Vec<StepResult> = Vec::with_capacity(total.min(limit));

        for (index, step) in steps.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return WorkflowRun {
                    results,
                    decision: Decision::Aborted,
                    reason: Some(format!("cancelled before step {}", index + 1)),
                };
            }

            if results.len() >= limit {
                let executed = results.len();
                return WorkflowRun {
                    results,
                    decision: Decision::Partial,
                    reason: Some(format!(
                        "step budget nearly exhausted ({executed} of {budget} steps executed); \
remaining budget is reserved for result reporting"
                    )),
                };
            }

            debug!(step = index + 1, total, description = step.description(), "executing step");
            let execution = self.execute_step(index, step, &context).await;

            let fatal = execution.fatal;
            let suspended = execution.suspended;
            results.push(execution.result);

            if results.len() == limit {
                warn!(
                    executed = results.len(),
                    budget, "step budget threshold reached"
                );
            }

            if suspended {
                return WorkflowRun {
                    results,
                    decision: Decision::Partial,
                    reason: Some("awaiting external approval".into()),
                };
            }

            match self.judge_continuation(fatal) {
                Decision::Continue => {}
                decision => {
                    return WorkflowRun {
                        results,
                        decision,
                        reason: Some("unrecoverable step failure".into()),
                    };
                }
            }
        }

        WorkflowRun {
            results,
            decision: Decision::Complete,
            reason: None,
        }
    }

    /// Per-step continuation policy: a failed step alone never ends the
    /// run; only failures that make the backend unreachable do.
    fn judge_continuation(&self, fatal: bool) -> Decision {
        if fatal {
            Decision::Aborted
        } else {
            Decision::Continue
        }
    }

    // ── Step execution ───────────────────────────────────────────────

    async fn execute_step(
        &self,
        index: usize,
        step: StepSpec,
        context: &DeviceContext,
    ) -> StepExecution {
        match step {
            StepSpec::Approval { description } => self.approval_step(index, &description).await,
            StepSpec::Operation {
                description,
                operation,
                object_type,
                identity,
                payload,
            } => {
                self.operation_step(
                    index,
                    &description,
                    operation,
                    &object_type,
                    identity,
                    payload,
                    context,
                )
                .await
            }
        }
    }

    async fn approval_step(&self, index: usize, description: &str) -> StepExecution {
        match self.gate.approve(description, &ConfigDiff::default()).await {
            ApprovalDecision::Approved => success(index, "approved", None),
            ApprovalDecision::Rejected => failed(index, "rejected by approver", false),
            ApprovalDecision::Deferred => awaiting(index),
        }
    }

    #[allow(clippy::too_many_lines, clippy::too_many_arguments)]
    async fn operation_step(
        &self,
        index: usize,
        description: &str,
        operation: CrudOp,
        object_type: &str,
        identity: Option<String>,
        raw_payload: Option<serde_json::Value>,
        context: &DeviceContext,
    ) -> StepExecution {
        let parsed_type = match ObjectType::parse(object_type) {
            Ok(t) => t,
            // Fatal to this step only, never to the run.
            Err(e) => return failed(index, &e.to_string(), false),
        };

        let parsed_payload: Option<Payload> = match raw_payload {
            None => None,
            Some(ref value) => match payload::from_json(value) {
                Ok(p) => Some(p),
                Err(e) => return failed(index, &e.to_string(), false),
            },
        };

        let request = CrudRequest {
            operation,
            object_type: parsed_type,
            identity: identity.clone(),
            payload: parsed_payload.clone(),
            context: context.clone(),
        };

        match self.engine.perform(request).await {
            Ok(CrudOutcome::Skipped {
                reason: SkipReason::ExistsWithChanges,
                diff: Some(diff),
                path,
                existing,
            }) => {
                info!(step = index + 1, %path, "existing object differs, consulting approval gate");
                self.gated_update(
                    index,
                    description,
                    parsed_type,
                    identity,
                    parsed_payload,
                    context,
                    &diff,
                    existing,
                )
                .await
            }
            Ok(CrudOutcome::Skipped {
                reason: SkipReason::Unchanged,
                ..
            }) => skipped(index, "skipped: desired state already present"),
            Ok(outcome) => {
                let payload = serde_json::to_value(&outcome).ok();
                success(index, &outcome_message(&outcome), payload)
            }
            Err(e) => failed(index, &e.to_string(), e.is_fatal_for_run()),
        }
    }

    /// A create collided with a changed existing object: surface the
    /// diff, suspend on the gate, and only mutate on approval.
    #[allow(clippy::too_many_arguments)]
    async fn gated_update(
        &self,
        index: usize,
        description: &str,
        object_type: ObjectType,
        identity: Option<String>,
        desired: Option<Payload>,
        context: &DeviceContext,
        diff: &ConfigDiff,
        existing: Option<Payload>,
    ) -> StepExecution {
        match self.gate.approve(description, diff).await {
            ApprovalDecision::Rejected => {
                // Nothing was mutated; record the rejection.
                failed(index, "rejected: existing object left untouched", false)
            }
            ApprovalDecision::Deferred => awaiting(index),
            ApprovalDecision::Approved => {
                let (Some(identity), Some(desired)) = (identity, desired) else {
                    return failed(index, "approval granted but request is incomplete", false);
                };
                let update =
                    CrudRequest::update(object_type, identity, desired, context.clone());
                let mut execution = match self.engine.perform(update).await {
                    Ok(outcome) => {
                        let payload = serde_json::to_value(&outcome).ok();
                        success(index, "updated after approval", payload)
                    }
                    Err(e) => failed(index, &e.to_string(), e.is_fatal_for_run()),
                };
                // Carry the pre-update payload for reporting.
                if execution.result.payload.is_none() {
                    execution.result.payload = existing.map(|p| payload::to_json(&p));
                }
                execution
            }
        }
    }
}

// ── Result constructors ─────────────────────────────────────────────

fn success(index: usize, message: &str, payload: Option<serde_json::Value>) -> StepExecution {
    StepExecution {
        result: StepResult {
            index,
            status: StepStatus::Success,
            message: message.to_owned(),
            payload,
        },
        fatal: false,
        suspended: false,
    }
}

fn failed(index: usize, message: &str, fatal: bool) -> StepExecution {
    StepExecution {
        result: StepResult {
            index,
            status: StepStatus::Failed,
            message: message.to_owned(),
            payload: None,
        },
        fatal,
        suspended: false,
    }
}

fn skipped(index: usize, message: &str) -> StepExecution {
    StepExecution {
        result: StepResult {
            index,
            status: StepStatus::Skipped,
            message: message.to_owned(),
            payload: None,
        },
        fatal: false,
        suspended: false,
    }
}

fn awaiting(index: usize) -> StepExecution {
    StepExecution {
        result: StepResult {
            index,
            status: StepStatus::AwaitingApproval,
            message: "awaiting external approval".to_owned(),
            payload: None,
        },
        fatal: false,
        suspended: true,
    }
}

fn outcome_message(outcome: &CrudOutcome) -> String {
    match outcome {
        CrudOutcome::Created { path } => format!("created {path}"),
        CrudOutcome::Updated { path, diff } => {
            format!("updated {path} ({} fields)", diff.changes.len())
        }
        CrudOutcome::Deleted { path } => format!("deleted {path}"),
        CrudOutcome::Read { path, .. } => format!("read {path}"),
        CrudOutcome::Listed { path, items } => format!("listed {} entries at {path}", items.len()),
        CrudOutcome::Skipped { path, .. } => format!("skipped {path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_limit_is_sixty_percent_rounded_down() {
        assert_eq!(soft_limit(10), 6);
        assert_eq!(soft_limit(5), 3);
        assert_eq!(soft_limit(3), 1);
        // Tiny budgets still allow one step; a zero budget allows none.
        assert_eq!(soft_limit(1), 1);
        assert_eq!(soft_limit(0), 0);
    }
}
