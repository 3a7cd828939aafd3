//! Sequencer behavior: strict ordering, approval gating, budget
//! degradation, and abort on lost connectivity.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use common::FakeBackend;
use palisade_api::RetryPolicy;
use palisade_core::{
    ApprovalDecision, ApprovalGate, AutoApprove, AutoReject, ConfigDiff, ConfigEngine, CrudOp,
    Decision, DeviceContext, ObjectType, StepSequencer, StepSpec, StepStatus, resolve,
};

fn engine(backend: &Arc<FakeBackend>) -> Arc<ConfigEngine> {
    Arc::new(ConfigEngine::new(backend.clone()).with_retry(RetryPolicy::none()))
}

fn create_step(identity: &str, network: &str) -> StepSpec {
    StepSpec::Operation {
        description: format!("ensure address {identity}"),
        operation: CrudOp::Create,
        object_type: "address".into(),
        identity: Some(identity.into()),
        payload: Some(serde_json::json!({ "network": network })),
    }
}

fn read_step(identity: &str) -> StepSpec {
    StepSpec::Operation {
        description: format!("read address {identity}"),
        operation: CrudOp::Read,
        object_type: "address".into(),
        identity: Some(identity.into()),
        payload: None,
    }
}

/// Gate that records every diff it is shown before answering.
struct RecordingGate {
    decision: ApprovalDecision,
    seen: Mutex<Vec<ConfigDiff>>,
}

impl RecordingGate {
    fn new(decision: ApprovalDecision) -> Self {
        Self {
            decision,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ApprovalGate for RecordingGate {
    async fn approve(&self, _description: &str, diff: &ConfigDiff) -> ApprovalDecision {
        self.seen.lock().unwrap().push(diff.clone());
        self.decision
    }
}

#[tokio::test]
async fn fresh_create_then_identical_then_changed_create() {
    let backend = Arc::new(FakeBackend::new());
    let gate = Arc::new(RecordingGate::new(ApprovalDecision::Approved));
    let sequencer = StepSequencer::new(engine(&backend), gate.clone());

    let run = sequencer
        .run(
            vec![
                create_step("web-1", "10.0.0.0/24"),
                create_step("web-1", "10.0.0.0/24"),
                create_step("web-1", "10.0.0.0/25"),
            ],
            100,
            DeviceContext::default(),
        )
        .await;

    assert_eq!(run.decision, Decision::Complete);
    assert_eq!(run.results.len(), 3);
    assert_eq!(run.results[0].status, StepStatus::Success);
    assert_eq!(run.results[1].status, StepStatus::Skipped);
    assert_eq!(run.results[2].status, StepStatus::Success);
    assert_eq!(run.results[2].message, "updated after approval");

    // The gate saw exactly the one changed field.
    let seen = gate.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].changes.len(), 1);
    assert_eq!(seen[0].changes[0].field, "network");
    drop(seen);

    // One create and one approved update, nothing for the no-op.
    assert_eq!(backend.sets.load(Ordering::SeqCst), 1);
    assert_eq!(backend.edits.load(Ordering::SeqCst), 1);

    let path = resolve(ObjectType::Address, "web-1", &DeviceContext::default());
    let stored = backend.stored(&path.xpath).unwrap();
    assert_eq!(stored["network"], "10.0.0.0/25");
}

#[tokio::test]
async fn rejected_change_leaves_object_untouched_and_run_continues() {
    let backend = Arc::new(FakeBackend::new());
    let ctx = DeviceContext::default();
    let path = resolve(ObjectType::Address, "web-1", &ctx);
    backend.seed(&path.xpath, serde_json::json!({ "network": "10.0.0.0/24" }));

    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoReject));
    let run = sequencer
        .run(
            vec![create_step("web-1", "10.0.0.0/25"), read_step("web-1")],
            100,
            ctx,
        )
        .await;

    assert_eq!(run.decision, Decision::Complete);
    assert_eq!(run.results[0].status, StepStatus::Failed);
    assert_eq!(run.results[1].status, StepStatus::Success);
    assert_eq!(backend.mutations(), 0);
    assert_eq!(
        backend.stored(&path.xpath).unwrap()["network"],
        "10.0.0.0/24"
    );
}

#[tokio::test]
async fn budget_of_ten_executes_six_steps_then_stops() {
    let backend = Arc::new(FakeBackend::new());
    let ctx = DeviceContext::default();
    let path = resolve(ObjectType::Address, "web-1", &ctx);
    backend.seed(&path.xpath, serde_json::json!({ "network": "10.0.0.0/24" }));

    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let steps: Vec<StepSpec> = (0..9).map(|_| read_step("web-1")).collect();
    let run = sequencer.run(steps, 10, ctx).await;

    assert_eq!(run.decision, Decision::Partial);
    assert_eq!(run.results.len(), 6);
    for (i, result) in run.results.iter().enumerate() {
        assert_eq!(result.index, i);
        assert_eq!(result.status, StepStatus::Success);
    }
    assert!(run.reason.unwrap().contains("budget"));
}

#[tokio::test]
async fn zero_budget_executes_no_steps() {
    let backend = Arc::new(FakeBackend::new());

    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let run = sequencer
        .run(vec![read_step("web-1")], 0, DeviceContext::default())
        .await;

    assert_eq!(run.decision, Decision::Partial);
    assert!(run.results.is_empty());
    assert_eq!(backend.mutations(), 0);
}

#[tokio::test]
async fn run_within_budget_completes() {
    let backend = Arc::new(FakeBackend::new());
    let ctx = DeviceContext::default();
    let path = resolve(ObjectType::Address, "web-1", &ctx);
    backend.seed(&path.xpath, serde_json::json!({ "network": "10.0.0.0/24" }));

    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let steps: Vec<StepSpec> = (0..5).map(|_| read_step("web-1")).collect();
    let run = sequencer.run(steps, 10, ctx).await;

    assert_eq!(run.decision, Decision::Complete);
    assert_eq!(run.results.len(), 5);
}

#[tokio::test]
async fn lost_connectivity_aborts_the_run() {
    let backend = Arc::new(FakeBackend::new());
    backend.go_down();

    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let run = sequencer
        .run(
            vec![
                read_step("web-1"),
                read_step("web-2"),
                read_step("web-3"),
            ],
            100,
            DeviceContext::default(),
        )
        .await;

    assert_eq!(run.decision, Decision::Aborted);
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].status, StepStatus::Failed);
}

#[tokio::test]
async fn per_step_failure_does_not_end_the_run() {
    let backend = Arc::new(FakeBackend::new());
    let ctx = DeviceContext::default();
    let path = resolve(ObjectType::Address, "web-1", &ctx);
    backend.seed(&path.xpath, serde_json::json!({ "network": "10.0.0.0/24" }));

    let steps = vec![
        StepSpec::Operation {
            description: "bad type".into(),
            operation: CrudOp::Read,
            object_type: "widget".into(),
            identity: Some("x".into()),
            payload: None,
        },
        read_step("ghost"),
        read_step("web-1"),
    ];
    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let run = sequencer.run(steps, 100, ctx).await;

    assert_eq!(run.decision, Decision::Complete);
    assert_eq!(run.results[0].status, StepStatus::Failed);
    assert_eq!(run.results[1].status, StepStatus::Failed);
    assert_eq!(run.results[2].status, StepStatus::Success);
}

#[tokio::test]
async fn deferred_approval_suspends_the_run() {
    let backend = Arc::new(FakeBackend::new());
    let ctx = DeviceContext::default();
    let path = resolve(ObjectType::Address, "web-1", &ctx);
    backend.seed(&path.xpath, serde_json::json!({ "network": "10.0.0.0/24" }));

    let gate = Arc::new(RecordingGate::new(ApprovalDecision::Deferred));
    let sequencer = StepSequencer::new(engine(&backend), gate);
    let run = sequencer
        .run(
            vec![create_step("web-1", "10.0.0.0/25"), read_step("web-1")],
            100,
            ctx,
        )
        .await;

    assert_eq!(run.decision, Decision::Partial);
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].status, StepStatus::AwaitingApproval);
    assert_eq!(backend.mutations(), 0);
}

#[tokio::test]
async fn explicit_approval_step_gates_the_rest() {
    let backend = Arc::new(FakeBackend::new());
    let sequencer = StepSequencer::new(engine(&backend), Arc::new(AutoApprove));
    let run = sequencer
        .run(
            vec![
                StepSpec::Approval {
                    description: "proceed with rollout".into(),
                },
                create_step("web-1", "10.0.0.0/24"),
            ],
            100,
            DeviceContext::default(),
        )
        .await;

    assert_eq!(run.decision, Decision::Complete);
    assert_eq!(run.results[0].status, StepStatus::Success);
    assert_eq!(run.results[1].status, StepStatus::Success);
    assert_eq!(backend.sets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_stops_before_the_next_step() {
    let backend = Arc::new(FakeBackend::new());
    let token = CancellationToken::new();
    token.cancel();

    let sequencer =
        StepSequencer::new(engine(&backend), Arc::new(AutoApprove)).with_cancellation(token);
    let run = sequencer
        .run(
            vec![create_step("web-1", "10.0.0.0/24")],
            100,
            DeviceContext::default(),
        )
        .await;

    assert_eq!(run.decision, Decision::Aborted);
    assert!(run.results.is_empty());
    assert_eq!(backend.mutations(), 0);
}

#[tokio::test]
async fn step_specs_round_trip_through_serde() {
    let step = create_step("web-1", "10.0.0.0/24");
    let json = serde_json::to_value(&step).unwrap();
    assert_eq!(json["kind"], "operation");
    assert_eq!(json["operation"], "create");
    let back: StepSpec = serde_json::from_value(json).unwrap();
    assert_eq!(back.description(), "ensure address web-1");
}
