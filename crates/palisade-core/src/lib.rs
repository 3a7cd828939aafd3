//! Core configuration engine for palisade.
//!
//! Resolves logical object descriptors to concrete tree addresses,
//! validates payloads against per-type schema tables, diffs desired
//! against actual state for idempotency, caches reads with a TTL, and
//! composes it all into a CRUD orchestrator plus a budgeted step
//! sequencer with approval gates.
//!
//! Everything here is synchronous and pure except the orchestrator and
//! sequencer, whose only suspension points are calls through the
//! [`palisade_api::ConfigBackend`] capability.

pub mod cache;
pub mod context;
pub mod crud;
pub mod diff;
pub mod error;
pub mod model;
pub mod payload;
pub mod resolver;
pub mod schema;
pub mod validate;
pub mod workflow;

pub use cache::{ConfigCache, DEFAULT_TTL};
pub use context::{ContextSpec, DeviceContext, Scope};
pub use crud::{ConfigEngine, CrudOp, CrudOutcome, CrudRequest, SkipReason};
pub use diff::{ConfigDiff, FieldChange, diff};
pub use error::EngineError;
pub use model::{
    AddressObject, GroupObject, ObjectRecord, SecurityRuleObject, ServiceObject, TagObject,
};
pub use payload::{Payload, Value};
pub use resolver::{ConfigPath, resolve, resolve_all};
pub use schema::ObjectType;
pub use workflow::{
    ApprovalDecision, ApprovalGate, AutoApprove, AutoReject, Decision, StepResult, StepSequencer,
    StepSpec, StepStatus, WorkflowRun,
};
