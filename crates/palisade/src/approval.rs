//! Interactive approval gate backed by dialoguer.
//!
//! When a push collides with an existing object that differs, the
//! sequencer (and single `set` commands) show the field diff and ask
//! before anything is mutated. `--yes` short-circuits to auto-approve;
//! a non-interactive session without `--yes` defers, leaving the
//! object untouched.

use std::io::{self, IsTerminal};

use async_trait::async_trait;
use dialoguer::Confirm;

use palisade_core::{ApprovalDecision, ApprovalGate, ConfigDiff};

/// Gate that prompts on the terminal.
pub struct PromptGate {
    auto_approve: bool,
}

impl PromptGate {
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }
}

#[async_trait]
impl ApprovalGate for PromptGate {
    async fn approve(&self, description: &str, diff: &ConfigDiff) -> ApprovalDecision {
        if self.auto_approve {
            return ApprovalDecision::Approved;
        }
        if !io::stdin().is_terminal() {
            // No human to ask; leave the step suspended.
            return ApprovalDecision::Deferred;
        }

        eprintln!("{description}");
        if !diff.changes.is_empty() {
            eprintln!("{}", diff.summary());
        }

        let confirmed = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(false)
            .interact();
        match confirmed {
            Ok(true) => ApprovalDecision::Approved,
            Ok(false) => ApprovalDecision::Rejected,
            Err(_) => ApprovalDecision::Deferred,
        }
    }
}
