//! Workflow command handlers: run or check a multi-step file.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use palisade_core::{
    ConfigEngine, Decision, DeviceContext, StepSequencer, StepSpec, StepStatus, WorkflowRun,
};

use crate::approval::PromptGate;
use crate::cli::{GlobalOpts, SequenceArgs, SequenceCommand};
use crate::error::CliError;
use crate::output;

// ── Workflow file ───────────────────────────────────────────────────

/// On-disk workflow document. YAML is the native format; JSON parses
/// through the same path.
#[derive(Debug, Deserialize)]
struct WorkflowFile {
    steps: Vec<StepSpec>,
}

fn load_workflow(path: &Path) -> Result<WorkflowFile, CliError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

// ── Result rendering ────────────────────────────────────────────────

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn status_name(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Success => "success",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
        StepStatus::AwaitingApproval => "awaiting-approval",
    }
}

fn decision_name(decision: Decision) -> &'static str {
    match decision {
        Decision::Continue => "continue",
        Decision::Complete => "complete",
        Decision::Partial => "partial",
        Decision::Aborted => "aborted",
    }
}

fn render_run(run: &WorkflowRun, global: &GlobalOpts) -> String {
    let color = output::should_color(&global.color);
    match global.output {
        crate::cli::OutputFormat::Table | crate::cli::OutputFormat::Plain => {
            let rows: Vec<StepRow> = run
                .results
                .iter()
                .map(|r| StepRow {
                    step: r.index + 1,
                    status: output::status_word(status_name(r.status), color),
                    message: r.message.clone(),
                })
                .collect();
            let mut out = output::render_table(&rows);
            out.push('\n');
            out.push_str(&format!(
                "run {}",
                output::status_word(decision_name(run.decision), color)
            ));
            if let Some(reason) = &run.reason {
                out.push_str(&format!(": {reason}"));
            }
            out
        }
        crate::cli::OutputFormat::Json => {
            serde_json::to_string_pretty(run).unwrap_or_default()
        }
        crate::cli::OutputFormat::JsonCompact => serde_json::to_string(run).unwrap_or_default(),
        crate::cli::OutputFormat::Yaml => output::render_yaml(run),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    engine: &Arc<ConfigEngine>,
    args: SequenceArgs,
    context: DeviceContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SequenceCommand::Run { file, budget } => {
            let workflow = load_workflow(&file)?;

            // Ctrl-C stops the run between steps, never mid-mutation.
            let cancel = CancellationToken::new();
            let signal_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal_token.cancel();
                }
            });

            let gate = Arc::new(PromptGate::new(global.yes));
            let sequencer =
                StepSequencer::new(engine.clone(), gate).with_cancellation(cancel);
            let run = sequencer.run(workflow.steps, budget, context).await;

            output::print_output(&render_run(&run, global), global.quiet);

            match run.decision {
                Decision::Complete => Ok(()),
                decision => Err(CliError::WorkflowIncomplete {
                    reason: run
                        .reason
                        .unwrap_or_else(|| decision_name(decision).to_owned()),
                }),
            }
        }

        SequenceCommand::Check { file } => {
            let workflow = load_workflow(&file)?;
            let lines: Vec<String> = workflow
                .steps
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{:>3}. {}", i + 1, step.description()))
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }
    }
}
