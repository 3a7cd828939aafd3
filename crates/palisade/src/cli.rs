//! Clap derive structures for the `palisade` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// palisade -- declarative CLI for firewall configuration management
#[derive(Debug, Parser)]
#[command(
    name = "palisade",
    version,
    about = "Manage firewall configuration objects declaratively",
    long_about = "A CLI for administering firewall appliances and central managers\n\
        through their configuration gateway.\n\n\
        Operations are idempotent: pushing an object that already matches the\n\
        stored configuration is a no-op, and detected drift is surfaced as a\n\
        field-level diff before anything changes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "PALISADE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway base URL (overrides profile)
    #[arg(long, short = 'g', env = "PALISADE_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Gateway API key
    #[arg(long, env = "PALISADE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Target vsys on a single firewall
    #[arg(long, env = "PALISADE_VSYS", global = true)]
    pub vsys: Option<String>,

    /// Target device group on a central manager
    #[arg(long, global = true)]
    pub device_group: Option<String>,

    /// Target template on a central manager
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Target template stack on a central manager
    #[arg(long, global = true)]
    pub template_stack: Option<String>,

    /// Target the shared scope on a central manager
    #[arg(long, global = true)]
    pub shared: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PALISADE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Auto-approve detected changes and confirmations
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PALISADE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "PALISADE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage address objects
    #[command(alias = "addr", alias = "a")]
    Address(ObjectArgs),

    /// Manage address groups
    #[command(alias = "ag")]
    AddressGroup(ObjectArgs),

    /// Manage service objects
    #[command(alias = "svc", alias = "s")]
    Service(ObjectArgs),

    /// Manage service groups
    #[command(alias = "sg")]
    ServiceGroup(ObjectArgs),

    /// Manage security rules
    #[command(alias = "r")]
    Rule(ObjectArgs),

    /// Manage tags
    Tag(ObjectArgs),

    /// Run a multi-step workflow from a file
    #[command(alias = "seq")]
    Sequence(SequenceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Object Commands ──────────────────────────────────────────────────

/// Shared subcommand set for all object types.
#[derive(Debug, Args)]
pub struct ObjectArgs {
    #[command(subcommand)]
    pub command: ObjectCommand,
}

#[derive(Debug, Subcommand)]
pub enum ObjectCommand {
    /// List all objects of this type in the active scope
    #[command(alias = "ls")]
    List,

    /// Show one object
    Get {
        /// Object name
        name: String,
    },

    /// Create or idempotently re-create an object
    Set {
        /// Object name
        name: String,

        /// Field assignments (`-f network=10.0.0.0/24`); repeatable.
        /// Comma-separated values become lists (`-f tags=prod,dmz`).
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Update an existing object (fails if it does not exist)
    Update {
        /// Object name
        name: String,

        /// Field assignments; same syntax as `set`
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Delete an object
    #[command(alias = "rm")]
    Delete {
        /// Object name
        name: String,
    },
}

// ── Sequence Commands ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SequenceArgs {
    #[command(subcommand)]
    pub command: SequenceCommand,
}

#[derive(Debug, Subcommand)]
pub enum SequenceCommand {
    /// Execute the steps in a workflow file (YAML or JSON)
    Run {
        /// Path to the workflow file
        file: PathBuf,

        /// Step budget for the run; execution stops gracefully once
        /// 60% is consumed so reporting always completes
        #[arg(long, default_value = "100")]
        budget: usize,
    },

    /// Parse and display a workflow file without executing it
    Check {
        /// Path to the workflow file
        file: PathBuf,
    },
}

// ── Config Commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the active configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
