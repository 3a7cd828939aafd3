//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};
use tabled::Tabled;

use palisade_config::{Config, Profile};
use palisade_core::ContextSpec;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init_wizard(),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            output::print_output(
                &palisade_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }
        ConfigCommand::Profiles => profiles(global),
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init_wizard() -> Result<(), CliError> {
    let config_path = palisade_config::config_path();
    eprintln!("palisade configuration wizard");
    eprintln!("  Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let gateway: String = Input::new()
        .with_prompt("Gateway URL")
        .default("https://10.0.0.1".into())
        .interact_text()
        .map_err(prompt_err)?;

    // Scope selection mirrors the context priority rules.
    let scope_choices = &[
        "Firewall vsys",
        "Device group (manager)",
        "Template (manager)",
        "Template stack (manager)",
        "Shared (manager)",
    ];
    let scope_selection = Select::new()
        .with_prompt("Target scope")
        .items(scope_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut context = ContextSpec::default();
    match scope_selection {
        0 => {
            let vsys: String = Input::new()
                .with_prompt("Vsys name")
                .default("vsys1".into())
                .interact_text()
                .map_err(prompt_err)?;
            context.vsys = Some(vsys);
        }
        1 => context.device_group = Some(named_scope("Device group name")?),
        2 => context.template = Some(named_scope("Template name")?),
        3 => context.template_stack = Some(named_scope("Template stack name")?),
        _ => context.shared = true,
    }

    let key = Password::new()
        .with_prompt("API key")
        .interact()
        .map_err(prompt_err)?;
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }

    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let api_key_field = if store_selection == 0 {
        store_in_keyring(&profile_name, &key)?;
        None
    } else {
        Some(key)
    };

    let mut cfg = palisade_config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            gateway,
            api_key: api_key_field,
            api_key_env: None,
            context,
            ..Profile::default()
        },
    );
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    palisade_config::save_config(&cfg)?;

    eprintln!("\nProfile '{profile_name}' saved to {}", config_path.display());
    Ok(())
}

fn named_scope(prompt: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_err)
}

fn store_in_keyring(profile_name: &str, key: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new("palisade", &format!("{profile_name}/api-key")).map_err(
        |e| CliError::Validation {
            field: "keyring".into(),
            reason: format!("keyring unavailable: {e}"),
        },
    )?;
    entry.set_password(key).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store key: {e}"),
    })
}

// ── Show / Profiles ─────────────────────────────────────────────────

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg: Config = palisade_config::load_config()?;
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("<redacted>".into());
        }
    }
    let rendered = toml::to_string_pretty(&cfg).map_err(palisade_config::ConfigError::from)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Default")]
    default: String,
}

fn profiles(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = palisade_config::load_config_or_default();
    let default = cfg.default_profile.clone().unwrap_or_default();

    let mut rows: Vec<ProfileRow> = cfg
        .profiles
        .iter()
        .map(|(name, profile)| ProfileRow {
            name: name.clone(),
            gateway: profile.gateway.clone(),
            scope: profile.context.clone().into_context().scope_label(),
            default: if *name == default { "*" } else { "" }.into(),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    output::print_output(&output::render_table(&rows), global.quiet);
    Ok(())
}
