mod approval;
mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use url::Url;

use palisade_api::{HttpBackend, TlsMode};
use palisade_config::GatewaySettings;
use palisade_core::{ConfigEngine, ContextSpec, DeviceContext};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a gateway connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "palisade", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a gateway connection
        cmd => {
            let settings = build_settings(&cli.global)?;
            let context = settings.context.clone();
            let backend =
                HttpBackend::new(&settings.url, &settings.api_key, &settings.transport)
                    .map_err(palisade_core::EngineError::from)?;
            let mut engine = ConfigEngine::new(Arc::new(backend));
            if let Some(ttl) = settings.cache_ttl {
                engine = engine.with_cache_ttl(ttl);
            }
            let engine = Arc::new(engine);

            tracing::debug!(command = ?cmd, scope = %context.scope_label(), "dispatching command");
            commands::dispatch(cmd, &engine, context, &cli.global).await
        }
    }
}

/// Build gateway settings from the config file, profile, and CLI overrides.
fn build_settings(global: &GlobalOpts) -> Result<GatewaySettings, CliError> {
    let cfg = palisade_config::load_config_or_default();

    // An explicit --profile that doesn't exist is an error; with no
    // profile at all, fall through to flags / env vars alone.
    let mut settings = if let Ok((name, profile)) = cfg.profile(global.profile.as_deref()) {
        palisade_config::profile_to_settings(profile, name)?
    } else if let Some(name) = &global.profile {
        return Err(CliError::ProfileNotFound { name: name.clone() });
    } else {
        settings_from_flags(global)?
    };

    // CLI flags override whatever the profile provided.
    if let Some(ref url_str) = global.gateway {
        settings.url = parse_gateway_url(url_str)?;
    }
    if let Some(ref key) = global.api_key {
        settings.api_key = SecretString::from(key.clone());
    }
    if global.insecure {
        settings.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(context) = context_from_flags(global) {
        settings.context = context;
    }

    Ok(settings)
}

/// Build settings from CLI flags / env vars alone, without any profile.
fn settings_from_flags(global: &GlobalOpts) -> Result<GatewaySettings, CliError> {
    let url_str = global.gateway.as_deref().ok_or_else(|| CliError::NoConfig {
        path: palisade_config::config_path().display().to_string(),
    })?;
    let url = parse_gateway_url(url_str)?;

    let api_key = global
        .api_key
        .as_ref()
        .map(|k| SecretString::from(k.clone()))
        .ok_or_else(|| CliError::NoCredentials {
            profile: global.profile.clone().unwrap_or_else(|| "default".into()),
        })?;

    let transport = palisade_api::TransportConfig {
        tls: if global.insecure {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        },
        timeout: Duration::from_secs(global.timeout),
    };

    Ok(GatewaySettings {
        url,
        api_key,
        transport,
        context: context_from_flags(global).unwrap_or_default(),
        cache_ttl: None,
    })
}

fn parse_gateway_url(url_str: &str) -> Result<Url, CliError> {
    url_str.parse().map_err(|_| CliError::Validation {
        field: "gateway".into(),
        reason: format!("invalid URL: {url_str}"),
    })
}

/// Scope selection from CLI flags, or `None` if no scope flag was given.
fn context_from_flags(global: &GlobalOpts) -> Option<DeviceContext> {
    let spec = ContextSpec {
        vsys: global.vsys.clone(),
        device_group: global.device_group.clone(),
        template: global.template.clone(),
        template_stack: global.template_stack.clone(),
        shared: global.shared,
    };
    (spec != ContextSpec::default()).then(|| spec.into_context())
}
