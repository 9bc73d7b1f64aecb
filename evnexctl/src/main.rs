//! EVNEX CLI
//!
//! Command-line interface for EVNEX charge points.

use anyhow::{Context, Result};
use clap::Parser;
use evnexctl::auth::Credentials;
use evnexctl::cli::{
    generate_completion, handle_availability, handle_charge_points, handle_config,
    handle_detail, handle_insight, handle_load_management, handle_override, handle_schedule,
    handle_sessions, handle_solar, handle_status_summary, handle_stop, handle_token,
    handle_transactions, handle_user, Cli, Commands, OutputFormat,
};
use evnexctl::client::EvnexClient;
use evnexctl::config::{CliConfig, ConfigBuilder};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for logging to stderr
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("evnexctl=debug,evnex_core=debug,warn"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn build_config(cli: &Cli) -> Result<(CliConfig, PathBuf)> {
    // Build configuration using priority chain: defaults → file → env → CLI args
    let path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => CliConfig::config_path()?,
    };

    let mut builder = ConfigBuilder::new();
    if !cli.no_config {
        builder = builder.with_config_file_at(&path)?;
    }
    builder = builder.with_env_overrides();

    if let Some(ref url) = cli.base_url {
        builder = builder.with_base_url(url)?;
    }
    if let Some(ref username) = cli.username {
        builder = builder.with_username(username);
    }
    if let Some(ref org) = cli.org {
        builder = builder.with_org_id(org);
    }
    if let Some(ref format) = cli.format {
        let format_str = match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        };
        builder = builder.with_output_format(format_str)?;
    }
    if let Some(verbose) = cli.verbose {
        builder = builder.with_verbose(verbose);
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.with_timeout(timeout)?;
    }

    Ok((builder.build()?, path))
}

fn credentials(cli: &Cli, config: &CliConfig) -> Result<Credentials> {
    let username = config
        .username
        .clone()
        .context("No username given; use --username or EVNEX_CLIENT_USERNAME")?;
    let password = match &cli.password {
        Some(password) => password.clone(),
        None => std::env::var("EVNEX_CLIENT_PASSWORD")
            .context("No password given; use --password or EVNEX_CLIENT_PASSWORD")?,
    };
    Ok(Credentials::new(username, password))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = match build_config(&cli) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if cli.verbose.unwrap_or(false) {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    let output_format = match config.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };
    let verbose = config.verbose;
    init_tracing(verbose);
    debug!(base_url = %config.base_url, format = ?output_format, "Configuration loaded");

    // Commands that never touch the API
    match cli.command {
        Commands::Config { command } => {
            if let Err(e) = handle_config(command, &config, &config_path, &output_format).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            return Ok(());
        }
        Commands::Completion { shell } => {
            generate_completion(shell);
            return Ok(());
        }
        _ => {}
    }

    let credentials = match credentials(&cli, &config) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let client = match EvnexClient::connect(config.to_evnex_config(), credentials).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: Cannot sign in to EVNEX at {}", config.base_url);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let org = config.org_id.as_deref();
    let format = &output_format;
    let result = match cli.command {
        Commands::Token => handle_token(&client, format).await,
        Commands::User => handle_user(&client, format).await,
        Commands::ChargePoints => handle_charge_points(&client, org, format).await,
        Commands::Insight { days, tz_offset } => {
            handle_insight(&client, org, days, tz_offset.as_deref(), format).await
        }
        Commands::StatusSummary => handle_status_summary(&client, org, format).await,
        Commands::Detail { charge_point, v3 } => {
            handle_detail(&client, &charge_point, v3, format).await
        }
        Commands::Sessions { charge_point } => handle_sessions(&client, &charge_point, format).await,
        Commands::Transactions { charge_point } => {
            handle_transactions(&client, &charge_point, format).await
        }
        Commands::Solar { charge_point } => handle_solar(&client, &charge_point, format).await,
        Commands::Override { command } => handle_override(&client, command, format).await,
        Commands::Availability { command } => handle_availability(&client, command, format).await,
        Commands::Stop {
            charge_point,
            connector,
            timeout,
        } => handle_stop(&client, org, &charge_point, &connector, timeout, format).await,
        Commands::Schedule {
            charge_point,
            periods,
            disabled,
        } => handle_schedule(&client, &charge_point, &periods, !disabled, format).await,
        Commands::LoadManagement {
            charge_point,
            periods,
            enabled,
            duration,
        } => {
            handle_load_management(&client, &charge_point, &periods, enabled, duration, format)
                .await
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
