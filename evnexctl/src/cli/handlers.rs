//! Command execution handlers

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use evnex_core::parse_segments;

use crate::client::EvnexClient;
use crate::config::CliConfig;
use crate::format::{self, format_success};

use super::commands::*;

/// Resolve the default organisation when none was configured
async fn ensure_org(client: &EvnexClient, org: Option<&str>) -> Result<()> {
    if org.is_none() && client.default_org_id().is_none() {
        client
            .get_user_detail()
            .await
            .context("Failed to look up the default organisation")?;
    }
    Ok(())
}

/// Handle token command
pub async fn handle_token(client: &EvnexClient, format: &OutputFormat) -> Result<()> {
    let tokens = client
        .tokens()
        .await
        .context("No tokens available after authentication")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        OutputFormat::Table => {
            println!("{}", format_success("Authenticated"));
            if let Some(expires_at) = tokens.expires_at {
                println!("Expires: {}", expires_at.to_rfc3339());
            }
            println!("{}", tokens.access_token);
        }
    }

    Ok(())
}

/// Handle user command
pub async fn handle_user(client: &EvnexClient, format: &OutputFormat) -> Result<()> {
    let user = client.get_user_detail().await?;
    println!("{}", format::format_user(&user, &format.into())?);
    Ok(())
}

/// Handle charge-points command
pub async fn handle_charge_points(
    client: &EvnexClient,
    org: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    ensure_org(client, org).await?;
    let charge_points = client.get_org_charge_points(org).await?;
    println!(
        "{}",
        format::format_charge_points(&charge_points, &format.into())?
    );
    Ok(())
}

/// Handle insight command
pub async fn handle_insight(
    client: &EvnexClient,
    org: Option<&str>,
    days: u32,
    tz_offset: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    ensure_org(client, org).await?;
    let entries = client.get_org_insight(days, tz_offset, org).await?;
    println!("{}", format::format_insight(&entries, &format.into())?);
    Ok(())
}

/// Handle status-summary command
pub async fn handle_status_summary(
    client: &EvnexClient,
    org: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    ensure_org(client, org).await?;
    let summary = client.get_org_summary_status(org).await?;
    println!(
        "{}",
        format::format_status_summary(&summary, &format.into())?
    );
    Ok(())
}

/// Handle detail command
pub async fn handle_detail(
    client: &EvnexClient,
    charge_point: &str,
    v3: bool,
    format: &OutputFormat,
) -> Result<()> {
    let output = if v3 {
        let detail = client.get_charge_point_detail_v3(charge_point).await?;
        format::format_detail_v3(&detail, &format.into())?
    } else {
        let detail = client.get_charge_point_detail(charge_point).await?;
        format::format_detail(&detail, &format.into())?
    };
    println!("{}", output);
    Ok(())
}

pub async fn handle_sessions(
    client: &EvnexClient,
    charge_point: &str,
    format: &OutputFormat,
) -> Result<()> {
    let sessions = client.get_charge_point_sessions(charge_point).await?;
    println!("{}", format::format_sessions(&sessions, &format.into())?);
    Ok(())
}

pub async fn handle_transactions(
    client: &EvnexClient,
    charge_point: &str,
    format: &OutputFormat,
) -> Result<()> {
    let transactions = client.get_charge_point_transactions(charge_point).await?;
    println!(
        "{}",
        format::format_transactions(&transactions, &format.into())?
    );
    Ok(())
}

pub async fn handle_solar(
    client: &EvnexClient,
    charge_point: &str,
    format: &OutputFormat,
) -> Result<()> {
    let solar = client.get_charge_point_solar_config(charge_point).await?;
    println!("{}", format::format_solar(&solar, &format.into())?);
    Ok(())
}

/// Handle override subcommands
pub async fn handle_override(
    client: &EvnexClient,
    command: OverrideCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        OverrideCommands::Get { charge_point } => {
            let config = client.get_charge_point_override(&charge_point).await?;
            println!("{}", format::format_override(&config, &format.into())?);
        }
        OverrideCommands::Set {
            charge_point,
            charge_now,
            connector,
        } => {
            client
                .set_charge_point_override(&charge_point, charge_now, connector)
                .await?;
            let state = if charge_now { "on" } else { "off" };
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({ "success": true, "chargeNow": charge_now })
                    );
                }
                OutputFormat::Table => {
                    println!(
                        "{}",
                        format_success(&format!("Charge now {} for {}", state, charge_point))
                    );
                }
            }
        }
    }

    Ok(())
}

/// Handle availability subcommands
pub async fn handle_availability(
    client: &EvnexClient,
    command: AvailabilityCommands,
    format: &OutputFormat,
) -> Result<()> {
    let response = match command {
        AvailabilityCommands::Enable {
            charge_point,
            connector,
        } => client.enable_charger(&charge_point, connector).await?,
        AvailabilityCommands::Disable {
            charge_point,
            connector,
        } => client.disable_charger(&charge_point, connector).await?,
    };
    println!("{}", format::format_command(&response, &format.into())?);
    Ok(())
}

/// Handle stop command
pub async fn handle_stop(
    client: &EvnexClient,
    org: Option<&str>,
    charge_point: &str,
    connector: &str,
    timeout: u64,
    format: &OutputFormat,
) -> Result<()> {
    ensure_org(client, org).await?;
    let response = client
        .stop_charge_point(charge_point, org, connector, Duration::from_secs(timeout))
        .await
        .with_context(|| format!("Failed to stop charging on {}", charge_point))?;
    println!("{}", format::format_command(&response, &format.into())?);
    Ok(())
}

/// Handle schedule command
pub async fn handle_schedule(
    client: &EvnexClient,
    charge_point: &str,
    periods: &str,
    enabled: bool,
    format: &OutputFormat,
) -> Result<()> {
    let segments = parse_segments(periods)?;
    let schedule = client
        .set_charge_point_schedule(charge_point, &segments, enabled)
        .await?;
    println!(
        "{}",
        format::format_schedule(
            "Charge schedule",
            schedule.enabled,
            &schedule.segments()?,
            &format.into()
        )?
    );
    Ok(())
}

/// Handle load-management command
pub async fn handle_load_management(
    client: &EvnexClient,
    charge_point: &str,
    periods: &str,
    enabled: bool,
    duration: i64,
    format: &OutputFormat,
) -> Result<()> {
    let segments = parse_segments(periods)?;
    let schedule = client
        .set_charger_load_profile(charge_point, &segments, enabled, duration)
        .await?;
    println!(
        "{}",
        format::format_schedule(
            "Load management",
            schedule.enabled,
            &schedule.segments()?,
            &format.into()
        )?
    );
    Ok(())
}

/// Handle config subcommands
pub async fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(current_config)?);
            }
            OutputFormat::Table => {
                let unset = || "(unset)".dimmed().to_string();
                println!("CLI Configuration ({}):", path.display());
                println!("{:<20} Value", "Setting");
                println!("{}", "-".repeat(40));
                println!("{:<20} {}", "Base URL", current_config.base_url);
                println!("{:<20} {}", "User Pool", current_config.user_pool_id);
                println!("{:<20} {}", "Client ID", current_config.client_id);
                println!(
                    "{:<20} {}",
                    "Username",
                    current_config.username.clone().unwrap_or_else(unset)
                );
                println!(
                    "{:<20} {}",
                    "Organisation",
                    current_config.org_id.clone().unwrap_or_else(unset)
                );
                println!("{:<20} {}", "Output Format", current_config.output_format);
                println!("{:<20} {}", "Verbose", current_config.verbose);
                println!("{:<20} {}s", "Timeout", current_config.timeout);
                println!(
                    "{:<20} {}",
                    "Max Retries",
                    current_config
                        .max_retries
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "unlimited".to_string())
                );
            }
        },
        ConfigCommands::Set { key, value } => {
            let mut config = CliConfig::load_from(path)?;
            match key.as_str() {
                "base_url" => config.base_url = value.clone(),
                "user_pool_id" => config.user_pool_id = value.clone(),
                "client_id" => config.client_id = value.clone(),
                "username" => config.username = Some(value.clone()),
                "org_id" => config.org_id = Some(value.clone()),
                "output_format" => {
                    if ["table", "json"].contains(&value.as_str()) {
                        config.output_format = value.clone();
                    } else {
                        return Err(anyhow::anyhow!(
                            "Invalid output format. Must be 'table' or 'json'"
                        ));
                    }
                }
                "verbose" => {
                    config.verbose = value.to_lowercase() == "true" || value == "1";
                }
                "timeout" => {
                    config.timeout = value
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid timeout value. Must be a number"))?;
                }
                "max_retries" => {
                    config.max_retries = match value.as_str() {
                        "unlimited" | "none" => None,
                        n => Some(n.parse().map_err(|_| {
                            anyhow::anyhow!("Invalid max_retries. Must be a number or 'unlimited'")
                        })?),
                    };
                }
                _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
            }

            config
                .to_evnex_config()
                .validate()
                .context("Refusing to save invalid configuration")?;
            config.save_to(path)?;
            println!("{}", format_success(&format!("Set {} = {}", key, value)));
        }
        ConfigCommands::Reset => {
            CliConfig::default().save_to(path)?;
            println!("{}", format_success("Configuration reset to defaults"));
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_set_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        let config = CliConfig::default();

        handle_config(
            ConfigCommands::Set {
                key: "org_id".to_string(),
                value: "org-b".to_string(),
            },
            &config,
            &path,
            &OutputFormat::Table,
        )
        .await
        .unwrap();

        let saved = CliConfig::load_from(&path).unwrap();
        assert_eq!(saved.org_id.as_deref(), Some("org-b"));
        assert_eq!(saved.base_url, config.base_url);
    }

    #[tokio::test]
    async fn test_config_set_rejects_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        let result = handle_config(
            ConfigCommands::Set {
                key: "password".to_string(),
                value: "hunter2".to_string(),
            },
            &CliConfig::default(),
            &path,
            &OutputFormat::Table,
        )
        .await;
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_config_set_rejects_zero_timeout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        let result = handle_config(
            ConfigCommands::Set {
                key: "timeout".to_string(),
                value: "0".to_string(),
            },
            &CliConfig::default(),
            &path,
            &OutputFormat::Table,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(&path, "timeout = 30\n").unwrap();

        handle_config(
            ConfigCommands::Reset,
            &CliConfig::default(),
            &path,
            &OutputFormat::Json,
        )
        .await
        .unwrap();

        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());
    }
}
