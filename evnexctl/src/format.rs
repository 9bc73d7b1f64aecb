//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use anyhow::Result;
use colored::*;
use evnex_core::schema::v3::ChargePointDetailV3;
use evnex_core::{
    parse_model, ChargePoint, ChargePointDetail, ChargePointSession, CommandResponse,
    DeviceStatus, NetworkStatus, OrgInsightEntry, OrgStatusSummary, OverrideConfig,
    ScheduleSegment, SolarConfig, Transaction, UserDetail,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn network_status(status: NetworkStatus) -> String {
    match status {
        NetworkStatus::Online => status.to_string().green().to_string(),
        NetworkStatus::Offline => status.to_string().red().to_string(),
        NetworkStatus::Unknown => status.to_string().yellow().to_string(),
    }
}

/// OCPP code with its description, colored by whether energy is flowing
fn device_status(code: &str) -> String {
    match code.parse::<DeviceStatus>() {
        Ok(status) if status.is_active_session() => {
            format!("{} ({})", status, status.description()).green().to_string()
        }
        Ok(DeviceStatus::Faulted) => DeviceStatus::Faulted.to_string().red().to_string(),
        Ok(status) => format!("{} ({})", status, status.description()),
        Err(_) => code.dimmed().to_string(),
    }
}

fn kwh(wh: f64) -> String {
    format!("{:.2} kWh", wh / 1000.0)
}

/// Format user profile
pub fn format_user(user: &UserDetail, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(user),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct OrgRow {
                #[tabled(rename = "Org ID")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Slug")]
                slug: String,
                #[tabled(rename = "Default")]
                default: String,
            }

            let rows: Vec<OrgRow> = user
                .organisations
                .iter()
                .enumerate()
                .map(|(i, org)| OrgRow {
                    id: org.id.cyan().to_string(),
                    name: org.name.clone(),
                    slug: org.slug.clone(),
                    // The client scopes to the first listed organisation
                    default: if i == 0 { "✓".green().to_string() } else { String::new() },
                })
                .collect();

            let mut output = String::new();
            output.push_str(&"EVNEX User".bold().to_string());
            output.push('\n');
            output.push_str(&format!("Name: {}", user.name.cyan()));
            output.push('\n');
            output.push_str(&format!("Email: {}", user.email.cyan()));
            output.push('\n');
            output.push_str(&format!("ID: {}", user.id));
            output.push('\n');
            output.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            Ok(output)
        }
    }
}

/// Format org charge point list
pub fn format_charge_points(charge_points: &[ChargePoint], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(charge_points),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct ChargePointRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Serial")]
                serial: String,
                #[tabled(rename = "Model")]
                model: String,
                #[tabled(rename = "Network")]
                network: String,
                #[tabled(rename = "Connectors")]
                connectors: String,
            }

            let rows: Vec<ChargePointRow> = charge_points
                .iter()
                .map(|cp| ChargePointRow {
                    id: cp.id.cyan().to_string(),
                    name: cp.name.clone(),
                    serial: cp.serial.clone(),
                    model: parse_model(&cp.details.model).name,
                    network: network_status(cp.network_status),
                    connectors: cp
                        .connectors
                        .iter()
                        .map(|c| format!("{}: {}", c.connector_id, device_status(&c.ocpp_code)))
                        .collect::<Vec<_>>()
                        .join("\n"),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Charge Points:".bold(), table))
        }
    }
}

/// Format v2 charge point detail
pub fn format_detail(detail: &ChargePointDetail, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(detail),
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&format!("{} {}", "Charge Point".bold(), detail.name.cyan()));
            output.push('\n');
            output.push_str(&format!("ID: {}", detail.id));
            output.push('\n');
            output.push_str(&format!("Serial: {}", detail.serial));
            output.push('\n');
            output.push_str(&format!("Network: {}", network_status(detail.network_status)));
            output.push('\n');
            output.push_str(&format!("Location: {}", detail.location.name));
            output.push('\n');
            output.push_str(&format!(
                "Max current: {} A",
                detail.configuration.max_current.to_string().yellow()
            ));
            output.push('\n');
            output.push_str(&format!(
                "Load management: {}",
                if detail.load_schedule.enabled {
                    "enabled".green()
                } else {
                    "disabled".dimmed()
                }
            ));

            for connector in &detail.connectors {
                output.push('\n');
                output.push_str(&format!(
                    "Connector {}: {} | {:.0} W | {}",
                    connector.connector_id,
                    device_status(&connector.ocpp_code),
                    connector.meter.power,
                    kwh(connector.meter.register)
                ));
            }
            Ok(output)
        }
    }
}

/// Format v3 charge point detail
pub fn format_detail_v3(detail: &ChargePointDetailV3, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(detail),
        OutputFormat::Table => {
            let model = parse_model(&detail.model);
            let mut output = String::new();
            output.push_str(&format!("{} {}", "Charge Point".bold(), detail.name.cyan()));
            output.push('\n');
            output.push_str(&format!("Serial: {}", detail.serial));
            output.push('\n');
            output.push_str(&format!(
                "Model: {} ({}, {}, {})",
                model.name, model.connector, model.configuration, model.colour
            ));
            output.push('\n');
            output.push_str(&format!("Firmware: {}", detail.firmware));
            output.push('\n');
            output.push_str(&format!("Time zone: {}", detail.time_zone));
            output.push('\n');
            output.push_str(&format!("Network: {}", network_status(detail.network_status)));
            output.push('\n');
            output.push_str(&format!(
                "Tariff: {} {}/kWh ({})",
                detail.electricity_cost.currency,
                detail.electricity_cost.cost,
                detail.electricity_cost.tariff_type
            ));

            for connector in &detail.connectors {
                output.push('\n');
                output.push_str(&format!(
                    "Connector {}: {} | {:.0} W | {}",
                    connector.connector_id,
                    device_status(&connector.ocpp_code),
                    connector.meter.power,
                    kwh(connector.meter.register)
                ));
            }

            if let Some(schedule) = &detail.profiles.charge_schedule {
                output.push('\n');
                output.push_str(&format_segments(
                    "Charge schedule",
                    schedule.enabled,
                    &schedule.segments()?,
                ));
            }
            Ok(output)
        }
    }
}

/// Format org insight entries
pub fn format_insight(entries: &[OrgInsightEntry], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(entries),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct InsightRow {
                #[tabled(rename = "Day")]
                day: String,
                #[tabled(rename = "Sessions")]
                sessions: i64,
                #[tabled(rename = "Energy")]
                energy: String,
                #[tabled(rename = "Duration")]
                duration: String,
                #[tabled(rename = "Cost")]
                cost: String,
                #[tabled(rename = "Carbon Offset")]
                carbon: String,
            }

            let rows: Vec<InsightRow> = entries
                .iter()
                .map(|entry| InsightRow {
                    day: entry.start_date.format("%Y-%m-%d").to_string(),
                    sessions: entry.sessions,
                    energy: kwh(entry.power_usage).cyan().to_string(),
                    duration: format!("{:.1} h", entry.duration as f64 / 3600.0),
                    cost: entry
                        .costs
                        .iter()
                        .map(|c| format!("{:.2} {}", c.cost, c.currency))
                        .collect::<Vec<_>>()
                        .join(", "),
                    carbon: format!("{:.2} kg", entry.carbon_offset),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Insight:".bold(), table))
        }
    }
}

/// Format org status summary
pub fn format_status_summary(summary: &OrgStatusSummary, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(summary),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct StatusRow {
                #[tabled(rename = "Status")]
                status: String,
                #[tabled(rename = "Count")]
                count: u32,
            }

            let rows = vec![
                StatusRow { status: "Available".green().to_string(), count: summary.available },
                StatusRow { status: "Charging".cyan().to_string(), count: summary.charging },
                StatusRow { status: "Occupied".to_string(), count: summary.occupied },
                StatusRow { status: "Reserved".to_string(), count: summary.reserved },
                StatusRow { status: "Disabled".dimmed().to_string(), count: summary.disabled },
                StatusRow { status: "Faulted".red().to_string(), count: summary.faulted },
                StatusRow { status: "Offline".red().to_string(), count: summary.offline },
            ];

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!(
                "{} ({} total)\n{}",
                "Charge Point Status:".bold(),
                summary.total(),
                table
            ))
        }
    }
}

/// Format v3 sessions
pub fn format_sessions(sessions: &[ChargePointSession], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(sessions),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct SessionRow {
                #[tabled(rename = "Connector")]
                connector: String,
                #[tabled(rename = "Started")]
                started: String,
                #[tabled(rename = "Ended")]
                ended: String,
                #[tabled(rename = "Energy")]
                energy: String,
                #[tabled(rename = "Cost")]
                cost: String,
            }

            let rows: Vec<SessionRow> = sessions
                .iter()
                .map(|s| SessionRow {
                    connector: s.connector_id.clone(),
                    started: s.start_date.format("%Y-%m-%d %H:%M").to_string(),
                    ended: match s.end_date {
                        Some(end) => end.format("%Y-%m-%d %H:%M").to_string(),
                        None => "active".green().to_string(),
                    },
                    energy: kwh(s.total_power_usage),
                    cost: s
                        .total_cost
                        .as_ref()
                        .map(|c| format!("{:.2} {}", c.cost, c.currency))
                        .unwrap_or_default(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Sessions:".bold(), table))
        }
    }
}

/// Format v2 transactions
pub fn format_transactions(transactions: &[Transaction], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(transactions),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct TransactionRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Started")]
                started: String,
                #[tabled(rename = "Ended")]
                ended: String,
                #[tabled(rename = "Energy")]
                energy: String,
                #[tabled(rename = "Reason")]
                reason: String,
            }

            let rows: Vec<TransactionRow> = transactions
                .iter()
                .map(|t| TransactionRow {
                    id: t.id.clone(),
                    started: t.start_date.format("%Y-%m-%d %H:%M").to_string(),
                    ended: match t.end_date {
                        Some(end) => end.format("%Y-%m-%d %H:%M").to_string(),
                        None => "active".green().to_string(),
                    },
                    energy: kwh(t.power_usage),
                    reason: t.reason.clone().unwrap_or_default(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Transactions:".bold(), table))
        }
    }
}

pub fn format_solar(solar: &SolarConfig, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(solar),
        OutputFormat::Table => Ok(format!(
            "{}\nSolar with schedule: {}\nPower sensor installed: {}\nStart export power: {} W\nStop import power: {} W",
            "Solar Configuration".bold(),
            solar.solar_with_schedule,
            solar.power_sensor_installed,
            solar.solar_start_export_power,
            solar.solar_stop_import_power
        )),
    }
}

pub fn format_override(config: &OverrideConfig, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(config),
        OutputFormat::Table => Ok(format!(
            "Charge now: {}",
            if config.charge_now { "on".green() } else { "off".dimmed() }
        )),
    }
}

pub fn format_command(response: &CommandResponse, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(response),
        OutputFormat::Table => {
            let status = if response.is_accepted() {
                response.status.green()
            } else {
                response.status.red()
            };
            Ok(match &response.message {
                Some(message) => format!("Command {}: {}", status, message),
                None => format!("Command {}", status),
            })
        }
    }
}

fn format_segments(title: &str, enabled: bool, segments: &[ScheduleSegment]) -> String {
    #[derive(Tabled)]
    struct SegmentRow {
        #[tabled(rename = "From")]
        start: String,
        #[tabled(rename = "Limit")]
        limit: String,
    }

    let rows: Vec<SegmentRow> = segments
        .iter()
        .map(|s| SegmentRow {
            start: format!("{:02}:{:02}", s.start / 3600, (s.start % 3600) / 60),
            limit: format!("{} A", s.limit),
        })
        .collect();

    format!(
        "{} ({})\n{}",
        title.bold(),
        if enabled { "enabled".green() } else { "disabled".dimmed() },
        Table::new(rows).with(Style::rounded())
    )
}

/// Format a stored schedule
pub fn format_schedule(
    title: &str,
    enabled: bool,
    segments: &[ScheduleSegment],
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => json(&serde_json::json!({
            "enabled": enabled,
            "segments": segments,
        })),
        OutputFormat::Table => Ok(format_segments(title, enabled, segments)),
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}
