//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};

/// EVNEX charge point CLI
#[derive(Parser, Debug)]
#[command(name = "evnexctl")]
#[command(version, about = "EVNEX charge point CLI", long_about = None)]
pub struct Cli {
    /// API base URL (overrides config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Account username (overrides config file and EVNEX_CLIENT_USERNAME)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Account password (default: EVNEX_CLIENT_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Organisation ID (default: the account's first organisation)
    #[arg(short, long, global = true)]
    pub org: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging (overrides config file)
    #[arg(short, long)]
    pub verbose: Option<bool>,

    /// Request timeout in seconds (overrides config file)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Don't load config file
    #[arg(long)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/evnex/cli.toml)
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Table => crate::format::OutputFormat::Table,
            OutputFormat::Json => crate::format::OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and print the session tokens
    Token,

    /// Show the signed-in user and their organisations
    User,

    /// List charge points of the organisation
    ChargePoints,

    /// Show daily usage insight for the organisation
    Insight {
        /// Number of days to report
        #[arg(short, long, default_value = "7")]
        days: u32,

        /// Timezone offset applied to day boundaries, e.g. +12:00
        #[arg(long, allow_hyphen_values = true)]
        tz_offset: Option<String>,
    },

    /// Count charge points per status
    StatusSummary,

    /// Show one charge point
    Detail {
        /// Charge point ID
        charge_point: String,

        /// Use the v3 detail endpoint
        #[arg(long)]
        v3: bool,
    },

    /// List charging sessions of a charge point
    Sessions {
        /// Charge point ID
        charge_point: String,
    },

    /// List transactions of a charge point
    Transactions {
        /// Charge point ID
        charge_point: String,
    },

    /// Show solar charging configuration
    Solar {
        /// Charge point ID
        charge_point: String,
    },

    /// Show or set the charge-now override
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },

    /// Enable or disable a connector
    Availability {
        #[command(subcommand)]
        command: AvailabilityCommands,
    },

    /// Stop the current charging session
    Stop {
        /// Charge point ID
        charge_point: String,

        /// Connector ID
        #[arg(short, long, default_value = "1")]
        connector: String,

        /// Seconds to wait for the charge point before giving up
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Replace the charge schedule
    Schedule {
        /// Charge point ID
        charge_point: String,

        /// Segments as START:LIMIT pairs (seconds since midnight, amps), e.g. 0:32,25200:0
        #[arg(short, long)]
        periods: String,

        /// Store the schedule without enabling it
        #[arg(long)]
        disabled: bool,
    },

    /// Replace the load management profile
    LoadManagement {
        /// Charge point ID
        charge_point: String,

        /// Segments as START:LIMIT pairs (seconds, amps), e.g. 0:32,3600:16
        #[arg(short, long)]
        periods: String,

        /// Enable the profile
        #[arg(long)]
        enabled: bool,

        /// Profile duration in seconds
        #[arg(short, long, default_value = "86400")]
        duration: i64,
    },

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum OverrideCommands {
    /// Show the current override
    Get {
        /// Charge point ID
        charge_point: String,
    },

    /// Turn charge-now on or off
    Set {
        /// Charge point ID
        charge_point: String,

        /// on or off
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        charge_now: bool,

        /// Connector ID
        #[arg(short, long, default_value = "1")]
        connector: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum AvailabilityCommands {
    /// Make a connector available for charging
    Enable {
        /// Charge point ID
        charge_point: String,

        /// Connector ID
        #[arg(short, long, default_value = "1")]
        connector: u32,
    },

    /// Take a connector out of service
    Disable {
        /// Charge point ID
        charge_point: String,

        /// Connector ID
        #[arg(short, long, default_value = "1")]
        connector: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}
