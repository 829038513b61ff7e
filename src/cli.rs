//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::budget::CurrencyUnit;
use crate::orchestrator::TripRequest;

/// tripcrew - budget-gated multi-agent trip planner
#[derive(Parser)]
#[command(name = "tripcrew", about = "Budget-gated multi-agent trip planning engine", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip
    Plan {
        /// Departure city
        #[arg(long = "from")]
        origin: String,

        /// Destination city
        #[arg(long = "to")]
        destination: String,

        /// Travel month, free text (e.g. "June 2026")
        #[arg(long)]
        month: String,

        /// Trip duration in days
        #[arg(long, default_value_t = 3)]
        days: u32,

        /// Number of travelers
        #[arg(long, default_value_t = 1)]
        people: u32,

        /// Total budget in the selected currency
        #[arg(long)]
        budget: f64,

        /// Billing currency (usd or inr)
        #[arg(long, default_value_t = CurrencyUnit::Usd)]
        currency: CurrencyUnit,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Command {
    /// Build the engine request from CLI arguments
    pub fn to_trip_request(&self) -> TripRequest {
        match self {
            Command::Plan {
                origin,
                destination,
                month,
                days,
                people,
                budget,
                currency,
                ..
            } => TripRequest {
                origin: origin.clone(),
                destination: destination.clone(),
                month: month.clone(),
                duration_days: *days,
                travelers: *people,
                budget: *budget,
                currency: *currency,
            },
        }
    }
}
