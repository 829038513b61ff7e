//! tripcrew - budget-gated multi-agent trip planner
//!
//! CLI entry point: wires config, credentials, the OpenAI client, and the
//! search tool into the orchestrator, then renders the run outcome.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::info;

use tripcrew::cli::{Cli, Command, OutputFormat};
use tripcrew::config::Config;
use tripcrew::crew::AgentCompletion;
use tripcrew::llm::OpenAIClient;
use tripcrew::orchestrator::{AbortReason, Orchestrator, PlannerError, RunOutcome};
use tripcrew::tools::{SerperSearchTool, ToolRegistry};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripcrew")
        .join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some("INFO") | None => tracing::Level::INFO,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("tripcrew.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref())?;

    let config = Config::load(cli.config.as_ref())?;
    config.validate()?;
    let credentials = config.resolve_credentials()?;

    let llm = Arc::new(OpenAIClient::new(&config.llm, credentials.openai_api_key.clone())?);
    let mut tools = ToolRegistry::empty();
    tools.add_tool(Box::new(SerperSearchTool::new(credentials.serper_api_key.clone())));
    let service = Arc::new(AgentCompletion::new(llm, tools, config.llm.max_tokens));

    let orchestrator = Orchestrator::new(service, credentials, config.budget.clone());

    let Command::Plan { format, .. } = &cli.command;
    let format = *format;
    let request = cli.command.to_trip_request();

    match orchestrator.run(&request).await {
        Ok(outcome) => {
            render_outcome(&outcome, format, request.currency.symbol());
            Ok(())
        }
        Err(err) => {
            render_error(&err, format);
            match format {
                // the JSON surface already carries the error; exit quietly
                OutputFormat::Json => std::process::exit(1),
                OutputFormat::Text => Err(err.into()),
            }
        }
    }
}

fn render_outcome(outcome: &RunOutcome, format: OutputFormat, unit: &str) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome).unwrap_or_default());
        }
        OutputFormat::Text => match outcome {
            RunOutcome::Done { report } => {
                println!("{}", "Your travel plan is ready!".green().bold());
                println!("---");
                println!("{report}");
            }
            RunOutcome::Aborted { reason } => match reason {
                AbortReason::InsufficientBudget { estimated_minimum } => {
                    println!("{}", "Budget not sufficient".red().bold());
                    println!("This trip needs at least {unit}{estimated_minimum}.");
                }
                AbortReason::UnvalidatedBudget { .. } => {
                    println!("{}", "Could not validate budget".yellow().bold());
                    println!("The budget check gave no usable answer; try again or adjust the budget.");
                }
            },
        },
    }
}

fn render_error(err: &PlannerError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let surface = serde_json::json!({
                "status": "error",
                "kind": err.kind(),
                "detail": err.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&surface).unwrap_or_default());
        }
        OutputFormat::Text => {
            eprintln!("{} {}", "Error:".red().bold(), err);
        }
    }
}
