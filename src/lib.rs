//! tripcrew - budget-gated multi-agent trip planning engine
//!
//! Coordinates role-specialized LLM agents that each produce one text
//! artifact (sights/weather research, transport options, final itinerary)
//! and gates the expensive final planning phase behind an automated
//! budget-sufficiency check.
//!
//! # Core concepts
//!
//! - **Fresh per run**: agent profiles and tasks carry run-specific
//!   parameters; nothing persists across runs, so concurrent runs are safe.
//! - **Two phases, one gate**: research and transport first, then a single
//!   budget verdict decides whether the itinerary is worth paying for.
//! - **Total verdicts**: the gate's free-text answer parses into a closed
//!   three-way outcome; an off-grammar answer is a first-class result, not a
//!   panic or a guess.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`tools`] - Tool system (web search) granted per agent capability
//! - [`crew`] - Agent/task model, task graph, crew executor
//! - [`budget`] - Currency units and minimum-stay arithmetic
//! - [`gate`] - Budget gate and verdict parser
//! - [`orchestrator`] - Two-phase state machine and error taxonomy
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod budget;
pub mod cli;
pub mod config;
pub mod crew;
pub mod gate;
pub mod llm;
pub mod orchestrator;
pub mod tools;

// Re-export commonly used types
pub use budget::{BudgetParameters, CurrencyUnit, ExchangeRates};
pub use config::{BudgetConfig, Config, LlmConfig, SearchConfig};
pub use crew::{
    AgentCompletion, AgentProfile, Capability, CompletionError, CompletionService, CrewExecutor, CrewOutput,
    ExecError, GraphError, TaskId, TaskResult, TaskSpec,
};
pub use gate::{BudgetGate, ValidationOutcome, parse_verdict};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
pub use orchestrator::{
    AbortReason, Credentials, Orchestrator, PlannerError, RunOutcome, RunState, TripRequest,
};
