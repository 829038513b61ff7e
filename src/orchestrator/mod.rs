//! Orchestrator - the two-phase, budget-gated planning state machine
//!
//! `Init → ResearchRunning → GateEvaluating → {Aborted | FinalizationRunning}
//! → Done`. Phase 1 researches sights and transport, the gate decides whether
//! the budget can carry the trip at all, and only then is the expensive final
//! itinerary generated. Insufficient budget is a successful outcome, not an
//! error; only collaborator faults and bad input are errors.

mod registry;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::budget::{BudgetError, BudgetParameters, CurrencyUnit};
use crate::config::BudgetConfig;
use crate::crew::{CompletionError, CompletionService, CrewExecutor, ExecError, GraphError, TaskId};
use crate::gate::{BudgetGate, ValidationOutcome};

pub use registry::{AgentRegistry, ITINERARY_TASK, RESEARCH_TASK, TRANSPORT_TASK, phase_one_tasks, phase_two_tasks};

/// Validated caller input for one planning run
#[derive(Debug, Clone)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    /// Free text, e.g. "June 2026"
    pub month: String,
    pub duration_days: u32,
    pub travelers: u32,
    pub budget: f64,
    pub currency: CurrencyUnit,
}

impl TripRequest {
    /// Check identifying and numeric inputs before any external call
    fn validate(&self) -> Result<(), PlannerError> {
        if self.origin.trim().is_empty() {
            return Err(PlannerError::InvalidInput("origin must not be empty".to_string()));
        }
        if self.destination.trim().is_empty() {
            return Err(PlannerError::InvalidInput("destination must not be empty".to_string()));
        }
        if self.duration_days < 1 {
            return Err(PlannerError::InvalidInput("duration must be at least 1 day".to_string()));
        }
        if self.travelers < 1 {
            return Err(PlannerError::InvalidInput("traveler count must be at least 1".to_string()));
        }
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(PlannerError::InvalidInput("budget must be positive".to_string()));
        }
        Ok(())
    }
}

/// Opaque credentials, presence-checked at `Init`
///
/// Passed in explicitly at construction; the engine never reads or writes
/// process environment, so concurrent runs cannot clobber each other.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub serper_api_key: String,
}

impl Credentials {
    pub fn is_present(&self) -> bool {
        !self.openai_api_key.is_empty() && !self.serper_api_key.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"***")
            .field("serper_api_key", &"***")
            .finish()
    }
}

/// Orchestration states, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ResearchRunning,
    GateEvaluating,
    FinalizationRunning,
    Done,
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunState::Init => "init",
            RunState::ResearchRunning => "research-running",
            RunState::GateEvaluating => "gate-evaluating",
            RunState::FinalizationRunning => "finalization-running",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Why a run stopped before final planning
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// The gate judged the budget too small for transport plus minimum stay
    InsufficientBudget {
        #[serde(rename = "estimatedMinimum")]
        estimated_minimum: f64,
    },
    /// The gate's answer matched neither grammar shape; sufficiency is unknown
    UnvalidatedBudget { raw: String },
}

/// Result surface returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Done {
        report: String,
    },
    Aborted {
        #[serde(flatten)]
        reason: AbortReason,
    },
}

/// Planner error taxonomy
///
/// Input errors are detected before any external call; collaborator failures
/// identify the task that was running and are never retried here; graph
/// errors are programming mistakes in task construction.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Collaborator failure in task '{task}': {source}")]
    Collaborator {
        task: TaskId,
        #[source]
        source: CompletionError,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl PlannerError {
    /// Stable machine-readable kind for the error surface
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::InvalidInput(_) => "invalid_input",
            PlannerError::Collaborator { .. } => "collaborator_failure",
            PlannerError::Graph(GraphError::CyclicDependency(_)) => "cyclic_dependency",
            PlannerError::Graph(GraphError::UnknownDependency { .. }) => "unknown_dependency",
        }
    }
}

impl From<ExecError> for PlannerError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Graph(e) => PlannerError::Graph(e),
            ExecError::Task { task, source } => PlannerError::Collaborator { task, source },
        }
    }
}

impl From<BudgetError> for PlannerError {
    fn from(err: BudgetError) -> Self {
        PlannerError::InvalidInput(err.to_string())
    }
}

/// Top-level controller for one planning session
///
/// Owns no mutable state between runs; each `run` call builds its own
/// profiles, tasks, and results, so concurrent runs for different users are
/// safe on one instance.
pub struct Orchestrator {
    service: Arc<dyn CompletionService>,
    credentials: Credentials,
    budget_config: BudgetConfig,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn CompletionService>, credentials: Credentials, budget_config: BudgetConfig) -> Self {
        Self {
            service,
            credentials,
            budget_config,
        }
    }

    /// Run one planning session to completion or abort
    pub async fn run(&self, request: &TripRequest) -> Result<RunOutcome, PlannerError> {
        let run_id = Uuid::now_v7();
        let mut state = RunState::Init;
        info!(%run_id, origin = %request.origin, destination = %request.destination, %state, "run: started");

        // Init: everything checked before the first external call
        request.validate()?;
        if !self.credentials.is_present() {
            return Err(PlannerError::InvalidInput("missing credentials".to_string()));
        }
        let params = BudgetParameters::new(
            request.currency,
            request.budget,
            request.duration_days,
            request.travelers,
            self.budget_config.daily_minimum(request.currency),
        )?;

        let agents = AgentRegistry::for_trip(request);
        let executor = CrewExecutor::new(Arc::clone(&self.service));

        state = self.transition(run_id, state, RunState::ResearchRunning);
        let phase_one = executor.run(&phase_one_tasks(request, &agents)).await?;
        let transport = phase_one
            .get(&TaskId::from(TRANSPORT_TASK))
            .ok_or_else(|| PlannerError::Graph(GraphError::UnknownDependency {
                task: TaskId::from(ITINERARY_TASK),
                dependency: TaskId::from(TRANSPORT_TASK),
            }))?;

        state = self.transition(run_id, state, RunState::GateEvaluating);
        let gate = BudgetGate::new(Arc::clone(&self.service));
        let verdict = gate
            .evaluate(&params, &transport.output)
            .await
            .map_err(|source| PlannerError::Collaborator {
                task: TaskId::from("budget-gate"),
                source,
            })?;

        match verdict {
            ValidationOutcome::Sufficient => {}
            ValidationOutcome::Insufficient(estimated_minimum) => {
                self.transition(run_id, state, RunState::Aborted);
                warn!(%run_id, estimated_minimum, "run: budget insufficient");
                return Ok(RunOutcome::Aborted {
                    reason: AbortReason::InsufficientBudget { estimated_minimum },
                });
            }
            ValidationOutcome::Unparseable(raw) => {
                // Policy: an unverifiable budget aborts rather than being
                // coerced into either verdict.
                self.transition(run_id, state, RunState::Aborted);
                warn!(%run_id, raw_len = raw.len(), "run: budget check unparseable");
                return Ok(RunOutcome::Aborted {
                    reason: AbortReason::UnvalidatedBudget { raw },
                });
            }
        }

        state = self.transition(run_id, state, RunState::FinalizationRunning);
        let mut seed = std::collections::HashMap::new();
        for id in [RESEARCH_TASK, TRANSPORT_TASK] {
            if let Some(result) = phase_one.get(&TaskId::from(id)) {
                seed.insert(result.task_id.clone(), result.clone());
            }
        }
        let phase_two = executor.run_seeded(&phase_two_tasks(request, &agents), seed).await?;
        let report = phase_two
            .get(&TaskId::from(ITINERARY_TASK))
            .map(|r| r.output.clone())
            .unwrap_or_default();

        self.transition(run_id, state, RunState::Done);
        info!(%run_id, report_len = report.len(), "run: complete");
        Ok(RunOutcome::Done { report })
    }

    fn transition(&self, run_id: Uuid, from: RunState, to: RunState) -> RunState {
        info!(%run_id, %from, %to, "transition");
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::mock::ScriptedCompletion;

    fn credentials() -> Credentials {
        Credentials {
            openai_api_key: "sk-test".to_string(),
            serper_api_key: "serper-test".to_string(),
        }
    }

    fn request() -> TripRequest {
        TripRequest {
            origin: "Mumbai".to_string(),
            destination: "London".to_string(),
            month: "June 2026".to_string(),
            duration_days: 3,
            travelers: 1,
            budget: 2000.0,
            currency: CurrencyUnit::Usd,
        }
    }

    fn orchestrator(service: Arc<ScriptedCompletion>) -> Orchestrator {
        Orchestrator::new(service, credentials(), BudgetConfig::default())
    }

    #[tokio::test]
    async fn test_sufficient_budget_reaches_done() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("sights report".to_string()),
            Ok("flights: $800 total".to_string()),
            Ok("SUFFICIENT".to_string()),
            Ok("# 3-Day London Plan".to_string()),
        ]));
        let outcome = orchestrator(service.clone()).run(&request()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Done {
            report: "# 3-Day London Plan".to_string()
        });
        assert_eq!(service.call_count(), 4);
    }

    #[tokio::test]
    async fn test_insufficient_budget_aborts_before_finalization() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("sights report".to_string()),
            Ok("flights: $4000 total".to_string()),
            Ok("INSUFFICIENT: 4500".to_string()),
        ]));
        let outcome = orchestrator(service.clone()).run(&request()).await.unwrap();

        assert_eq!(outcome, RunOutcome::Aborted {
            reason: AbortReason::InsufficientBudget {
                estimated_minimum: 4500.0
            }
        });
        // three calls: research, transport, gate - never the itinerary
        assert_eq!(service.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_gate_aborts_with_flag() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("sights report".to_string()),
            Ok("flights".to_string()),
            Ok("I'm not sure about this one".to_string()),
        ]));
        let outcome = orchestrator(service.clone()).run(&request()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Aborted {
            reason: AbortReason::UnvalidatedBudget { .. }
        }));
        assert_eq!(service.call_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_origin_fails_without_external_calls() {
        let service = Arc::new(ScriptedCompletion::new(vec![]));
        let req = TripRequest {
            origin: "  ".to_string(),
            ..request()
        };
        let err = orchestrator(service.clone()).run(&req).await.unwrap_err();

        assert!(matches!(err, PlannerError::InvalidInput(_)));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_init() {
        let service = Arc::new(ScriptedCompletion::new(vec![]));
        let orch = Orchestrator::new(
            service.clone(),
            Credentials {
                openai_api_key: String::new(),
                serper_api_key: "serper".to_string(),
            },
            BudgetConfig::default(),
        );

        let err = orch.run(&request()).await.unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput(_)));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_collaborator_failure_identifies_task() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Err(CompletionError::EmptyResponse),
        ]));
        let err = orchestrator(service).run(&request()).await.unwrap_err();

        match err {
            PlannerError::Collaborator { task, .. } => {
                assert!(task == TaskId::from(RESEARCH_TASK) || task == TaskId::from(TRANSPORT_TASK));
            }
            other => panic!("expected collaborator failure, got {:?}", other),
        }
    }

    #[test]
    fn test_error_kinds_distinguish_graph_variants() {
        let cyclic = PlannerError::Graph(GraphError::CyclicDependency(TaskId::from("a")));
        assert_eq!(cyclic.kind(), "cyclic_dependency");

        // a dangling reference is not a cycle
        let dangling = PlannerError::Graph(GraphError::UnknownDependency {
            task: TaskId::from("a"),
            dependency: TaskId::from("ghost"),
        });
        assert_eq!(dangling.kind(), "unknown_dependency");
    }

    #[test]
    fn test_outcome_serialization_surface() {
        let done = RunOutcome::Done {
            report: "plan".to_string(),
        };
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["report"], "plan");

        let aborted = RunOutcome::Aborted {
            reason: AbortReason::InsufficientBudget {
                estimated_minimum: 3200.0,
            },
        };
        let json = serde_json::to_value(&aborted).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["reason"], "insufficient_budget");
        assert_eq!(json["estimatedMinimum"], 3200.0);

        let unvalidated = RunOutcome::Aborted {
            reason: AbortReason::UnvalidatedBudget {
                raw: "no idea".to_string(),
            },
        };
        let json = serde_json::to_value(&unvalidated).unwrap();
        assert_eq!(json["reason"], "unvalidated_budget");
    }
}
