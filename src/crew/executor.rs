//! Crew executor - runs a resolved task graph through the completion service
//!
//! Levels run in sequence; tasks within a level share no dependency edge and
//! run concurrently. A task therefore never observes a dependency's output
//! before that dependency's call has returned, and both phase-1 tasks finish
//! before the aggregate is published.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info};

use super::graph::{GraphError, resolve_levels};
use super::{CompletionError, CompletionService, TaskId, TaskResult, TaskSpec};

/// Errors from crew execution
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Task '{task}' failed: {source}")]
    Task {
        task: TaskId,
        #[source]
        source: CompletionError,
    },
}

/// Results of one crew run, keyed by task id
#[derive(Debug)]
pub struct CrewOutput {
    results: HashMap<TaskId, TaskResult>,
    order: Vec<TaskId>,
}

impl CrewOutput {
    pub fn get(&self, id: &TaskId) -> Option<&TaskResult> {
        self.results.get(id)
    }

    /// Task ids in execution order
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// All outputs concatenated in execution order
    pub fn aggregate(&self) -> String {
        self.order
            .iter()
            .filter_map(|id| self.results.get(id))
            .map(|r| r.output.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Runs task graphs against a completion service
pub struct CrewExecutor {
    service: Arc<dyn CompletionService>,
}

impl CrewExecutor {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Execute all tasks in dependency order
    ///
    /// No retry: the first task failure aborts the remaining tasks and
    /// surfaces the failing task's id.
    pub async fn run(&self, tasks: &[TaskSpec]) -> Result<CrewOutput, ExecError> {
        self.run_seeded(tasks, HashMap::new()).await
    }

    /// Execute tasks whose dependencies may already be satisfied by results
    /// from an earlier crew (the itinerary task depends on phase-1 outputs)
    pub async fn run_seeded(
        &self,
        tasks: &[TaskSpec],
        seed: HashMap<TaskId, TaskResult>,
    ) -> Result<CrewOutput, ExecError> {
        debug!(task_count = tasks.len(), seed_count = seed.len(), "run_seeded: called");

        // Seed-satisfied edges are pruned before resolution; the graph only
        // orders what this crew actually executes. Context assembly still
        // sees the seeded outputs through `results`.
        let pruned: Vec<TaskSpec> = tasks
            .iter()
            .map(|t| {
                let mut t = t.clone();
                t.dependencies.retain(|d| !seed.contains_key(d));
                t
            })
            .collect();
        let levels = resolve_levels(&pruned)?;

        let mut results: HashMap<TaskId, TaskResult> = seed;
        let mut order: Vec<TaskId> = Vec::with_capacity(tasks.len());

        for (level_idx, level) in levels.iter().enumerate() {
            debug!(level = level_idx, width = level.len(), "run_seeded: starting level");

            // Dependencies of this level all completed in earlier levels, so
            // contexts can be assembled before anything in the level starts.
            let mut batch = Vec::with_capacity(level.len());
            for &i in level {
                let task = &tasks[i];
                let context = assemble_context(task, &results);
                batch.push(self.run_task(task, context));
            }

            for result in try_join_all(batch).await? {
                order.push(result.task_id.clone());
                results.insert(result.task_id.clone(), result);
            }
        }

        info!(task_count = order.len(), "run_seeded: crew complete");
        Ok(CrewOutput { results, order })
    }

    async fn run_task(&self, task: &TaskSpec, context: String) -> Result<TaskResult, ExecError> {
        info!(task = %task.id, agent = %task.agent.role, "run_task: executing");
        let output = self
            .service
            .complete(&task.agent, &task.description, &task.expected_output, &context)
            .await
            .map_err(|source| ExecError::Task {
                task: task.id.clone(),
                source,
            })?;

        debug!(task = %task.id, output_len = output.len(), "run_task: complete");
        Ok(TaskResult::new(task.id.clone(), output))
    }
}

/// Concatenate dependency outputs in declaration order, each block prefixed
/// with its source task id for traceability
fn assemble_context(task: &TaskSpec, results: &HashMap<TaskId, TaskResult>) -> String {
    task.dependencies
        .iter()
        .filter_map(|dep| results.get(dep))
        .map(|r| format!("[{}]\n{}", r.task_id, r.output))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::mock::ScriptedCompletion;
    use crate::crew::{AgentProfile, Capability};

    fn task(id: &str, deps: &[&str]) -> TaskSpec {
        TaskSpec {
            id: TaskId::from(id),
            description: format!("description for {}", id),
            expected_output: "text".to_string(),
            agent: Arc::new(AgentProfile::new("r", "g", "b", [Capability::Search])),
            dependencies: deps.iter().map(|d| TaskId::from(*d)).collect(),
        }
    }

    #[tokio::test]
    async fn test_dependent_context_contains_all_dependency_outputs() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("sights report".to_string()),
            Ok("flight options".to_string()),
            Ok("final plan".to_string()),
        ]));
        let executor = CrewExecutor::new(service.clone());

        let tasks = vec![
            task("research", &[]),
            task("transport", &[]),
            task("itinerary", &["research", "transport"]),
        ];
        let output = executor.run(&tasks).await.unwrap();

        assert_eq!(output.get(&TaskId::from("itinerary")).unwrap().output, "final plan");

        let calls = service.calls();
        let itinerary_call = &calls[2];
        assert!(itinerary_call.context.contains("[research]"));
        assert!(itinerary_call.context.contains("sights report"));
        assert!(itinerary_call.context.contains("[transport]"));
        assert!(itinerary_call.context.contains("flight options"));
    }

    #[tokio::test]
    async fn test_independent_tasks_see_no_context() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]));
        let executor = CrewExecutor::new(service.clone());

        executor.run(&[task("a", &[]), task("b", &[])]).await.unwrap();

        for call in service.calls() {
            assert!(call.context.is_empty(), "independent task saw context: {:?}", call);
        }
    }

    #[tokio::test]
    async fn test_failure_identifies_task_and_stops() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("ok".to_string()),
            Err(CompletionError::EmptyResponse),
        ]));
        let executor = CrewExecutor::new(service.clone());

        let tasks = vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])];
        let err = executor.run(&tasks).await.unwrap_err();

        match err {
            ExecError::Task { task, .. } => assert_eq!(task, TaskId::from("b")),
            other => panic!("expected task failure, got {:?}", other),
        }
        // task c never ran
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_concatenates_in_execution_order() {
        let service = Arc::new(ScriptedCompletion::new(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
        ]));
        let executor = CrewExecutor::new(service);

        let output = executor.run(&[task("a", &[]), task("b", &["a"])]).await.unwrap();
        assert_eq!(output.aggregate(), "first\n\nsecond");
    }

    #[tokio::test]
    async fn test_seeded_dependencies_feed_context() {
        let service = Arc::new(ScriptedCompletion::new(vec![Ok("day-by-day plan".to_string())]));
        let executor = CrewExecutor::new(service.clone());

        let mut seed = HashMap::new();
        seed.insert(
            TaskId::from("research"),
            TaskResult::new(TaskId::from("research"), "sights report".to_string()),
        );
        seed.insert(
            TaskId::from("transport"),
            TaskResult::new(TaskId::from("transport"), "flight options".to_string()),
        );

        let tasks = vec![task("itinerary", &["research", "transport"])];
        let output = executor.run_seeded(&tasks, seed).await.unwrap();

        assert_eq!(output.get(&TaskId::from("itinerary")).unwrap().output, "day-by-day plan");
        // aggregate covers only what this crew executed
        assert_eq!(output.aggregate(), "day-by-day plan");

        let call = &service.calls()[0];
        assert!(call.context.contains("[research]\nsights report"));
        assert!(call.context.contains("[transport]\nflight options"));
    }

    #[tokio::test]
    async fn test_cycle_surfaces_graph_error() {
        let service = Arc::new(ScriptedCompletion::new(vec![]));
        let executor = CrewExecutor::new(service.clone());

        let err = executor.run(&[task("a", &["b"]), task("b", &["a"])]).await.unwrap_err();
        assert!(matches!(err, ExecError::Graph(GraphError::CyclicDependency(_))));
        assert_eq!(service.call_count(), 0);
    }
}
