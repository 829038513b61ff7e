//! Task graph resolution
//!
//! Stable topological sort over client-constructed task sets. Declaration
//! order is the tie-break, so identical graphs always resolve identically.

use thiserror::Error;
use tracing::debug;

use super::{TaskId, TaskSpec};

/// Errors from task graph resolution
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Cyclic dependency involving task '{0}'")]
    CyclicDependency(TaskId),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },
}

/// Produce a linear execution order such that every task appears after all
/// of its dependencies
///
/// Returns indices into `tasks`. Kahn's algorithm; within each step the
/// lowest declaration index among ready tasks goes first.
pub fn resolve_order(tasks: &[TaskSpec]) -> Result<Vec<usize>, GraphError> {
    let levels = resolve_levels(tasks)?;
    Ok(levels.into_iter().flatten().collect())
}

/// Group tasks into dependency levels
///
/// Every task in level N has all of its dependencies in levels < N, so tasks
/// within one level are mutually independent and safe to run concurrently.
/// Within a level, tasks keep declaration order.
pub fn resolve_levels(tasks: &[TaskSpec]) -> Result<Vec<Vec<usize>>, GraphError> {
    debug!(task_count = tasks.len(), "resolve_levels: called");

    let index_of = |id: &TaskId| tasks.iter().position(|t| &t.id == id);

    // Validate references up front so a dangling id is reported as such,
    // not mistaken for a cycle.
    let mut deps: Vec<Vec<usize>> = Vec::with_capacity(tasks.len());
    for task in tasks {
        let mut resolved = Vec::with_capacity(task.dependencies.len());
        for dep in &task.dependencies {
            match index_of(dep) {
                Some(i) => resolved.push(i),
                None => {
                    return Err(GraphError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        deps.push(resolved);
    }

    let mut placed = vec![false; tasks.len()];
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut remaining = tasks.len();

    while remaining > 0 {
        let ready: Vec<usize> = (0..tasks.len())
            .filter(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]))
            .collect();

        if ready.is_empty() {
            // Something unplaced has an unplaced dependency: a cycle.
            // Report the first task involved, by declaration order.
            let culprit = (0..tasks.len())
                .find(|&i| !placed[i])
                .map(|i| tasks[i].id.clone())
                .unwrap_or_else(|| TaskId::new("unknown"));
            debug!(%culprit, "resolve_levels: cycle detected");
            return Err(GraphError::CyclicDependency(culprit));
        }

        remaining -= ready.len();
        for &i in &ready {
            placed[i] = true;
        }
        levels.push(ready);
    }

    debug!(level_count = levels.len(), "resolve_levels: resolved");
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::AgentProfile;
    use std::sync::Arc;

    fn task(id: &str, deps: &[&str]) -> TaskSpec {
        TaskSpec {
            id: TaskId::from(id),
            description: format!("do {}", id),
            expected_output: "text".to_string(),
            agent: Arc::new(AgentProfile::new("r", "g", "b", [])),
            dependencies: deps.iter().map(|d| TaskId::from(*d)).collect(),
        }
    }

    #[test]
    fn test_fan_in_places_dependent_last() {
        let tasks = vec![task("a", &[]), task("b", &[]), task("c", &["a", "b"])];
        let order = resolve_order(&tasks).unwrap();

        let pos = |i: usize| order.iter().position(|&x| x == i).unwrap();
        assert!(pos(2) > pos(0));
        assert!(pos(2) > pos(1));
    }

    #[test]
    fn test_declaration_order_tie_break() {
        let tasks = vec![task("b", &[]), task("a", &[]), task("c", &[])];
        // All independent: resolution keeps declaration order
        assert_eq!(resolve_order(&tasks).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let tasks = vec![task("a", &[]), task("b", &["a"]), task("c", &["a", "b"])];
        let first = resolve_order(&tasks).unwrap();
        let second = resolve_order(&tasks).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_levels_group_independent_tasks() {
        let tasks = vec![task("research", &[]), task("transport", &[]), task(
            "itinerary",
            &["research", "transport"],
        )];
        let levels = resolve_levels(&tasks).unwrap();
        assert_eq!(levels, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_cycle_detected() {
        let tasks = vec![task("a", &["b"]), task("b", &["a"])];
        assert!(matches!(resolve_order(&tasks), Err(GraphError::CyclicDependency(_))));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let tasks = vec![task("a", &["a"])];
        assert_eq!(
            resolve_order(&tasks),
            Err(GraphError::CyclicDependency(TaskId::from("a")))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let tasks = vec![task("a", &["ghost"])];
        assert_eq!(
            resolve_order(&tasks),
            Err(GraphError::UnknownDependency {
                task: TaskId::from("a"),
                dependency: TaskId::from("ghost"),
            })
        );
    }
}
