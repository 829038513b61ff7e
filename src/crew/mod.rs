//! Crew data model and execution
//!
//! A crew is a set of tasks, each assigned to one agent profile, with
//! declared dependencies on other tasks' outputs. The graph resolver orders
//! them, the executor runs them through the completion service, and the
//! completion service owns the capability sub-loop (web search).
//!
//! Everything here is built fresh for one run and discarded afterwards -
//! agent goals carry run-specific parameters, so nothing is reusable.

mod completion;
mod executor;
mod graph;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use completion::{AgentCompletion, CompletionError, CompletionService, MAX_TOOL_TURNS};
pub use executor::{CrewExecutor, CrewOutput, ExecError};
pub use graph::{GraphError, resolve_levels, resolve_order};

#[cfg(test)]
pub use completion::mock;

/// External capability an agent may exercise during a completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Search,
}

impl Capability {
    /// Tool name this capability binds to
    pub fn tool_name(&self) -> &'static str {
        match self {
            Capability::Search => "search",
        }
    }
}

/// A role-scoped persona used to parameterize completion calls
///
/// Immutable once constructed. Goals are interpolated with run parameters,
/// so profiles are per-run values, never shared across runs.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub capabilities: BTreeSet<Capability>,
}

impl AgentProfile {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Unique task identifier within one run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One unit of work producing a single text artifact
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    /// Instruction text with run parameters interpolated
    pub description: String,
    /// Contract string steering the completion call; not mechanically enforced
    pub expected_output: String,
    pub agent: Arc<AgentProfile>,
    /// Tasks whose outputs must be available before this one runs, in the
    /// order their outputs are concatenated into this task's context
    pub dependencies: Vec<TaskId>,
}

/// The raw output of one completed task
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub output: String,
    pub captured_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn new(task_id: TaskId, output: String) -> Self {
        Self {
            task_id,
            output,
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_capabilities() {
        let profile = AgentProfile::new("Researcher", "Find sights", "Local expert", [Capability::Search]);
        assert!(profile.has_capability(Capability::Search));

        let plain = AgentProfile::new("Auditor", "Check numbers", "Accountant", []);
        assert!(!plain.has_capability(Capability::Search));
    }

    #[test]
    fn test_task_id_display() {
        let id = TaskId::from("research");
        assert_eq!(id.to_string(), "research");
        assert_eq!(id.as_str(), "research");
    }
}
