//! Tool system for search-capable agents
//!
//! A tool is an external capability the completion service may exercise
//! between model turns. The crew code never calls tools directly; it only
//! grants them per agent profile.

mod search;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ToolCall, ToolDefinition};

pub use search::SerperSearchTool;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches LLM tool_use name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Holds the tools available to a run and dispatches calls by name
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Add a tool to the registry
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get definitions for a subset of tools by name
    pub fn definitions_for(&self, tool_names: &[&str]) -> Vec<ToolDefinition> {
        tool_names
            .iter()
            .filter_map(|name| self.tools.get(*name))
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        match self.tools.get(&tool_call.name) {
            Some(tool) => tool.execute(tool_call.input.clone()).await,
            None => ToolResult::error(format!("Unknown tool: {}", tool_call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("5 flights found");
        assert!(!result.is_error);
        assert_eq!(result.content, "5 flights found");
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("API unreachable");
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::empty();
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "teleport".to_string(),
            input: serde_json::json!({}),
        };
        let result = registry.execute(&call).await;
        assert!(result.is_error);
        assert!(result.content.contains("Unknown tool"));
    }
}
