//! Capability-aware completion service
//!
//! The single seam between the crew and the language model. A task execution
//! hands over an agent profile plus instruction text; if the profile grants
//! search, this service drives the tool round-trips internally and the crew
//! only ever sees the final text.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{
    CompletionRequest, ContentBlock, LlmClient, LlmError, Message, StopReason, ToolCall, ToolDefinition,
};
use crate::tools::{ToolRegistry, ToolResult};

use super::{AgentProfile, Capability};

use std::sync::Arc;

/// Upper bound on model/tool round-trips within one completion call
pub const MAX_TOOL_TURNS: usize = 8;

/// Errors from the completion service
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model returned no text content")]
    EmptyResponse,

    #[error("Tool loop exceeded {0} turns without a final answer")]
    MaxTurnsExceeded(usize),
}

/// Prompt-in, text-out collaborator contract
///
/// One call per task; the implementation owns any internal tool sub-loop.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        profile: &AgentProfile,
        instruction: &str,
        expected_output: &str,
        context: &str,
    ) -> Result<String, CompletionError>;
}

/// Production completion service over an LLM client and a tool registry
pub struct AgentCompletion {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_tokens: u32,
    max_turns: usize,
}

impl AgentCompletion {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, max_tokens: u32) -> Self {
        Self {
            llm,
            tools,
            max_tokens,
            max_turns: MAX_TOOL_TURNS,
        }
    }

    /// Persona prompt built from the agent profile
    fn system_prompt(profile: &AgentProfile) -> String {
        format!(
            "You are {role}. {backstory}\nYour goal: {goal}\n\
             Give your best complete final answer to the task.",
            role = profile.role,
            backstory = profile.backstory,
            goal = profile.goal,
        )
    }

    /// Task prompt: instruction, output contract, and dependency context
    fn user_prompt(instruction: &str, expected_output: &str, context: &str) -> String {
        let mut prompt = format!(
            "{instruction}\n\nThis is the expected output for your final answer: {expected_output}"
        );
        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }
        prompt
    }

    /// Tool definitions granted by the profile's capability set
    fn granted_tools(&self, profile: &AgentProfile) -> Vec<ToolDefinition> {
        let names: Vec<&str> = profile.capabilities.iter().map(Capability::tool_name).collect();
        self.tools.definitions_for(&names)
    }

    /// Build the assistant message echoing the model's turn
    fn assistant_message(content: &Option<String>, tool_calls: &[ToolCall]) -> Message {
        let mut blocks = Vec::new();
        if let Some(text) = content {
            blocks.push(ContentBlock::Text { text: text.clone() });
        }
        for call in tool_calls {
            blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            });
        }
        Message::assistant_blocks(blocks)
    }

    /// Build the user message carrying tool results back to the model
    fn tool_result_message(results: &[(String, ToolResult)]) -> Message {
        let blocks = results
            .iter()
            .map(|(id, result)| ContentBlock::ToolResult {
                tool_use_id: id.clone(),
                content: result.content.clone(),
                is_error: result.is_error,
            })
            .collect();
        Message::user_blocks(blocks)
    }
}

#[async_trait]
impl CompletionService for AgentCompletion {
    async fn complete(
        &self,
        profile: &AgentProfile,
        instruction: &str,
        expected_output: &str,
        context: &str,
    ) -> Result<String, CompletionError> {
        let tool_defs = self.granted_tools(profile);
        debug!(role = %profile.role, tool_count = tool_defs.len(), context_len = context.len(), "complete: called");

        let system_prompt = Self::system_prompt(profile);
        let mut messages = vec![Message::user(Self::user_prompt(instruction, expected_output, context))];
        let mut turn = 0;

        loop {
            turn += 1;
            if turn > self.max_turns {
                warn!(role = %profile.role, max_turns = self.max_turns, "complete: tool loop exhausted");
                return Err(CompletionError::MaxTurnsExceeded(self.max_turns));
            }

            let request = CompletionRequest {
                system_prompt: system_prompt.clone(),
                messages: messages.clone(),
                tools: tool_defs.clone(),
                max_tokens: self.max_tokens,
            };

            let response = self.llm.complete(request).await?;
            debug!(role = %profile.role, turn, stop_reason = ?response.stop_reason, "complete: model turn finished");

            match response.stop_reason {
                StopReason::EndTurn => {
                    return response
                        .content
                        .filter(|c| !c.trim().is_empty())
                        .ok_or(CompletionError::EmptyResponse);
                }
                StopReason::ToolUse => {
                    let mut results = Vec::with_capacity(response.tool_calls.len());
                    for call in &response.tool_calls {
                        debug!(tool = %call.name, turn, "complete: executing tool");
                        let result = self.tools.execute(call).await;
                        results.push((call.id.clone(), result));
                    }
                    messages.push(Self::assistant_message(&response.content, &response.tool_calls));
                    messages.push(Self::tool_result_message(&results));
                }
                StopReason::MaxTokens => {
                    messages.push(Self::assistant_message(&response.content, &[]));
                    messages.push(Message::user(
                        "Continue from where you left off. Your previous response was truncated.",
                    ));
                }
            }
        }
    }
}
