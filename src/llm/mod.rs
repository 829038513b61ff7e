//! LLM client module
//!
//! Provides the provider-agnostic completion types, the [`LlmClient`] trait,
//! and the OpenAI implementation used in production.

mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, Role, StopReason, ToolCall,
    ToolDefinition,
};

#[cfg(test)]
pub use client::mock;
