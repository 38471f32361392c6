//! Reagent core — shared types for the reasoning-loop agent.
//!
//! This crate contains:
//! - **types**: OpenAI-format messages, tool calls, tool definitions, wire types
//! - **conversation**: the append-only message log that forms model context
//! - **error**: the typed error taxonomy (model, tool, registry, conversation)
//! - **config**: model settings, retry policy, and per-run limits

pub mod config;
pub mod conversation;
pub mod error;
pub mod types;

pub use config::{ModelSettings, RetryPolicy, RunLimits};
pub use conversation::Conversation;
pub use error::{ArgumentProblems, ConversationError, ModelError, RegistryError, ToolError};
pub use types::{Message, ModelReply, ToolCall, ToolDefinition};
