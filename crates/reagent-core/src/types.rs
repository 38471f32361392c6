//! Wire-level types for the reasoning loop.
//!
//! These model the generic chat-completion-with-tools protocol spoken by the
//! upstream model endpoint. Messages use Rust enums so format errors are
//! caught at compile time instead of at request time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ModelError;

// ─────────────────────────────────────────────
// Messages (chat completions format)
// ─────────────────────────────────────────────

/// A single turn in the conversation.
///
/// Each variant maps to a `role` field value on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },

    #[serde(rename = "tool")]
    Tool {
        content: String,
        tool_call_id: String,
    },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create an assistant message with text content only.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    /// Create an assistant message proposing tool calls.
    ///
    /// Accompanying narration is preserved when present.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content,
            tool_calls: Some(tool_calls),
        }
    }

    /// Create a tool-result message correlated to an earlier call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Tool calls (function calling)
// ─────────────────────────────────────────────

/// A tool invocation requested by the assistant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Correlation id used to match the result back to this request.
    pub id: String,
    /// Always "function" in the current protocol.
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function to call.
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        ToolCall {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// The function name and arguments within a tool call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Name of the tool to call.
    pub name: String,
    /// JSON-encoded argument bag.
    pub arguments: String,
}

// ─────────────────────────────────────────────
// Tool definitions (for model requests)
// ─────────────────────────────────────────────

/// Definition of a tool, sent to the model so it knows what it may call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// Always "function".
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function schema.
    pub function: FunctionDefinition,
}

/// Schema of a function tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

// ─────────────────────────────────────────────
// Model reply
// ─────────────────────────────────────────────

/// A validated reply from the model endpoint.
///
/// Exactly one of two shapes: a **final** reply (non-empty content, no tool
/// calls) or a **tool-request** reply (one or more tool calls, content
/// optional narration). Anything else is rejected at parse time as
/// [`ModelError::Malformed`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelReply {
    /// Text content from the assistant (None or narration on tool requests).
    pub content: Option<String>,
    /// Tool calls requested by the assistant.
    pub tool_calls: Vec<ToolCall>,
    /// Why the model stopped generating.
    pub finish_reason: Option<String>,
    /// Token usage statistics.
    pub usage: Option<UsageInfo>,
}

impl ModelReply {
    /// A final reply with text content.
    pub fn final_text(content: impl Into<String>) -> Self {
        ModelReply {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A tool-request reply.
    pub fn tool_request(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        ModelReply {
            content,
            tool_calls,
            ..Default::default()
        }
    }

    /// Whether the reply requests tool calls.
    ///
    /// Tool calls take precedence over content: a reply carrying both is a
    /// tool request, and its content is narration rather than a final answer.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether the reply is a final answer.
    pub fn is_final(&self) -> bool {
        !self.has_tool_calls()
    }

    /// Validate and convert a raw wire response into a `ModelReply`.
    ///
    /// Rejects responses with no choices, with neither content nor tool
    /// calls, and with duplicate correlation ids.
    pub fn from_wire(resp: ChatResponse) -> Result<Self, ModelError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::malformed("no choices in response"))?;

        let content = choice.message.content.filter(|c| !c.is_empty());
        let tool_calls = choice.message.tool_calls.unwrap_or_default();

        if content.is_none() && tool_calls.is_empty() {
            return Err(ModelError::malformed(
                "reply has neither content nor tool calls",
            ));
        }

        let mut seen = HashSet::new();
        for tc in &tool_calls {
            if !seen.insert(tc.id.as_str()) {
                return Err(ModelError::malformed(format!(
                    "duplicate tool call id '{}'",
                    tc.id
                )));
            }
        }

        Ok(ModelReply {
            content,
            tool_calls,
            finish_reason: choice.finish_reason,
            usage: resp.usage,
        })
    }
}

/// Token usage statistics from the model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ─────────────────────────────────────────────
// Wire request / response
// ─────────────────────────────────────────────

/// Request body for a chat-completions-compatible endpoint.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Raw chat completion response. Used internally for deserialization.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantReply,
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantReply {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
