//! Conversation — the append-only message log forming model context.
//!
//! A conversation is owned by exactly one run. It enforces the correlation
//! invariants: every tool result must match an unresolved call from the last
//! assistant message, results arrive in request order, and no new assistant
//! message may be appended while calls are still unresolved.

use std::collections::VecDeque;

use crate::error::ConversationError;
use crate::types::{Message, ToolCall};

/// Ordered, append-only sequence of messages.
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Correlation ids awaiting a tool result, in request order.
    unresolved: VecDeque<String>,
}

impl Conversation {
    /// Seed a conversation with an optional system instruction and the
    /// user's task.
    pub fn seed(system_instruction: Option<&str>, task: &str) -> Self {
        let mut messages = Vec::new();
        if let Some(system) = system_instruction {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(task));
        Conversation {
            messages,
            unresolved: VecDeque::new(),
        }
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Correlation ids still awaiting a result, in request order.
    pub fn unresolved_calls(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }

    /// Whether all issued tool calls have been resolved.
    pub fn is_settled(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Append a final assistant reply (text only, no tool calls).
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.check_settled()?;
        self.messages.push(Message::assistant(content.into()));
        Ok(())
    }

    /// Append an assistant reply proposing tool calls.
    ///
    /// Records each call id as unresolved; results must follow in the same
    /// order before the next assistant message.
    pub fn push_assistant_tool_calls(
        &mut self,
        content: Option<String>,
        tool_calls: &[ToolCall],
    ) -> Result<(), ConversationError> {
        self.check_settled()?;
        for tc in tool_calls {
            if self.unresolved.contains(&tc.id) {
                return Err(ConversationError::DuplicateCorrelation { id: tc.id.clone() });
            }
            self.unresolved.push_back(tc.id.clone());
        }
        self.messages
            .push(Message::assistant_tool_calls(content, tool_calls.to_vec()));
        Ok(())
    }

    /// Append a tool-result message, resolving the oldest outstanding call.
    ///
    /// The id must match the front of the unresolved queue — appending
    /// results out of request order is a correctness bug, not a policy
    /// choice.
    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), ConversationError> {
        match self.unresolved.front() {
            None => {
                return Err(ConversationError::UnknownCorrelation {
                    id: tool_call_id.to_string(),
                })
            }
            Some(expected) if expected != tool_call_id => {
                if self.unresolved.contains(&tool_call_id.to_string()) {
                    return Err(ConversationError::OutOfOrder {
                        id: tool_call_id.to_string(),
                        expected: expected.clone(),
                    });
                }
                return Err(ConversationError::UnknownCorrelation {
                    id: tool_call_id.to_string(),
                });
            }
            Some(_) => {}
        }
        self.unresolved.pop_front();
        self.messages
            .push(Message::tool_result(tool_call_id, content.into()));
        Ok(())
    }

    fn check_settled(&self) -> Result<(), ConversationError> {
        if self.unresolved.is_empty() {
            Ok(())
        } else {
            Err(ConversationError::UnresolvedCalls {
                count: self.unresolved.len(),
            })
        }
    }
}
