//! Error taxonomy for the reasoning loop.
//!
//! Model-level errors can terminate a run; tool-level errors never do — they
//! are serialized into tool-result content so the model can react to them.

use std::fmt;
use std::time::Duration;

// ─────────────────────────────────────────────
// Model client errors
// ─────────────────────────────────────────────

/// Failures from the upstream model endpoint.
///
/// The client never retries these internally; retry policy belongs to the
/// orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Network/connection failure, timeout, or a non-2xx status other
    /// than 429.
    #[error("upstream unavailable: {detail}")]
    Unavailable { detail: String },

    /// HTTP 429 — caller should back off before retrying.
    #[error("upstream rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// The upstream response could not be parsed into a valid reply.
    /// Never retried: a corrupt reply cannot be safely reasoned about.
    #[error("malformed model reply: {reason}")]
    Malformed { reason: String },
}

impl ModelError {
    /// Construct an `Unavailable` error.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        ModelError::Unavailable {
            detail: detail.into(),
        }
    }

    /// Construct a `Malformed` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        ModelError::Malformed {
            reason: reason.into(),
        }
    }

    /// Whether the orchestrator may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::Unavailable { .. } | ModelError::RateLimited { .. }
        )
    }
}

// ─────────────────────────────────────────────
// Tool errors
// ─────────────────────────────────────────────

/// Failures from tool resolution, validation, or execution.
///
/// All variants are non-fatal to a run: the orchestrator encodes them as the
/// content of the corresponding tool-result message.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{name}'")]
    Unknown { name: String },

    #[error("invalid arguments for '{tool}': {problems}")]
    InvalidArguments {
        tool: String,
        problems: ArgumentProblems,
    },

    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },

    #[error("tool '{tool}' timed out after {elapsed:?}")]
    Timeout { tool: String, elapsed: Duration },
}

/// Validation findings for one argument bag: everything wrong at once, so the
/// model can fix all fields in a single retry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentProblems {
    /// Required parameters that were absent.
    pub missing: Vec<String>,
    /// Parameters not declared in the schema.
    pub unexpected: Vec<String>,
    /// Parameters present with the wrong type, as `(name, expected type)`.
    pub mistyped: Vec<(String, String)>,
}

impl ArgumentProblems {
    /// Whether any problem was found.
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mistyped.is_empty()
    }
}

impl fmt::Display for ArgumentProblems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing: {}", self.missing.join(", ")));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected: {}", self.unexpected.join(", ")));
        }
        if !self.mistyped.is_empty() {
            let fields: Vec<String> = self
                .mistyped
                .iter()
                .map(|(name, expected)| format!("{name} (expected {expected})"))
                .collect();
            parts.push(format!("mistyped: {}", fields.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

// ─────────────────────────────────────────────
// Registry errors
// ─────────────────────────────────────────────

/// Failures at registry setup time.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{name}' is already registered")]
    Duplicate { name: String },
}

// ─────────────────────────────────────────────
// Conversation errors
// ─────────────────────────────────────────────

/// Violations of the conversation's correlation and ordering invariants.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConversationError {
    /// A tool-result message does not match any unresolved tool call.
    #[error("no unresolved tool call with id '{id}'")]
    UnknownCorrelation { id: String },

    /// A tool result arrived out of request order.
    #[error("tool result '{id}' out of order, expected '{expected}'")]
    OutOfOrder { id: String, expected: String },

    /// An assistant message was appended while tool calls were still
    /// unresolved.
    #[error("{count} tool call(s) still unresolved")]
    UnresolvedCalls { count: usize },

    /// An assistant message proposed the same correlation id twice.
    #[error("duplicate tool call id '{id}'")]
    DuplicateCorrelation { id: String },
}
