//! Run events — an ordered, finite stream of state-transition snapshots.
//!
//! Callers pass an unbounded channel sender to
//! [`Runner::run_with_events`](crate::runner::Runner::run_with_events) and
//! consume events incrementally. The stream is bounded by the step budget and
//! always ends with [`RunEvent::Finished`].

use std::time::Duration;

/// The terminal shape a run ended in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    FinalAnswer,
    Exhausted,
    Error,
}

/// One event per state transition of the reasoning loop.
#[derive(Clone, Debug)]
pub enum RunEvent {
    /// Conversation seeded with the task (and optional system instruction).
    Seeded { messages: usize },
    /// A model call is about to be issued for the given step (1-indexed).
    ModelCalling { step: usize },
    /// The model replied; `tool_calls` is zero for a final answer.
    AssistantReply { step: usize, tool_calls: usize },
    /// A transient upstream failure is being retried after a backoff.
    Retrying { attempt: u32, delay: Duration },
    /// A tool call is being dispatched.
    ToolDispatched { call_id: String, name: String },
    /// A tool call resolved; `ok` is false when the result encodes a failure.
    ToolResolved { call_id: String, ok: bool },
    /// The run reached a terminal state. Always the last event.
    Finished { outcome: OutcomeKind },
}
