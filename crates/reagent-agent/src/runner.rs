//! Runner — the reasoning loop state machine.
//!
//! Drives the cycle: call the model, branch on the reply, dispatch tools,
//! append observations, repeat. Terminates with a final answer, an exhausted
//! budget, or an unrecoverable model error. Tool failures never terminate a
//! run; they are encoded into tool-result content so the model can react.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reagent_client::ModelClient;
use reagent_core::config::{RetryPolicy, RunLimits};
use reagent_core::conversation::Conversation;
use reagent_core::error::{ModelError, ToolError};
use reagent_core::types::{ModelReply, ToolCall, ToolDefinition};

use crate::events::{OutcomeKind, RunEvent};
use crate::tools::ToolRegistry;

// ─────────────────────────────────────────────
// Run results
// ─────────────────────────────────────────────

/// Which stage an unrecoverable failure is attributable to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunErrorKind {
    /// Upstream unreachable and retries (if any) exhausted.
    Unavailable,
    /// Upstream rate limiting outlasted the retry budget.
    RateLimited,
    /// The upstream reply could not be safely interpreted.
    MalformedReply,
    /// The run was cancelled at a transition boundary.
    Cancelled,
}

impl From<&ModelError> for RunErrorKind {
    fn from(err: &ModelError) -> Self {
        match err {
            ModelError::Unavailable { .. } => RunErrorKind::Unavailable,
            ModelError::RateLimited { .. } => RunErrorKind::RateLimited,
            ModelError::Malformed { .. } => RunErrorKind::MalformedReply,
        }
    }
}

/// Terminal outcome of one run. Callers always get one of these three
/// variants, never a panic or an unhandled error.
#[derive(Debug)]
pub enum RunResult {
    /// The model produced a final text answer.
    FinalAnswer {
        content: String,
        conversation: Conversation,
        steps: usize,
    },
    /// The step or wall-clock budget ran out before a final answer. A normal,
    /// reportable outcome; the partial conversation shows how far reasoning
    /// progressed.
    Exhausted {
        conversation: Conversation,
        steps: usize,
    },
    /// An unrecoverable model-stage failure or a cancellation.
    Error { kind: RunErrorKind, detail: String },
}

impl RunResult {
    /// The terminal shape of this result.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RunResult::FinalAnswer { .. } => OutcomeKind::FinalAnswer,
            RunResult::Exhausted { .. } => OutcomeKind::Exhausted,
            RunResult::Error { .. } => OutcomeKind::Error,
        }
    }

    /// The final answer text, if the run produced one.
    pub fn final_answer(&self) -> Option<&str> {
        match self {
            RunResult::FinalAnswer { content, .. } => Some(content),
            _ => None,
        }
    }

    /// The conversation, for non-error outcomes.
    pub fn conversation(&self) -> Option<&Conversation> {
        match self {
            RunResult::FinalAnswer { conversation, .. }
            | RunResult::Exhausted { conversation, .. } => Some(conversation),
            RunResult::Error { .. } => None,
        }
    }

    /// Number of model calls consumed, for non-error outcomes.
    pub fn steps(&self) -> Option<usize> {
        match self {
            RunResult::FinalAnswer { steps, .. } | RunResult::Exhausted { steps, .. } => {
                Some(*steps)
            }
            RunResult::Error { .. } => None,
        }
    }
}

/// Why a model call could not produce a reply.
enum Abort {
    Model(ModelError),
    Cancelled(&'static str),
}

impl Abort {
    fn into_result(self) -> RunResult {
        match self {
            Abort::Model(err) => RunResult::Error {
                kind: RunErrorKind::from(&err),
                detail: err.to_string(),
            },
            Abort::Cancelled(detail) => RunResult::Error {
                kind: RunErrorKind::Cancelled,
                detail: detail.to_string(),
            },
        }
    }
}

// ─────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────

/// Executes runs of the reasoning loop.
///
/// One `Runner` may serve many concurrent runs; each run owns its own
/// conversation and the registry is read-only.
pub struct Runner {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    limits: RunLimits,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a runner with default limits and no retries.
    pub fn new(client: Arc<dyn ModelClient>, tools: Arc<ToolRegistry>) -> Self {
        Runner {
            client,
            tools,
            limits: RunLimits::default(),
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the run limits (builder pattern).
    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the retry policy (builder pattern).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Token for cancelling every run this runner executes. Each run observes
    /// a child of this token, so cancelling it stops all in-flight runs at
    /// their next transition boundary; in-flight calls are not aborted.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run a task to a terminal state.
    pub async fn run(&self, task: &str, system_instruction: Option<&str>) -> RunResult {
        self.run_inner(task, system_instruction, self.cancel.child_token(), None)
            .await
    }

    /// Run a task that can be cancelled on its own.
    ///
    /// Concurrent runs are independent: cancelling this token stops only this
    /// run. Pass a child of [`cancellation_token`](Self::cancellation_token)
    /// to additionally observe the runner-level cancel-all.
    pub async fn run_cancellable(
        &self,
        task: &str,
        system_instruction: Option<&str>,
        cancel: CancellationToken,
    ) -> RunResult {
        self.run_inner(task, system_instruction, cancel, None).await
    }

    /// Run a task, emitting one [`RunEvent`] per state transition.
    pub async fn run_with_events(
        &self,
        task: &str,
        system_instruction: Option<&str>,
        events: UnboundedSender<RunEvent>,
    ) -> RunResult {
        self.run_inner(task, system_instruction, self.cancel.child_token(), Some(&events))
            .await
    }

    async fn run_inner(
        &self,
        task: &str,
        system_instruction: Option<&str>,
        cancel: CancellationToken,
        events: Option<&UnboundedSender<RunEvent>>,
    ) -> RunResult {
        let started = Instant::now();
        let started_at = chrono::Utc::now();

        let mut conversation = Conversation::seed(system_instruction, task);
        emit(
            events,
            RunEvent::Seeded {
                messages: conversation.len(),
            },
        );

        let definitions = self.tools.definitions();
        let mut steps = 0usize;

        let result = 'run: loop {
            // Transition boundary: cancellation, then budgets.
            if cancel.is_cancelled() {
                break RunResult::Error {
                    kind: RunErrorKind::Cancelled,
                    detail: "run cancelled before next model call".to_string(),
                };
            }
            if steps >= self.limits.max_steps {
                info!(steps, "step budget exhausted");
                break RunResult::Exhausted {
                    conversation,
                    steps,
                };
            }
            if let Some(deadline) = self.limits.deadline {
                if started.elapsed() >= deadline {
                    info!(steps, ?deadline, "run deadline reached");
                    break RunResult::Exhausted {
                        conversation,
                        steps,
                    };
                }
            }

            emit(events, RunEvent::ModelCalling { step: steps + 1 });
            let reply = match self
                .call_model(&conversation, &definitions, started, &cancel, events)
                .await
            {
                Ok(reply) => reply,
                Err(abort) => break abort.into_result(),
            };
            steps += 1;
            emit(
                events,
                RunEvent::AssistantReply {
                    step: steps,
                    tool_calls: reply.tool_calls.len(),
                },
            );

            // The wire path rejects this shape in `ModelReply::from_wire`,
            // but a custom client can hand one over directly.
            if reply.tool_calls.is_empty() && reply.content.as_deref().unwrap_or("").is_empty() {
                break RunResult::Error {
                    kind: RunErrorKind::MalformedReply,
                    detail: "reply has neither content nor tool calls".to_string(),
                };
            }

            if reply.is_final() {
                let content = reply.content.unwrap_or_default();
                if let Err(e) = conversation.push_assistant(&content) {
                    break RunResult::Error {
                        kind: RunErrorKind::MalformedReply,
                        detail: e.to_string(),
                    };
                }
                break RunResult::FinalAnswer {
                    content,
                    conversation,
                    steps,
                };
            }

            // TOOL_DISPATCH
            let calls = reply.tool_calls.clone();
            if let Err(e) = conversation.push_assistant_tool_calls(reply.content, &calls) {
                break RunResult::Error {
                    kind: RunErrorKind::MalformedReply,
                    detail: e.to_string(),
                };
            }
            if cancel.is_cancelled() {
                break RunResult::Error {
                    kind: RunErrorKind::Cancelled,
                    detail: "run cancelled before tool dispatch".to_string(),
                };
            }
            for tc in &calls {
                emit(
                    events,
                    RunEvent::ToolDispatched {
                        call_id: tc.id.clone(),
                        name: tc.function.name.clone(),
                    },
                );
            }

            // Calls within a batch are independent; execute them concurrently
            // and join, then append in the original request order.
            let outcomes = join_all(calls.iter().map(|tc| self.execute_call(tc))).await;
            for (tc, (content, ok)) in calls.iter().zip(outcomes) {
                emit(
                    events,
                    RunEvent::ToolResolved {
                        call_id: tc.id.clone(),
                        ok,
                    },
                );
                if let Err(e) = conversation.push_tool_result(&tc.id, content) {
                    break 'run RunResult::Error {
                        kind: RunErrorKind::MalformedReply,
                        detail: e.to_string(),
                    };
                }
            }
        };

        let outcome = result.kind();
        emit(events, RunEvent::Finished { outcome });
        info!(
            started_at = %started_at.to_rfc3339(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?outcome,
            "run finished"
        );
        result
    }

    /// One AWAITING_MODEL visit: call the model with a per-call timeout and
    /// bounded retry for transient failures. Retries never consume reasoning
    /// steps but do respect the run deadline.
    async fn call_model(
        &self,
        conversation: &Conversation,
        definitions: &[ToolDefinition],
        started: Instant,
        cancel: &CancellationToken,
        events: Option<&UnboundedSender<RunEvent>>,
    ) -> Result<ModelReply, Abort> {
        let mut attempt: u32 = 0;
        loop {
            let call = self.client.complete(conversation.messages(), definitions);
            let outcome = match tokio::time::timeout(self.limits.model_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ModelError::unavailable(format!(
                    "model call timed out after {:?}",
                    self.limits.model_timeout
                ))),
            };

            match outcome {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let mut delay = self.retry.delay_for(attempt);
                    if let ModelError::RateLimited {
                        retry_after: Some(wait),
                    } = &err
                    {
                        delay = delay.max(*wait);
                    }
                    if let Some(deadline) = self.limits.deadline {
                        if started.elapsed() + delay >= deadline {
                            warn!(error = %err, "run deadline leaves no room to retry");
                            return Err(Abort::Model(err));
                        }
                    }
                    attempt += 1;
                    warn!(error = %err, attempt, ?delay, "transient model failure, backing off");
                    emit(events, RunEvent::Retrying { attempt, delay });
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            return Err(Abort::Cancelled("run cancelled during retry backoff"));
                        }
                    }
                }
                Err(err) => return Err(Abort::Model(err)),
            }
        }
    }

    /// Execute one tool call. Every failure shape — unparseable arguments,
    /// unknown tool, invalid arguments, execution error, timeout — becomes
    /// result content; the bool reports success for event consumers.
    async fn execute_call(&self, tc: &ToolCall) -> (String, bool) {
        let name = &tc.function.name;
        let args = match parse_arguments(&tc.function.arguments) {
            Ok(args) => args,
            Err(detail) => {
                warn!(tool = %name, call_id = %tc.id, %detail, "unparseable tool arguments");
                return (
                    format!("Error: arguments for '{name}' are not a JSON object: {detail}"),
                    false,
                );
            }
        };

        debug!(tool = %name, call_id = %tc.id, "executing tool call");
        let invocation = self.tools.invoke(name, args);
        let outcome = match self.limits.tool_timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout {
                    tool: name.clone(),
                    elapsed: limit,
                }),
            },
            None => invocation.await,
        };

        match outcome {
            Ok(value) => (render_result(value), true),
            Err(err) => (format!("Error: {err}"), false),
        }
    }
}

/// Parse the JSON-encoded argument bag of a tool call.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(format!("expected an object, got {other}")),
        Err(e) => Err(e.to_string()),
    }
}

/// Render a tool result value as tool-result message content.
fn render_result(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn emit(events: Option<&UnboundedSender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        // A dropped receiver just means nobody is watching.
        let _ = tx.send(event);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
