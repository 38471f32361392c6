//! The `ModelClient` trait — the orchestrator's only view of the upstream.

use async_trait::async_trait;
use reagent_core::error::ModelError;
use reagent_core::types::{Message, ModelReply, ToolDefinition};

/// Trait that every model backend must implement.
///
/// The client marshals the conversation to the upstream model and unmarshals
/// its structured response. It performs no interpretation of tool semantics
/// and no internal retries — retry policy belongs to the orchestrator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the full ordered conversation plus the available tool
    /// descriptors, and return the model's reply.
    ///
    /// # Errors
    /// * [`ModelError::Unavailable`] — network or connection failure.
    /// * [`ModelError::RateLimited`] — the upstream asked us to back off.
    /// * [`ModelError::Malformed`] — the response cannot be parsed into a
    ///   valid [`ModelReply`].
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ModelError>;

    /// The model identifier this client targets (for logging).
    fn model(&self) -> &str;
}
