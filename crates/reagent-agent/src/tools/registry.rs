//! Tool Registry — bookkeeping, validation, and dispatch.
//!
//! The registry is populated once at setup, then shared read-only (behind an
//! `Arc`) across concurrent runs; no locking is needed for lookups.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{info, warn};

use reagent_core::error::{RegistryError, ToolError};
use reagent_core::types::ToolDefinition;

use super::spec::ToolSpec;

/// Stores tools keyed by name and dispatches invocations.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolSpec>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, spec: ToolSpec) -> Result<(), RegistryError> {
        if self.tools.contains_key(spec.name()) {
            return Err(RegistryError::Duplicate {
                name: spec.name().to_string(),
            });
        }
        info!(tool = spec.name(), "registered tool");
        self.tools.insert(spec.name().to_string(), spec);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&ToolSpec, ToolError> {
        self.tools.get(name).ok_or_else(|| ToolError::Unknown {
            name: name.to_string(),
        })
    }

    /// Whether a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools, sorted for determinism.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// The model-facing definitions of all registered tools, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Validate an argument bag against a tool's schema, then execute it.
    ///
    /// The registry itself is side-effect-free; whatever the handler does
    /// (network calls, etc.) is the handler's responsibility.
    pub async fn invoke(&self, name: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        let spec = self.resolve(name)?;

        if let Err(problems) = spec.schema().validate(&args) {
            warn!(tool = name, problems = %problems, "argument validation failed");
            return Err(ToolError::InvalidArguments {
                tool: name.to_string(),
                problems,
            });
        }

        spec.handler().execute(args).await.map_err(|e| {
            warn!(tool = name, error = %e, "tool execution failed");
            ToolError::Failed {
                tool: name.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
