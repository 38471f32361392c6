//! Tool specifications — name, description, schema, and execution capability.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use reagent_core::types::ToolDefinition;

use super::schema::ParamSchema;

// ─────────────────────────────────────────────
// Handler trait
// ─────────────────────────────────────────────

/// The execution capability behind a tool.
///
/// Receives an argument bag already validated against the tool's schema and
/// returns a result value. Side effects (HTTP calls, endpoint addresses,
/// auth) live entirely inside the handler; the loop never sees them.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value>;
}

// ─────────────────────────────────────────────
// ToolSpec
// ─────────────────────────────────────────────

/// Explicit declaration of one tool.
///
/// The description serves model-side selection; the schema gates every
/// invocation before the handler runs.
#[derive(Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    schema: ParamSchema,
    handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

impl ToolSpec {
    /// Declare a new tool.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParamSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        ToolSpec {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    /// Unique name the model uses to call this tool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description shown to the model.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The declared parameter schema.
    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    /// The execution capability.
    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }

    /// Build the definition sent to the model.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.schema.to_json_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::ParamType;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value> {
            Ok(args.get("text").cloned().unwrap_or(Value::Null))
        }
    }

    #[test]
    fn test_to_definition() {
        let spec = ToolSpec::new(
            "echo",
            "Echoes back the input",
            ParamSchema::new().required("text", ParamType::String, "Text to echo"),
            Arc::new(EchoHandler),
        );

        let def = spec.to_definition();
        assert_eq!(def.tool_type, "function");
        assert_eq!(def.function.name, "echo");
        assert_eq!(def.function.description, "Echoes back the input");
        assert_eq!(
            def.function.parameters["properties"]["text"]["type"],
            "string"
        );
        assert_eq!(def.function.parameters["required"], json!(["text"]));
    }
}
