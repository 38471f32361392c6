//! Parameter schemas — explicit, validated declarations of tool arguments.
//!
//! Schemas are declared at registration time, never inferred from function
//! signatures. Validation reports every problem in one pass so the model can
//! correct all fields in a single retry.

use serde_json::{json, Map, Value};

use reagent_core::error::ArgumentProblems;

// ─────────────────────────────────────────────
// Parameter types
// ─────────────────────────────────────────────

/// The JSON type a parameter must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// The JSON Schema type name.
    pub fn json_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// Whether a JSON value satisfies this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

// ─────────────────────────────────────────────
// Parameter schema
// ─────────────────────────────────────────────

/// A single named parameter.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamType,
    pub required: bool,
}

/// The declared parameters of one tool.
#[derive(Clone, Debug, Default)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    /// An empty schema (tool takes no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required parameter (builder pattern).
    pub fn required(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: true,
        });
        self
    }

    /// Declare an optional parameter (builder pattern).
    pub fn optional(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: false,
        });
        self
    }

    /// The declared parameters.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate an argument bag against the schema.
    ///
    /// Collects missing required, undeclared, and mistyped fields together.
    /// Pure function of schema and args; repeated calls give identical
    /// results.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), ArgumentProblems> {
        let mut problems = ArgumentProblems::default();

        for param in &self.params {
            match args.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        problems.missing.push(param.name.clone());
                    }
                }
                Some(value) => {
                    if !param.kind.matches(value) {
                        problems
                            .mistyped
                            .push((param.name.clone(), param.kind.json_name().to_string()));
                    }
                }
            }
        }

        for key in args.keys() {
            if !self.params.iter().any(|p| &p.name == key) {
                problems.unexpected.push(key.clone());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Render the schema as the JSON Schema object sent to the model.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
