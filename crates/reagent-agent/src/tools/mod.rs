//! Tools — explicit specs, parameter validation, and the registry.

pub mod registry;
pub mod schema;
pub mod spec;

pub use registry::ToolRegistry;
pub use schema::{ParamSchema, ParamSpec, ParamType};
pub use spec::{ToolHandler, ToolSpec};
