//! Reagent agent — the reasoning-loop core.
//!
//! This crate contains:
//! - **tools**: explicit tool specs, parameter validation, and the registry
//! - **runner**: the loop state machine (model ⇄ tools) and run results
//! - **events**: per-transition snapshots for incremental consumers

pub mod events;
pub mod runner;
pub mod tools;

pub use events::{OutcomeKind, RunEvent};
pub use runner::{RunErrorKind, RunResult, Runner};
pub use tools::{ParamSchema, ParamSpec, ParamType, ToolHandler, ToolRegistry, ToolSpec};
