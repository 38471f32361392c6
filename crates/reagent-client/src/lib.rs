//! Reagent model client — the narrow contract to the upstream model endpoint.
//!
//! This crate contains:
//! - **traits**: the `ModelClient` trait the orchestrator calls
//! - **http_client**: `HttpModelClient` for any chat-completions-compatible API

pub mod http_client;
pub mod traits;

pub use http_client::HttpModelClient;
pub use traits::ModelClient;
