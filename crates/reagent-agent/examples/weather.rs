//! Weather agent demo: one tool, one question, a handful of loop steps.
//!
//! Point it at any chat-completions-compatible endpoint:
//!
//! ```sh
//! export REAGENT_API_BASE="https://api.openai.com/v1"
//! export REAGENT_API_KEY="sk-…"
//! export REAGENT_MODEL="gpt-4o"
//! cargo run --example weather
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use reagent_agent::{ParamSchema, ParamType, RunResult, Runner, ToolHandler, ToolRegistry, ToolSpec};
use reagent_client::HttpModelClient;
use reagent_core::RunLimits;

/// A stand-in weather lookup. A real deployment would call an HTTP API here;
/// the endpoint and credentials belong to the handler, not the loop.
struct WeatherLookup;

#[async_trait]
impl ToolHandler for WeatherLookup {
    async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value> {
        let location = args
            .get("location")
            .and_then(|v| v.as_str())
            .unwrap_or("somewhere");
        Ok(json!({
            "location": location,
            "temp_c": 18,
            "conditions": "fog rolling in from the bay",
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let api_base =
        std::env::var("REAGENT_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let api_key = std::env::var("REAGENT_API_KEY")?;
    let model = std::env::var("REAGENT_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = Arc::new(HttpModelClient::new(api_base, api_key, model));

    let mut registry = ToolRegistry::new();
    registry.register(ToolSpec::new(
        "get_weather",
        "Look up the current weather for a location",
        ParamSchema::new().required("location", ParamType::String, "City name"),
        Arc::new(WeatherLookup),
    ))?;

    let runner = Runner::new(client, Arc::new(registry))
        .with_limits(RunLimits::with_max_steps(8));

    let result = runner
        .run(
            "What's the weather in San Francisco?",
            Some("Report temperatures in Celsius."),
        )
        .await;

    match result {
        RunResult::FinalAnswer { content, steps, .. } => {
            println!("answer after {steps} step(s):\n{content}");
        }
        RunResult::Exhausted { steps, .. } => {
            println!("ran out of budget after {steps} step(s)");
        }
        RunResult::Error { kind, detail } => {
            println!("run failed ({kind:?}): {detail}");
        }
    }

    Ok(())
}
