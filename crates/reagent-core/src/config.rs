//! Run configuration — model settings, retry policy, and budgets.
//!
//! Plain serde structs with defaults; there is no file loader because the
//! loop has no caller-facing surface beyond `run()`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─────────────────────────────────────────────
// Model settings
// ─────────────────────────────────────────────

/// Sampling settings passed through to the upstream model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

// ─────────────────────────────────────────────
// Retry policy
// ─────────────────────────────────────────────

/// Bounded retry with exponential backoff for transient upstream failures.
///
/// Applies to `Unavailable` and `RateLimited` model errors only; malformed
/// replies are never retried.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 = fail on first error).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (typically 2.0).
    pub multiplier: f64,
    /// Whether to spread delays to avoid thundering herd.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy with the given retry count and default backoff.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Backoff delay for a given attempt number (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter {
            // Deterministic spread keyed on the attempt number; avoids a
            // rand dependency for a single call site.
            let factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

// ─────────────────────────────────────────────
// Run limits
// ─────────────────────────────────────────────

/// Budgets for a single run of the reasoning loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunLimits {
    /// Maximum model calls per run. One step may fan out to several tool
    /// calls; the counter still advances by one.
    pub max_steps: usize,
    /// Timeout applied to each model call. On expiry the call is treated as
    /// an upstream-unavailable failure.
    pub model_timeout: Duration,
    /// Optional timeout applied to each tool execution.
    pub tool_timeout: Option<Duration>,
    /// Optional wall-clock budget for the whole run, including retries.
    pub deadline: Option<Duration>,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_steps: 20,
            model_timeout: Duration::from_secs(120),
            tool_timeout: None,
            deadline: None,
        }
    }
}

impl RunLimits {
    /// Limits with the given step budget and defaults elsewhere.
    pub fn with_max_steps(max_steps: usize) -> Self {
        Self {
            max_steps,
            ..Default::default()
        }
    }
}
