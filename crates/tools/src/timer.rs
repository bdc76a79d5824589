//! Countdown timer tool.

use async_trait::async_trait;
use jarvis_core::error::ToolError;
use jarvis_core::session::Session;
use jarvis_core::tool::{Tool, ToolArgs, ToolParameter};
use std::time::Duration;
use tracing::debug;

/// Waits for a number of seconds, ticking once per second.
pub struct CountdownTool {
    max_seconds: u64,
    tick: Duration,
}

impl CountdownTool {
    pub fn new(max_seconds: u64) -> Self {
        Self {
            max_seconds,
            tick: Duration::from_secs(1),
        }
    }

    /// Shorten the tick (tests).
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

#[async_trait]
impl Tool for CountdownTool {
    fn name(&self) -> &str {
        "countdown_timer"
    }

    fn description(&self) -> &str {
        "Starts a countdown timer for the specified number of seconds and reports when it finishes."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::integer("seconds", "How long to count down")]
    }

    async fn execute(&self, _session: &mut Session, args: ToolArgs) -> Result<String, ToolError> {
        let seconds = args.integer("seconds")?;
        if seconds < 1 {
            return Err(ToolError::rejected("The countdown needs at least 1 second."));
        }
        let seconds = seconds as u64;
        if seconds > self.max_seconds {
            return Err(ToolError::rejected(format!(
                "A countdown can last at most {} seconds.",
                self.max_seconds
            )));
        }

        for remaining in (1..=seconds).rev() {
            debug!(remaining, "Countdown tick");
            tokio::time::sleep(self.tick).await;
        }
        Ok(format!("Countdown of {seconds} seconds completed successfully."))
    }
}
