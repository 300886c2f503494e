//! Config validation logic.
//! Rejects settings that would make a run meaningless or unbounded.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};

use crate::errors::SupervisorError;

use super::types::Config;

/// Longest per-step wait accepted from config or flags.
pub const MAX_STEP_DELAY: Duration = Duration::from_secs(60 * 60);

impl Config {
    /// Validate step count and delay bounds.
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(invalid("steps must be at least 1".into()));
        }

        let bound = self.delay.upper_bound();
        if bound > MAX_STEP_DELAY {
            return Err(invalid(format!(
                "step delay {}ms exceeds the {}s limit",
                bound.as_millis(),
                MAX_STEP_DELAY.as_secs()
            )));
        }

        info!(
            steps = self.steps,
            delay = ?self.delay,
            mode = %self.mode,
            log_file = %self
                .log_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".into()),
            "Config validated"
        );
        Ok(())
    }
}

fn invalid(msg: String) -> anyhow::Error {
    error!("{msg}");
    SupervisorError::InvalidConfig(msg).into()
}
