//! `sleep`: block for a while.

use std::thread;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::action::Task;
use crate::context::FlowContext;

/// Blocks the worker for `seconds` (fractions allowed).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sleep {
    #[serde(default = "default_seconds")]
    seconds: f64,
}

fn default_seconds() -> f64 {
    1.0
}

impl Task for Sleep {
    fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
        let duration = Duration::try_from_secs_f64(self.seconds)
            .with_context(|| format!("invalid sleep duration: {}", self.seconds))?;
        info!("Sleeping for {:.3}s", duration.as_secs_f64());
        thread::sleep(duration);
        Ok(true)
    }
}
