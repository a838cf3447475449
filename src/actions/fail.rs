//! `fail`: a declared failure, useful to exercise retries.

use serde::Deserialize;
use tracing::info;

use crate::action::{ActionPolicy, Task};
use crate::context::FlowContext;

/// Fails its first `succeed_after` attempts, then succeeds.
///
/// Without `succeed_after` it never succeeds. Defaults to `retry: 3`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fail {
    #[serde(default)]
    succeed_after: Option<u32>,
    #[serde(skip)]
    attempts: u32,
}

impl Task for Fail {
    fn run(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
        self.attempts += 1;
        let succeeded = self.succeed_after.is_some_and(|n| self.attempts > n);
        info!("Attempt {} {}", self.attempts, if succeeded { "passes" } else { "fails" });
        Ok(succeeded)
    }

    fn default_policy(&self) -> ActionPolicy {
        ActionPolicy {
            retry: 3,
            ..ActionPolicy::default()
        }
    }
}
