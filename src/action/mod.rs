//! Actions: the atoms of execution.
//!
//! - [`Action`] - a named task plus its policy and state machine
//! - [`ActionPolicy`] - retry / skip / continue-on-error / sequential
//! - [`Task`] - the contract each action kind implements
//! - [`ActionParams`] - declarative `with:` parameters of a step
//!
//! # Retry loop
//!
//! While `retry > 0`: a skippable action whose `check` passes succeeds
//! without running; otherwise `pre_process` and `run` are called. Success
//! runs `post_process` and returns `check`. A declared failure is masked by
//! `continue_on_error`, else it consumes one retry. Errors abort at once.

pub mod params;
pub mod task;

pub use params::{ActionParams, PolicyOverrides};
pub use task::Task;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::state::{State, StateMachine};

/// Execution policy of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionPolicy {
    /// Remaining attempts of the primary operation.
    pub retry: u32,
    /// Bypass execution when `check` already passes.
    pub skip: bool,
    /// Report a declared failure as success.
    pub continue_on_error: bool,
    /// Synchronization point closing a concurrent batch.
    pub sequential: bool,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            retry: 1,
            skip: false,
            continue_on_error: false,
            sequential: true,
        }
    }
}

/// A unit of work owned by a job.
pub struct Action {
    name: String,
    id: String,
    policy: ActionPolicy,
    task: Box<dyn Task>,
    machine: StateMachine,
    attempts: u32,
    error: Option<String>,
}

impl Action {
    /// Create an action with an explicit policy.
    pub fn new(name: impl Into<String>, task: Box<dyn Task>, policy: ActionPolicy) -> Self {
        let name = name.into();
        Self {
            machine: StateMachine::new(format!("Action: {}", name)),
            id: name.clone(),
            name,
            policy,
            task,
            attempts: 0,
            error: None,
        }
    }

    /// Create an action using the task's default policy.
    pub fn from_task(name: impl Into<String>, task: impl Task + 'static) -> Self {
        let policy = task.default_policy();
        Self::new(name, Box::new(task), policy)
    }

    /// Replace the policy (builder style).
    pub fn with_policy(mut self, policy: ActionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registry name of the action kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trace id assigned at batch time.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Assign the trace id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Current policy; `retry` reflects the attempts still available.
    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    /// Whether this action closes a concurrent batch.
    pub fn is_sequential(&self) -> bool {
        self.policy.sequential
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// State machine with timing information.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Time spent running.
    pub fn elapsed(&self) -> Duration {
        self.machine.elapsed()
    }

    /// Number of times the primary operation was invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Why the action failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run the retry loop.
    ///
    /// Returns `Ok(false)` once retries are exhausted. Unexpected errors are
    /// logged and returned without consuming the remaining retries.
    pub fn run(&mut self, ctx: &FlowContext) -> Result<bool> {
        let outcome = self.attempt_loop(ctx);
        if let Err(ref e) = outcome {
            error!("[Action: {}] Error: {}", self.name, e);
        }
        outcome
    }

    fn attempt_loop(&mut self, ctx: &FlowContext) -> Result<bool> {
        while self.policy.retry > 0 {
            if self.policy.skip && self.task.check(ctx).map_err(|e| task_error(&self.name, e))? {
                info!("[Action: {}] already satisfied, skipping.", self.name);
                return Ok(true);
            }

            self.task
                .pre_process(ctx)
                .map_err(|e| task_error(&self.name, e))?;

            self.attempts += 1;
            if self.task.run(ctx).map_err(|e| task_error(&self.name, e))? {
                info!("[Action: {}] completed successfully.", self.name);
                self.task
                    .post_process(ctx)
                    .map_err(|e| task_error(&self.name, e))?;
                return self.task.check(ctx).map_err(|e| task_error(&self.name, e));
            }

            if self.policy.continue_on_error {
                warn!(
                    "[Action: {}] Error occurred, continuing despite failure.",
                    self.name
                );
                self.task
                    .post_process(ctx)
                    .map_err(|e| task_error(&self.name, e))?;
                return Ok(true);
            }

            self.policy.retry -= 1;
            if self.policy.retry > 0 {
                info!(
                    "[Action: {}] Retrying, attempts left: {}",
                    self.name, self.policy.retry
                );
            }
        }

        Ok(false)
    }

    /// Unified entry point used by the engine.
    ///
    /// Moves the state machine to `running`, runs the retry loop, and ends in
    /// `success` or `failure`. Errors and panics raised by the task end in
    /// `failure` instead of propagating. Only an invalid transition (an
    /// action executed twice) is returned as an error.
    pub fn execute(&mut self, ctx: &FlowContext) -> Result<State> {
        self.machine.start()?;

        let success = match panic::catch_unwind(AssertUnwindSafe(|| self.run(ctx))) {
            Ok(Ok(success)) => success,
            Ok(Err(e)) => {
                error!("Error executing action {}: {}", self.id, e);
                self.error = Some(e.to_string());
                false
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Action {} panicked: {}", self.id, message);
                self.error = Some(format!("panicked: {}", message));
                false
            }
        };

        if !success && self.error.is_none() {
            self.error = Some(if self.attempts == 0 {
                "no attempts available".to_string()
            } else {
                format!("failed after {} attempt(s)", self.attempts)
            });
        }

        self.machine.finish(success)?;
        Ok(self.machine.state())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("state", &self.machine.state())
            .field("attempts", &self.attempts)
            .finish()
    }
}

fn task_error(action: &str, error: anyhow::Error) -> FlowError {
    FlowError::ActionError {
        action: action.to_string(),
        message: format!("{:#}", error),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
