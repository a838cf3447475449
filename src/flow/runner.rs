//! The top-level flow: jobs run in declaration order.

use std::time::Duration;

use tracing::{error, info};

use crate::context::FlowContext;
use crate::error::Result;
use crate::flow::group::default_max_workers;
use crate::flow::job::Job;
use crate::flow::summary::{self, FlowReport};
use crate::state::{State, StateMachine};

/// A complete, executable flow.
///
/// Owns its jobs and the run context. Executes jobs strictly in order and
/// stops at the first job that does not succeed.
#[derive(Debug)]
pub struct Flow {
    name: String,
    jobs: Vec<Job>,
    context: FlowContext,
    machine: StateMachine,
    max_workers: usize,
}

impl Flow {
    /// Assemble a flow; every action receives its positional id.
    pub fn new(name: impl Into<String>, jobs: Vec<Job>, context: FlowContext) -> Self {
        let name = name.into();
        let mut jobs = jobs;
        for (i, job) in jobs.iter_mut().enumerate() {
            job.assign_ids(i + 1);
        }
        Self {
            machine: StateMachine::new(format!("Flow: {}", name)),
            name,
            jobs,
            context,
            max_workers: default_max_workers(),
        }
    }

    /// Bound concurrent actions per group.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Flow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Jobs in execution order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Run context.
    pub fn context(&self) -> &FlowContext {
        &self.context
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.machine.state()
    }

    /// Lifecycle and timing.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Wall time of the run so far.
    pub fn elapsed(&self) -> Duration {
        self.machine.elapsed()
    }

    /// Worker bound applied to each group.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// First job that ended in failure.
    pub fn failed_job(&self) -> Option<&Job> {
        self.jobs.iter().find(|job| job.state() == State::Failure)
    }

    /// Run every job in order.
    ///
    /// Creates the workspace first. Returns the terminal state; action
    /// failures are reported through the state.
    ///
    /// # Errors
    ///
    /// Executing the same flow twice, or a workspace that cannot be created.
    pub fn execute(&mut self) -> Result<State> {
        self.machine.start()?;
        if let Err(e) = self.context.ensure_workspace() {
            error!("[Flow: {}] Cannot prepare workspace: {}", self.name, e);
            self.machine.fail()?;
            return Err(e);
        }
        info!(
            "[Flow: {}] Starting execution of {} job(s)...",
            self.name,
            self.jobs.len()
        );

        let total = self.jobs.len();
        for (i, job) in self.jobs.iter_mut().enumerate() {
            info!("[Flow: {}] [Job {}/{}] {}", self.name, i + 1, total, job.name());
            match job.execute_with(&self.context, self.max_workers) {
                Ok(State::Success) => {}
                Ok(state) => {
                    error!(
                        "[Flow: {}] Job '{}' ended in {}, stopping flow.",
                        self.name,
                        job.name(),
                        state
                    );
                    self.machine.fail()?;
                    return Ok(self.machine.state());
                }
                Err(e) => {
                    error!("[Flow: {}] Job '{}' errored: {}", self.name, job.name(), e);
                    self.machine.fail()?;
                    return Ok(self.machine.state());
                }
            }
        }

        info!(
            "[Flow: {}] Completed in {:.5}s",
            self.name,
            self.elapsed().as_secs_f64()
        );
        self.machine.complete()?;
        Ok(self.machine.state())
    }

    /// Human-readable summary lines, produced lazily.
    pub fn summary(&self) -> impl Iterator<Item = String> + '_ {
        summary::lines(self)
    }

    /// Structured report of the run.
    pub fn report(&self) -> FlowReport {
        FlowReport::from_flow(self)
    }
}
