//! State enum, transitions, and the timed state machine.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::error::{FlowError, Result};

/// Execution state of an action, group, job, or flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Not started yet.
    #[default]
    Pending,

    /// Currently executing.
    Running,

    /// Finished successfully.
    Success,

    /// Finished with a failure.
    Failure,
}

impl State {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Success | State::Failure)
    }

    /// Get a display character for this state.
    pub fn display_char(&self) -> char {
        match self {
            State::Pending => '○',
            State::Running => '◉',
            State::Success => '✓',
            State::Failure => '✗',
        }
    }

    /// State reached by applying `transition`, if the move is allowed.
    pub fn next(self, transition: Transition) -> Option<State> {
        match (self, transition) {
            (State::Pending, Transition::Start) => Some(State::Running),
            (State::Running, Transition::Complete) => Some(State::Success),
            (State::Running, Transition::Fail) => Some(State::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Pending => "pending",
            State::Running => "running",
            State::Success => "success",
            State::Failure => "failure",
        };
        write!(f, "{}", s)
    }
}

/// Named transitions between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// pending -> running
    Start,
    /// running -> success
    Complete,
    /// running -> failure
    Fail,
}

impl Transition {
    fn target(self) -> State {
        match self {
            Transition::Start => State::Running,
            Transition::Complete => State::Success,
            Transition::Fail => State::Failure,
        }
    }
}

/// A state plus the wall-clock and monotonic timing of the running phase.
#[derive(Debug, Clone)]
pub struct StateMachine {
    entity: String,
    state: State,
    started_at: Option<DateTime<Local>>,
    ended_at: Option<DateTime<Local>>,
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl StateMachine {
    /// Create a machine in `pending` for the named entity (e.g. `"Job: deploy"`).
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            state: State::Pending,
            started_at: None,
            ended_at: None,
            started: None,
            elapsed: None,
        }
    }

    /// Label used in logs and errors.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// pending -> running.
    pub fn start(&mut self) -> Result<()> {
        self.apply(Transition::Start)
    }

    /// running -> success.
    pub fn complete(&mut self) -> Result<()> {
        self.apply(Transition::Complete)
    }

    /// running -> failure.
    pub fn fail(&mut self) -> Result<()> {
        self.apply(Transition::Fail)
    }

    /// Complete or fail depending on `success`.
    pub fn finish(&mut self, success: bool) -> Result<()> {
        if success {
            self.complete()
        } else {
            self.fail()
        }
    }

    /// Apply a transition, rejecting moves the state graph does not allow.
    pub fn apply(&mut self, transition: Transition) -> Result<()> {
        let next = self
            .state
            .next(transition)
            .ok_or_else(|| FlowError::InvalidTransition {
                entity: self.entity.clone(),
                from: self.state,
                to: transition.target(),
            })?;

        match next {
            State::Running => {
                self.started_at = Some(Local::now());
                self.started = Some(Instant::now());
                debug!("[{}] Started execution", self.entity);
            }
            _ => {
                self.ended_at = Some(Local::now());
                self.elapsed = self.started.map(|s| s.elapsed());
                debug!(
                    "[{}] Finished with {} in {:.5}s",
                    self.entity,
                    next,
                    self.elapsed().as_secs_f64()
                );
            }
        }

        self.state = next;
        Ok(())
    }

    /// Time spent running: live while running, fixed once terminal, zero before start.
    pub fn elapsed(&self) -> Duration {
        match (self.elapsed, self.started) {
            (Some(elapsed), _) => elapsed,
            (None, Some(started)) => started.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    /// Wall-clock time the entity started running.
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Wall-clock time the entity reached a terminal state.
    pub fn ended_at(&self) -> Option<DateTime<Local>> {
        self.ended_at
    }
}
