//! Actionflow - declarative task orchestration.
//!
//! A flow is a YAML document of named jobs, each an ordered list of steps
//! naming registered actions. Jobs run in order. Within a job, a run of
//! concurrent steps plus the sequential step that follows it forms one group,
//! executed on a bounded worker pool; a sequential step not preceded by
//! concurrent steps is a group on its own.
//!
//! # Modules
//!
//! - [`action`] - Actions, their policy, retry loop and parameters
//! - [`actions`] - Built-in action kinds (command, download, checkout, ...)
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Flow documents, interpolation and settings
//! - [`context`] - Workspace, environment and shared resources of a run
//! - [`error`] - Error types and result aliases
//! - [`flow`] - Groups, jobs, flows and run summaries
//! - [`process`] - PID-file guard against concurrent runs
//! - [`registry`] - Action name to constructor mapping
//! - [`shell`] - Shell command execution
//! - [`state`] - Execution state machine
//! - [`ui`] - Terminal styling and report rendering
//!
//! # Example
//!
//! ```
//! use actionflow::config::{substitute, InterpolationContext};
//!
//! let ctx = InterpolationContext::from_process([("REGION".to_string(), "eu".to_string())]);
//! assert_eq!(substitute("deploy ${REGION} ${UNSET}", &ctx), "deploy eu ${UNSET}");
//! ```
//!
//! For file-based flow loading, see the integration tests.

pub mod action;
pub mod actions;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod flow;
pub mod process;
pub mod registry;
pub mod shell;
pub mod state;
pub mod ui;

pub use error::{FlowError, Result};
