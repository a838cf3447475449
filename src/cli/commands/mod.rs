//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`actionflow run`, `actionflow status`)
//! - One action registry shared by `run`, `validate` and `actions`
//! - Output written to any [`Console`], so commands are testable in-process

pub mod actions;
pub mod completions;
pub mod dispatcher;
pub mod logs;
pub mod run;
pub mod status;
pub mod validate;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, Console};
