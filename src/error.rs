//! Error types for actionflow operations.
//!
//! This module defines [`FlowError`], the primary error type used throughout
//! the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Declared failures (an action returning `false`) are not errors: they are
//!   handled by the retry / continue-on-error policy and end up as a terminal
//!   [`State`](crate::state::State).
//! - Unexpected errors raised by a task surface as [`FlowError::ActionError`]
//!   and force the owning action into `failure`.
//! - Configuration errors ([`FlowError::ActionNotFound`], parse errors) are
//!   fatal at load time, before anything runs.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for actionflow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A step references an action name nobody registered.
    #[error("Action not found: '{name}'")]
    ActionNotFound { name: String },

    /// An action name was registered twice.
    #[error("Action '{name}' is already registered")]
    DuplicateAction { name: String },

    /// A state machine was asked for a transition it does not allow.
    #[error("Invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: crate::state::State,
        to: crate::state::State,
    },

    /// Declarative parameters do not fit the action kind.
    #[error("Invalid parameters for action '{action}': {message}")]
    InvalidParams { action: String, message: String },

    /// Flow document not found at the given path.
    #[error("Flow file not found: {path}")]
    FlowNotFound { path: PathBuf },

    /// Flow document could not be parsed.
    #[error("Failed to parse flow: {message}")]
    FlowParseError { message: String },

    /// A task raised an unexpected error.
    #[error("Action '{action}' errored: {message}")]
    ActionError { action: String, message: String },

    /// Shell command could not be spawned or waited on.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Another run holds the PID file.
    #[error("Another run is in progress (pid file: {pid_file})")]
    AlreadyRunning { pid_file: PathBuf },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for actionflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;
