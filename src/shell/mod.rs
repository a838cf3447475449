//! Shell and external program execution.

pub mod command;

pub use command::{
    execute, execute_check, execute_program, execute_streaming, CommandOptions, CommandResult,
    OutputLine,
};
