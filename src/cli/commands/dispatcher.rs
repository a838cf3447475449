//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::registry::ActionRegistry;
use crate::ui::FlowTheme;

/// Where a command writes its user-facing output.
pub struct Console<'a> {
    /// Output stream (stdout in the binary, a buffer in tests).
    pub out: &'a mut dyn Write,
    /// Styles for the output.
    pub theme: FlowTheme,
}

impl<'a> Console<'a> {
    /// Create a console over `out`.
    pub fn new(out: &'a mut dyn Write, theme: FlowTheme) -> Self {
        Self { out, theme }
    }

    /// Write one line.
    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }
}

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing user-facing output to `console`.
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Process exit status; codes outside `0..=255` become 1.
    pub fn exit_status(&self) -> u8 {
        u8::try_from(self.exit_code).unwrap_or(1)
    }
}

/// Dispatches CLI commands to their implementations.
#[derive(Debug)]
pub struct CommandDispatcher {
    settings: Settings,
    registry: ActionRegistry,
}

impl CommandDispatcher {
    /// Create a dispatcher with the built-in actions.
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self::with_registry(settings, ActionRegistry::with_builtins()?))
    }

    /// Create a dispatcher with a custom registry.
    pub fn with_registry(settings: Settings, registry: ActionRegistry) -> Self {
        Self { settings, registry }
    }

    /// Settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, console: &mut Console<'_>) -> Result<CommandResult> {
        match &cli.command {
            Commands::Run(args) => {
                super::run::RunCommand::new(&self.registry, &self.settings, args.clone())
                    .execute(console)
            }
            Commands::Validate(args) => {
                super::validate::ValidateCommand::new(&self.registry, &self.settings, args.clone())
                    .execute(console)
            }
            Commands::Actions => super::actions::ActionsCommand::new(&self.registry).execute(console),
            Commands::Logs(args) => {
                super::logs::LogsCommand::new(&self.settings, args.clone()).execute(console)
            }
            Commands::Status => super::status::StatusCommand::new(&self.settings).execute(console),
            Commands::Completions(args) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(console)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(2);
        assert!(!result.success);
        assert_eq!(result.exit_code, 2);
    }

    #[test]
    fn out_of_range_codes_exit_one() {
        assert_eq!(CommandResult::failure(2).exit_status(), 2);
        assert_eq!(CommandResult::failure(256).exit_status(), 1);
        assert_eq!(CommandResult::failure(-1).exit_status(), 1);
        assert_eq!(CommandResult::success().exit_status(), 0);
    }

    #[test]
    fn dispatches_actions_listing() {
        let dispatcher = CommandDispatcher::new(Settings::default()).unwrap();
        let cli = Cli::parse_from(["actionflow", "actions"]);
        let mut buf = Vec::new();
        let mut console = Console::new(&mut buf, FlowTheme::plain());

        let result = dispatcher.dispatch(&cli, &mut console).unwrap();

        assert!(result.success);
        assert!(String::from_utf8(buf).unwrap().contains("sync-directories"));
    }
}
