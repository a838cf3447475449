//! `actionflow logs`: print the tail of the log file.

use std::fs;
use std::io::ErrorKind;

use crate::cli::args::LogsArgs;
use crate::config::Settings;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult, Console};

/// The logs command implementation.
pub struct LogsCommand<'a> {
    settings: &'a Settings,
    args: LogsArgs,
}

impl<'a> LogsCommand<'a> {
    /// Create a new logs command.
    pub fn new(settings: &'a Settings, args: LogsArgs) -> Self {
        Self { settings, args }
    }
}

impl Command for LogsCommand<'_> {
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult> {
        let path = self.settings.logfile();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                console.line(
                    console
                        .theme
                        .format_warning(&format!("No log file at {}", path.display())),
                )?;
                return Ok(CommandResult::success());
            }
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(self.args.lines);
        for line in &lines[start..] {
            console.line(line)?;
        }
        Ok(CommandResult::success())
    }
}
