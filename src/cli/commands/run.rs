//! `actionflow run`: load and execute a flow.

use tracing::{error, info};

use crate::cli::args::RunArgs;
use crate::config::{load_flow, Settings};
use crate::error::{FlowError, Result};
use crate::process::PidGuard;
use crate::registry::ActionRegistry;
use crate::state::State;
use crate::ui::{render_outcome, render_report};

use super::dispatcher::{Command, CommandResult, Console};

/// Exit code when another run holds the PID file.
pub const EXIT_ALREADY_RUNNING: i32 = 2;

/// The run command implementation.
pub struct RunCommand<'a> {
    registry: &'a ActionRegistry,
    settings: &'a Settings,
    args: RunArgs,
}

impl<'a> RunCommand<'a> {
    /// Create a new run command.
    pub fn new(registry: &'a ActionRegistry, settings: &'a Settings, args: RunArgs) -> Self {
        Self {
            registry,
            settings,
            args,
        }
    }
}

impl Command for RunCommand<'_> {
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult> {
        let _guard = match PidGuard::acquire(&self.settings.pid_file) {
            Ok(guard) => guard,
            Err(e @ FlowError::AlreadyRunning { .. }) => {
                console.line(console.theme.format_error(&e.to_string()))?;
                return Ok(CommandResult::failure(EXIT_ALREADY_RUNNING));
            }
            Err(e) => return Err(e),
        };

        let mut flow = match load_flow(&self.args.file, self.registry, self.settings) {
            Ok(flow) => flow,
            Err(e) => {
                error!("Failed to load {}: {}", self.args.file.display(), e);
                console.line(console.theme.format_error(&e.to_string()))?;
                return Ok(CommandResult::failure(1));
            }
        };

        let state = flow.execute()?;
        for line in flow.summary() {
            info!("{}", line);
        }

        let report = flow.report();
        if self.args.json {
            console.line(serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?)?;
        } else {
            console.line(console.theme.format_header(&report.name))?;
            for line in render_report(&report, &console.theme) {
                console.line(line)?;
            }
            if self.args.verbose {
                for action in flow.jobs().iter().flat_map(|job| job.steps()) {
                    console.line(format!(
                        "  {} attempts={} {}",
                        action.id(),
                        action.attempts(),
                        action.error().unwrap_or("")
                    ))?;
                }
            }
            console.line(render_outcome(&report, &console.theme))?;
        }

        Ok(if state == State::Success {
            CommandResult::success()
        } else {
            CommandResult::failure(1)
        })
    }
}
