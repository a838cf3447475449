//! Status command implementation.
//!
//! The `actionflow status` command reports whether a run holds the PID file.

use crate::config::Settings;
use crate::error::Result;
use crate::process::running_pid;

use super::dispatcher::{Command, CommandResult, Console};

/// The status command implementation.
pub struct StatusCommand<'a> {
    settings: &'a Settings,
}

impl<'a> StatusCommand<'a> {
    /// Create a new status command.
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl Command for StatusCommand<'_> {
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult> {
        let line = match running_pid(&self.settings.pid_file) {
            Some(pid) => console
                .theme
                .format_warning(&format!("Run in progress (pid {})", pid)),
            None => console.theme.format_success("No run in progress"),
        };
        console.line(line)?;
        console.line(format!(
            "{} {}",
            console.theme.key.apply_to("PID file:"),
            self.settings.pid_file.display()
        ))?;
        console.line(format!(
            "{} {}",
            console.theme.key.apply_to("Log file:"),
            self.settings.logfile().display()
        ))?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::PidGuard;
    use crate::ui::FlowTheme;
    use tempfile::TempDir;

    fn status(settings: &Settings) -> String {
        let mut buf = Vec::new();
        let mut console = Console::new(&mut buf, FlowTheme::plain());
        let result = StatusCommand::new(settings).execute(&mut console).unwrap();
        assert!(result.success);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn idle_without_pid_file() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            pid_file: temp.path().join("af.pid"),
            ..Settings::default()
        };
        assert!(status(&settings).contains("No run in progress"));
    }

    #[test]
    fn reports_live_holder() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            pid_file: temp.path().join("af.pid"),
            ..Settings::default()
        };
        let _guard = PidGuard::acquire(&settings.pid_file).unwrap();

        let out = status(&settings);

        assert!(out.contains(&format!("pid {}", std::process::id())));
    }
}
