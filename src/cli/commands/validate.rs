//! `actionflow validate`: load a flow and print its plan without running it.

use crate::cli::args::ValidateArgs;
use crate::config::{load_flow, Settings};
use crate::error::Result;
use crate::registry::ActionRegistry;

use super::dispatcher::{Command, CommandResult, Console};

/// The validate command implementation.
pub struct ValidateCommand<'a> {
    registry: &'a ActionRegistry,
    settings: &'a Settings,
    args: ValidateArgs,
}

impl<'a> ValidateCommand<'a> {
    /// Create a new validate command.
    pub fn new(registry: &'a ActionRegistry, settings: &'a Settings, args: ValidateArgs) -> Self {
        Self {
            registry,
            settings,
            args,
        }
    }
}

impl Command for ValidateCommand<'_> {
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult> {
        let flow = match load_flow(&self.args.file, self.registry, self.settings) {
            Ok(flow) => flow,
            Err(e) => {
                console.line(console.theme.format_error(&e.to_string()))?;
                return Ok(CommandResult::failure(1));
            }
        };

        console.line(console.theme.format_header(flow.name()))?;
        for (i, job) in flow.jobs().iter().enumerate() {
            console.line(format!(
                "{} {}",
                console.theme.key.apply_to(format!("Job {}:", i + 1)),
                job.name()
            ))?;
            for (g, group) in job.groups().enumerate() {
                let mode = if group.len() == 1 && group[0].is_sequential() {
                    "sequential"
                } else {
                    "concurrent"
                };
                console.line(format!(
                    "  Group {} {}",
                    g + 1,
                    console.theme.dim.apply_to(format!("({})", mode))
                ))?;
                for action in group {
                    console.line(format!("    {}", action.id()))?;
                }
            }
        }
        console.line(console.theme.format_success("Flow is valid"))?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::FlowTheme;
    use std::fs;
    use tempfile::TempDir;

    fn validate(yaml: &str) -> (CommandResult, String) {
        let temp = TempDir::new().unwrap();
        let result = validate_in(&temp, yaml);
        assert!(!temp.path().join("workspace").exists());
        result
    }

    fn validate_in(temp: &TempDir, yaml: &str) -> (CommandResult, String) {
        let file = temp.path().join("plan.yml");
        fs::write(&file, yaml).unwrap();
        let settings = Settings::default().with_home(temp.path());
        let registry = ActionRegistry::with_builtins().unwrap();

        let mut buf = Vec::new();
        let mut console = Console::new(&mut buf, FlowTheme::plain());
        let result = ValidateCommand::new(&registry, &settings, ValidateArgs { file })
            .execute(&mut console)
            .unwrap();
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn prints_groups_and_ids() {
        let (result, out) = validate(
            "jobs:\n  prep:\n    steps:\n      - name: sleep\n        with: { sequential: false }\n      - name: sleep\n        with: { sequential: false }\n      - name: sleep\n      - name: sleep\n",
        );

        assert!(result.success);
        assert!(out.contains("Job 1: prep"));
        assert!(out.contains("Group 1 (concurrent)"));
        assert!(out.contains("Group 2 (sequential)"));
        assert!(out.contains("1_prep_1_3_sleep"));
        assert!(out.contains("1_prep_2_1_sleep"));
    }

    #[test]
    fn unknown_action_fails() {
        let (result, out) = validate("jobs:\n  j:\n    steps:\n      - name: teleport\n");

        assert_eq!(result.exit_code, 1);
        assert!(out.contains("teleport"));
    }
}
