//! `command`: run shell commands.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::action::{ActionParams, Task};
use crate::actions::resolve_path;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::shell::{self, CommandOptions, OutputLine};

/// Runs `command`, or each entry of `commands` in order, stopping at the
/// first non-zero exit.
///
/// ```yaml
/// - name: command
///   with:
///     commands: ["make build", "make test"]
///     cwd: src
///     env: { PROFILE: release }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandAction {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    commands: Vec<String>,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    timeout: Option<u64>,
}

impl CommandAction {
    /// Build from step parameters; at least one command is required.
    pub fn from_params(params: &ActionParams) -> Result<Box<dyn Task>> {
        let action: CommandAction = params.parse()?;
        if action.scripts().next().is_none() {
            return Err(FlowError::InvalidParams {
                action: params.action().to_string(),
                message: "one of 'command' or 'commands' is required".to_string(),
            });
        }
        Ok(Box::new(action))
    }

    fn scripts(&self) -> impl Iterator<Item = &str> {
        self.command
            .iter()
            .chain(self.commands.iter())
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    fn options(&self, ctx: &FlowContext) -> CommandOptions {
        let cwd = match &self.cwd {
            Some(cwd) => resolve_path(ctx, cwd),
            None => ctx.workspace().to_path_buf(),
        };
        let mut env = ctx.env().clone();
        env.extend(self.env.clone());
        CommandOptions {
            cwd: Some(cwd),
            env,
            capture_stdout: true,
            capture_stderr: true,
            timeout: self.timeout,
        }
    }
}

impl Task for CommandAction {
    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        let options = self.options(ctx);
        let log_line = |line: OutputLine| match line {
            OutputLine::Stdout(l) => debug!("  | {}", l),
            OutputLine::Stderr(l) => debug!("  ! {}", l),
        };

        for script in self.scripts() {
            info!("Running: {}", script);
            let result = shell::execute_streaming(script, &options, &log_line)?;
            if result.timed_out {
                warn!("Command timed out after {:?}: {}", result.duration, script);
                return Ok(false);
            }
            if !result.success {
                warn!(
                    "Command exited with {:?}: {}",
                    result.exit_code, script
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build(params: ActionParams) -> Result<Box<dyn Task>> {
        CommandAction::from_params(&params)
    }

    #[test]
    fn requires_a_command() {
        let err = build(ActionParams::new("command")).err().unwrap();
        assert!(err.to_string().contains("command"));
    }

    #[test]
    fn rejects_unknown_options() {
        let params = ActionParams::new("command")
            .with_option("command", "true")
            .with_option("shell", "zsh");
        assert!(build(params).is_err());
    }

    #[test]
    fn success_runs_in_workspace() {
        let temp = TempDir::new().unwrap();
        let ctx = FlowContext::new(temp.path());
        let mut task = build(
            ActionParams::new("command").with_option("command", "touch created.txt"),
        )
        .unwrap();

        assert!(task.run(&ctx).unwrap());
        assert!(temp.path().join("created.txt").exists());
    }

    #[test]
    fn stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let ctx = FlowContext::new(temp.path());
        let commands = serde_yaml::to_value(vec!["exit 2", "touch never.txt"]).unwrap();
        let mut task = build(ActionParams::new("command").with_option("commands", commands))
            .unwrap();

        assert!(!task.run(&ctx).unwrap());
        assert!(!temp.path().join("never.txt").exists());
    }

    #[test]
    fn flow_and_step_env_are_visible() {
        let temp = TempDir::new().unwrap();
        let ctx = FlowContext::new(temp.path()).with_env(HashMap::from([
            ("STAGE".to_string(), "prod".to_string()),
        ]));
        let env = serde_yaml::to_value(HashMap::from([("REGION", "eu")])).unwrap();
        let mut task = build(
            ActionParams::new("command")
                .with_option("command", "test \"$STAGE-$REGION\" = prod-eu")
                .with_option("env", env),
        )
        .unwrap();

        assert!(task.run(&ctx).unwrap());
    }

    #[test]
    fn relative_cwd_resolves_against_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let ctx = FlowContext::new(temp.path());
        let mut task = build(
            ActionParams::new("command")
                .with_option("command", "touch here.txt")
                .with_option("cwd", "sub"),
        )
        .unwrap();

        assert!(task.run(&ctx).unwrap());
        assert!(temp.path().join("sub/here.txt").exists());
    }
}
