//! Process execution for actions.
//!
//! Shell snippets go through [`execute`] (`sh -c` / `cmd /C`); external
//! tools with a known argv go through [`execute_program`] so their
//! arguments are never re-parsed by a shell.

use crate::error::{FlowError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or timed out).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed after exceeding its timeout.
    pub timed_out: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,

    /// Timeout in seconds (None = no timeout).
    pub timeout: Option<u64>,
}

impl CommandOptions {
    /// Options capturing both streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }

    /// Set the working directory.
    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Execute a shell command.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    run(shell_command(command), command, options, None)
}

/// Execute a shell command, forwarding each captured line to `callback`.
pub fn execute_streaming(
    command: &str,
    options: &CommandOptions,
    callback: &(dyn Fn(OutputLine) + Sync),
) -> Result<CommandResult> {
    let options = CommandOptions {
        capture_stdout: true,
        capture_stderr: true,
        ..options.clone()
    };
    run(shell_command(command), command, &options, Some(callback))
}

/// Execute `program` with `args`, bypassing the shell.
pub fn execute_program<I, S>(program: &str, args: I, options: &CommandOptions) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    run(cmd, program, options, None)
}

/// Execute a shell command and return success/failure.
pub fn execute_check(command: &str, cwd: Option<&Path>) -> bool {
    let options = CommandOptions {
        cwd: cwd.map(Path::to_path_buf),
        ..CommandOptions::captured()
    };

    execute(command, &options)
        .map(|r| r.success)
        .unwrap_or(false)
}

fn shell_command(command: &str) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut cmd = Command::new(std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".into()));
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);
    cmd
}

fn run(
    mut cmd: Command,
    display: &str,
    options: &CommandOptions,
    callback: Option<&(dyn Fn(OutputLine) + Sync)>,
) -> Result<CommandResult> {
    let start = Instant::now();

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&options.env);
    cmd.stdin(Stdio::null());
    cmd.stdout(stdio(options.capture_stdout));
    cmd.stderr(stdio(options.capture_stderr));

    // A timed command leads its own process group so the whole tree can be killed.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if options.timeout.is_some() {
            cmd.process_group(0);
        }
    }

    let spawn_failed = |_| FlowError::CommandFailed {
        command: display.to_string(),
        code: None,
    };
    let mut child = cmd.spawn().map_err(spawn_failed)?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let deadline = options.timeout.map(|secs| start + Duration::from_secs(secs));

    let (status, stdout, stderr, timed_out) = thread::scope(|scope| {
        let out = scope.spawn(move || read_lines(stdout, OutputLine::Stdout, callback));
        let err = scope.spawn(move || read_lines(stderr, OutputLine::Stderr, callback));
        let (status, timed_out) = wait(&mut child, deadline);
        (
            status,
            out.join().unwrap_or_default(),
            err.join().unwrap_or_default(),
            timed_out,
        )
    });
    let status = status.map_err(spawn_failed)?;

    let success = status.as_ref().is_some_and(|s| s.success()) && !timed_out;
    Ok(CommandResult {
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        duration: start.elapsed(),
        success,
        timed_out,
    })
}

fn stdio(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}

/// Wait for `child`, killing it once `deadline` passes.
fn wait(
    child: &mut Child,
    deadline: Option<Instant>,
) -> (std::io::Result<Option<std::process::ExitStatus>>, bool) {
    let Some(deadline) = deadline else {
        return (child.wait().map(Some), false);
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return (Ok(Some(status)), false),
            Ok(None) if Instant::now() >= deadline => {
                kill_tree(child);
                let _ = child.wait();
                return (Ok(None), true);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return (Err(e), false),
        }
    }
}

/// Kill `child` and every process in its group, releasing the output pipes.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    match i32::try_from(child.id()) {
        // SAFETY: signalling a process group we created; no memory is touched.
        Ok(pgid) if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 => {}
        _ => {
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn read_lines<R: Read>(
    source: Option<R>,
    wrap: fn(String) -> OutputLine,
    callback: Option<&(dyn Fn(OutputLine) + Sync)>,
) -> String {
    let Some(source) = source else {
        return String::new();
    };
    let mut output = String::new();
    for line in BufReader::new(source).lines().map_while(std::result::Result::ok) {
        output.push_str(&line);
        output.push('\n');
        if let Some(callback) = callback {
            callback(wrap(line));
        }
    }
    output
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 3", &CommandOptions::captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::captured();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let result = execute("echo $MY_VAR", &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions::captured().in_dir(temp.path());

        let result = execute("pwd", &options).unwrap();

        assert!(result.success);
        let expected = temp.path().canonicalize().unwrap();
        let reported = Path::new(result.stdout.trim()).canonicalize().unwrap();
        assert_eq!(reported, expected);
    }

    #[test]
    fn execute_check_returns_bool() {
        assert!(execute_check("exit 0", None));
        assert!(!execute_check("exit 1", None));
    }

    #[test]
    fn timeout_kills_the_command() {
        let options = CommandOptions {
            timeout: Some(1),
            ..CommandOptions::captured()
        };

        let result = execute("sleep 10", &options).unwrap();

        assert!(!result.success);
        assert!(result.timed_out);
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn timeout_releases_pipes_held_by_grandchildren() {
        let options = CommandOptions {
            timeout: Some(1),
            ..CommandOptions::captured()
        };
        let started = Instant::now();

        let result = execute("sleep 6; echo done", &options).unwrap();

        assert!(result.timed_out);
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!result.stdout.contains("done"));
    }

    #[test]
    fn program_arguments_are_not_shell_parsed() {
        let result =
            execute_program("echo", ["$HOME", "a;b"], &CommandOptions::captured()).unwrap();
        assert_eq!(result.stdout.trim(), "$HOME a;b");
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = execute_program(
            "definitely-not-a-real-binary-xyz",
            Vec::<String>::new(),
            &CommandOptions::captured(),
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::CommandFailed { code: None, .. }));
    }

    #[test]
    fn execute_streaming_forwards_both_streams() {
        let lines = Mutex::new(Vec::new());
        let callback = |line: OutputLine| lines.lock().unwrap().push(line);

        let result = execute_streaming(
            "echo line1 && echo oops >&2",
            &CommandOptions::default(),
            &callback,
        )
        .unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("line1"));
        let captured = lines.lock().unwrap();
        assert!(captured.contains(&OutputLine::Stdout("line1".to_string())));
        assert!(captured.contains(&OutputLine::Stderr("oops".to_string())));
    }
}
