//! `checkout`: clone a git repository at a branch.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::action::{ActionPolicy, Task};
use crate::actions::resolve_path;
use crate::context::FlowContext;
use crate::shell::{self, CommandOptions};

/// Clones `repository` into `path`, checks out `branch`, and initializes
/// submodules.
///
/// Skipped by default when `path` is already a clone of `repository` on
/// `branch`. An optional `token` is injected into HTTPS clone URLs and never
/// logged.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkout {
    repository: String,
    branch: String,
    path: PathBuf,
    #[serde(default)]
    token: Option<String>,
}

static CREDENTIALS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[^@/]+@)?(.+)$").expect("credentials URL regex is valid")
});

/// Strip credentials from an HTTP(S) URL and force `https`.
///
/// Other URLs (ssh, local paths) are returned unchanged.
pub fn clean_url(url: &str) -> String {
    CREDENTIALS_URL
        .replace(url, "https://$1")
        .into_owned()
}

/// The repository name of `url`, without a `.git` suffix.
pub fn repository_name(url: &str) -> &str {
    let last = url.trim_end_matches('/').rsplit(['/', ':']).next().unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last)
}

impl Checkout {
    fn clone_url(&self) -> String {
        match &self.token {
            Some(token) if CREDENTIALS_URL.is_match(&self.repository) => {
                CREDENTIALS_URL
                    .replace(&self.repository, format!("https://{}@$1", token).as_str())
                    .into_owned()
            }
            _ => self.repository.clone(),
        }
    }

    /// Current branch and `origin` URL of the clone at `path`, if any.
    fn local_state(path: &Path) -> Option<(String, String)> {
        if !path.join(".git").exists() {
            return None;
        }
        let git = |args: &[&str]| -> Option<String> {
            let result =
                shell::execute_program("git", args, &CommandOptions::captured().in_dir(path))
                    .ok()?;
            result.success.then(|| result.stdout.trim().to_string())
        };
        let branch = git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let remote = git(&["remote", "get-url", "origin"]).unwrap_or_default();
        Some((branch, remote))
    }
}

impl Task for Checkout {
    fn check(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        let path = resolve_path(ctx, &self.path);
        let Some((branch, remote)) = Self::local_state(&path) else {
            debug!("No repository at {}", path.display());
            return Ok(false);
        };

        info!("Current branch: {}, remote: {}", branch, clean_url(&remote));
        if branch != self.branch {
            info!("Current branch is {}, expected {}", branch, self.branch);
            return Ok(false);
        }
        if !clean_url(&remote).contains(&clean_url(&self.repository)) {
            info!(
                "Current remote is {}, expected {}",
                clean_url(&remote),
                clean_url(&self.repository)
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        if self.check(ctx)? {
            info!("Repository is already checked out");
            return Ok(true);
        }

        let path = resolve_path(ctx, &self.path);
        info!(
            "Cloning {} ({}) to {}",
            repository_name(&self.repository),
            clean_url(&self.repository),
            path.display()
        );

        let path_arg = path.display().to_string();
        let clone_url = self.clone_url();
        let steps: [(&str, Vec<&str>, Option<&Path>); 3] = [
            ("clone", vec!["clone", clone_url.as_str(), path_arg.as_str()], None),
            ("checkout", vec!["checkout", self.branch.as_str()], Some(path.as_path())),
            (
                "submodule update",
                vec!["submodule", "update", "--init", "--recursive"],
                Some(path.as_path()),
            ),
        ];

        for (label, args, cwd) in steps {
            let mut options = CommandOptions::captured();
            options.cwd = cwd.map(Path::to_path_buf);
            let result = shell::execute_program("git", &args, &options)?;
            if !result.success {
                // git echoes the URL it was given; keep credentials out of logs.
                let stderr = result.stderr.replace(&clone_url, &clean_url(&clone_url));
                error!("git {} failed: {}", label, stderr.trim());
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn default_policy(&self) -> ActionPolicy {
        ActionPolicy {
            skip: true,
            ..ActionPolicy::default()
        }
    }
}
