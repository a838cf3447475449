//! `download`: fetch a URL to a file.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::action::{ActionPolicy, Task};
use crate::actions::resolve_path;
use crate::context::FlowContext;

/// Shared-resource key holding the path of the last downloaded file.
pub const DOWNLOAD_FILEPATH_KEY: &str = "download.filepath";

/// Downloads `url` to `filepath`.
///
/// Skipped by default when the file already exists. A non-2xx response is a
/// declared failure (retried); a transport error aborts the action and
/// leaves no file behind.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Download {
    url: String,
    filepath: PathBuf,
    #[serde(default = "default_timeout")]
    timeout: u64,
}

fn default_timeout() -> u64 {
    60
}

impl Download {
    fn target(&self, ctx: &FlowContext) -> PathBuf {
        resolve_path(ctx, &self.filepath)
    }
}

impl Task for Download {
    fn pre_process(&mut self, ctx: &FlowContext) -> anyhow::Result<()> {
        let target = self.target(ctx);
        if target.exists() {
            warn!("File already exists, removing: {}", target.display());
            fs::remove_file(&target)
                .with_context(|| format!("Failed to remove {}", target.display()))?;
        }
        Ok(())
    }

    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        let target = self.target(ctx);
        info!("Downloading from {} with timeout {}s", self.url, self.timeout);

        let client = Client::builder()
            .user_agent("actionflow")
            .timeout(Duration::from_secs(self.timeout))
            .build()
            .context("Failed to build HTTP client")?;
        let mut response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to fetch {}", self.url))?;

        if !response.status().is_success() {
            warn!("HTTP {} fetching {}", response.status(), self.url);
            return Ok(false);
        }

        // Stream into a sibling temp file; only a complete body lands on `target`.
        let dir = target.parent().unwrap_or_else(|| ctx.workspace());
        fs::create_dir_all(dir)?;
        let mut partial = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
        let bytes = response
            .copy_to(&mut partial)
            .with_context(|| format!("Failed to download {}", self.url))?;
        partial
            .persist(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        info!("File downloaded to {} ({} bytes)", target.display(), bytes);
        Ok(true)
    }

    fn post_process(&mut self, ctx: &FlowContext) -> anyhow::Result<()> {
        ctx.shared().set(
            DOWNLOAD_FILEPATH_KEY,
            self.target(ctx).display().to_string(),
        );
        Ok(())
    }

    fn check(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        Ok(self.target(ctx).exists())
    }

    fn default_policy(&self) -> ActionPolicy {
        ActionPolicy {
            skip: true,
            ..ActionPolicy::default()
        }
    }
}
