//! `sync-directories`: mirror a directory with rsync.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::action::Task;
use crate::actions::resolve_path;
use crate::context::FlowContext;
use crate::shell::{self, CommandOptions};

/// Copies the contents of `source` into `target` with `rsync -a`.
///
/// Both directories must exist. The post-condition holds once `target`
/// holds at least as many bytes as `source`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncDirectories {
    source: PathBuf,
    target: PathBuf,
}

impl SyncDirectories {
    fn paths(&self, ctx: &FlowContext) -> (PathBuf, PathBuf) {
        (
            resolve_path(ctx, &self.source),
            resolve_path(ctx, &self.target),
        )
    }
}

impl Task for SyncDirectories {
    fn pre_process(&mut self, ctx: &FlowContext) -> anyhow::Result<()> {
        let (source, target) = self.paths(ctx);
        for path in [&source, &target] {
            if !path.exists() {
                bail!("Directory not found: {}", path.display());
            }
        }
        Ok(())
    }

    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        let (source, target) = self.paths(ctx);
        // Trailing slashes: copy contents, not the directory itself.
        let source = format!("{}/", source.display());
        let target = format!("{}/", target.display());

        let result = shell::execute_program(
            "rsync",
            ["-a", source.as_str(), target.as_str()],
            &CommandOptions::captured(),
        )?;

        if result.success {
            info!("Synced {} to {}", source, target);
            debug!("{}", result.stdout);
            Ok(true)
        } else {
            error!("Error syncing {} to {}: {}", source, target, result.stderr.trim());
            Ok(false)
        }
    }

    fn check(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        let (source, target) = self.paths(ctx);
        Ok(directory_size(&target)? >= directory_size(&source)?)
    }
}

/// Total size in bytes of every regular file under `path`.
///
/// A missing directory counts as empty. Symlinks are not followed.
pub fn directory_size(path: &Path) -> std::io::Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += directory_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
