//! Built-in action kinds.
//!
//! | name               | does                                              |
//! |--------------------|---------------------------------------------------|
//! | `command`          | run one or more shell commands                    |
//! | `sleep`            | block for a number of seconds                     |
//! | `fail`             | fail a configurable number of times (retry demo)  |
//! | `download`         | fetch a URL to a file                             |
//! | `sync-directories` | mirror a directory with rsync                     |
//! | `checkout`         | clone a git repository at a branch                |
//! | `set-resource`     | publish a value to shared resources               |
//!
//! Relative paths in options resolve against the flow workspace.

pub mod checkout;
pub mod command;
pub mod download;
pub mod fail;
pub mod resource;
pub mod sleep;
pub mod sync;

use std::path::{Path, PathBuf};

use crate::context::FlowContext;
use crate::error::Result;
use crate::registry::ActionRegistry;

pub use checkout::Checkout;
pub use command::CommandAction;
pub use download::Download;
pub use fail::Fail;
pub use resource::SetResource;
pub use sleep::Sleep;
pub use sync::SyncDirectories;

/// Register every built-in action kind.
pub fn register_builtins(registry: &mut ActionRegistry) -> Result<()> {
    registry.register("command", CommandAction::from_params)?;
    registry.register_task::<Sleep>("sleep")?;
    registry.register_task::<Fail>("fail")?;
    registry.register_task::<Download>("download")?;
    registry.register_task::<SyncDirectories>("sync-directories")?;
    registry.register_task::<Checkout>("checkout")?;
    registry.register_task::<SetResource>("set-resource")?;
    Ok(())
}

/// Resolve `path` against the workspace unless it is absolute.
pub(crate) fn resolve_path(ctx: &FlowContext, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.workspace_path(path)
    }
}
