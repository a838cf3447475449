//! `actionflow actions`: list the registered action kinds.

use crate::error::Result;
use crate::registry::ActionRegistry;

use super::dispatcher::{Command, CommandResult, Console};

/// The actions command implementation.
pub struct ActionsCommand<'a> {
    registry: &'a ActionRegistry,
}

impl<'a> ActionsCommand<'a> {
    /// Create a new actions command.
    pub fn new(registry: &'a ActionRegistry) -> Self {
        Self { registry }
    }
}

impl Command for ActionsCommand<'_> {
    fn execute(&self, console: &mut Console<'_>) -> Result<CommandResult> {
        console.line(console.theme.format_header("Actions"))?;
        for name in self.registry.names() {
            console.line(format!("  {}", console.theme.highlight.apply_to(name)))?;
        }
        Ok(CommandResult::success())
    }
}
