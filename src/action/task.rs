//! The contract every action kind implements.

use crate::action::ActionPolicy;
use crate::context::FlowContext;

/// Work performed by one kind of action.
///
/// The engine drives a task through the retry loop in
/// [`Action::run`](crate::action::Action::run): `check` (when skipping),
/// `pre_process`, `run`, `post_process`, `check`. Returning `Ok(false)` from
/// `run` is a declared failure and is retried; returning `Err` is an
/// unexpected error and aborts the action immediately.
pub trait Task: Send {
    /// Primary operation. `Ok(true)` on success, `Ok(false)` on a declared failure.
    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool>;

    /// Readiness / post-condition check.
    fn check(&mut self, _ctx: &FlowContext) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Hook run before every attempt.
    fn pre_process(&mut self, _ctx: &FlowContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Hook run after a successful (or masked) attempt.
    fn post_process(&mut self, _ctx: &FlowContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Policy used when the declaration does not override a field.
    fn default_policy(&self) -> ActionPolicy {
        ActionPolicy::default()
    }
}
