//! `set-resource`: publish a value for later actions.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::action::Task;
use crate::context::FlowContext;

/// Stores `value` under `key` in the flow's shared resources.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetResource {
    key: String,
    value: Value,
}

impl Task for SetResource {
    fn run(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        info!("Publishing shared resource '{}'", self.key);
        ctx.shared().set(self.key.clone(), self.value.clone());
        Ok(true)
    }

    fn check(&mut self, ctx: &FlowContext) -> anyhow::Result<bool> {
        Ok(ctx.shared().get(&self.key).as_ref() == Some(&self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_structured_values() {
        let ctx = FlowContext::new(std::env::temp_dir());
        let mut task: SetResource =
            serde_yaml::from_str("key: release\nvalue: { tag: v1, build: 42 }").unwrap();

        assert!(task.run(&ctx).unwrap());
        assert!(task.check(&ctx).unwrap());
        assert_eq!(
            ctx.shared().get("release"),
            Some(serde_json::json!({ "tag": "v1", "build": 42 }))
        );
    }

    #[test]
    fn key_is_required() {
        assert!(serde_yaml::from_str::<SetResource>("value: 1").is_err());
    }
}
