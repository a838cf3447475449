//! Declarative step parameters.
//!
//! A step's `with:` mapping mixes engine policy keys (`retry`, `skip`,
//! `continue_on_error`, `sequential` and its aliases) with options specific
//! to the action kind. [`ActionParams`] splits the two.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::action::ActionPolicy;
use crate::error::{FlowError, Result};

/// Policy fields explicitly set by a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
    pub retry: Option<u32>,
    pub skip: Option<bool>,
    pub continue_on_error: Option<bool>,
    pub sequential: Option<bool>,
}

impl PolicyOverrides {
    /// Overlay the explicitly declared fields onto `base`.
    pub fn apply(&self, base: ActionPolicy) -> ActionPolicy {
        ActionPolicy {
            retry: self.retry.unwrap_or(base.retry),
            skip: self.skip.unwrap_or(base.skip),
            continue_on_error: self.continue_on_error.unwrap_or(base.continue_on_error),
            sequential: self.sequential.unwrap_or(base.sequential),
        }
    }
}

/// Parameters of one declared step.
#[derive(Debug, Clone, Default)]
pub struct ActionParams {
    action: String,
    policy: PolicyOverrides,
    options: Mapping,
}

impl ActionParams {
    /// Empty parameters for `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Split a `with:` mapping into policy overrides and kind options.
    ///
    /// `wait` is a synonym of `sequential`; `concurrency` is its negation.
    pub fn from_mapping(action: impl Into<String>, with: Mapping) -> Result<Self> {
        let action = action.into();
        let mut policy = PolicyOverrides::default();
        let mut options = Mapping::new();
        let mut sequential: Vec<(&str, bool)> = Vec::new();

        for (key, value) in with {
            let Some(name) = key.as_str().map(str::to_owned) else {
                return Err(FlowError::InvalidParams {
                    action,
                    message: format!("parameter names must be strings, got {:?}", key),
                });
            };

            match name.as_str() {
                "retry" => policy.retry = Some(typed(&action, "retry", value)?),
                "skip" => policy.skip = Some(typed(&action, "skip", value)?),
                "continue_on_error" => {
                    policy.continue_on_error = Some(typed(&action, "continue_on_error", value)?)
                }
                "sequential" => sequential.push(("sequential", typed(&action, &name, value)?)),
                "wait" => sequential.push(("wait", typed(&action, &name, value)?)),
                "concurrency" => {
                    let concurrent: bool = typed(&action, &name, value)?;
                    sequential.push(("concurrency", !concurrent));
                }
                _ => {
                    options.insert(key, value);
                }
            }
        }

        if let Some(&(first, value)) = sequential.first() {
            if let Some(&(other, _)) = sequential.iter().find(|(_, v)| *v != value) {
                return Err(FlowError::InvalidParams {
                    action,
                    message: format!("'{}' and '{}' disagree on sequential execution", first, other),
                });
            }
            policy.sequential = Some(value);
        }

        Ok(Self {
            action,
            policy,
            options,
        })
    }

    /// Add a kind option (builder style).
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(Value::String(key.to_string()), value.into());
        self
    }

    /// Override the policy (builder style).
    pub fn with_policy(mut self, policy: PolicyOverrides) -> Self {
        self.policy = policy;
        self
    }

    /// Action name these params were declared for.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Declared policy overrides.
    pub fn policy(&self) -> &PolicyOverrides {
        &self.policy
    }

    /// Kind-specific options.
    pub fn options(&self) -> &Mapping {
        &self.options
    }

    /// Deserialize the kind-specific options into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_value(Value::Mapping(self.options.clone())).map_err(|e| {
            FlowError::InvalidParams {
                action: self.action.clone(),
                message: e.to_string(),
            }
        })
    }
}

fn typed<T: DeserializeOwned>(action: &str, key: &str, value: Value) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| FlowError::InvalidParams {
        action: action.to_string(),
        message: format!("'{}': {}", key, e),
    })
}
