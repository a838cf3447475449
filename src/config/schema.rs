//! Flow document schema.
//!
//! ```yaml
//! name: upgrade
//! env:
//!   RELEASE: "17.0"
//! context:
//!   workspace: /tmp/actionflow
//! jobs:
//!   prepare:
//!     steps:
//!       - name: download
//!         with:
//!           url: https://example.com/${RELEASE}.tar.gz
//!           filepath: release.tar.gz
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{FlowError, Result};

/// A parsed flow document, after placeholder substitution.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowDocument {
    /// Flow name; the loader falls back to the file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// Variables for placeholders and command steps.
    #[serde(default)]
    pub env: Mapping,

    /// Run context settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Jobs in declaration order.
    pub jobs: Mapping,
}

/// The document's `context:` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Workspace directory; defaults to `<home>/workspace`.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

/// One job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One step: a registered action name plus its parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Registered action name.
    pub name: String,

    /// Policy keys and action options.
    #[serde(default)]
    pub with: Mapping,
}

impl FlowDocument {
    /// Jobs as `(name, config)` pairs, in declaration order.
    pub fn job_configs(&self) -> Result<Vec<(String, JobConfig)>> {
        self.jobs
            .iter()
            .map(|(key, value)| {
                let name = scalar_to_string(key).ok_or_else(|| FlowError::FlowParseError {
                    message: format!("job names must be scalars, got {:?}", key),
                })?;
                let job = match value {
                    Value::Null => JobConfig::default(),
                    other => serde_yaml::from_value(other.clone()).map_err(|e| {
                        FlowError::FlowParseError {
                            message: format!("job '{}': {}", name, e),
                        }
                    })?,
                };
                Ok((name, job))
            })
            .collect()
    }

    /// `env` as strings; nested values are rejected.
    pub fn env_vars(&self) -> Result<HashMap<String, String>> {
        env_vars(&self.env)
    }
}

/// Convert an `env` mapping to strings; nested values are rejected.
pub fn env_vars(env: &Mapping) -> Result<HashMap<String, String>> {
    env.iter()
        .map(|(key, value)| {
            let key = scalar_to_string(key);
            let value = scalar_to_string(value);
            match (key, value) {
                (Some(k), Some(v)) => Ok((k, v)),
                (k, _) => Err(FlowError::FlowParseError {
                    message: format!(
                        "env '{}' must map to a scalar value",
                        k.unwrap_or_default()
                    ),
                }),
            }
        })
        .collect()
}

/// Render a YAML scalar as text (`null` becomes the empty string).
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
