//! Flow document loading.
//!
//! Loading is two-pass: the raw text is parsed once to read the `env`
//! mapping, then the whole text is substituted (see
//! [`interpolation`](crate::config::interpolation)) and parsed again into a
//! [`FlowDocument`]. Finally every step is built through the
//! [`ActionRegistry`], so an unknown action name or a bad parameter fails
//! the load before anything runs.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::action::ActionParams;
use crate::config::interpolation::{substitute, InterpolationContext};
use crate::config::schema::{self, FlowDocument};
use crate::config::settings::Settings;
use crate::context::FlowContext;
use crate::error::{FlowError, Result};
use crate::flow::{Flow, Job};
use crate::registry::ActionRegistry;

const DEFAULT_FLOW_NAME: &str = "flow";

/// Builds [`Flow`]s from documents.
#[derive(Debug)]
pub struct FlowLoader<'r> {
    registry: &'r ActionRegistry,
    settings: Settings,
    process_env: HashMap<String, String>,
}

impl<'r> FlowLoader<'r> {
    /// Create a loader reading placeholders from the process environment.
    pub fn new(registry: &'r ActionRegistry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            process_env: env::vars().collect(),
        }
    }

    /// Replace the process environment used for placeholders.
    pub fn with_process_env(mut self, process_env: HashMap<String, String>) -> Self {
        self.process_env = process_env;
        self
    }

    /// Settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Substitute placeholders in `raw` and parse the result.
    pub fn document(&self, raw: &str) -> Result<FlowDocument> {
        let context = self.interpolation_context(raw)?;
        let rendered = substitute(raw, &context);
        serde_yaml::from_str(&rendered).map_err(parse_error)
    }

    /// Load a flow from YAML text.
    pub fn load_str(&self, raw: &str) -> Result<Flow> {
        self.build(self.document(raw)?, DEFAULT_FLOW_NAME)
    }

    /// Load a flow from a file; the file stem names unnamed flows.
    ///
    /// # Errors
    ///
    /// Returns `FlowNotFound` if the file doesn't exist, `FlowParseError` if
    /// the YAML is invalid, and `ActionNotFound` / `InvalidParams` if a step
    /// cannot be built.
    pub fn load(&self, path: &Path) -> Result<Flow> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowError::FlowNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                FlowError::Io(e)
            }
        })?;

        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_FLOW_NAME);
        debug!("Loading flow from {}", path.display());
        self.build(self.document(&raw)?, fallback)
    }

    /// First pass: read the document `env` and layer it into the context.
    fn interpolation_context(&self, raw: &str) -> Result<InterpolationContext> {
        let process = InterpolationContext::from_process(self.process_env.clone());

        let value: Value = serde_yaml::from_str(raw).map_err(parse_error)?;
        let env = match value.get("env") {
            Some(Value::Mapping(env)) => env.clone(),
            Some(Value::Null) | None => Mapping::new(),
            Some(_) => {
                return Err(FlowError::FlowParseError {
                    message: "'env' must be a mapping".to_string(),
                })
            }
        };

        // Document values may themselves reference process variables.
        let document = schema::env_vars(&env)?
            .into_iter()
            .map(|(key, value)| (key, substitute(&value, &process)))
            .collect();
        Ok(process.with_document(document))
    }

    fn build(&self, document: FlowDocument, fallback_name: &str) -> Result<Flow> {
        let name = document
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string());

        let mut jobs = Vec::new();
        for (job_name, config) in document.job_configs()? {
            let mut actions = Vec::with_capacity(config.steps.len());
            for step in config.steps {
                let params = ActionParams::from_mapping(step.name.as_str(), step.with)?;
                actions.push(self.registry.construct(&step.name, params)?);
            }
            jobs.push(Job::new(job_name, actions));
        }

        let workspace = document
            .context
            .workspace
            .clone()
            .unwrap_or_else(|| self.settings.workspace());
        let context = FlowContext::new(workspace).with_env(document.env_vars()?);

        debug!(
            "Loaded flow '{}' with {} job(s) in {}",
            name,
            jobs.len(),
            context.workspace().display()
        );
        Ok(Flow::new(name, jobs, context).with_max_workers(self.settings.max_workers))
    }
}

/// Load the flow at `path` with the process environment.
pub fn load_flow(path: &Path, registry: &ActionRegistry, settings: &Settings) -> Result<Flow> {
    FlowLoader::new(registry, settings.clone()).load(path)
}

fn parse_error(e: serde_yaml::Error) -> FlowError {
    FlowError::FlowParseError {
        message: e.to_string(),
    }
}
