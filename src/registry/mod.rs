//! Action registry.
//!
//! Maps a declared action name to a constructor. The registry is an explicit
//! value built once at process start (usually via
//! [`ActionRegistry::with_builtins`]) and handed by reference to the flow
//! loader; it is never mutated while a flow runs.
//!
//! # Example
//!
//! ```
//! use actionflow::action::ActionParams;
//! use actionflow::registry::ActionRegistry;
//!
//! let registry = ActionRegistry::with_builtins().unwrap();
//! assert!(registry.contains("command"));
//!
//! let params = ActionParams::new("sleep").with_option("seconds", 0);
//! let action = registry.construct("sleep", params).unwrap();
//! assert_eq!(action.name(), "sleep");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::action::{Action, ActionParams, Task};
use crate::error::{FlowError, Result};

/// Builds a task from declarative parameters.
pub type Constructor = Box<dyn Fn(&ActionParams) -> Result<Box<dyn Task>> + Send + Sync>;

/// Name → constructor table.
#[derive(Default)]
pub struct ActionRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in action.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        crate::actions::register_builtins(&mut registry)?;
        debug!(
            "Loaded actions ({}): {}",
            registry.len(),
            registry.names().join(", ")
        );
        Ok(registry)
    }

    /// Register a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAction` if `name` is already registered.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&ActionParams) -> Result<Box<dyn Task>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(FlowError::DuplicateAction { name });
        }
        self.constructors.insert(name, Box::new(constructor));
        Ok(())
    }

    /// Register a task type deserialized straight from the step options.
    pub fn register_task<T>(&mut self, name: impl Into<String>) -> Result<()>
    where
        T: Task + DeserializeOwned + 'static,
    {
        self.register(name, |params: &ActionParams| {
            let task: T = params.parse()?;
            Ok(Box::new(task) as Box<dyn Task>)
        })
    }

    /// Build an action from its declared name and parameters.
    ///
    /// Declared policy keys override the task's default policy.
    ///
    /// # Errors
    ///
    /// Returns `ActionNotFound` if `name` is not registered, or the
    /// constructor's error if the parameters do not fit.
    pub fn construct(&self, name: &str, params: ActionParams) -> Result<Action> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| FlowError::ActionNotFound {
                name: name.to_string(),
            })?;

        let task = constructor(&params)?;
        let policy = params.policy().apply(task.default_policy());
        Ok(Action::new(name, task, policy))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
