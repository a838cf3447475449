//! Lock-guarded key/value store for hand-off between actions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

/// Flow-scoped store used by actions to publish data for later actions.
///
/// Every `get`/`set` takes the same lock; there is no ordering guarantee
/// between concurrent writers beyond atomicity of a single call.
#[derive(Debug, Default)]
pub struct SharedResources {
    resources: Mutex<HashMap<String, Value>>,
}

impl SharedResources {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// String value stored under `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Whether `key` has been set.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Sorted list of keys currently set.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    // A panicking writer cannot leave a HashMap insert half-done, so a
    // poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
