//! Key/value settings store.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Platform settings: string keys mapping to one or more string values.
pub trait Settings: Send + Sync {
    /// First value stored under `name`.
    fn get_key(&self, name: &str) -> Option<String>;

    fn set_key(&self, name: &str, value: &str);

    /// All values stored under `name`.
    fn get_composite_key(&self, name: &str) -> Option<Vec<String>>;

    fn set_composite_key(&self, name: &str, values: Vec<String>);
}

/// Settings kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Vec<String>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Settings for MemorySettings {
    fn get_key(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .get(name)
            .and_then(|values| values.first().cloned())
    }

    fn set_key(&self, name: &str, value: &str) {
        self.values
            .write()
            .insert(name.to_string(), vec![value.to_string()]);
    }

    fn get_composite_key(&self, name: &str) -> Option<Vec<String>> {
        self.values.read().get(name).cloned()
    }

    fn set_composite_key(&self, name: &str, values: Vec<String>) {
        self.values.write().insert(name.to_string(), values);
    }
}
