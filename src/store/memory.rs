use std::collections::HashMap;
use std::sync::Mutex;

use crate::app::{BrowseError, Result};
use crate::store::PreferenceStore;

/// Non-persistent store, used when no database path is configured.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let values = self
            .values
            .lock()
            .map_err(|e| BrowseError::Database(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set_bytes(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| BrowseError::Database(e.to_string()))?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| BrowseError::Database(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}
