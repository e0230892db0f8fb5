//! In-process store backed by hash maps.

use std::sync::RwLock;

use hashbrown::{HashMap, HashSet};

use super::{PopulationStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of plain-value keys
    pub fn value_count(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Number of set keys
    pub fn set_count(&self) -> usize {
        self.sets.read().map(|s| s.len()).unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl PopulationStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut sets = self.sets.write().map_err(|_| poisoned())?;
        Ok(sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        let sets = self.sets.read().map_err(|_| poisoned())?;
        Ok(sets.get(key).cloned().unwrap_or_default())
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
