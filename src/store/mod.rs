//! Key-value storage for place coordinates and per-cell population sets.
//!
//! Layout (shared with existing deployments):
//! - `pl-<UPPERCASE NAME>` -> `"<lat>,<lon>"`
//! - `<geohash>` -> set of decimal population strings

mod memory;
mod sled_store;

pub use self::memory::MemoryStore;
pub use self::sled_store::SledStore;

use hashbrown::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt value under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Storage operations the core needs. Every method touches a single key
/// atomically, except `union_sets` which only reads.
pub trait PopulationStore: Send + Sync {
    /// Write (or overwrite) a plain string value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read a plain string value.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Add a member to the set stored under `key`, creating it if needed.
    /// Returns `true` if the member was not present before.
    fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Members of the set under `key`; a missing key is an empty set.
    fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError>;

    /// Union of the sets stored under `keys`. Missing keys contribute nothing.
    fn union_sets(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        let mut union = HashSet::new();
        for key in keys {
            union.extend(self.set_members(key)?);
        }
        Ok(union)
    }

    /// Connectivity probe
    fn ping(&self) -> Result<(), StoreError>;
}
