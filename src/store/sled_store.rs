//! Embedded persistent store on top of sled.

use std::path::Path;

use hashbrown::HashSet;
use sled::{Db, IVec};
use tracing::info;

use super::{PopulationStore, StoreError};

/// sled-backed store. Place values are stored as raw UTF-8; cell sets are
/// JSON arrays of decimal strings, updated with a compare-and-swap loop so
/// concurrent writers never lose a member.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening store at {}", path.display());
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

fn decode_utf8(key: &str, raw: &IVec) -> Result<String, StoreError> {
    String::from_utf8(raw.to_vec()).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode_set(key: &str, raw: Option<&IVec>) -> Result<HashSet<String>, StoreError> {
    let Some(raw) = raw else {
        return Ok(HashSet::new());
    };
    let members: Vec<String> = serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(members.into_iter().collect())
}

fn encode_set(set: &HashSet<String>) -> Result<Vec<u8>, StoreError> {
    let mut members: Vec<&String> = set.iter().collect();
    members.sort();
    serde_json::to_vec(&members).map_err(|e| StoreError::Backend(e.to_string()))
}

impl PopulationStore for SledStore {
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.db.get(key.as_bytes())? {
            Some(raw) => decode_utf8(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        loop {
            let current = self.db.get(key.as_bytes())?;
            let mut set = decode_set(key, current.as_ref())?;
            if !set.insert(member.to_string()) {
                return Ok(false);
            }
            let updated = encode_set(&set)?;
            match self.db.compare_and_swap(key.as_bytes(), current, Some(updated))? {
                Ok(()) => return Ok(true),
                // lost the race with another writer; reload and retry
                Err(_) => continue,
            }
        }
    }

    fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        let current = self.db.get(key.as_bytes())?;
        decode_set(key, current.as_ref())
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.db.size_on_disk()?;
        Ok(())
    }
}
