//! Store registry module.
//!
//! This module contains the registry of opened local stores. The
//! registry is created once by the application, handed by reference
//! to whoever needs a store, and closes every store when dropped or
//! when explicitly asked to.

use log::{debug, info};
use std::collections::{hash_map::Entry, HashMap};

use super::{LocalStore, Result, StoreConfig};

/// Represents the opened local stores, by account identifier.
#[derive(Default)]
pub struct StoreRegistry {
    stores: HashMap<String, LocalStore>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store of the given account, opening and upgrading
    /// it with the given configuration if it is not opened yet.
    pub fn get_or_open(&mut self, account: &str, config: &StoreConfig) -> Result<&mut LocalStore> {
        match self.stores.entry(account.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                info!("opening store of account {}", account);
                let store = LocalStore::open(config)?;
                Ok(entry.insert(store))
            }
        }
    }

    /// Returns the store of the given account, if opened.
    pub fn get(&self, account: &str) -> Option<&LocalStore> {
        self.stores.get(account)
    }

    /// Closes the store of the given account. Returns `false` if the
    /// store was not opened.
    pub fn close(&mut self, account: &str) -> bool {
        debug!("closing store of account {}", account);
        self.stores.remove(account).is_some()
    }

    pub fn close_all(&mut self) {
        debug!("closing {} stores", self.stores.len());
        self.stores.clear();
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn config(dir: &tempfile::TempDir, name: &str) -> StoreConfig {
        let mut config = StoreConfig::new(dir.path().join(name));
        config.lock = false;
        config
    }

    #[test]
    fn open_once_per_account() {
        let dir = tempdir().unwrap();
        let mut registry = StoreRegistry::new();
        assert!(registry.get("work").is_none());

        let store = registry.get_or_open("work", &config(&dir, "work.db")).unwrap();
        store.connection().execute("INSERT INTO folders (name) VALUES ('INBOX')", []).unwrap();

        // a different config is ignored once the store is opened
        let store = registry.get_or_open("work", &config(&dir, "other.db")).unwrap();
        assert_eq!(store.config().path, dir.path().join("work.db"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn close_stores() {
        let dir = tempdir().unwrap();
        let mut registry = StoreRegistry::new();
        registry.get_or_open("work", &config(&dir, "work.db")).unwrap();
        registry.get_or_open("home", &config(&dir, "home.db")).unwrap();

        assert!(registry.close("work"));
        assert!(!registry.close("work"));
        assert!(registry.get("work").is_none());
        assert!(registry.get("home").is_some());

        registry.close_all();
        assert!(registry.is_empty());
    }
}
