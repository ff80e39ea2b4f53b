//! Store config module.
//!
//! This module contains the representation of the local store
//! configuration.

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_INBOX_FOLDER: &str = "INBOX";
pub const DEFAULT_DRAFTS_FOLDER: &str = "Drafts";

/// Represents the local store configuration.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Represents the path of the SQLite database file.
    pub path: PathBuf,
    /// Represents the name of the inbox folder. Some migrations
    /// give this folder special defaults.
    pub inbox_folder: String,
    /// Represents the name of the drafts folder, where messages of
    /// obsolete outbox folders are moved during migration.
    pub drafts_folder: String,
    /// Takes a process-level lock while the store is opened and
    /// migrated.
    pub lock: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            inbox_folder: DEFAULT_INBOX_FOLDER.into(),
            drafts_folder: DEFAULT_DRAFTS_FOLDER.into(),
            lock: true,
        }
    }
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}
