use std::{io, path::PathBuf, result};
use thiserror::Error;

use crate::{search, store::pending_command};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open store at {1}")]
    OpenStoreError(#[source] rusqlite::Error, PathBuf),
    #[error("cannot lock store at {1}")]
    LockStoreError(#[source] io::Error, PathBuf),
    #[error("cannot downgrade store from version {found} to version {current}")]
    DowngradeNotSupported { found: u32, current: u32 },
    #[error("cannot upgrade store: found version {found} after migration, expected {expected}")]
    UpgradeIncomplete { found: u32, expected: u32 },
    #[error("cannot migrate store from version {version}")]
    MigrationStepError {
        version: u32,
        #[source]
        source: Box<Error>,
    },
    #[error("cannot rebuild full-text index")]
    RebuildFulltextIndexError(#[source] rusqlite::Error),

    #[error(transparent)]
    PendingCommandError(#[from] pending_command::Error),
    #[error(transparent)]
    SearchError(#[from] search::Error),
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),
}

pub type Result<T> = result::Result<T, Error>;
