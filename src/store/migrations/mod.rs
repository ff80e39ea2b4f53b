//! Store migrations module.
//!
//! This module contains the engine bringing an on-disk store to
//! [`CURRENT_VERSION`]. Every step is tied to the version it upgrades
//! from, and all steps of one upgrade run in a single exclusive
//! transaction.

pub mod legacy_pending_commands;
mod steps;

use log::{debug, info, warn};
use rusqlite::{Connection, TransactionBehavior};

use super::{
    schema::{self, CURRENT_VERSION, MIN_INCREMENTAL_VERSION},
    Error, Result, StoreConfig,
};

type Step = fn(&Connection, &mut MigrationContext) -> Result<()>;

/// Migration steps, keyed by the version they upgrade from, in
/// ascending order.
const MIGRATIONS: &[(u32, Step)] = &[
    (29, steps::add_deleted_column),
    (30, steps::replace_folder_date_index),
    (31, steps::backfill_deleted_column),
    (32, steps::add_preview_column),
    (33, steps::add_flagged_count_column),
    (34, steps::rename_no_seen_info_flag),
    (35, steps::add_attachment_content_id_column),
    (36, steps::add_attachment_content_disposition_column),
    (38, steps::delete_orphaned_headers),
    (39, steps::add_mime_type_column),
    (40, steps::add_folder_class_columns),
    (42, steps::rename_outbox_folder),
    (43, steps::add_thread_columns),
    (44, steps::create_thread_indexes),
    (45, steps::split_flags_columns),
    (46, steps::create_threads_table),
    (47, steps::backfill_thread_roots),
    (48, steps::create_composite_index),
    (49, steps::add_notify_class_column),
    (54, steps::create_fulltext_table),
    (55, steps::normalize_folder_booleans),
    (56, steps::add_new_message_column),
    (57, steps::add_visible_column),
    (59, steps::migrate_legacy_pending_commands),
    (60, steps::delete_internal_outbox_folder),
];

/// Represents the state shared by the steps of one upgrade.
pub struct MigrationContext<'a> {
    pub config: &'a StoreConfig,
    /// Set by steps that need the full-text index rebuilt once the
    /// upgrade is committed.
    pub rebuild_fulltext_index: bool,
}

impl<'a> MigrationContext<'a> {
    fn new(config: &'a StoreConfig) -> Self {
        Self {
            config,
            rebuild_fulltext_index: false,
        }
    }
}

/// Brings the store to [`CURRENT_VERSION`].
///
/// Fails if the store is newer than this crate, or if its version
/// does not match after the upgrade. On failure the transaction is
/// rolled back and the store is left untouched.
pub fn upgrade(conn: &mut Connection, config: &StoreConfig) -> Result<()> {
    let version = schema::version(conn)?;

    if version == CURRENT_VERSION {
        debug!("store already at version {}", version);
        retry_fulltext_index(conn);
        return Ok(());
    }

    if version > CURRENT_VERSION {
        return Err(Error::DowngradeNotSupported {
            found: version,
            current: CURRENT_VERSION,
        });
    }

    info!(
        "upgrading store from version {} to version {}",
        version, CURRENT_VERSION
    );

    let mut ctx = MigrationContext::new(config);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;

    if version < MIN_INCREMENTAL_VERSION {
        if version > 0 {
            warn!("store version {} is too old, rebuilding it", version);
        }
        schema::create(&tx)?;
    } else {
        for (from, step) in MIGRATIONS.iter().filter(|(from, _)| *from >= version) {
            debug!("migrating store from version {}", from);
            step(&tx, &mut ctx).map_err(|err| Error::MigrationStepError {
                version: *from,
                source: Box::new(err),
            })?;
        }
    }

    schema::set_version(&tx, CURRENT_VERSION)?;
    tx.commit()?;

    let found = schema::version(conn)?;
    if found != CURRENT_VERSION {
        return Err(Error::UpgradeIncomplete {
            found,
            expected: CURRENT_VERSION,
        });
    }

    // the upgrade is committed at this point, a failed rebuild is
    // picked up again by the next open
    if ctx.rebuild_fulltext_index {
        info!("rebuilding full-text index");
        if let Err(err) = rebuild_fulltext_index(conn) {
            warn!("{}, will retry on next open", err);
        }
    }

    Ok(())
}

const REBUILD_FULLTEXT_INDEX: &str = "
    DELETE FROM messages_fulltext;
    INSERT INTO messages_fulltext (docid, fulltext)
    SELECT id, IFNULL(subject, '') || ' ' || IFNULL(text_content, '')
    FROM messages
    WHERE deleted = 0
    AND IFNULL(empty, 0) = 0;
";

/// Repopulates the full-text index from the messages.
pub fn rebuild_fulltext_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(REBUILD_FULLTEXT_INDEX)
        .map_err(Error::RebuildFulltextIndexError)
}

const SELECT_FULLTEXT_INDEX_IS_STALE: &str = "
    SELECT NOT EXISTS (SELECT 1 FROM messages_fulltext)
    AND EXISTS (SELECT 1 FROM messages WHERE deleted = 0 AND IFNULL(empty, 0) = 0)
";

/// Rebuilds the full-text index when it is empty while some messages
/// should be indexed, which is what an interrupted rebuild leaves
/// behind.
fn retry_fulltext_index(conn: &Connection) {
    match conn.query_row(SELECT_FULLTEXT_INDEX_IS_STALE, [], |row| row.get(0)) {
        Ok(true) => {
            info!("full-text index is empty, rebuilding it");
            if let Err(err) = rebuild_fulltext_index(conn) {
                warn!("{}, will retry on next open", err);
            }
        }
        Ok(false) => (),
        Err(err) => warn!("cannot check full-text index: {}", err),
    }
}

/// Adds a column to a table. A column that already exists is left as
/// it is.
pub(crate) fn add_column(conn: &Connection, table: &str, definition: &str) -> Result<()> {
    match conn.execute_batch(&format!("ALTER TABLE {} ADD {}", table, definition)) {
        Ok(()) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.starts_with("duplicate column name") => {
            debug!("column {} {} already exists, skipping", table, definition);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
