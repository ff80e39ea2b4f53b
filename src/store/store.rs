//! Local store module.
//!
//! This module contains the representation of an opened local store:
//! a SQLite database brought to the current schema version, holding
//! folders, messages and the queue of pending commands.

use log::{debug, trace, warn};
use proc_lock::{lock, LockPath};
use rusqlite::{params_from_iter, Connection};

use crate::{
    search::{self, ConditionsTreeNode},
    Flag, Flags,
};

use super::{
    migrations,
    pending_command::{PendingCommand, PendingCommandEntry},
    schema::{self, MESSAGE_COLUMNS},
    Error, Result, StoreConfig,
};

const SELECT_PENDING_COMMANDS: &str = "
    SELECT id, command, data
    FROM pending_commands
    ORDER BY id
";

const INSERT_PENDING_COMMAND: &str = "
    INSERT INTO pending_commands (command, data)
    VALUES (?, ?)
";

const DELETE_PENDING_COMMAND: &str = "
    DELETE FROM pending_commands
    WHERE id = ?
";

const DELETE_PENDING_COMMANDS: &str = "
    DELETE FROM pending_commands
";

const SELECT_MESSAGES: &str = "
    SELECT
        messages.id,
        IFNULL(messages.uid, ''),
        folders.name,
        IFNULL(messages.subject, ''),
        IFNULL(messages.sender_list, ''),
        IFNULL(messages.date, 0),
        IFNULL(messages.flags, ''),
        IFNULL(messages.read, 0),
        IFNULL(messages.flagged, 0),
        IFNULL(messages.answered, 0),
        IFNULL(messages.forwarded, 0),
        threads.root
    FROM messages
    JOIN folders ON folders.id = messages.folder_id
    LEFT JOIN threads ON threads.message_id = messages.id
    WHERE messages.deleted = 0
    AND IFNULL(messages.empty, 0) = 0
";

/// Represents a message matching a search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageSummary {
    /// Represents the row id of the message.
    pub id: i64,
    /// Represents the server UID of the message.
    pub uid: String,
    /// Represents the name of the folder owning the message.
    pub folder: String,
    pub subject: String,
    pub sender: String,
    /// Represents the date of the message, in milliseconds since
    /// the epoch.
    pub date: i64,
    /// Represents the flags of the message, gathered from the
    /// dedicated columns and the `flags` column.
    pub flags: Flags,
    /// Represents the id of the thread root, if the message belongs
    /// to a thread.
    pub thread_root: Option<i64>,
}

/// Represents an opened local store.
pub struct LocalStore {
    config: StoreConfig,
    conn: Connection,
}

impl LocalStore {
    /// Opens the store at the configured path and upgrades it to the
    /// current schema version.
    ///
    /// When the configuration asks for it, a process-level lock is
    /// held while the store is opened and migrated, so that two
    /// processes never upgrade the same file at once.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let guard = if config.lock {
            let lock_path = LockPath::Tmp(lock_name(config));
            let guard = lock(&lock_path)
                .map_err(|err| Error::LockStoreError(err, config.path.to_owned()))?;
            Some(guard)
        } else {
            None
        };

        debug!("opening store at {:?}", config.path);
        let mut conn = Connection::open(&config.path)
            .map_err(|err| Error::OpenStoreError(err, config.path.to_owned()))?;
        migrations::upgrade(&mut conn, config)?;

        drop(guard);

        Ok(Self {
            config: config.clone(),
            conn,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Gives access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Reads the on-disk schema version.
    pub fn version(&self) -> Result<u32> {
        Ok(schema::version(&self.conn)?)
    }

    /// Lists the pending commands in insertion order. Rows that
    /// cannot be read back are skipped.
    pub fn pending_commands(&self) -> Result<Vec<PendingCommandEntry>> {
        let mut stmt = self.conn.prepare(SELECT_PENDING_COMMANDS)?;
        let rows: Vec<(i64, Option<String>, Option<String>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (id, name, data) in rows {
            let name = name.unwrap_or_default();
            match PendingCommand::from_data(&name, data.as_deref().unwrap_or("{}")) {
                Ok(command) => entries.push(PendingCommandEntry { id, command }),
                Err(err) => warn!("skipping pending command {} ({}): {}", id, name, err),
            }
        }

        Ok(entries)
    }

    /// Queues a command and returns the id of its row.
    pub fn add_pending_command(&self, command: &PendingCommand) -> Result<i64> {
        let data = command.to_data()?;
        self.conn
            .execute(INSERT_PENDING_COMMAND, [command.name(), data.as_str()])?;
        let id = self.conn.last_insert_rowid();
        trace!("added pending command {} with id {}", command.name(), id);
        Ok(id)
    }

    pub fn remove_pending_command(&self, id: i64) -> Result<()> {
        self.conn.execute(DELETE_PENDING_COMMAND, [id])?;
        Ok(())
    }

    pub fn remove_pending_commands(&self) -> Result<()> {
        let count = self.conn.execute(DELETE_PENDING_COMMANDS, [])?;
        debug!("removed {} pending commands", count);
        Ok(())
    }

    /// Lists the messages matching the given condition tree, most
    /// recent first. Deleted and placeholder messages never match.
    pub fn search_messages(&self, tree: Option<&ConditionsTreeNode>) -> Result<Vec<MessageSummary>> {
        let clause = search::build_where_clause(tree)?;
        let selection = search::qualify_columns(&MESSAGE_COLUMNS, "messages.", &clause.selection)?;
        let sql = format!("{} AND ({}) ORDER BY messages.date DESC", SELECT_MESSAGES, selection);
        trace!("search query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params_from_iter(clause.args.iter()), |row| {
                let mut flags = Flags::from_store_list(&row.get::<_, String>(6)?);
                for (index, flag) in [
                    (7usize, Flag::Seen),
                    (8, Flag::Flagged),
                    (9, Flag::Answered),
                    (10, Flag::Forwarded),
                ] {
                    if row.get::<_, bool>(index)? {
                        flags.insert(flag);
                    }
                }

                Ok(MessageSummary {
                    id: row.get(0)?,
                    uid: row.get(1)?,
                    folder: row.get(2)?,
                    subject: row.get(3)?,
                    sender: row.get(4)?,
                    date: row.get(5)?,
                    flags,
                    thread_root: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        Ok(messages)
    }

    /// Repopulates the full-text index from the subject and text
    /// content of the messages.
    pub fn rebuild_fulltext_index(&self) -> Result<()> {
        migrations::rebuild_fulltext_index(&self.conn)
    }
}

fn lock_name(config: &StoreConfig) -> String {
    let path: String = config
        .path
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("mailsync-store-{}.lock", path)
}
