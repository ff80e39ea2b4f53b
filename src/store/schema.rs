//! Store schema module.
//!
//! This module contains the schema of the local store at its current
//! version, and the helpers to read and write the on-disk version.

use log::debug;
use rusqlite::Connection;

/// Represents the schema version this crate reads and writes.
pub const CURRENT_VERSION: u32 = 61;

/// Stores older than this version predate incremental upgrades and
/// are rebuilt from scratch.
pub const MIN_INCREMENTAL_VERSION: u32 = 29;

/// Name of the folder holding messages waiting to be sent, as used
/// by stores prior to version 61.
pub const INTERNAL_OUTBOX_FOLDER: &str = "K9MAIL_INTERNAL_OUTBOX";

/// Columns of the `messages` table, as referenced by search
/// predicates.
pub const MESSAGE_COLUMNS: [&str; 26] = [
    "id",
    "deleted",
    "folder_id",
    "uid",
    "subject",
    "date",
    "flags",
    "sender_list",
    "to_list",
    "cc_list",
    "bcc_list",
    "reply_to_list",
    "html_content",
    "text_content",
    "attachment_count",
    "internal_date",
    "message_id",
    "preview",
    "mime_type",
    "normalized_subject_hash",
    "empty",
    "read",
    "flagged",
    "answered",
    "forwarded",
    "new_message",
];

const CREATE_SCHEMA: &str = "
    DROP TABLE IF EXISTS folders;
    CREATE TABLE folders (
        id            INTEGER PRIMARY KEY,
        name          TEXT,
        last_updated  INTEGER,
        unread_count  INTEGER,
        visible_limit INTEGER,
        status        TEXT,
        push_state    TEXT,
        last_pushed   INTEGER,
        flagged_count INTEGER default 0,
        integrate     INTEGER,
        top_group     INTEGER,
        poll_class    TEXT,
        push_class    TEXT,
        display_class TEXT,
        notify_class  TEXT default 'INHERITED',
        visible       INTEGER default 1
    );
    CREATE INDEX IF NOT EXISTS folder_name ON folders (name);

    DROP TABLE IF EXISTS messages;
    CREATE TABLE messages (
        id                      INTEGER PRIMARY KEY,
        deleted                 INTEGER default 0,
        folder_id               INTEGER,
        uid                     TEXT,
        subject                 TEXT,
        date                    INTEGER,
        flags                   TEXT,
        sender_list             TEXT,
        to_list                 TEXT,
        cc_list                 TEXT,
        bcc_list                TEXT,
        reply_to_list           TEXT,
        html_content            TEXT,
        text_content            TEXT,
        attachment_count        INTEGER,
        internal_date           INTEGER,
        message_id              TEXT,
        preview                 TEXT,
        mime_type               TEXT,
        normalized_subject_hash INTEGER,
        empty                   INTEGER default 0,
        read                    INTEGER default 0,
        flagged                 INTEGER default 0,
        answered                INTEGER default 0,
        forwarded               INTEGER default 0,
        new_message             INTEGER default 0
    );

    DROP TABLE IF EXISTS headers;
    CREATE TABLE headers (
        id         INTEGER PRIMARY KEY,
        message_id INTEGER,
        name       TEXT,
        value      TEXT
    );
    CREATE INDEX IF NOT EXISTS header_folder ON headers (message_id);

    CREATE INDEX IF NOT EXISTS msg_uid ON messages (uid, folder_id);
    DROP INDEX IF EXISTS msg_folder_id;
    DROP INDEX IF EXISTS msg_folder_id_date;
    CREATE INDEX IF NOT EXISTS msg_folder_id_deleted_date ON messages (folder_id, deleted, internal_date);
    CREATE INDEX IF NOT EXISTS msg_empty ON messages (empty);
    CREATE INDEX IF NOT EXISTS msg_read ON messages (read);
    CREATE INDEX IF NOT EXISTS msg_flagged ON messages (flagged);
    CREATE INDEX IF NOT EXISTS msg_composite ON messages (deleted, empty, folder_id, flagged, read);

    DROP TABLE IF EXISTS threads;
    CREATE TABLE threads (
        id         INTEGER PRIMARY KEY,
        message_id INTEGER,
        root       INTEGER,
        parent     INTEGER
    );
    CREATE INDEX IF NOT EXISTS threads_message_id ON threads (message_id);
    CREATE INDEX IF NOT EXISTS threads_root ON threads (root);
    CREATE INDEX IF NOT EXISTS threads_parent ON threads (parent);

    DROP TABLE IF EXISTS attachments;
    CREATE TABLE attachments (
        id                  INTEGER PRIMARY KEY,
        message_id          INTEGER,
        store_data          TEXT,
        content_uri         TEXT,
        size                INTEGER,
        name                TEXT,
        mime_type           TEXT,
        content_id          TEXT,
        content_disposition TEXT
    );

    DROP TABLE IF EXISTS pending_commands;
    CREATE TABLE pending_commands (
        id      INTEGER PRIMARY KEY,
        command TEXT,
        data    TEXT
    );

    DROP TABLE IF EXISTS messages_fulltext;
    CREATE VIRTUAL TABLE messages_fulltext USING fts4 (fulltext);
";

/// Sets the root of a new thread to itself when none is given.
pub(crate) const CREATE_THREAD_ROOT_TRIGGER: &str = "
    DROP TRIGGER IF EXISTS set_thread_root;
    CREATE TRIGGER set_thread_root AFTER INSERT ON threads
    BEGIN
        UPDATE threads SET root = id WHERE root IS NULL AND ROWID = NEW.ROWID;
    END;
";

/// Cascades folder and message deletions to the dependent tables.
/// Upgrades run the same statements, so the trigger definitions in
/// `sqlite_master` do not depend on the history of the store.
pub(crate) const CREATE_DELETE_TRIGGERS: &str = "
    DROP TRIGGER IF EXISTS delete_folder;
    CREATE TRIGGER delete_folder BEFORE DELETE ON folders
    BEGIN
        DELETE FROM messages WHERE old.id = folder_id;
    END;

    DROP TRIGGER IF EXISTS delete_message;
    CREATE TRIGGER delete_message BEFORE DELETE ON messages
    BEGIN
        DELETE FROM attachments WHERE old.id = message_id;
        DELETE FROM headers WHERE old.id = message_id;
        DELETE FROM threads WHERE old.id = message_id;
        DELETE FROM messages_fulltext WHERE docid = old.id;
    END;
";

/// Drops every known table and creates the current schema.
pub fn create(conn: &Connection) -> rusqlite::Result<()> {
    debug!("creating store schema version {}", CURRENT_VERSION);
    conn.execute_batch(CREATE_SCHEMA)?;
    conn.execute_batch(CREATE_THREAD_ROOT_TRIGGER)?;
    conn.execute_batch(CREATE_DELETE_TRIGGERS)
}

/// Reads the on-disk schema version. A new database is at version 0.
pub fn version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

pub fn set_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}

/// Lists the columns of the given table, in declaration order.
pub fn columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(columns)
}
