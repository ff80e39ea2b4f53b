use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    store::{
        schema::{CREATE_DELETE_TRIGGERS, CREATE_THREAD_ROOT_TRIGGER, INTERNAL_OUTBOX_FOLDER},
        Result,
    },
    Flag, Flags,
};

use super::{add_column, legacy_pending_commands, MigrationContext};

/// Name of the outbox folder used by the earliest versions.
const OLD_OUTBOX_FOLDER: &str = "OUTBOX";

/// Name of the localized outbox folder used before the internal one.
const LOCALIZED_OUTBOX_FOLDER: &str = "Outbox";

pub fn add_deleted_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "deleted INTEGER default 0")
}

pub fn replace_folder_date_index(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute_batch(
        "
        DROP INDEX IF EXISTS msg_folder_id_date;
        CREATE INDEX IF NOT EXISTS msg_folder_id_deleted_date ON messages (folder_id, deleted, internal_date);
        ",
    )?;
    Ok(())
}

pub fn backfill_deleted_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute("UPDATE messages SET deleted = 1 WHERE flags LIKE '%DELETED%'", [])?;
    Ok(())
}

pub fn add_preview_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "preview TEXT")
}

pub fn add_flagged_count_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "folders", "flagged_count INTEGER default 0")
}

pub fn rename_no_seen_info_flag(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute(
        "UPDATE messages SET flags = replace(flags, 'X_NO_SEEN_INFO', 'X_BAD_FLAG')",
        [],
    )?;
    Ok(())
}

pub fn add_attachment_content_id_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "attachments", "content_id TEXT")
}

pub fn add_attachment_content_disposition_column(
    conn: &Connection,
    _: &mut MigrationContext,
) -> Result<()> {
    add_column(conn, "attachments", "content_disposition TEXT")
}

pub fn delete_orphaned_headers(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    let deleted = conn.execute(
        "
        DELETE FROM headers
        WHERE id IN (
            SELECT headers.id
            FROM headers
            LEFT JOIN messages ON headers.message_id = messages.id
            WHERE messages.id IS NULL
        )
        ",
        [],
    )?;
    debug!("deleted {} orphaned headers", deleted);
    Ok(())
}

pub fn add_mime_type_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "mime_type TEXT")
}

/// Adds the folder classes. Every folder gets the defaults, the inbox
/// is displayed, polled and pushed first, and shown in the unified
/// inbox.
pub fn add_folder_class_columns(conn: &Connection, ctx: &mut MigrationContext) -> Result<()> {
    add_column(conn, "folders", "integrate INTEGER")?;
    add_column(conn, "folders", "top_group INTEGER")?;
    add_column(conn, "folders", "poll_class TEXT")?;
    add_column(conn, "folders", "push_class TEXT")?;
    add_column(conn, "folders", "display_class TEXT")?;

    conn.execute(
        "
        UPDATE folders
        SET integrate = 0, top_group = 0, poll_class = 'INHERITED', push_class = 'SECOND_CLASS', display_class = 'NO_CLASS'
        ",
        [],
    )?;
    conn.execute(
        "
        UPDATE folders
        SET integrate = 1, top_group = 1, poll_class = 'FIRST_CLASS', push_class = 'FIRST_CLASS', display_class = 'FIRST_CLASS'
        WHERE name = ?
        ",
        [&ctx.config.inbox_folder],
    )?;
    Ok(())
}

/// Renames the old outbox to the internal one, and empties the
/// localized outbox into the drafts folder before deleting it.
pub fn rename_outbox_folder(conn: &Connection, ctx: &mut MigrationContext) -> Result<()> {
    let renamed = conn.execute(
        "UPDATE folders SET name = ? WHERE name = ?",
        [INTERNAL_OUTBOX_FOLDER, OLD_OUTBOX_FOLDER],
    )?;
    if renamed > 0 {
        info!("renamed folder {} to {}", OLD_OUTBOX_FOLDER, INTERNAL_OUTBOX_FOLDER);
    }

    let outbox_id = find_folder_id(conn, LOCALIZED_OUTBOX_FOLDER)?;
    let outbox_id = match outbox_id {
        Some(id) => id,
        None => return Ok(()),
    };

    let drafts_id = match find_folder_id(conn, &ctx.config.drafts_folder)? {
        Some(id) => id,
        None => {
            conn.execute("INSERT INTO folders (name) VALUES (?)", [&ctx.config.drafts_folder])?;
            conn.last_insert_rowid()
        }
    };

    let moved = conn.execute(
        "UPDATE messages SET folder_id = ? WHERE folder_id = ?",
        [drafts_id, outbox_id],
    )?;
    conn.execute("DELETE FROM folders WHERE id = ?", [outbox_id])?;
    info!(
        "moved {} messages from obsolete folder {} to {}",
        moved, LOCALIZED_OUTBOX_FOLDER, ctx.config.drafts_folder
    );
    Ok(())
}

pub fn add_thread_columns(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "thread_root INTEGER")?;
    add_column(conn, "messages", "thread_parent INTEGER")?;
    add_column(conn, "messages", "normalized_subject_hash INTEGER")?;
    add_column(conn, "messages", "empty INTEGER")
}

pub fn create_thread_indexes(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute_batch(
        "
        DROP INDEX IF EXISTS msg_empty;
        CREATE INDEX IF NOT EXISTS msg_empty ON messages (empty);
        DROP INDEX IF EXISTS msg_thread_root;
        CREATE INDEX IF NOT EXISTS msg_thread_root ON messages (thread_root);
        DROP INDEX IF EXISTS msg_thread_parent;
        CREATE INDEX IF NOT EXISTS msg_thread_parent ON messages (thread_parent);
        ",
    )?;
    Ok(())
}

/// Flags kept in the `flags` column once the common ones get their
/// own columns.
const EXTRA_FLAGS: [&str; 9] = [
    "DRAFT",
    "RECENT",
    "X_DESTROYED",
    "X_DOWNLOADED_FULL",
    "X_DOWNLOADED_PARTIAL",
    "X_GOT_ALL_HEADERS",
    "X_REMOTE_COPY_STARTED",
    "X_SEND_FAILED",
    "X_SEND_IN_PROGRESS",
];

/// Moves the read, flagged, answered and forwarded flags to their own
/// columns. `DELETED` and unknown flags are dropped from the `flags`
/// column.
pub fn split_flags_columns(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "read INTEGER default 0")?;
    add_column(conn, "messages", "flagged INTEGER default 0")?;
    add_column(conn, "messages", "answered INTEGER default 0")?;
    add_column(conn, "messages", "forwarded INTEGER default 0")?;

    let mut stmt = conn.prepare("SELECT id, flags FROM messages")?;
    let rows: Vec<(i64, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);

    let mut update = conn.prepare(
        "UPDATE messages SET flags = ?, read = ?, flagged = ?, answered = ?, forwarded = ? WHERE id = ?",
    )?;

    for (id, flags) in rows {
        let flags = Flags::from_store_list(flags.as_deref().unwrap_or_default());
        let extra_flags: Flags = flags
            .iter()
            .filter(|flag| EXTRA_FLAGS.contains(&flag.to_store_name().as_str()))
            .cloned()
            .collect();

        update.execute(params![
            extra_flags.to_store_list(),
            flags.contains(&Flag::Seen),
            flags.contains(&Flag::Flagged),
            flags.contains(&Flag::Answered),
            flags.contains(&Flag::Forwarded),
            id,
        ])?;
    }

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS msg_read ON messages (read);
        CREATE INDEX IF NOT EXISTS msg_flagged ON messages (flagged);
        ",
    )?;
    Ok(())
}

/// Moves the threading information of messages to the `threads`
/// table. Message ids of the old columns become thread ids.
pub fn create_threads_table(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS threads;
        CREATE TABLE threads (
            id         INTEGER PRIMARY KEY,
            message_id INTEGER,
            root       INTEGER,
            parent     INTEGER
        );
        DROP INDEX IF EXISTS threads_message_id;
        CREATE INDEX IF NOT EXISTS threads_message_id ON threads (message_id);
        DROP INDEX IF EXISTS threads_root;
        CREATE INDEX IF NOT EXISTS threads_root ON threads (root);
        DROP INDEX IF EXISTS threads_parent;
        CREATE INDEX IF NOT EXISTS threads_parent ON threads (parent);

        INSERT INTO threads (message_id) SELECT id FROM messages;

        UPDATE threads
        SET root = (
            SELECT t.id FROM threads t
            WHERE t.message_id = (SELECT thread_root FROM messages WHERE messages.id = threads.message_id)
        )
        WHERE (SELECT thread_root FROM messages WHERE messages.id = threads.message_id) IS NOT NULL;

        UPDATE threads
        SET parent = (
            SELECT t.id FROM threads t
            WHERE t.message_id = (SELECT thread_parent FROM messages WHERE messages.id = threads.message_id)
        )
        WHERE (SELECT thread_parent FROM messages WHERE messages.id = threads.message_id) IS NOT NULL;

        DROP INDEX IF EXISTS msg_thread_root;
        DROP INDEX IF EXISTS msg_thread_parent;
        UPDATE messages SET thread_root = NULL, thread_parent = NULL;

        DROP TRIGGER IF EXISTS delete_message;
        CREATE TRIGGER delete_message BEFORE DELETE ON messages
        BEGIN
            DELETE FROM attachments WHERE old.id = message_id;
            DELETE FROM headers WHERE old.id = message_id;
            DELETE FROM threads WHERE old.id = message_id;
        END;
        ",
    )?;
    Ok(())
}

pub fn backfill_thread_roots(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute("UPDATE threads SET root = id WHERE root IS NULL", [])?;
    conn.execute_batch(CREATE_THREAD_ROOT_TRIGGER)?;
    Ok(())
}

pub fn create_composite_index(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS msg_composite ON messages (deleted, empty, folder_id, flagged, read)",
        [],
    )?;
    Ok(())
}

pub fn add_notify_class_column(conn: &Connection, ctx: &mut MigrationContext) -> Result<()> {
    add_column(conn, "folders", "notify_class TEXT default 'INHERITED'")?;
    conn.execute(
        "UPDATE folders SET notify_class = 'FIRST_CLASS' WHERE name = ?",
        [&ctx.config.inbox_folder],
    )?;
    Ok(())
}

pub fn create_fulltext_table(conn: &Connection, ctx: &mut MigrationContext) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS messages_fulltext USING fts4 (fulltext)",
    )?;
    conn.execute_batch(CREATE_DELETE_TRIGGERS)?;
    ctx.rebuild_fulltext_index = true;
    Ok(())
}

pub fn normalize_folder_booleans(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute_batch(
        "
        UPDATE folders SET integrate = 0 WHERE integrate IS NULL;
        UPDATE folders SET top_group = 0 WHERE top_group IS NULL;
        ",
    )?;
    Ok(())
}

pub fn add_new_message_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "messages", "new_message INTEGER default 0")
}

pub fn add_visible_column(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    add_column(conn, "folders", "visible INTEGER default 1")
}

pub fn migrate_legacy_pending_commands(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    legacy_pending_commands::migrate_pending_commands(conn)
}

pub fn delete_internal_outbox_folder(conn: &Connection, _: &mut MigrationContext) -> Result<()> {
    conn.execute("DELETE FROM folders WHERE name = ?", [INTERNAL_OUTBOX_FOLDER])?;
    Ok(())
}

fn find_folder_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM folders WHERE name = ?", [name], |row| row.get(0))
        .optional()?;
    Ok(id)
}
