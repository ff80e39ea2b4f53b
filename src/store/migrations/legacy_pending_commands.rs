//! Legacy pending commands module.
//!
//! Before version 60, pending commands were stored as a command name
//! and a comma-separated list of URL-encoded arguments. This module
//! turns them into [`PendingCommand`]s.

use log::{debug, warn};
use rusqlite::Connection;
use std::collections::HashMap;

use crate::{
    store::{
        pending_command::{self, PendingCommand},
        schema, Result,
    },
    Flag,
};

const LEGACY_PREFIX: &str = "com.fsck.k9.MessagingController.";

const SELECT_LEGACY_COMMANDS: &str = "
    SELECT command, arguments
    FROM pending_commands
    ORDER BY id
";

const RECREATE_PENDING_COMMANDS_TABLE: &str = "
    DROP TABLE IF EXISTS pending_commands;
    CREATE TABLE pending_commands (
        id      INTEGER PRIMARY KEY,
        command TEXT,
        data    TEXT
    );
";

const INSERT_PENDING_COMMAND: &str = "
    INSERT INTO pending_commands (command, data)
    VALUES (?, ?)
";

/// Rewrites the `pending_commands` table from the legacy layout to
/// the current one. Commands that cannot be converted are dropped.
/// Does nothing if the table already has the current layout.
pub fn migrate_pending_commands(conn: &Connection) -> Result<()> {
    if schema::columns(conn, "pending_commands")?.iter().any(|c| c == "data") {
        debug!("pending commands already migrated, skipping");
        return Ok(());
    }

    let mut stmt = conn.prepare(SELECT_LEGACY_COMMANDS)?;
    let rows: Vec<(Option<String>, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    drop(stmt);

    let mut commands = Vec::new();
    for (name, arguments) in rows {
        let name = name.unwrap_or_default();
        let command = decode_arguments(arguments.as_deref().unwrap_or_default())
            .and_then(|arguments| migrate_pending_command(&name, &arguments));

        match command {
            Ok(command) => commands.push(command),
            Err(err) => warn!("dropping legacy pending command {}: {}", name, err),
        }
    }

    conn.execute_batch(RECREATE_PENDING_COMMANDS_TABLE)?;

    for command in &commands {
        let data = command.to_data()?;
        conn.execute(INSERT_PENDING_COMMAND, [command.name(), data.as_str()])?;
    }

    debug!("migrated {} legacy pending commands", commands.len());
    Ok(())
}

/// Splits and decodes the legacy arguments column. An empty column
/// holds no argument.
pub fn decode_arguments(arguments: &str) -> pending_command::Result<Vec<String>> {
    if arguments.is_empty() {
        return Ok(Vec::new());
    }

    arguments
        .split(',')
        .map(|argument| {
            urlencoding::decode(&argument.replace('+', " "))
                .map(|argument| argument.into_owned())
                .map_err(|_| pending_command::Error::DecodeArgumentError(argument.to_owned()))
        })
        .collect()
}

/// Converts one legacy command, given its name and decoded
/// arguments.
pub fn migrate_pending_command(name: &str, arguments: &[String]) -> pending_command::Result<PendingCommand> {
    let unknown = || pending_command::Error::UnknownCommandError(name.to_owned());
    let short_name = name.strip_prefix(LEGACY_PREFIX).ok_or_else(unknown)?;
    let arg = |index: usize| arguments.get(index).map(String::as_str).unwrap_or_default();

    match short_name {
        "append" => PendingCommand::append(arg(0), arg(1)),
        "markAllAsRead" => PendingCommand::mark_all_as_read(arg(0)),
        "expunge" => PendingCommand::expunge(arg(0)),
        "emptyTrash" => Ok(PendingCommand::empty_trash()),
        "delete" => PendingCommand::delete(arg(0), uids_from(arguments, 1)),
        "setFlag" => PendingCommand::set_flag(arg(0), parse_bool(arg(2)), parse_flag(arg(3)), [arg(1)]),
        "setFlagBulk" => PendingCommand::set_flag(
            arg(0),
            parse_bool(arg(1)),
            parse_flag(arg(2)),
            uids_from(arguments, 3),
        ),
        "moveOrCopy" => PendingCommand::move_or_copy(arg(0), arg(2), parse_bool(arg(3)), [arg(1)]),
        "moveOrCopyBulk" => {
            PendingCommand::move_or_copy(arg(0), arg(1), parse_bool(arg(2)), uids_from(arguments, 3))
        }
        "moveOrCopyBulkNew" => {
            let uids = uids_from(arguments, 4);
            if !parse_bool(arg(3)) {
                return PendingCommand::move_or_copy(arg(0), arg(1), parse_bool(arg(2)), uids);
            }

            if uids.len() % 2 != 0 {
                return Err(unknown());
            }
            let (src_uids, dest_uids) = uids.split_at(uids.len() / 2);
            let new_uid_map: HashMap<String, String> = src_uids
                .iter()
                .cloned()
                .zip(dest_uids.iter().cloned())
                .collect();
            PendingCommand::move_or_copy_with_new_uids(arg(0), arg(1), parse_bool(arg(2)), new_uid_map)
        }
        _ => Err(unknown()),
    }
}

fn uids_from(arguments: &[String], start: usize) -> Vec<String> {
    arguments.iter().skip(start).cloned().collect()
}

/// Booleans were written as `true` and `false`, anything else reads
/// as false.
fn parse_bool(argument: &str) -> bool {
    argument.eq_ignore_ascii_case("true")
}

/// An empty flag is kept as an empty custom flag, which the
/// command constructor rejects.
fn parse_flag(argument: &str) -> Flag {
    Flag::from(argument)
}
