//! Pending command module.
//!
//! This module contains the operations queued while offline, waiting
//! to be replayed against the server. They are persisted in the
//! `pending_commands` table as a command name and a JSON payload.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, result};
use thiserror::Error;

use crate::Flag;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build pending command {0}: folder is missing")]
    MissingFolderError(&'static str),
    #[error("cannot build pending command {0}: flag is missing")]
    MissingFlagError(&'static str),
    #[error("cannot build pending command {0}: uid list is empty")]
    EmptyUidsError(&'static str),
    #[error("cannot build pending command {0}: invalid uid {1:?}")]
    InvalidUidError(&'static str, String),
    #[error("cannot parse pending command {0}")]
    UnknownCommandError(String),
    #[error("cannot decode legacy pending command argument {0}")]
    DecodeArgumentError(String),
    #[error("cannot serialize pending command {1}")]
    SerializeError(#[source] serde_json::Error, &'static str),
    #[error("cannot deserialize pending command {1}")]
    DeserializeError(#[source] serde_json::Error, String),
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingAppend {
    pub folder: String,
    pub uid: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingMarkAllAsRead {
    pub folder: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingSetFlag {
    pub folder: String,
    pub value: bool,
    pub flag: Flag,
    pub uids: Vec<String>,
}

/// Represents a queued copy or move. Either the plain source UIDs
/// are known, or the mapping from source UIDs to the temporary UIDs
/// given to the local copies.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingMoveOrCopy {
    pub src_folder: String,
    pub dest_folder: String,
    pub is_copy: bool,
    pub uids: Option<Vec<String>>,
    pub new_uid_map: Option<HashMap<String, String>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingDelete {
    pub folder: String,
    pub uids: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingExpunge {
    pub folder: String,
}

/// Represents the pending command variants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PendingCommand {
    Append(PendingAppend),
    MarkAllAsRead(PendingMarkAllAsRead),
    SetFlag(PendingSetFlag),
    MoveOrCopy(PendingMoveOrCopy),
    Delete(PendingDelete),
    Expunge(PendingExpunge),
    EmptyTrash,
}

impl PendingCommand {
    pub const APPEND: &'static str = "append";
    pub const MARK_ALL_AS_READ: &'static str = "mark_all_as_read";
    pub const SET_FLAG: &'static str = "set_flag";
    pub const MOVE_OR_COPY: &'static str = "move_or_copy";
    pub const DELETE: &'static str = "delete";
    pub const EXPUNGE: &'static str = "expunge";
    pub const EMPTY_TRASH: &'static str = "empty_trash";

    pub fn append<F: ToString, U: ToString>(folder: F, uid: U) -> Result<Self> {
        let folder = check_folder(Self::APPEND, folder)?;
        let uid = check_uid(Self::APPEND, uid.to_string())?;
        Ok(Self::Append(PendingAppend { folder, uid }))
    }

    pub fn mark_all_as_read<F: ToString>(folder: F) -> Result<Self> {
        let folder = check_folder(Self::MARK_ALL_AS_READ, folder)?;
        Ok(Self::MarkAllAsRead(PendingMarkAllAsRead { folder }))
    }

    pub fn set_flag<F, U>(folder: F, value: bool, flag: Flag, uids: U) -> Result<Self>
    where
        F: ToString,
        U: IntoIterator,
        U::Item: ToString,
    {
        let folder = check_folder(Self::SET_FLAG, folder)?;
        if matches!(&flag, Flag::Custom(name) if name.trim().is_empty()) {
            return Err(Error::MissingFlagError(Self::SET_FLAG));
        }
        let uids = check_uids(Self::SET_FLAG, uids)?;
        Ok(Self::SetFlag(PendingSetFlag {
            folder,
            value,
            flag,
            uids,
        }))
    }

    pub fn move_or_copy<F, D, U>(src_folder: F, dest_folder: D, is_copy: bool, uids: U) -> Result<Self>
    where
        F: ToString,
        D: ToString,
        U: IntoIterator,
        U::Item: ToString,
    {
        Ok(Self::MoveOrCopy(PendingMoveOrCopy {
            src_folder: check_folder(Self::MOVE_OR_COPY, src_folder)?,
            dest_folder: check_folder(Self::MOVE_OR_COPY, dest_folder)?,
            is_copy,
            uids: Some(check_uids(Self::MOVE_OR_COPY, uids)?),
            new_uid_map: None,
        }))
    }

    pub fn move_or_copy_with_new_uids<F, D>(
        src_folder: F,
        dest_folder: D,
        is_copy: bool,
        new_uid_map: HashMap<String, String>,
    ) -> Result<Self>
    where
        F: ToString,
        D: ToString,
    {
        check_uids(Self::MOVE_OR_COPY, new_uid_map.keys())?;
        check_uids(Self::MOVE_OR_COPY, new_uid_map.values())?;

        Ok(Self::MoveOrCopy(PendingMoveOrCopy {
            src_folder: check_folder(Self::MOVE_OR_COPY, src_folder)?,
            dest_folder: check_folder(Self::MOVE_OR_COPY, dest_folder)?,
            is_copy,
            uids: None,
            new_uid_map: Some(new_uid_map),
        }))
    }

    pub fn delete<F, U>(folder: F, uids: U) -> Result<Self>
    where
        F: ToString,
        U: IntoIterator,
        U::Item: ToString,
    {
        let folder = check_folder(Self::DELETE, folder)?;
        let uids = check_uids(Self::DELETE, uids)?;
        Ok(Self::Delete(PendingDelete { folder, uids }))
    }

    pub fn expunge<F: ToString>(folder: F) -> Result<Self> {
        let folder = check_folder(Self::EXPUNGE, folder)?;
        Ok(Self::Expunge(PendingExpunge { folder }))
    }

    pub fn empty_trash() -> Self {
        Self::EmptyTrash
    }

    /// Returns the name stored in the `command` column.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Append(_) => Self::APPEND,
            Self::MarkAllAsRead(_) => Self::MARK_ALL_AS_READ,
            Self::SetFlag(_) => Self::SET_FLAG,
            Self::MoveOrCopy(_) => Self::MOVE_OR_COPY,
            Self::Delete(_) => Self::DELETE,
            Self::Expunge(_) => Self::EXPUNGE,
            Self::EmptyTrash => Self::EMPTY_TRASH,
        }
    }

    /// Serializes the payload stored in the `data` column.
    pub fn to_data(&self) -> Result<String> {
        let data = match self {
            Self::Append(cmd) => serde_json::to_string(cmd),
            Self::MarkAllAsRead(cmd) => serde_json::to_string(cmd),
            Self::SetFlag(cmd) => serde_json::to_string(cmd),
            Self::MoveOrCopy(cmd) => serde_json::to_string(cmd),
            Self::Delete(cmd) => serde_json::to_string(cmd),
            Self::Expunge(cmd) => serde_json::to_string(cmd),
            Self::EmptyTrash => Ok(String::from("{}")),
        };
        data.map_err(|err| Error::SerializeError(err, self.name()))
    }

    /// Rebuilds a command from its `command` and `data` columns. The
    /// decoded payload goes through the same checks as the
    /// constructors.
    pub fn from_data(name: &str, data: &str) -> Result<Self> {
        let err = |err| Error::DeserializeError(err, name.to_owned());

        match name {
            Self::APPEND => {
                let cmd: PendingAppend = serde_json::from_str(data).map_err(err)?;
                Self::append(cmd.folder, cmd.uid)
            }
            Self::MARK_ALL_AS_READ => {
                let cmd: PendingMarkAllAsRead = serde_json::from_str(data).map_err(err)?;
                Self::mark_all_as_read(cmd.folder)
            }
            Self::SET_FLAG => {
                let cmd: PendingSetFlag = serde_json::from_str(data).map_err(err)?;
                Self::set_flag(cmd.folder, cmd.value, cmd.flag, cmd.uids)
            }
            Self::MOVE_OR_COPY => {
                let cmd: PendingMoveOrCopy = serde_json::from_str(data).map_err(err)?;
                match (cmd.new_uid_map, cmd.uids) {
                    (Some(new_uid_map), _) => Self::move_or_copy_with_new_uids(
                        cmd.src_folder,
                        cmd.dest_folder,
                        cmd.is_copy,
                        new_uid_map,
                    ),
                    (None, Some(uids)) => {
                        Self::move_or_copy(cmd.src_folder, cmd.dest_folder, cmd.is_copy, uids)
                    }
                    (None, None) => Err(Error::EmptyUidsError(Self::MOVE_OR_COPY)),
                }
            }
            Self::DELETE => {
                let cmd: PendingDelete = serde_json::from_str(data).map_err(err)?;
                Self::delete(cmd.folder, cmd.uids)
            }
            Self::EXPUNGE => {
                let cmd: PendingExpunge = serde_json::from_str(data).map_err(err)?;
                Self::expunge(cmd.folder)
            }
            Self::EMPTY_TRASH => Ok(Self::EmptyTrash),
            name => Err(Error::UnknownCommandError(name.to_owned())),
        }
    }
}

/// Represents a pending command read back from the store, along with
/// the id of its row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingCommandEntry {
    pub id: i64,
    pub command: PendingCommand,
}

fn check_folder<F: ToString>(command: &'static str, folder: F) -> Result<String> {
    let folder = folder.to_string();
    if folder.is_empty() {
        return Err(Error::MissingFolderError(command));
    }
    Ok(folder)
}

fn check_uid(command: &'static str, uid: String) -> Result<String> {
    if uid.is_empty() || uid.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidUidError(command, uid));
    }
    Ok(uid)
}

fn check_uids<U>(command: &'static str, uids: U) -> Result<Vec<String>>
where
    U: IntoIterator,
    U::Item: ToString,
{
    let uids = uids
        .into_iter()
        .map(|uid| check_uid(command, uid.to_string()))
        .collect::<Result<Vec<_>>>()?;

    if uids.is_empty() {
        return Err(Error::EmptyUidsError(command));
    }

    Ok(uids)
}
