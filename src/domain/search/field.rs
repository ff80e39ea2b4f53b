use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::Error;

/// Represents the message properties a search condition can test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchField {
    AttachmentCount,
    Bcc,
    Cc,
    Date,
    Deleted,
    Flag,
    Flagged,
    Folder,
    Id,
    Integrate,
    MessageContents,
    NewMessage,
    Read,
    ReplyTo,
    Sender,
    Subject,
    ThreadRoot,
    To,
    Uid,
    Visible,
    DisplayClass,
}

impl SearchField {
    pub const ALL: [SearchField; 21] = [
        Self::AttachmentCount,
        Self::Bcc,
        Self::Cc,
        Self::Date,
        Self::Deleted,
        Self::Flag,
        Self::Flagged,
        Self::Folder,
        Self::Id,
        Self::Integrate,
        Self::MessageContents,
        Self::NewMessage,
        Self::Read,
        Self::ReplyTo,
        Self::Sender,
        Self::Subject,
        Self::ThreadRoot,
        Self::To,
        Self::Uid,
        Self::Visible,
        Self::DisplayClass,
    ];

    /// Returns the column the field is stored in. The message
    /// contents live in the full-text index, hence have no column.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            Self::AttachmentCount => Some("attachment_count"),
            Self::Bcc => Some("bcc_list"),
            Self::Cc => Some("cc_list"),
            Self::Date => Some("date"),
            Self::Deleted => Some("deleted"),
            Self::Flag => Some("flags"),
            Self::Flagged => Some("flagged"),
            Self::Folder => Some("folder_id"),
            Self::Id => Some("id"),
            Self::Integrate => Some("integrate"),
            Self::MessageContents => None,
            Self::NewMessage => Some("new_message"),
            Self::Read => Some("read"),
            Self::ReplyTo => Some("reply_to_list"),
            Self::Sender => Some("sender_list"),
            Self::Subject => Some("subject"),
            Self::ThreadRoot => Some("threads.root"),
            Self::To => Some("to_list"),
            Self::Uid => Some("uid"),
            Self::Visible => Some("visible"),
            Self::DisplayClass => Some("display_class"),
        }
    }

    /// Tells if the column holds numbers or booleans, which are
    /// compared exactly instead of with `LIKE`.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::AttachmentCount
                | Self::Date
                | Self::Deleted
                | Self::Flagged
                | Self::Folder
                | Self::Id
                | Self::Integrate
                | Self::NewMessage
                | Self::Read
                | Self::ThreadRoot
                | Self::Visible
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AttachmentCount => "ATTACHMENT_COUNT",
            Self::Bcc => "BCC",
            Self::Cc => "CC",
            Self::Date => "DATE",
            Self::Deleted => "DELETED",
            Self::Flag => "FLAG",
            Self::Flagged => "FLAGGED",
            Self::Folder => "FOLDER",
            Self::Id => "ID",
            Self::Integrate => "INTEGRATE",
            Self::MessageContents => "MESSAGE_CONTENTS",
            Self::NewMessage => "NEW_MESSAGE",
            Self::Read => "READ",
            Self::ReplyTo => "REPLY_TO",
            Self::Sender => "SENDER",
            Self::Subject => "SUBJECT",
            Self::ThreadRoot => "THREAD_ROOT",
            Self::To => "TO",
            Self::Uid => "UID",
            Self::Visible => "VISIBLE",
            Self::DisplayClass => "DISPLAY_CLASS",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SearchField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_owned()))
    }
}

/// Represents the comparison a search condition applies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attribute {
    Contains,
    Equals,
    NotEquals,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "CONTAINS"),
            Self::Equals => write!(f, "EQUALS"),
            Self::NotEquals => write!(f, "NOT_EQUALS"),
        }
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CONTAINS" => Ok(Self::Contains),
            "EQUALS" => Ok(Self::Equals),
            "NOT_EQUALS" => Ok(Self::NotEquals),
            _ => Err(Error::UnknownAttribute(s.to_owned())),
        }
    }
}
