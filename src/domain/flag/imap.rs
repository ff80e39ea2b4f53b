//! IMAP flag conversion module.

use crate::{
    backend::imap::{ImapList, ImapToken},
    Flag, Flags,
};

impl Flag {
    /// Parses an IMAP system flag or keyword.
    pub fn from_imap_keyword(keyword: &str) -> Self {
        match keyword.to_lowercase().as_str() {
            "\\seen" => Flag::Seen,
            "\\answered" => Flag::Answered,
            "$forwarded" => Flag::Forwarded,
            "\\flagged" => Flag::Flagged,
            "\\deleted" => Flag::Deleted,
            "\\draft" => Flag::Draft,
            "\\recent" => Flag::Recent,
            _ => Flag::custom(keyword),
        }
    }

    /// Returns the IMAP keyword for this flag. `\Recent` is only set
    /// by the server, hence has no keyword.
    pub fn to_imap_keyword(&self) -> Option<String> {
        match self {
            Flag::Seen => Some("\\Seen".into()),
            Flag::Answered => Some("\\Answered".into()),
            Flag::Forwarded => Some("$Forwarded".into()),
            Flag::Flagged => Some("\\Flagged".into()),
            Flag::Deleted => Some("\\Deleted".into()),
            Flag::Draft => Some("\\Draft".into()),
            Flag::Recent => None,
            Flag::Custom(keyword) => Some(keyword.clone()),
        }
    }
}

impl Flags {
    /// Returns the sorted IMAP keywords of these flags.
    pub fn to_imap_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self.iter().filter_map(Flag::to_imap_keyword).collect();
        keywords.sort();
        keywords
    }
}

/// Builds flags from a `FLAGS (...)` list. Tokens that are not
/// strings are ignored.
impl From<&ImapList> for Flags {
    fn from(list: &ImapList) -> Self {
        list.iter()
            .filter_map(ImapToken::as_str)
            .map(Flag::from_imap_keyword)
            .collect()
    }
}
