//! IMAP UID command module.
//!
//! This module contains builders for the selected-state commands
//! taking a UID set. Long sets are split into several commands so
//! each line stays below the length accepted by servers, which is
//! why their responses arrive in batches.

use std::{collections::BTreeSet, fmt};

use crate::Flags;

/// Line length most servers accept for a single command.
pub const DEFAULT_LENGTH_LIMIT: usize = 1000;

/// Represents a command acting on a set of UIDs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UidCommand {
    name: &'static str,
    set_prefix: &'static str,
    uids: BTreeSet<u64>,
    arguments: Option<String>,
}

impl UidCommand {
    fn new<I>(name: &'static str, set_prefix: &'static str, uids: I, arguments: Option<String>) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self {
            name,
            set_prefix,
            uids: uids.into_iter().collect(),
            arguments,
        }
    }

    /// Builds `UID SEARCH UID <set> [criteria]`.
    pub fn search<I>(uids: I, criteria: Option<&str>) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self::new("UID SEARCH", "UID ", uids, criteria.map(ToOwned::to_owned))
    }

    pub fn copy<I>(uids: I, destination: &str) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self::new("UID COPY", "", uids, Some(quote(destination)))
    }

    pub fn r#move<I>(uids: I, destination: &str) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self::new("UID MOVE", "", uids, Some(quote(destination)))
    }

    /// Builds `UID STORE <set> (+|-)FLAGS.SILENT (<flags>)`.
    pub fn store<I>(uids: I, value: bool, flags: &Flags) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let arguments = format!(
            "{}FLAGS.SILENT ({})",
            if value { "+" } else { "-" },
            flags.to_imap_keywords().join(" ")
        );
        Self::new("UID STORE", "", uids, Some(arguments))
    }

    pub fn uids(&self) -> &BTreeSet<u64> {
        &self.uids
    }

    /// Splits the command into several ones whose rendered line does
    /// not exceed the given length. A command always keeps at least
    /// one UID, even if its line ends up longer than the limit.
    pub fn split(&self, length_limit: usize) -> Vec<UidCommand> {
        let budget = length_limit.saturating_sub(self.render("").len());
        let mut groups: Vec<SetBuilder> = Vec::new();

        for uid in self.uids.iter().copied() {
            match groups.last_mut() {
                Some(group) if group.len_with(uid) <= budget => group.push(uid),
                _ => {
                    let mut group = SetBuilder::default();
                    group.push(uid);
                    groups.push(group);
                }
            }
        }

        groups
            .into_iter()
            .map(|group| Self {
                uids: group.uids,
                ..self.clone()
            })
            .collect()
    }

    fn render(&self, set: &str) -> String {
        let mut line = format!("{} {}{}", self.name, self.set_prefix, set);
        if let Some(arguments) = &self.arguments {
            line.push(' ');
            line.push_str(arguments);
        }
        line
    }
}

impl fmt::Display for UidCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let set = super::compress_sequence_set(self.uids.iter().copied());
        write!(f, "{}", self.render(&set))
    }
}

/// Keeps track of the compressed length of an ascending UID set
/// while it grows.
#[derive(Default)]
struct SetBuilder {
    uids: BTreeSet<u64>,
    range: Option<(u64, u64)>,
    closed_len: usize,
}

impl SetBuilder {
    fn range_len((start, end): (u64, u64)) -> usize {
        if start == end {
            digits(start)
        } else {
            digits(start) + 1 + digits(end)
        }
    }

    fn len_with(&self, uid: u64) -> usize {
        match self.range {
            None => digits(uid),
            Some((start, end)) if end + 1 == uid => self.closed_len + Self::range_len((start, uid)),
            Some(range) => self.closed_len + Self::range_len(range) + 1 + digits(uid),
        }
    }

    fn push(&mut self, uid: u64) {
        self.range = match self.range {
            None => Some((uid, uid)),
            Some((start, end)) if end + 1 == uid => Some((start, uid)),
            Some(range) => {
                self.closed_len += Self::range_len(range) + 1;
                Some((uid, uid))
            }
        };
        self.uids.insert(uid);
    }
}

fn digits(n: u64) -> usize {
    n.to_string().len()
}

/// Quotes a mailbox name as an IMAP quoted string.
fn quote(mailbox: &str) -> String {
    format!("\"{}\"", mailbox.replace('\\', "\\\\").replace('"', "\\\""))
}
