use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, ops};

use crate::Flag;

/// Represents the list of flags.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Flags(pub HashSet<Flag>);

impl Flags {
    /// Parses the comma-separated `flags` column of the local store.
    /// Empty entries are ignored.
    pub fn from_store_list(flags: &str) -> Self {
        flags
            .split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(Flag::from)
            .collect()
    }

    /// Builds the comma-separated `flags` column, sorted so the
    /// column stays stable across writes.
    pub fn to_store_list(&self) -> String {
        let mut names: Vec<String> = self.iter().map(Flag::to_store_name).collect();
        names.sort();
        names.join(",")
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut glue = "";

        for flag in &self.0 {
            write!(f, "{}{}", glue, flag)?;
            glue = " ";
        }

        Ok(())
    }
}

impl ops::Deref for Flags {
    type Target = HashSet<Flag>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for Flags {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<&str> for Flags {
    fn from(flags: &str) -> Self {
        Flags(
            flags
                .split_whitespace()
                .map(|flag| flag.trim().into())
                .collect(),
        )
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        let mut flags = Flags::default();
        flags.extend(iter);
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_list() {
        let flags = Flags::from_store_list("SEEN,,X_GOT_ALL_HEADERS, FLAGGED");
        assert_eq!(flags.len(), 3);
        assert!(flags.contains(&Flag::Seen));
        assert!(flags.contains(&Flag::Flagged));
        assert_eq!(flags.to_store_list(), "FLAGGED,SEEN,X_GOT_ALL_HEADERS");
        assert!(Flags::from_store_list("").is_empty());
    }

    #[test]
    fn from_whitespace_separated() {
        let flags = Flags::from("seen  answered");
        assert_eq!(
            flags,
            Flags::from_iter([Flag::Seen, Flag::Answered])
        );
    }
}
