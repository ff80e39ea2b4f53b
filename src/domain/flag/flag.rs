use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the flag variants.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Flag {
    Seen,
    Answered,
    Forwarded,
    Flagged,
    Deleted,
    Draft,
    Recent,
    Custom(String),
}

impl Flag {
    pub fn custom<F: ToString>(flag: F) -> Self {
        Self::Custom(flag.to_string())
    }

    /// Returns the name used for this flag in the `flags` column of
    /// the local store: upper case for known flags, custom flags are
    /// kept as they are.
    pub fn to_store_name(&self) -> String {
        match self {
            Flag::Custom(flag) => flag.clone(),
            flag => flag.to_string().to_uppercase(),
        }
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "seen" => Flag::Seen,
            "answered" => Flag::Answered,
            "forwarded" => Flag::Forwarded,
            "flagged" => Flag::Flagged,
            "deleted" => Flag::Deleted,
            "draft" => Flag::Draft,
            "recent" => Flag::Recent,
            _ => Flag::Custom(s.into()),
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Flag::Seen => write!(f, "seen"),
            Flag::Answered => write!(f, "answered"),
            Flag::Forwarded => write!(f, "forwarded"),
            Flag::Flagged => write!(f, "flagged"),
            Flag::Deleted => write!(f, "deleted"),
            Flag::Draft => write!(f, "draft"),
            Flag::Recent => write!(f, "recent"),
            Flag::Custom(flag) => write!(f, "{}", flag),
        }
    }
}
