use std::result;
use thiserror::Error;

use super::{Attribute, SearchField};

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse search field {0}")]
    UnknownField(String),
    #[error("cannot parse search attribute {0}")]
    UnknownAttribute(String),
    #[error("cannot compile search condition: field {0} has no column")]
    UnmappedField(SearchField),
    #[error("cannot compile full-text search condition: attribute {0} is not supported")]
    InvalidFulltextAttribute(Attribute),
    #[error("cannot build column qualifier")]
    BuildQualifierError(#[source] regex::Error),
}

pub type Result<T> = result::Result<T, Error>;
