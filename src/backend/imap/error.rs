use std::{io, num::ParseIntError, result};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot get token at index {0}: response has {1} tokens")]
    IndexOutOfBounds(usize, usize),
    #[error("cannot read token at index {index} as {expected}: found {found}")]
    TokenType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("cannot parse number {1}")]
    ParseNumberError(#[source] ParseIntError, String),
    #[error("cannot parse imap date time {0}")]
    ParseDateError(String),

    #[error("cannot read imap response")]
    ReadResponseError(#[source] io::Error),
    #[error("cannot read imap response: end of stream reached while reading {0}")]
    EndOfStreamError(&'static str),
    #[error("cannot read imap response: expected {expected:?} but got {found:?}")]
    UnexpectedCharError { expected: char, found: char },
    #[error("cannot read imap response: unexpected character {0:?} at start of atom")]
    EmptyAtomError(char),
    #[error("cannot read imap response: line ended before closing {0:?}")]
    UnterminatedListError(char),
    #[error("cannot read imap response: invalid literal size {0}")]
    InvalidLiteralSizeError(String),
    #[error("cannot read imap response: first token is not a string")]
    NonStringFirstTokenError,
    #[error("negative imap response for command {0}: {1}")]
    NegativeResponseError(String, String),
}

pub type Result<T> = result::Result<T, Error>;
