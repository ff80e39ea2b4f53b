//! IMAP response module.
//!
//! This module contains the structured representation of a server
//! response line: an ordered list of tokens, where each token is
//! either a string, a number or a nested list.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use log::trace;
use std::{fmt, ops};

use super::{Error, Result};

/// Well-known response atoms.
pub mod responses {
    pub const OK: &str = "OK";
    pub const NO: &str = "NO";
    pub const BAD: &str = "BAD";
    pub const PREAUTH: &str = "PREAUTH";
    pub const BYE: &str = "BYE";
    pub const SEARCH: &str = "SEARCH";
    pub const COPYUID: &str = "COPYUID";
    pub const EXISTS: &str = "EXISTS";
    pub const EXPUNGE: &str = "EXPUNGE";
    pub const NIL: &str = "NIL";
}

/// Canonical IMAP `date-time` format, tried first.
const DATE_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// Formats emitted by non-conformant servers, tried in this order
/// after the canonical one.
const BAD_DATE_TIME_FORMATS: [&str; 2] = ["%d %b %Y %H:%M:%S %z", "%a, %d %b %Y %H:%M:%S %z"];

/// Same as the canonical format without the zone, read as UTC.
const BAD_DATE_TIME_FORMAT_WITHOUT_ZONE: &str = "%d-%b-%Y %H:%M:%S";

/// Parses an IMAP date time, falling back to the known bad formats
/// when the canonical one does not match.
pub fn parse_date_time(date: &str) -> Result<DateTime<FixedOffset>> {
    let date = date.trim();

    if let Ok(parsed) = DateTime::parse_from_str(date, DATE_TIME_FORMAT) {
        return Ok(parsed);
    }

    for format in BAD_DATE_TIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(date, format) {
            trace!("parsed date time {:?} using bad format {:?}", date, format);
            return Ok(parsed);
        }
    }

    NaiveDateTime::parse_from_str(date, BAD_DATE_TIME_FORMAT_WITHOUT_ZONE)
        .map(|naive| Utc.from_utc_datetime(&naive).into())
        .map_err(|_| Error::ParseDateError(date.to_owned()))
}

/// Represents one element of a response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImapToken {
    String(String),
    Number(u64),
    List(ImapList),
}

impl ImapToken {
    fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ImapList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Compares the token to the given atom, ignoring the case.
    /// Only string tokens can match.
    pub fn equals_ignore_case(&self, symbol: &str) -> bool {
        matches!(self, Self::String(string) if string.eq_ignore_ascii_case(symbol))
    }
}

impl From<&str> for ImapToken {
    fn from(string: &str) -> Self {
        Self::String(string.to_owned())
    }
}

impl From<String> for ImapToken {
    fn from(string: String) -> Self {
        Self::String(string)
    }
}

impl From<u64> for ImapToken {
    fn from(number: u64) -> Self {
        Self::Number(number)
    }
}

impl From<ImapList> for ImapToken {
    fn from(list: ImapList) -> Self {
        Self::List(list)
    }
}

impl fmt::Display for ImapToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::String(string) => write!(f, "{}", string),
            Self::Number(number) => write!(f, "{}", number),
            Self::List(list) => write!(f, "({})", list),
        }
    }
}

/// Represents an ordered list of tokens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImapList(Vec<ImapToken>);

impl ImapList {
    pub fn get_token(&self, index: usize) -> Result<&ImapToken> {
        self.get(index)
            .ok_or_else(|| Error::IndexOutOfBounds(index, self.len()))
    }

    pub fn get_list(&self, index: usize) -> Result<&ImapList> {
        match self.get_token(index)? {
            ImapToken::List(list) => Ok(list),
            token => Err(type_error(index, "list", token)),
        }
    }

    pub fn get_string(&self, index: usize) -> Result<&str> {
        match self.get_token(index)? {
            ImapToken::String(string) => Ok(string),
            token => Err(type_error(index, "string", token)),
        }
    }

    /// Reads the token as a number. String tokens are parsed, since
    /// the response parser keeps numbers as atoms.
    pub fn get_number(&self, index: usize) -> Result<u64> {
        match self.get_token(index)? {
            ImapToken::Number(number) => Ok(*number),
            ImapToken::String(string) => parse_number(string),
            token => Err(type_error(index, "number", token)),
        }
    }

    pub fn get_date(&self, index: usize) -> Result<DateTime<FixedOffset>> {
        parse_date_time(self.get_string(index)?)
    }

    pub fn is_string(&self, index: usize) -> bool {
        matches!(self.get(index), Some(ImapToken::String(_)))
    }

    pub fn is_list(&self, index: usize) -> bool {
        matches!(self.get(index), Some(ImapToken::List(_)))
    }

    /// Finds the index of the first token matching the given key,
    /// ignoring the case.
    pub fn key_index(&self, key: &str) -> Option<usize> {
        self.iter().position(|token| token.equals_ignore_case(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_index(key).is_some()
    }

    /// Finds the token following the given key. Returns `None` when
    /// the key is missing or is the last token.
    pub fn keyed_value(&self, key: &str) -> Option<&ImapToken> {
        self.iter()
            .zip(self.iter().skip(1))
            .find(|(token, _)| token.equals_ignore_case(key))
            .map(|(_, value)| value)
    }

    pub fn keyed_list(&self, key: &str) -> Result<Option<&ImapList>> {
        self.keyed(key, "list", ImapToken::as_list)
    }

    pub fn keyed_string(&self, key: &str) -> Result<Option<&str>> {
        self.keyed(key, "string", ImapToken::as_str)
    }

    pub fn keyed_number(&self, key: &str) -> Result<Option<u64>> {
        match self.keyed_value(key) {
            None => Ok(None),
            Some(ImapToken::Number(number)) => Ok(Some(*number)),
            Some(ImapToken::String(string)) => parse_number(string).map(Some),
            Some(token) => Err(self.keyed_type_error(key, "number", token)),
        }
    }

    pub fn keyed_date(&self, key: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.keyed_string(key)?.map(parse_date_time).transpose()
    }

    fn keyed<'a, T: ?Sized>(
        &'a self,
        key: &str,
        expected: &'static str,
        cast: fn(&'a ImapToken) -> Option<&'a T>,
    ) -> Result<Option<&'a T>> {
        match self.keyed_value(key) {
            None => Ok(None),
            Some(token) => cast(token)
                .map(Some)
                .ok_or_else(|| self.keyed_type_error(key, expected, token)),
        }
    }

    fn keyed_type_error(&self, key: &str, expected: &'static str, token: &ImapToken) -> Error {
        let index = self.key_index(key).map(|index| index + 1).unwrap_or_default();
        type_error(index, expected, token)
    }
}

fn type_error(index: usize, expected: &'static str, token: &ImapToken) -> Error {
    Error::TokenType {
        index,
        expected,
        found: token.kind(),
    }
}

fn parse_number(string: &str) -> Result<u64> {
    string
        .parse()
        .map_err(|err| Error::ParseNumberError(err, string.to_owned()))
}

impl ops::Deref for ImapList {
    type Target = Vec<ImapToken>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ops::DerefMut for ImapList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<ImapToken> for ImapList {
    fn from_iter<T: IntoIterator<Item = ImapToken>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<ImapToken>> for ImapList {
    fn from(tokens: Vec<ImapToken>) -> Self {
        Self(tokens)
    }
}

impl fmt::Display for ImapList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut glue = "";
        for token in self.iter() {
            write!(f, "{}{}", glue, token)?;
            glue = " ";
        }
        Ok(())
    }
}

/// Represents one complete server response line.
///
/// Tagged responses carry the completion status of a command,
/// untagged ones carry data. Continuation requests are kept apart
/// since they are neither.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImapResponse {
    tag: Option<String>,
    continuation: bool,
    tokens: ImapList,
}

impl ImapResponse {
    pub fn tagged<T: ToString>(tag: T, tokens: ImapList) -> Self {
        Self {
            tag: Some(tag.to_string()),
            continuation: false,
            tokens,
        }
    }

    pub fn untagged(tokens: ImapList) -> Self {
        Self {
            tag: None,
            continuation: false,
            tokens,
        }
    }

    pub fn continuation_request(tokens: ImapList) -> Self {
        Self {
            tag: None,
            continuation: true,
            tokens,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    pub fn is_continuation_request(&self) -> bool {
        self.continuation
    }
}

impl ops::Deref for ImapResponse {
    type Target = ImapList;

    fn deref(&self) -> &Self::Target {
        &self.tokens
    }
}

impl ops::DerefMut for ImapResponse {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tokens
    }
}

impl fmt::Display for ImapResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.tag, self.continuation) {
            (Some(tag), _) => write!(f, "{} {}", tag, self.tokens),
            (None, true) => write!(f, "+ {}", self.tokens),
            (None, false) => write!(f, "* {}", self.tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn list(tokens: Vec<ImapToken>) -> ImapList {
        ImapList::from(tokens)
    }

    #[test]
    fn typed_access() {
        let list = list(vec![
            "FLAGS".into(),
            42u64.into(),
            "17".into(),
            list(vec!["\\Seen".into()]).into(),
        ]);

        assert_eq!(list.get_string(0).unwrap(), "FLAGS");
        assert_eq!(list.get_number(1).unwrap(), 42);
        assert_eq!(list.get_number(2).unwrap(), 17);
        assert_eq!(list.get_list(3).unwrap().get_string(0).unwrap(), "\\Seen");
        assert!(list.is_string(0));
        assert!(list.is_list(3));
        assert!(!list.is_list(0));
    }

    #[test]
    fn typed_access_fails_on_mismatch() {
        let list = list(vec!["FLAGS".into(), list(vec![]).into()]);

        assert!(matches!(
            list.get_list(0),
            Err(Error::TokenType {
                index: 0,
                expected: "list",
                found: "string"
            })
        ));
        assert!(matches!(
            list.get_string(1),
            Err(Error::TokenType { index: 1, .. })
        ));
        assert!(matches!(list.get_number(0), Err(Error::ParseNumberError(..))));
        assert!(matches!(list.get_token(5), Err(Error::IndexOutOfBounds(5, 2))));
    }

    #[test]
    fn numbers_beyond_32_bits() {
        let list = list(vec!["4294967296".into()]);
        assert_eq!(list.get_number(0).unwrap(), 4294967296);
    }

    #[test]
    fn equals_ignore_case() {
        assert!(ImapToken::from("copyuid").equals_ignore_case("COPYUID"));
        assert!(!ImapToken::from("COPY").equals_ignore_case("COPYUID"));
        assert!(!ImapToken::from(ImapList::default()).equals_ignore_case(""));
    }

    #[test]
    fn keyed_lookup() {
        let list = list(vec![
            "UID".into(),
            "12".into(),
            "flags".into(),
            list(vec!["\\Seen".into()]).into(),
            "INTERNALDATE".into(),
            "17-Jul-1996 02:44:25 -0700".into(),
            "RFC822.SIZE".into(),
        ]);

        assert_eq!(list.keyed_number("uid").unwrap(), Some(12));
        assert_eq!(list.keyed_list("FLAGS").unwrap().map(|l| l.len()), Some(1));
        assert_eq!(list.keyed_string("UID").unwrap(), Some("12"));
        assert_eq!(list.keyed_string("BODY").unwrap(), None);
        assert_eq!(list.keyed_value("RFC822.SIZE"), None);
        assert!(list.keyed_list("UID").is_err());
        assert!(list.contains_key("internaldate"));
        assert_eq!(list.key_index("FLAGS"), Some(2));

        let date = list.keyed_date("INTERNALDATE").unwrap().unwrap();
        assert_eq!(date.year(), 1996);
        assert_eq!(date.hour(), 2);
        assert_eq!(date.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn parse_canonical_date_time() {
        let date = parse_date_time("17-Jul-1996 02:44:25 -0700").unwrap();
        assert_eq!((date.day(), date.month(), date.year()), (17, 7, 1996));
        assert_eq!((date.hour(), date.minute(), date.second()), (2, 44, 25));

        let date = parse_date_time(" 1-Jan-2020 10:00:00 +0000").unwrap();
        assert_eq!((date.day(), date.month()), (1, 1));
    }

    #[test]
    fn parse_bad_date_times() {
        let expected = parse_date_time("01-Jan-2020 10:00:00 +0100").unwrap();

        assert_eq!(
            parse_date_time("01 Jan 2020 10:00:00 +0100").unwrap(),
            expected
        );
        assert_eq!(
            parse_date_time("Wed, 01 Jan 2020 10:00:00 +0100").unwrap(),
            expected
        );
        assert_eq!(parse_date_time("01-Jan-2020 09:00:00").unwrap(), expected);
    }

    #[test]
    fn parse_invalid_date_time() {
        assert!(matches!(
            parse_date_time("yesterday"),
            Err(Error::ParseDateError(date)) if date == "yesterday"
        ));
    }

    #[test]
    fn display_response() {
        let response = ImapResponse::tagged(
            "A1",
            list(vec![
                "OK".into(),
                list(vec!["COPYUID".into(), "1".into()]).into(),
                "done".into(),
            ]),
        );
        assert_eq!(response.to_string(), "A1 OK (COPYUID 1) done");
        assert!(response.is_tagged());
        assert_eq!(response.tag(), Some("A1"));
    }
}
