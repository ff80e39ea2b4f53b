//! IMAP COPYUID module.
//!
//! This module contains the aggregator that folds the responses of a
//! `UID COPY` or `UID MOVE` command, possibly split into several
//! batches, into a single mapping from source UIDs to destination
//! UIDs.

use log::{debug, warn};
use std::{collections::HashMap, ops};

use super::{expand_sequence_set, responses, ImapResponse};

/// Represents the mapping from source UIDs to destination UIDs
/// reported by the server after a copy or a move.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UidCopyResponse(HashMap<String, String>);

impl UidCopyResponse {
    /// Folds the given batches into one mapping. Batches that do not
    /// carry a valid COPYUID code contribute nothing. Returns `None`
    /// when no batch contributed.
    pub fn parse(batches: &[Vec<ImapResponse>]) -> Option<Self> {
        let mut mapping: Option<HashMap<String, String>> = None;

        for batch in batches {
            if let Some(batch_mapping) = parse_batch(batch) {
                mapping.get_or_insert_with(HashMap::new).extend(batch_mapping);
            }
        }

        mapping.map(Self)
    }

    pub fn into_uid_mapping(self) -> HashMap<String, String> {
        self.0
    }
}

impl ops::Deref for UidCopyResponse {
    type Target = HashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn parse_batch(batch: &[ImapResponse]) -> Option<HashMap<String, String>> {
    let completion = batch.last()?;

    if !completion.is_tagged() || !is_ok(completion) {
        debug!("skipping copy batch without successful completion");
        return None;
    }

    if let Some(mapping) = parse_copyuid_code(completion) {
        return Some(mapping);
    }

    // servers supporting MOVE send the code in an untagged response
    batch
        .iter()
        .rev()
        .skip(1)
        .filter(|response| !response.is_tagged())
        .find_map(parse_copyuid_code)
}

fn is_ok(response: &ImapResponse) -> bool {
    response
        .first()
        .map_or(false, |token| token.equals_ignore_case(responses::OK))
}

fn parse_copyuid_code(response: &ImapResponse) -> Option<HashMap<String, String>> {
    if response.len() < 2 || !is_ok(response) {
        return None;
    }

    let code = response.get(1)?.as_list()?;
    let is_copyuid = code.len() >= 4
        && code[0].equals_ignore_case(responses::COPYUID)
        && (1..4).all(|index| code.is_string(index));
    if !is_copyuid {
        return None;
    }

    let source_uids = expand_sequence_set(code.get_string(2).ok()?);
    let destination_uids = expand_sequence_set(code.get_string(3).ok()?);

    if source_uids.is_empty()
        || destination_uids.is_empty()
        || source_uids.len() != destination_uids.len()
    {
        warn!(
            "skipping copyuid code with mismatching sets: {} source uids, {} destination uids",
            source_uids.len(),
            destination_uids.len()
        );
        return None;
    }

    Some(source_uids.into_iter().zip(destination_uids).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::imap::ImapResponseParser;

    fn batch(lines: &str) -> Vec<ImapResponse> {
        let mut parser = ImapResponseParser::new(lines.as_bytes());
        let mut batch = Vec::new();
        while let Ok(response) = parser.read_response() {
            batch.push(response);
        }
        batch
    }

    fn mapping(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(src, dst)| (src.to_string(), dst.to_string()))
            .collect()
    }

    #[test]
    fn single_batch() {
        let response = UidCopyResponse::parse(&[batch("x OK [COPYUID 1 1:3 7:9] Success\r\n")]);
        assert_eq!(
            response.unwrap().into_uid_mapping(),
            mapping(&[("1", "7"), ("2", "8"), ("3", "9")])
        );
    }

    #[test]
    fn copyuid_atom_is_case_insensitive() {
        let response = UidCopyResponse::parse(&[batch("x ok [copyuid 1 5 12] done\r\n")]);
        assert_eq!(response.unwrap().get("5").map(String::as_str), Some("12"));
    }

    #[test]
    fn descending_ranges_are_zipped_positionally() {
        let response = UidCopyResponse::parse(&[batch("x OK [COPYUID 1 1,3:2 20:22] Success\r\n")]);
        assert_eq!(
            response.unwrap().into_uid_mapping(),
            mapping(&[("1", "20"), ("3", "21"), ("2", "22")])
        );
    }

    #[test]
    fn batches_are_merged() {
        let response = UidCopyResponse::parse(&[
            batch("x OK [COPYUID 1 1:2 7:8] Success\r\n"),
            batch("y OK [COPYUID 1 5 10] Success\r\n"),
        ]);
        assert_eq!(
            response.unwrap().into_uid_mapping(),
            mapping(&[("1", "7"), ("2", "8"), ("5", "10")])
        );
    }

    #[test]
    fn failed_batch_contributes_nothing() {
        let response = UidCopyResponse::parse(&[
            batch("x NO [COPYUID 1 1:2 7:8] Failure\r\n"),
            batch("y OK [COPYUID 1 5 10] Success\r\n"),
        ]);
        assert_eq!(response.unwrap().into_uid_mapping(), mapping(&[("5", "10")]));

        assert_eq!(
            UidCopyResponse::parse(&[batch("x NO [COPYUID 1 1:2 7:8] Failure\r\n")]),
            None
        );
    }

    #[test]
    fn invalid_batches() {
        for lines in [
            "* OK [COPYUID 1 1 7] Success\r\n",
            "x OK Success\r\n",
            "x OK [UIDVALIDITY 1] Success\r\n",
            "x OK [COPYUID 1 1] Success\r\n",
            "x OK [COPYUID 1 1:3 7:8] Success\r\n",
            "x OK [COPYUID 1 x y] Success\r\n",
            "x OK [COPYUID 1 1 (7)] Success\r\n",
        ] {
            assert_eq!(UidCopyResponse::parse(&[batch(lines)]), None, "{}", lines);
        }

        assert_eq!(UidCopyResponse::parse(&[]), None);
        assert_eq!(UidCopyResponse::parse(&[vec![]]), None);
    }

    #[test]
    fn untagged_copyuid_from_move() {
        let response = UidCopyResponse::parse(&[batch(
            "* OK [COPYUID 1 1:2 7:8] Moved\r\n* 1 EXPUNGE\r\n* 1 EXPUNGE\r\nx OK Done\r\n",
        )]);
        assert_eq!(
            response.unwrap().into_uid_mapping(),
            mapping(&[("1", "7"), ("2", "8")])
        );

        let response = UidCopyResponse::parse(&[batch(
            "* OK [COPYUID 1 1:2 7:8] Moved\r\nx NO Failed\r\n",
        )]);
        assert_eq!(response, None);
    }
}
