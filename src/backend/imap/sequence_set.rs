//! IMAP sequence set module.
//!
//! This module contains helpers to expand the IMAP sequence set
//! grammar (`1,4:6,9:7`) into concrete identifiers, and to compress
//! identifiers back into that grammar.

use log::{trace, warn};
use std::collections::BTreeSet;

/// Represents the greatest value a sequence number or a UID can
/// take (`2^32 - 1`).
pub const MAX_SEQUENCE_VALUE: u64 = u32::MAX as u64;

/// Expands the given sequence set into the list of identifiers it
/// covers, in the order the set describes them.
///
/// Ranges are inclusive and honored in both directions: `9:7` gives
/// `9, 8, 7`. Tokens that are malformed or out of the 32-bit range
/// are skipped, the rest of the set is still expanded.
pub fn expand_sequence_set(set: &str) -> Vec<String> {
    let mut ids = Vec::new();

    if set.is_empty() {
        return ids;
    }

    for token in set.split(',') {
        match token.split_once(':') {
            None => match parse_value(token) {
                Some(id) => ids.push(id.to_string()),
                None => warn!("skipping invalid sequence set token {:?}", token),
            },
            Some((first, second)) => match (parse_value(first), parse_value(second)) {
                (Some(first), Some(second)) if first <= second => {
                    ids.extend((first..=second).map(|id| id.to_string()))
                }
                (Some(first), Some(second)) => {
                    ids.extend((second..=first).rev().map(|id| id.to_string()))
                }
                _ => warn!("skipping invalid sequence set range {:?}", token),
            },
        }
    }

    trace!("expanded sequence set {:?} into {} ids", set, ids.len());
    ids
}

/// Compresses the given numeric identifiers into a sequence set.
///
/// Identifiers are sorted and de-duplicated first, consecutive ones
/// are merged into ranges: `[5, 1, 2, 3, 9, 10]` gives `1:3,5,9:10`.
pub fn compress_sequence_set<I>(ids: I) -> String
where
    I: IntoIterator<Item = u64>,
{
    let ids: BTreeSet<u64> = ids.into_iter().collect();
    let mut ranges: Vec<(u64, u64)> = Vec::new();

    for id in ids {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == id => *end = id,
            _ => ranges.push((id, id)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}:{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_value(token: &str) -> Option<u64> {
    token
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value <= MAX_SEQUENCE_VALUE)
}
