//! IMAP SEARCH module.
//!
//! This module contains the aggregator that folds the untagged
//! `SEARCH` responses of one or several command batches into a
//! single list of hits.

use log::{trace, warn};
use std::ops;

use super::{responses, ImapResponse, ImapToken};

/// Represents the message numbers (or UIDs) matched by a search.
/// Order and duplicates are kept as the server sent them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchResponse(Vec<u64>);

impl SearchResponse {
    pub fn parse(batches: &[Vec<ImapResponse>]) -> Self {
        let mut hits = Vec::new();

        for response in batches.iter().flatten() {
            if response.is_tagged()
                || response.len() < 2
                || !response[0].equals_ignore_case(responses::SEARCH)
            {
                continue;
            }

            for token in response.iter().skip(1) {
                let hit = match token {
                    // server extensions like ESEARCH's (MODSEQ n)
                    ImapToken::List(_) => continue,
                    ImapToken::Number(hit) => Ok(*hit),
                    ImapToken::String(hit) => hit.parse::<u64>().map_err(|_| hit),
                };

                match hit {
                    Ok(hit) => hits.push(hit),
                    Err(token) => {
                        warn!("skipping rest of search response at token {:?}", token);
                        break;
                    }
                }
            }
        }

        trace!("search hits: {:?}", hits);
        Self(hits)
    }

    pub fn into_hits(self) -> Vec<u64> {
        self.0
    }
}

impl ops::Deref for SearchResponse {
    type Target = Vec<u64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
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

    #[test]
    fn batches_are_concatenated() {
        let response = SearchResponse::parse(&[
            batch("* SEARCH 1 2 3\r\nx OK done\r\n"),
            batch("* SEARCH 4\r\ny OK done\r\n"),
        ]);
        assert_eq!(response.into_hits(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_without_hits() {
        let response = SearchResponse::parse(&[batch("* SEARCH\r\nx OK done\r\n")]);
        assert!(response.is_empty());
    }

    #[test]
    fn non_search_lines_are_skipped() {
        let response = SearchResponse::parse(&[batch(
            "* 3 EXISTS\r\n* search 5 6\r\n* FLAGS (\\Seen)\r\nx OK SEARCH 7\r\n",
        )]);
        assert_eq!(response.into_hits(), vec![5, 6]);
    }

    #[test]
    fn invalid_number_aborts_the_line_only() {
        let response = SearchResponse::parse(&[batch(
            "* SEARCH 1 x 2\r\n* SEARCH 3 (MODSEQ 917162500) 4\r\nx OK done\r\n",
        )]);
        assert_eq!(response.into_hits(), vec![1, 3, 4]);
    }

    #[test]
    fn numbers_beyond_32_bits_and_duplicates() {
        let response = SearchResponse::parse(&[
            batch("* SEARCH 4294967296 1\r\n"),
            batch("* SEARCH 1\r\n"),
        ]);
        assert_eq!(response.into_hits(), vec![4294967296, 1, 1]);
    }
}
