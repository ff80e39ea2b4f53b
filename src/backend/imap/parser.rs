//! IMAP response parser module.
//!
//! This module turns the raw bytes sent by the server into
//! [`ImapResponse`] lines.

use log::{trace, warn};
use std::io::{BufRead, Read};

use super::{responses, Error, ImapList, ImapResponse, ImapToken, Result};

enum Parsed {
    Token(ImapToken),
    ListEnd(u8),
    EndOfLine,
}

/// Reads responses one line at a time from a buffered reader.
pub struct ImapResponseParser<R> {
    reader: R,
}

impl<R: BufRead> ImapResponseParser<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next available response.
    pub fn read_response(&mut self) -> Result<ImapResponse> {
        match self.peek()? {
            Some(b'+') => self.read_continuation_request(),
            Some(b'*') => self.read_untagged_response(),
            Some(_) => self.read_tagged_response(),
            None => Err(Error::EndOfStreamError("response")),
        }
    }

    /// Reads responses until the tagged completion matching the
    /// given tag, and returns all of them, the completion last.
    ///
    /// Completions for other tags belong to previous commands: they
    /// are skipped, along with the untagged responses read so far
    /// that are neither EXISTS nor EXPUNGE.
    pub fn read_status_response(&mut self, tag: &str, command: &str) -> Result<Vec<ImapResponse>> {
        let mut received: Vec<ImapResponse> = Vec::new();

        loop {
            let response = self.read_response()?;
            trace!("<<< {}", response);

            match response.tag() {
                Some(other) if !other.eq_ignore_ascii_case(tag) => {
                    warn!(
                        "after sending tag {}, got tagged response from previous command: {}",
                        tag, response
                    );
                    received.retain(|response| {
                        !response.is_tagged()
                            && response.get(1).map_or(false, |token| {
                                token.equals_ignore_case(responses::EXISTS)
                                    || token.equals_ignore_case(responses::EXPUNGE)
                            })
                    });
                }
                Some(_) => {
                    received.push(response);
                    break;
                }
                None => received.push(response),
            }
        }

        match received.last() {
            Some(completion)
                if completion
                    .first()
                    .map_or(false, |token| token.equals_ignore_case(responses::OK)) =>
            {
                Ok(received)
            }
            completion => Err(Error::NegativeResponseError(
                command.to_owned(),
                completion.map(ToString::to_string).unwrap_or_default(),
            )),
        }
    }

    fn read_continuation_request(&mut self) -> Result<ImapResponse> {
        self.expect(b'+')?;
        self.skip_if_space()?;
        let rest = self.read_until_end_of_line()?;
        Ok(ImapResponse::continuation_request(ImapList::from(vec![
            ImapToken::String(rest),
        ])))
    }

    fn read_untagged_response(&mut self) -> Result<ImapResponse> {
        self.expect(b'*')?;
        self.expect(b' ')?;
        Ok(ImapResponse::untagged(self.read_tokens()?))
    }

    fn read_tagged_response(&mut self) -> Result<ImapResponse> {
        let tag = self.read_string_until(b' ')?;
        Ok(ImapResponse::tagged(tag, self.read_tokens()?))
    }

    fn read_tokens(&mut self) -> Result<ImapList> {
        let mut tokens = ImapList::default();

        let symbol = match self.read_token()? {
            Some(ImapToken::String(symbol)) => symbol,
            _ => return Err(Error::NonStringFirstTokenError),
        };
        let is_status_response = is_status_response(&symbol);
        tokens.push(ImapToken::String(symbol));

        if is_status_response {
            self.parse_response_text(&mut tokens)?;
        } else {
            while let Some(token) = self.read_token()? {
                tokens.push(token);
            }
        }

        Ok(tokens)
    }

    /// Parses the `resp-text` of a status response: the optional
    /// bracketed code is read as a list, the rest of the line is kept
    /// as free-form text, so that things like `{123}` are not taken
    /// for literals.
    fn parse_response_text(&mut self, tokens: &mut ImapList) -> Result<()> {
        self.skip_if_space()?;

        if self.peek()? == Some(b'[') {
            let code = self.parse_list(b'[', b']')?;
            tokens.push(ImapToken::List(code));
            self.skip_if_space()?;
        }

        let rest = self.read_until_end_of_line()?;
        if !rest.is_empty() {
            tokens.push(ImapToken::String(rest));
        }

        Ok(())
    }

    /// Reads the next token of the line, skipping stray closing
    /// brackets. Returns `None` at the end of the line.
    fn read_token(&mut self) -> Result<Option<ImapToken>> {
        loop {
            match self.parse_token()? {
                Parsed::Token(token) => return Ok(Some(token)),
                Parsed::ListEnd(_) => continue,
                Parsed::EndOfLine => return Ok(None),
            }
        }
    }

    fn parse_token(&mut self) -> Result<Parsed> {
        loop {
            let ch = self.peek()?.ok_or(Error::EndOfStreamError("token"))?;

            return match ch {
                b'(' => Ok(Parsed::Token(ImapToken::List(self.parse_list(b'(', b')')?))),
                b'[' => Ok(Parsed::Token(ImapToken::List(self.parse_list(b'[', b']')?))),
                b')' | b']' => {
                    self.reader.consume(1);
                    Ok(Parsed::ListEnd(ch))
                }
                b'"' => Ok(Parsed::Token(ImapToken::String(self.parse_quoted()?))),
                b'{' => Ok(Parsed::Token(ImapToken::String(self.parse_literal()?))),
                b' ' | b'\t' => {
                    self.reader.consume(1);
                    continue;
                }
                b'\r' => {
                    self.expect(b'\r')?;
                    self.expect(b'\n')?;
                    Ok(Parsed::EndOfLine)
                }
                b'\n' => {
                    self.reader.consume(1);
                    Ok(Parsed::EndOfLine)
                }
                _ => Ok(Parsed::Token(ImapToken::String(
                    self.parse_bare_string(true)?,
                ))),
            };
        }
    }

    fn parse_list(&mut self, start: u8, end: u8) -> Result<ImapList> {
        self.expect(start)?;

        let mut list = ImapList::default();
        loop {
            match self.parse_token()? {
                Parsed::EndOfLine => return Err(Error::UnterminatedListError(end as char)),
                Parsed::ListEnd(ch) if ch == end => return Ok(list),
                Parsed::ListEnd(ch) => list.push(ImapToken::String((ch as char).to_string())),
                Parsed::Token(token) => list.push(token),
            }
        }
    }

    fn parse_bare_string(&mut self, allow_brackets: bool) -> Result<String> {
        let mut bytes = Vec::new();

        loop {
            let ch = self.peek()?.ok_or(Error::EndOfStreamError("atom"))?;

            let is_delimiter = matches!(ch, b'(' | b')' | b'{' | b' ' | b'"' | 0x00..=0x1f | 0x7f)
                || (allow_brackets && matches!(ch, b'[' | b']'));

            if is_delimiter {
                if bytes.is_empty() {
                    return Err(Error::EmptyAtomError(ch as char));
                }
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }

            bytes.push(ch);
            self.reader.consume(1);
        }
    }

    fn parse_literal(&mut self) -> Result<String> {
        self.expect(b'{')?;
        let size = self.read_string_until(b'}')?;
        let size: usize = size
            .parse()
            .map_err(|_| Error::InvalidLiteralSizeError(size.clone()))?;
        self.expect(b'\r')?;
        self.expect(b'\n')?;

        if size == 0 {
            return Ok(String::new());
        }

        // grows with the bytes received, never with the announced size
        let mut data = Vec::new();
        (&mut self.reader)
            .take(size as u64)
            .read_to_end(&mut data)
            .map_err(Error::ReadResponseError)?;
        if data.len() < size {
            return Err(Error::EndOfStreamError("literal"));
        }

        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.expect(b'"')?;

        let mut bytes = Vec::new();
        let mut escape = false;
        while let Some(ch) = self.read_byte()? {
            match ch {
                b'\\' if !escape => escape = true,
                b'"' if !escape => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                _ => {
                    bytes.push(ch);
                    escape = false;
                }
            }
        }

        Err(Error::EndOfStreamError("quoted string"))
    }

    fn read_string_until(&mut self, end: u8) -> Result<String> {
        let mut bytes = Vec::new();
        while let Some(ch) = self.read_byte()? {
            if ch == end {
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            bytes.push(ch);
        }

        Err(Error::EndOfStreamError("line"))
    }

    fn read_until_end_of_line(&mut self) -> Result<String> {
        let rest = self.read_string_until(b'\r')?;
        self.expect(b'\n')?;
        Ok(rest)
    }

    fn skip_if_space(&mut self) -> Result<()> {
        if self.peek()? == Some(b' ') {
            self.reader.consume(1);
        }
        Ok(())
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.read_byte()? {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(Error::UnexpectedCharError {
                expected: expected as char,
                found: ch as char,
            }),
            None => Err(Error::EndOfStreamError("expected character")),
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        let buf = self.reader.fill_buf().map_err(Error::ReadResponseError)?;
        Ok(buf.first().copied())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let ch = self.peek()?;
        if ch.is_some() {
            self.reader.consume(1);
        }
        Ok(ch)
    }
}

fn is_status_response(symbol: &str) -> bool {
    [
        responses::OK,
        responses::NO,
        responses::BAD,
        responses::PREAUTH,
        responses::BYE,
    ]
    .iter()
    .any(|status| symbol.eq_ignore_ascii_case(status))
}
