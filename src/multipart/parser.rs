//! Incremental multipart/related parser.
//!
//! State-machine parser that splits a boundary-framed body into parts as bytes
//! arrive, so a response can be decoded while it streams in. At most one part
//! (plus a delimiter-sized tail) is buffered at a time.
//!
//! # Parsing Flow
//!
//! 1. **Preamble**: Skip bytes until the first `--boundary` line
//! 2. **Headers**: Accumulate the part's header block up to the blank line
//! 3. **Body**: Accumulate payload bytes until the next `CRLF--boundary`
//! 4. **Done**: The terminal `--boundary--` was seen; the epilogue is ignored
//!
//! Bare `LF` line endings are accepted wherever `CRLF` is expected.
//!
//! # Examples
//!
//! ```
//! use dicomweb_client::multipart::{PartParser, ParseState};
//!
//! let mut parser = PartParser::new("TOAST");
//! let mut parts = parser.feed(b"--TOAST\r\nContent-Type: application/dicom\r\n\r\npart").unwrap();
//! parts.extend(parser.feed(b": 0\r\n--TOAST--").unwrap());
//! parts.extend(parser.finish().unwrap());
//!
//! assert_eq!(parser.state(), ParseState::Done);
//! assert_eq!(parts.len(), 1);
//! assert_eq!(&parts[0].body[..], b"part: 0");
//! ```

use crate::error::{DicomwebError, Result};
use crate::protocol::constants::MAX_PART_HEADER_BYTES;
use bytes::{Buf, Bytes, BytesMut};
use std::collections::BTreeMap;

/// Parse state for the multipart parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Looking for the first boundary line
    Preamble,
    /// Accumulating a part's header block
    Headers,
    /// Accumulating a part's payload
    Body,
    /// Terminal boundary seen
    Done,
    /// A framing error occurred; the parser accepts no more input
    Error,
}

/// One decoded part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers, keys lower-cased
    pub headers: BTreeMap<String, String>,
    /// Raw payload
    pub body: Bytes,
}

impl Part {
    /// `Content-Type` of the part
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// `Content-ID` of the part, without angle brackets
    pub fn content_id(&self) -> Option<&str> {
        self.headers.get("content-id").map(|id| {
            let id = id.trim();
            id.strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
                .unwrap_or(id)
        })
    }
}

/// What follows a `--boundary` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    /// `--`: close delimiter
    Terminal,
    /// Optional padding then a line break; value is the number of bytes to skip
    Line(usize),
    /// Something else: the marker is payload, not a delimiter
    NotBoundary,
    /// Need more bytes to decide
    Incomplete,
}

fn classify_suffix(after: &[u8]) -> Suffix {
    if after.starts_with(b"--") {
        return Suffix::Terminal;
    }
    if after.is_empty() || after == b"-" {
        return Suffix::Incomplete;
    }
    for (i, &b) in after.iter().enumerate() {
        match b {
            b'\n' => return Suffix::Line(i + 1),
            b' ' | b'\t' | b'\r' => continue,
            _ => return Suffix::NotBoundary,
        }
    }
    Suffix::Incomplete
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Incremental multipart parser.
///
/// Feed it chunks with [`PartParser::feed`]; each call returns the parts that
/// were completed by that chunk, in wire order. Call [`PartParser::finish`] at
/// end of input to check that the body was terminated properly.
#[derive(Debug)]
pub struct PartParser {
    /// Unprocessed input
    buffer: BytesMut,
    /// Current state
    state: ParseState,
    /// `--boundary`
    delimiter: Vec<u8>,
    /// `\n--boundary`
    body_delimiter: Vec<u8>,
    /// Headers of the part being parsed
    headers: BTreeMap<String, String>,
    /// Payload of the part being parsed
    body: BytesMut,
    /// Whether any payload bytes of the current part have been moved to `body`
    body_started: bool,
}

impl PartParser {
    /// Create a parser for the given boundary token
    pub fn new(boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());

        let mut body_delimiter = Vec::with_capacity(delimiter.len() + 1);
        body_delimiter.push(b'\n');
        body_delimiter.extend_from_slice(&delimiter);

        PartParser {
            buffer: BytesMut::with_capacity(8192),
            state: ParseState::Preamble,
            delimiter,
            body_delimiter,
            headers: BTreeMap::new(),
            body: BytesMut::new(),
            body_started: false,
        }
    }

    /// Feed bytes to the parser and collect the parts they complete
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Part>> {
        match self.state {
            ParseState::Error => {
                return Err(DicomwebError::malformed_multipart(
                    "parser is in an error state",
                ))
            }
            ParseState::Done => return Ok(Vec::new()),
            _ => {}
        }

        self.buffer.extend_from_slice(data);
        let mut parts = Vec::new();

        loop {
            let step = match self.state {
                ParseState::Preamble => self.skip_preamble(),
                ParseState::Headers => self.parse_headers(),
                ParseState::Body => self.parse_body(&mut parts),
                ParseState::Done | ParseState::Error => break,
            };
            match step {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    self.state = ParseState::Error;
                    return Err(e);
                }
            }
        }

        Ok(parts)
    }

    /// Signal end of input.
    ///
    /// # Errors
    ///
    /// Returns [`DicomwebError::MalformedMultipart`] unless the terminal
    /// boundary has been seen.
    pub fn finish(&mut self) -> Result<Vec<Part>> {
        let reason = match self.state {
            ParseState::Done => return Ok(Vec::new()),
            ParseState::Preamble => "missing opening boundary",
            ParseState::Headers => "truncated part headers",
            ParseState::Body => "missing closing boundary",
            ParseState::Error => "parser is in an error state",
        };
        self.state = ParseState::Error;
        Err(DicomwebError::malformed_multipart(reason))
    }

    /// Parse a complete in-memory body in one call
    pub fn parse_all(boundary: &str, body: &[u8]) -> Result<Vec<Part>> {
        let mut parser = PartParser::new(boundary);
        let mut parts = parser.feed(body)?;
        parts.extend(parser.finish()?);
        Ok(parts)
    }

    /// Get current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Find the first delimiter line and discard everything before it.
    fn skip_preamble(&mut self) -> Result<bool> {
        let mut from = 0;
        while let Some(pos) = find(&self.buffer[from..], &self.delimiter).map(|p| p + from) {
            if pos > 0 && self.buffer[pos - 1] != b'\n' {
                from = pos + 1;
                continue;
            }
            match classify_suffix(&self.buffer[pos + self.delimiter.len()..]) {
                Suffix::Terminal => {
                    self.buffer.clear();
                    self.state = ParseState::Done;
                    return Ok(true);
                }
                Suffix::Line(n) => {
                    self.buffer.advance(pos + self.delimiter.len() + n);
                    self.state = ParseState::Headers;
                    return Ok(true);
                }
                Suffix::NotBoundary => from = pos + 1,
                Suffix::Incomplete => return Ok(false),
            }
        }

        // Keep enough tail to recognise a delimiter split across chunks.
        let keep = self.delimiter.len() + 1;
        if self.buffer.len() > keep {
            let drop = self.buffer.len() - keep;
            self.buffer.advance(drop);
        }
        Ok(false)
    }

    /// Parse the header block of the current part.
    fn parse_headers(&mut self) -> Result<bool> {
        let mut start = 0;
        loop {
            let Some(nl) = self.buffer[start..].iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_PART_HEADER_BYTES {
                    return Err(DicomwebError::malformed_multipart(
                        "part header block too large",
                    ));
                }
                return Ok(false);
            };
            let nl = start + nl;
            let line = &self.buffer[start..nl];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                let block = self.buffer.split_to(nl + 1);
                self.headers = parse_header_block(&block[..start])?;
                self.body.clear();
                self.body_started = false;
                self.state = ParseState::Body;
                return Ok(true);
            }
            start = nl + 1;
        }
    }

    /// Accumulate payload bytes up to the next delimiter.
    fn parse_body(&mut self, parts: &mut Vec<Part>) -> Result<bool> {
        // Empty payload directly after the header block.
        if !self.body_started && self.buffer.starts_with(&self.delimiter) {
            match classify_suffix(&self.buffer[self.delimiter.len()..]) {
                Suffix::Terminal => {
                    self.buffer.advance(self.delimiter.len() + 2);
                    return Ok(self.complete_part(parts, true));
                }
                Suffix::Line(n) => {
                    self.buffer.advance(self.delimiter.len() + n);
                    return Ok(self.complete_part(parts, false));
                }
                Suffix::Incomplete => return Ok(false),
                Suffix::NotBoundary => {}
            }
        } else if !self.body_started
            && self.buffer.len() < self.delimiter.len()
            && self.delimiter.starts_with(&self.buffer)
        {
            return Ok(false);
        }

        let mut from = 0;
        loop {
            let Some(pos) = find(&self.buffer[from..], &self.body_delimiter).map(|p| p + from)
            else {
                let safe = self.buffer.len().saturating_sub(self.body_delimiter.len());
                self.flush_body(safe);
                return Ok(false);
            };

            let suffix = classify_suffix(&self.buffer[pos + self.body_delimiter.len()..]);
            let skip = match suffix {
                Suffix::NotBoundary => {
                    from = pos + 1;
                    continue;
                }
                Suffix::Incomplete => {
                    self.flush_body(pos);
                    return Ok(false);
                }
                Suffix::Terminal => 2,
                Suffix::Line(n) => n,
            };

            let end = if pos > 0 && self.buffer[pos - 1] == b'\r' {
                pos - 1
            } else {
                pos
            };
            let content = self.buffer.split_to(end);
            self.body.extend_from_slice(&content);
            if pos == 0 && self.body.last() == Some(&b'\r') {
                // CR of the delimiter was flushed with an earlier chunk.
                self.body.truncate(self.body.len() - 1);
            }
            self.buffer
                .advance((pos - end) + self.body_delimiter.len() + skip);
            return Ok(self.complete_part(parts, suffix == Suffix::Terminal));
        }
    }

    fn flush_body(&mut self, n: usize) {
        if n > 0 {
            let chunk = self.buffer.split_to(n);
            self.body.extend_from_slice(&chunk);
            self.body_started = true;
        }
    }

    fn complete_part(&mut self, parts: &mut Vec<Part>, terminal: bool) -> bool {
        parts.push(Part {
            headers: std::mem::take(&mut self.headers),
            body: self.body.split().freeze(),
        });
        self.body_started = false;
        if terminal {
            self.buffer.clear();
            self.state = ParseState::Done;
        } else {
            self.state = ParseState::Headers;
        }
        true
    }
}

/// Parse `Name: value` lines; folded continuation lines are appended.
fn parse_header_block(block: &[u8]) -> Result<BTreeMap<String, String>> {
    let text = std::str::from_utf8(block)
        .map_err(|_| DicomwebError::malformed_multipart("part headers are not valid UTF-8"))?;

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    let mut last: Option<String> = None;
    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            if let Some(value) = last.as_ref().and_then(|k| headers.get_mut(k)) {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            DicomwebError::malformed_multipart(format!("invalid part header line: '{}'", line))
        })?;
        let key = key.trim().to_lowercase();
        headers.insert(key.clone(), value.trim().to_string());
        last = Some(key);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LF_BODY: &[u8] = b"--TOAST
Content-Type: application/dicom

part: 0
--TOAST
Content-Type: application/dicom

part: 1
--TOAST--";

    fn bodies(parts: &[Part]) -> Vec<&[u8]> {
        parts.iter().map(|p| &p.body[..]).collect()
    }

    #[test]
    fn test_parser_creation() {
        let parser = PartParser::new("TOAST");
        assert_eq!(parser.state(), ParseState::Preamble);
    }

    #[test]
    fn test_lf_framed_body() {
        let parts = PartParser::parse_all("TOAST", LF_BODY).unwrap();
        assert_eq!(bodies(&parts), vec![&b"part: 0"[..], &b"part: 1"[..]]);
        assert_eq!(parts[0].content_type(), Some("application/dicom"));
    }

    #[test]
    fn test_crlf_framed_body_with_preamble_and_epilogue() {
        let body = b"preamble text\r\n--b\r\nContent-Type: application/dicom\r\n\r\n\x00\x01\r\n\x02\r\n--b--\r\nepilogue";
        let parts = PartParser::parse_all("b", body).unwrap();
        assert_eq!(bodies(&parts), vec![&b"\x00\x01\r\n\x02"[..]]);
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let mut parser = PartParser::new("TOAST");
        let mut parts = Vec::new();
        for b in LF_BODY {
            parts.extend(parser.feed(std::slice::from_ref(b)).unwrap());
        }
        parts.extend(parser.finish().unwrap());
        assert_eq!(parts, PartParser::parse_all("TOAST", LF_BODY).unwrap());
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = PartParser::new("x");
        let mut parts = parser.feed(b"--x\r\n\r\nabc\r").unwrap();
        parts.extend(parser.feed(b"\n--x--").unwrap());
        parts.extend(parser.finish().unwrap());
        assert_eq!(bodies(&parts), vec![&b"abc"[..]]);
    }

    #[test]
    fn test_content_id_headers() {
        let body = b"--T\r\nContent-Type: application/dicom\r\nContent-ID: <FIRST>\r\n\r\na\r\n--T\r\nContent-ID: SECOND\r\n\r\nb\r\n--T--";
        let parts = PartParser::parse_all("T", body).unwrap();
        assert_eq!(parts[0].content_id(), Some("FIRST"));
        assert_eq!(parts[1].content_id(), Some("SECOND"));
    }

    #[test]
    fn test_boundary_lookalike_in_payload() {
        let body = b"--T\r\n\r\nline\r\n--Tail is not a boundary\r\n--T--";
        let parts = PartParser::parse_all("T", body).unwrap();
        assert_eq!(bodies(&parts), vec![&b"line\r\n--Tail is not a boundary"[..]]);
    }

    #[test]
    fn test_empty_payload() {
        let body = b"--T\r\nContent-Type: application/dicom\r\n\r\n--T\r\n\r\nx\r\n--T--";
        let parts = PartParser::parse_all("T", body).unwrap();
        assert_eq!(bodies(&parts), vec![&b""[..], &b"x"[..]]);
    }

    #[test]
    fn test_zero_parts() {
        let parts = PartParser::parse_all("T", b"--T--\r\n").unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_missing_boundary_fails() {
        let err = PartParser::parse_all("T", b"no boundary here").unwrap_err();
        assert!(matches!(err, DicomwebError::MalformedMultipart(_)));
        assert!(PartParser::parse_all("T", b"").is_err());
    }

    #[test]
    fn test_truncated_part_fails() {
        let err = PartParser::parse_all("T", b"--T\r\n\r\npart: 0").unwrap_err();
        assert!(matches!(err, DicomwebError::MalformedMultipart(_)));

        let err = PartParser::parse_all("T", b"--T\r\nContent-Type: app").unwrap_err();
        assert!(matches!(err, DicomwebError::MalformedMultipart(_)));
    }

    #[test]
    fn test_invalid_header_line_fails() {
        let mut parser = PartParser::new("T");
        assert!(parser.feed(b"--T\r\nnot a header\r\n\r\nx\r\n--T--").is_err());
        assert_eq!(parser.state(), ParseState::Error);
        assert!(parser.feed(b"more").is_err());
    }

    #[test]
    fn test_folded_header() {
        let body = b"--T\r\nContent-Type: application/dicom;\r\n transfer-syntax=1.2\r\n\r\nx\r\n--T--";
        let parts = PartParser::parse_all("T", body).unwrap();
        assert_eq!(
            parts[0].content_type(),
            Some("application/dicom; transfer-syntax=1.2")
        );
    }

    #[test]
    fn test_headers_too_large() {
        let mut parser = PartParser::new("T");
        parser.feed(b"--T\r\n").unwrap();
        let err = parser.feed(&vec![b'a'; MAX_PART_HEADER_BYTES + 1]).unwrap_err();
        assert!(matches!(err, DicomwebError::MalformedMultipart(_)));
    }
}
