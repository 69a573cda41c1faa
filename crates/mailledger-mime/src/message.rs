//! MIME message structure and decoding.

use crate::charset;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Nesting limit for multipart bodies.
const MAX_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Leaf part of a multipart message.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        transfer_encoding_of(&self.headers)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        decode_transfer(self.transfer_encoding(), &self.body)
    }

    /// Gets the decoded body as a string, converted from the part's charset.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the charset is unknown.
    pub fn body_text(&self) -> Result<String> {
        body_text_of(&self.headers, &self.body)
    }
}

/// MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Leaf parts in document order; nested multiparts are flattened.
    /// Empty for single-part messages.
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Creates a single-part message.
    #[must_use]
    pub const fn single_part(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            body: Some(body),
        }
    }

    /// Creates a multipart message.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Part>) -> Self {
        Self {
            headers,
            parts,
            body: None,
        }
    }

    /// Parses a raw RFC 5322 message.
    ///
    /// Character sets are not applied at this stage: a message whose parts or
    /// encoded headers name an unknown charset still parses, and only the
    /// affected text accessors fail later. Use [`Message::parse_strict`] to
    /// reject such messages up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type is invalid, a multipart body has
    /// no boundary, or multiparts nest too deeply. A multipart body without
    /// any delimiter line parses to a message with no parts.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (head, body) = split_header_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head))?;
        let content_type = content_type_of(&headers)?;

        if content_type.is_multipart() {
            let mut parts = Vec::new();
            collect_parts(&content_type, body, 0, &mut parts)?;
            Ok(Self::multipart(headers, parts))
        } else {
            Ok(Self::single_part(headers, body.to_vec()))
        }
    }

    /// Parses a raw message, failing if any charset it names is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCharset`] in addition to the errors of
    /// [`Message::parse`].
    pub fn parse_strict(raw: &[u8]) -> Result<Self> {
        let message = Self::parse(raw)?;
        match message.unknown_charset() {
            Some(label) => Err(Error::UnknownCharset(label)),
            None => Ok(message),
        }
    }

    /// Returns the first charset used by the message that the decoder does
    /// not recognise.
    #[must_use]
    pub fn unknown_charset(&self) -> Option<String> {
        let declared = std::iter::once(&self.headers)
            .chain(self.parts.iter().map(|p| &p.headers))
            .filter_map(|h| content_type_of(h).ok())
            .filter_map(|ct| ct.charset().map(str::to_string))
            .find(|label| !charset::is_known(label));

        declared.or_else(|| {
            std::iter::once(&self.headers)
                .chain(self.parts.iter().map(|p| &p.headers))
                .find_map(Headers::unknown_charset)
        })
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Checks if this is a multipart message.
    ///
    /// # Errors
    ///
    /// Returns an error if content type cannot be determined.
    pub fn is_multipart(&self) -> Result<bool> {
        Ok(self.content_type()?.is_multipart())
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Subject header, undecoded.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    /// Gets the body as text for single-part messages.
    ///
    /// # Errors
    ///
    /// Returns an error if this is a multipart message or decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let body = self.body.as_ref().ok_or_else(|| {
            Error::InvalidMultipart("Use parts for multipart messages".to_string())
        })?;

        body_text_of(&self.headers, body)
    }

    /// Finds the first text/plain part in a multipart message.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        self.find_part("text", "plain")?.body_text()
    }

    /// Finds the first text/html part in a multipart message.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTML part is found or decoding fails.
    pub fn html_part(&self) -> Result<String> {
        self.find_part("text", "html")?.body_text()
    }

    fn find_part(&self, main_type: &str, sub_type: &str) -> Result<&Part> {
        self.parts
            .iter()
            .find(|part| {
                part.content_type()
                    .is_ok_and(|ct| ct.is(main_type, sub_type))
            })
            .ok_or_else(|| Error::Parse(format!("No {main_type}/{sub_type} part found")))
    }
}

fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .map_or_else(|| Ok(ContentType::default_text()), ContentType::parse)
}

fn transfer_encoding_of(headers: &Headers) -> TransferEncoding {
    headers
        .get("content-transfer-encoding")
        .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
}

fn decode_transfer(encoding: TransferEncoding, body: &[u8]) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => {
            // Line breaks and stray whitespace are common in the wild
            let cleaned: String = String::from_utf8_lossy(body)
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            decode_base64(&cleaned)
        }
        TransferEncoding::QuotedPrintable => decode_quoted_printable(body),
        _ => Ok(body.to_vec()),
    }
}

fn body_text_of(headers: &Headers, body: &[u8]) -> Result<String> {
    let decoded = decode_transfer(transfer_encoding_of(headers), body)?;
    match content_type_of(headers)?.charset() {
        Some(label) => charset::decode(&decoded, label),
        None => String::from_utf8(decoded).map_err(Into::into),
    }
}

/// Splits a raw entity at the first empty line.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        if line == b"\r\n" || line == b"\n" {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}

/// Splits a multipart body and pushes its leaf parts, descending into
/// nested multiparts.
fn collect_parts(
    content_type: &ContentType,
    body: &[u8],
    depth: usize,
    out: &mut Vec<Part>,
) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::InvalidMultipart("nesting too deep".to_string()));
    }
    let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

    for raw_part in split_multipart(body, boundary) {
        let (head, part_body) = split_header_body(&raw_part);
        let headers = Headers::parse(&String::from_utf8_lossy(head))?;
        let part_type = content_type_of(&headers)?;

        if part_type.is_multipart() {
            collect_parts(&part_type, part_body, depth + 1, out)?;
        } else {
            out.push(Part::new(headers, part_body.to_vec()));
        }
    }

    Ok(())
}

/// Returns the raw bytes of every body part between boundary delimiters.
///
/// A body cut short before its first delimiter (a `TOP n 0` reply, for
/// example) has no parts.
fn split_multipart(body: &[u8], boundary: &str) -> Vec<Vec<u8>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for line in body.split_inclusive(|&b| b == b'\n') {
        if let Some(rest) = trim_line_end(line).strip_prefix(delimiter.as_bytes()) {
            let rest = rest.trim_ascii_end();
            if rest.is_empty() || rest == b"--" {
                if let Some(part) = current.take() {
                    parts.push(strip_final_break(part));
                }
                if rest == b"--" {
                    return parts;
                }
                current = Some(Vec::new());
                continue;
            }
        }

        if let Some(part) = current.as_mut() {
            part.extend_from_slice(line);
        }
    }

    // Tolerate a missing close delimiter
    if let Some(part) = current {
        parts.push(strip_final_break(part));
    }

    parts
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_final_break(mut part: Vec<u8>) -> Vec<u8> {
    if part.ends_with(b"\r\n") {
        part.truncate(part.len() - 2);
    } else if part.ends_with(b"\n") {
        part.truncate(part.len() - 1);
    }
    part
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    const MULTIPART: &[u8] = b"From: sender@example.com\r\n\
Subject: =?utf-8?B?SMOpbGxv?=\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
preamble\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
H=C3=A9llo\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
PGI+SGk8L2I+\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
AAAA\r\n\
--outer--\r\n\
epilogue\r\n";

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" Base64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_parse_single_part() {
        let raw = b"From: sender@example.com\r\nSubject: Test\r\n\r\nHello, World!\r\n";
        let message = Message::parse(raw).unwrap();

        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.subject(), Some("Test"));
        assert!(!message.is_multipart().unwrap());
        assert_eq!(message.body_text().unwrap(), "Hello, World!\r\n");
    }

    #[test]
    fn test_parse_without_body() {
        let message = Message::parse(b"Subject: Only headers\r\n").unwrap();
        assert_eq!(message.subject(), Some("Only headers"));
        assert_eq!(message.body.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_parse_nested_multipart() {
        let message = Message::parse(MULTIPART).unwrap();

        assert!(message.is_multipart().unwrap());
        assert_eq!(message.parts.len(), 3);
        assert_eq!(message.headers.text("subject").as_deref(), Some("Héllo"));
        assert_eq!(message.text_part().unwrap(), "Héllo");
        assert_eq!(message.html_part().unwrap(), "<b>Hi</b>");
        assert_eq!(message.parts[2].body, b"AAAA");
        assert!(message.body_text().is_err());
    }

    #[test]
    fn test_parse_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\r\n\r\nbody\r\n";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_parse_multipart_without_delimiters() {
        let raw = b"Subject: cut\r\nContent-Type: multipart/mixed; boundary=x\r\n\r\n\
This is a multi-part message in MIME format.\r\n";
        let message = Message::parse(raw).unwrap();
        assert!(message.is_multipart().unwrap());
        assert!(message.parts.is_empty());
        assert_eq!(message.subject(), Some("cut"));
        assert!(matches!(message.body_text(), Err(Error::InvalidMultipart(_))));
    }

    #[test]
    fn test_parse_multipart_headers_only() {
        let raw = b"Content-Type: multipart/alternative; boundary=\"b1\"\r\n\r\n";
        let message = Message::parse(raw).unwrap();
        assert!(message.parts.is_empty());
        assert!(message.body.is_none());
    }

    #[test]
    fn test_parse_unclosed_multipart() {
        let raw = b"Content-Type: multipart/mixed; boundary=x\r\n\r\n--x\r\n\r\nonly part\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.parts.len(), 1);
        assert_eq!(message.parts[0].body, b"only part");
    }

    #[test]
    fn test_unknown_charset_lenient_and_strict() {
        let raw = b"Subject: test\r\nContent-Type: text/plain; charset=x-klingon\r\n\r\nqapla\r\n";

        let message = Message::parse(raw).unwrap();
        assert_eq!(message.unknown_charset().as_deref(), Some("x-klingon"));
        assert!(message.body_text().unwrap_err().is_unknown_charset());

        let err = Message::parse_strict(raw).unwrap_err();
        assert!(err.is_unknown_charset());
    }

    #[test]
    fn test_unknown_charset_in_header_word() {
        let raw = b"Subject: =?x-klingon?B?YWJj?=\r\n\r\nbody\r\n";
        assert!(Message::parse(raw).is_ok());
        assert!(Message::parse_strict(raw).unwrap_err().is_unknown_charset());
    }

    #[test]
    fn test_part_body_text_charset() {
        let mut headers = Headers::new();
        headers.add("content-type", "text/plain; charset=iso-8859-1");
        let part = Part::new(headers, vec![0x48, 0xE9]);
        assert_eq!(part.body_text().unwrap(), "Hé");
    }

    #[test]
    fn test_part_without_charset_requires_utf8() {
        let mut headers = Headers::new();
        headers.add("content-type", "text/plain");
        let part = Part::new(headers, vec![0xFF, 0xFE]);
        assert!(part.body_text().is_err());
    }
}
