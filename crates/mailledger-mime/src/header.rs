//! MIME header handling.

use crate::encoding::decode_rfc2047;
use crate::error::{Error, Result};

/// Header block of a message or body part.
///
/// Fields keep their original order and spelling. Lookups ignore case, and
/// a name may appear several times (one `Received` per hop, for example).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Gets the first value of a field, undecoded.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name).next()
    }

    /// Gets every value of a field in document order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.values(name).collect()
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values(name).next().is_some()
    }

    /// Number of fields, counting repeated names separately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn values<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the first value of a field with RFC 2047 encoded words decoded.
    ///
    /// A value that cannot be decoded (unknown charset, bad base64) is
    /// returned as written.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|raw| decode_rfc2047(raw).unwrap_or_else(|_| raw.to_string()))
    }

    /// Parses a header block.
    ///
    /// Continuation lines (leading space or tab) are unfolded into the
    /// previous field. Parsing stops at the first empty line; lines without
    /// a colon are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if a field has an empty name.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();

        for line in text.lines().take_while(|line| !line.is_empty()) {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.fields.last_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Parse(format!("header without a name: {line}")));
            }
            headers.add(name, value.trim());
        }

        Ok(headers)
    }

    /// Returns the first charset named by an RFC 2047 word that cannot be
    /// decoded, if any.
    pub(crate) fn unknown_charset(&self) -> Option<String> {
        self.fields
            .iter()
            .find_map(|(_, value)| match decode_rfc2047(value) {
                Err(Error::UnknownCharset(label)) => Some(label),
                _ => None,
            })
    }
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

    #[test]
    fn test_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
        assert!(!headers.contains("subject"));
    }

    #[test]
    fn test_repeated_fields_keep_order() {
        let text = "Received: from a by b\r\nX-Spam: no\r\nreceived: from c by d\r\n\r\n";
        let headers = Headers::parse(text).unwrap();

        assert_eq!(headers.get_all("Received"), vec!["from a by b", "from c by d"]);
        assert_eq!(headers.get("received"), Some("from a by b"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Received", "X-Spam", "received"]);
    }

    #[test]
    fn test_parse_unfolds_and_stops_at_blank_line() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test\r\n",
            "Content-Type: text/plain;\r\n",
            "\tcharset=utf-8\r\n",
            "garbage without colon\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Content-Type"), Some("text/plain; charset=utf-8"));
        assert!(headers.get("Body").is_none());
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert!(Headers::parse(": orphan value\r\n").is_err());
    }

    #[test]
    fn test_text_decodes_words() {
        let mut headers = Headers::new();
        headers.add("Subject", "=?utf-8?B?SMOpbGxv?=");
        assert_eq!(headers.text("subject").as_deref(), Some("Héllo"));
        assert_eq!(headers.text("missing"), None);
    }

    #[test]
    fn test_text_falls_back_to_raw() {
        let mut headers = Headers::new();
        headers.add("Subject", "=?x-unknown?Q?abc?=");
        assert_eq!(headers.text("subject").as_deref(), Some("=?x-unknown?Q?abc?="));
        assert_eq!(headers.unknown_charset().as_deref(), Some("x-unknown"));
    }
}
