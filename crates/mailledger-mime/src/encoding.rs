//! Transfer and header decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded words.

use crate::charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=` at end of line, CRLF or bare LF) are removed.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if data[i] != b'=' {
            result.push(data[i]);
            i += 1;
            continue;
        }

        let rest = &data[i + 1..];
        if rest.starts_with(b"\r\n") {
            i += 3;
        } else if rest.starts_with(b"\n") {
            i += 2;
        } else if rest.len() >= 2 {
            let hex = std::str::from_utf8(&rest[..2])
                .map_err(|_| Error::InvalidEncoding("Invalid hex: non-ASCII".to_string()))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
            result.push(byte);
            i += 3;
        } else {
            return Err(Error::InvalidEncoding(
                "Incomplete escape sequence".to_string(),
            ));
        }
    }

    Ok(result)
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format of a word: `=?charset?encoding?encoded-text?=`. Whitespace between
/// two adjacent encoded words is dropped; anything that does not look like
/// an encoded word is copied through unchanged.
///
/// # Errors
///
/// Returns an error if a word uses an unknown encoding or charset, or its
/// payload is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_word(candidate)? {
            if !(after_word && before.trim().is_empty()) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Decodes one encoded word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed, or `None`
/// if `s` does not start with a well-formed word.
fn decode_word(s: &str) -> Result<Option<(String, usize)>> {
    let inner = &s[2..];
    let Some(q1) = inner.find('?') else {
        return Ok(None);
    };
    let charset_label = &inner[..q1];
    let after_charset = &inner[q1 + 1..];
    let Some(q2) = after_charset.find('?') else {
        return Ok(None);
    };
    let encoding = &after_charset[..q2];
    let after_encoding = &after_charset[q2 + 1..];
    let Some(end) = after_encoding.find("?=") else {
        return Ok(None);
    };
    let payload = &after_encoding[..end];

    if charset_label.is_empty() || payload.contains(char::is_whitespace) {
        return Ok(None);
    }

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(payload)?,
        "Q" => decode_quoted_printable(payload.replace('_', " ").as_bytes())?,
        other => {
            return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
        }
    };

    // RFC 2231 allows a language suffix: `utf-8*en`
    let label = charset_label.split('*').next().unwrap_or(charset_label);
    let decoded = charset::decode(&bytes, label)?;
    let consumed = 2 + q1 + 1 + q2 + 1 + end + 2;

    Ok(Some((decoded, consumed)))
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_decode() {
        let decoded = decode_base64("SGVsbG8sIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"Hello, World!").unwrap();
        assert_eq!(decoded, b"Hello, World!");

        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld").unwrap(), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_invalid() {
        assert!(decode_quoted_printable(b"bad=Z1").is_err());
        assert!(decode_quoted_printable(b"short=4").is_err());
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("a =? b").unwrap(), "a =? b");
    }

    #[test]
    fn test_rfc2047_base64() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_there?=").unwrap(), "Héllo there");
    }

    #[test]
    fn test_rfc2047_adjacent_words_and_text() {
        let value = "Re: =?utf-8?Q?H=C3=A9?= =?utf-8?Q?llo?= world";
        assert_eq!(decode_rfc2047(value).unwrap(), "Re: Héllo world");
    }

    #[test]
    fn test_rfc2047_gbk() {
        // "中文" in GBK, base64
        assert_eq!(decode_rfc2047("=?GBK?B?1tDOxA==?=").unwrap(), "中文");
    }

    #[test]
    fn test_rfc2047_unknown_charset() {
        let err = decode_rfc2047("=?x-unknown?Q?abc?=").unwrap_err();
        assert!(err.is_unknown_charset());
    }

    proptest! {
        #[test]
        fn prop_plain_header_text_unchanged(text in "[a-zA-Z0-9 ,.:!-]{0,64}") {
            prop_assert_eq!(decode_rfc2047(&text).unwrap(), text);
        }

        #[test]
        fn prop_quoted_printable_plain_ascii_unchanged(text in "[a-zA-Z0-9 ,.:!-]{0,64}") {
            prop_assert_eq!(decode_quoted_printable(text.as_bytes()).unwrap(), text.as_bytes());
        }
    }
}
