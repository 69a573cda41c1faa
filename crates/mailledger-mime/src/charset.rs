//! Character set conversion.
//!
//! Labels are resolved with the WHATWG encoding registry, so the common
//! aliases (`gb2312`, `latin1`, `windows-1252`, `shift_jis`, ...) all work.

use encoding_rs::{Encoding, UTF_8};

use crate::error::{Error, Result};

/// Looks up a charset label.
#[must_use]
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().trim_matches('"').as_bytes())
}

/// Returns true if the charset label is known.
#[must_use]
pub fn is_known(label: &str) -> bool {
    lookup(label).is_some()
}

/// Decodes bytes in the given charset into a string.
///
/// Malformed sequences are replaced with U+FFFD, mirroring how mail
/// readers display damaged text.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if the label is not recognised.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = lookup(label).ok_or_else(|| Error::UnknownCharset(label.to_string()))?;
    if encoding == UTF_8 {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert!(is_known("utf-8"));
        assert!(is_known("UTF-8"));
        assert!(is_known("us-ascii"));
        assert!(is_known("GBK"));
        assert!(is_known("\"iso-8859-1\""));
        assert!(!is_known("x-made-up"));
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode(&[0x48, 0xE9], "iso-8859-1").unwrap(), "Hé");
    }

    #[test]
    fn test_decode_gbk() {
        // "中文" in GBK
        assert_eq!(decode(&[0xD6, 0xD0, 0xCE, 0xC4], "gbk").unwrap(), "中文");
    }

    #[test]
    fn test_decode_unknown() {
        let err = decode(b"abc", "x-made-up").unwrap_err();
        assert!(err.is_unknown_charset());
    }
}
