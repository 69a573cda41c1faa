//! POP3 response parser.
//!
//! Every response starts with a status line beginning with `+OK` or `-ERR`,
//! optionally followed by a space and free text. Multi-line responses then
//! carry a body terminated by a line holding a single `.`.

use crate::error::{Error, Result};
use crate::types::Status;

/// Success token.
pub const OK: &[u8] = b"+OK";
/// Failure token.
pub const ERR: &[u8] = b"-ERR";
/// Message used when `-ERR` carries no text.
pub const NO_INFO: &str = "unknown error (no info specified in response)";
/// Line that ends a multi-line body.
pub const TERMINATOR: &[u8] = b".";

/// Classifies a status line (without its line terminator).
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line starts with neither token.
pub fn parse_status(line: &[u8]) -> Result<Status> {
    if line == OK {
        return Ok(Status::Ok(String::new()));
    }
    if let Some(info) = strip_token(line, OK) {
        return Ok(Status::Ok(String::from_utf8_lossy(info).into_owned()));
    }
    if line == ERR {
        return Ok(Status::Err(NO_INFO.to_string()));
    }
    if let Some(info) = strip_token(line, ERR) {
        return Ok(Status::Err(String::from_utf8_lossy(info).into_owned()));
    }

    Err(Error::Protocol(format!(
        "unknown response: {}. Neither -ERR, nor +OK",
        String::from_utf8_lossy(line)
    )))
}

/// Strips `token` followed by a single space.
fn strip_token<'a>(line: &'a [u8], token: &[u8]) -> Option<&'a [u8]> {
    line.strip_prefix(token)?.strip_prefix(b" ")
}

/// Returns true if the body line ends a multi-line response.
#[must_use]
pub fn is_terminator(line: &[u8]) -> bool {
    line == TERMINATOR
}

/// Removes the byte-stuffed leading dot from a body line.
///
/// Servers prefix any body line starting with `.` with another `.`
/// (RFC 1939 §3), so `..foo` carries `.foo`.
#[must_use]
pub fn unstuff(line: &[u8]) -> &[u8] {
    if line.starts_with(b"..") {
        &line[1..]
    } else {
        line
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
    use proptest::prelude::*;

    #[test]
    fn test_ok_without_info() {
        assert_eq!(parse_status(b"+OK").unwrap(), Status::Ok(String::new()));
    }

    #[test]
    fn test_ok_with_info() {
        assert_eq!(
            parse_status(b"+OK 7 512").unwrap(),
            Status::Ok("7 512".to_string())
        );
    }

    #[test]
    fn test_err_without_info() {
        assert_eq!(parse_status(b"-ERR").unwrap(), Status::Err(NO_INFO.to_string()));
    }

    #[test]
    fn test_err_with_info() {
        assert_eq!(
            parse_status(b"-ERR no such message").unwrap(),
            Status::Err("no such message".to_string())
        );
    }

    #[test]
    fn test_unknown_response() {
        let err = parse_status(b"* OK IMAP4rev1").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("Neither -ERR, nor +OK"));
    }

    #[test]
    fn test_token_without_separator_is_unknown() {
        assert!(parse_status(b"+OKAY").is_err());
        assert!(parse_status(b"-ERROR").is_err());
        assert!(parse_status(b"").is_err());
        assert!(parse_status(b"+ok").is_err());
    }

    #[test]
    fn test_terminator() {
        assert!(is_terminator(b"."));
        assert!(!is_terminator(b".."));
        assert!(!is_terminator(b".signature"));
        assert!(!is_terminator(b""));
    }

    #[test]
    fn test_unstuff() {
        assert_eq!(unstuff(b"..hidden"), b".hidden");
        assert_eq!(unstuff(b".."), b".");
        assert_eq!(unstuff(b".single"), b".single");
        assert_eq!(unstuff(b"plain"), b"plain");
    }

    proptest! {
        #[test]
        fn prop_ok_payload_roundtrip(info in "[ -~]{1,64}") {
            let line = format!("+OK {info}");
            prop_assert_eq!(parse_status(line.as_bytes()).unwrap(), Status::Ok(info));
        }

        #[test]
        fn prop_err_message_roundtrip(info in "[ -~]{1,64}") {
            let line = format!("-ERR {info}");
            prop_assert_eq!(parse_status(line.as_bytes()).unwrap(), Status::Err(info));
        }

        #[test]
        fn prop_other_lines_are_protocol_errors(line in "[^+-][ -~]{0,64}") {
            prop_assert!(matches!(parse_status(line.as_bytes()), Err(Error::Protocol(_))));
        }
    }
}
