//! POP3 reply types.

use crate::error::{Error, Result};

/// Classified status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// `+OK`, with the text following the token.
    Ok(String),
    /// `-ERR`, with the server's message.
    Err(String),
}

impl Status {
    /// Returns true for `+OK`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Converts `-ERR` into [`Error::Server`], yielding the `+OK` payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] with the server's message for `-ERR`.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Ok(info) => Ok(info),
            Self::Err(message) => Err(Error::Server(message)),
        }
    }
}

/// Successful reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Payload of a single-line reply.
    Line(String),
    /// Body of a multi-line reply: every line CRLF-terminated, dot-unstuffed,
    /// terminator excluded.
    Body(Vec<u8>),
}

impl Reply {
    /// Returns the single-line payload.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if this is a multi-line body.
    pub fn into_line(self) -> Result<String> {
        match self {
            Self::Line(line) => Ok(line),
            Self::Body(_) => Err(Error::Protocol("expected single-line reply".into())),
        }
    }

    /// Returns the multi-line body.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if this is a single-line reply.
    pub fn into_body(self) -> Result<Vec<u8>> {
        match self {
            Self::Body(body) => Ok(body),
            Self::Line(_) => Err(Error::Protocol("expected multi-line reply".into())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_into_result() {
        assert_eq!(Status::Ok("ready".into()).into_result().unwrap(), "ready");
        let err = Status::Err("locked".into()).into_result().unwrap_err();
        assert!(matches!(err, Error::Server(ref m) if m == "locked"));
    }

    #[test]
    fn test_reply_accessors() {
        assert_eq!(Reply::Line("1 2".into()).into_line().unwrap(), "1 2");
        assert_eq!(Reply::Body(b"a\r\n".to_vec()).into_body().unwrap(), b"a\r\n");
        assert!(Reply::Body(Vec::new()).into_line().is_err());
        assert!(Reply::Line(String::new()).into_body().is_err());
    }
}
