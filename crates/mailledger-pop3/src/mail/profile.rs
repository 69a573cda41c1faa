//! Provider-specific header conventions.

use chrono::DateTime;
use mailledger_mime::Message;

use crate::error::{Error, Result};

/// Layout of the date clause in a Netease `Received` header,
/// e.g. `Mon, 2 Jan 2023 15:04:05 +0800`.
const NETEASE_DATE_FORMAT: &str = "%a, %e %b %Y %H:%M:%S %z";

/// How a mail provider records the sender and the receipt time.
pub trait DecodingProfile {
    /// Extracts the sender address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the headers do not follow the convention.
    fn sender(&self, message: &Message) -> Result<String>;

    /// Extracts the receipt time as unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the headers do not follow the convention.
    fn received_at(&self, message: &Message) -> Result<i64>;
}

/// Convention of the 163/126 mailboxes.
///
/// The first `Received` header reads
/// `from alice$example.com (...) by ...; Mon, 2 Jan 2023 15:04:05 +0800 (CST)`,
/// with `$` standing in for `@` in the sender address.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeteaseProfile;

impl NeteaseProfile {
    fn clauses(message: &Message) -> Result<(String, String)> {
        let received = message
            .headers
            .text("received")
            .ok_or_else(|| Error::parse("missing Received header"))?;
        let (routing, date) = received
            .split_once(';')
            .ok_or_else(|| Error::parse(format!("Received header has no date clause: {received}")))?;
        Ok((routing.to_string(), date.to_string()))
    }
}

impl DecodingProfile for NeteaseProfile {
    fn sender(&self, message: &Message) -> Result<String> {
        let (routing, _) = Self::clauses(message)?;
        routing
            .split_whitespace()
            .nth(1)
            .map(|token| token.replace('$', "@"))
            .ok_or_else(|| Error::parse(format!("no sender in Received header: {routing}")))
    }

    fn received_at(&self, message: &Message) -> Result<i64> {
        let (_, date) = Self::clauses(message)?;
        let date = date.replace("(CST)", "");
        let date = date.trim();
        DateTime::parse_from_str(date, NETEASE_DATE_FORMAT)
            .map(|dt| dt.timestamp())
            .map_err(|e| Error::parse(format!("invalid Received date {date:?}: {e}")))
    }
}

/// Plain RFC 5322 convention: `From` and `Date` headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardProfile;

impl DecodingProfile for StandardProfile {
    fn sender(&self, message: &Message) -> Result<String> {
        let from = message
            .headers
            .text("from")
            .ok_or_else(|| Error::parse("missing From header"))?;

        // `Name <addr>` keeps only the address
        let address = match (from.rfind('<'), from.rfind('>')) {
            (Some(start), Some(end)) if start < end => &from[start + 1..end],
            _ => from.as_str(),
        };
        Ok(address.trim().to_string())
    }

    fn received_at(&self, message: &Message) -> Result<i64> {
        let date = message
            .date()
            .ok_or_else(|| Error::parse("missing Date header"))?
            .trim();
        DateTime::parse_from_rfc2822(date)
            .map(|dt| dt.timestamp())
            .map_err(|e| Error::parse(format!("invalid Date {date:?}: {e}")))
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

    fn message(headers: &str) -> Message {
        Message::parse(format!("{headers}\r\n\r\nbody\r\n").as_bytes()).unwrap()
    }

    #[test]
    fn test_netease_received() {
        let msg = message(
            "Received: from alice$example.com ( [10.0.0.1] ) by ajax-webmail (Coremail) ; Mon, 2 Jan 2023 15:04:05 +0800 (CST)",
        );

        assert_eq!(NeteaseProfile.sender(&msg).unwrap(), "alice@example.com");
        // 2023-01-02T07:04:05Z
        assert_eq!(NeteaseProfile.received_at(&msg).unwrap(), 1672643045);
    }

    #[test]
    fn test_netease_uses_first_received() {
        let msg = message(
            "Received: from first$example.com by a; Tue, 10 Jan 2023 08:00:00 +0000\r\n\
             Received: from second$example.com by b; Tue, 10 Jan 2023 07:00:00 +0000",
        );
        assert_eq!(NeteaseProfile.sender(&msg).unwrap(), "first@example.com");
    }

    #[test]
    fn test_netease_missing_header() {
        let msg = message("Subject: no routing");
        assert!(matches!(NeteaseProfile.sender(&msg), Err(Error::Parse(_))));
        assert!(matches!(NeteaseProfile.received_at(&msg), Err(Error::Parse(_))));
    }

    #[test]
    fn test_netease_missing_date_clause() {
        let msg = message("Received: from alice$example.com by mx");
        assert!(NeteaseProfile.received_at(&msg).is_err());
    }

    #[test]
    fn test_netease_missing_sender_token() {
        let msg = message("Received: from; Mon, 2 Jan 2023 15:04:05 +0800");
        assert!(NeteaseProfile.sender(&msg).is_err());
    }

    #[test]
    fn test_netease_bad_date() {
        let msg = message("Received: from alice$example.com by mx; yesterday (CST)");
        assert!(matches!(NeteaseProfile.received_at(&msg), Err(Error::Parse(_))));
    }

    #[test]
    fn test_standard_profile() {
        let msg = message(
            "From: \"Alice\" <alice@example.com>\r\nDate: Mon, 2 Jan 2023 15:04:05 +0800",
        );
        assert_eq!(StandardProfile.sender(&msg).unwrap(), "alice@example.com");
        assert_eq!(StandardProfile.received_at(&msg).unwrap(), 1672643045);
    }

    #[test]
    fn test_standard_profile_bare_address() {
        let msg = message("From: bob@example.com");
        assert_eq!(StandardProfile.sender(&msg).unwrap(), "bob@example.com");
        assert!(StandardProfile.received_at(&msg).is_err());
    }
}
