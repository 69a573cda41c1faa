//! Mailbox listing types.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A message in the maildrop.
///
/// Message numbers are assigned by the server, run from 1 to N within a
/// session, and are not stable across sessions once deletions are committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    /// Message number.
    pub id: u32,
    /// Size in octets. Zero for UIDL listings, which carry no size.
    pub size: u64,
    /// Unique id, only present in UIDL listings.
    pub uid: Option<String>,
}

impl MessageId {
    /// Parses the lines of a LIST reply (`id size` per line).
    ///
    /// Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns a parse error if a line has a missing or non-numeric field.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(id) = fields.next() else {
                break;
            };
            let size = fields
                .next()
                .ok_or_else(|| Error::parse(format!("missing size in listing: {line}")))?;
            out.push(Self {
                id: parse_number(id, "message number")?,
                size: parse_number(size, "message size")?,
                uid: None,
            });
        }
        Ok(out)
    }

    /// Parses the lines of a UIDL reply (`id unique-id` per line).
    ///
    /// Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns a parse error if a line has a missing field or a non-numeric
    /// message number.
    pub fn parse_uidl(text: &str) -> Result<Vec<Self>> {
        let mut out = Vec::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(id) = fields.next() else {
                break;
            };
            let uid = fields
                .next()
                .ok_or_else(|| Error::parse(format!("missing unique id in listing: {line}")))?;
            out.push(Self {
                id: parse_number(id, "message number")?,
                size: 0,
                uid: Some(uid.to_string()),
            });
        }
        Ok(out)
    }
}

/// Maildrop summary from STAT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxStat {
    /// Number of messages.
    pub count: u32,
    /// Total size in octets.
    pub size: u64,
}

impl MailboxStat {
    /// Parses a STAT payload (`count size`).
    ///
    /// A count of `0` yields an empty maildrop without looking at the size.
    ///
    /// # Errors
    ///
    /// Returns a parse error if a field is missing or not a number.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut fields = payload.split_whitespace();
        let count: u32 = parse_number(
            fields
                .next()
                .ok_or_else(|| Error::parse("empty STAT response"))?,
            "message count",
        )?;
        if count == 0 {
            return Ok(Self::default());
        }

        let size = parse_number(
            fields
                .next()
                .ok_or_else(|| Error::parse(format!("missing maildrop size: {payload}")))?,
            "maildrop size",
        )?;

        Ok(Self { count, size })
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| Error::parse(format!("invalid {what}: {field}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_empty_maildrop() {
        assert_eq!(MailboxStat::parse("0").unwrap(), MailboxStat::default());
        assert_eq!(MailboxStat::parse("0 0").unwrap(), MailboxStat::default());
    }

    #[test]
    fn test_stat_counts() {
        let stat = MailboxStat::parse("3 1024").unwrap();
        assert_eq!(stat, MailboxStat { count: 3, size: 1024 });
    }

    #[test]
    fn test_stat_invalid() {
        assert!(matches!(MailboxStat::parse("abc"), Err(Error::Parse(_))));
        assert!(matches!(MailboxStat::parse(""), Err(Error::Parse(_))));
        assert!(matches!(MailboxStat::parse("3"), Err(Error::Parse(_))));
        assert!(matches!(MailboxStat::parse("3 big"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_list() {
        let ids = MessageId::parse_list("1 100\r\n2 200\r\n3 300\r\n").unwrap();
        let pairs: Vec<_> = ids.iter().map(|m| (m.id, m.size)).collect();
        assert_eq!(pairs, vec![(1, 100), (2, 200), (3, 300)]);
        assert!(ids.iter().all(|m| m.uid.is_none()));
    }

    #[test]
    fn test_parse_list_stops_at_empty_line() {
        let ids = MessageId::parse_list("1 100\r\n\r\n2 200\r\n").unwrap();
        assert_eq!(ids.len(), 1);
        assert!(MessageId::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_list_invalid() {
        assert!(MessageId::parse_list("1\r\n").is_err());
        assert!(MessageId::parse_list("x 100\r\n").is_err());
        assert!(MessageId::parse_list("1 -5\r\n").is_err());
    }

    #[test]
    fn test_parse_uidl() {
        let ids = MessageId::parse_uidl("1 whqtswO00WBw418f9t5JxYwZ\r\n2 QhdPYR:00WBw1Ph7x7\r\n").unwrap();
        assert_eq!(ids[0].id, 1);
        assert_eq!(ids[0].uid.as_deref(), Some("whqtswO00WBw418f9t5JxYwZ"));
        assert_eq!(ids[1].uid.as_deref(), Some("QhdPYR:00WBw1Ph7x7"));
        assert!(MessageId::parse_uidl("3\r\n").is_err());
    }
}
