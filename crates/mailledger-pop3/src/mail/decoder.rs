//! Projection of a retrieved message into [`MailInfo`].

use mailledger_mime::{ContentType, Message};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::profile::{DecodingProfile, NeteaseProfile};
use crate::error::Result;

/// Summary of one retrieved message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailInfo {
    /// Sender address.
    pub from: String,
    /// Receipt time, unix seconds.
    pub time: i64,
    /// Decoded subject, empty if absent.
    pub title: String,
    /// Plain-text body, empty if the message has none.
    pub content: String,
    /// HTML body, empty if the message has none.
    pub html_content: String,
}

/// Decodes messages using the conventions of one provider.
#[derive(Debug, Clone, Default)]
pub struct MailDecoder<P = NeteaseProfile> {
    profile: P,
}

impl<P: DecodingProfile> MailDecoder<P> {
    /// Creates a decoder for the given profile.
    #[must_use]
    pub const fn new(profile: P) -> Self {
        Self { profile }
    }

    /// Returns the profile in use.
    #[must_use]
    pub const fn profile(&self) -> &P {
        &self.profile
    }

    /// Extracts sender, receipt time, subject and bodies.
    ///
    /// Body parts that cannot be decoded are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot find the sender or the
    /// receipt time.
    pub fn decode(&self, message: &Message) -> Result<MailInfo> {
        let mut info = MailInfo {
            from: self.profile.sender(message)?,
            time: self.profile.received_at(message)?,
            title: message.headers.text("subject").unwrap_or_default(),
            ..MailInfo::default()
        };

        if message.parts.is_empty() {
            if let Ok(content_type) = message.content_type() {
                info.fill(&content_type, || message.body_text());
            }
        } else {
            for (index, part) in message.parts.iter().enumerate() {
                match part.content_type() {
                    Ok(content_type) => info.fill(&content_type, || part.body_text()),
                    Err(e) => warn!(index, error = %e, "Skipping part with invalid content type"),
                }
            }
        }

        Ok(info)
    }
}

impl MailInfo {
    fn fill(
        &mut self,
        content_type: &ContentType,
        body: impl FnOnce() -> mailledger_mime::Result<String>,
    ) {
        let slot = if content_type.is("text", "plain") {
            &mut self.content
        } else if content_type.is("text", "html") {
            &mut self.html_content
        } else {
            return;
        };

        match body() {
            Ok(text) => *slot = text,
            Err(e) => warn!(
                content_type = %content_type.mime_type(),
                error = %e,
                "Skipping undecodable body"
            ),
        }
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
    use crate::Error;
    use crate::mail::StandardProfile;

    const RECEIVED: &str = "Received: from alice$163.com ( [10.0.0.1] ) by ajax-webmail-wmsvr1 (Coremail) ; Mon, 2 Jan 2023 15:04:05 +0800 (CST)\r\n";

    fn raw(rest: &str) -> Vec<u8> {
        format!("{RECEIVED}{rest}").into_bytes()
    }

    #[test]
    fn test_decode_multipart() {
        let raw = raw("Subject: =?UTF-8?B?5L2g5aW9?=\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=GBK\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
xOO6ww==\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>hi</p>\r\n\
--b1--\r\n");
        let message = Message::parse(&raw).unwrap();

        let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
        assert_eq!(info.from, "alice@163.com");
        assert_eq!(info.time, 1672643045);
        assert_eq!(info.title, "你好");
        assert_eq!(info.content, "你好");
        assert_eq!(info.html_content, "<p>hi</p>");
    }

    #[test]
    fn test_decode_without_subject() {
        let message = Message::parse(&raw("\r\nbody")).unwrap();
        let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
        assert_eq!(info.title, "");
    }

    #[test]
    fn test_decode_single_part() {
        let message = Message::parse(&raw(
            "Content-Type: text/html; charset=utf-8\r\n\r\n<b>only</b>",
        ))
        .unwrap();

        let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
        assert_eq!(info.html_content, "<b>only</b>");
        assert!(info.content.is_empty());
    }

    #[test]
    fn test_later_part_overwrites() {
        let message = Message::parse(&raw("Content-Type: multipart/mixed; boundary=x\r\n\
\r\n\
--x\r\n\
Content-Type: text/plain\r\n\
\r\n\
first\r\n\
--x\r\n\
Content-Type: text/plain\r\n\
\r\n\
second\r\n\
--x--\r\n"))
        .unwrap();

        let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
        assert_eq!(info.content, "second");
    }

    #[test]
    fn test_undecodable_part_is_skipped() {
        let message = Message::parse(&raw("Content-Type: multipart/mixed; boundary=x\r\n\
\r\n\
--x\r\n\
Content-Type: text/plain; charset=x-klingon\r\n\
\r\n\
qapla\r\n\
--x\r\n\
Content-Type: text/html\r\n\
\r\n\
<i>ok</i>\r\n\
--x\r\n\
Content-Type: application/pdf\r\n\
\r\n\
%PDF\r\n\
--x--\r\n"))
        .unwrap();

        let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
        assert!(info.content.is_empty());
        assert_eq!(info.html_content, "<i>ok</i>");
    }

    #[test]
    fn test_missing_received_is_parse_error() {
        let message = Message::parse(b"Subject: hi\r\n\r\nbody").unwrap();
        let err = MailDecoder::new(NeteaseProfile).decode(&message).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_standard_profile_decoder() {
        let message = Message::parse(
            b"From: Bob <bob@example.com>\r\n\
Date: Tue, 10 Jan 2023 08:00:00 +0000\r\n\
Subject: Status\r\n\
\r\n\
All good\r\n",
        )
        .unwrap();

        let info = MailDecoder::new(StandardProfile).decode(&message).unwrap();
        assert_eq!(info.from, "bob@example.com");
        assert_eq!(info.time, 1673337600);
        assert_eq!(info.content, "All good\r\n");
    }

    #[test]
    fn test_mail_info_json() {
        let info = MailInfo {
            from: "alice@163.com".to_string(),
            time: 1672643045,
            title: "hi".to_string(),
            content: "text".to_string(),
            html_content: "<p>text</p>".to_string(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["from"], "alice@163.com");
        assert_eq!(json["time"], 1672643045);
        assert_eq!(json["html_content"], "<p>text</p>");

        let back: MailInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
