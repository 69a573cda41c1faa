//! # mailledger-mime
//!
//! MIME decoding library for retrieved email.
//!
//! ## Features
//!
//! - **Message parsing**: Raw RFC 5322 bytes into headers plus a flattened
//!   list of leaf parts, with nested multipart support
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Charsets**: Any WHATWG-registered charset (UTF-8, GBK, ISO-8859-x, ...)
//! - **Content types**: Type, subtype and parameter parsing
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailledger_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Hello, World!\r\n";
//!
//! let message = Message::parse(raw)?;
//! println!("Subject: {}", message.headers.text("subject").unwrap_or_default());
//! println!("Body: {}", message.body_text()?);
//! ```
//!
//! ## Unknown charsets
//!
//! [`Message::parse`] does not apply charsets, so a message naming an
//! unknown charset still yields its structure. [`Message::parse_strict`]
//! rejects it with [`Error::UnknownCharset`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod charset;
pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
