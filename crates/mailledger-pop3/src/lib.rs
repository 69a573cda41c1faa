//! # mailledger-pop3
//!
//! An async POP3 client library implementing RFC 1939.
//!
//! ## Features
//!
//! - **Session state machine**: mailbox commands are refused with
//!   [`Error::InvalidState`] until authentication succeeds
//! - **Typed commands**: every request is a [`Verb`] plus typed arguments
//! - **TLS via rustls**: implicit TLS on port 995, without OpenSSL
//! - **MIME decoding**: retrieved messages come back as
//!   [`mailledger_mime::Message`]
//! - **Mail summaries**: sender, time, subject and bodies through a
//!   provider-specific [`DecodingProfile`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailledger_pop3::{Client, Config, MailDecoder, NeteaseProfile};
//!
//! #[tokio::main]
//! async fn main() -> mailledger_pop3::Result<()> {
//!     let config = Config::builder("pop.163.com").tls(true).build();
//!     let mut conn = Client::new(config).connect().await?;
//!
//!     conn.auth("user@163.com", "auth-code").await?;
//!
//!     let stat = conn.stat().await?;
//!     println!("{} messages, {} octets", stat.count, stat.size);
//!
//!     let decoder = MailDecoder::new(NeteaseProfile);
//!     for msg in conn.list(None).await? {
//!         let message = conn.retrieve(msg.id).await?;
//!         let info = decoder.decode(&message)?;
//!         println!("{} from {}", info.title, info.from);
//!     }
//!
//!     conn.delete(&[1]).await?;
//!     // Deletions are committed only when QUIT succeeds
//!     conn.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! ┌─────────────────────┐
//! │      Connected      │ ─── auth() ───→ Transaction
//! └─────────────────────┘
//!            │  ▲
//!            │  └── USER/PASS/NOOP rejected
//!            ▼
//! ┌─────────────────────┐
//! │   Authenticating    │
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │     Transaction     │ ─── quit() ───→ Terminating ───→ Closed
//! └─────────────────────┘
//! ```
//!
//! A transport or protocol failure in any state moves the session to
//! `Closed`.
//!
//! ## Modules
//!
//! - [`command`]: POP3 command builders
//! - [`connection`]: Configuration, transport and session
//! - [`mail`]: Mail summary extraction
//! - [`parser`]: Status line classification and byte-unstuffing
//! - [`protocol`]: Session states
//! - [`types`]: Replies, message ids and mailbox statistics

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod mail;
pub mod parser;
pub mod protocol;
pub mod types;

pub use command::{Argument, Command, Verb};
pub use connection::{Client, Config, ConfigBuilder, Connection, LineStream, Pop3Stream};
pub use error::{Error, Result};
pub use mail::{DecodingProfile, MailDecoder, MailInfo, NeteaseProfile, StandardProfile};
pub use protocol::SessionState;
pub use types::{MailboxStat, MessageId, Reply, Status};

/// Re-exported so callers can name retrieved messages without a direct
/// dependency.
pub use mailledger_mime as mime;
