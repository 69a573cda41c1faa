//! POP3 connection management.
//!
//! This module provides connection handling for POP3 servers, including:
//! - Configuration (host, port, TLS, dial timeout)
//! - TLS/plaintext stream abstraction
//! - Line framing with multi-line body handling
//! - Session state machine and mailbox operations

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Client, Connection};
pub use config::{Config, ConfigBuilder, DEFAULT_DIAL_TIMEOUT, DEFAULT_PORT, DEFAULT_TLS_PORT};
pub use framed::LineStream;
pub use stream::{Pop3Stream, connect, create_tls_connector};
