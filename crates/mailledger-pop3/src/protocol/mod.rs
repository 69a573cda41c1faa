//! POP3 session protocol.

pub mod state;

pub use state::SessionState;
