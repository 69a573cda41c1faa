//! Session state types.
//!
//! This module defines the phases a POP3 session moves through,
//! following RFC 1939 section 3.

use std::fmt;

use crate::command::Verb;

/// Session phase of a connection.
///
/// ```text
/// Disconnected ─ greeting ─→ Connected ─ USER/PASS/NOOP ─→ Transaction
///                               ↑   │                          │
///                               └ Authenticating (on failure)  │
///                                                              ↓
///                                    Closed ←── Terminating ←─ QUIT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No transport yet.
    #[default]
    Disconnected,

    /// Greeting accepted; waiting for credentials.
    ///
    /// Valid commands: USER, PASS, NOOP, QUIT.
    Connected,

    /// USER/PASS exchange in flight.
    Authenticating,

    /// Authenticated; the maildrop is locked for this session.
    ///
    /// Valid commands: STAT, LIST, UIDL, RETR, TOP, DELE, RSET, NOOP, QUIT.
    Transaction,

    /// QUIT sent; waiting for the acknowledgment.
    Terminating,

    /// Transport released, either by QUIT or after a fatal error.
    Closed,
}

impl SessionState {
    /// Returns true once USER/PASS/NOOP have all succeeded.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Transaction)
    }

    /// Returns true if commands may still be sent.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::Authenticating | Self::Transaction
        )
    }

    /// Returns true if `verb` may be sent through the command channel.
    ///
    /// QUIT is never allowed here; it ends the session and goes through
    /// the dedicated close path.
    #[must_use]
    pub const fn allows(self, verb: Verb) -> bool {
        match verb {
            Verb::User | Verb::Pass => matches!(self, Self::Connected | Self::Authenticating),
            Verb::Noop => self.is_open(),
            Verb::Stat
            | Verb::List
            | Verb::Uidl
            | Verb::Retr
            | Verb::Top
            | Verb::Dele
            | Verb::Rset => self.is_authenticated(),
            Verb::Quit => false,
        }
    }

    /// Returns true if QUIT may be issued.
    #[must_use]
    pub const fn can_quit(self) -> bool {
        matches!(self, Self::Connected | Self::Transaction)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticating => "authenticating",
            Self::Transaction => "transaction",
            Self::Terminating => "terminating",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_default() {
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!SessionState::Connected.is_authenticated());
        assert!(!SessionState::Authenticating.is_authenticated());
        assert!(SessionState::Transaction.is_authenticated());
        assert!(!SessionState::Closed.is_authenticated());
    }

    #[test]
    fn test_is_open() {
        assert!(!SessionState::Disconnected.is_open());
        assert!(SessionState::Connected.is_open());
        assert!(SessionState::Transaction.is_open());
        assert!(!SessionState::Terminating.is_open());
        assert!(!SessionState::Closed.is_open());
    }

    #[test]
    fn test_allows() {
        assert!(SessionState::Connected.allows(Verb::User));
        assert!(SessionState::Authenticating.allows(Verb::Pass));
        assert!(!SessionState::Transaction.allows(Verb::User));
        assert!(!SessionState::Connected.allows(Verb::Stat));
        assert!(!SessionState::Authenticating.allows(Verb::Retr));
        assert!(SessionState::Transaction.allows(Verb::Dele));
        assert!(SessionState::Connected.allows(Verb::Noop));
        assert!(SessionState::Transaction.allows(Verb::Noop));
        assert!(!SessionState::Closed.allows(Verb::Noop));
        assert!(!SessionState::Transaction.allows(Verb::Quit));
    }

    #[test]
    fn test_can_quit() {
        assert!(SessionState::Connected.can_quit());
        assert!(SessionState::Transaction.can_quit());
        assert!(!SessionState::Authenticating.can_quit());
        assert!(!SessionState::Closed.can_quit());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Transaction.to_string(), "transaction");
    }
}
