//! POP3 command builder.

use std::fmt;

/// POP3 command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// USER - Name the mailbox
    User,
    /// PASS - Password for the named mailbox
    Pass,
    /// STAT - Drop listing
    Stat,
    /// LIST - Scan listing
    List,
    /// UIDL - Unique-id listing
    Uidl,
    /// RETR - Retrieve a message
    Retr,
    /// TOP - Headers plus the first lines of the body
    Top,
    /// DELE - Mark a message as deleted
    Dele,
    /// RSET - Unmark all deleted messages
    Rset,
    /// NOOP - No operation
    Noop,
    /// QUIT - End the session, committing deletions
    Quit,
}

impl Verb {
    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Pass => "PASS",
            Self::Stat => "STAT",
            Self::List => "LIST",
            Self::Uidl => "UIDL",
            Self::Retr => "RETR",
            Self::Top => "TOP",
            Self::Dele => "DELE",
            Self::Rset => "RSET",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Decimal number (message number, line count).
    Number(u64),
    /// Free text (user name, password).
    Text(String),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for Argument {
    fn from(n: u32) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<u64> for Argument {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// POP3 command: a verb, its arguments, and whether the response is
/// multi-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    args: Vec<Argument>,
    multiline: bool,
}

impl Command {
    /// Creates a command expecting a single-line response.
    #[must_use]
    pub const fn new(verb: Verb) -> Self {
        Self {
            verb,
            args: Vec::new(),
            multiline: false,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Marks the response as multi-line.
    #[must_use]
    pub const fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// USER name
    #[must_use]
    pub fn user(name: &str) -> Self {
        Self::new(Verb::User).arg(name)
    }

    /// PASS secret
    #[must_use]
    pub fn pass(secret: &str) -> Self {
        Self::new(Verb::Pass).arg(secret)
    }

    /// STAT
    #[must_use]
    pub const fn stat() -> Self {
        Self::new(Verb::Stat)
    }

    /// LIST, or LIST n for a single message.
    #[must_use]
    pub fn list(id: Option<u32>) -> Self {
        match id {
            Some(id) => Self::new(Verb::List).arg(id),
            None => Self::new(Verb::List).multiline(),
        }
    }

    /// UIDL, or UIDL n for a single message.
    #[must_use]
    pub fn uidl(id: Option<u32>) -> Self {
        match id {
            Some(id) => Self::new(Verb::Uidl).arg(id),
            None => Self::new(Verb::Uidl).multiline(),
        }
    }

    /// RETR n
    #[must_use]
    pub fn retr(id: u32) -> Self {
        Self::new(Verb::Retr).arg(id).multiline()
    }

    /// TOP n lines
    #[must_use]
    pub fn top(id: u32, lines: u32) -> Self {
        Self::new(Verb::Top).arg(id).arg(lines).multiline()
    }

    /// DELE n
    #[must_use]
    pub fn dele(id: u32) -> Self {
        Self::new(Verb::Dele).arg(id)
    }

    /// RSET
    #[must_use]
    pub const fn rset() -> Self {
        Self::new(Verb::Rset)
    }

    /// NOOP
    #[must_use]
    pub const fn noop() -> Self {
        Self::new(Verb::Noop)
    }

    /// QUIT
    #[must_use]
    pub const fn quit() -> Self {
        Self::new(Verb::Quit)
    }

    /// Returns the verb.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the arguments in order.
    #[must_use]
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Returns true if the response carries a dot-terminated body.
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Renders the request line without its terminator.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Renders the request line for logs, hiding the password.
    #[must_use]
    pub fn redacted(&self) -> String {
        if self.verb == Verb::Pass {
            format!("{} ****", self.verb)
        } else {
            self.render()
        }
    }

    /// Serializes the command to bytes, including CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.render().into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb.as_str())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_single_message() {
        let cmd = Command::new(Verb::List).arg(7u32);
        assert_eq!(cmd.render(), "LIST 7");
        assert!(!cmd.is_multiline());
        assert_eq!(cmd, Command::list(Some(7)));
    }

    #[test]
    fn test_no_arguments_has_no_trailing_space() {
        assert_eq!(Command::stat().render(), "STAT");
        assert_eq!(Command::list(None).render(), "LIST");
        assert!(Command::list(None).is_multiline());
    }

    #[test]
    fn test_user_pass() {
        assert_eq!(Command::user("alice").serialize(), b"USER alice\r\n");
        assert_eq!(Command::pass("s3cret").serialize(), b"PASS s3cret\r\n");
    }

    #[test]
    fn test_pass_is_redacted() {
        assert_eq!(Command::pass("s3cret").redacted(), "PASS ****");
        assert_eq!(Command::user("alice").redacted(), "USER alice");
    }

    #[test]
    fn test_top_arguments_in_order() {
        let cmd = Command::top(3, 10);
        assert_eq!(cmd.serialize(), b"TOP 3 10\r\n");
        assert_eq!(cmd.args(), &[Argument::Number(3), Argument::Number(10)]);
        assert!(cmd.is_multiline());
    }

    #[test]
    fn test_retr_dele() {
        assert_eq!(Command::retr(1).serialize(), b"RETR 1\r\n");
        assert!(Command::retr(1).is_multiline());
        assert_eq!(Command::dele(9).serialize(), b"DELE 9\r\n");
    }

    #[test]
    fn test_uidl() {
        assert_eq!(Command::uidl(Some(2)).render(), "UIDL 2");
        assert!(Command::uidl(None).is_multiline());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::rset().serialize(), b"RSET\r\n");
        assert_eq!(Command::noop().serialize(), b"NOOP\r\n");
        assert_eq!(Command::quit().serialize(), b"QUIT\r\n");
        assert_eq!(Command::quit().verb(), Verb::Quit);
    }
}
