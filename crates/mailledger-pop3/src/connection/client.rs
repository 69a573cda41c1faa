//! POP3 client and session.

use mailledger_mime::Message;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::framed::LineStream;
use super::stream::{self, Pop3Stream};
use super::Config;
use crate::command::{Command, Verb};
use crate::error::{Error, Result};
use crate::parser::parse_status;
use crate::protocol::SessionState;
use crate::types::{MailboxStat, MessageId, Reply};

/// Factory for POP3 connections to one server.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
}

impl Client {
    /// Creates a client. A missing dial timeout falls back to 3 seconds.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Dials the server and validates its greeting.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the dial or TLS handshake fails or times
    /// out, and a server or protocol error if the greeting is not `+OK`.
    pub async fn connect(&self) -> Result<Connection<Pop3Stream>> {
        info!(
            host = %self.config.host,
            port = self.config.port,
            tls = self.config.tls_enabled,
            "Connecting to POP3 server"
        );
        let stream = stream::connect(&self.config).await?;
        Connection::from_stream(stream).await
    }
}

/// A live POP3 session.
///
/// One command is in flight at a time; every operation takes `&mut self`
/// and completes its full request/response exchange before returning.
pub struct Connection<S = Pop3Stream> {
    framed: LineStream<S>,
    state: SessionState,
    greeting: String,
}

impl Connection<Pop3Stream> {
    /// Returns true if the session runs over TLS.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.framed.get_ref().is_tls()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server
    /// answers `-ERR`.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = LineStream::new(stream);
        let line = framed.read_line().await?;
        let greeting = parse_status(&line)?.into_result()?;
        debug!(%greeting, "Server greeting");

        Ok(Self {
            framed,
            state: SessionState::Connected,
            greeting,
        })
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once [`Connection::auth`] has succeeded.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Returns the text of the server greeting.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Sends one command and consumes its complete response.
    ///
    /// The command must be legal in the current state: USER and PASS before
    /// authentication, mailbox commands after it, NOOP in either. QUIT is
    /// only sent by [`Connection::quit`]. A `-ERR` status is returned as
    /// [`Error::Server`] without reading a body. Transport and protocol
    /// errors close the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] without touching the wire if the
    /// command is not allowed now, otherwise an error if the exchange fails
    /// or the server rejects the command.
    pub async fn execute(&mut self, cmd: &Command) -> Result<Reply> {
        self.check(cmd.verb())?;

        let result = self.round_trip(cmd).await;
        if let Err(e) = &result
            && e.is_fatal()
        {
            warn!(error = %e, verb = %cmd.verb(), "Connection failed; closing session");
            self.state = SessionState::Closed;
        }
        result
    }

    async fn round_trip(&mut self, cmd: &Command) -> Result<Reply> {
        debug!(command = %cmd.redacted(), "C:");
        self.framed.send_line(&cmd.render()).await?;

        let line = self.framed.read_line().await?;
        let info = parse_status(&line)?.into_result()?;

        if cmd.is_multiline() {
            let body = self.framed.read_multiline().await?;
            debug!(verb = %cmd.verb(), bytes = body.len(), "S: +OK (multi-line)");
            Ok(Reply::Body(body))
        } else {
            debug!(verb = %cmd.verb(), %info, "S: +OK");
            Ok(Reply::Line(info))
        }
    }

    fn check(&self, verb: Verb) -> Result<()> {
        if self.state.allows(verb) {
            return Ok(());
        }
        let reason = match verb {
            Verb::Quit => "QUIT is sent by Connection::quit".to_string(),
            _ if self.state.is_open() && !self.state.is_authenticated() => {
                format!("{verb} requires an authenticated session")
            }
            _ => format!("cannot send {verb} in {} state", self.state),
        };
        Err(Error::InvalidState(reason))
    }

    /// Authenticates with USER and PASS, then confirms with NOOP.
    ///
    /// On failure the session stays unauthenticated and a later call
    /// starts over from USER.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three commands fails, or if the
    /// session is not waiting for credentials.
    pub async fn auth(&mut self, user: &str, password: &str) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::InvalidState(format!(
                "cannot authenticate in {} state",
                self.state
            )));
        }

        self.state = SessionState::Authenticating;
        match self.login(user, password).await {
            Ok(()) => {
                self.state = SessionState::Transaction;
                info!(user, "Authenticated");
                Ok(())
            }
            Err(e) => {
                if self.state == SessionState::Authenticating {
                    self.state = SessionState::Connected;
                }
                warn!(user, error = %e, "Authentication failed");
                Err(e)
            }
        }
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        self.execute(&Command::user(user)).await?;
        self.execute(&Command::pass(password)).await?;
        // Some servers only report bad credentials on the next command
        self.execute(&Command::noop()).await?;
        Ok(())
    }

    /// Returns the number of messages and their total size in octets.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the reply is malformed.
    pub async fn stat(&mut self) -> Result<MailboxStat> {
        let payload = self.execute(&Command::stat()).await?.into_line()?;
        MailboxStat::parse(&payload)
    }

    /// Lists message numbers and sizes.
    ///
    /// `None` (or `Some(0)`) lists every message; `Some(n)` asks for message
    /// `n` alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the listing is malformed.
    pub async fn list(&mut self, id: Option<u32>) -> Result<Vec<MessageId>> {
        let text = self.listing(Command::list(id.filter(|&id| id > 0))).await?;
        MessageId::parse_list(&text)
    }

    /// Lists message numbers and unique ids.
    ///
    /// `None` (or `Some(0)`) lists every message; `Some(n)` asks for message
    /// `n` alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the listing is malformed.
    pub async fn uidl(&mut self, id: Option<u32>) -> Result<Vec<MessageId>> {
        let text = self.listing(Command::uidl(id.filter(|&id| id > 0))).await?;
        MessageId::parse_uidl(&text)
    }

    async fn listing(&mut self, cmd: Command) -> Result<String> {
        match self.execute(&cmd).await? {
            Reply::Line(line) => Ok(line),
            Reply::Body(body) => Ok(String::from_utf8_lossy(&body).into_owned()),
        }
    }

    /// Downloads a message and decodes it.
    ///
    /// Unknown character sets are tolerated: the message is returned with
    /// the affected text left undecoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the message structure
    /// cannot be decoded.
    pub async fn retrieve(&mut self, id: u32) -> Result<Message> {
        let raw = self.retrieve_raw(id).await?;
        let message = Message::parse(&raw)?;
        if let Some(charset) = message.unknown_charset() {
            warn!(id, %charset, "Message uses an unknown charset; text left undecoded");
        }
        Ok(message)
    }

    /// Downloads a message and returns its raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn retrieve_raw(&mut self, id: u32) -> Result<Vec<u8>> {
        self.execute(&Command::retr(id)).await?.into_body()
    }

    /// Downloads the headers and the first `lines` body lines of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the message cannot be
    /// decoded, including when it names an unknown character set.
    pub async fn top(&mut self, id: u32, lines: u32) -> Result<Message> {
        let raw = self.execute(&Command::top(id, lines)).await?.into_body()?;
        Ok(Message::parse_strict(&raw)?)
    }

    /// Marks messages for deletion, one DELE per id, in order.
    ///
    /// Deletions only take effect after a successful [`Connection::quit`].
    /// Stops at the first failure; messages before it stay marked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delete`] naming the message that failed.
    pub async fn delete(&mut self, ids: &[u32]) -> Result<()> {
        self.check(Verb::Dele)?;
        for &id in ids {
            self.execute(&Command::dele(id))
                .await
                .map_err(|source| Error::Delete {
                    id,
                    source: Box::new(source),
                })?;
            debug!(id, "Marked for deletion");
        }
        Ok(())
    }

    /// Unmarks every message marked for deletion in this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn reset(&mut self) -> Result<()> {
        self.execute(&Command::rset()).await?;
        Ok(())
    }

    /// Sends NOOP. Allowed before authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn noop(&mut self) -> Result<()> {
        self.execute(&Command::noop()).await?;
        Ok(())
    }

    /// Sends QUIT and closes the connection.
    ///
    /// The server commits marked deletions only if it acknowledges QUIT.
    /// The transport is shut down whatever the acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns the QUIT failure if there was one, otherwise any error from
    /// shutting down the transport.
    pub async fn quit(mut self) -> Result<()> {
        if !self.state.can_quit() {
            return Err(Error::InvalidState(format!(
                "cannot quit in {} state",
                self.state
            )));
        }

        self.state = SessionState::Terminating;
        let ack = self.round_trip(&Command::quit()).await;
        let closed = self.framed.shutdown().await;
        self.state = SessionState::Closed;

        match (ack, closed) {
            (Ok(_), Ok(())) => {
                info!("Session closed");
                Ok(())
            }
            (Err(e), _) => {
                warn!(error = %e, "QUIT failed; marked deletions not committed");
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
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
    use tokio_test::io::{Builder, Mock};

    /// Greeting plus a successful USER/PASS/NOOP exchange.
    fn session() -> Builder {
        let mut builder = Builder::new();
        builder
            .read(b"+OK POP3 server ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS secret\r\n")
            .read(b"+OK maildrop locked\r\n")
            .write(b"NOOP\r\n")
            .read(b"+OK\r\n");
        builder
    }

    async fn authenticated(builder: &mut Builder) -> Connection<Mock> {
        let mut conn = Connection::from_stream(builder.build()).await.unwrap();
        conn.auth("alice", "secret").await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_greeting() {
        let mock = Builder::new().read(b"+OK POP3 server ready\r\n").build();
        let conn = Connection::from_stream(mock).await.unwrap();
        assert_eq!(conn.greeting(), "POP3 server ready");
        assert_eq!(conn.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_greeting_rejected() {
        let mock = Builder::new().read(b"-ERR too busy\r\n").build();
        let err = Connection::from_stream(mock).await.err().unwrap();
        assert!(matches!(err, Error::Server(ref m) if m == "too busy"));
    }

    #[tokio::test]
    async fn test_greeting_garbage() {
        let mock = Builder::new().read(b"220 smtp.example.com ESMTP\r\n").build();
        let err = Connection::from_stream(mock).await.err().unwrap();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_auth() {
        let conn = authenticated(&mut session()).await;
        assert!(conn.is_authenticated());
        assert_eq!(conn.state(), SessionState::Transaction);
    }

    #[tokio::test]
    async fn test_auth_failure_then_retry() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS wrong\r\n")
            .read(b"-ERR invalid password\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS right\r\n")
            .read(b"+OK\r\n")
            .write(b"NOOP\r\n")
            .read(b"+OK\r\n")
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        let err = conn.auth("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Server(ref m) if m == "invalid password"));
        assert_eq!(conn.state(), SessionState::Connected);

        conn.auth("alice", "right").await.unwrap();
        assert!(conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_auth_rejected_by_noop() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .write(b"PASS secret\r\n")
            .read(b"+OK\r\n")
            .write(b"NOOP\r\n")
            .read(b"-ERR authentication failed\r\n")
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        assert!(conn.auth("alice", "secret").await.is_err());
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_auth_twice_is_invalid() {
        let mut conn = authenticated(&mut session()).await;
        let err = conn.auth("alice", "secret").await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_operations_require_auth() {
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        assert!(matches!(conn.stat().await, Err(Error::InvalidState(_))));
        assert!(matches!(conn.list(None).await, Err(Error::InvalidState(_))));
        assert!(matches!(conn.retrieve_raw(1).await, Err(Error::InvalidState(_))));
        assert!(matches!(conn.top(1, 0).await, Err(Error::InvalidState(_))));
        assert!(matches!(conn.delete(&[1]).await, Err(Error::InvalidState(_))));
        assert!(matches!(conn.reset().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_noop_before_auth() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"NOOP\r\n")
            .read(b"+OK\r\n")
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();
        conn.noop().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_single_line() {
        let mut conn = authenticated(session().write(b"LIST 7\r\n").read(b"+OK 7 512\r\n")).await;

        let reply = conn.execute(&Command::list(Some(7))).await.unwrap();
        assert_eq!(reply, Reply::Line("7 512".to_string()));
    }

    #[tokio::test]
    async fn test_execute_error_skips_body() {
        let mut conn = authenticated(
            session()
                .write(b"RETR 9\r\n")
                .read(b"-ERR no such message\r\n")
                .write(b"NOOP\r\n")
                .read(b"+OK\r\n"),
        )
        .await;

        let err = conn.execute(&Command::retr(9)).await.unwrap_err();
        assert!(err.is_server());
        // Connection is still usable
        conn.noop().await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_mailbox_command_before_auth() {
        // The mock fails the test if anything beyond the greeting is written
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        for cmd in [
            Command::stat(),
            Command::list(None),
            Command::uidl(Some(1)),
            Command::retr(1),
            Command::top(1, 0),
            Command::dele(1),
            Command::rset(),
        ] {
            let err = conn.execute(&cmd).await.unwrap_err();
            assert!(matches!(err, Error::InvalidState(_)), "{cmd}: {err}");
        }
        assert_eq!(conn.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_execute_credentials_after_auth() {
        let mut conn = authenticated(&mut session()).await;

        let err = conn.execute(&Command::user("bob")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        let err = conn.execute(&Command::pass("secret")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(conn.state(), SessionState::Transaction);
    }

    #[tokio::test]
    async fn test_execute_refuses_quit() {
        let mut conn = authenticated(&mut session()).await;

        let err = conn.execute(&Command::quit()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(conn.state(), SessionState::Transaction);
    }

    #[tokio::test]
    async fn test_execute_user_before_auth() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"+OK\r\n")
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        let reply = conn.execute(&Command::user("alice")).await.unwrap();
        assert_eq!(reply, Reply::Line(String::new()));
    }

    #[tokio::test]
    async fn test_protocol_error_closes_session() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"NOOP\r\n")
            .read(b"* BYE\r\n")
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        assert!(matches!(conn.noop().await, Err(Error::Protocol(_))));
        assert_eq!(conn.state(), SessionState::Closed);
        assert!(matches!(conn.noop().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_stat() {
        let mut conn = authenticated(
            session()
                .write(b"STAT\r\n")
                .read(b"+OK 3 1024\r\n")
                .write(b"STAT\r\n")
                .read(b"+OK 0\r\n")
                .write(b"STAT\r\n")
                .read(b"+OK abc\r\n"),
        )
        .await;

        assert_eq!(conn.stat().await.unwrap(), MailboxStat { count: 3, size: 1024 });
        assert_eq!(conn.stat().await.unwrap(), MailboxStat::default());
        assert!(matches!(conn.stat().await, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_list_all() {
        let mut conn = authenticated(
            session()
                .write(b"LIST\r\n")
                .read(b"+OK 3 messages\r\n1 100\r\n2 200\r\n3 300\r\n.\r\n"),
        )
        .await;

        let ids = conn.list(None).await.unwrap();
        let pairs: Vec<_> = ids.iter().map(|m| (m.id, m.size)).collect();
        assert_eq!(pairs, vec![(1, 100), (2, 200), (3, 300)]);
    }

    #[tokio::test]
    async fn test_list_one() {
        let mut conn = authenticated(session().write(b"LIST 2\r\n").read(b"+OK 2 200\r\n")).await;

        let ids = conn.list(Some(2)).await.unwrap();
        assert_eq!(ids, vec![MessageId { id: 2, size: 200, uid: None }]);
    }

    #[tokio::test]
    async fn test_list_zero_means_all() {
        let mut conn = authenticated(session().write(b"LIST\r\n").read(b"+OK\r\n.\r\n")).await;

        assert!(conn.list(Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uidl() {
        let mut conn = authenticated(
            session()
                .write(b"UIDL\r\n")
                .read(b"+OK\r\n1 abc\r\n2 def\r\n.\r\n")
                .write(b"UIDL 2\r\n")
                .read(b"+OK 2 def\r\n"),
        )
        .await;

        let all = conn.uidl(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].uid.as_deref(), Some("def"));

        let one = conn.uidl(Some(2)).await.unwrap();
        assert_eq!(one[0].id, 2);
    }

    #[tokio::test]
    async fn test_retrieve_raw_unstuffs() {
        let mut conn = authenticated(
            session()
                .write(b"RETR 1\r\n")
                .read(b"+OK 30 octets\r\nSubject: hi\r\n\r\n..dot\r\n.\r\n"),
        )
        .await;

        let raw = conn.retrieve_raw(1).await.unwrap();
        assert_eq!(raw, b"Subject: hi\r\n\r\n.dot\r\n");
    }

    #[tokio::test]
    async fn test_retrieve_tolerates_unknown_charset() {
        let mut conn = authenticated(
            session()
                .write(b"RETR 1\r\n")
                .read(b"+OK\r\nSubject: =?x-klingon?B?YWJj?=\r\n\r\nbody\r\n.\r\n"),
        )
        .await;

        let message = conn.retrieve(1).await.unwrap();
        assert_eq!(message.subject(), Some("=?x-klingon?B?YWJj?="));
    }

    #[tokio::test]
    async fn test_top_rejects_unknown_charset() {
        let mut conn = authenticated(
            session()
                .write(b"TOP 1 0\r\n")
                .read(b"+OK\r\nSubject: =?x-klingon?B?YWJj?=\r\n\r\n.\r\n")
                .write(b"TOP 2 0\r\n")
                .read(b"+OK\r\nSubject: fine\r\n\r\n.\r\n"),
        )
        .await;

        let err = conn.top(1, 0).await.unwrap_err();
        assert!(matches!(err, Error::Mime(ref e) if e.is_unknown_charset()));

        let message = conn.top(2, 0).await.unwrap();
        assert_eq!(message.subject(), Some("fine"));
    }

    #[tokio::test]
    async fn test_top_headers_of_multipart() {
        let mut conn = authenticated(
            session()
                .write(b"TOP 1 0\r\n")
                .read(b"+OK\r\nSubject: report\r\nContent-Type: multipart/alternative; boundary=\"b1\"\r\n\r\n.\r\n")
                .write(b"TOP 1 1\r\n")
                .read(b"+OK\r\nContent-Type: multipart/alternative; boundary=\"b1\"\r\n\r\nThis is a multi-part message in MIME format.\r\n.\r\n"),
        )
        .await;

        let message = conn.top(1, 0).await.unwrap();
        assert_eq!(message.subject(), Some("report"));
        assert!(message.is_multipart().unwrap());
        assert!(message.parts.is_empty());

        let message = conn.top(1, 1).await.unwrap();
        assert!(message.parts.is_empty());
        assert_eq!(conn.state(), SessionState::Transaction);
    }

    #[tokio::test]
    async fn test_retrieve_propagates_structure_errors() {
        let mut conn = authenticated(
            session()
                .write(b"RETR 1\r\n")
                .read(b"+OK\r\nContent-Type: multipart/mixed\r\n\r\nbody\r\n.\r\n"),
        )
        .await;

        // A multipart without a boundary is still a structural fault
        assert!(matches!(
            conn.retrieve(1).await,
            Err(Error::Mime(mailledger_mime::Error::MissingBoundary))
        ));
    }

    #[tokio::test]
    async fn test_delete_stops_at_first_failure() {
        let mut conn = authenticated(
            session()
                .write(b"DELE 2\r\n")
                .read(b"+OK message 2 deleted\r\n")
                .write(b"DELE 5\r\n")
                .read(b"-ERR message 5 already deleted\r\n"),
        )
        .await;

        let err = conn.delete(&[2, 5, 9]).await.unwrap_err();
        match err {
            Error::Delete { id, source } => {
                assert_eq!(id, 5);
                assert!(matches!(*source, Error::Server(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reset() {
        let mut conn = authenticated(
            session()
                .write(b"DELE 1\r\n")
                .read(b"+OK\r\n")
                .write(b"RSET\r\n")
                .read(b"+OK maildrop has 2 messages\r\n"),
        )
        .await;

        conn.delete(&[1]).await.unwrap();
        conn.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_quit() {
        let conn = authenticated(session().write(b"QUIT\r\n").read(b"+OK bye\r\n")).await;
        conn.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_failure_reported() {
        let conn = authenticated(
            session()
                .write(b"QUIT\r\n")
                .read(b"-ERR some deleted messages not removed\r\n"),
        )
        .await;

        let err = conn.quit().await.unwrap_err();
        assert!(err.is_server());
    }

    #[tokio::test]
    async fn test_quit_before_auth() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"+OK\r\n")
            .build();
        let conn = Connection::from_stream(mock).await.unwrap();
        conn.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_closes_session() {
        let mock = Builder::new()
            .read(b"+OK ready\r\n")
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "reset"))
            .build();
        let mut conn = Connection::from_stream(mock).await.unwrap();

        let err = conn.noop().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(conn.state(), SessionState::Closed);

        let err = conn.quit().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
