//! Integration tests for the POP3 client.
//!
//! These tests use a mock stream to simulate POP3 server responses
//! without requiring a real server connection.

use std::io::{self, Cursor, Write};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailledger_pop3::{
    Command, Connection, Error, MailDecoder, MailboxStat, NeteaseProfile, Reply, SessionState,
};

/// Mock stream that returns predefined responses.
///
/// Sent bytes and the shutdown flag are shared so they can be inspected
/// after the connection has been consumed by `quit`.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
    /// Set once the client shuts the stream down.
    shut_down: Arc<AtomicBool>,
}

#[derive(Clone)]
struct Transcript {
    sent: Arc<Mutex<Vec<u8>>>,
    shut_down: Arc<AtomicBool>,
}

impl Transcript {
    fn sent(&self) -> String {
        String::from_utf8(self.sent.lock().unwrap().clone()).unwrap()
    }

    fn commands(&self) -> Vec<String> {
        self.sent().lines().map(str::to_string).collect()
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Transcript) {
        let transcript = Transcript {
            sent: Arc::new(Mutex::new(Vec::new())),
            shut_down: Arc::new(AtomicBool::new(false)),
        };
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&transcript.sent),
            shut_down: Arc::clone(&transcript.shut_down),
        };
        (stream, transcript)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = self.responses.position() as usize;

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shut_down.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

/// Captures formatted log output.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

const LOGIN: &[u8] = b"+OK POP3 ready\r\n+OK\r\n+OK 3 messages\r\n+OK\r\n";

fn script(after_login: &[u8]) -> Vec<u8> {
    [LOGIN, after_login].concat()
}

async fn login(responses: &[u8]) -> (Connection<MockStream>, Transcript) {
    let (stream, transcript) = MockStream::new(responses);
    let mut conn = Connection::from_stream(stream).await.unwrap();
    conn.auth("alice@163.com", "hunter2").await.unwrap();
    (conn, transcript)
}

#[tokio::test]
async fn test_full_session() {
    let responses = script(
        b"+OK 3 1024\r\n\
+OK 3 messages (1024 octets)\r\n1 100\r\n2 200\r\n3 724\r\n.\r\n\
+OK 100 octets\r\n\
Received: from bob$163.com ( [10.0.0.1] ) by ajax-webmail (Coremail) ; Mon, 2 Jan 2023 15:04:05 +0800 (CST)\r\n\
Subject: =?UTF-8?B?5L2g5aW9?=\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
..leading dot\r\n\
.\r\n\
+OK message 2 deleted\r\n\
-ERR message 5 does not exist\r\n\
+OK bye\r\n",
    );
    let (mut conn, transcript) = login(&responses).await;
    assert_eq!(conn.state(), SessionState::Transaction);

    let stat = conn.stat().await.unwrap();
    assert_eq!(stat, MailboxStat { count: 3, size: 1024 });

    let ids = conn.list(None).await.unwrap();
    let pairs: Vec<_> = ids.iter().map(|m| (m.id, m.size)).collect();
    assert_eq!(pairs, vec![(1, 100), (2, 200), (3, 724)]);

    let message = conn.retrieve(1).await.unwrap();
    let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
    assert_eq!(info.from, "bob@163.com");
    assert_eq!(info.time, 1_672_643_045);
    assert_eq!(info.title, "你好");
    assert_eq!(info.content, ".leading dot\r\n");

    let err = conn.delete(&[2, 5, 9]).await.unwrap_err();
    match err {
        Error::Delete { id, ref source } => {
            assert_eq!(id, 5);
            assert!(source.is_server());
        }
        other => panic!("Expected delete error, got {other}"),
    }
    // A rejected DELE leaves the session usable
    assert_eq!(conn.state(), SessionState::Transaction);

    conn.quit().await.unwrap();
    assert!(transcript.is_shut_down());

    assert_eq!(
        transcript.commands(),
        vec![
            "USER alice@163.com",
            "PASS hunter2",
            "NOOP",
            "STAT",
            "LIST",
            "RETR 1",
            "DELE 2",
            "DELE 5",
            "QUIT",
        ]
    );
}

#[tokio::test]
async fn test_quit_error_still_closes() {
    let responses = script(b"-ERR some deleted messages not removed\r\n");
    let (conn, transcript) = login(&responses).await;

    let err = conn.quit().await.unwrap_err();
    assert!(matches!(err, Error::Server(ref m) if m == "some deleted messages not removed"));
    assert!(transcript.is_shut_down());
}

#[tokio::test]
async fn test_mailbox_operations_before_auth() {
    let (stream, transcript) = MockStream::new(b"+OK POP3 ready\r\n");
    let mut conn = Connection::from_stream(stream).await.unwrap();

    assert!(!conn.is_authenticated());
    assert!(matches!(conn.stat().await, Err(Error::InvalidState(_))));
    assert!(matches!(conn.retrieve(1).await, Err(Error::InvalidState(_))));
    assert!(matches!(conn.delete(&[1]).await, Err(Error::InvalidState(_))));

    // Nothing reached the wire
    assert!(transcript.sent().is_empty());
}

#[tokio::test]
async fn test_empty_maildrop() {
    let responses = script(b"+OK 0\r\n+OK\r\n.\r\n");
    let (mut conn, _transcript) = login(&responses).await;

    assert_eq!(conn.stat().await.unwrap(), MailboxStat::default());
    assert!(conn.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_round_trip() {
    let (mut conn, transcript) = login(&script(b"+OK 7 512\r\n")).await;

    let cmd = Command::list(Some(7));
    assert_eq!(cmd.render(), "LIST 7");

    let reply = conn.execute(&cmd).await.unwrap();
    assert_eq!(reply, Reply::Line("7 512".to_string()));
    assert!(transcript.sent().ends_with("NOOP\r\nLIST 7\r\n"));
}

#[tokio::test]
async fn test_execute_checks_state() {
    let (stream, transcript) = MockStream::new(b"+OK POP3 ready\r\n");
    let mut conn = Connection::from_stream(stream).await.unwrap();

    assert!(matches!(conn.execute(&Command::stat()).await, Err(Error::InvalidState(_))));
    assert!(matches!(conn.execute(&Command::quit()).await, Err(Error::InvalidState(_))));
    assert_eq!(conn.state(), SessionState::Connected);
    assert!(transcript.sent().is_empty());
}

#[tokio::test]
async fn test_top_multipart_headers_only() {
    let responses = script(
        b"+OK\r\n\
Received: from bob$163.com ( [10.0.0.1] ) by ajax-webmail (Coremail) ; Mon, 2 Jan 2023 15:04:05 +0800 (CST)\r\n\
Subject: =?UTF-8?B?5L2g5aW9?=\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
.\r\n",
    );
    let (mut conn, _transcript) = login(&responses).await;

    let message = conn.top(1, 0).await.unwrap();
    let info = MailDecoder::new(NeteaseProfile).decode(&message).unwrap();
    assert_eq!(info.from, "bob@163.com");
    assert_eq!(info.title, "你好");
    assert!(info.content.is_empty());
    assert!(info.html_content.is_empty());
}

#[tokio::test]
async fn test_connection_drop_mid_body() {
    let responses = script(b"+OK\r\nSubject: cut\r\n\r\npartial");
    let (mut conn, _transcript) = login(&responses).await;

    let err = conn.retrieve_raw(1).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(conn.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_password_never_logged() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (conn, transcript) = login(&script(b"+OK bye\r\n")).await;
    conn.quit().await.unwrap();

    assert!(transcript.sent().contains("PASS hunter2\r\n"));
    let output = logs.contents();
    assert!(output.contains("PASS ****"));
    assert!(output.contains("USER alice@163.com"));
    assert!(!output.contains("hunter2"));
}
