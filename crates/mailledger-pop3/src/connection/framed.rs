//! Line framing for the POP3 protocol.
//!
//! POP3 exchanges CRLF-terminated lines. Multi-line replies end with a line
//! holding a single `.`, and body lines that start with `.` are byte-stuffed.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::parser::{is_terminator, unstuff};
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Line-framed connection for the POP3 protocol.
///
/// Owns the read buffer and the write buffer of one connection.
pub struct LineStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new line stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(256),
        }
    }

    /// Writes `line` followed by CRLF and flushes immediately.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.put_slice(line.as_bytes());
        self.write_buffer.put_slice(b"\r\n");

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Reads one line and returns it without its terminator.
    ///
    /// CRLF is expected; a bare LF is accepted as well.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 1);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(line)
    }

    /// Reads a multi-line body up to the terminating `.` line.
    ///
    /// The terminator is consumed but not returned. Every other line is
    /// dot-unstuffed and appended with CRLF. On error, partial output is
    /// discarded.
    pub async fn read_multiline(&mut self) -> Result<Vec<u8>> {
        let mut body = Vec::new();

        loop {
            let line = self.read_line().await?;
            if is_terminator(&line) {
                break;
            }
            body.extend_from_slice(unstuff(&line));
            body.extend_from_slice(b"\r\n");
        }

        Ok(body)
    }

    /// Shuts down the write side of the transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
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
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_line_strips_crlf() {
        let mock = Builder::new().read(b"+OK POP3 ready\r\n").build();
        let mut framed = LineStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"+OK POP3 ready");
    }

    #[tokio::test]
    async fn test_read_line_accepts_bare_lf() {
        let mock = Builder::new().read(b"+OK\n").build();
        let mut framed = LineStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"+OK");
    }

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let mock = Builder::new().read(b"+OK 2 ").read(b"320\r\n").build();
        let mut framed = LineStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"+OK 2 320");
    }

    #[tokio::test]
    async fn test_read_line_eof() {
        let mock = Builder::new().read(b"+OK no terminator").build();
        let mut framed = LineStream::new(mock);

        let err = framed.read_line().await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_send_line_appends_crlf() {
        let mock = Builder::new().write(b"STAT\r\n").build();
        let mut framed = LineStream::new(mock);

        framed.send_line("STAT").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_multiline() {
        let mock = Builder::new()
            .read(b"1 100\r\n2 200\r\n3 300\r\n.\r\n")
            .build();
        let mut framed = LineStream::new(mock);

        let body = framed.read_multiline().await.unwrap();
        assert_eq!(body, b"1 100\r\n2 200\r\n3 300\r\n");
    }

    #[tokio::test]
    async fn test_read_multiline_dot_lines() {
        let mock = Builder::new()
            .read(b".signature\r\n..hidden\r\n\r\n.\r\n+OK next\r\n")
            .build();
        let mut framed = LineStream::new(mock);

        let body = framed.read_multiline().await.unwrap();
        assert_eq!(body, b".signature\r\n.hidden\r\n\r\n");
        // The terminator is consumed; the next line is untouched.
        assert_eq!(framed.read_line().await.unwrap(), b"+OK next");
    }

    #[tokio::test]
    async fn test_read_multiline_empty_body() {
        let mock = Builder::new().read(b".\r\n").build();
        let mut framed = LineStream::new(mock);

        assert!(framed.read_multiline().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_multiline_truncated() {
        let mock = Builder::new().read(b"line one\r\nline two\r\n").build();
        let mut framed = LineStream::new(mock);

        assert!(framed.read_multiline().await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = LineStream::new(mock);

        let result = framed.read_line().await;
        assert!(result.unwrap_err().to_string().contains("line too long"));
    }
}
