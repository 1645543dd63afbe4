//! Connection Handler
//!
//! One task per accepted connection, running a read-execute-respond loop:
//!
//! ```text
//! read line ──> tokenize ──> execute under the cache mutex ──> write reply
//!                  │                        │
//!            oversized line:          command fault,
//!            ERR line, close          blank line:
//!                                     ERR line, continue
//! ```
//!
//! Lines are read as raw bytes with the read itself capped at the line
//! length limit, so a client that streams bytes without ever sending a
//! newline is refused after one buffer's worth, and binary-safe values
//! pass through untouched.
//!
//! The handler owns the admission permit for its whole lifetime, so a
//! stalled reader keeps its pool slot until it disconnects - there is no
//! mid-command cancellation or timeout.
//!
//! Every command executes under one `Mutex<Cache>` shared by all
//! connections. The lock is never held across an await point; command
//! execution itself is synchronous and brief.

use crate::commands::Cache;
use crate::protocol::{ParseError, Reply, Request, MAX_LINE_LEN};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info, trace, warn};

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request line exceeded the length cap; connection-fatal
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    addr: SocketAddr,
    cache: Arc<Mutex<Cache>>,
    stats: Arc<ConnectionStats>,
    /// Reusable reply-line buffer.
    out: Vec<u8>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        cache: Arc<Mutex<Cache>>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();
        let (read_half, write_half) = stream.into_split();

        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            addr,
            cache,
            stats,
            out: Vec::with_capacity(256),
        }
    }

    /// Runs the connection to completion.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Parse(e)) => {
                warn!(client = %self.addr, error = %e, "Closing after parse fault")
            }
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        let mut line = Vec::new();
        // Allows a line of exactly MAX_LINE_LEN plus its "\r\n".
        let read_cap = (MAX_LINE_LEN + 2) as u64;

        loop {
            line.clear();
            let n = (&mut self.reader)
                .take(read_cap)
                .read_until(b'\n', &mut line)
                .await?;
            if n == 0 {
                // EOF: the client hung up.
                return Ok(());
            }
            self.stats.bytes_read(n);

            if !line.ends_with(b"\n") && line.len() as u64 >= read_cap {
                // The read cap was hit before a newline arrived.
                let e = ParseError::LineTooLong {
                    size: line.len(),
                    max: MAX_LINE_LEN,
                };
                self.write_error(&e.to_string()).await?;
                return Err(e.into());
            }

            let mut content: &[u8] = &line;
            if let Some(s) = content.strip_suffix(b"\n") {
                content = s;
            }
            if let Some(s) = content.strip_suffix(b"\r") {
                content = s;
            }

            let request = match Request::parse(content) {
                Ok(request) => request,
                Err(e) => {
                    self.write_error(&e.to_string()).await?;
                    if matches!(e, ParseError::EmptyLine) {
                        // A blank line is no worse than an unknown
                        // command: report it and keep serving.
                        continue;
                    }
                    return Err(e.into());
                }
            };
            trace!(client = %self.addr, command = %request.name, "Dispatching");

            // Lock scope must not contain an await.
            let result = self.cache.lock().unwrap().execute(&request);
            self.stats.command_processed();

            match result {
                Ok(reply) => self.write_reply(&reply).await?,
                Err(e) => {
                    debug!(client = %self.addr, error = %e, "Command fault");
                    self.write_error(&e.to_string()).await?;
                }
            }
        }
    }

    async fn write_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        self.out.clear();
        reply.encode_line(&mut self.out);
        self.flush_out().await
    }

    async fn write_error(&mut self, message: &str) -> Result<(), ConnectionError> {
        self.out.clear();
        self.out.extend_from_slice(b"ERR ");
        self.out.extend_from_slice(message.as_bytes());
        self.out.push(b'\n');
        self.flush_out().await
    }

    async fn flush_out(&mut self) -> Result<(), ConnectionError> {
        self.writer.write_all(&self.out).await?;
        self.writer.flush().await?;
        self.stats.bytes_written(self.out.len());
        Ok(())
    }
}

/// Handles a client connection to completion, holding its admission
/// permit for the connection's lifetime.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    cache: Arc<Mutex<Cache>>,
    stats: Arc<ConnectionStats>,
    permit: OwnedSemaphorePermit,
) {
    let handler = ConnectionHandler::new(stream, addr, cache, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::Io(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
    // Frees the pool slot for the next waiting connection.
    drop(permit);
}
