//! Bidirectional relay between a WebSocket and a byte stream.
//!
//! # Data Flow
//! ```text
//!                 ┌──────── frames_to_stream ────────┐
//! WebSocket rx ───┤                                   ├──▶ TCP write half
//!                 └───────────────────────────────────┘
//!                 ┌──────── stream_to_frames ────────┐
//! TCP read half ──┤                                   ├──▶ WebSocket tx
//!                 └───────────────────────────────────┘
//! ```
//!
//! Each direction is its own task. The first loop to stop cancels the shared
//! token, which the other loop observes alongside every read and write. Both
//! tasks are joined before either connection is closed, and close errors are
//! ignored since the peer may already be gone. There is no half-close: once
//! one direction ends, pending data in the other is dropped.

use std::fmt;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Tunables for one pump run.
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Largest chunk read from the byte stream per message.
    pub buffer_size: usize,
    /// Bound on flushing the close frame to the client.
    pub close_timeout: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            close_timeout: Duration::from_secs(5),
        }
    }
}

/// Relay direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// WebSocket client to TCP target.
    Inbound,
    /// TCP target to WebSocket client.
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The source side closed cleanly (EOF, close frame, end of stream).
    Closed,
    /// Reading the source failed.
    ReadFailed(String),
    /// Writing the destination failed.
    WriteFailed(String),
    /// The sibling loop or the server stopped this one.
    Cancelled,
    /// The task panicked or was aborted.
    Aborted(String),
}

/// Result of one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub direction: Direction,
    pub bytes: u64,
    pub messages: u64,
    pub exit: LoopExit,
}

impl LoopReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            bytes: 0,
            messages: 0,
            exit: LoopExit::Closed,
        }
    }
}

/// Result of both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpSummary {
    pub inbound: LoopReport,
    pub outbound: LoopReport,
}

impl PumpSummary {
    /// The direction that ended the session, if either stopped on its own.
    ///
    /// When both stopped on their own, a failed loop wins over a cleanly
    /// closed one; otherwise the target side is reported.
    pub fn ended_by(&self) -> Option<Direction> {
        match (&self.inbound.exit, &self.outbound.exit) {
            (LoopExit::Cancelled, LoopExit::Cancelled) => None,
            (LoopExit::Cancelled, _) => Some(Direction::Outbound),
            (_, LoopExit::Cancelled) => Some(Direction::Inbound),
            (inbound, LoopExit::Closed) if *inbound != LoopExit::Closed => Some(Direction::Inbound),
            _ => Some(Direction::Outbound),
        }
    }
}

/// Relay between the framed channel halves and `stream` until either side
/// ends or `cancel` fires, then close both.
pub async fn run<R, RE, W, T>(
    frames_in: R,
    frames_out: W,
    stream: T,
    cancel: CancellationToken,
    config: &PumpConfig,
) -> PumpSummary
where
    R: Stream<Item = Result<Message, RE>> + Unpin + Send + 'static,
    RE: fmt::Display + Send + 'static,
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: fmt::Display + Send,
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);

    let inbound = tokio::spawn(frames_to_stream(frames_in, writer, cancel.clone()));
    let outbound = tokio::spawn(stream_to_frames(
        reader,
        frames_out,
        config.buffer_size,
        cancel.clone(),
    ));

    let (inbound, outbound) = tokio::join!(inbound, outbound);

    let inbound = match inbound {
        Ok((_frames_in, mut writer, report)) => {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(error = %e, "Upstream already closed");
            }
            report
        }
        Err(e) => aborted(Direction::Inbound, e),
    };

    let outbound = match outbound {
        Ok((_reader, mut frames_out, report)) => {
            match tokio::time::timeout(config.close_timeout, frames_out.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "WebSocket already closed"),
                Err(_) => tracing::debug!("Timed out closing WebSocket"),
            }
            report
        }
        Err(e) => aborted(Direction::Outbound, e),
    };

    PumpSummary { inbound, outbound }
}

fn aborted(direction: Direction, err: tokio::task::JoinError) -> LoopReport {
    tracing::error!(direction = %direction, error = %err, "Relay task failed");
    LoopReport {
        exit: LoopExit::Aborted(err.to_string()),
        ..LoopReport::new(direction)
    }
}

/// Loop A: WebSocket messages to the byte stream.
async fn frames_to_stream<R, RE, Wr>(
    mut frames: R,
    mut writer: Wr,
    cancel: CancellationToken,
) -> (R, Wr, LoopReport)
where
    R: Stream<Item = Result<Message, RE>> + Unpin,
    RE: fmt::Display,
    Wr: AsyncWrite + Unpin,
{
    let _stop_sibling = cancel.clone().drop_guard();
    let mut report = LoopReport::new(Direction::Inbound);

    report.exit = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            next = frames.next() => next,
        };

        let message = match next {
            None => break LoopExit::Closed,
            Some(Err(e)) => break LoopExit::ReadFailed(e.to_string()),
            Some(Ok(message)) => message,
        };

        let payload: &[u8] = match &message {
            Message::Binary(data) => &data[..],
            Message::Text(text) => text.as_str().as_bytes(),
            Message::Close(_) => break LoopExit::Closed,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            written = writer.write_all(payload) => {
                if let Err(e) = written {
                    break LoopExit::WriteFailed(e.to_string());
                }
            }
        }

        report.bytes += payload.len() as u64;
        report.messages += 1;
    };

    log_exit(&report);
    (frames, writer, report)
}

/// Loop B: byte stream chunks to binary WebSocket messages.
async fn stream_to_frames<Rd, W>(
    mut reader: Rd,
    mut frames: W,
    buffer_size: usize,
    cancel: CancellationToken,
) -> (Rd, W, LoopReport)
where
    Rd: AsyncRead + Unpin,
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    let _stop_sibling = cancel.clone().drop_guard();
    let mut report = LoopReport::new(Direction::Outbound);
    let mut buf = vec![0u8; buffer_size];

    report.exit = loop {
        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            read = reader.read(&mut buf) => match read {
                Ok(0) => break LoopExit::Closed,
                Ok(n) => n,
                Err(e) => break LoopExit::ReadFailed(e.to_string()),
            },
        };

        let message = Message::Binary(Bytes::copy_from_slice(&buf[..n]));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            sent = frames.send(message) => {
                if let Err(e) = sent {
                    break LoopExit::WriteFailed(e.to_string());
                }
            }
        }

        report.bytes += n as u64;
        report.messages += 1;
    };

    log_exit(&report);
    (reader, frames, report)
}

fn log_exit(report: &LoopReport) {
    tracing::debug!(
        direction = %report.direction,
        bytes = report.bytes,
        messages = report.messages,
        exit = ?report.exit,
        "Relay loop finished"
    );
}
