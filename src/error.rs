//! Error types for the chat server
//!
//! Defines application-level errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::codec::LineCodecError;

/// Application-level errors
///
/// Covers both fatal errors (connection termination, startup failure)
/// and internal channel failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the affected session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (oversized or malformed line)
    #[error("codec error: {0}")]
    Codec(#[from] LineCodecError),

    /// Configuration load or validation failure (fatal at startup)
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Channel send error (fatal - internal channel broken)
    #[error("channel send error")]
    ChannelSend,
}

/// Outbound send errors
///
/// Occurs when enqueueing a line for a session's write task fails.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the queue has been closed
    #[error("outbound queue closed")]
    Closed,

    /// The session's outbound queue is full (stalled peer)
    #[error("outbound queue full")]
    Full,
}
