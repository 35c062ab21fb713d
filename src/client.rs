//! Client struct definition
//!
//! Represents a connected client inside the registry actor: its id, its
//! registered name (once the handshake completes), and the bounded
//! outbound queue drained by the session's write task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::ClientId;

/// Outbound queue depth per session
pub const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Connected client information
///
/// `name` is None from connect until the handshake registers one.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Registered display name (None before the handshake completes)
    pub name: Option<String>,
    /// Server → client line queue
    sender: mpsc::Sender<String>,
}

impl Client {
    /// Create a new client with the given ID and outbound queue
    pub fn new(id: ClientId, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            name: None,
            sender,
        }
    }

    /// Enqueue a line for this client's write task.
    ///
    /// Non-blocking: a full queue (stalled peer) or a closed queue
    /// (disconnected peer) is reported, never waited on, so one slow
    /// peer cannot hold up delivery to everyone else.
    pub fn send(&self, line: String) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Check if this client has completed the handshake
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Record the registered name
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
