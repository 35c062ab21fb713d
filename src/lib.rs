//! Multi-user Line-Protocol Chat Server Library
//!
//! A TCP chat server speaking newline-terminated UTF-8 text, built on
//! tokio using the Actor pattern for state management. Clients register
//! a unique display name, then exchange broadcast, targeted and
//! exclusion messages mediated by a central registry.
//!
//! # Features
//! - Name-negotiation handshake with atomic uniqueness
//! - Broadcast, `/msg` (targeted) and `/except` (exclusion) delivery
//! - In-band commands: `/list`, `/banned`, `/help`, `/exit`
//! - Case-insensitive banned-phrase filtering
//! - Coordinated shutdown when the last client leaves
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Registry` is the central actor owning the name→session table
//! - Each connection has a handler task communicating with the registry
//! - No locks needed - all state access goes through message passing
//! - Each session drains a bounded outbound queue, so a stalled peer
//!   never blocks delivery to the others
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio::sync::{mpsc, watch};
//! use chat_hub::{handle_connection, BannedPhraseFilter, Registry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:7878").await.unwrap();
//!     let filter = Arc::new(BannedPhraseFilter::new(["spam"]));
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!     let (shutdown_tx, _shutdown_rx) = watch::channel(false);
//!
//!     tokio::spawn(Registry::new(cmd_rx, shutdown_tx, true).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         let filter = filter.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, filter, 8192));
//!     }
//! }
//! ```

pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use codec::{LineCodec, LineCodecError};
pub use command::Command;
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use filter::BannedPhraseFilter;
pub use handler::handle_connection;
pub use registry::{Registry, RegistryCommand};
pub use types::ClientId;
