//! Session connection handler
//!
//! Handles one client connection: line framing, the name-negotiation
//! handshake against the registry, and the bidirectional message loop.
//! The write task drains the session's outbound queue, so every
//! server→client line takes a single ordered path.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::client::OUTBOUND_QUEUE_SIZE;
use crate::codec::LineCodec;
use crate::command::{self, Command};
use crate::error::AppError;
use crate::filter::BannedPhraseFilter;
use crate::protocol;
use crate::registry::RegistryCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Registers the connection with the registry, runs the handshake until
/// a name is accepted, then relays lines between the socket and the
/// registry until the peer disconnects, an I/O error occurs, or the
/// session is closed by `/exit`.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<RegistryCommand>,
    filter: Arc<BannedPhraseFilter>,
    max_line_length: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let client_id = ClientId::new();
    debug!("Client {} connecting from {}", client_id, peer_addr);

    let framed = Framed::new(stream, LineCodec::new(max_line_length));
    let (mut sink, mut lines) = framed.split();

    // Create the session's outbound queue; the handler keeps a clone
    // for replies that never touch the registry.
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_SIZE);

    if cmd_tx
        .send(RegistryCommand::Connect {
            client_id,
            sender: msg_tx.clone(),
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - registry closed", client_id);
        return Err(AppError::ChannelSend);
    }

    // Write task: outbound queue -> socket
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = msg_rx.recv().await {
            if sink.send(line).await.is_err() {
                debug!("Socket send failed, ending write task");
                break;
            }
        }
        let _ = sink.close().await;
        debug!("Write task ended");
    });

    // Handshake: read candidate names until the registry accepts one.
    // Rejection lines and ACCEPTED flow through the outbound queue.
    let name = loop {
        let line = match lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("Client {} handshake read error: {}", client_id, e);
                let _ = cmd_tx.send(RegistryCommand::Disconnect { client_id }).await;
                return Err(e.into());
            }
            None => {
                debug!("Client {} disconnected during handshake", client_id);
                let _ = cmd_tx.send(RegistryCommand::Disconnect { client_id }).await;
                return Ok(());
            }
        };

        let candidate = line.trim().to_string();
        let (reply_tx, reply_rx) = oneshot::channel();
        if cmd_tx
            .send(RegistryCommand::Join {
                client_id,
                name: candidate.clone(),
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return Err(AppError::ChannelSend);
        }

        match reply_rx.await {
            Ok(true) => break candidate,
            Ok(false) => continue,
            Err(_) => return Err(AppError::ChannelSend),
        }
    };

    info!("Client {} active as '{}' from {}", client_id, name, peer_addr);

    // Read task: socket -> filter / local replies / registry commands
    let cmd_tx_read = cmd_tx.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(result) = lines.next().await {
            let line = match result {
                Ok(line) => line,
                Err(e) => {
                    warn!("Client {} read error: {}", client_id, e);
                    break;
                }
            };

            if filter.is_banned(&line) {
                if msg_tx.send(protocol::BANNED_MESSAGE.to_string()).await.is_err() {
                    break;
                }
                continue;
            }

            if line.starts_with('/') {
                let reply = match command::parse(&line) {
                    Command::Exit => break,
                    Command::Banned => Some(protocol::banned_list(filter.phrases())),
                    Command::Help => Some(protocol::HELP.to_string()),
                    Command::Malformed { usage } => Some(usage.to_string()),
                    Command::Unknown => Some(protocol::UNKNOWN_COMMAND.to_string()),
                    Command::List => {
                        if send_registry(&cmd_tx_read, RegistryCommand::List { client_id }).await {
                            continue;
                        }
                        break;
                    }
                    Command::Msg {
                        recipients,
                        message,
                    } => {
                        let cmd = RegistryCommand::Private {
                            client_id,
                            recipients,
                            message,
                        };
                        if send_registry(&cmd_tx_read, cmd).await {
                            continue;
                        }
                        break;
                    }
                    Command::Except { excluded, message } => {
                        let cmd = RegistryCommand::Except {
                            client_id,
                            excluded,
                            message,
                        };
                        if send_registry(&cmd_tx_read, cmd).await {
                            continue;
                        }
                        break;
                    }
                };

                if let Some(reply) = reply {
                    if msg_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                continue;
            }

            let cmd = RegistryCommand::Chat {
                client_id,
                message: line,
            };
            if !send_registry(&cmd_tx_read, cmd).await {
                break;
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Wait for either task to complete, then stop the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    let _ = cmd_tx.send(RegistryCommand::Disconnect { client_id }).await;

    info!("Client {} ('{}') closed", client_id, name);

    Ok(())
}

/// Forward a command to the registry; false means the registry is gone.
async fn send_registry(cmd_tx: &mpsc::Sender<RegistryCommand>, cmd: RegistryCommand) -> bool {
    if cmd_tx.send(cmd).await.is_err() {
        debug!("Registry closed, ending read task");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::watch;
    use tokio::time::timeout;

    const RECV_TIMEOUT: Duration = Duration::from_secs(2);

    /// Spawn a full server (registry + accept loop) on an ephemeral port.
    async fn start_server(banned: &[&str]) -> (SocketAddr, watch::Receiver<bool>) {
        let filter = Arc::new(BannedPhraseFilter::new(banned.to_vec()));
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(Registry::new(cmd_rx, shutdown_tx, true).run());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let cmd_tx = cmd_tx.clone();
                let filter = filter.clone();
                tokio::spawn(handle_connection(stream, cmd_tx, filter, 8192));
            }
        });

        (addr, shutdown_rx)
    }

    struct TestClient {
        reader: BufReader<OwnedReadHalf>,
        writer: tokio::net::tcp::OwnedWriteHalf,
    }

    impl TestClient {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (read_half, writer) = stream.into_split();
            Self {
                reader: BufReader::new(read_half),
                writer,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{line}\n").as_bytes())
                .await
                .unwrap();
        }

        async fn recv(&mut self) -> String {
            let mut line = String::new();
            let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
                .await
                .expect("timed out waiting for line")
                .expect("read failed");
            assert!(n > 0, "connection closed");
            line.trim_end_matches(['\r', '\n']).to_string()
        }

        async fn expect(&mut self, wanted: &str) {
            assert_eq!(self.recv().await, wanted);
        }

        /// Join with the given name, draining ACCEPTED and the roster.
        async fn join(addr: SocketAddr, name: &str) -> Self {
            let mut client = Self::connect(addr).await;
            client.send(name).await;
            client.expect(protocol::ACCEPTED).await;
            let roster = client.recv().await;
            assert!(roster.starts_with("Connected clients: "));
            client
        }

        /// Assert the connection was closed by the server.
        async fn expect_eof(&mut self) {
            let mut line = String::new();
            let n = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
                .await
                .expect("timed out waiting for EOF")
                .expect("read failed");
            assert_eq!(n, 0, "expected EOF, got {line:?}");
        }
    }

    #[tokio::test]
    async fn test_handshake_accepts_and_sends_roster() {
        let (addr, _sd) = start_server(&[]).await;

        let mut alice = TestClient::connect(addr).await;
        alice.send("alice").await;
        alice.expect("ACCEPTED").await;
        alice.expect("Connected clients: alice").await;
    }

    #[tokio::test]
    async fn test_handshake_rejects_taken_name_then_retries() {
        let (addr, _sd) = start_server(&[]).await;

        let _alice = TestClient::join(addr, "alice").await;

        let mut other = TestClient::connect(addr).await;
        other.send("alice").await;
        other.expect(protocol::NAME_REJECTED).await;
        other.send("").await;
        other.expect(protocol::NAME_REJECTED).await;
        other.send("bob").await;
        other.expect("ACCEPTED").await;
        other.expect("Connected clients: alice, bob").await;
    }

    #[tokio::test]
    async fn test_broadcast_reaches_others_not_sender() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        let mut b = TestClient::join(addr, "b").await;
        let mut c = TestClient::join(addr, "c").await;
        a.expect("b has joined the chat").await;
        a.expect("c has joined the chat").await;
        b.expect("c has joined the chat").await;

        a.send("hello").await;
        b.expect("a: hello").await;
        c.expect("a: hello").await;

        // Probe: the next line a sees is b's reply, not a's own echo.
        b.send("hi a").await;
        a.expect("b: hi a").await;
    }

    #[tokio::test]
    async fn test_banned_message_suppressed_case_insensitive() {
        let (addr, _sd) = start_server(&["forbidden"]).await;

        let mut a = TestClient::join(addr, "a").await;
        let mut b = TestClient::join(addr, "b").await;
        a.expect("b has joined the chat").await;

        a.send("this is FORBIDDEN knowledge").await;
        a.expect(protocol::BANNED_MESSAGE).await;

        // b never sees the suppressed line; the probe arrives first.
        a.send("clean message").await;
        b.expect("a: clean message").await;
    }

    #[tokio::test]
    async fn test_msg_and_not_found() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        let mut b = TestClient::join(addr, "b").await;
        let mut c = TestClient::join(addr, "c").await;
        a.expect("b has joined the chat").await;
        a.expect("c has joined the chat").await;
        b.expect("c has joined the chat").await;

        a.send("/msg b,ghost secret").await;
        b.expect("a (private): secret").await;
        a.expect("User ghost not found.").await;

        // c only sees the probe.
        a.send("public").await;
        c.expect("a: public").await;
    }

    #[tokio::test]
    async fn test_except_broadcast() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        let mut b = TestClient::join(addr, "b").await;
        let mut c = TestClient::join(addr, "c").await;
        a.expect("b has joined the chat").await;
        a.expect("c has joined the chat").await;
        b.expect("c has joined the chat").await;

        b.send("/except c bye").await;
        a.expect("b (to everyone, except [c]): bye").await;

        // c never saw it; the probe is c's next line.
        a.send("probe").await;
        c.expect("a: probe").await;
    }

    #[tokio::test]
    async fn test_local_command_replies() {
        let (addr, _sd) = start_server(&["zzz", "aaa"]).await;

        let mut a = TestClient::join(addr, "a").await;

        a.send("/banned").await;
        a.expect("Banned phrases: aaa, zzz").await;

        a.send("/msg").await;
        a.expect(protocol::MSG_USAGE).await;

        a.send("/except onlynames").await;
        a.expect(protocol::EXCEPT_USAGE).await;

        a.send("/bogus").await;
        a.expect(protocol::UNKNOWN_COMMAND).await;

        a.send("/list").await;
        a.expect("Connected clients: a").await;

        a.send("/help").await;
        a.expect("Available commands:").await;
        a.expect("/list - Show list of connected clients.").await;
    }

    #[tokio::test]
    async fn test_exit_closes_session_with_leave_notice() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        let mut b = TestClient::join(addr, "b").await;
        a.expect("b has joined the chat").await;

        b.send("/exit").await;
        b.expect_eof().await;
        a.expect("b has left the chat").await;
    }

    #[tokio::test]
    async fn test_peer_disconnect_sends_leave_notice() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        let b = TestClient::join(addr, "b").await;
        a.expect("b has joined the chat").await;

        drop(b);
        a.expect("b has left the chat").await;
    }

    #[tokio::test]
    async fn test_disconnect_during_handshake_is_silent() {
        let (addr, _sd) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;

        let ghost = TestClient::connect(addr).await;
        drop(ghost);

        // a sees no join or leave notice for the half-open connection.
        a.send("/list").await;
        a.expect("Connected clients: a").await;
    }

    #[tokio::test]
    async fn test_last_client_leaving_triggers_shutdown() {
        let (addr, mut shutdown_rx) = start_server(&[]).await;

        let mut a = TestClient::join(addr, "a").await;
        a.send("/exit").await;
        a.expect_eof().await;

        timeout(RECV_TIMEOUT, shutdown_rx.changed())
            .await
            .expect("shutdown signal not received")
            .unwrap();
        assert!(*shutdown_rx.borrow());
    }
}
