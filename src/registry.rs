//! Registry actor implementation
//!
//! The central actor owning the name→session table. All registration,
//! lookup and delivery goes through one task consuming commands from an
//! mpsc channel, so check-and-register is atomic and no locks are
//! needed. Deterministic mutation ordering falls out of the same
//! property; broadcast recipient order stays unspecified.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::SendError;
use crate::protocol;
use crate::types::ClientId;

/// Commands sent from session handlers to the registry actor
#[derive(Debug)]
pub enum RegistryCommand {
    /// New connection admitted (no name yet)
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<String>,
    },
    /// Handshake attempt: atomically register a display name.
    /// Replies `true` on success; on failure a rejection line is queued
    /// to the requester and the handshake repeats.
    Join {
        client_id: ClientId,
        name: String,
        reply: oneshot::Sender<bool>,
    },
    /// Plain-text broadcast to every other registered session
    Chat {
        client_id: ClientId,
        message: String,
    },
    /// Targeted delivery to the named recipients
    Private {
        client_id: ClientId,
        recipients: Vec<String>,
        message: String,
    },
    /// Broadcast excluding the listed names and the sender
    Except {
        client_id: ClientId,
        excluded: Vec<String>,
        message: String,
    },
    /// Roster request
    List { client_id: ClientId },
    /// Connection closed; unregister and clean up (idempotent)
    Disconnect { client_id: ClientId },
}

/// The registry actor
///
/// Holds every connected session and the unique-name table. Processes
/// commands strictly in arrival order; two concurrent registrations of
/// the same name therefore cannot both succeed.
pub struct Registry {
    /// All connected sessions: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// Registered display names: name -> ClientId
    names: HashMap<String, ClientId>,
    /// Command receiver channel
    receiver: mpsc::Receiver<RegistryCommand>,
    /// Flipped when the last registered client leaves
    shutdown: watch::Sender<bool>,
    /// Whether an empty registry stops the accept loop
    idle_shutdown: bool,
}

impl Registry {
    /// Create a new registry actor
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        shutdown: watch::Sender<bool>,
        idle_shutdown: bool,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            names: HashMap::new(),
            receiver,
            shutdown,
            idle_shutdown,
        }
    }

    /// Run the registry event loop
    ///
    /// Continuously receives and processes commands until all senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("Registry started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Registry shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            RegistryCommand::Join {
                client_id,
                name,
                reply,
            } => {
                self.handle_join(client_id, name, reply);
            }
            RegistryCommand::Chat { client_id, message } => {
                self.handle_chat(client_id, message);
            }
            RegistryCommand::Private {
                client_id,
                recipients,
                message,
            } => {
                self.handle_private(client_id, recipients, message);
            }
            RegistryCommand::Except {
                client_id,
                excluded,
                message,
            } => {
                self.handle_except(client_id, excluded, message);
            }
            RegistryCommand::List { client_id } => {
                self.handle_list(client_id);
            }
            RegistryCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
        }
    }

    /// Handle new connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<String>) {
        info!("Client {} connected", client_id);
        self.clients.insert(client_id, Client::new(client_id, sender));
        debug!(
            "Total connections: {}, registered: {}",
            self.clients.len(),
            self.names.len()
        );
    }

    /// Handle a handshake attempt: atomic check-and-register
    fn handle_join(&mut self, client_id: ClientId, name: String, reply: oneshot::Sender<bool>) {
        let Some(client) = self.clients.get_mut(&client_id) else {
            let _ = reply.send(false);
            return;
        };

        // A session registers at most once.
        if client.has_name() {
            let _ = reply.send(false);
            return;
        }

        let name = name.trim().to_string();
        if name.is_empty() || self.names.contains_key(&name) {
            self.send_to(client_id, protocol::NAME_REJECTED.to_string());
            let _ = reply.send(false);
            return;
        }

        client.set_name(name.clone());
        self.names.insert(name.clone(), client_id);
        info!("Client {} registered as '{}'", client_id, name);

        self.send_to(client_id, protocol::ACCEPTED.to_string());
        let _ = reply.send(true);

        let notice = protocol::join_notice(&name);
        self.broadcast_except(&[name.as_str()], &notice);

        let roster = protocol::roster(&self.snapshot_names());
        self.send_to(client_id, roster);
    }

    /// Handle plain-text broadcast
    fn handle_chat(&mut self, client_id: ClientId, message: String) {
        let Some(sender_name) = self.name_of(client_id) else {
            return;
        };

        let line = protocol::chat(&sender_name, &message);
        self.broadcast_except(&[sender_name.as_str()], &line);
    }

    /// Handle /msg delivery
    fn handle_private(&mut self, client_id: ClientId, recipients: Vec<String>, message: String) {
        let Some(sender_name) = self.name_of(client_id) else {
            return;
        };

        let line = protocol::private(&sender_name, &message);
        for recipient in &recipients {
            match self.names.get(recipient) {
                Some(&target_id) => self.send_to(target_id, line.clone()),
                None => self.send_to(client_id, protocol::user_not_found(recipient)),
            }
        }
    }

    /// Handle /except exclusion broadcast
    fn handle_except(&mut self, client_id: ClientId, excluded: Vec<String>, message: String) {
        let Some(sender_name) = self.name_of(client_id) else {
            return;
        };

        let line = protocol::except(&sender_name, &excluded, &message);
        let mut skip: Vec<&str> = excluded.iter().map(String::as_str).collect();
        skip.push(sender_name.as_str());
        self.broadcast_except(&skip, &line);
    }

    /// Handle /list roster request
    fn handle_list(&mut self, client_id: ClientId) {
        if self.name_of(client_id).is_none() {
            return;
        }
        let roster = protocol::roster(&self.snapshot_names());
        self.send_to(client_id, roster);
    }

    /// Handle disconnect: unregister and notify.
    ///
    /// Idempotent: a second disconnect for the same id is a no-op, so
    /// teardown never produces a duplicate leave notice. The leave
    /// notice only goes out when the unregister actually removed a
    /// registered name.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        let Some(client) = self.clients.remove(&client_id) else {
            return;
        };
        info!("Client {} disconnected", client_id);

        if let Some(name) = client.name {
            self.names.remove(&name);

            let notice = protocol::leave_notice(&name);
            self.broadcast_except(&[], &notice);

            if self.names.is_empty() && self.idle_shutdown {
                info!("Last client left; signalling the accept loop to stop");
                let _ = self.shutdown.send(true);
            }
        }

        debug!(
            "Total connections: {}, registered: {}",
            self.clients.len(),
            self.names.len()
        );
    }

    /// Point-in-time list of registered names, sorted for stable replies
    fn snapshot_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered name of a session, if the handshake completed
    fn name_of(&self, client_id: ClientId) -> Option<String> {
        self.clients.get(&client_id).and_then(|c| c.name.clone())
    }

    /// Deliver a line to every registered session not in `excluded`
    fn broadcast_except(&self, excluded: &[&str], line: &str) {
        let skip: HashSet<&str> = excluded.iter().copied().collect();
        for client in self.clients.values() {
            if let Some(name) = &client.name {
                if !skip.contains(name.as_str()) {
                    Self::deliver(client, line.to_string());
                }
            }
        }
    }

    /// Queue a line for one session
    fn send_to(&self, client_id: ClientId, line: String) {
        if let Some(client) = self.clients.get(&client_id) {
            Self::deliver(client, line);
        }
    }

    fn deliver(client: &Client, line: String) {
        match client.send(line) {
            Ok(()) => {}
            Err(SendError::Full) => {
                warn!("Dropping line for stalled client {}", client.id);
            }
            Err(SendError::Closed) => {
                debug!("Client {} queue closed; line dropped", client.id);
            }
        }
    }
}
