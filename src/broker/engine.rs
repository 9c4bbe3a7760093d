//! Broker engine
//!
//! The broker owns the subscription registry and the table of connected
//! clients, and fans published bodies out to subscribers.
//!
//! Concurrency and usage notes:
//! - The API is synchronous and meant to be held behind one lock
//!   (`SharedBroker`). Both registry indices and the client table live under
//!   that single lock, so subscribe, unsubscribe and broadcast are serialized.
//! - Writes to clients only enqueue onto per-connection channels, so holding
//!   the lock during a broadcast never waits on network I/O.

use std::collections::HashMap;

use tracing::debug;

use crate::broker::message::Message;
use crate::broker::registry::SubscriptionRegistry;
use crate::client::{Client, ConnectionId};
use crate::config::BrokerSettings;
use crate::utils::{RelayError, Result};

#[derive(Debug)]
pub struct Broker {
    pub registry: SubscriptionRegistry,
    pub clients: HashMap<ConnectionId, Client>,
    max_connections: usize,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// A broker without a connection limit.
    pub fn new() -> Self {
        Self::with_max_connections(usize::MAX)
    }

    pub fn with_max_connections(max_connections: usize) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            clients: HashMap::new(),
            max_connections,
        }
    }

    pub fn from_settings(settings: &BrokerSettings) -> Self {
        Self::with_max_connections(settings.max_connections)
    }

    /// Registers a newly connected client, refusing it once the connection
    /// limit is reached.
    pub fn register_client(&mut self, client: Client) -> Result<()> {
        if self.clients.len() >= self.max_connections {
            return Err(RelayError::TooManyConnections(self.max_connections));
        }
        self.clients.insert(client.id, client);
        Ok(())
    }

    pub fn remove_client(&mut self, client_id: ConnectionId) -> Option<Client> {
        self.clients.remove(&client_id)
    }

    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    pub fn subscribe(&mut self, client_id: ConnectionId, sub_id: &str, destination: &str) {
        self.registry.add_subscription(client_id, sub_id, destination);
        debug!(connection_id = client_id, subscription = sub_id, destination, "subscribed");
    }

    pub fn unsubscribe(&mut self, client_id: ConnectionId, sub_id: &str) {
        match self.registry.remove_subscription(client_id, sub_id) {
            Some(destination) => {
                debug!(connection_id = client_id, subscription = sub_id, %destination, "unsubscribed");
            }
            None => {
                debug!(connection_id = client_id, subscription = sub_id, "unsubscribe for unknown subscription");
            }
        }
    }

    /// Drops every subscription of `client_id` but keeps the client itself.
    pub fn remove_all_for_connection(&mut self, client_id: ConnectionId) -> usize {
        self.registry.remove_all_for_connection(client_id)
    }

    /// Removes the client and all of its subscriptions. Safe to repeat.
    pub fn cleanup_client(&mut self, client_id: ConnectionId) -> usize {
        let removed = self.remove_all_for_connection(client_id);
        self.remove_client(client_id);
        debug!(connection_id = client_id, subscriptions = removed, "cleaned up client");
        removed
    }

    /// Sends `body` to every subscription on `destination` and returns the
    /// number of frames queued.
    ///
    /// Each `(connection, subscription)` pair gets its own `MESSAGE` frame with
    /// a fresh message id. Connections whose transport has closed are skipped;
    /// their entries are pruned when their close handler runs.
    pub fn broadcast(&self, destination: &str, body: &str) -> usize {
        let subscribers = self.registry.subscribers_of(destination);
        if subscribers.is_empty() {
            debug!(destination, "no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for (client_id, sub_ids) in subscribers {
            let Some(client) = self.clients.get(&client_id) else {
                debug!(connection_id = client_id, "no client registered for subscription");
                continue;
            };
            if !client.is_open() {
                debug!(connection_id = client_id, destination, "skipping closed connection");
                continue;
            }

            for sub_id in sub_ids {
                let message = Message::new(sub_id, destination, body);
                if let Err(e) = client.transport.send(message.encode()) {
                    debug!(connection_id = client_id, error = %e, "delivery failed");
                    break;
                }
                delivered += 1;
            }
        }

        debug!(destination, delivered, "broadcast");
        delivered
    }
}
