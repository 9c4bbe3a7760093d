//! Subscription registry
//!
//! Two indices describe the same set of `(connection, subscription id,
//! destination)` triples:
//! - connection -> subscription id -> destination
//! - destination -> connection -> set of subscription ids
//!
//! Every mutation updates both. A destination key exists only while it has a
//! subscriber and a connection key only while it has a subscription.

use std::collections::{HashMap, HashSet};

use crate::client::ConnectionId;

/// Client-chosen subscription id, scoped to its connection.
pub type SubscriptionId = String;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_connection: HashMap<ConnectionId, HashMap<SubscriptionId, String>>,
    by_destination: HashMap<String, HashMap<ConnectionId, HashSet<SubscriptionId>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `(connection, sub_id)` to `destination`, replacing any previous
    /// destination for that pair.
    pub fn add_subscription(&mut self, connection: ConnectionId, sub_id: &str, destination: &str) {
        let previous = self
            .by_connection
            .entry(connection)
            .or_default()
            .insert(sub_id.to_string(), destination.to_string());

        if let Some(previous) = previous {
            if previous == destination {
                return;
            }
            self.detach(connection, sub_id, &previous);
        }

        self.by_destination
            .entry(destination.to_string())
            .or_default()
            .entry(connection)
            .or_default()
            .insert(sub_id.to_string());
    }

    /// Removes `(connection, sub_id)` and returns the destination it pointed
    /// at. Absent pairs are a no-op.
    pub fn remove_subscription(&mut self, connection: ConnectionId, sub_id: &str) -> Option<String> {
        let subscriptions = self.by_connection.get_mut(&connection)?;
        let destination = subscriptions.remove(sub_id)?;
        if subscriptions.is_empty() {
            self.by_connection.remove(&connection);
        }
        self.detach(connection, sub_id, &destination);
        Some(destination)
    }

    /// Removes every subscription owned by `connection` and returns how many
    /// there were.
    pub fn remove_all_for_connection(&mut self, connection: ConnectionId) -> usize {
        let Some(subscriptions) = self.by_connection.remove(&connection) else {
            return 0;
        };
        let removed = subscriptions.len();
        for (sub_id, destination) in subscriptions {
            self.detach(connection, &sub_id, &destination);
        }
        removed
    }

    /// Connections subscribed to `destination`, each with the subscription ids
    /// it holds there. Unknown destinations yield an empty list.
    pub fn subscribers_of(&self, destination: &str) -> Vec<(ConnectionId, &HashSet<SubscriptionId>)> {
        self.by_destination
            .get(destination)
            .map(|subscribers| subscribers.iter().map(|(conn, ids)| (*conn, ids)).collect())
            .unwrap_or_default()
    }

    pub fn destination_of(&self, connection: ConnectionId, sub_id: &str) -> Option<&str> {
        self.by_connection
            .get(&connection)
            .and_then(|subscriptions| subscriptions.get(sub_id))
            .map(String::as_str)
    }

    /// Number of subscriptions held by `connection`.
    pub fn subscription_count(&self, connection: ConnectionId) -> usize {
        self.by_connection.get(&connection).map_or(0, HashMap::len)
    }

    #[cfg(test)]
    pub(crate) fn has_connection(&self, connection: ConnectionId) -> bool {
        self.by_connection.contains_key(&connection)
    }

    pub fn has_destination(&self, destination: &str) -> bool {
        self.by_destination.contains_key(destination)
    }

    #[cfg(test)]
    pub(crate) fn destination_count(&self) -> usize {
        self.by_destination.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_connection.is_empty() && self.by_destination.is_empty()
    }

    /// Cross-checks both indices: every triple is present in both directions
    /// and neither index holds an empty entry.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let forward_ok = self.by_connection.iter().all(|(conn, subscriptions)| {
            !subscriptions.is_empty()
                && subscriptions.iter().all(|(sub_id, destination)| {
                    self.by_destination
                        .get(destination)
                        .and_then(|subscribers| subscribers.get(conn))
                        .is_some_and(|ids| ids.contains(sub_id))
                })
        });

        let backward_ok = self.by_destination.iter().all(|(destination, subscribers)| {
            !subscribers.is_empty()
                && subscribers.iter().all(|(conn, ids)| {
                    !ids.is_empty()
                        && ids.iter().all(|sub_id| {
                            self.destination_of(*conn, sub_id) == Some(destination.as_str())
                        })
                })
        });

        forward_ok && backward_ok
    }

    // Drops the destination-side entry for one pair, pruning empty levels.
    fn detach(&mut self, connection: ConnectionId, sub_id: &str, destination: &str) {
        let Some(subscribers) = self.by_destination.get_mut(destination) else {
            return;
        };
        if let Some(ids) = subscribers.get_mut(&connection) {
            ids.remove(sub_id);
            if ids.is_empty() {
                subscribers.remove(&connection);
            }
        }
        if subscribers.is_empty() {
            self.by_destination.remove(destination);
        }
    }
}
