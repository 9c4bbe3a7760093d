//! The `broker` module holds the shared relay state: the subscription
//! registry, the connected clients, and the broadcast engine that fans
//! published bodies out to subscribers.

pub mod engine;
pub mod message;
pub mod registry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use engine::Broker;
pub use registry::{SubscriptionId, SubscriptionRegistry};

/// The broker as shared between connection tasks.
pub type SharedBroker = Arc<Mutex<Broker>>;

pub fn shared(broker: Broker) -> SharedBroker {
    Arc::new(Mutex::new(broker))
}

/// Locks the broker, recovering the guard if a previous holder panicked.
pub fn lock(broker: &Mutex<Broker>) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}
