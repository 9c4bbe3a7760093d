use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::transport::Transport;

/// Opaque, server-assigned connection identity.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Represents a connected client in the relay.
///
/// Each client is identified by a process-unique `id` and owns the transport
/// handle the broker writes outbound frames to.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for the connection.
    pub id: ConnectionId,

    /// Outbound side of the connection.
    pub transport: Arc<dyn Transport>,

    /// When the transport connected.
    pub connected_at: DateTime<Utc>,
}

impl Client {
    /// Create a new client for `transport` with a freshly allocated id.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            connected_at: Utc::now(),
        }
    }

    /// Whether the transport can still accept frames.
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }
}
