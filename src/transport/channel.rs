use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::Transport;
use crate::utils::{RelayError, Result};

/// Work item for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(String),
    Close,
}

/// `Transport` backed by an unbounded channel.
///
/// Frames are delivered to the writer task in the order they were sent. The
/// writer calls `mark_closed` when the socket goes away so later broadcasts
/// skip this connection.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: UnboundedSender<Outbound>,
    open: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> (Self, UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let transport = Self {
            sender,
            open: Arc::new(AtomicBool::new(true)),
        };
        (transport, receiver)
    }

    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl Transport for ChannelTransport {
    fn send(&self, payload: String) -> Result<()> {
        if !self.is_open() {
            return Err(RelayError::TransportClosed);
        }
        self.sender.send(Outbound::Frame(payload)).map_err(|_| {
            self.mark_closed();
            RelayError::TransportClosed
        })
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let _ = self.sender.send(Outbound::Close);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.sender.is_closed()
    }
}
