use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::broker::{self, SharedBroker};
use crate::client::{Client, ConnectionId};
use crate::protocol::frame::{
    Command, Frame, HEADER_DESTINATION, HEADER_ID, HEADER_MESSAGE, HEADER_VERSION,
    PROTOCOL_VERSION,
};
use crate::protocol::{decode, encode};
use crate::transport::Transport;
use crate::utils::Result;

/// Lifecycle of a connection.
///
/// `Unacknowledged` and `Active` are advisory: SUBSCRIBE and SEND are accepted
/// before the CONNECT handshake as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unacknowledged,
    Active,
    Closed,
}

#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    broker: SharedBroker,
    transport: Arc<dyn Transport>,
    state: SessionState,
    connected_at: DateTime<Utc>,
    cleaned_up: bool,
}

impl Session {
    /// Registers a new connection with the broker.
    ///
    /// When the broker refuses the connection, an `ERROR` frame is written and
    /// the transport is closed before the error is returned.
    pub fn open(broker: SharedBroker, transport: Arc<dyn Transport>) -> Result<Self> {
        let client = Client::new(Arc::clone(&transport));
        let id = client.id;
        let connected_at = client.connected_at;

        let registered = broker::lock(&broker).register_client(client);
        if let Err(e) = registered {
            warn!(connection_id = id, error = %e, "rejecting connection");
            let reply = encode(
                Command::Error.as_str(),
                &[(HEADER_MESSAGE, "connection limit reached")],
                &e.to_string(),
            );
            let _ = transport.send(reply);
            transport.close();
            return Err(e);
        }

        info!(connection_id = id, "client connected");
        Ok(Self {
            id,
            broker,
            transport,
            state: SessionState::Unacknowledged,
            connected_at,
            cleaned_up: false,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once the session ended or its transport can no longer write.
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed || !self.transport.is_open()
    }

    /// Handles one inbound delivery, which may hold several frames.
    pub fn on_data(&mut self, raw: &str) {
        for frame in decode(raw) {
            if self.state == SessionState::Closed {
                debug!(connection_id = self.id, command = %frame.command, "frame after disconnect ignored");
                break;
            }
            self.dispatch(&frame);
        }
    }

    /// Handles the transport's close event. Cleanup runs once; later calls do
    /// nothing.
    pub fn on_close(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        self.state = SessionState::Closed;

        let removed = broker::lock(&self.broker).cleanup_client(self.id);
        self.transport.close();

        let duration_ms = (Utc::now() - self.connected_at).num_milliseconds();
        info!(
            connection_id = self.id,
            subscriptions = removed,
            duration_ms,
            "client disconnected"
        );
    }

    /// Replies with an `ERROR` frame and ends the session. Cleanup still runs
    /// through `on_close`.
    pub fn fail(&mut self, message: &str, body: &str) {
        self.reply(Command::Error, &[(HEADER_MESSAGE, message)], body);
        self.state = SessionState::Closed;
        self.transport.close();
    }

    fn dispatch(&mut self, frame: &Frame) {
        match frame.kind() {
            Some(Command::Connect | Command::Stomp) => self.handle_connect(),
            Some(Command::Subscribe) => self.handle_subscribe(frame),
            Some(Command::Unsubscribe) => self.handle_unsubscribe(frame),
            Some(Command::Send) => self.handle_send(frame),
            Some(Command::Disconnect) => self.handle_disconnect(),
            _ => {
                debug!(connection_id = self.id, command = %frame.command, "ignoring unsupported command");
            }
        }
    }

    fn handle_connect(&mut self) {
        self.state = SessionState::Active;
        self.reply(
            Command::Connected,
            &[(HEADER_VERSION, PROTOCOL_VERSION)],
            "",
        );
    }

    fn handle_subscribe(&mut self, frame: &Frame) {
        let id = frame.header(HEADER_ID);
        let destination = frame.header(HEADER_DESTINATION);

        if let (Some(id), Some(destination)) = (id, destination) {
            broker::lock(&self.broker).subscribe(self.id, id, destination);
            return;
        }

        let missing: Vec<&str> = [(HEADER_ID, id), (HEADER_DESTINATION, destination)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
        warn!(connection_id = self.id, missing = ?missing, "SUBSCRIBE missing required headers");
        self.reply(
            Command::Error,
            &[(HEADER_MESSAGE, "missing required header")],
            &format!("SUBSCRIBE requires header(s): {}", missing.join(", ")),
        );
    }

    fn handle_unsubscribe(&mut self, frame: &Frame) {
        match frame.header(HEADER_ID) {
            Some(id) => broker::lock(&self.broker).unsubscribe(self.id, id),
            None => debug!(connection_id = self.id, "UNSUBSCRIBE without id ignored"),
        }
    }

    fn handle_send(&mut self, frame: &Frame) {
        match frame.header(HEADER_DESTINATION) {
            Some(destination) => {
                broker::lock(&self.broker).broadcast(destination, &frame.body);
            }
            None => debug!(connection_id = self.id, "SEND without destination ignored"),
        }
    }

    fn handle_disconnect(&mut self) {
        let removed = broker::lock(&self.broker).remove_all_for_connection(self.id);
        debug!(connection_id = self.id, subscriptions = removed, "DISCONNECT received");
        self.state = SessionState::Closed;
        self.transport.close();
    }

    fn reply(&self, command: Command, headers: &[(&str, &str)], body: &str) {
        if let Err(e) = self.transport.send(encode(command.as_str(), headers, body)) {
            debug!(connection_id = self.id, error = %e, "reply dropped");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.on_close();
    }
}
