//! WebSocket transport
//!
//! Accepts TCP connections, performs the WebSocket handshake and binds each
//! connection to a `Session`:
//! - every text message (or UTF-8 binary message) is one inbound delivery
//! - outbound frames are written as text messages by a per-connection writer task
//! - a server-side close becomes a WebSocket close frame

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use super::{ChannelTransport, Outbound};
use crate::broker::SharedBroker;
use crate::session::Session;
use crate::utils::Result;

/// Binds `addr` and serves WebSocket clients until the listener fails.
pub async fn start_websocket_server(addr: String, broker: SharedBroker) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, broker).await
}

/// Serves WebSocket clients on an already bound listener.
pub async fn serve(listener: TcpListener, broker: SharedBroker) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let broker = broker.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, broker).await {
                warn!(%peer, error = %e, "WebSocket connection failed");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, broker: SharedBroker) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (transport, mut rx) = ChannelTransport::new();

    // Forward queued frames to the socket, preserving their order.
    let writer_transport = transport.clone();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let result = match outbound {
                Outbound::Frame(payload) => ws_sender.send(WsMessage::text(payload)).await,
                Outbound::Close => {
                    let _ = ws_sender.send(WsMessage::Close(None)).await;
                    break;
                }
            };
            if let Err(e) = result {
                debug!(error = %e, "WebSocket write failed");
                break;
            }
        }
        writer_transport.mark_closed();
    });

    let mut session = match Session::open(broker, Arc::new(transport)) {
        Ok(session) => session,
        Err(_) => {
            // The ERROR frame and close are already queued.
            let _ = writer.await;
            return Ok(());
        }
    };

    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                debug!(connection_id = session.id(), error = %e, "WebSocket read failed");
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => session.on_data(text.as_str()),
            WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => session.on_data(text),
                Err(e) => {
                    debug!(connection_id = session.id(), error = %e, "dropping non-UTF-8 binary message");
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }

        if session.is_closed() {
            break;
        }
    }

    session.on_close();
    let _ = writer.await;
    Ok(())
}
