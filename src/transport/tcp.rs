//! Raw TCP transport
//!
//! Clients speak the frame protocol directly over a socket. The reader splits
//! the byte stream on NUL, so every delivery handed to the session is one
//! complete frame even when TCP fragments it. A frame longer than
//! `max_frame_bytes` (terminator included) gets an `ERROR` reply and the
//! connection is closed.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{ChannelTransport, Outbound};
use crate::broker::SharedBroker;
use crate::session::Session;
use crate::utils::Result;

/// Binds `addr` and serves raw TCP clients until the listener fails.
pub async fn start_tcp_server(
    addr: String,
    broker: SharedBroker,
    max_frame_bytes: usize,
) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("TCP server listening on tcp://{addr}");
    serve(listener, broker, max_frame_bytes).await
}

/// Serves raw TCP clients on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    broker: SharedBroker,
    max_frame_bytes: usize,
) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let broker = broker.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, broker, max_frame_bytes).await {
                warn!(%peer, error = %e, "TCP connection failed");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    broker: SharedBroker,
    max_frame_bytes: usize,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (transport, mut rx) = ChannelTransport::new();

    let writer_transport = transport.clone();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(payload) => {
                    if let Err(e) = write_half.write_all(payload.as_bytes()).await {
                        debug!(error = %e, "TCP write failed");
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = write_half.shutdown().await;
                    break;
                }
            }
        }
        writer_transport.mark_closed();
    });

    let mut session = match Session::open(broker, Arc::new(transport)) {
        Ok(session) => session,
        Err(_) => {
            let _ = writer.await;
            return Ok(());
        }
    };

    let limit = max_frame_bytes as u64;
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match (&mut reader).take(limit).read_until(b'\0', &mut buf).await {
            Ok(0) => break,
            Ok(n) if n as u64 >= limit && buf.last() != Some(&b'\0') => {
                warn!(connection_id = session.id(), max_frame_bytes, "frame exceeds size limit");
                session.fail(
                    "frame too large",
                    &format!("frames are limited to {max_frame_bytes} bytes"),
                );
                break;
            }
            Ok(_) => session.on_data(&String::from_utf8_lossy(&buf)),
            Err(e) => {
                debug!(connection_id = session.id(), error = %e, "TCP read failed");
                break;
            }
        }

        if session.is_closed() {
            break;
        }
    }

    session.on_close();
    let _ = writer.await;
    Ok(())
}
