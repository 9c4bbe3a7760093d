//! CLI for stomprelay
//!
//! Subcommands:
//! - `server`: run the relay
//! - `client`: run a simple smoke-test client against a running relay

use std::time::Duration;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use stomprelay::broker::{self, Broker};
use stomprelay::config::{load_config, load_config_from};
use stomprelay::protocol::frame::Command as FrameCommand;
use stomprelay::protocol::{decode, encode};
use stomprelay::transport::tcp::start_tcp_server;
use stomprelay::transport::websocket::start_websocket_server;
use stomprelay::utils::{Result, logging};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "stomprelay", about = "In-memory STOMP publish/subscribe relay")]
enum Command {
    /// Start the relay
    Server {
        /// Config file stem to load instead of config/default
        #[arg(long)]
        config: Option<String>,
    },
    /// Connect, subscribe, publish one message and print what comes back
    Client {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        /// Destination to subscribe and publish to
        #[arg(long, default_value = "demo")]
        destination: String,
        /// Body of the published message
        #[arg(long, default_value = "Hello from stomprelay")]
        body: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cmd = Command::parse();

    match cmd {
        Command::Server { config } => {
            if let Err(e) = run_server(config.as_deref()).await {
                logging::init("info");
                error!("Server failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Client {
            url,
            destination,
            body,
        } => {
            logging::init("info");
            if let Err(e) = run_client(&url, &destination, &body).await {
                error!("Client failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run_server(config_path: Option<&str>) -> Result<()> {
    let settings = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    logging::init(&settings.log.level);

    let host = &settings.server.host;
    let ws_addr = format!("{}:{}", host, settings.server.port);
    let tcp_addr = settings.server.tcp_port.map(|port| format!("{host}:{port}"));
    let broker = broker::shared(Broker::from_settings(&settings.broker));

    tokio::select! {
        result = start_websocket_server(ws_addr, broker.clone()) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        result = run_tcp_listener(tcp_addr, broker.clone(), settings.broker.max_frame_bytes) => {
            result?;
            error!("TCP server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_tcp_listener(
    addr: Option<String>,
    broker: broker::SharedBroker,
    max_frame_bytes: usize,
) -> Result<()> {
    match addr {
        Some(addr) => start_tcp_server(addr, broker, max_frame_bytes).await,
        None => std::future::pending().await,
    }
}

async fn run_client(url: &str, destination: &str, body: &str) -> Result<()> {
    let (mut ws_stream, _response) = connect_async(url).await?;

    let connect = encode(
        FrameCommand::Connect.as_str(),
        &[("accept-version", "1.2"), ("host", "localhost")],
        "",
    );
    let subscribe = encode(
        FrameCommand::Subscribe.as_str(),
        &[("id", "0"), ("destination", destination)],
        "",
    );
    let send = encode(
        FrameCommand::Send.as_str(),
        &[("destination", destination)],
        body,
    );
    ws_stream
        .send(WsMessage::text(format!("{connect}{subscribe}{send}")))
        .await?;

    // Print incoming frames until our own message comes back
    'read: while let Ok(Some(msg)) = timeout(Duration::from_secs(2), ws_stream.next()).await {
        let WsMessage::Text(text) = msg? else {
            continue;
        };
        for frame in decode(text.as_str()) {
            println!("{} {:?}\n{}", frame.command, frame.headers, frame.body);
            if frame.kind() == Some(FrameCommand::Message) {
                break 'read;
            }
        }
    }

    let disconnect = encode(FrameCommand::Disconnect.as_str(), &[], "");
    ws_stream.send(WsMessage::text(disconnect)).await?;
    while let Ok(Some(Ok(_))) = timeout(Duration::from_secs(2), ws_stream.next()).await {}

    Ok(())
}
