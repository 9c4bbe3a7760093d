use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use super::{Session, SessionState};
use crate::broker::{self, Broker, SharedBroker};
use crate::protocol::decode;
use crate::transport::{ChannelTransport, Outbound};

fn open_session(broker: &SharedBroker) -> (Session, UnboundedReceiver<Outbound>) {
    let (transport, rx) = ChannelTransport::new();
    let session = Session::open(broker.clone(), Arc::new(transport)).expect("session rejected");
    (session, rx)
}

fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

fn wire_frames(rx: &mut UnboundedReceiver<Outbound>) -> Vec<String> {
    drain(rx)
        .into_iter()
        .filter_map(|item| match item {
            Outbound::Frame(payload) => Some(payload),
            Outbound::Close => None,
        })
        .collect()
}

#[test]
fn test_connect_replies_connected() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);
    assert_eq!(session.state(), SessionState::Unacknowledged);

    session.on_data("CONNECT\naccept-version:1.2\nhost:localhost\n\n\0");
    assert_eq!(wire_frames(&mut rx), vec!["CONNECTED\nversion:1.2\n\n\0"]);
    assert_eq!(session.state(), SessionState::Active);

    session.on_data("STOMP\n\n\0");
    assert_eq!(wire_frames(&mut rx), vec!["CONNECTED\nversion:1.2\n\n\0"]);
}

#[test]
fn test_subscribe_is_silent_and_registers() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("SUBSCRIBE\nid:1\ndestination:news\n\n\0");
    assert!(drain(&mut rx).is_empty());

    let guard = broker::lock(&broker);
    assert_eq!(guard.registry.destination_of(session.id(), "1"), Some("news"));
}

#[test]
fn test_subscribe_works_before_connect() {
    let broker = broker::shared(Broker::new());
    let (mut session, _rx) = open_session(&broker);
    session.on_data("SUBSCRIBE\nid:a\ndestination:t\n\n\0");
    assert_eq!(session.state(), SessionState::Unacknowledged);
    assert!(broker::lock(&broker).registry.has_destination("t"));
}

#[test]
fn test_subscribe_missing_headers_replies_error() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("SUBSCRIBE\n\n\0");
    let replies = wire_frames(&mut rx);
    assert_eq!(replies.len(), 1);
    let frame = &decode(&replies[0])[0];
    assert_eq!(frame.command, "ERROR");
    assert!(frame.header("message").is_some());
    assert!(frame.body.contains("id"));
    assert!(frame.body.contains("destination"));
    assert!(broker::lock(&broker).registry.is_empty());
    assert!(!session.is_closed());
}

#[test]
fn test_subscribe_missing_destination_only() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("SUBSCRIBE\nid:5\n\n\0");
    let replies = wire_frames(&mut rx);
    let frame = &decode(&replies[0])[0];
    assert_eq!(frame.command, "ERROR");
    assert_eq!(frame.body, "SUBSCRIBE requires header(s): destination");
    assert!(broker::lock(&broker).registry.is_empty());
}

#[test]
fn test_send_reaches_other_subscriber() {
    let broker = broker::shared(Broker::new());
    let (mut subscriber, mut sub_rx) = open_session(&broker);
    let (mut publisher, mut pub_rx) = open_session(&broker);

    subscriber.on_data("SUBSCRIBE\nid:1\ndestination:news\n\n\0");
    publisher.on_data("SEND\ndestination:news\n\nHello\0");

    let delivered = wire_frames(&mut sub_rx);
    assert_eq!(delivered.len(), 1);
    let wire = &delivered[0];
    assert!(wire.starts_with("MESSAGE\nsubscription:1\ndestination:news\nmessage-id:"));
    assert!(wire.ends_with("\n\nHello\0"));

    let frame = &decode(wire)[0];
    let message_id = frame.header("message-id").expect("message-id header");
    assert!(uuid::Uuid::parse_str(message_id).is_ok());

    // The publisher is not subscribed and gets nothing back.
    assert!(drain(&mut pub_rx).is_empty());
}

#[test]
fn test_send_without_destination_is_ignored() {
    let broker = broker::shared(Broker::new());
    let (mut subscriber, mut sub_rx) = open_session(&broker);
    let (mut publisher, mut pub_rx) = open_session(&broker);
    subscriber.on_data("SUBSCRIBE\nid:1\ndestination:news\n\n\0");

    publisher.on_data("SEND\n\nlost\0");
    assert!(drain(&mut sub_rx).is_empty());
    assert!(drain(&mut pub_rx).is_empty());
}

#[test]
fn test_unsubscribe_removes_and_tolerates_missing_id() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("SUBSCRIBE\nid:1\ndestination:news\n\n\0UNSUBSCRIBE\n\n\0");
    assert!(broker::lock(&broker).registry.has_destination("news"));

    session.on_data("UNSUBSCRIBE\nid:1\n\n\0UNSUBSCRIBE\nid:1\n\n\0");
    assert!(broker::lock(&broker).registry.is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn test_unknown_commands_are_ignored() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("BEGIN\ntransaction:tx1\n\n\0MESSAGE\n\n\0send\ndestination:x\n\n\0");
    assert!(drain(&mut rx).is_empty());
    assert!(!session.is_closed());
}

#[test]
fn test_disconnect_cleans_up_and_closes() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);

    session.on_data("SUBSCRIBE\nid:1\ndestination:a\n\n\0SUBSCRIBE\nid:2\ndestination:b\n\n\0");
    session.on_data("DISCONNECT\n\n\0SUBSCRIBE\nid:3\ndestination:c\n\n\0");

    assert!(session.is_closed());
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(drain(&mut rx), vec![Outbound::Close]);
    {
        let guard = broker::lock(&broker);
        assert!(guard.registry.is_empty());
        // The client entry itself goes away with the close event.
        assert!(guard.clients.contains_key(&session.id()));
    }

    session.on_close();
    session.on_close();
    let guard = broker::lock(&broker);
    assert!(guard.clients.is_empty());
    assert!(guard.registry.is_consistent());
}

#[test]
fn test_close_without_disconnect_cleans_up() {
    let broker = broker::shared(Broker::new());
    let (mut session, _rx) = open_session(&broker);
    let (mut other, _other_rx) = open_session(&broker);
    session.on_data("SUBSCRIBE\nid:1\ndestination:shared\n\n\0");
    other.on_data("SUBSCRIBE\nid:1\ndestination:shared\n\n\0");

    session.on_close();
    let guard = broker::lock(&broker);
    assert_eq!(guard.clients.len(), 1);
    assert_eq!(guard.registry.subscribers_of("shared").len(), 1);
    assert!(!guard.registry.has_connection(session.id()));
}

#[test]
fn test_dropping_session_runs_cleanup() {
    let broker = broker::shared(Broker::new());
    {
        let (mut session, _rx) = open_session(&broker);
        session.on_data("SUBSCRIBE\nid:1\ndestination:x\n\n\0");
    }
    let guard = broker::lock(&broker);
    assert!(guard.clients.is_empty());
    assert!(guard.registry.is_empty());
}

#[test]
fn test_open_rejected_over_connection_limit() {
    let broker = broker::shared(Broker::with_max_connections(1));
    let (_first, _rx) = open_session(&broker);

    let (transport, mut rx) = ChannelTransport::new();
    let result = Session::open(broker.clone(), Arc::new(transport));
    assert!(result.is_err());

    let outbound = drain(&mut rx);
    assert_eq!(outbound.len(), 2);
    match &outbound[0] {
        Outbound::Frame(payload) => assert!(payload.starts_with("ERROR\nmessage:connection limit reached\n")),
        other => panic!("expected an ERROR frame, got {other:?}"),
    }
    assert_eq!(outbound[1], Outbound::Close);
    assert_eq!(broker::lock(&broker).connection_count(), 1);
}

#[test]
fn test_fail_sends_error_then_closes() {
    let broker = broker::shared(Broker::new());
    let (mut session, mut rx) = open_session(&broker);
    session.on_data("SUBSCRIBE\nid:1\ndestination:x\n\n\0");

    session.fail("frame too large", "frames are limited to 16 bytes");
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.is_closed());

    let outbound = drain(&mut rx);
    assert_eq!(outbound.len(), 2);
    match &outbound[0] {
        Outbound::Frame(payload) => {
            let frame = decode(payload).remove(0);
            assert_eq!(frame.command, "ERROR");
            assert_eq!(frame.header("message"), Some("frame too large"));
            assert_eq!(frame.body, "frames are limited to 16 bytes");
        }
        other => panic!("expected an ERROR frame, got {other:?}"),
    }
    assert_eq!(outbound[1], Outbound::Close);

    // Frames arriving after the failure are not dispatched.
    session.on_data("SUBSCRIBE\nid:2\ndestination:y\n\n\0");
    assert!(!broker::lock(&broker).registry.has_destination("y"));

    session.on_close();
    let guard = broker::lock(&broker);
    assert!(guard.clients.is_empty());
    assert!(guard.registry.is_empty());
}
