use super::error::RelayError;
use super::logging;
use tracing::Level;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_maps_names() {
    assert_eq!(logging::parse_level("ERROR"), Level::ERROR);
    assert_eq!(logging::parse_level("warning"), Level::WARN);
    assert_eq!(logging::parse_level("trace"), Level::TRACE);
    assert_eq!(logging::parse_level("nonsense"), Level::INFO);
}

#[test]
fn relay_error_messages() {
    assert_eq!(RelayError::TransportClosed.to_string(), "transport is closed");
    assert_eq!(
        RelayError::TooManyConnections(3).to_string(),
        "connection limit of 3 reached"
    );
    let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
    assert_eq!(RelayError::from(io).to_string(), "I/O error: taken");
}
