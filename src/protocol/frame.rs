use std::collections::HashMap;

/// Header carrying the client-chosen subscription id on SUBSCRIBE/UNSUBSCRIBE.
pub const HEADER_ID: &str = "id";
/// Header naming the destination on SUBSCRIBE, SEND and MESSAGE.
pub const HEADER_DESTINATION: &str = "destination";
/// Header echoing the subscription id on an outbound MESSAGE.
pub const HEADER_SUBSCRIPTION: &str = "subscription";
/// Header carrying the server-generated id of an outbound MESSAGE.
pub const HEADER_MESSAGE_ID: &str = "message-id";
/// Header carrying the protocol version on CONNECTED.
pub const HEADER_VERSION: &str = "version";
/// Header carrying the short description on ERROR.
pub const HEADER_MESSAGE: &str = "message";

/// Protocol version advertised in the CONNECTED reply.
pub const PROTOCOL_VERSION: &str = "1.2";

/// The commands this relay understands or emits.
///
/// Frames keep their command as a raw string so unknown commands survive
/// decoding; `Command::from_token` is used at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Disconnect,
    Error,
}

impl Command {
    /// Wire token for this command. Tokens are case-sensitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Disconnect => "DISCONNECT",
            Command::Error => "ERROR",
        }
    }

    /// Maps a wire token to a known command, or `None` for anything else.
    pub fn from_token(token: &str) -> Option<Self> {
        let command = match token {
            "CONNECT" => Command::Connect,
            "STOMP" => Command::Stomp,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "SEND" => Command::Send,
            "MESSAGE" => Command::Message,
            "DISCONNECT" => Command::Disconnect,
            "ERROR" => Command::Error,
            _ => return None,
        };
        Some(command)
    }
}

/// A decoded protocol unit.
///
/// Header names map to values; a repeated header keeps the last value seen.
/// Frames are built once by the decoder and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Frame {
    pub fn new(
        command: impl Into<String>,
        headers: HashMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            headers,
            body: body.into(),
        }
    }

    /// The known command for this frame, if any.
    pub fn kind(&self) -> Option<Command> {
        Command::from_token(&self.command)
    }

    /// Returns the header value when present and non-empty.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}
