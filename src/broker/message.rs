use uuid::Uuid;

use crate::protocol::encode;
use crate::protocol::frame::{Command, HEADER_DESTINATION, HEADER_MESSAGE_ID, HEADER_SUBSCRIPTION};

/// One delivery of a published body to one subscription.
///
/// Every delivery gets its own `message_id`, so a connection subscribed twice
/// to the same destination receives two distinct messages.
///
/// # Example
///
/// ```rust
/// use stomprelay::broker::message::Message;
///
/// let msg = Message::new("s1", "room/1", "hi");
/// assert!(msg.encode().starts_with("MESSAGE\nsubscription:s1\ndestination:room/1\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subscription: String,
    pub destination: String,
    pub message_id: String,
    pub body: String,
}

impl Message {
    pub fn new(subscription: &str, destination: &str, body: &str) -> Self {
        Self {
            subscription: subscription.to_string(),
            destination: destination.to_string(),
            message_id: Uuid::new_v4().to_string(),
            body: body.to_string(),
        }
    }

    /// Renders the `MESSAGE` frame for this delivery.
    pub fn encode(&self) -> String {
        encode(
            Command::Message.as_str(),
            &[
                (HEADER_SUBSCRIPTION, self.subscription.as_str()),
                (HEADER_DESTINATION, self.destination.as_str()),
                (HEADER_MESSAGE_ID, self.message_id.as_str()),
            ],
            &self.body,
        )
    }
}
