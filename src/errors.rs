use std::str::FromStr;

use thiserror::Error;

/// Transport-level errors returned by a [`QueueClient`](crate::client::QueueClient).
///
/// These are always transient from the consumer's point of view: a failed
/// receive is retried on the next loop iteration and a failed delete leaves
/// the message eligible for redelivery once its visibility timeout expires.
#[derive(Debug, Error)]
pub enum QueueClientError {
    /// A receive call against the queue failed.
    #[error("failed to receive messages: {0}")]
    Receive(String),

    /// A delete (acknowledge) call against the queue failed.
    #[error("failed to delete message: {0}")]
    Delete(String),
}

/// Opaque error returned by a message handler.
///
/// The consumer never inspects handler failures beyond logging them; the
/// failed message is left unacknowledged for the queue to redeliver.
#[derive(Debug, Error)]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a new `HandlerError` with the provided message.
    pub fn new(message: String) -> Self {
        HandlerError(message)
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HandlerError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HandlerError::new(s.to_string()))
    }
}

impl From<String> for HandlerError {
    fn from(s: String) -> Self {
        HandlerError::new(s)
    }
}

impl From<&str> for HandlerError {
    fn from(s: &str) -> Self {
        HandlerError::new(s.to_string())
    }
}
