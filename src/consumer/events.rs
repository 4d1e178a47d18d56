use crate::client::Message;
use crate::errors::QueueClientError;

/// Callback invoked with every non-empty batch, before dispatch.
pub type OnReceiveMessage = dyn Fn(&[Message]) + Send + Sync;

/// Callback invoked for each message whose handler succeeded, after the
/// delete call was attempted. A failed delete does not suppress it.
pub type OnProcessMessage = dyn Fn(&Message) + Send + Sync;

/// Callback invoked with the error of every failed receive call.
pub type OnReceiveMessageError = dyn Fn(&QueueClientError) + Send + Sync;

/// A lifecycle hook together with its callback.
///
/// Each variant carries a callback of the shape that event expects, so a
/// mismatched registration is a compile error rather than a runtime panic.
pub enum Event {
    ReceiveMessage(Box<OnReceiveMessage>),
    ProcessMessage(Box<OnProcessMessage>),
    ReceiveMessageError(Box<OnReceiveMessageError>),
}

impl Event {
    /// Wraps a closure as a [`Event::ReceiveMessage`] hook.
    pub fn receive_message<F>(callback: F) -> Self
    where
        F: Fn(&[Message]) + Send + Sync + 'static,
    {
        Event::ReceiveMessage(Box::new(callback))
    }

    /// Wraps a closure as a [`Event::ProcessMessage`] hook.
    pub fn process_message<F>(callback: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        Event::ProcessMessage(Box::new(callback))
    }

    /// Wraps a closure as a [`Event::ReceiveMessageError`] hook.
    pub fn receive_message_error<F>(callback: F) -> Self
    where
        F: Fn(&QueueClientError) + Send + Sync + 'static,
    {
        Event::ReceiveMessageError(Box::new(callback))
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::ReceiveMessage(_) => f.write_str("ReceiveMessage"),
            Event::ProcessMessage(_) => f.write_str("ProcessMessage"),
            Event::ReceiveMessageError(_) => f.write_str("ReceiveMessageError"),
        }
    }
}

/// Holds at most one callback per lifecycle event.
///
/// All registrations happen before any polling loop starts; once the worker
/// is shared with running loops the registry is read-only.
#[derive(Default)]
pub struct EventRegistry {
    on_receive_message: Option<Box<OnReceiveMessage>>,
    on_process_message: Option<Box<OnProcessMessage>>,
    on_receive_message_error: Option<Box<OnReceiveMessageError>>,
}

impl EventRegistry {
    /// Stores the callback in its slot, replacing any earlier registration
    /// for the same event.
    pub fn register(&mut self, event: Event) {
        match event {
            Event::ReceiveMessage(callback) => self.on_receive_message = Some(callback),
            Event::ProcessMessage(callback) => self.on_process_message = Some(callback),
            Event::ReceiveMessageError(callback) => {
                self.on_receive_message_error = Some(callback)
            }
        }
    }

    pub(crate) fn emit_receive_message(&self, batch: &[Message]) {
        if let Some(callback) = &self.on_receive_message {
            callback(batch);
        }
    }

    pub(crate) fn emit_process_message(&self, message: &Message) {
        if let Some(callback) = &self.on_process_message {
            callback(message);
        }
    }

    pub(crate) fn emit_receive_message_error(&self, error: &QueueClientError) {
        if let Some(callback) = &self.on_receive_message_error {
            callback(error);
        }
    }
}
