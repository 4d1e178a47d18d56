//! The polling core: a [`Worker`] owns the resolved receive parameters, a
//! queue client handle and the event registry, and drives one or more
//! infinite receive loops. Each non-empty batch fans out to concurrent
//! per-message tasks; the loop only polls again once the whole batch has
//! been processed.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

pub mod config;
pub mod events;

use crate::client::{Message, QueueClient, SqsQueueClient};
use crate::errors::HandlerError;
use config::{BackoffPolicy, Config, ReceiveDescriptor};
use events::{Event, EventRegistry};

/// Processes one message.
///
/// Returning `Ok` acknowledges the delivery: the worker deletes the message
/// from the queue. Returning `Err` leaves it unacknowledged, so the queue
/// redelivers it after its visibility timeout expires. Handlers must
/// therefore tolerate duplicates.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

/// Adapts an async closure into a [`MessageHandler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

/// [`MessageHandler`] implementation wrapping a plain async function.
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        (self.0)(message.clone()).await
    }
}

/// Outcome of processing a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOutcome {
    /// The handler returned an error; the message was left on the queue.
    HandlerFailed,
    /// The handler succeeded and the delete call went through.
    Acknowledged,
    /// The handler succeeded but the delete call failed. The message counts
    /// as processed anyway and may be redelivered later.
    AckFailed,
}

/// A queue consumer.
///
/// A worker is configured once (`set_*`, [`Worker::on`]), then frozen by
/// wrapping it in an [`Arc`] and entered into one or more polling loops via
/// [`Worker::start`] or [`Worker::concurrent`]. The `&mut` configuration
/// surface cannot be reached through the `Arc`, so running loops never
/// observe a mutation.
pub struct Worker {
    client: Arc<dyn QueueClient>,
    descriptor: ReceiveDescriptor,
    backoff: BackoffPolicy,
    events: EventRegistry,
}

impl Worker {
    /// Creates a worker from a raw configuration and an existing client,
    /// resolving defaults for every unset configuration field.
    pub fn new(config: &Config, client: Arc<dyn QueueClient>) -> Self {
        let (descriptor, backoff) = config.resolve();

        Worker {
            client,
            descriptor,
            backoff,
            events: EventRegistry::default(),
        }
    }

    /// Creates a worker with an [`SqsQueueClient`] built from the
    /// environment, honoring `config.region` when set.
    pub async fn connect(config: &Config) -> Self {
        let client = match &config.region {
            Some(region) => SqsQueueClient::from_env_with_region(region).await,
            None => SqsQueueClient::from_env().await,
        };

        Worker::new(config, Arc::new(client))
    }

    /// Replaces the configuration wholesale, re-resolving every default.
    pub fn set_config(&mut self, config: &Config) {
        let (descriptor, backoff) = config.resolve();
        self.descriptor = descriptor;
        self.backoff = backoff;
    }

    /// Replaces the queue client handle.
    pub fn set_client(&mut self, client: Arc<dyn QueueClient>) {
        self.client = client;
    }

    pub fn set_attribute_names(&mut self, attribute_names: Vec<String>) {
        self.descriptor.attribute_names = attribute_names;
    }

    pub fn set_max_number_of_messages(&mut self, max_number_of_messages: i32) {
        self.descriptor.max_number_of_messages = max_number_of_messages;
    }

    /// An empty list clears the filter.
    pub fn set_message_attribute_names(&mut self, message_attribute_names: Vec<String>) {
        if message_attribute_names.is_empty() {
            self.descriptor.message_attribute_names = None;
        } else {
            self.descriptor.message_attribute_names = Some(message_attribute_names);
        }
    }

    /// An empty string clears the queue URL.
    pub fn set_queue_url(&mut self, queue_url: &str) {
        if queue_url.is_empty() {
            self.descriptor.queue_url = None;
        } else {
            self.descriptor.queue_url = Some(queue_url.to_string());
        }
    }

    /// An empty string clears the deduplication token.
    pub fn set_receive_request_attempt_id(&mut self, receive_request_attempt_id: &str) {
        if receive_request_attempt_id.is_empty() {
            self.descriptor.receive_request_attempt_id = None;
        } else {
            self.descriptor.receive_request_attempt_id =
                Some(receive_request_attempt_id.to_string());
        }
    }

    pub fn set_visibility_timeout(&mut self, visibility_timeout: i32) {
        self.descriptor.visibility_timeout = visibility_timeout;
    }

    pub fn set_wait_time_seconds(&mut self, wait_time_seconds: i32) {
        self.descriptor.wait_time_seconds = wait_time_seconds;
    }

    pub fn set_idle(&mut self, idle_threshold: u64) {
        self.backoff.idle_threshold = idle_threshold;
    }

    pub fn set_sleep(&mut self, sleep_seconds: u64) {
        self.backoff.sleep = std::time::Duration::from_secs(sleep_seconds);
    }

    /// Registers a lifecycle hook, replacing any earlier registration for
    /// the same event.
    pub fn on(&mut self, event: Event) {
        self.events.register(event);
    }

    /// The resolved receive parameters currently in effect.
    pub fn descriptor(&self) -> &ReceiveDescriptor {
        &self.descriptor
    }

    /// The resolved idle backoff policy currently in effect.
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Runs one polling loop until the process terminates.
    pub async fn start<H>(self: Arc<Self>, handler: Arc<H>)
    where
        H: MessageHandler + 'static,
    {
        self.poll_loop(&handler, None).await;
    }

    /// Runs one polling loop until `shutdown` carries `true`.
    ///
    /// The signal is observed at the top of each iteration, so a loop that
    /// is blocked in a long poll or mid-batch finishes that work first.
    pub async fn start_with_shutdown<H>(
        self: Arc<Self>,
        handler: Arc<H>,
        shutdown: watch::Receiver<bool>,
    ) where
        H: MessageHandler + 'static,
    {
        self.poll_loop(&handler, Some(shutdown)).await;
    }

    /// Spawns `concurrency` independent polling loops sharing this worker.
    ///
    /// The loops are deliberately uncoordinated; the queue's visibility
    /// timeout keeps one loop from receiving a message another loop is
    /// already holding.
    pub fn concurrent<H>(
        self: &Arc<Self>,
        handler: &Arc<H>,
        concurrency: usize,
    ) -> Vec<JoinHandle<()>>
    where
        H: MessageHandler + 'static,
    {
        (0..concurrency)
            .map(|_| {
                let worker = Arc::clone(self);
                let handler = Arc::clone(handler);
                tokio::spawn(async move { worker.start(handler).await })
            })
            .collect()
    }

    /// Like [`Worker::concurrent`], with every loop observing the same
    /// shutdown signal.
    pub fn concurrent_with_shutdown<H>(
        self: &Arc<Self>,
        handler: &Arc<H>,
        concurrency: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>>
    where
        H: MessageHandler + 'static,
    {
        (0..concurrency)
            .map(|_| {
                let worker = Arc::clone(self);
                let handler = Arc::clone(handler);
                let shutdown = shutdown.clone();
                tokio::spawn(async move { worker.start_with_shutdown(handler, shutdown).await })
            })
            .collect()
    }

    async fn poll_loop<H>(
        self: &Arc<Self>,
        handler: &Arc<H>,
        shutdown: Option<watch::Receiver<bool>>,
    ) where
        H: MessageHandler + 'static,
    {
        let mut idle: u64 = 0;

        loop {
            if let Some(shutdown) = &shutdown {
                if *shutdown.borrow() {
                    break;
                }
            }

            if self.backoff.idle_threshold > 0
                && idle > self.backoff.idle_threshold
                && !self.backoff.sleep.is_zero()
            {
                idle = 0;
                tokio::time::sleep(self.backoff.sleep).await;
            }

            match self.client.receive(&self.descriptor).await {
                Err(ref error) => {
                    // Receive errors never touch the idle counter; the long
                    // poll wait inside the client call is the only delay
                    // before the next attempt.
                    error!(error = %error, "receive message failed");
                    self.events.emit_receive_message_error(error);
                }
                Ok(batch) if batch.is_empty() => {
                    idle += 1;
                }
                Ok(batch) => {
                    idle = 0;
                    self.events.emit_receive_message(&batch);
                    self.dispatch_batch(handler, batch).await;
                }
            }
        }
    }

    /// Fans a batch out to one task per message and waits for all of them,
    /// bounding in-flight work to the batch size per loop.
    async fn dispatch_batch<H>(self: &Arc<Self>, handler: &Arc<H>, batch: Vec<Message>)
    where
        H: MessageHandler + 'static,
    {
        let tasks = batch
            .into_iter()
            .map(|message| {
                let worker = Arc::clone(self);
                let handler = Arc::clone(handler);
                tokio::spawn(async move {
                    match worker.process_message(handler.as_ref(), &message).await {
                        MessageOutcome::HandlerFailed => {}
                        MessageOutcome::Acknowledged | MessageOutcome::AckFailed => {
                            worker.events.emit_process_message(&message);
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for joined in join_all(tasks).await {
            if let Err(error) = joined {
                error!(error = %error, "message task did not complete");
            }
        }
    }

    async fn process_message<H>(&self, handler: &H, message: &Message) -> MessageOutcome
    where
        H: MessageHandler,
    {
        if let Err(error) = handler.handle(message).await {
            error!(
                error = %error,
                message_id = ?message.message_id,
                "handler failed, message left for redelivery"
            );
            return MessageOutcome::HandlerFailed;
        }

        // Best-effort acknowledge: a missing queue URL or receipt handle is
        // passed through and rejected remotely, and a failed delete is
        // logged without any compensating retry.
        let queue_url = self.descriptor.queue_url.as_deref().unwrap_or_default();
        let receipt_handle = message.receipt_handle.as_deref().unwrap_or_default();

        match self.client.delete(queue_url, receipt_handle).await {
            Ok(()) => MessageOutcome::Acknowledged,
            Err(error) => {
                error!(
                    error = %error,
                    message_id = ?message.message_id,
                    "delete message failed"
                );
                MessageOutcome::AckFailed
            }
        }
    }
}
