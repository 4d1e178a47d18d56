use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use rs_sqs_consumer::client::{Message, QueueClient};
use rs_sqs_consumer::consumer::config::ReceiveDescriptor;
use rs_sqs_consumer::errors::QueueClientError;

/// In-memory [`QueueClient`] with SQS-like visibility semantics.
///
/// A received message becomes invisible for the descriptor's
/// `visibility_timeout` and is not handed out again (to any loop) until that
/// elapses. Delete removes it permanently. Every receive call pays a small
/// fixed latency, standing in for the long-poll round trip, so empty polling
/// does not busy-spin and backoff gaps are measurable.
pub struct MockQueueClient {
    poll_latency: Duration,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    queue: Vec<QueuedMessage>,
    next_id: u64,
    receive_errors: VecDeque<String>,
    failing_deletes: HashSet<String>,
    receive_times: Vec<Instant>,
    delete_calls: Vec<String>,
}

struct QueuedMessage {
    message: Message,
    visible_at: Instant,
}

impl MockQueueClient {
    pub fn new() -> Self {
        MockQueueClient {
            poll_latency: Duration::from_millis(10),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Enqueues a visible message and returns its receipt handle.
    pub fn push_message(&self, body: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let receipt_handle = format!("rh-{}", state.next_id);
        let message = Message {
            message_id: Some(format!("msg-{}", state.next_id)),
            receipt_handle: Some(receipt_handle.clone()),
            body: Some(body.to_string()),
            attributes: Default::default(),
        };
        state.queue.push(QueuedMessage {
            message,
            visible_at: Instant::now(),
        });
        receipt_handle
    }

    /// Makes the next receive call fail with the given message.
    pub fn fail_next_receive(&self, error: &str) {
        self.state
            .lock()
            .unwrap()
            .receive_errors
            .push_back(error.to_string());
    }

    /// Makes every delete for the given receipt handle fail.
    pub fn fail_delete(&self, receipt_handle: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(receipt_handle.to_string());
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn receive_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().receive_times.clone()
    }
}

#[async_trait]
impl QueueClient for MockQueueClient {
    async fn receive(
        &self,
        descriptor: &ReceiveDescriptor,
    ) -> Result<Vec<Message>, QueueClientError> {
        tokio::time::sleep(self.poll_latency).await;

        let mut state = self.state.lock().unwrap();
        state.receive_times.push(Instant::now());

        if let Some(error) = state.receive_errors.pop_front() {
            return Err(QueueClientError::Receive(error));
        }

        let now = Instant::now();
        let visibility = Duration::from_secs(descriptor.visibility_timeout.max(0) as u64);
        let max = descriptor.max_number_of_messages.max(0) as usize;

        let mut batch = Vec::new();
        for queued in state.queue.iter_mut() {
            if batch.len() >= max {
                break;
            }
            if queued.visible_at <= now {
                queued.visible_at = now + visibility;
                batch.push(queued.message.clone());
            }
        }

        Ok(batch)
    }

    async fn delete(
        &self,
        _queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(receipt_handle.to_string());

        if state.failing_deletes.contains(receipt_handle) {
            return Err(QueueClientError::Delete(format!(
                "receipt handle {receipt_handle} rejected"
            )));
        }

        state
            .queue
            .retain(|queued| queued.message.receipt_handle.as_deref() != Some(receipt_handle));
        Ok(())
    }
}
