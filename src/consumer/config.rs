use std::time::Duration;

use serde::Deserialize;

/// Raw consumer configuration.
///
/// Every field is optional; unset fields are filled with the documented
/// default when the configuration is resolved into a [`ReceiveDescriptor`]
/// and [`BackoffPolicy`]. Field names follow the SQS JSON conventions
/// (`queueUrl`, `maxNumberOfMessages`, ...) so existing configuration
/// documents keep working.
///
/// The documented ranges (`maxNumberOfMessages` 1-10, `visibilityTimeout`
/// 0-43200, `waitTimeSeconds` 0-20) are not enforced locally. Out-of-range
/// values are sent as-is and rejected by the queue service at receive time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// AWS region used when the consumer builds its own client.
    pub region: Option<String>,

    /// System attribute names to request with each message. Defaults to `["All"]`.
    pub attribute_names: Option<Vec<String>>,

    /// Upper bound on the batch size per receive call, 1-10. Defaults to 1.
    pub max_number_of_messages: Option<i32>,

    /// Message attribute names to request with each message.
    pub message_attribute_names: Option<Vec<String>>,

    /// URL of the queue to poll.
    pub queue_url: Option<String>,

    /// Deduplication token for receive attempts on FIFO queues.
    pub receive_request_attempt_id: Option<String>,

    /// Seconds a received message stays hidden from other consumers,
    /// 0-43200. Defaults to 30.
    pub visibility_timeout: Option<i32>,

    /// Long-poll wait time per receive call in seconds, 0-20. Defaults to 10.
    pub wait_time_seconds: Option<i32>,

    /// Number of consecutive empty polls after which the loop backs off.
    /// 0 (the default) disables backoff.
    pub idle: Option<u64>,

    /// Backoff sleep duration in seconds. 0 (the default) disables backoff.
    pub sleep: Option<u64>,
}

impl Config {
    /// Resolves this configuration into the immutable parameter sets used by
    /// the polling loop, applying defaults for every unset field.
    ///
    /// Pure and infallible; malformed values surface later, remotely.
    pub fn resolve(&self) -> (ReceiveDescriptor, BackoffPolicy) {
        let descriptor = ReceiveDescriptor {
            attribute_names: self
                .attribute_names
                .clone()
                .unwrap_or_else(|| vec!["All".to_string()]),
            max_number_of_messages: self.max_number_of_messages.unwrap_or(1),
            message_attribute_names: self.message_attribute_names.clone(),
            queue_url: self.queue_url.clone(),
            receive_request_attempt_id: self.receive_request_attempt_id.clone(),
            visibility_timeout: self.visibility_timeout.unwrap_or(30),
            wait_time_seconds: self.wait_time_seconds.unwrap_or(10),
        };

        let backoff = BackoffPolicy {
            idle_threshold: self.idle.unwrap_or(0),
            sleep: Duration::from_secs(self.sleep.unwrap_or(0)),
        };

        (descriptor, backoff)
    }
}

/// Fully-defaulted receive parameters sent on every poll.
///
/// Produced once by [`Config::resolve`]; after that, the worker's individual
/// setters mutate single fields directly without re-running defaulting.
#[derive(Debug, Clone)]
pub struct ReceiveDescriptor {
    pub attribute_names: Vec<String>,
    pub max_number_of_messages: i32,
    pub message_attribute_names: Option<Vec<String>>,
    pub queue_url: Option<String>,
    pub receive_request_attempt_id: Option<String>,
    pub visibility_timeout: i32,
    pub wait_time_seconds: i32,
}

/// Idle backoff parameters for one polling loop.
///
/// Backoff only engages when both values are non-zero: once a loop has seen
/// more than `idle_threshold` consecutive empty polls it sleeps for `sleep`
/// before polling again.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub idle_threshold: u64,
    pub sleep: Duration,
}
