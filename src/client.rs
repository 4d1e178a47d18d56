use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_sqs::config::SharedCredentialsProvider;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::MessageSystemAttributeName;

use crate::consumer::config::ReceiveDescriptor;
use crate::errors::QueueClientError;

/// A single delivery pulled from the queue.
///
/// The consumer treats the body as opaque; it only needs the receipt handle
/// to acknowledge the delivery after the handler succeeds.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// Transport operations the polling loop needs from a queue.
///
/// Implemented by [`SqsQueueClient`] for AWS SQS; test harnesses provide
/// their own implementation to drive the loop against an in-memory queue.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receives one batch of messages using the given poll parameters.
    async fn receive(
        &self,
        descriptor: &ReceiveDescriptor,
    ) -> Result<Vec<Message>, QueueClientError>;

    /// Deletes (acknowledges) one delivery by its receipt handle.
    async fn delete(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError>;
}

/// [`QueueClient`] backed by the AWS SQS SDK.
#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    inner: aws_sdk_sqs::Client,
}

impl SqsQueueClient {
    /// Wraps an already-configured SDK client.
    pub fn new(inner: aws_sdk_sqs::Client) -> Self {
        SqsQueueClient { inner }
    }

    /// Creates a client using credentials and configuration from the environment.
    ///
    /// This loads AWS configuration from environment variables such as:
    /// - `AWS_ACCESS_KEY_ID`
    /// - `AWS_SECRET_ACCESS_KEY`
    /// - `AWS_REGION`
    /// - `AWS_PROFILE`
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        SqsQueueClient::new(aws_sdk_sqs::Client::new(&config))
    }

    /// Creates a client from the environment with an explicit region override.
    pub async fn from_env_with_region(region: &str) -> Self {
        let config = aws_config::from_env()
            .region(Region::new(region.to_string()))
            .load()
            .await;
        SqsQueueClient::new(aws_sdk_sqs::Client::new(&config))
    }

    /// Creates a client with explicitly provided credentials and region.
    ///
    /// Useful for applications that manage credentials dynamically or need
    /// to use different credentials than those in the environment.
    pub fn with_credentials(access_key_id: &str, secret_access_key: &str, region: &str) -> Self {
        let credentials = aws_sdk_sqs::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "aws",
        );

        let shared_credentials = SharedCredentialsProvider::new(credentials);

        let config = aws_sdk_sqs::config::Builder::new()
            .region(Region::new(region.to_string()))
            .credentials_provider(shared_credentials)
            .build();

        SqsQueueClient::new(aws_sdk_sqs::Client::from_conf(config))
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn receive(
        &self,
        descriptor: &ReceiveDescriptor,
    ) -> Result<Vec<Message>, QueueClientError> {
        let attribute_names = descriptor
            .attribute_names
            .iter()
            .map(|name| MessageSystemAttributeName::from(name.as_str()))
            .collect::<Vec<_>>();

        let output = self
            .inner
            .receive_message()
            .set_queue_url(descriptor.queue_url.clone())
            .max_number_of_messages(descriptor.max_number_of_messages)
            .set_message_system_attribute_names(Some(attribute_names))
            .set_message_attribute_names(descriptor.message_attribute_names.clone())
            .set_receive_request_attempt_id(descriptor.receive_request_attempt_id.clone())
            .visibility_timeout(descriptor.visibility_timeout)
            .wait_time_seconds(descriptor.wait_time_seconds)
            .send()
            .await
            .map_err(|error| {
                QueueClientError::Receive(DisplayErrorContext(error).to_string())
            })?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(Message::from)
            .collect())
    }

    async fn delete(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueClientError> {
        self.inner
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|error| QueueClientError::Delete(DisplayErrorContext(error).to_string()))?;

        Ok(())
    }
}

impl From<aws_sdk_sqs::types::Message> for Message {
    fn from(message: aws_sdk_sqs::types::Message) -> Self {
        let attributes = message
            .attributes
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect();

        Message {
            message_id: message.message_id,
            receipt_handle: message.receipt_handle,
            body: message.body,
            attributes,
        }
    }
}
