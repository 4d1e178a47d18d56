//! # AWS SQS Consumer
//!
//! An asynchronous AWS SQS queue consumer that abstracts the polling loop
//! and lets users plug in a message handler plus optional lifecycle hooks.
//!
//! ## Features
//!
//! - Infinite long-polling receive loops with tokio, horizontally scalable
//!   via [`Worker::concurrent`](consumer::Worker::concurrent)
//! - Idle backoff: after a configured run of empty polls the loop sleeps,
//!   cutting poll volume during quiet periods
//! - Per-batch concurrent dispatch with batch-level backpressure
//! - At-least-once delivery: automatic message deletion on successful
//!   processing, best-effort only
//! - Typed lifecycle hooks (`ReceiveMessage`, `ProcessMessage`,
//!   `ReceiveMessageError`) checked at compile time
//! - Continue-on-error semantics for resilient processing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use rs_sqs_consumer::client::{Message, SqsQueueClient};
//! use rs_sqs_consumer::consumer::config::Config;
//! use rs_sqs_consumer::consumer::events::Event;
//! use rs_sqs_consumer::consumer::{Worker, handler_fn};
//! use rs_sqs_consumer::errors::HandlerError;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config {
//!         queue_url: Some("https://sqs.region.amazonaws.com/account/queue-name".to_string()),
//!         max_number_of_messages: Some(10),
//!         idle: Some(30),
//!         sleep: Some(60),
//!         ..Config::default()
//!     };
//!
//!     let client = Arc::new(SqsQueueClient::from_env().await);
//!     let mut worker = Worker::new(&config, client);
//!     worker.on(Event::receive_message(|batch| {
//!         println!("received {} messages", batch.len());
//!     }));
//!
//!     let handler = Arc::new(handler_fn(|message: Message| async move {
//!         println!("processing message: {:?}", message.body);
//!         Ok::<(), HandlerError>(())
//!     }));
//!
//!     Arc::new(worker).start(handler).await;
//! }
//! ```

pub mod client;
pub mod consumer;
pub mod errors;
