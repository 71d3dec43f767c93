//! Datadog API client core.
//!
//! Builds authenticated requests, retries idempotent calls with backoff,
//! detects errors embedded in 2xx responses and reports rate-limit headers.
//!
//! ```no_run
//! use datadog_api::{Client, RequestContext};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), datadog_api::Error> {
//! let client = Client::new("api-key", "app-key")?;
//! let ctx = RequestContext::background().with_timeout(Duration::from_secs(30));
//! let monitors = client.get::<serde_json::Value>(&ctx, "/v1/monitor").await?;
//! println!("{} requests left", monitors.meta.rate_limit.remaining);
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod types;

pub use backoff::{Backoff, BackoffPolicy, ConstantBackoff, ExponentialBackoff};
pub use client::{ApiResponse, Client, DEFAULT_RETRY_TIMEOUT};
pub use config::Config;
pub use context::{CancelHandle, RequestContext};
pub use error::{redact_keys, Error};
pub use http::{Idempotency, RetryNotify, Transport};
pub use rate_limit::{RateLimit, ResponseMetadata};
pub use reqwest::Method;
pub use types::Validation;
