//! HTTP plumbing: transport boundary, request building, retries and response
//! handling.

mod request;
mod response;
mod retry;

pub use request::{encode_request_body, new_json_request, uri_for_api};
pub use response::{check_response, decode_body};
pub use retry::{is_terminal_status, Executor, Idempotency, RetryNotify};

use crate::config::Config;
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Request, Response};
use std::future::Future;
use std::time::Duration;

/// Anything that can send a request and hand back a response.
///
/// TLS, proxies and connection pooling belong to the transport.
pub trait Transport: Send + Sync {
    fn execute(&self, request: Request) -> impl Future<Output = reqwest::Result<Response>> + Send;
}

impl Transport for reqwest::Client {
    fn execute(&self, request: Request) -> impl Future<Output = reqwest::Result<Response>> + Send {
        reqwest::Client::execute(self, request)
    }
}

pub fn build_client(cfg: &Config) -> reqwest::Result<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    match HeaderValue::from_str(&cfg.user_agent) {
        Ok(ua) => {
            default_headers.insert(USER_AGENT, ua);
        }
        Err(e) => warn!("ignoring invalid user agent {:?}: {}", cfg.user_agent, e),
    }
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
}
