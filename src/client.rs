//! Datadog API client.

use crate::backoff::{Backoff, BackoffPolicy, ExponentialBackoff};
use crate::config::Config;
use crate::context::RequestContext;
use crate::error::{redact_keys, Error};
use crate::http::{
    build_client, check_response, decode_body, encode_request_body, new_json_request, uri_for_api,
    Executor, Idempotency, RetryNotify, Transport,
};
use crate::rate_limit::{RateLimit, ResponseMetadata};
use crate::types::Validation;
use reqwest::{Method, Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Max elapsed retry time when neither a policy nor a retry timeout is set.
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(60);

const VALIDATE_PATH: &str = "/v1/validate";

/// Decoded payload plus the metadata of the response it came from.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub meta: ResponseMetadata,
}

/// Handles talking to the Datadog API.
///
/// Immutable once built: credential or base URL changes produce a new client
/// via [`Client::with_keys`] / [`Client::with_base_url`], so in-flight
/// requests never observe a half-updated configuration.
#[derive(Clone)]
pub struct Client<T = reqwest::Client> {
    config: Config,
    transport: T,
    backoff: Option<Arc<dyn BackoffPolicy>>,
    retry_notify: Option<RetryNotify>,
}

impl Client {
    /// Client for the given keys over a default reqwest transport.
    pub fn new(api_key: impl Into<String>, app_key: impl Into<String>) -> Result<Self, Error> {
        Self::from_config(Config::new(api_key, app_key))
    }

    pub fn from_config(config: Config) -> Result<Self, Error> {
        let http = build_client(&config)?;
        Ok(Self::with_transport(config, http))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config,
            transport,
            backoff: None,
            retry_notify: None,
        }
    }

    /// Use `policy` for every retried request instead of the default
    /// exponential backoff.
    pub fn with_backoff(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff = Some(Arc::new(policy));
        self
    }

    /// Max elapsed retry time for the default backoff.
    pub fn with_retry_timeout(mut self, timeout: Duration) -> Self {
        self.config.retry_timeout = Some(timeout);
        self
    }

    pub fn with_retry_notify(
        mut self,
        notify: impl Fn(&Error, Duration) + Send + Sync + 'static,
    ) -> Self {
        self.retry_notify = Some(Arc::new(notify));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Policy used for retried requests: the explicit one if set, else
    /// exponential backoff capped by the retry timeout.
    pub fn backoff_policy(&self) -> Arc<dyn BackoffPolicy> {
        match &self.backoff {
            Some(policy) => policy.clone(),
            None => Arc::new(default_backoff(self.config.retry_timeout)),
        }
    }

    /// Issue a request and decode the JSON response into `O`.
    ///
    /// Only [`Idempotency::Idempotent`] requests are retried.
    pub async fn request<B, O>(
        &self,
        ctx: &RequestContext,
        method: Method,
        api: &str,
        idempotency: Idempotency,
        body: Option<&B>,
    ) -> Result<ApiResponse<O>, Error>
    where
        B: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.request_unredacted(ctx, method, api, idempotency, body)
            .await
            .map_err(|e| self.redact(e))
    }

    /// Like [`Client::request`] for endpoints whose body is not needed.
    pub async fn request_no_content<B>(
        &self,
        ctx: &RequestContext,
        method: Method,
        api: &str,
        idempotency: Idempotency,
        body: Option<&B>,
    ) -> Result<ResponseMetadata, Error>
    where
        B: Serialize + ?Sized,
    {
        self.round_trip(ctx, method, api, idempotency, body)
            .await
            .map(|(_, meta)| meta)
            .map_err(|e| self.redact(e))
    }

    pub async fn get<O: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        api: &str,
    ) -> Result<ApiResponse<O>, Error> {
        self.request(ctx, Method::GET, api, Idempotency::Idempotent, None::<&()>)
            .await
    }

    pub async fn post<B, O>(
        &self,
        ctx: &RequestContext,
        api: &str,
        body: &B,
    ) -> Result<ApiResponse<O>, Error>
    where
        B: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.request(ctx, Method::POST, api, Idempotency::NonIdempotent, Some(body))
            .await
    }

    pub async fn put<B, O>(
        &self,
        ctx: &RequestContext,
        api: &str,
        body: &B,
    ) -> Result<ApiResponse<O>, Error>
    where
        B: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.request(ctx, Method::PUT, api, Idempotency::NonIdempotent, Some(body))
            .await
    }

    pub async fn delete(&self, ctx: &RequestContext, api: &str) -> Result<ResponseMetadata, Error> {
        self.request_no_content(ctx, Method::DELETE, api, Idempotency::Idempotent, None::<&()>)
            .await
    }

    /// Check whether the API and application keys are accepted.
    ///
    /// The body is decoded whatever the status, since rejected keys come back
    /// as a 4xx carrying `{"errors": [...]}`.
    pub async fn validate(&self, ctx: &RequestContext) -> Result<Validation, Error> {
        self.validate_unredacted(ctx).await.map_err(|e| self.redact(e))
    }

    async fn validate_unredacted(&self, ctx: &RequestContext) -> Result<Validation, Error> {
        let request = new_json_request(Method::GET, self.uri_for_api(VALIDATE_PATH)?, None);
        let response = self.dispatch(ctx, request, Idempotency::Idempotent).await?;
        let raw = ctx.run(response.bytes()).await??;
        decode_body(&raw)
    }

    async fn request_unredacted<B, O>(
        &self,
        ctx: &RequestContext,
        method: Method,
        api: &str,
        idempotency: Idempotency,
        body: Option<&B>,
    ) -> Result<ApiResponse<O>, Error>
    where
        B: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let (body, meta) = self.round_trip(ctx, method, api, idempotency, body).await?;
        let value = decode_body(&body)?;
        Ok(ApiResponse { value, meta })
    }

    // Build, send and validate; returns the body ready for decoding.
    async fn round_trip<B>(
        &self,
        ctx: &RequestContext,
        method: Method,
        api: &str,
        idempotency: Idempotency,
        body: Option<&B>,
    ) -> Result<(Vec<u8>, ResponseMetadata), Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.uri_for_api(api)?;
        let payload = encode_request_body(body)?;
        let request = new_json_request(method, url, payload);
        let response = self.dispatch(ctx, request, idempotency).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let raw = ctx.run(response.bytes()).await??;
        let body = check_response(status, &raw)?.to_vec();
        let meta = ResponseMetadata {
            rate_limit: RateLimit::from_headers(&headers),
        };
        Ok((body, meta))
    }

    async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: Request,
        idempotency: Idempotency,
    ) -> Result<Response, Error> {
        let secrets = [self.config.api_key.as_str(), self.config.app_key.as_str()];
        let executor = Executor {
            transport: &self.transport,
            secrets: &secrets,
            notify: self.retry_notify.as_ref(),
        };
        match idempotency {
            Idempotency::Idempotent => {
                executor
                    .send_with_retries(ctx, request, self.start_backoff())
                    .await
            }
            Idempotency::NonIdempotent => executor.send_once(ctx, request).await,
        }
    }

    fn start_backoff(&self) -> Box<dyn Backoff> {
        self.backoff_policy().start()
    }

    fn uri_for_api(&self, api: &str) -> Result<Url, Error> {
        uri_for_api(&self.config.base_url, &self.config.api_key, &self.config.app_key, api)
    }

    fn redact(&self, err: Error) -> Error {
        redact_keys(err, &[self.config.api_key.as_str(), self.config.app_key.as_str()])
    }
}

impl<T: Transport + Clone> Client<T> {
    /// New client with different keys, sharing transport and retry settings.
    pub fn with_keys(&self, api_key: impl Into<String>, app_key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.config.api_key = api_key.into();
        next.config.app_key = app_key.into();
        next
    }

    pub fn with_base_url(&self, base_url: &str) -> Self {
        let mut next = self.clone();
        next.config = next.config.with_base_url(base_url);
        next
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .field("retry_notify", &self.retry_notify.is_some())
            .finish()
    }
}

/// Exponential backoff whose max elapsed time is `retry_timeout`, or
/// [`DEFAULT_RETRY_TIMEOUT`] when unset.
pub fn default_backoff(retry_timeout: Option<Duration>) -> ExponentialBackoff {
    ExponentialBackoff::default().max_elapsed_time(retry_timeout.unwrap_or(DEFAULT_RETRY_TIMEOUT))
}
