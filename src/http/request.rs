use crate::error::Error;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Body, Method, Request};
use serde::Serialize;
use url::Url;

/// Full request URI for an API path such as `/v1/events`, with both keys
/// appended as query parameters.
///
/// The result embeds credentials; errors built from it must be redacted.
pub fn uri_for_api(base_url: &str, api_key: &str, app_key: &str, api: &str) -> Result<Url, Error> {
    let mut url = Url::parse(&format!("{}/api{}", base_url, api))?;
    url.query_pairs_mut()
        .append_pair("api_key", api_key)
        .append_pair("application_key", app_key);
    Ok(url)
}

/// Serialize the payload up front so the bytes can be replayed on retry.
pub fn encode_request_body<B: Serialize + ?Sized>(
    body: Option<&B>,
) -> Result<Option<Vec<u8>>, Error> {
    body.map(serde_json::to_vec).transpose().map_err(Error::Encode)
}

pub fn new_json_request(method: Method, url: Url, body: Option<Vec<u8>>) -> Request {
    let mut req = Request::new(method, url);
    if let Some(bytes) = body {
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(Body::from(bytes));
    }
    req
}
