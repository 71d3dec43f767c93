use crate::error::Error;
use crate::types::StatusResponse;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

const EMPTY_OBJECT: &[u8] = b"{}";

/// Validate a fully read response and return the body to decode.
///
/// Non-2xx statuses fail with the status line and raw body. An empty body is
/// read as `{}`. A 2xx body whose envelope says `"status": "error"` fails with
/// the envelope's error text.
pub fn check_response(status: StatusCode, body: &[u8]) -> Result<&[u8], Error> {
    if !status.is_success() {
        return Err(Error::Status {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }
    let body = if body.is_empty() { EMPTY_OBJECT } else { body };

    let value: Value = serde_json::from_slice(body).map_err(Error::Decode)?;
    // Some endpoints answer with a bare array, which has no envelope. A
    // literal `null` carries nothing to inspect either.
    if value.is_array() || value.is_null() {
        return Ok(body);
    }
    let common: StatusResponse = serde_json::from_value(value).map_err(Error::Decode)?;
    if common.is_error() {
        return Err(Error::Api(common.error_message()));
    }
    Ok(body)
}

pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(Error::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Monitor {
        id: u64,
        name: String,
    }

    #[test]
    fn embedded_error_fails_despite_200() {
        let err =
            check_response(StatusCode::OK, br#"{"status":"error","error":"boom"}"#).unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn non_success_status_carries_status_line_and_body() {
        let err = check_response(StatusCode::NOT_FOUND, b"missing").unwrap_err();
        assert_eq!(err.to_string(), "API error 404 Not Found: missing");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let body = check_response(StatusCode::OK, b"").unwrap();
        assert_eq!(body, b"{}");
        let m: Monitor = decode_body(body).unwrap();
        assert_eq!(m, Monitor::default());
    }

    #[test]
    fn array_body_skips_envelope_check() {
        let body = check_response(StatusCode::OK, b"[]").unwrap();
        // A map target still rejects the array.
        assert!(matches!(
            decode_body::<HashMap<String, Value>>(body),
            Err(Error::Decode(_))
        ));
        let list: Vec<Monitor> = decode_body(body).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn array_shaped_like_envelope_is_not_an_error() {
        let body = check_response(StatusCode::OK, br#"["error","boom"]"#).unwrap();
        let list: Vec<String> = decode_body(body).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn null_body_skips_envelope_check() {
        let body = check_response(StatusCode::OK, b"null").unwrap();
        assert_eq!(body, b"null");
        let m: Option<Monitor> = decode_body(body).unwrap();
        assert_eq!(m, None);
    }

    #[test]
    fn scalar_body_is_not_tolerated() {
        assert!(matches!(
            check_response(StatusCode::OK, br#""text""#),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            check_response(StatusCode::OK, b"{not json"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn ok_status_passes_through() {
        let body =
            check_response(StatusCode::OK, br#"{"status":"ok","id":3,"name":"cpu"}"#).unwrap();
        let m: Monitor = decode_body(body).unwrap();
        assert_eq!(m.id, 3);
        assert_eq!(m.name, "cpu");
    }
}
