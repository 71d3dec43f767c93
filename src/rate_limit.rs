use log::warn;
use reqwest::header::HeaderMap;
use std::time::Duration;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const PERIOD_HEADER: &str = "x-ratelimit-period";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota details reported by the API alongside a response.
///
/// Every field is zero when its header is missing or malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per period.
    pub limit: u64,
    /// Length of the rate-limit window.
    pub period: Duration,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Time until the window resets.
    pub reset: Duration,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: int_from_header(headers, LIMIT_HEADER),
            period: duration_from_header(headers, PERIOD_HEADER),
            remaining: int_from_header(headers, REMAINING_HEADER),
            reset: duration_from_header(headers, RESET_HEADER),
        }
    }
}

/// Metadata returned with every decoded response; reflects the final attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub rate_limit: RateLimit,
}

fn header_str<'a>(headers: &'a HeaderMap, key: &str) -> Result<&'a str, String> {
    let value = headers.get(key).ok_or_else(|| "header missing".to_string())?;
    value.to_str().map_err(|e| e.to_string())
}

fn int_from_header(headers: &HeaderMap, key: &str) -> u64 {
    let parsed = header_str(headers, key)
        .and_then(|s| s.trim().parse::<u64>().map_err(|e| e.to_string()));
    match parsed {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to parse rate limit header {}: {}", key, e);
            0
        }
    }
}

// Period and reset are read as (possibly fractional) seconds.
fn duration_from_header(headers: &HeaderMap, key: &str) -> Duration {
    let parsed = header_str(headers, key).and_then(|s| {
        let secs = s.trim().parse::<f64>().map_err(|e| e.to_string())?;
        Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
    });
    match parsed {
        Ok(d) => d,
        Err(e) => {
            warn!("failed to parse rate limit header {}: {}", key, e);
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderName;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(HeaderName::from_bytes(k.as_bytes()).unwrap(), v.parse().unwrap());
        }
        h
    }

    #[test]
    fn parses_all_fields() {
        let h = headers(&[
            ("X-RateLimit-Limit", "100"),
            ("X-RateLimit-Period", "60"),
            ("X-RateLimit-Remaining", "42"),
            ("X-RateLimit-Reset", "12.5"),
        ]);
        let rate = RateLimit::from_headers(&h);
        assert_eq!(rate.limit, 100);
        assert_eq!(rate.period, Duration::from_secs(60));
        assert_eq!(rate.remaining, 42);
        assert_eq!(rate.reset, Duration::from_millis(12_500));
    }

    #[test]
    fn missing_headers_are_zero() {
        assert_eq!(RateLimit::from_headers(&HeaderMap::new()), RateLimit::default());
    }

    #[test]
    fn non_numeric_headers_are_zero() {
        let h = headers(&[
            ("x-ratelimit-limit", "lots"),
            ("x-ratelimit-period", "soon"),
            ("x-ratelimit-remaining", "1.5"),
            ("x-ratelimit-reset", "-3"),
        ]);
        assert_eq!(RateLimit::from_headers(&h), RateLimit::default());
    }

    #[test]
    fn partial_headers_degrade_per_field() {
        let h = headers(&[("x-ratelimit-remaining", "7"), ("x-ratelimit-reset", "nope")]);
        let rate = RateLimit::from_headers(&h);
        assert_eq!(rate.remaining, 7);
        assert_eq!(rate.limit, 0);
        assert_eq!(rate.reset, Duration::ZERO);
    }
}
