//! Rate-limit back-off hints.
//!
//! A 429 from the admin API carries two reset windows in seconds: one for
//! the whole organization and one for the calling IP address. The
//! organization window is the wider block, so it wins whenever it is set.

use http::HeaderMap;
use std::time::Duration;

/// Organization-scoped reset window header.
pub const ORG_RESET_HEADER: &str = "x-ratelimit-reset-seconds-org";

/// Caller (IP) scoped reset window header.
pub const IP_RESET_HEADER: &str = "x-ratelimit-reset-seconds-ip";

/// Which window a back-off was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    /// The organization window.
    Organization,
    /// The caller IP window.
    Ip,
}

/// Back-off read from a rate-limited response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHint {
    /// How long to wait before retrying.
    pub wait: Duration,
    /// The window the wait came from.
    pub scope: RateLimitScope,
}

impl RateLimitHint {
    /// Read the hint from response headers.
    ///
    /// Missing or unparsable values count as zero.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let org = reset_seconds(headers, ORG_RESET_HEADER);
        if org != 0 {
            return Self {
                wait: Duration::from_secs(org),
                scope: RateLimitScope::Organization,
            };
        }

        Self {
            wait: Duration::from_secs(reset_seconds(headers, IP_RESET_HEADER)),
            scope: RateLimitScope::Ip,
        }
    }
}

fn reset_seconds(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(org: Option<&'static str>, ip: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(org) = org {
            headers.insert(ORG_RESET_HEADER, HeaderValue::from_static(org));
        }
        if let Some(ip) = ip {
            headers.insert(IP_RESET_HEADER, HeaderValue::from_static(ip));
        }
        headers
    }

    #[test]
    fn test_org_window_wins() {
        let hint = RateLimitHint::from_headers(&headers(Some("30"), Some("2")));
        assert_eq!(hint.wait, Duration::from_secs(30));
        assert_eq!(hint.scope, RateLimitScope::Organization);
    }

    #[test]
    fn test_zero_org_falls_back_to_ip() {
        let hint = RateLimitHint::from_headers(&headers(Some("0"), Some("4")));
        assert_eq!(hint.wait, Duration::from_secs(4));
        assert_eq!(hint.scope, RateLimitScope::Ip);
    }

    #[test]
    fn test_ip_only() {
        let hint = RateLimitHint::from_headers(&headers(None, Some("7")));
        assert_eq!(hint.wait, Duration::from_secs(7));
    }

    #[test]
    fn test_missing_and_garbage_are_zero() {
        assert_eq!(RateLimitHint::from_headers(&headers(None, None)).wait, Duration::ZERO);
        assert_eq!(
            RateLimitHint::from_headers(&headers(Some("soon"), Some("-1"))).wait,
            Duration::ZERO
        );
    }
}
