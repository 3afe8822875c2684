//! HTTP client implementation.

use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    Deadline, HttpClientConfig, HttpClientError, HttpRequest, RateLimitHint, ReqwestTransport,
    RequestBuilder, Response, Result, Transport,
};

/// HTTP client with a client-wide deadline and transparent 429 handling.
///
/// The deadline starts when the client is constructed and is shared by
/// every clone, so a cloned client does not get a fresh budget.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: Arc<HttpClientConfig>,
    deadline: Deadline,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client that sends through a custom transport.
    pub fn with_transport(config: HttpClientConfig, transport: Arc<dyn Transport>) -> Self {
        let deadline = Deadline::after(config.client_timeout);
        Self {
            transport,
            config: Arc::new(config),
            deadline,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the client deadline.
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, url.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, url.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, url.into())
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PATCH, url.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, url.into())
    }

    /// Create a request builder with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, url.into())
    }

    /// Send a built request.
    ///
    /// Every attempt first checks the deadline and fails with
    /// [`HttpClientError::DeadlineExceeded`] without touching the network
    /// once it has passed. A 429 is retried after the server-supplied reset
    /// window; there is no attempt counter, only the deadline bounds the
    /// loop. Any other response is returned as-is.
    pub async fn execute(&self, request: &HttpRequest) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            if self.deadline.is_expired() {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt,
                    "client deadline exceeded"
                );
                return Err(HttpClientError::DeadlineExceeded {
                    timeout: self.deadline.budget(),
                });
            }

            attempt += 1;
            let response = self.transport.send(request).await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let hint = RateLimitHint::from_headers(response.headers());
            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                wait_secs = hint.wait.as_secs(),
                scope = ?hint.scope,
                "rate limited, backing off"
            );

            // Never sleep past the deadline; the next iteration reports it.
            tokio::time::sleep(hint.wait.min(self.deadline.remaining())).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{IP_RESET_HEADER, ORG_RESET_HEADER};
    use async_trait::async_trait;
    use http::{HeaderMap, HeaderValue};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replays a fixed script of responses and counts calls.
    struct ScriptedTransport {
        calls: AtomicUsize,
        script: Mutex<VecDeque<(StatusCode, HeaderMap)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<(StatusCode, HeaderMap)>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &HttpRequest) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (status, headers) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((StatusCode::OK, HeaderMap::new()));
            Ok(Response::new(
                request.method.clone(),
                request.url.clone(),
                status,
                headers,
                "{}",
            ))
        }
    }

    fn config(timeout: Duration) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url("https://api.example.com/v2")
            .client_timeout(timeout)
            .build()
    }

    fn reset_headers(org: &'static str, ip: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ORG_RESET_HEADER, HeaderValue::from_static(org));
        headers.insert(IP_RESET_HEADER, HeaderValue::from_static(ip));
        headers
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_skips_network() {
        let transport = ScriptedTransport::new(vec![]);
        let client = HttpClient::with_transport(config(Duration::from_secs(1)), transport.clone());

        tokio::time::advance(Duration::from_secs(2)).await;

        let err = client.get("/workspaces").send().await.unwrap_err();
        assert!(err.is_deadline_exceeded());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_is_retried_transparently() {
        let transport = ScriptedTransport::new(vec![(
            StatusCode::TOO_MANY_REQUESTS,
            reset_headers("0", "0"),
        )]);
        let client = HttpClient::with_transport(config(Duration::from_secs(60)), transport.clone());

        let response = client.get("/workspaces").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_for_org_window() {
        let transport = ScriptedTransport::new(vec![(
            StatusCode::TOO_MANY_REQUESTS,
            reset_headers("5", "1"),
        )]);
        let client = HttpClient::with_transport(config(Duration::from_secs(60)), transport.clone());

        let started = tokio::time::Instant::now();
        client.get("/workspaces").send().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_repeated_rate_limiting() {
        let script = (0..100)
            .map(|_| (StatusCode::TOO_MANY_REQUESTS, reset_headers("10", "0")))
            .collect();
        let transport = ScriptedTransport::new(script);
        let client = HttpClient::with_transport(config(Duration::from_secs(25)), transport.clone());

        let err = client.get("/workspaces").send().await.unwrap_err();
        assert!(err.is_deadline_exceeded());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_pass_through() {
        let transport = ScriptedTransport::new(vec![(StatusCode::NOT_FOUND, HeaderMap::new())]);
        let client = HttpClient::with_transport(config(Duration::from_secs(60)), transport.clone());

        let response = client.get("/splits").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_carries_auth_and_base_path() {
        struct Capture(Mutex<Option<HttpRequest>>);

        #[async_trait]
        impl Transport for Capture {
            async fn send(&self, request: &HttpRequest) -> Result<Response> {
                *self.0.lock().unwrap() = Some(request.clone());
                Ok(Response::new(
                    request.method.clone(),
                    request.url.clone(),
                    StatusCode::OK,
                    HeaderMap::new(),
                    "{}",
                ))
            }
        }

        let capture = Arc::new(Capture(Mutex::new(None)));
        let config = HttpClientConfig::builder()
            .base_url("https://api.example.com/internal/api/v2")
            .api_key_auth("pat.abc")
            .build();
        let client = HttpClient::with_transport(config, capture.clone());

        client
            .put("segments/prod/beta/uploadKeys")
            .query("replace", "true")
            .json(&serde_json::json!({"keys": ["a"]}))
            .send()
            .await
            .unwrap();

        let sent = capture.0.lock().unwrap().take().unwrap();
        assert_eq!(
            sent.url.as_str(),
            "https://api.example.com/internal/api/v2/segments/prod/beta/uploadKeys?replace=true"
        );
        assert_eq!(sent.headers.get("x-api-key").unwrap(), "pat.abc");
        assert!(sent.headers.get(http::header::AUTHORIZATION).is_none());
        assert_eq!(sent.body.unwrap().as_ref(), br#"{"keys":["a"]}"#);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = HttpClientConfig::builder()
            .base_url("https://api.example.com/v2/")
            .build();
        assert!(HttpClient::new(config).is_err());
    }
}
