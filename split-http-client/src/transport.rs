//! The seam between the client and the wire.

use crate::{HttpClientConfig, HttpClientError, Response, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

/// A fully built request, ready to be sent (and re-sent on retry).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers, credentials included.
    pub headers: HeaderMap,
    /// Serialized body.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Executes a single HTTP exchange.
///
/// Implementations perform no retries; rate-limit handling and the
/// client deadline live in [`crate::HttpClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return whatever the server answered.
    async fn send(&self, request: &HttpRequest) -> Result<Response>;
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the underlying client from the configuration.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<Response> {
        let mut builder = self
            .inner
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        Response::from_reqwest(request.method.clone(), response).await
    }
}
