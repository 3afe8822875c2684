//! Request builder.

use crate::{HttpClient, HttpClientError, HttpRequest, Response, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

/// HTTP request builder.
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Result<Vec<u8>>>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.push((k.into(), v.into()));
        }
        self
    }

    /// Set the request body as JSON.
    ///
    /// Serialization failures are reported by [`RequestBuilder::send`].
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        self.body =
            Some(serde_json::to_vec(json).map_err(|e| HttpClientError::Json(e.to_string())));
        self
    }

    /// Resolve the URL against the client base and append query parameters.
    ///
    /// The base URL carries a path prefix, so relative paths are appended
    /// to it rather than resolved with URL join semantics.
    fn build_url(&self) -> Result<url::Url> {
        let raw = if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!(
                "{}/{}",
                self.client.config().base_url.trim_end_matches('/'),
                self.url.trim_start_matches('/')
            )
        };

        let mut url = url::Url::parse(&raw)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !self.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Build the request without sending it.
    pub fn build(self) -> Result<HttpRequest> {
        let url = self.build_url()?;
        let config = self.client.config();

        let mut request = HttpRequest::new(self.method, url);

        request.headers.insert(
            http::header::ACCEPT,
            header_value("accept", &config.accept)?,
        );
        if self.body.is_some() {
            request.headers.insert(
                http::header::CONTENT_TYPE,
                header_value("content-type", &config.content_type)?,
            );
        }

        for (name, value) in &config.default_headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|e| {
                HttpClientError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                }
            })?;
            let value = header_value(name.as_str(), value)?;
            request.headers.insert(name, value);
        }

        request.headers.extend(self.headers);

        if let Some(auth) = &config.auth {
            auth.apply(&mut request.headers)?;
        }

        if let Some(body) = self.body {
            request.body = Some(Bytes::from(body?));
        }

        Ok(request)
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response> {
        let client = self.client;
        let request = self.build()?;
        client.execute(&request).await
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| HttpClientError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}
