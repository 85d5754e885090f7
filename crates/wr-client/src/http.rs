//! HTTP transport backed by reqwest

use crate::error::TransportError;
use crate::transport::{ApiRequest, Method, Transport};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

/// JSON-over-HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Create transport for `base_url` with a per-request timeout
    ///
    /// # Errors
    /// - `TransportError::InvalidUrl` if the URL does not parse or cannot
    ///   carry a path
    /// - `TransportError::Connection` if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a request, path arguments percent-encoded
    ///
    /// # Errors
    /// `TransportError::InvalidUrl` if the base URL cannot carry a path
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(request.segments());
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request)?;
        let path = request.display_path();
        tracing::debug!(method = ?request.method(), %path, "sending backend request");

        let builder = match request.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(path));
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                path,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
