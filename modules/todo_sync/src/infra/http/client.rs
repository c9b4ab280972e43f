//! Shared HTTP plumbing for the todo API adapters.
//!
//! Each request reads the bearer token from storage at send time, carries a
//! `traceparent` header and runs inside an `outgoing_http` span.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, field, warn, Instrument, Level};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::ports::storage::keys;
use crate::domain::ports::KeyValueStore;
use crate::infra::http::envelope::{error_message, ApiEnvelope};
use crate::infra::http::trace;

pub struct ApiClient {
    inner: reqwest::Client,
    base: Url,
    storage: Arc<dyn KeyValueStore>,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        storage: Arc<dyn KeyValueStore>,
        request_timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let base = Url::parse(base_url)
            .map_err(|e| DomainError::validation("api.base_url", e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(DomainError::validation(
                "api.base_url",
                "must be an absolute http(s) URL",
            ));
        }
        Ok(Self {
            inner: reqwest::Client::new(),
            base,
            storage,
            request_timeout,
            upload_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{segments...}`; segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, DomainError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::validation("api.base_url", "invalid base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a server-returned URL that may be relative to the base.
    pub fn absolute(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(abs) => abs.to_string(),
            Err(_) => self
                .base
                .join(url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| url.to_string()),
        }
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .request(method, url)
            .timeout(self.request_timeout)
    }

    /// Same as [`request`](Self::request) with the longer upload timeout.
    pub fn upload_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.request(method, url).timeout(self.upload_timeout)
    }

    /// Send and decode the `{success, data, error}` envelope.
    pub async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, DomainError> {
        let response = self.execute(builder).await?;
        read_envelope(response).await
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, DomainError> {
        let builder = match self.storage.get(keys::AUTH_TOKEN).await {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(e) => {
                warn!("Could not read auth token, sending without it: {}", e);
                builder
            }
        };

        let mut request = builder
            .build()
            .map_err(|e| DomainError::validation("request", e.to_string()))?;
        trace::inject_trace_context(request.headers_mut());
        let trace_id = request
            .headers()
            .get(trace::TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(trace::parse_trace_id)
            .unwrap_or_default()
            .to_string();

        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %request.method(),
            http.url = %request.url(),
            http.status_code = field::Empty,
            trace_id = %trace_id,
            otel.kind = "client",
        );

        let response = self
            .inner
            .execute(request)
            .instrument(span.clone())
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        span.record("http.status_code", status);
        span.in_scope(|| debug!(status, "Response received"));
        Ok(response)
    }
}

fn map_transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::Timeout
    } else {
        DomainError::network(e.to_string())
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiEnvelope<T>, DomainError> {
    let status = response.status();
    let body = response.text().await.map_err(map_transport_error)?;

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| format!("HTTP {}", status));
        return Err(DomainError::api(Some(status.as_u16()), message));
    }

    serde_json::from_str(&body).map_err(|e| DomainError::malformed(e.to_string()))
}
