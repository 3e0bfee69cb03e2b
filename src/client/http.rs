//! reqwest-backed transport with bearer auth and a single timeout retry.

use std::time::Duration;

use tracing::debug;

use crate::types::Method;

use super::{ApiTransport, OutboundRequest, SendOutcome, TransportError};

/// Transport tuning knobs.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API origin plus any path prefix, e.g. `https://api.example.com/api`.
    pub base_url: String,
    /// Total per-request deadline. Generous by default: the remote may be a
    /// cold-starting free-tier server that takes tens of seconds to wake.
    pub request_timeout: Duration,
    /// Connection establishment deadline.
    pub connect_timeout: Duration,
}

impl HttpClientConfig {
    /// Defaults for everything except the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Errors constructing an [`HttpApiClient`].
#[derive(Debug)]
pub struct ClientBuildError(reqwest::Error);

impl std::fmt::Display for ClientBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "http client build failed: {}", self.0)
    }
}

/// [`ApiTransport`] over `reqwest::blocking`.
pub struct HttpApiClient {
    config: HttpClientConfig,
    client: reqwest::blocking::Client,
}

impl HttpApiClient {
    /// Builds a client from `config`.
    pub fn new(config: HttpClientConfig) -> Result<Self, ClientBuildError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientBuildError)?;
        Ok(Self { config, client })
    }

    fn issue(&self, request: &OutboundRequest) -> Result<SendOutcome, TransportError> {
        let url = join_url(&self.config.base_url, &request.target);
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .bearer_auth(&request.bearer);
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        match builder.send() {
            Ok(response) => Ok(SendOutcome {
                status: response.status().as_u16(),
            }),
            Err(err) if err.is_timeout() => Err(TransportError::Timeout),
            Err(err) => Err(TransportError::Network(err.to_string())),
        }
    }
}

impl ApiTransport for HttpApiClient {
    /// One automatic retry, and only for failures without a server response.
    /// A response of any status is authoritative: retrying it blindly could
    /// apply a non-idempotent mutation twice.
    fn send(&mut self, request: &OutboundRequest) -> Result<SendOutcome, TransportError> {
        send_with_retry(request, |req| self.issue(req))
    }
}

/// Drives `attempt` under the retry rule: a server response of any status is
/// returned as-is, a no-response failure gets exactly one more attempt.
fn send_with_retry<F>(
    request: &OutboundRequest,
    mut attempt: F,
) -> Result<SendOutcome, TransportError>
where
    F: FnMut(&OutboundRequest) -> Result<SendOutcome, TransportError>,
{
    match attempt(request) {
        Ok(outcome) => Ok(outcome),
        Err(first) => {
            debug!(target_path = %request.target, error = %first, "retrying after transport failure");
            attempt(request)
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn join_url(base: &str, target: &str) -> String {
    let base = base.trim_end_matches('/');
    let target = target.trim_start_matches('/');
    format!("{base}/{target}")
}
