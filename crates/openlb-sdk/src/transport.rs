//! HTTP transport.
//!
//! [`HttpTransport`] executes one request at a time against the
//! identity and load-balancer APIs: it attaches the `X-Auth-Token`
//! header, serialises JSON bodies, logs at debug level, and classifies
//! every non-success response through a swappable [`Classifier`]. No
//! raw transport error ever reaches a caller unclassified.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, Classifier, Error};

/// Default per-call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 600.0;

// ---------------------------------------------------------------------------
// TransportConfig
// ---------------------------------------------------------------------------

/// Connection-level settings shared by every call.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-call timeout; covers connect through body read.
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// PEM bundle to trust in addition to the system roots.
    pub cacert: Option<PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            insecure: false,
            cacert: None,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpResponse
// ---------------------------------------------------------------------------

/// A fully-buffered HTTP response.
///
/// The transport reads the body eagerly so classification and parsing
/// never perform further I/O.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    /// Assemble a response from its parts.
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            headers,
            body: body.into(),
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// A response header by name (case-insensitive), when it is valid
    /// UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The raw body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// The shared HTTP client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    classifier: Classifier,
}

impl HttpTransport {
    /// Build a transport from connection settings.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(path) = &config.cacert {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                Error::Config(format!("invalid CA certificate {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(HttpTransport {
            client,
            classifier: ApiError::from_response,
        })
    }

    /// Replace the response classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// `GET` without a body.
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<HttpResponse, Error> {
        self.execute(Method::GET, url, token, None).await
    }

    /// `DELETE` without a body.
    pub async fn delete(&self, url: &str, token: Option<&str>) -> Result<HttpResponse, Error> {
        self.execute(Method::DELETE, url, token, None).await
    }

    /// `POST` with a JSON body.
    pub async fn post<B: Serialize>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, url, token, Some(body)).await
    }

    /// `PUT` with a JSON body.
    pub async fn put<B: Serialize>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, url, token, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse, Error> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = token {
            request = request.header("X-Auth-Token", token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        // Bodies are not logged; auth requests carry credentials.
        debug!(%method, url, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(ApiError::connection(method.as_str(), url, e)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Api(ApiError::connection(method.as_str(), url, e)))?;
        debug!(%method, url, status, "received response");

        let response = HttpResponse::new(status, headers, text);
        if status >= 400 {
            return Err(Error::Api((self.classifier)(
                method.as_str(),
                url,
                &response,
            )));
        }
        Ok(response)
    }
}

/// Join a base URL and a path without doubling or dropping slashes.
pub fn concat_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_matches('/'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
