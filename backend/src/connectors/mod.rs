//! Clients for the upstream back-office services.
//!
//! Every public operation in this module is infallible from the caller's point
//! of view: network errors, timeouts, non-2xx statuses, undecodable bodies and
//! missing secrets are logged here and surface as empty collections or `None`.
//! The portal must stay usable while a back-office system is down.

pub mod forge;
pub mod ledger;
pub mod quoting;
pub mod transport;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use transport::{Method, UpstreamAuth, UpstreamRequest, UpstreamResponse, UpstreamTransport};

/// Failure of a single upstream call. Never leaves the connector boundary.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{upstream} is not configured")]
    NotConfigured { upstream: &'static str },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("undecodable response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Timeout tier of an outbound call, picked by expected payload and side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    /// Directory searches and other tiny lookups.
    Lookup,
    /// Regular JSON reads.
    Read,
    /// Calls with side effects on the upstream (links, cancellations).
    Action,
    /// Binary downloads such as PDFs.
    Download,
}

impl CallClass {
    pub fn timeout(self) -> Duration {
        match self {
            CallClass::Lookup => Duration::from_secs(6),
            CallClass::Read => Duration::from_secs(8),
            CallClass::Action => Duration::from_secs(15),
            CallClass::Download => Duration::from_secs(30),
        }
    }
}

/// A binary document fetched from an upstream.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Accepts an id for use as a single URL path segment.
pub(crate) fn path_segment(id: &str) -> Option<&str> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    valid.then_some(id)
}

/// Base URL plus transport for one upstream, with status and decode handling
/// shared by every client.
#[derive(Clone)]
pub(crate) struct Gateway {
    upstream: &'static str,
    base_url: String,
    transport: Arc<dyn UpstreamTransport>,
}

impl Gateway {
    pub(crate) fn new(
        upstream: &'static str,
        base_url: &str,
        transport: Arc<dyn UpstreamTransport>,
    ) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth: UpstreamAuth,
        query: &[(&str, &str)],
        body: Option<Value>,
        class: CallClass,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let request = UpstreamRequest {
            method,
            url: url.clone(),
            auth,
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
            timeout: class.timeout(),
        };

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::error!("[{}] {} failed: {}", self.upstream, path, e);
            e
        })?;

        if !response.is_success() {
            tracing::warn!("[{}] {} returned {}", self.upstream, path, response.status);
            return Err(UpstreamError::Status {
                status: response.status,
                url,
            });
        }

        Ok(response)
    }

    fn decode(&self, path: &str, response: UpstreamResponse) -> Result<Value, UpstreamError> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            tracing::error!("[{}] {} returned invalid JSON: {}", self.upstream, path, e);
            UpstreamError::Decode {
                url: path.to_string(),
                message: e.to_string(),
            }
        })
    }

    pub(crate) async fn get_json(
        &self,
        path: &str,
        auth: UpstreamAuth,
        query: &[(&str, &str)],
        class: CallClass,
    ) -> Result<Value, UpstreamError> {
        let response = self.send(Method::Get, path, auth, query, None, class).await?;
        self.decode(path, response)
    }

    pub(crate) async fn post_json(
        &self,
        path: &str,
        auth: UpstreamAuth,
        body: Value,
        class: CallClass,
    ) -> Result<Value, UpstreamError> {
        let response = self
            .send(Method::Post, path, auth, &[], Some(body), class)
            .await?;
        self.decode(path, response)
    }

    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        auth: UpstreamAuth,
        query: &[(&str, &str)],
        class: CallClass,
    ) -> Result<Download, UpstreamError> {
        let response = self.send(Method::Get, path, auth, query, None, class).await?;
        Ok(Download {
            content_type: response
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: response.body,
        })
    }
}
