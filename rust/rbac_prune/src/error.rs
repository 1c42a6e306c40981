//! Error types for the cluster REST client.
//!
//! HTTP statuses are mapped onto typed variants so callers can tell a missing
//! binding from a stale write or an unreachable server.

use std::path::PathBuf;

use rbac_core::ReconcileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeClientError {
    /// HTTP 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 401: missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403: authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// HTTP 409: the binding changed since it was listed.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP 429.
    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    /// Any other non-success status.
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Malformed response body.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// CA bundle could not be read.
    #[error("Cannot read certificate authority {path:?}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KubeClientError {
    /// Map a non-success status and its body. The API server usually answers
    /// with a `Status` object; its `message` is preferred over the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = status_message(body).unwrap_or_else(|| body.trim().to_string());
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            429 => Self::RateLimited,
            _ => Self::ServerError { status, message },
        }
    }

    /// Check if error is transient and potentially retry-able.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited => true,
            Self::ServerError { status, .. } => (500..600).contains(status),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::Conflict(_)
            | Self::InvalidResponse(_)
            | Self::Certificate { .. }
            | Self::Json(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Advice for the operator after a failed write.
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_conflict() {
            Some("the role binding changed since it was listed; rerun to act on its current version")
        } else if self.is_not_found() {
            Some("the role binding was removed by someone else during the run")
        } else if self.is_transient() {
            Some("the API server looks temporarily unavailable; rerunning is safe")
        } else {
            None
        }
    }
}

/// Hint for a failed run whose cause is a [`KubeClientError`].
pub fn failure_hint(err: &ReconcileError) -> Option<&'static str> {
    std::error::Error::source(err)?
        .downcast_ref::<KubeClientError>()?
        .hint()
}

fn status_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct Status {
        message: Option<String>,
    }

    serde_json::from_str::<Status>(body)
        .ok()
        .and_then(|status| status.message)
        .filter(|message| !message.is_empty())
}
