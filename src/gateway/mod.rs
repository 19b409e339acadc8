//! Dispatch client for the remote messaging API
//!
//! One outbound call per recipient. Every failure mode (transport error,
//! timeout, non-ok status) is folded into [`DispatchOutcome::Failure`], so
//! callers never need error handling around a send.

use async_trait::async_trait;
use thiserror::Error;

mod http;

pub use http::HttpGateway;

/// Result of one dispatch attempt, produced exactly once per recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The remote call completed with an acceptable status
    Success,
    /// The call errored, timed out, or the remote rejected it
    Failure {
        /// Most specific diagnostic available: remote response body when
        /// present, else the status line or transport error
        reason: String,
    },
}

impl DispatchOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure { reason: reason.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Errors constructing a gateway (sending itself never errors past the trait)
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing instance id. Pass --instance or set gateway.instance-id in your config.")]
    MissingInstance,

    #[error("Access token not found: {0}")]
    Credentials(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Stateless message gateway - each call is independent
///
/// Implementations hold no mutable state across calls; a call is identified
/// only by its arguments. Exactly one network round-trip per call, no
/// automatic retry.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Attempt delivery of one rendered message to one recipient
    async fn send(&self, number: &str, body: &str) -> DispatchOutcome;
}
