//! HTTP implementation of the message gateway
//!
//! Sends one POST per recipient to the remote messaging API. The target
//! resource is the configured base endpoint plus two query parameters: the
//! instance (session) identifier and the access token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GatewayConfig;

use super::{DispatchOutcome, GatewayError, MessageGateway};

/// Wire payload: a single-element message list
#[derive(Debug, Serialize)]
struct OutboundPayload<'a> {
    messages: Vec<OutboundMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    number: &'a str,
    message: &'a str,
}

/// Gateway that delivers messages over the remote HTTP API
pub struct HttpGateway {
    base_url: String,
    instance_id: String,
    token: String,
    http: Client,
}

impl HttpGateway {
    /// Create a gateway from configuration
    ///
    /// Resolves the access token (literal, environment variable, or file)
    /// and builds the shared HTTP client with the configured timeout.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        debug!(base_url = %config.base_url, instance_id = %config.instance_id, "from_config: called");
        if config.instance_id.trim().is_empty() {
            return Err(GatewayError::MissingInstance);
        }

        let token = config
            .resolve_token()
            .map_err(|e| GatewayError::Credentials(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            instance_id: config.instance_id.clone(),
            token,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/messages/chat", self.base_url)
    }
}

#[async_trait]
impl MessageGateway for HttpGateway {
    async fn send(&self, number: &str, body: &str) -> DispatchOutcome {
        let payload = OutboundPayload {
            messages: vec![OutboundMessage { number, message: body }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("instance", self.instance_id.as_str()), ("token", self.token.as_str())])
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                // Body is read as text in all cases; it is the failure
                // diagnostic when the status is not ok.
                let text = response.text().await.unwrap_or_default();

                if status.is_success() {
                    debug!(number, %status, "send: delivered");
                    DispatchOutcome::Success
                } else {
                    let reason = if text.trim().is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        text
                    };
                    warn!(number, %status, %reason, "send: remote rejected message");
                    DispatchOutcome::Failure { reason }
                }
            }
            Err(e) => {
                warn!(number, error = %e, "send: request failed");
                DispatchOutcome::Failure { reason: e.to_string() }
            }
        }
    }
}
