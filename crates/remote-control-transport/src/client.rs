//! HTTP client for the vendor page service.

use async_trait::async_trait;
use remote_control_core::{ApiError, EventType, SessionApi, SessionDetails, SessionGroup, SessionId};
use serde::Serialize;

use crate::{
    config::{ClientConfig, ConfigError},
    protocol::{self, method, service},
};

/// Client bound to one vendor server.
///
/// Every call is a single JSON POST with basic auth. Nothing is retried:
/// event submission is not idempotent, so retries are the caller's decision.
#[derive(Debug, Clone)]
pub struct ControlClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ControlClient {
    /// Create a client from its configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built with the requested TLS policy.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone());
        if let Some(version) = config.min_tls_version {
            builder = builder.min_tls_version(version.to_reqwest());
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST a JSON body to a page-service method and return the raw response text.
    pub(crate) async fn post<B>(&self, method: &str, body: &B) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post_to(service::PAGE, method, body).await
    }

    /// POST a JSON body to a method of any service handler.
    pub(crate) async fn post_to<B>(
        &self,
        service: &str,
        method: &str,
        body: &B,
    ) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.config.service_endpoint(service, method);
        tracing::debug!(%url, "POST {method}");

        let response = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.config.credentials.authorization_header(),
            )
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            status: Some(status.as_u16()),
            message: format!("{method} response unreadable: {e}"),
        })?;

        if !status.is_success() {
            let message = protocol::error_message(&text).unwrap_or_else(|| {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    status.to_string()
                } else {
                    trimmed.to_string()
                }
            });
            tracing::debug!(status = status.as_u16(), "{method} failed: {message}");
            return Err(ApiError::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl SessionApi for ControlClient {
    async fn submit_event(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
        event_type: EventType,
        data: &str,
    ) -> Result<(), ApiError> {
        let body = protocol::add_event_body(group, session_id, event_type, data);
        self.post(method::ADD_EVENT_TO_SESSIONS, &body).await?;
        Ok(())
    }

    async fn session_details(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
    ) -> Result<Option<SessionDetails>, ApiError> {
        let body = protocol::session_details_body(group, session_id);
        let text = self.post(method::GET_SESSION_DETAILS, &body).await?;
        protocol::parse_session_details(&text)
    }
}
