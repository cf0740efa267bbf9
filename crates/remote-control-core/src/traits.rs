//! Core traits for talking to the remote session API.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::{EventType, SessionDetails, SessionGroup, SessionId};

/// Remote API error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure or non-2xx response. `message` is the vendor's own
    /// error message when the response carried one.
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    /// Rejected locally before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Build a transport error without an HTTP status.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// The two vendor endpoints command execution is built on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Append an event to a session's log.
    async fn submit_event(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
        event_type: EventType,
        data: &str,
    ) -> Result<(), ApiError>;

    /// Fetch the full event history of a session.
    ///
    /// Returns `Ok(None)` when the server knows no such session.
    async fn session_details(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
    ) -> Result<Option<SessionDetails>, ApiError>;
}

#[async_trait]
impl<T: SessionApi + ?Sized> SessionApi for Arc<T> {
    async fn submit_event(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
        event_type: EventType,
        data: &str,
    ) -> Result<(), ApiError> {
        (**self).submit_event(group, session_id, event_type, data).await
    }

    async fn session_details(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
    ) -> Result<Option<SessionDetails>, ApiError> {
        (**self).session_details(group, session_id).await
    }
}
