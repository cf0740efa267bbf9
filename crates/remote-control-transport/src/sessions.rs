//! Single-request session operations.

use std::{fmt, time::SystemTime};

use remote_control_core::{
    ApiError, Clock, EventType, ProcessType, SessionApi, SessionDetails, SessionGroup, SessionId,
    SessionSummary, SessionType,
};

use crate::{
    ControlClient,
    protocol::{self, UpdateSessionNameBody, method, service},
};

/// Account to create on the server.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub email: String,
    pub comment: String,
    /// Security group (role) names the user joins.
    pub security_groups: Vec<String>,
    /// Require a password change at first login.
    pub force_password_change: bool,
}

impl NewUser {
    /// Create a user with only a login and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: String::new(),
            email: String::new(),
            comment: String::new(),
            security_groups: Vec::new(),
            force_password_change: false,
        }
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn security_groups<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.security_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn force_password_change(mut self, force: bool) -> Self {
        self.force_password_change = force;
        self
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("security_groups", &self.security_groups)
            .field("force_password_change", &self.force_password_change)
            .finish_non_exhaustive()
    }
}

impl ControlClient {
    /// Search sessions of one type within a group.
    ///
    /// # Errors
    /// Returns error if the request fails or the response is malformed.
    pub async fn search_sessions(
        &self,
        session_type: SessionType,
        group: &SessionGroup,
        search: &str,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, ApiError> {
        let body = protocol::host_session_info_body(session_type, group, search, limit);
        let text = self.post(method::GET_HOST_SESSION_INFO, &body).await?;
        protocol::parse_host_session_info(&text)
    }

    /// Rename a session.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn rename_session(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
        name: &str,
    ) -> Result<(), ApiError> {
        let body: UpdateSessionNameBody<'_> = (group, session_id, name);
        self.post(method::UPDATE_SESSION_NAME, &body).await?;
        Ok(())
    }

    /// Ask the server to send a wake-on-LAN to the session's machine.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn wake_session(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
    ) -> Result<(), ApiError> {
        self.submit_event(group, session_id, EventType::Wake, "")
            .await
    }

    /// End a session.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn end_session(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
    ) -> Result<(), ApiError> {
        self.submit_event(group, session_id, EventType::EndedSession, "")
            .await
    }

    /// Create a user account.
    ///
    /// # Errors
    /// Returns error if the username or password is blank, or the request fails.
    pub async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err(ApiError::InvalidRequest(
                "username and password are required".to_string(),
            ));
        }
        let body = protocol::save_user_body(user);
        self.post_to(service::SECURITY, method::SAVE_USER, &body)
            .await?;
        Ok(())
    }

    /// Local time the guest last connected or disconnected.
    ///
    /// `clock` is sampled right after the details arrive.
    ///
    /// # Errors
    /// Returns `NotFound` if the server knows no such session.
    pub async fn last_contact(
        &self,
        group: &SessionGroup,
        session_id: SessionId,
        clock: &impl Clock,
    ) -> Result<Option<SystemTime>, ApiError> {
        let details = self
            .session_details(group, session_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(session_id.to_string()))?;
        Ok(latest_guest_contact(&details, clock.now()))
    }
}

/// Latest guest connect/disconnect event, converted against `now`.
#[must_use]
pub fn latest_guest_contact(details: &SessionDetails, now: SystemTime) -> Option<SystemTime> {
    details
        .events_for(ProcessType::Guest)
        .filter(|e| matches!(e.event_type, EventType::Connected | EventType::Disconnected))
        .filter_map(|e| e.local_time(now))
        .max()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use axum::http::StatusCode;
    use remote_control_core::ManualClock;
    use serde_json::json;

    use super::*;
    use crate::test_support::StubServer;

    fn sid() -> SessionId {
        "6f1c2b1e-8a44-4c52-9d7a-0f6c1f7e9a10".parse().unwrap()
    }

    #[tokio::test]
    async fn test_search_sessions() {
        let server = StubServer::spawn(&[(
            method::GET_HOST_SESSION_INFO,
            StatusCode::OK,
            r#"{"Sessions":[{"SessionID":"6f1c2b1e-8a44-4c52-9d7a-0f6c1f7e9a10","Name":"FRONT-DESK","SessionType":2}]}"#,
        )])
        .await;

        let sessions = server
            .client()
            .search_sessions(SessionType::Access, &SessionGroup::all_machines(), "FRONT", 10)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].name, "FRONT-DESK");
        assert_eq!(
            server.requests()[0].body,
            json!([2, ["All Machines"], "FRONT", null, 10])
        );
    }

    #[tokio::test]
    async fn test_rename_wake_end() {
        let server = StubServer::spawn(&[
            (method::UPDATE_SESSION_NAME, StatusCode::OK, ""),
            (method::ADD_EVENT_TO_SESSIONS, StatusCode::OK, ""),
        ])
        .await;
        let client = server.client();
        let group = SessionGroup::all_machines();

        client.rename_session(&group, sid(), "PC \"2\"").await.unwrap();
        client.wake_session(&group, sid()).await.unwrap();
        client.end_session(&group, sid()).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0].body,
            json!(["All Machines", sid().to_string(), "PC \"2\""])
        );
        assert_eq!(requests[1].body[2], json!(43));
        assert_eq!(requests[2].body[2], json!(21));
    }

    #[tokio::test]
    async fn test_last_contact_unknown_session() {
        let server =
            StubServer::spawn(&[(method::GET_SESSION_DETAILS, StatusCode::OK, "null")]).await;
        let err = server
            .client()
            .last_contact(&SessionGroup::all_machines(), sid(), &ManualClock::new(UNIX_EPOCH))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_last_contact_uses_given_clock() {
        let server = StubServer::spawn(&[(
            method::GET_SESSION_DETAILS,
            StatusCode::OK,
            r#"{"Connections":[{"ProcessType":2,"Events":[{"EventType":11,"Time":45000}]}]}"#,
        )])
        .await;
        let now = UNIX_EPOCH + Duration::from_secs(2_000_000);

        let contact = server
            .client()
            .last_contact(&SessionGroup::all_machines(), sid(), &ManualClock::new(now))
            .await
            .unwrap();
        assert_eq!(contact, Some(now - Duration::from_secs(45)));
    }

    #[tokio::test]
    async fn test_create_user() {
        let server = StubServer::spawn(&[(method::SAVE_USER, StatusCode::OK, "")]).await;
        let user = NewUser::new("jdoe", "s3cr\"t")
            .display_name("Jane Doe")
            .email("jdoe@example.com")
            .security_groups(["Administrator", "Technician"])
            .force_password_change(true);

        server.client().create_user(&user).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].service, "SecurityService.ashx");
        assert_eq!(requests[0].method, "SaveUser");
        assert_eq!(
            requests[0].body,
            json!([
                null,
                "jdoe",
                "s3cr\"t",
                "",
                "Jane Doe",
                "",
                "jdoe@example.com",
                ["Administrator", "Technician"],
                true
            ])
        );
        assert!(!format!("{user:?}").contains("s3cr"));
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_login_and_surfaces_errors() {
        let server = StubServer::spawn(&[(
            method::SAVE_USER,
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message":"User already exists"}"#,
        )])
        .await;
        let client = server.client();

        let blank = client.create_user(&NewUser::new(" ", "pw")).await.unwrap_err();
        assert!(matches!(blank, ApiError::InvalidRequest(_)));
        assert!(server.requests().is_empty());

        let err = client.create_user(&NewUser::new("jdoe", "pw")).await.unwrap_err();
        assert_eq!(err.to_string(), "Transport error: User already exists");
    }

    #[test]
    fn test_latest_guest_contact_ignores_host_and_other_events() {
        let details: SessionDetails = serde_json::from_value(json!({
            "Connections": [
                {"ProcessType": 1, "Events": [{"EventType": 10, "Time": 1000}]},
                {"ProcessType": 2, "Events": [
                    {"EventType": 10, "Time": 60000},
                    {"EventType": 11, "Time": 30000},
                    {"EventType": 70, "Time": 10, "Data": "x"}
                ]}
            ]
        }))
        .unwrap();
        let now = UNIX_EPOCH + Duration::from_secs(1_000_000);

        assert_eq!(
            latest_guest_contact(&details, now),
            Some(now - Duration::from_secs(30))
        );
        assert_eq!(latest_guest_contact(&SessionDetails::default(), now), None);
    }
}
