//! Wire protocol for the vendor page service.
//!
//! Requests are positional JSON arrays; serde serialises tuples as arrays,
//! so each body is a typed tuple. String escaping is left to `serde_json`.

use remote_control_core::{
    ApiError, EventType, SessionDetails, SessionGroup, SessionId, SessionSummary, SessionType,
};
use serde::{Deserialize, Serialize};

use crate::sessions::NewUser;

/// `Services/` handler names.
pub mod service {
    pub const PAGE: &str = "PageService.ashx";
    pub const SECURITY: &str = "SecurityService.ashx";
}

/// Service method names.
pub mod method {
    pub const ADD_EVENT_TO_SESSIONS: &str = "AddEventToSessions";
    pub const GET_SESSION_DETAILS: &str = "GetSessionDetails";
    pub const GET_HOST_SESSION_INFO: &str = "GetHostSessionInfo";
    pub const UPDATE_SESSION_NAME: &str = "UpdateSessionName";
    /// Security service; creates the user when no previous name is given.
    pub const SAVE_USER: &str = "SaveUser";
}

/// `[group, [sessionId], eventType, data]`
pub type AddEventBody<'a> = (&'a SessionGroup, [SessionId; 1], i32, &'a str);

/// `[group, sessionId]`
pub type SessionDetailsBody<'a> = (&'a SessionGroup, SessionId);

/// `[sessionType, [group], search, null, limit]`
pub type HostSessionInfoBody<'a> = (i32, [&'a SessionGroup; 1], &'a str, Option<()>, u32);

/// `[group, sessionId, name]`
pub type UpdateSessionNameBody<'a> = (&'a SessionGroup, SessionId, &'a str);

/// `[previousName, name, password, passwordQuestion, displayName, comment, email, [securityGroup...], forcePasswordChange]`
pub type SaveUserBody<'a> = (
    Option<&'a str>,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a [String],
    bool,
);

#[must_use]
pub const fn add_event_body<'a>(
    group: &'a SessionGroup,
    session_id: SessionId,
    event_type: EventType,
    data: &'a str,
) -> AddEventBody<'a> {
    (group, [session_id], event_type.code(), data)
}

#[must_use]
pub const fn session_details_body(group: &SessionGroup, session_id: SessionId) -> SessionDetailsBody<'_> {
    (group, session_id)
}

#[must_use]
pub fn host_session_info_body<'a>(
    session_type: SessionType,
    group: &'a SessionGroup,
    search: &'a str,
    limit: u32,
) -> HostSessionInfoBody<'a> {
    (session_type.into(), [group], search, None, limit)
}

/// Body creating `user`. A null previous name tells the server this is a new user.
#[must_use]
pub fn save_user_body(user: &NewUser) -> SaveUserBody<'_> {
    (
        None,
        &user.username,
        &user.password,
        "",
        &user.display_name,
        &user.comment,
        &user.email,
        &user.security_groups,
        user.force_password_change,
    )
}

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(alias = "Message")]
    pub message: String,
}

/// Extract the vendor's error message from a response body.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.trim().is_empty())
}

/// Parse a `GetSessionDetails` response. `null` or an empty body means no such session.
///
/// # Errors
/// Returns error if the body is not valid session JSON.
pub fn parse_session_details(body: &str) -> Result<Option<SessionDetails>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<SessionDetails>>(body)?)
}

#[derive(Debug, Deserialize)]
struct HostSessionInfo {
    #[serde(rename = "Sessions", default)]
    sessions: Vec<SessionSummary>,
}

/// Parse a `GetHostSessionInfo` response.
///
/// # Errors
/// Returns error if the body is not valid JSON.
pub fn parse_host_session_info(body: &str) -> Result<Vec<SessionSummary>, ApiError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let info: Option<HostSessionInfo> = serde_json::from_str(body)?;
    Ok(info.map(|i| i.sessions).unwrap_or_default())
}
