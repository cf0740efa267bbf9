//! Session, connection and event types as reported by the vendor.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Session identifier (vendor GUID).
pub type SessionId = uuid::Uuid;

/// Named partition of sessions the API requires as a query scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionGroup(String);

impl SessionGroup {
    /// Group holding every unattended access session.
    pub const ALL_MACHINES: &'static str = "All Machines";
    /// Group holding every session regardless of type.
    pub const ALL_SESSIONS: &'static str = "All Sessions";

    /// Create a group from its display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The "All Machines" group.
    #[must_use]
    pub fn all_machines() -> Self {
        Self::new(Self::ALL_MACHINES)
    }

    /// The "All Sessions" group.
    #[must_use]
    pub fn all_sessions() -> Self {
        Self::new(Self::ALL_SESSIONS)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionGroup {
    fn default() -> Self {
        Self::all_machines()
    }
}

impl fmt::Display for SessionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionGroup {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SessionGroup {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Event type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum EventType {
    /// Guest or host connected.
    Connected,
    /// Guest or host disconnected.
    Disconnected,
    /// Session ended by the host.
    EndedSession,
    /// Wake-on-LAN requested.
    Wake,
    /// Command queued for the guest to run.
    CommandSubmitted,
    /// Console output captured from a queued command.
    CommandOutput,
    /// Any code this client does not interpret.
    Other(i32),
}

impl EventType {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Connected => 10,
            Self::Disconnected => 11,
            Self::EndedSession => 21,
            Self::Wake => 43,
            Self::CommandSubmitted => 44,
            Self::CommandOutput => 70,
            Self::Other(code) => code,
        }
    }
}

impl From<i32> for EventType {
    fn from(code: i32) -> Self {
        match code {
            10 => Self::Connected,
            11 => Self::Disconnected,
            21 => Self::EndedSession,
            43 => Self::Wake,
            44 => Self::CommandSubmitted,
            70 => Self::CommandOutput,
            other => Self::Other(other),
        }
    }
}

impl From<EventType> for i32 {
    fn from(event_type: EventType) -> Self {
        event_type.code()
    }
}

/// Which side of a session a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ProcessType {
    /// Technician side (code 1).
    Host,
    /// Remote machine side (code 2).
    Guest,
    /// Any code this client does not interpret.
    Other(i32),
}

impl From<i32> for ProcessType {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::Host,
            2 => Self::Guest,
            other => Self::Other(other),
        }
    }
}

impl From<ProcessType> for i32 {
    fn from(process_type: ProcessType) -> Self {
        match process_type {
            ProcessType::Host => 1,
            ProcessType::Guest => 2,
            ProcessType::Other(code) => code,
        }
    }
}

/// Kind of session returned by a session search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SessionType {
    /// Ad-hoc support session (code 0).
    Support,
    /// Meeting session (code 1).
    Meeting,
    /// Unattended access session (code 2).
    Access,
    /// Any code this client does not interpret.
    Other(i32),
}

impl From<i32> for SessionType {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Support,
            1 => Self::Meeting,
            2 => Self::Access,
            other => Self::Other(other),
        }
    }
}

impl From<SessionType> for i32 {
    fn from(session_type: SessionType) -> Self {
        match session_type {
            SessionType::Support => 0,
            SessionType::Meeting => 1,
            SessionType::Access => 2,
            SessionType::Other(code) => code,
        }
    }
}

/// A single record in a connection's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// What happened.
    pub event_type: EventType,
    /// Milliseconds between the event and the moment the server produced the response.
    #[serde(default)]
    pub time: Option<i64>,
    /// Payload, e.g. command text or captured console output.
    #[serde(default)]
    pub data: Option<String>,
}

impl Event {
    /// Convert the server-relative `Time` into local wall time.
    ///
    /// `now` must be sampled freshly for the response this event came from,
    /// since the server reports age rather than an absolute instant.
    /// Returns `None` when the server sent no `Time`.
    #[must_use]
    pub fn local_time(&self, now: SystemTime) -> Option<SystemTime> {
        let age_ms = u64::try_from(self.time?).unwrap_or(0);
        Some(
            now.checked_sub(Duration::from_millis(age_ms))
                .unwrap_or(UNIX_EPOCH),
        )
    }
}

/// One guest or host pairing within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    /// Side of the session this connection belongs to.
    pub process_type: ProcessType,
    /// Append-only event log, oldest first.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Full connection and event history of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionDetails {
    /// Connections in server order.
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl SessionDetails {
    /// Events of one type across all connections, in encounter order.
    pub fn events_of_type(&self, event_type: EventType) -> impl Iterator<Item = &Event> {
        self.connections
            .iter()
            .flat_map(|c| c.events.iter())
            .filter(move |e| e.event_type == event_type)
    }

    /// Events from connections of one process type.
    pub fn events_for(&self, process_type: ProcessType) -> impl Iterator<Item = &Event> {
        self.connections
            .iter()
            .filter(move |c| c.process_type == process_type)
            .flat_map(|c| c.events.iter())
    }
}

/// Session row returned by a session search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    /// Display name; empty when the server sends none.
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "SessionType")]
    pub session_type: SessionType,
}
