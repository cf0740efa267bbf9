//! Core abstractions for a remote-control session API client.
//!
//! This crate provides the fundamental building blocks:
//! - `SessionDetails`, `Connection`, `Event` - The vendor's session event log
//! - `EventType`, `ProcessType` - Integer-coded discriminators
//! - `Clock` - Injectable wall clock and sleep
//! - `SessionApi` - The "submit event / fetch details" seam

pub mod clock;
pub mod session;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{
    Connection, Event, EventType, ProcessType, SessionDetails, SessionGroup, SessionId,
    SessionSummary, SessionType,
};
pub use traits::{ApiError, SessionApi};
