//! Remote command execution over a session's event log.
//!
//! Provides:
//! - Command payload building (interpreter marker + directives)
//! - `Dispatcher` - Submit a command event and poll for its output

pub mod command;
pub mod dispatcher;

pub use command::{CommandBuildError, CommandBuilder, ShellMode, parse_output};
pub use dispatcher::{CommandOutcome, CommandRequest, DispatchError, Dispatcher, PollState};
