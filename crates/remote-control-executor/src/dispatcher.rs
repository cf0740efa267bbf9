//! Command dispatch and result polling.
//!
//! The vendor protocol carries no request id. A command is correlated with
//! its output by time alone: the earliest command-output event timestamped
//! strictly after the command-submitted event wins. Two commands in flight on
//! the same session can therefore see each other's output.

use std::time::{Duration, SystemTime};

use remote_control_core::{
    ApiError, Clock, Event, EventType, SessionApi, SessionDetails, SessionGroup, SessionId,
    SystemClock,
};
use thiserror::Error;

use crate::command::{CommandBuildError, CommandBuilder, parse_output};

/// Delay between session-detail fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Slack added to the local deadline for clock and propagation skew.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// Dispatch error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Command build error: {0}")]
    Build(#[from] CommandBuildError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("No command output within {0:?}")]
    TimedOut(Duration),
    /// Timeout plus grace does not fit on the clock. The command was
    /// already submitted when this is reported.
    #[error("Polling deadline out of range for timeout {0:?}")]
    DeadlineOutOfRange(Duration),
}

/// A command to run on one session.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Group the session is looked up in.
    pub group: SessionGroup,
    /// Target session.
    pub session_id: SessionId,
    /// Command text, interpreter and timeout.
    pub command: CommandBuilder,
}

impl CommandRequest {
    #[must_use]
    pub const fn new(group: SessionGroup, session_id: SessionId, command: CommandBuilder) -> Self {
        Self {
            group,
            session_id,
            command,
        }
    }
}

/// Result of a dispatched command.
///
/// A timeout is not an error here: the command was accepted and may still
/// finish on the guest later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Captured output with the echoed command line removed.
    Output(Vec<String>),
    /// No output arrived before the local deadline.
    TimedOut {
        /// Local time the command event was recorded at.
        submitted_at: SystemTime,
        /// Time spent between submission and giving up.
        waited: Duration,
    },
}

impl CommandOutcome {
    /// Treat a timeout as a failure.
    ///
    /// # Errors
    /// Returns `DispatchError::TimedOut` for a timed out outcome.
    pub fn into_result(self) -> Result<Vec<String>, DispatchError> {
        match self {
            Self::Output(lines) => Ok(lines),
            Self::TimedOut { waited, .. } => Err(DispatchError::TimedOut(waited)),
        }
    }
}

/// Dispatch state.
#[derive(Debug)]
pub enum PollState {
    /// Event accepted; `requested_at` is local time just before submission.
    Submitted { requested_at: SystemTime },
    /// Waiting for a command-output event.
    Polling {
        /// Local time of the command-submitted event.
        submitted_at: SystemTime,
        /// Local time after which polling stops.
        deadline: SystemTime,
        /// Number of fetches already made in this state.
        attempt: u32,
    },
    /// Output found; holds the parsed lines.
    Matched(Vec<String>),
    /// Deadline passed without output.
    TimedOut { submitted_at: SystemTime },
    /// Submission or a fetch failed.
    Failed(DispatchError),
}

impl PollState {
    const fn name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Polling { .. } => "polling",
            Self::Matched(_) => "matched",
            Self::TimedOut { .. } => "timed_out",
            Self::Failed(_) => "failed",
        }
    }
}

/// Submits command events and polls for their output.
pub struct Dispatcher<A, C = SystemClock>
where
    A: SessionApi,
    C: Clock,
{
    api: A,
    clock: C,
    poll_interval: Duration,
    grace: Duration,
}

impl<A: SessionApi> Dispatcher<A> {
    /// Create a dispatcher on the system clock.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self {
            api,
            clock: SystemClock,
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace: DEFAULT_GRACE,
        }
    }
}

impl<A, C> Dispatcher<A, C>
where
    A: SessionApi,
    C: Clock,
{
    /// Replace the clock.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Dispatcher<A, C2> {
        Dispatcher {
            api: self.api,
            clock,
            poll_interval: self.poll_interval,
            grace: self.grace,
        }
    }

    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub const fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run a command and wait for its output.
    ///
    /// Exactly one command event is appended to the session. Nothing is
    /// retried; a failed submission returns before any polling.
    ///
    /// # Errors
    /// Returns error if the payload is invalid, an API call fails, or the
    /// session is unknown.
    pub async fn run_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandOutcome, DispatchError> {
        let payload = request.command.build()?;
        let timeout = request.command.timeout;

        let mut state = self.submit(request, &payload).await;
        loop {
            tracing::debug!(session = %request.session_id, state = state.name(), "dispatch state");
            state = match state {
                PollState::Submitted { requested_at } => {
                    self.resolve_submission(request, requested_at, timeout)
                        .await
                }
                PollState::Polling {
                    submitted_at,
                    deadline,
                    attempt,
                } => self.poll(request, submitted_at, deadline, attempt).await,
                PollState::Matched(lines) => {
                    tracing::info!(
                        session = %request.session_id,
                        lines = lines.len(),
                        "command output received"
                    );
                    return Ok(CommandOutcome::Output(lines));
                }
                PollState::TimedOut { submitted_at } => {
                    let waited = self
                        .clock
                        .now()
                        .duration_since(submitted_at)
                        .unwrap_or_default();
                    tracing::warn!(
                        session = %request.session_id,
                        ?timeout,
                        "no command output before deadline"
                    );
                    return Ok(CommandOutcome::TimedOut {
                        submitted_at,
                        waited,
                    });
                }
                PollState::Failed(e) => return Err(e),
            };
        }
    }

    async fn submit(&self, request: &CommandRequest, payload: &str) -> PollState {
        let requested_at = self.clock.now();
        match self
            .api
            .submit_event(
                &request.group,
                request.session_id,
                EventType::CommandSubmitted,
                payload,
            )
            .await
        {
            Ok(()) => PollState::Submitted { requested_at },
            Err(e) => PollState::Failed(e.into()),
        }
    }

    async fn resolve_submission(
        &self,
        request: &CommandRequest,
        requested_at: SystemTime,
        timeout: Duration,
    ) -> PollState {
        let details = match self.fetch(request).await {
            Ok(details) => details,
            Err(e) => return PollState::Failed(e),
        };
        let submitted_at =
            submission_time(&details, self.clock.now()).unwrap_or(requested_at);
        let deadline = timeout
            .checked_add(self.grace)
            .and_then(|budget| self.clock.now().checked_add(budget));
        match deadline {
            Some(deadline) => PollState::Polling {
                submitted_at,
                deadline,
                attempt: 0,
            },
            None => PollState::Failed(DispatchError::DeadlineOutOfRange(timeout)),
        }
    }

    async fn poll(
        &self,
        request: &CommandRequest,
        submitted_at: SystemTime,
        deadline: SystemTime,
        attempt: u32,
    ) -> PollState {
        let details = match self.fetch(request).await {
            Ok(details) => details,
            Err(e) => return PollState::Failed(e),
        };
        if let Some(event) = find_output(&details, submitted_at, self.clock.now()) {
            return PollState::Matched(parse_output(event.data.as_deref().unwrap_or_default()));
        }
        tracing::debug!(session = %request.session_id, attempt, "no command output yet");

        self.clock.sleep(self.poll_interval).await;
        if self.clock.now() > deadline {
            PollState::TimedOut { submitted_at }
        } else {
            PollState::Polling {
                submitted_at,
                deadline,
                attempt: attempt + 1,
            }
        }
    }

    async fn fetch(&self, request: &CommandRequest) -> Result<SessionDetails, DispatchError> {
        self.api
            .session_details(&request.group, request.session_id)
            .await?
            .ok_or(DispatchError::NotFound(request.session_id))
    }
}

/// Local time of the most recent command-submitted event.
#[must_use]
pub fn submission_time(details: &SessionDetails, now: SystemTime) -> Option<SystemTime> {
    details
        .events_of_type(EventType::CommandSubmitted)
        .filter_map(|e| e.local_time(now))
        .max()
}

/// Earliest command-output event strictly after `submitted_at`.
///
/// Events without a `Time` are skipped. Equal timestamps keep encounter order.
#[must_use]
pub fn find_output(
    details: &SessionDetails,
    submitted_at: SystemTime,
    now: SystemTime,
) -> Option<&Event> {
    details
        .events_of_type(EventType::CommandOutput)
        .filter_map(|e| e.local_time(now).map(|t| (t, e)))
        .filter(|(t, _)| *t > submitted_at)
        .min_by_key(|(t, _)| *t)
        .map(|(_, e)| e)
}
