use crate::services::InjectionError;
use std::fmt;
use std::time::Duration;

/// Identifier assigned by the session manager, unique for the manager's lifetime.
pub type SessionId = u64;

/// Lifecycle of one clicking session.
///
/// ```text
/// Idle ──(position set)──> Positioning ──> Running ──> Completed
///   └────────────────────────────────────────┘  │          ▲
///                                               └─> Stopping
/// ```
///
/// `Completed` is terminal; a session is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Positioning,
    Running,
    Stopping,
    Completed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == SessionState::Completed
    }

    /// Whether the loop may move from `self` to `next`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Positioning)
                | (Idle, Running)
                | (Idle, Completed)
                | (Positioning, Running)
                | (Positioning, Stopping)
                | (Positioning, Completed)
                | (Running, Stopping)
                | (Running, Completed)
                | (Stopping, Completed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Positioning => "positioning",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Live view of a session, published by the session loop after every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: SessionState,
    pub fired_count: u64,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The repeat bound was reached
    Finished,
    /// Cancellation was observed
    Stopped,
    /// A click or cursor move failed; the session was not retried.
    ///
    /// A fire only counts once all of its clicks succeed. If the second half
    /// of a double click fails, the first half has already been sent but is
    /// not reflected in `fired_count`.
    Failed(InjectionError),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Finished => f.write_str("finished"),
            SessionOutcome::Stopped => f.write_str("stopped"),
            SessionOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Final result of a session, delivered exactly once on completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub id: SessionId,
    pub fired_count: u64,
    pub outcome: SessionOutcome,
    pub elapsed: Duration,
}

impl SessionReport {
    /// Finished and Stopped both count as success; only injection failures do not.
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, SessionOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&InjectionError> {
        match &self.outcome {
            SessionOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Session {} {} after {} fire(s) in {:.2}s",
            self.id,
            self.outcome,
            self.fired_count,
            self.elapsed.as_secs_f64()
        )
    }
}
