/// Lifecycle of a single discovery run
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created, seeds not yet admitted
    Init,

    /// Workers are dispatching requests
    Running,

    /// Budget hit or queue exhausted; terminal
    Stopped,
}

/// Why a run left the Running state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxPages,
    TimeLimit,
    QueueExhausted,
}

impl RunState {
    /// Returns true if the transition `self -> next` is legal
    ///
    /// Init may stop directly when no seed could be admitted.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Running) | (Self::Init, Self::Stopped) | (Self::Running, Self::Stopped)
        )
    }

    /// Performs a checked transition
    pub fn transition(self, next: RunState) -> crate::Result<RunState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(crate::ScoutError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Self::Init),
            "running" => Some(Self::Running),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

impl StopReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::MaxPages => "max_pages",
            Self::TimeLimit => "time_limit",
            Self::QueueExhausted => "queue_exhausted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MaxPages => "page budget reached",
            Self::TimeLimit => "time limit exceeded",
            Self::QueueExhausted => "queue exhausted",
        };
        write!(f, "{}", text)
    }
}
