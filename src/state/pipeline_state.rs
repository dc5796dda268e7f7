/// Lifecycle states of the item pipeline
///
/// The coordinator moves through these states exactly once per crawl.
use std::fmt;

/// Represents the current lifecycle state of the pipeline coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Constructed, no sink resources held yet
    Idle,

    /// Sinks are acquiring their resources
    Opening,

    /// Pages are being walked and items fanned out to sinks
    Running,

    /// Sinks are releasing their resources
    Closing,

    /// Terminal; no further items are accepted
    Closed,
}

impl PipelineState {
    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `Opening -> Closing` covers a sink setup failure, which releases the
    /// sinks already opened without ever running.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Opening)
                | (Self::Opening, Self::Running)
                | (Self::Opening, Self::Closing)
                | (Self::Running, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Running => "running",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    /// Returns all pipeline states in lifecycle order
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Opening,
            Self::Running,
            Self::Closing,
            Self::Closed,
        ]
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
