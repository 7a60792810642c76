use std::fmt;

use serde::Serialize;

/// Where a launch preparation attempt currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "reason", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    ResolvingRuntime,
    InstallingRuntime,
    ResolvingLoader,
    InstallingLoader,
    ComposingArtifacts,
    Ready,
    Failed(String),
}

impl Phase {
    /// Cancellation is honored until artifacts start being written.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Phase::Idle
                | Phase::ResolvingRuntime
                | Phase::InstallingRuntime
                | Phase::ResolvingLoader
                | Phase::InstallingLoader
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("Idle"),
            Phase::ResolvingRuntime => f.write_str("Checking for Ashita updates..."),
            Phase::InstallingRuntime => f.write_str("Installing Ashita..."),
            Phase::ResolvingLoader => f.write_str("Checking for XiLoader updates..."),
            Phase::InstallingLoader => f.write_str("Installing XiLoader..."),
            Phase::ComposingArtifacts => f.write_str("Writing boot configuration..."),
            Phase::Ready => f.write_str("Ready to launch"),
            Phase::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}
