// ─── Outcome ───
// Success value plus the non-fatal problems collected while producing it.

use std::fmt;

use tracing::warn;

/// A best-effort step that failed without aborting the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub stage: &'static str,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Result of an operation whose optional enrichment steps may fail.
///
/// Fatal failures travel through `LauncherResult`; everything that must not
/// block the launch is accumulated here instead of being dropped.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<Warning>) -> Self {
        Self { value, warnings }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Collector used while an operation runs.
#[derive(Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a swallowed failure.
    pub fn push(&mut self, stage: &'static str, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {}", stage, message);
        self.0.push(Warning { stage, message });
    }

    pub fn extend(&mut self, other: Vec<Warning>) {
        self.0.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome::with_warnings(value, self.0)
    }
}
