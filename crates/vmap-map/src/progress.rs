//! Progress of the server-side job that applies approved mappings.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Which stored mappings an apply job runs. Each kind has its own job
/// endpoint and progress channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ApplyKind {
    Direct,
    #[default]
    Imputation,
}

impl ApplyKind {
    /// Path segment and channel name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Imputation => "imputation",
        }
    }
}

impl fmt::Display for ApplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processed mappings out of the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub count: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(count: u64, total: u64) -> Self {
        Self { count, total }
    }

    /// Percentage rounded up, capped at 100. An empty job is at 0.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.count.saturating_mul(100)).div_ceil(self.total);
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    pub fn is_complete(&self) -> bool {
        self.percent() == 100
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.count, self.total, self.percent())
    }
}

/// A per-mapping note published by the job, e.g. why a mapping was
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub variable: Option<String>,
    pub message: String,
}

impl fmt::Display for JobMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.schema, &self.variable) {
            (Some(schema), Some(variable)) => write!(f, "{schema}.{variable}: {}", self.message),
            (None, Some(variable)) => write!(f, "{variable}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// One payload on the progress channel. Both kinds share the channel and
/// are told apart by shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JobEvent {
    Progress(Progress),
    Message(JobMessage),
}

impl JobEvent {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// Running view of a job: the latest progress plus every message received.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    progress: Progress,
    messages: Vec<JobMessage>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn messages(&self) -> &[JobMessage] {
        &self.messages
    }

    /// Applies an event. Progress updates that move the count backwards are
    /// dropped; returns whether the event was taken.
    pub fn apply(&mut self, event: JobEvent) -> bool {
        match event {
            JobEvent::Progress(update) => {
                if update.count < self.progress.count {
                    warn!(
                        current = %self.progress,
                        received = %update,
                        "ignoring progress regression"
                    );
                    return false;
                }
                self.progress = update;
                true
            }
            JobEvent::Message(message) => {
                self.messages.push(message);
                true
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }
}
