/// State types of the per-file session
///
/// Each state is a distinct type carrying only the data produced so far.
use crate::evidence::{FileDigest, StabilityOutcome};
use crate::ledger::NotarizationOutcome;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Creation notification received, nothing done yet
#[derive(Debug, Clone)]
pub struct Detected {
    pub detected_at: DateTime<Local>,
}

/// Polling the file size
#[derive(Debug, Clone)]
pub struct Stabilizing {
    pub started_at: DateTime<Local>,
}

/// File settled; streaming it through the digest
#[derive(Debug, Clone)]
pub struct Hashing {
    pub stability: StabilityOutcome,
}

/// Waiting for the ledger tool
#[derive(Debug, Clone)]
pub struct Notarizing {
    pub stability: StabilityOutcome,
    pub digest: FileDigest,
}

/// Writing the receipt; the outcome may be a failure
#[derive(Debug, Clone)]
pub struct Receipting {
    pub digest: FileDigest,
    pub outcome: NotarizationOutcome,
}

/// Receipt written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Done {
    pub completed_at: DateTime<Local>,
    pub digest: FileDigest,
    pub outcome: NotarizationOutcome,
    pub receipt_path: PathBuf,
}

/// Terminal error state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failed {
    pub failed_at: DateTime<Local>,
    pub error: String,
    pub failed_stage: FailedStage,
    /// Digest, if hashing got that far
    pub digest: Option<FileDigest>,
}

/// Stage where a session failed.
///
/// Notarizing is absent: a ledger failure is recorded on the receipt instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedStage {
    Stabilizing,
    Hashing,
    Receipting,
}

/// Name of a session state, for reports and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateName {
    Detected,
    Stabilizing,
    Hashing,
    Notarizing,
    Receipting,
    Done,
    Failed,
}

impl StateName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateName::Detected => "Detected",
            StateName::Stabilizing => "Stabilizing",
            StateName::Hashing => "Hashing",
            StateName::Notarizing => "Notarizing",
            StateName::Receipting => "Receipting",
            StateName::Done => "Done",
            StateName::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StateName::Done | StateName::Failed)
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FailedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailedStage::Stabilizing => StateName::Stabilizing,
            FailedStage::Hashing => StateName::Hashing,
            FailedStage::Receipting => StateName::Receipting,
        };
        f.write_str(name.as_str())
    }
}

/// Implemented by every state type so a session can report where it is
pub trait SessionState {
    const NAME: StateName;
}

impl SessionState for Detected {
    const NAME: StateName = StateName::Detected;
}

impl SessionState for Stabilizing {
    const NAME: StateName = StateName::Stabilizing;
}

impl SessionState for Hashing {
    const NAME: StateName = StateName::Hashing;
}

impl SessionState for Notarizing {
    const NAME: StateName = StateName::Notarizing;
}

impl SessionState for Receipting {
    const NAME: StateName = StateName::Receipting;
}

impl SessionState for Done {
    const NAME: StateName = StateName::Done;
}

impl SessionState for Failed {
    const NAME: StateName = StateName::Failed;
}

impl Detected {
    pub fn new(detected_at: DateTime<Local>) -> Self {
        Self { detected_at }
    }
}

impl Stabilizing {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
        }
    }
}

impl Default for Stabilizing {
    fn default() -> Self {
        Self::new()
    }
}

impl Failed {
    pub fn new(error: String, failed_stage: FailedStage, digest: Option<FileDigest>) -> Self {
        Self {
            failed_at: Local::now(),
            error,
            failed_stage,
            digest,
        }
    }
}
