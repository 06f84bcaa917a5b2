/// Per-file processing session
///
/// A type-safe state machine over the stages a detected file goes through.
/// Invalid orderings (hashing before the size settled, a receipt without a
/// notarization outcome) cannot be expressed.
///
/// # States
///
/// - `Detected` - Creation notification received
/// - `Stabilizing` - Polling the file size
/// - `Hashing` - Computing the content digest
/// - `Notarizing` - Waiting for the ledger tool
/// - `Receipting` - Writing the receipt
/// - `Done` - Receipt written
/// - `Failed` - Stabilizing, hashing or receipt writing failed
///
/// # Example
///
/// ```
/// use notarizer_lib::evidence::{FileDigest, HashAlgorithm, StabilityOutcome};
/// use notarizer_lib::ledger::NotarizationOutcome;
/// use notarizer_lib::state_machine::{FileSession, StateName};
/// use std::path::PathBuf;
///
/// let stability = StabilityOutcome { stable: true, attempts: 2, last_size: 5 };
/// let digest = FileDigest::from_bytes(b"hello", HashAlgorithm::Sha256);
///
/// let session = FileSession::new(PathBuf::from("/in/report.txt"), chrono::Local::now())
///     .stabilize()
///     .stable(stability)
///     .hashed(digest)
///     .notarized(NotarizationOutcome::Success { raw_output: "txid123".into() })
///     .written(PathBuf::from("/out/report_receipt.pdf"));
///
/// assert_eq!(session.state_name(), StateName::Done);
/// ```
pub mod states;
pub mod transitions;

pub use states::*;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Processing session for one file, in state `S`
#[derive(Debug, Clone)]
pub struct FileSession<S> {
    pub session_id: Uuid,

    pub state: S,

    /// Available in all states
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// File being processed
    pub path: PathBuf,

    /// When the creation notification arrived
    pub detected_at: DateTime<Local>,
}

impl<S> FileSession<S> {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn path(&self) -> &Path {
        &self.metadata.path
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }
}

impl<S: SessionState> FileSession<S> {
    pub fn state_name(&self) -> StateName {
        S::NAME
    }
}
