/// State transitions
///
/// Each transition consumes the session in its current state and returns it in
/// the next one, so stages cannot be skipped or reordered.
use super::states::*;
use super::{FileSession, SessionMetadata};
use crate::evidence::{FileDigest, StabilityOutcome};
use crate::ledger::NotarizationOutcome;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use uuid::Uuid;

impl<S> FileSession<S> {
    fn into_state<T>(self, state: T) -> FileSession<T> {
        FileSession {
            session_id: self.session_id,
            state,
            metadata: self.metadata,
        }
    }
}

// ============================================================================
// Detected
// ============================================================================

impl FileSession<Detected> {
    /// Session for a freshly reported file
    pub fn new(path: PathBuf, detected_at: DateTime<Local>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: Detected::new(detected_at),
            metadata: SessionMetadata { path, detected_at },
        }
    }

    pub fn stabilize(self) -> FileSession<Stabilizing> {
        self.into_state(Stabilizing::new())
    }
}

// ============================================================================
// Stabilizing
// ============================================================================

impl FileSession<Stabilizing> {
    /// The size settled; move on to hashing
    pub fn stable(self, stability: StabilityOutcome) -> FileSession<Hashing> {
        self.into_state(Hashing { stability })
    }

    pub fn fail(self, error: String) -> FileSession<Failed> {
        self.into_state(Failed::new(error, FailedStage::Stabilizing, None))
    }
}

// ============================================================================
// Hashing
// ============================================================================

impl FileSession<Hashing> {
    pub fn hashed(self, digest: FileDigest) -> FileSession<Notarizing> {
        let stability = self.state.stability;
        self.into_state(Notarizing { stability, digest })
    }

    pub fn fail(self, error: String) -> FileSession<Failed> {
        self.into_state(Failed::new(error, FailedStage::Hashing, None))
    }
}

// ============================================================================
// Notarizing
// ============================================================================

impl FileSession<Notarizing> {
    /// Both outcomes lead to a receipt, so there is no failing transition here
    pub fn notarized(self, outcome: NotarizationOutcome) -> FileSession<Receipting> {
        let digest = self.state.digest.clone();
        self.into_state(Receipting { digest, outcome })
    }
}

// ============================================================================
// Receipting
// ============================================================================

impl FileSession<Receipting> {
    pub fn written(self, receipt_path: PathBuf) -> FileSession<Done> {
        let Receipting { digest, outcome } = self.state.clone();
        self.into_state(Done {
            completed_at: Local::now(),
            digest,
            outcome,
            receipt_path,
        })
    }

    pub fn fail(self, error: String) -> FileSession<Failed> {
        let digest = Some(self.state.digest.clone());
        self.into_state(Failed::new(error, FailedStage::Receipting, digest))
    }
}
