use crate::evidence::FileDigest;
use crate::ledger::NotarizationOutcome;
use crate::state_machine::{Done, Failed, FailedStage, FileSession, StateName};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Result of one stage for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StateName,

    /// Whether the stage succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,

    pub duration: Duration,
}

impl StageResult {
    pub fn success(stage: StateName, duration: Duration) -> Self {
        Self {
            stage,
            success: true,
            error: None,
            duration,
        }
    }

    pub fn failure(stage: StateName, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            stage,
            success: false,
            error: Some(error.into()),
            duration,
        }
    }
}

/// Everything that happened to one detected file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub session_id: Uuid,

    pub path: PathBuf,

    /// Results from each stage that ran, in order
    pub stage_results: Vec<StageResult>,

    /// Either `Done` or `Failed`
    pub final_state: StateName,

    pub digest: Option<FileDigest>,

    pub outcome: Option<NotarizationOutcome>,

    pub receipt_path: Option<PathBuf>,

    /// Set when the session ended in `Failed`
    pub error: Option<String>,

    pub failed_stage: Option<FailedStage>,

    pub total_duration: Duration,
}

impl PipelineReport {
    pub fn done(
        session: FileSession<Done>,
        stage_results: Vec<StageResult>,
        total_duration: Duration,
    ) -> Self {
        let FileSession {
            session_id,
            state,
            metadata,
        } = session;

        Self {
            session_id,
            path: metadata.path,
            stage_results,
            final_state: StateName::Done,
            digest: Some(state.digest),
            outcome: Some(state.outcome),
            receipt_path: Some(state.receipt_path),
            error: None,
            failed_stage: None,
            total_duration,
        }
    }

    pub fn failed(
        session: FileSession<Failed>,
        stage_results: Vec<StageResult>,
        total_duration: Duration,
    ) -> Self {
        let FileSession {
            session_id,
            state,
            metadata,
        } = session;

        Self {
            session_id,
            path: metadata.path,
            stage_results,
            final_state: StateName::Failed,
            digest: state.digest,
            outcome: None,
            receipt_path: None,
            error: Some(state.error),
            failed_stage: Some(state.failed_stage),
            total_duration,
        }
    }

    /// A receipt was written, whatever the notarization outcome
    pub fn is_done(&self) -> bool {
        self.final_state == StateName::Done
    }

    /// Done and the ledger returned a reference for the payload
    pub fn is_notarized(&self) -> bool {
        self.outcome
            .as_ref()
            .and_then(NotarizationOutcome::reference)
            .is_some()
    }

    pub fn stages_run(&self) -> Vec<StateName> {
        self.stage_results.iter().map(|r| r.stage).collect()
    }
}
