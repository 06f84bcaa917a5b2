use super::core::{PipelineReport, StageResult};
use crate::error::NotarizerError;
use crate::evidence::{FileDigest, HashAlgorithm, Receipt, ReceiptWriter, StabilityDetector};
use crate::ledger::{LedgerConfig, NotarizationOutcome, NotarizationRequest, Notarizer};
use crate::logger::Logger;
use crate::state_machine::{FileSession, StateName};
use crate::watcher::WatchedFileEvent;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

const SOURCE: &str = "pipeline";

/// Runs detected files through stabilize, hash, notarize and receipt, one at a time
pub struct Orchestrator {
    detector: StabilityDetector,
    algorithm: HashAlgorithm,
    notarizer: Box<dyn Notarizer>,
    ledger: LedgerConfig,
    receipts: ReceiptWriter,
    logger: Logger,
}

impl Orchestrator {
    pub fn new(
        detector: StabilityDetector,
        algorithm: HashAlgorithm,
        notarizer: Box<dyn Notarizer>,
        ledger: LedgerConfig,
        receipts: ReceiptWriter,
        logger: Logger,
    ) -> Self {
        Self {
            detector,
            algorithm,
            notarizer,
            ledger,
            receipts,
            logger,
        }
    }

    pub fn notarizer_name(&self) -> &str {
        self.notarizer.name()
    }

    /// Consume events until the channel closes or shutdown is requested.
    ///
    /// A file already being processed is always finished first. Returns the
    /// number of files processed.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<WatchedFileEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut processed = 0;

        loop {
            if *shutdown.borrow() {
                self.logger.info("Shutdown requested. Stopping observer.", SOURCE);
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        self.logger.warn("Shutdown handle dropped, stopping", SOURCE);
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(event) => {
                        if self.process_event(&event).await.is_some() {
                            processed += 1;
                        }
                    }
                    None => {
                        self.logger.info("Event source closed", SOURCE);
                        break;
                    }
                },
            }
        }

        processed
    }

    /// Process one creation event; directory events are ignored
    pub async fn process_event(&self, event: &WatchedFileEvent) -> Option<PipelineReport> {
        if event.is_directory {
            self.logger.debug(
                &format!("Ignoring directory: {}", event.path.display()),
                SOURCE,
            );
            return None;
        }
        Some(self.process_file(event.path.clone(), event.detected_at).await)
    }

    /// Run the full pipeline for one file
    pub async fn process_file(
        &self,
        path: PathBuf,
        detected_at: DateTime<Local>,
    ) -> PipelineReport {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::new();

        let session = FileSession::new(path, detected_at);
        self.logger.info(
            &format!("New file detected: {}", session.path().display()),
            SOURCE,
        );

        // Stabilizing
        let session = session.stabilize();
        let stage_start = Instant::now();
        let stability = match self.detector.wait_for_stability(session.path()).await {
            Ok(outcome) if outcome.stable => outcome,
            result => {
                let error = match result {
                    Ok(outcome) => NotarizerError::FileUnstable {
                        path: session.path().display().to_string(),
                        attempts: outcome.attempts,
                    },
                    Err(e) => e,
                };
                if matches!(error, NotarizerError::FileUnstable { .. }) {
                    self.logger.error(
                        &format!(
                            "The file {} is not stable after several attempts.",
                            session.path().display()
                        ),
                        SOURCE,
                    );
                } else {
                    self.logger.error(&error.to_string(), SOURCE);
                }
                stage_results.push(StageResult::failure(
                    StateName::Stabilizing,
                    error.to_string(),
                    stage_start.elapsed(),
                ));
                return PipelineReport::failed(
                    session.fail(error.to_string()),
                    stage_results,
                    pipeline_start.elapsed(),
                );
            }
        };
        stage_results.push(StageResult::success(
            StateName::Stabilizing,
            stage_start.elapsed(),
        ));

        // Hashing
        let session = session.stable(stability);
        let stage_start = Instant::now();
        let hash_path = session.path().to_path_buf();
        let algorithm = self.algorithm;
        let hashed = match tokio::task::spawn_blocking(move || {
            FileDigest::from_file(&hash_path, algorithm)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => Err(NotarizerError::from(e)),
        };
        let digest = match hashed {
            Ok(digest) => digest,
            Err(error) => {
                self.logger.error(&error.to_string(), SOURCE);
                stage_results.push(StageResult::failure(
                    StateName::Hashing,
                    error.to_string(),
                    stage_start.elapsed(),
                ));
                return PipelineReport::failed(
                    session.fail(error.to_string()),
                    stage_results,
                    pipeline_start.elapsed(),
                );
            }
        };
        self.logger.info(
            &format!("Computed hash (hex): {}", digest.hex_value),
            SOURCE,
        );
        stage_results.push(StageResult::success(StateName::Hashing, stage_start.elapsed()));

        // Notarizing
        let session = session.hashed(digest);
        let stage_start = Instant::now();
        let request = NotarizationRequest::new(&session.state.digest, &self.ledger);
        self.logger.debug(
            &format!(
                "Submitting payload via {}: {}",
                self.notarizer.name(),
                request.payload_text
            ),
            SOURCE,
        );
        let outcome = self.notarizer.notarize(&request).await;
        match &outcome {
            NotarizationOutcome::Success { raw_output } => {
                self.logger.info(&format!("Notarization completed: {}", raw_output), SOURCE);
                stage_results.push(StageResult::success(
                    StateName::Notarizing,
                    stage_start.elapsed(),
                ));
            }
            NotarizationOutcome::Failure { raw_error } => {
                self.logger.error(&format!("Error during notarization: {}", raw_error), SOURCE);
                stage_results.push(StageResult::failure(
                    StateName::Notarizing,
                    raw_error.clone(),
                    stage_start.elapsed(),
                ));
            }
        }

        // Receipting
        let session = session.notarized(outcome);
        let stage_start = Instant::now();
        let written = Receipt::from_file(
            session.path(),
            session.state.digest.clone(),
            session.state.outcome.clone(),
        )
        .and_then(|receipt| self.receipts.write(session.path(), &receipt));

        match written {
            Ok(receipt_path) => {
                self.logger.info(
                    &format!("Receipt created: {}", receipt_path.display()),
                    SOURCE,
                );
                stage_results.push(StageResult::success(
                    StateName::Receipting,
                    stage_start.elapsed(),
                ));
                PipelineReport::done(
                    session.written(receipt_path),
                    stage_results,
                    pipeline_start.elapsed(),
                )
            }
            Err(error) => {
                self.logger.error(&error.to_string(), SOURCE);
                stage_results.push(StageResult::failure(
                    StateName::Receipting,
                    error.to_string(),
                    stage_start.elapsed(),
                ));
                PipelineReport::failed(
                    session.fail(error.to_string()),
                    stage_results,
                    pipeline_start.elapsed(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{TextReceiptRenderer, FAILURE_MARKER};
    use crate::ledger::MockNotarizer;
    use crate::logger::LogLevel;
    use crate::state_machine::FailedStage;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        Fixture {
            _dir: dir,
            input,
            output,
        }
    }

    fn orchestrator(fx: &Fixture, notarizer: MockNotarizer, logger: Logger) -> Orchestrator {
        Orchestrator::new(
            StabilityDetector::new(Duration::from_millis(10), 3),
            HashAlgorithm::Sha256,
            Box::new(notarizer),
            LedgerConfig::mock(),
            ReceiptWriter::new(&fx.output, Box::new(TextReceiptRenderer)),
            logger,
        )
    }

    #[tokio::test]
    async fn test_successful_file_reaches_done() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::instant();
        let orch = orchestrator(&fx, notarizer.clone(), logger.clone());

        let path = fx.input.join("report.txt");
        std::fs::write(&path, b"hello").unwrap();

        let report = orch.process_file(path, Local::now()).await;

        assert!(report.is_done());
        assert!(report.is_notarized());
        assert_eq!(
            report.stages_run(),
            vec![
                StateName::Stabilizing,
                StateName::Hashing,
                StateName::Notarizing,
                StateName::Receipting
            ]
        );
        assert_eq!(
            report.receipt_path,
            Some(fx.output.join("report_receipt.txt"))
        );
        assert_eq!(notarizer.call_count(), 1);

        let request = &notarizer.requests()[0];
        assert!(request
            .payload_text
            .contains("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"));

        let messages: Vec<String> = logger.get_logs().into_iter().map(|e| e.message).collect();
        assert!(messages.iter().any(|m| m.starts_with("New file detected:")));
        assert!(messages.iter().any(|m| m.starts_with("Computed hash (hex):")));
        assert!(messages.iter().any(|m| m.starts_with("Notarization completed:")));
    }

    #[tokio::test]
    async fn test_notarization_failure_still_writes_receipt() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let orch = orchestrator(&fx, MockNotarizer::failing("insufficient funds"), logger.clone());

        let path = fx.input.join("invoice.txt");
        std::fs::write(&path, b"amount due").unwrap();

        let report = orch.process_file(path, Local::now()).await;

        assert!(report.is_done());
        assert!(!report.is_notarized());
        let receipt = std::fs::read_to_string(report.receipt_path.unwrap()).unwrap();
        assert!(receipt.contains(FAILURE_MARKER));

        let errors: Vec<String> = logger
            .get_logs()
            .into_iter()
            .filter(|e| e.level == LogLevel::Error)
            .map(|e| e.message)
            .collect();
        assert!(errors.iter().any(|m| m.contains("insufficient funds")));
    }

    #[tokio::test]
    async fn test_empty_file_never_notarized() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::instant();
        let orch = orchestrator(&fx, notarizer.clone(), logger.clone());

        let path = fx.input.join("empty.txt");
        std::fs::write(&path, b"").unwrap();

        let report = orch.process_file(path, Local::now()).await;

        assert_eq!(report.final_state, StateName::Failed);
        assert_eq!(report.failed_stage, Some(FailedStage::Stabilizing));
        assert_eq!(notarizer.call_count(), 0);
        assert!(!fx.output.join("empty_receipt.txt").exists());
        assert!(logger
            .get_logs()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("is not stable")));
    }

    #[tokio::test]
    async fn test_vanished_file_fails_stabilizing() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let orch = orchestrator(&fx, MockNotarizer::instant(), logger);

        let report = orch
            .process_file(fx.input.join("gone.txt"), Local::now())
            .await;

        assert_eq!(report.failed_stage, Some(FailedStage::Stabilizing));
        assert!(report.error.unwrap().contains("gone.txt"));
    }

    #[tokio::test]
    async fn test_hash_failure_fails_hashing() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::instant();
        let orch = orchestrator(&fx, notarizer.clone(), logger.clone());

        // A directory has a stable non-zero size but cannot be read as a file.
        let path = fx.input.join("bundle");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("part.txt"), b"hello").unwrap();

        let report = orch.process_file(path, Local::now()).await;

        assert_eq!(report.final_state, StateName::Failed);
        assert_eq!(report.failed_stage, Some(FailedStage::Hashing));
        assert!(report.digest.is_none());
        assert!(report.receipt_path.is_none());
        assert_eq!(
            report.stages_run(),
            vec![StateName::Stabilizing, StateName::Hashing]
        );
        assert_eq!(notarizer.call_count(), 0);
        assert_eq!(std::fs::read_dir(&fx.output).unwrap().count(), 0);
        assert!(logger
            .get_logs()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("bundle")));
    }

    #[tokio::test]
    async fn test_missing_output_dir_fails_receipting() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let orch = Orchestrator::new(
            StabilityDetector::new(Duration::from_millis(10), 3),
            HashAlgorithm::Sha256,
            Box::new(MockNotarizer::instant()),
            LedgerConfig::mock(),
            ReceiptWriter::new(fx.output.join("missing"), Box::new(TextReceiptRenderer)),
            logger,
        );

        let path = fx.input.join("report.txt");
        std::fs::write(&path, b"hello").unwrap();
        let report = orch.process_file(path, Local::now()).await;

        assert_eq!(report.failed_stage, Some(FailedStage::Receipting));
        assert!(report.digest.is_some());
    }

    #[tokio::test]
    async fn test_directory_events_ignored() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::instant();
        let orch = orchestrator(&fx, notarizer.clone(), logger);

        let report = orch
            .process_event(&WatchedFileEvent::directory(fx.input.join("sub")))
            .await;

        assert!(report.is_none());
        assert_eq!(notarizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_processes_in_order_until_channel_closes() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::instant();
        let orch = orchestrator(&fx, notarizer.clone(), logger);

        let first = fx.input.join("first.txt");
        let second = fx.input.join("second.txt");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();

        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.send(WatchedFileEvent::file(&first)).await.unwrap();
        tx.send(WatchedFileEvent::directory(fx.input.join("sub")))
            .await
            .unwrap();
        tx.send(WatchedFileEvent::file(&second)).await.unwrap();
        drop(tx);

        let processed = orch.run(rx, shutdown_rx).await;

        assert_eq!(processed, 2);
        let requests = notarizer.requests();
        let one = FileDigest::from_bytes(b"one", HashAlgorithm::Sha256);
        assert!(requests[0].payload_text.contains(&one.hex_value));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let orch = orchestrator(&fx, MockNotarizer::instant(), logger);

        let (_tx, rx) = mpsc::channel::<WatchedFileEvent>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown_tx.send(true).unwrap();
            shutdown_tx
        });

        let processed = tokio::time::timeout(Duration::from_secs(5), orch.run(rx, shutdown_rx))
            .await
            .unwrap();
        assert_eq!(processed, 0);
        stopper.await.unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_file_finishes_after_shutdown() {
        let fx = fixture();
        let (logger, _guard) = Logger::in_memory();
        let notarizer = MockNotarizer::with_delay(200);
        let orch = orchestrator(&fx, notarizer.clone(), logger);

        let path = fx.input.join("slow.txt");
        std::fs::write(&path, b"slow").unwrap();

        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.send(WatchedFileEvent::file(&path)).await.unwrap();

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            shutdown_tx.send(true).unwrap();
            (tx, shutdown_tx)
        });

        let processed = orch.run(rx, shutdown_rx).await;

        assert_eq!(processed, 1);
        assert!(fx.output.join("slow_receipt.txt").exists());
        stopper.await.unwrap();
    }
}
