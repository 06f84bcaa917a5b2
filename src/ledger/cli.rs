use super::types::{NotarizationOutcome, NotarizationRequest};
use super::Notarizer;
use crate::logger::{LogLevel, Logger};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Notarizes by running the ledger's command line tool once per request
pub struct CliNotarizer {
    timeout: Option<Duration>,
    logger: Logger,
}

impl CliNotarizer {
    pub fn new(timeout: Option<Duration>, logger: Logger) -> Self {
        Self { timeout, logger }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn classify(output: Output) -> NotarizationOutcome {
        if output.status.success() {
            NotarizationOutcome::Success {
                raw_output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let raw_error = if stderr.is_empty() {
                format!("tool exited with {}", output.status)
            } else {
                stderr
            };
            NotarizationOutcome::Failure { raw_error }
        }
    }
}

#[async_trait]
impl Notarizer for CliNotarizer {
    async fn notarize(&self, request: &NotarizationRequest) -> NotarizationOutcome {
        self.logger.log(
            LogLevel::Debug,
            &format!(
                "Invoking {} {} for contract {}",
                request.tool_path,
                super::SEND_TO_CONTRACT,
                request.contract_address
            ),
            "ledger::cli",
        );

        let mut command = Command::new(&request.tool_path);
        command
            .args(request.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return NotarizationOutcome::Failure {
                    raw_error: format!("Failed to launch {}: {}", request.tool_path, e),
                }
            }
        };

        // Dropping the wait future on expiry drops the child, which kills it.
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    return NotarizationOutcome::Failure {
                        raw_error: format!(
                            "{} timed out after {}s",
                            request.tool_path,
                            limit.as_secs_f64()
                        ),
                    }
                }
            },
            None => child.wait_with_output().await,
        };

        match waited {
            Ok(output) => Self::classify(output),
            Err(e) => NotarizationOutcome::Failure {
                raw_error: format!("Failed to wait for {}: {}", request.tool_path, e),
            },
        }
    }

    fn name(&self) -> &str {
        "cli"
    }
}
