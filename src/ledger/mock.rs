use super::types::{NotarizationOutcome, NotarizationRequest};
use super::Notarizer;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

/// Simulated ledger for development, dry runs and tests.
///
/// Every successful call returns `mock-tx-` followed by the first 16 hex
/// characters of the SHA-256 of the payload, so identical payloads get
/// identical references.
#[derive(Clone)]
pub struct MockNotarizer {
    /// Simulated round trip in milliseconds
    delay_ms: u64,

    /// When set, every call fails with this text
    failure: Option<String>,

    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<NotarizationRequest>>>,
}

impl MockNotarizer {
    pub fn new() -> Self {
        Self::with_delay(100)
    }

    /// No simulated delay
    pub fn instant() -> Self {
        Self::with_delay(0)
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock whose every call fails with `raw_error`
    pub fn failing(raw_error: impl Into<String>) -> Self {
        Self {
            failure: Some(raw_error.into()),
            ..Self::instant()
        }
    }

    /// Number of `notarize` calls so far, shared between clones
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<NotarizationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn reference_for(request: &NotarizationRequest) -> String {
        let digest = hex::encode(Sha256::digest(request.payload_hex.as_bytes()));
        format!("mock-tx-{}", &digest[..16])
    }
}

impl Default for MockNotarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notarizer for MockNotarizer {
    async fn notarize(&self, request: &NotarizationRequest) -> NotarizationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }

        match &self.failure {
            Some(raw_error) => NotarizationOutcome::Failure {
                raw_error: raw_error.clone(),
            },
            None => NotarizationOutcome::Success {
                raw_output: Self::reference_for(request),
            },
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
