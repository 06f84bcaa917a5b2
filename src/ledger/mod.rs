pub mod cli;
pub mod config;
pub mod config_builder;
pub mod factory;
pub mod mock;
pub mod types;

pub use cli::CliNotarizer;
pub use config::{LedgerBackend, LedgerConfig};
pub use config_builder::LedgerConfigBuilder;
pub use factory::NotarizerFactory;
pub use mock::MockNotarizer;
pub use types::{NotarizationOutcome, NotarizationRequest, HASH_PLACEHOLDER, SEND_TO_CONTRACT};

use async_trait::async_trait;

/// Submits a notarization payload to the ledger.
///
/// Implementations never fail with an error: every problem is folded into
/// [`NotarizationOutcome::Failure`] so the caller can still record the attempt.
#[async_trait]
pub trait Notarizer: Send + Sync {
    /// Submit one request and wait until the ledger side has answered
    async fn notarize(&self, request: &NotarizationRequest) -> NotarizationOutcome;

    /// Short name used in logs
    fn name(&self) -> &str;
}
