use super::{CliNotarizer, LedgerBackend, LedgerConfig, MockNotarizer, Notarizer};
use crate::error::{NotarizerError, NotarizerResult};
use crate::logger::Logger;

/// Picks the notarizer implementation for a ledger configuration
pub struct NotarizerFactory;

impl NotarizerFactory {
    /// Create a notarizer from configuration
    ///
    /// # Errors
    /// Returns `LedgerNotConfigured` if the cli backend has no sender address
    pub fn create(config: &LedgerConfig, logger: Logger) -> NotarizerResult<Box<dyn Notarizer>> {
        match config.backend {
            LedgerBackend::Mock => Ok(Box::new(MockNotarizer::new())),
            LedgerBackend::Cli => {
                if config.sender_address.trim().is_empty() {
                    return Err(NotarizerError::LedgerNotConfigured(
                        "sender_address is empty".to_string(),
                    ));
                }
                Ok(Box::new(CliNotarizer::new(config.timeout(), logger)))
            }
        }
    }
}
