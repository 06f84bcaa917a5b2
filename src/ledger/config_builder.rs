use super::config::{LedgerBackend, LedgerConfig};
use super::types::HASH_PLACEHOLDER;
use crate::error::{NotarizerError, NotarizerResult};

/// Builder for constructing LedgerConfig instances with a fluent API
///
/// # Example
/// ```
/// use notarizer_lib::ledger::{LedgerBackend, LedgerConfigBuilder};
///
/// let config = LedgerConfigBuilder::new()
///     .backend(LedgerBackend::Cli)
///     .tool_path("/opt/revo/revo-cli")
///     .sender_address("RYourAddress")
///     .timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.gas_limit, "25000");
/// ```
#[derive(Debug)]
pub struct LedgerConfigBuilder {
    config: LedgerConfig,
}

impl LedgerConfigBuilder {
    /// Start from the default ledger parameters
    pub fn new() -> Self {
        Self {
            config: LedgerConfig::default(),
        }
    }

    /// Start from an existing configuration (e.g. one loaded from disk)
    pub fn from_config(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn backend(mut self, backend: LedgerBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn tool_path(mut self, tool_path: impl Into<String>) -> Self {
        self.config.tool_path = tool_path.into();
        self
    }

    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.config.contract_address = address.into();
        self
    }

    pub fn sender_address(mut self, address: impl Into<String>) -> Self {
        self.config.sender_address = address.into();
        self
    }

    pub fn gas_limit(mut self, gas_limit: impl Into<String>) -> Self {
        self.config.gas_limit = gas_limit.into();
        self
    }

    pub fn gas_price(mut self, gas_price: impl Into<String>) -> Self {
        self.config.gas_price = gas_price.into();
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.config.amount = amount.into();
        self
    }

    pub fn broadcast(mut self, broadcast: bool) -> Self {
        self.config.broadcast = broadcast;
        self
    }

    pub fn payload_template(mut self, template: impl Into<String>) -> Self {
        self.config.payload_template = template.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    /// Wait for the ledger tool without any bound
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout_secs = None;
        self
    }

    /// Build the LedgerConfig instance
    ///
    /// # Errors
    /// Returns `NotarizerError::BuilderError` if required fields are missing or invalid
    pub fn build(self) -> NotarizerResult<LedgerConfig> {
        let config = self.config;

        if !config.payload_template.contains(HASH_PLACEHOLDER) {
            return Err(NotarizerError::BuilderError(format!(
                "payload_template must contain {}",
                HASH_PLACEHOLDER
            )));
        }

        if config.gas_limit.trim().parse::<u64>().is_err() {
            return Err(NotarizerError::BuilderError(format!(
                "gas_limit is not a whole number: {}",
                config.gas_limit
            )));
        }

        for (name, value) in [("gas_price", &config.gas_price), ("amount", &config.amount)] {
            match value.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => {}
                _ => {
                    return Err(NotarizerError::BuilderError(format!(
                        "{} is not a non-negative number: {}",
                        name, value
                    )))
                }
            }
        }

        if config.timeout_secs == Some(0) {
            return Err(NotarizerError::BuilderError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        match config.backend {
            LedgerBackend::Mock => {
                // Mock accepts any addresses
            }
            LedgerBackend::Cli => {
                if config.tool_path.trim().is_empty() {
                    return Err(NotarizerError::BuilderError(
                        "tool_path is required for the cli backend".to_string(),
                    ));
                }
                if config.contract_address.trim().is_empty() {
                    return Err(NotarizerError::BuilderError(
                        "contract_address is required for the cli backend".to_string(),
                    ));
                }
                if config.sender_address.trim().is_empty() {
                    return Err(NotarizerError::BuilderError(
                        "sender_address is required for the cli backend".to_string(),
                    ));
                }
            }
        }

        Ok(config)
    }
}

impl Default for LedgerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_cli_config() {
        let config = LedgerConfigBuilder::new()
            .tool_path("/usr/local/bin/revo-cli")
            .sender_address("RSender")
            .gas_limit("30000")
            .broadcast(false)
            .build()
            .unwrap();

        assert_eq!(config.backend, LedgerBackend::Cli);
        assert_eq!(config.tool_path, "/usr/local/bin/revo-cli");
        assert_eq!(config.gas_limit, "30000");
        assert!(!config.broadcast);
    }

    #[test]
    fn test_builder_missing_sender() {
        let result = LedgerConfigBuilder::new().build();
        assert!(matches!(result, Err(NotarizerError::BuilderError(_))));
    }

    #[test]
    fn test_builder_mock_needs_no_sender() {
        let config = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .build()
            .unwrap();
        assert_eq!(config.backend, LedgerBackend::Mock);
    }

    #[test]
    fn test_builder_template_without_placeholder() {
        let result = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .payload_template("no digest here")
            .build();
        assert!(matches!(result, Err(NotarizerError::BuilderError(_))));
    }

    #[test]
    fn test_builder_invalid_numbers() {
        let bad_gas = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .gas_limit("lots")
            .build();
        assert!(bad_gas.is_err());

        let bad_price = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .gas_price("-1")
            .build();
        assert!(bad_price.is_err());
    }

    #[test]
    fn test_builder_timeout() {
        let config = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .no_timeout()
            .build()
            .unwrap();
        assert_eq!(config.timeout_secs, None);

        let zero = LedgerConfigBuilder::new()
            .backend(LedgerBackend::Mock)
            .timeout_secs(0)
            .build();
        assert!(zero.is_err());
    }

    #[test]
    fn test_builder_from_config_revalidates() {
        let loaded = LedgerConfig {
            tool_path: String::new(),
            sender_address: "RSender".to_string(),
            ..LedgerConfig::default()
        };
        let result = LedgerConfigBuilder::from_config(loaded).build();
        assert!(matches!(result, Err(NotarizerError::BuilderError(_))));
    }
}
