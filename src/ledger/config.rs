use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which notarizer handles requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Call the ledger command line tool
    #[default]
    Cli,

    /// Simulated ledger, nothing leaves the machine
    Mock,
}

/// Fixed parameters of every notarization call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,

    /// Ledger tool executable; a bare name is looked up on PATH
    pub tool_path: String,

    /// Contract receiving the notarization payload
    pub contract_address: String,

    /// Address paying for the call
    pub sender_address: String,

    pub gas_limit: String,
    pub gas_price: String,

    /// Native currency sent along with the call, normally zero
    pub amount: String,

    pub broadcast: bool,

    /// Payload text; `{hash}` is replaced by the hex digest
    pub payload_template: String,

    /// Upper bound on one tool invocation; `null` waits forever
    pub timeout_secs: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Cli,
            tool_path: "revo-cli".to_string(),
            contract_address: "8dbfe93530592d739014c0c391897b9afa928974".to_string(),
            sender_address: String::new(),
            gas_limit: "25000".to_string(),
            gas_price: "0.00000001".to_string(),
            amount: "0".to_string(),
            broadcast: true,
            payload_template: "File notarized with notarizer - file hash: {hash}".to_string(),
            timeout_secs: Some(120),
        }
    }
}

impl LedgerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Simulated ledger with the default parameters
    pub fn mock() -> Self {
        Self {
            backend: LedgerBackend::Mock,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.backend, LedgerBackend::Cli);
        assert_eq!(config.gas_limit, "25000");
        assert_eq!(config.amount, "0");
        assert!(config.broadcast);
        assert_eq!(config.timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"sender_address": "RAbc", "backend": "mock"}"#).unwrap();
        assert_eq!(config.sender_address, "RAbc");
        assert_eq!(config.backend, LedgerBackend::Mock);
        assert_eq!(config.tool_path, "revo-cli");
    }

    #[test]
    fn test_config_serialization() {
        let config = LedgerConfig {
            timeout_secs: None,
            ..LedgerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"timeout_secs\":null"));

        let back: LedgerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.timeout(), None);
    }
}
