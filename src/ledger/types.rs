use super::config::LedgerConfig;
use crate::error::{NotarizerError, NotarizerResult};
use crate::evidence::FileDigest;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the hex digest in the payload template
pub const HASH_PLACEHOLDER: &str = "{hash}";

/// Subcommand of the ledger tool that calls a contract
pub const SEND_TO_CONTRACT: &str = "sendtocontract";

/// Everything needed for one call of the ledger tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarizationRequest {
    /// Human-readable description embedding the digest
    pub payload_text: String,
    /// UTF-8 bytes of `payload_text`, hex encoded
    pub payload_hex: String,
    pub tool_path: String,
    pub contract_address: String,
    pub sender_address: String,
    pub gas_limit: String,
    pub gas_price: String,
    pub amount: String,
    pub broadcast: bool,
}

impl NotarizationRequest {
    /// Build the request for `digest` using the fixed ledger parameters
    pub fn new(digest: &FileDigest, config: &LedgerConfig) -> Self {
        let payload_text = config
            .payload_template
            .replace(HASH_PLACEHOLDER, &digest.hex_value);
        let payload_hex = hex::encode(payload_text.as_bytes());

        Self {
            payload_text,
            payload_hex,
            tool_path: config.tool_path.clone(),
            contract_address: config.contract_address.clone(),
            sender_address: config.sender_address.clone(),
            gas_limit: config.gas_limit.clone(),
            gas_price: config.gas_price.clone(),
            amount: config.amount.clone(),
            broadcast: config.broadcast,
        }
    }

    /// Arguments passed after the tool path
    pub fn args(&self) -> Vec<String> {
        vec![
            SEND_TO_CONTRACT.to_string(),
            self.contract_address.clone(),
            self.payload_hex.clone(),
            self.amount.clone(),
            self.gas_limit.clone(),
            self.gas_price.clone(),
            self.sender_address.clone(),
            self.broadcast.to_string(),
        ]
    }

    /// Full argument vector, tool path first
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(9);
        argv.push(self.tool_path.clone());
        argv.extend(self.args());
        argv
    }

    /// Decode `payload_hex` back into text
    pub fn decode_payload(&self) -> NotarizerResult<String> {
        let bytes = hex::decode(&self.payload_hex)
            .map_err(|e| NotarizerError::InvalidPayload(format!("bad hex: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| NotarizerError::InvalidPayload(format!("bad UTF-8: {}", e)))
    }
}

/// Result of one notarization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NotarizationOutcome {
    /// Tool exited successfully; trimmed stdout is the ledger reference
    Success { raw_output: String },
    /// Non-zero exit, launch failure or timeout
    Failure { raw_error: String },
}

impl NotarizationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, NotarizationOutcome::Success { .. })
    }

    /// Ledger reference, if the attempt succeeded and the tool printed one
    pub fn reference(&self) -> Option<&str> {
        match self {
            NotarizationOutcome::Success { raw_output } if !raw_output.is_empty() => {
                Some(raw_output)
            }
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            NotarizationOutcome::Success { .. } => None,
            NotarizationOutcome::Failure { raw_error } => Some(raw_error),
        }
    }
}
