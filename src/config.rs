use crate::error::{NotarizerError, NotarizerResult};
use crate::evidence::{HashAlgorithm, StabilityDetector};
use crate::ledger::{LedgerConfig, LedgerConfigBuilder};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub file: PathBuf,

    /// Lines written before the file is rolled over
    pub max_lines: usize,

    /// Numbered backups kept next to the active file
    pub backup_count: usize,

    pub level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_data_dir().join("logs").join("notarizer.log"),
            max_lines: 1000,
            backup_count: 5,
            level: LogLevel::Info,
        }
    }
}

/// Size polling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StabilityConfig {
    pub interval_ms: u64,
    pub retries: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            retries: 5,
        }
    }
}

impl StabilityConfig {
    pub fn detector(&self) -> StabilityDetector {
        StabilityDetector::new(Duration::from_millis(self.interval_ms), self.retries)
    }
}

/// Document type written for each processed file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFormat {
    #[default]
    Pdf,
    Text,
}

/// Top-level configuration, stored as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotarizerConfig {
    /// Directory watched for new files (not recursive)
    pub watch_dir: PathBuf,

    /// Directory receiving receipts
    pub output_dir: PathBuf,

    pub log: LogConfig,
    pub stability: StabilityConfig,
    pub hash_algorithm: HashAlgorithm,
    pub receipt_format: ReceiptFormat,
    pub ledger: LedgerConfig,
}

impl Default for NotarizerConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            watch_dir: data_dir.join("incoming"),
            output_dir: data_dir.join("receipts"),
            log: LogConfig::default(),
            stability: StabilityConfig::default(),
            hash_algorithm: HashAlgorithm::default(),
            receipt_format: ReceiptFormat::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Per-user data directory, falling back to the working directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("notarizer"))
        .unwrap_or_else(|| PathBuf::from("notarizer-data"))
}

impl NotarizerConfig {
    /// Read a configuration file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> NotarizerResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NotarizerError::FileNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            NotarizerError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> NotarizerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                NotarizerError::DirectoryCreationFailed(format!("{}: {}", parent.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check settings that would otherwise fail later at runtime
    pub fn validate(&self) -> NotarizerResult<()> {
        if self.log.max_lines == 0 {
            return Err(NotarizerError::ConfigError(
                "log.max_lines must be at least 1".to_string(),
            ));
        }
        if self.stability.retries == 0 {
            return Err(NotarizerError::ConfigError(
                "stability.retries must be at least 1".to_string(),
            ));
        }
        if self.watch_dir == self.output_dir {
            return Err(NotarizerError::ConfigError(
                "watch_dir and output_dir must differ".to_string(),
            ));
        }

        LedgerConfigBuilder::from_config(self.ledger.clone())
            .build()
            .map_err(|e| NotarizerError::ConfigError(format!("ledger: {}", e)))?;

        Ok(())
    }

    /// Create the watch, output and log directories if they do not exist
    pub fn ensure_directories(&self) -> NotarizerResult<()> {
        let log_dir = self
            .log
            .file
            .parent()
            .filter(|p| !p.as_os_str().is_empty());

        for dir in [Some(self.watch_dir.as_path()), Some(self.output_dir.as_path()), log_dir]
            .into_iter()
            .flatten()
        {
            fs::create_dir_all(dir).map_err(|e| {
                NotarizerError::DirectoryCreationFailed(format!("{}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerBackend;
    use tempfile::TempDir;

    fn valid_config(root: &Path) -> NotarizerConfig {
        NotarizerConfig {
            watch_dir: root.join("in"),
            output_dir: root.join("out"),
            log: LogConfig {
                file: root.join("logs").join("notarizer.log"),
                ..LogConfig::default()
            },
            ledger: LedgerConfig::mock(),
            ..NotarizerConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = NotarizerConfig::default();
        assert_eq!(config.log.max_lines, 1000);
        assert_eq!(config.log.backup_count, 5);
        assert_eq!(config.stability.interval_ms, 1000);
        assert_eq!(config.stability.retries, 5);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.receipt_format, ReceiptFormat::Pdf);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("notarizer.json");
        let mut config = valid_config(dir.path());
        config.receipt_format = ReceiptFormat::Text;
        config.hash_algorithm = HashAlgorithm::Blake3;

        config.save(&path).unwrap();
        let loaded = NotarizerConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notarizer.json");
        fs::write(
            &path,
            r#"{"watch_dir": "/data/in", "stability": {"retries": 9}, "ledger": {"backend": "mock"}}"#,
        )
        .unwrap();

        let config = NotarizerConfig::load(&path).unwrap();
        assert_eq!(config.watch_dir, PathBuf::from("/data/in"));
        assert_eq!(config.stability.retries, 9);
        assert_eq!(config.stability.interval_ms, 1000);
        assert_eq!(config.ledger.backend, LedgerBackend::Mock);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            NotarizerConfig::load(dir.path().join("nope.json")),
            Err(NotarizerError::FileNotFound(_))
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            NotarizerConfig::load(&bad),
            Err(NotarizerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        let config = valid_config(dir.path());
        assert!(config.validate().is_ok());

        let mut zero_lines = config.clone();
        zero_lines.log.max_lines = 0;
        assert!(zero_lines.validate().is_err());

        let mut same_dirs = config.clone();
        same_dirs.output_dir = same_dirs.watch_dir.clone();
        assert!(same_dirs.validate().is_err());

        let mut no_sender = config;
        no_sender.ledger.backend = LedgerBackend::Cli;
        assert!(matches!(
            no_sender.validate(),
            Err(NotarizerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_ensure_directories() {
        let dir = TempDir::new().unwrap();
        let config = valid_config(dir.path());

        config.ensure_directories().unwrap();

        assert!(config.watch_dir.is_dir());
        assert!(config.output_dir.is_dir());
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_stability_detector_from_config() {
        let detector = StabilityConfig {
            interval_ms: 250,
            retries: 7,
        }
        .detector();
        assert_eq!(detector.interval(), Duration::from_millis(250));
        assert_eq!(detector.retries(), 7);
    }
}
