pub mod cli;
pub mod config;
pub mod error;
pub mod evidence;
pub mod ledger;
pub mod logger;
pub mod pipeline;
pub mod state_machine;
pub mod watcher;

pub use config::NotarizerConfig;
pub use error::{NotarizerError, NotarizerResult};
pub use logger::{LogLevel, Logger, LoggerGuard};
pub use pipeline::{Orchestrator, PipelineReport};
