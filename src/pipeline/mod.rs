//! Event-to-receipt pipeline
//!
//! The orchestrator takes file creation events off a channel and runs each
//! file through stability detection, hashing, notarization and receipt
//! writing before looking at the next event. Every processed file yields a
//! [`PipelineReport`].

pub mod core;
pub mod orchestrator;

pub use core::{PipelineReport, StageResult};
pub use orchestrator::Orchestrator;
