use crate::error::{NotarizerError, NotarizerResult};
use crate::logger::Logger;
use chrono::{DateTime, Local};
use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Queue depth between the file system notifier and the orchestrator
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A path that appeared in the watched directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedFileEvent {
    pub path: PathBuf,
    pub is_directory: bool,
    pub detected_at: DateTime<Local>,
}

impl WatchedFileEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            detected_at: Local::now(),
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
            detected_at: Local::now(),
        }
    }
}

/// Bounded channel carrying creation events to the orchestrator
pub fn event_channel(
    capacity: usize,
) -> (
    mpsc::Sender<WatchedFileEvent>,
    mpsc::Receiver<WatchedFileEvent>,
) {
    mpsc::channel(capacity)
}

/// Creation events contained in one notifier event; other kinds yield nothing
pub fn creation_events(event: &Event) -> Vec<WatchedFileEvent> {
    let kind = match event.kind {
        EventKind::Create(kind) => kind,
        _ => return Vec::new(),
    };

    let detected_at = Local::now();
    event
        .paths
        .iter()
        .map(|path| WatchedFileEvent {
            path: path.clone(),
            is_directory: match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => path.is_dir(),
            },
            detected_at,
        })
        .collect()
}

/// Watches one directory (non-recursive) and forwards creation events.
///
/// Delivery stops when the watcher is dropped.
pub struct DirectoryWatcher {
    dir: PathBuf,
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    pub fn start(
        dir: &Path,
        sender: mpsc::Sender<WatchedFileEvent>,
        logger: Logger,
    ) -> NotarizerResult<Self> {
        if !dir.is_dir() {
            return Err(NotarizerError::WatcherError(format!(
                "not a directory: {}",
                dir.display()
            )));
        }

        let handler_logger = logger.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for created in creation_events(&event) {
                        // Runs on the notifier's own thread, outside the runtime.
                        if sender.blocking_send(created).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => handler_logger.error(&format!("Watcher error: {}", e), "watcher"),
            }
        })?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        logger.info(&format!("Watching {}", dir.display()), "watcher");

        Ok(Self {
            dir: dir.to_path_buf(),
            _watcher: watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
