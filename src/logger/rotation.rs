//! Line-count based log rotation
//!
//! The active log file is rolled into numbered backups once it holds
//! `max_lines` records, regardless of its size in bytes:
//!
//! ```text
//! notarizer.log    -> notarizer.log.1
//! notarizer.log.1  -> notarizer.log.2
//! ...
//! notarizer.log.N  (evicted)
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const LINE_TERMINATOR: &str = "\n";

/// Receives I/O errors raised while emitting, together with the record being emitted
pub type FallbackHandler = Box<dyn Fn(&io::Error, &str) + Send>;

/// Counters owned by the sink, reset on every rollover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotationState {
    pub line_count: usize,
    pub max_lines: usize,
    pub backup_count: usize,
}

/// Numbered backup slots `<log>.1` .. `<log>.N`
#[derive(Debug, Clone)]
pub struct BackupSlots {
    base: PathBuf,
    count: usize,
}

impl BackupSlots {
    pub fn new(base: impl Into<PathBuf>, count: usize) -> Self {
        Self {
            base: base.into(),
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Path of slot `index` (1-based)
    pub fn slot(&self, index: usize) -> PathBuf {
        let mut name = self.base.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Shift every backup one slot up, highest index first.
    ///
    /// Slot 1 is empty afterwards; the content of slot N is discarded.
    pub fn shift(&self) -> io::Result<()> {
        for i in (1..self.count).rev() {
            let src = self.slot(i);
            let dst = self.slot(i + 1);
            if src.exists() {
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }
        Ok(())
    }

    /// Move `active` into slot 1, replacing whatever was there
    pub fn store_first(&self, active: &Path) -> io::Result<()> {
        let first = self.slot(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(active, first)
    }
}

/// Append-only log file that rotates after a fixed number of lines
pub struct RotatingLogSink {
    path: PathBuf,
    stream: Option<File>,
    backups: BackupSlots,
    state: LogRotationState,
    fallback: FallbackHandler,
}

impl RotatingLogSink {
    /// Open (or create) the log file at `path`.
    ///
    /// Lines already present in the file count towards the first rotation.
    pub fn open(
        path: impl Into<PathBuf>,
        max_lines: usize,
        backup_count: usize,
    ) -> io::Result<Self> {
        let path = path.into();
        if max_lines == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max_lines must be at least 1",
            ));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line_count = if path.exists() {
            count_lines(&path)?
        } else {
            0
        };

        let stream = Self::open_stream(&path)?;

        Ok(Self {
            backups: BackupSlots::new(path.clone(), backup_count),
            path,
            stream: Some(stream),
            state: LogRotationState {
                line_count,
                max_lines,
                backup_count,
            },
            fallback: Box::new(report_to_stderr),
        })
    }

    /// Replace the handler that receives emit errors
    pub fn with_fallback(mut self, fallback: FallbackHandler) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> LogRotationState {
        self.state
    }

    pub fn backups(&self) -> &BackupSlots {
        &self.backups
    }

    /// Write one record. Errors never reach the caller.
    pub fn emit(&mut self, line: &str) {
        if let Err(e) = self.try_emit(line) {
            (self.fallback)(&e, line);
        }
    }

    /// Write one record, flush it, and roll over once the threshold is hit.
    ///
    /// A failed rollover leaves the record on disk and restarts the line
    /// count, so the next attempt happens after another `max_lines` records.
    pub fn try_emit(&mut self, line: &str) -> io::Result<()> {
        if self.stream.is_none() {
            // A previous rollover failed half way; try to get a stream back.
            self.stream = Some(Self::open_stream(&self.path)?);
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log stream unavailable"))?;

        stream.write_all(line.as_bytes())?;
        stream.write_all(LINE_TERMINATOR.as_bytes())?;
        stream.flush()?;

        self.state.line_count += 1;
        if self.state.line_count >= self.state.max_lines {
            if let Err(e) = self.rollover() {
                self.state.line_count = 0;
                return Err(io::Error::new(
                    e.kind(),
                    format!("log rotation failed (record was written): {}", e),
                ));
            }
        }
        Ok(())
    }

    /// Close the active file, shift backups, and start a fresh active file
    pub fn rollover(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.take() {
            stream.sync_all()?;
        }

        if self.backups.count() == 0 {
            // No backups kept: the rolled-over content is dropped.
            fs::remove_file(&self.path)?;
        } else {
            self.backups.shift()?;
            self.backups.store_first(&self.path)?;
        }

        self.stream = Some(Self::open_stream(&self.path)?);
        self.state.line_count = 0;
        Ok(())
    }

    fn open_stream(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }
}

fn count_lines(path: &Path) -> io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

fn report_to_stderr(error: &io::Error, line: &str) {
    eprintln!("--- Logging error ---\n{}\nRecord: {}", error, line);
}
