use crate::error::{NotarizerError, NotarizerResult};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;

/// Result of polling a file until its size settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityOutcome {
    pub stable: bool,
    /// Number of size reads performed
    pub attempts: u32,
    /// Size seen on the last read
    pub last_size: u64,
}

/// Polls a file's size until two consecutive reads agree.
///
/// A zero-byte file is never stable: an empty read cannot be told apart from a
/// writer that has not started yet.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    interval: Duration,
    retries: u32,
}

impl StabilityDetector {
    pub fn new(interval: Duration, retries: u32) -> Self {
        Self { interval, retries }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Wait for the file at `path` to stop growing.
    ///
    /// A failed size read (file removed mid-poll) is returned as an error
    /// instead of being retried.
    pub async fn wait_for_stability(&self, path: &Path) -> NotarizerResult<StabilityOutcome> {
        self.poll(|| std::fs::metadata(path).map(|m| m.len()))
            .await
            .map_err(|e| NotarizerError::StabilityCheckFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Run the polling loop against an arbitrary size source
    pub async fn poll<F>(&self, mut read_size: F) -> io::Result<StabilityOutcome>
    where
        F: FnMut() -> io::Result<u64>,
    {
        let mut previous: Option<u64> = None;
        let mut last_size = 0;

        for attempt in 1..=self.retries {
            let size = read_size()?;
            if previous == Some(size) && size > 0 {
                return Ok(StabilityOutcome {
                    stable: true,
                    attempts: attempt,
                    last_size: size,
                });
            }
            previous = Some(size);
            last_size = size;

            if attempt < self.retries {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(StabilityOutcome {
            stable: false,
            attempts: self.retries,
            last_size,
        })
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_finished_file_is_stable_by_second_check() {
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        temp_file.write_all(b"hello").unwrap();
        temp_file.flush().unwrap();

        let detector = StabilityDetector::new(Duration::ZERO, 2);
        let outcome = detector.wait_for_stability(temp_file.path()).await.unwrap();

        assert!(outcome.stable);
        assert!(outcome.attempts <= 2);
        assert_eq!(outcome.last_size, 5);
    }

    #[tokio::test]
    async fn test_growing_file_exhausts_retries() {
        let detector = StabilityDetector::new(Duration::ZERO, 6);
        let mut size = 0u64;
        let mut reads = 0u32;

        let outcome = detector
            .poll(|| {
                reads += 1;
                size += 1024;
                Ok(size)
            })
            .await
            .unwrap();

        assert!(!outcome.stable);
        assert_eq!(outcome.attempts, 6);
        assert_eq!(reads, 6);
    }

    #[tokio::test]
    async fn test_empty_file_is_never_stable() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();

        let detector = StabilityDetector::new(Duration::ZERO, 4);
        let outcome = detector.wait_for_stability(temp_file.path()).await.unwrap();

        assert!(!outcome.stable);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.last_size, 0);
    }

    #[tokio::test]
    async fn test_settles_after_growth_stops() {
        let detector = StabilityDetector::new(Duration::ZERO, 10);
        let sizes = [0u64, 100, 200, 300, 300];
        let mut next = 0;

        let outcome = detector
            .poll(|| {
                let size = sizes[next.min(sizes.len() - 1)];
                next += 1;
                Ok(size)
            })
            .await
            .unwrap();

        assert!(outcome.stable);
        assert_eq!(outcome.attempts, 5);
        assert_eq!(outcome.last_size, 300);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let detector = StabilityDetector::new(Duration::ZERO, 3);
        let result = detector
            .wait_for_stability(Path::new("/nonexistent/incoming.bin"))
            .await;

        assert!(matches!(
            result,
            Err(NotarizerError::StabilityCheckFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_error_stops_polling() {
        let detector = StabilityDetector::new(Duration::ZERO, 5);
        let mut reads = 0;

        let result = detector
            .poll(|| {
                reads += 1;
                if reads == 2 {
                    Err(io::Error::new(io::ErrorKind::NotFound, "deleted"))
                } else {
                    Ok(10)
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(reads, 2);
    }

    #[tokio::test]
    async fn test_zero_retries_is_unstable() {
        let detector = StabilityDetector::new(Duration::ZERO, 0);
        let outcome = detector.poll(|| Ok(42)).await.unwrap();
        assert!(!outcome.stable);
        assert_eq!(outcome.attempts, 0);
    }
}
