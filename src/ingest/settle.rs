//! File settle detection.
//!
//! A newly created recording may still be growing (mid-copy or
//! mid-record). The detector samples size and mtime on a fixed interval
//! and reports the file settled only after a run of identical non-empty
//! samples.
//!
//! Runs inside the per-file task, never on the watcher's event loop.

use std::path::Path;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Tuning for settle detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleConfig {
    /// Time between samples
    pub poll_interval: Duration,

    /// Consecutive identical samples required before a file counts as
    /// settled
    pub required_stable_reads: u32,

    /// Overall limit; a file still changing past this is dropped
    pub timeout: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            required_stable_reads: 3,
            timeout: Duration::from_secs(600),
        }
    }
}

/// Outcome of waiting for a file to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Size and mtime were unchanged across the required number of
    /// samples, and the file is non-empty
    Settled { size: u64 },

    /// The file kept changing past the configured timeout
    TimedOut,

    /// The file disappeared between samples
    Vanished,
}

/// One (size, mtime) observation of the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    size: u64,
    mtime: Option<SystemTime>,
}

/// Wait until `path` has stopped changing.
///
/// A zero-byte file never counts toward stability: placeholder files
/// are often created before the real write begins, and processing one
/// would hand an empty recording to the pipeline.
pub async fn await_settled(path: &Path, config: &SettleConfig) -> SettleOutcome {
    let deadline = Instant::now() + config.timeout;
    let mut last: Option<Sample> = None;
    let mut stable_reads: u32 = 0;

    loop {
        let sample = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Sample {
                size: meta.len(),
                mtime: meta.modified().ok(),
            },
            Ok(_) => {
                tracing::debug!("Not a regular file, dropping: {}", path.display());
                return SettleOutcome::Vanished;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return SettleOutcome::Vanished;
            }
            Err(e) => {
                tracing::warn!("Failed to stat {}: {}", path.display(), e);
                return SettleOutcome::Vanished;
            }
        };

        if sample.size == 0 {
            stable_reads = 0;
        } else if last == Some(sample) {
            stable_reads += 1;
        } else {
            stable_reads = 1;
        }
        last = Some(sample);

        if stable_reads >= config.required_stable_reads {
            return SettleOutcome::Settled { size: sample.size };
        }

        if Instant::now() + config.poll_interval > deadline {
            return SettleOutcome::TimedOut;
        }

        tokio::time::sleep(config.poll_interval).await;
    }
}
