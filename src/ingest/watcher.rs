//! Recording-folder watcher.
//!
//! Subscribes to filesystem events for the watch directory and
//! dispatches each supported file to its own task, so settling one file
//! never delays detecting or settling another. The subscription loop
//! itself does no file I/O and no remote calls.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::filter::FormatFilter;
use super::guard::FlightGuard;
use super::settle::{await_settled, SettleConfig, SettleOutcome};
use crate::pipeline::{ProcessOutcome, Processor};

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to create watch directory {0}")]
    WatchDirUnavailable(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Directory to watch for new recordings
    pub watch_dir: PathBuf,

    /// File extensions to watch (without leading dots)
    pub extensions: Vec<String>,

    /// Debounce window for raw filesystem events
    pub debounce: Duration,

    /// Settle detection tuning
    pub settle: SettleConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            extensions: default_extensions(),
            debounce: Duration::from_secs(2),
            settle: SettleConfig::default(),
        }
    }
}

/// Default recordings directory (`~/Videos` or the platform equivalent)
pub fn default_watch_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join("Videos")
    })
}

/// Video formats the original recorder produces
pub fn default_extensions() -> Vec<String> {
    ["mp4", "mkv", "avi", "mov", "webm"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl WatcherConfig {
    /// Create the watch directory if it does not exist yet.
    pub fn ensure_watch_dir(&self) -> Result<(), WatchError> {
        std::fs::create_dir_all(&self.watch_dir)
            .map_err(|_| WatchError::WatchDirUnavailable(self.watch_dir.clone()))
    }
}

/// Terminal outcome for one dispatched file.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Pipeline completed and wrote a summary
    Completed {
        path: PathBuf,
        summary_path: PathBuf,
    },

    /// A summary for this recording already existed
    AlreadySummarized {
        path: PathBuf,
        summary_path: PathBuf,
    },

    /// Dropped during the settle phase (vanished or timed out)
    Dropped { path: PathBuf, reason: String },

    /// Guard denied admission; another run was already in flight
    Rejected { path: PathBuf },

    /// Pipeline failed; the watcher keeps running
    Failed { path: PathBuf, error: String },
}

impl WatchEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Completed { path, .. }
            | Self::AlreadySummarized { path, .. }
            | Self::Dropped { path, .. }
            | Self::Rejected { path }
            | Self::Failed { path, .. } => path,
        }
    }
}

/// Watch controller: event subscription plus per-file dispatch.
pub struct WatchController {
    config: WatcherConfig,
    processor: Arc<dyn Processor>,
}

impl WatchController {
    pub fn new(config: WatcherConfig, processor: Arc<dyn Processor>) -> Self {
        Self { config, processor }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Watch the directory and emit a `WatchEvent` per dispatched file.
    /// Runs until stopped via the returned handle.
    pub async fn watch(&self) -> Result<(mpsc::Receiver<WatchEvent>, WatchHandle), WatchError> {
        self.config.ensure_watch_dir()?;

        let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(100);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let config = self.config.clone();
        let processor = Arc::clone(&self.processor);

        // Spawn watcher task
        let handle = tokio::spawn(async move {
            if let Err(e) = run_watcher(config, processor, event_tx, &mut stop_rx).await {
                tracing::error!("Watcher error: {}", e);
            }
        });

        Ok((
            event_rx,
            WatchHandle {
                stop_tx,
                task: handle,
            },
        ))
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher, draining in-flight files first.
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Internal watcher loop
async fn run_watcher(
    config: WatcherConfig,
    processor: Arc<dyn Processor>,
    event_tx: mpsc::Sender<WatchEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) -> Result<()> {
    let filter = FormatFilter::new(config.extensions.clone());
    let guard = FlightGuard::new();

    // Create debounced watcher
    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(config.debounce, tx)?;
    debouncer
        .watcher()
        .watch(&config.watch_dir, RecursiveMode::NonRecursive)?;

    // Paths currently owned by a settle/process task. A path re-enters
    // dispatch only after its task reports back through done_tx;
    // re-entrant events for a file mid-settle are ignored.
    let mut dispatched: HashSet<PathBuf> = HashSet::new();
    let mut tasks: Vec<tokio::task::JoinHandle<()>> = Vec::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PathBuf>();

    tracing::info!(
        "Watching {} for new recordings ({})",
        config.watch_dir.display(),
        config.extensions.join(", ")
    );

    loop {
        // Check for stop signal
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        // Finished tasks free their path for future triggers
        while let Ok(path) = done_rx.try_recv() {
            dispatched.remove(&path);
        }
        tasks.retain(|task| !task.is_finished());

        // Check for file events (non-blocking with timeout)
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Ok(events)) => {
                for event in events {
                    let path = event.path;

                    if !filter.is_supported(&path) {
                        continue;
                    }

                    if dispatched.contains(&path) {
                        tracing::debug!(
                            "Already dispatched, ignoring event for {}",
                            path.display()
                        );
                        continue;
                    }

                    tracing::info!("New recording detected: {}", path.display());
                    dispatched.insert(path.clone());
                    tasks.push(tokio::spawn(settle_and_process(
                        path,
                        config.settle.clone(),
                        Arc::clone(&guard),
                        Arc::clone(&processor),
                        event_tx.clone(),
                        done_tx.clone(),
                    )));
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Watcher error: {:?}", e);
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                // Expected - continue to stop/done checks
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("Watcher channel disconnected");
                break;
            }
        }
    }

    // Stop producing events, then let in-flight files finish
    drop(debouncer);
    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

/// Per-file unit of work: settle, admit, process, report.
///
/// Every failure is converted into a `WatchEvent` here; nothing
/// propagates back to the watcher loop.
async fn settle_and_process(
    path: PathBuf,
    settle: SettleConfig,
    guard: Arc<FlightGuard>,
    processor: Arc<dyn Processor>,
    event_tx: mpsc::Sender<WatchEvent>,
    done_tx: mpsc::UnboundedSender<PathBuf>,
) {
    let event = match await_settled(&path, &settle).await {
        SettleOutcome::Settled { size } => {
            tracing::debug!("File settled at {} bytes: {}", size, path.display());

            match guard.try_acquire(&path) {
                Some(_permit) => match processor.process(&path).await {
                    Ok(ProcessOutcome::Completed { summary_path }) => {
                        tracing::info!("Summary written: {}", summary_path.display());
                        WatchEvent::Completed {
                            path: path.clone(),
                            summary_path,
                        }
                    }
                    Ok(ProcessOutcome::AlreadySummarized { summary_path }) => {
                        tracing::info!("Summary already exists for {}", path.display());
                        WatchEvent::AlreadySummarized {
                            path: path.clone(),
                            summary_path,
                        }
                    }
                    Err(e) => {
                        tracing::error!("Processing failed for {}: {}", path.display(), e);
                        WatchEvent::Failed {
                            path: path.clone(),
                            error: e.to_string(),
                        }
                    }
                },
                None => {
                    tracing::debug!("Run already in flight for {}", path.display());
                    WatchEvent::Rejected { path: path.clone() }
                }
            }
        }
        SettleOutcome::TimedOut => {
            tracing::warn!(
                "File did not settle before timeout, dropping: {}",
                path.display()
            );
            WatchEvent::Dropped {
                path: path.clone(),
                reason: "did not settle before timeout".to_string(),
            }
        }
        SettleOutcome::Vanished => {
            tracing::warn!("File vanished while settling: {}", path.display());
            WatchEvent::Dropped {
                path: path.clone(),
                reason: "vanished while settling".to_string(),
            }
        }
    };

    let _ = event_tx.send(event).await;
    let _ = done_tx.send(path);
}
