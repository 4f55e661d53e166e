//! Per-file processing pipeline.
//!
//! One admitted recording flows through a strictly sequential chain:
//! extract audio → upload → summarize → render HTML → write. Each step
//! is a distinct failure with its own `ProcessingError` variant; there
//! is no automatic retry and no partial-result persistence. The temp
//! audio file is removed on every exit path.

pub mod extract;
pub mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::adapters::SummaryService;

pub use extract::{AudioExtractor, FfmpegExtractor};
pub use render::summary_path_for;

/// Errors from the processing pipeline, one variant per step.
///
/// All of these are terminal for the file: logged, guard released, temp
/// files cleaned, no automatic retry.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("audio extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("upload to summarization service failed: {0}")]
    UploadFailed(String),

    #[error("summarization failed: {0}")]
    SummarizationFailed(String),

    #[error("failed to write summary: {0}")]
    WriteFailed(String),
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Summary generated and written
    Completed { summary_path: PathBuf },

    /// A summary for this recording already existed; the remote service
    /// was not contacted
    AlreadySummarized { summary_path: PathBuf },
}

impl ProcessOutcome {
    pub fn summary_path(&self) -> &PathBuf {
        match self {
            Self::Completed { summary_path } | Self::AlreadySummarized { summary_path } => {
                summary_path
            }
        }
    }
}

/// Anything that can turn a recording into a summary file.
///
/// The watcher depends on this trait rather than the concrete pipeline
/// so dispatch behavior can be tested without ffmpeg or a network.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, path: &Path) -> Result<ProcessOutcome, ProcessingError>;
}

/// One pipeline invocation for one source file.
#[derive(Debug, Clone)]
pub struct ProcessingJob {
    /// Job id, for log correlation
    pub id: Uuid,

    /// The recording being processed
    pub source: PathBuf,

    /// Where the summary will be written
    pub summary_path: PathBuf,

    /// When the job was admitted
    pub started_at: DateTime<Utc>,
}

impl ProcessingJob {
    pub fn new(source: &Path) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.to_path_buf(),
            summary_path: render::summary_path_for(source),
            started_at: Utc::now(),
        }
    }
}

/// The production pipeline: ffmpeg extraction plus a remote
/// summarization service.
pub struct MeetingPipeline {
    extractor: Arc<dyn AudioExtractor>,
    service: Arc<dyn SummaryService>,
    prompt: String,
}

impl MeetingPipeline {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        service: Arc<dyn SummaryService>,
        prompt: String,
    ) -> Self {
        Self {
            extractor,
            service,
            prompt,
        }
    }
}

#[async_trait]
impl Processor for MeetingPipeline {
    async fn process(&self, path: &Path) -> Result<ProcessOutcome, ProcessingError> {
        let job = ProcessingJob::new(path);

        if tokio::fs::try_exists(&job.summary_path).await.unwrap_or(false) {
            tracing::info!(job = %job.id, "Summary already exists, skipping {}", path.display());
            return Ok(ProcessOutcome::AlreadySummarized {
                summary_path: job.summary_path,
            });
        }

        tracing::info!(job = %job.id, "Processing {}", path.display());

        // Temp audio lives for the whole job; the handle deletes the
        // file on drop, so every early return below cleans up.
        let audio = tempfile::Builder::new()
            .prefix("recap-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| ProcessingError::ExtractionFailed(format!("temp file: {e}")))?;

        self.extractor
            .extract(path, audio.path())
            .await
            .map_err(|e| ProcessingError::ExtractionFailed(format!("{e:#}")))?;
        tracing::info!(job = %job.id, "Audio extracted via {}", self.extractor.name());

        let asset = self
            .service
            .upload(audio.path())
            .await
            .map_err(|e| ProcessingError::UploadFailed(format!("{e:#}")))?;
        tracing::info!(job = %job.id, "Uploaded audio as {}", asset.name);

        let summary = self
            .service
            .summarize(&asset, &self.prompt)
            .await
            .map_err(|e| ProcessingError::SummarizationFailed(format!("{e:#}")))?;

        if summary.is_empty() {
            return Err(ProcessingError::SummarizationFailed(
                "service returned an empty summary".to_string(),
            ));
        }

        let source_name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let html = render::render_document(&source_name, &summary, Local::now());

        tokio::fs::write(&job.summary_path, html)
            .await
            .map_err(|e| {
                ProcessingError::WriteFailed(format!("{}: {e}", job.summary_path.display()))
            })?;

        let elapsed = Utc::now() - job.started_at;
        tracing::info!(
            job = %job.id,
            "Summary saved to {} ({}s)",
            job.summary_path.display(),
            elapsed.num_seconds()
        );

        Ok(ProcessOutcome::Completed {
            summary_path: job.summary_path,
        })
    }
}
