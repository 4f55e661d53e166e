//! Processing Pipeline Integration Tests
//!
//! Runs the pipeline against fake extraction and summarization
//! backends: step failure mapping, temp-file cleanup, output naming,
//! skip-if-summarized, and failure isolation between files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use recap::pipeline::{summary_path_for, AudioExtractor, MeetingPipeline};
use recap::{
    AssetHandle, ParticipantContribution, ProcessOutcome, ProcessingError, Processor,
    StructuredSummary, SummaryService,
};

/// Extractor that copies the source bytes and records every temp path
/// it wrote, so tests can assert cleanup afterwards.
#[derive(Default)]
struct FakeExtractor {
    temp_paths: Mutex<Vec<PathBuf>>,
    fail_on: Option<String>,
}

impl FakeExtractor {
    fn failing_on(file_name: &str) -> Self {
        Self {
            temp_paths: Mutex::new(Vec::new()),
            fail_on: Some(file_name.to_string()),
        }
    }

    fn temp_paths(&self) -> Vec<PathBuf> {
        self.temp_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake-extractor"
    }

    async fn extract(&self, video: &Path, audio_out: &Path) -> Result<()> {
        self.temp_paths
            .lock()
            .unwrap()
            .push(audio_out.to_path_buf());

        if let Some(fail_on) = &self.fail_on {
            if video.file_name().unwrap_or_default().to_string_lossy() == *fail_on {
                anyhow::bail!("no audio stream");
            }
        }

        let bytes = tokio::fs::read(video).await?;
        tokio::fs::write(audio_out, bytes).await?;
        Ok(())
    }
}

/// Configurable fake remote service.
#[derive(Default)]
struct FakeService {
    uploads: AtomicU32,
    summaries: AtomicU32,
    fail_upload: bool,
    fail_summarize: bool,
    empty_summary: bool,
}

impl FakeService {
    fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryService for FakeService {
    fn name(&self) -> &str {
        "fake-service"
    }

    async fn upload(&self, audio_path: &Path) -> Result<AssetHandle> {
        self.uploads.fetch_add(1, Ordering::SeqCst);

        if self.fail_upload {
            anyhow::bail!("quota exhausted");
        }

        assert!(audio_path.exists(), "upload must see the extracted audio");

        Ok(AssetHandle {
            name: "files/fake".to_string(),
            uri: "https://example.invalid/files/fake".to_string(),
            mime_type: "audio/wav".to_string(),
        })
    }

    async fn summarize(&self, _asset: &AssetHandle, _prompt: &str) -> Result<StructuredSummary> {
        self.summaries.fetch_add(1, Ordering::SeqCst);

        if self.fail_summarize {
            anyhow::bail!("service unavailable");
        }

        if self.empty_summary {
            return Ok(StructuredSummary::default());
        }

        Ok(StructuredSummary {
            overview: "Sprint planning for the search feature".to_string(),
            key_topics: vec!["Indexing".to_string(), "Query latency".to_string()],
            decisions: vec!["Adopt incremental indexing".to_string()],
            action_items: vec!["Priya to benchmark the new index".to_string()],
            participants: vec![ParticipantContribution {
                name: "Priya".to_string(),
                contribution: "Presented latency measurements".to_string(),
            }],
        })
    }
}

fn pipeline_with(
    extractor: Arc<FakeExtractor>,
    service: Arc<FakeService>,
) -> MeetingPipeline {
    MeetingPipeline::new(extractor, service, "summarize this meeting".to_string())
}

async fn write_recording(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, b"fake video bytes").await.unwrap();
    path
}

#[tokio::test]
async fn test_success_writes_summary_beside_source() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "meeting.mp4").await;

    let extractor = Arc::new(FakeExtractor::default());
    let service = Arc::new(FakeService::default());
    let pipeline = pipeline_with(Arc::clone(&extractor), Arc::clone(&service));

    let outcome = pipeline.process(&video).await.unwrap();

    let expected = temp.path().join("meeting_summary.html");
    assert_eq!(
        outcome,
        ProcessOutcome::Completed {
            summary_path: expected.clone()
        }
    );
    assert!(expected.is_file());

    let html = tokio::fs::read_to_string(&expected).await.unwrap();
    assert!(html.contains("<h2>Meeting Overview</h2>"));
    assert!(html.contains("Sprint planning for the search feature"));
    assert!(html.contains("<strong>Priya</strong>"));

    // Temp audio is gone after a successful run
    for path in extractor.temp_paths() {
        assert!(!path.exists(), "temp audio left behind: {}", path.display());
    }
}

#[tokio::test]
async fn test_existing_summary_skips_remote_service() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "standup.mkv").await;

    let summary_path = summary_path_for(&video);
    tokio::fs::write(&summary_path, "<html>old summary</html>")
        .await
        .unwrap();

    let service = Arc::new(FakeService::default());
    let pipeline = pipeline_with(Arc::new(FakeExtractor::default()), Arc::clone(&service));

    let outcome = pipeline.process(&video).await.unwrap();

    assert_eq!(outcome, ProcessOutcome::AlreadySummarized { summary_path });
    assert_eq!(service.upload_count(), 0);
}

#[tokio::test]
async fn test_extraction_failure_maps_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "corrupt.mp4").await;

    let extractor = Arc::new(FakeExtractor::failing_on("corrupt.mp4"));
    let service = Arc::new(FakeService::default());
    let pipeline = pipeline_with(Arc::clone(&extractor), Arc::clone(&service));

    let err = pipeline.process(&video).await.unwrap_err();

    assert!(matches!(err, ProcessingError::ExtractionFailed(_)));
    assert_eq!(service.upload_count(), 0);
    assert!(!summary_path_for(&video).exists());

    for path in extractor.temp_paths() {
        assert!(!path.exists(), "temp audio left behind: {}", path.display());
    }
}

#[tokio::test]
async fn test_upload_failure_maps_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "allhands.webm").await;

    let extractor = Arc::new(FakeExtractor::default());
    let service = Arc::new(FakeService {
        fail_upload: true,
        ..Default::default()
    });
    let pipeline = pipeline_with(Arc::clone(&extractor), service);

    let err = pipeline.process(&video).await.unwrap_err();

    assert!(matches!(err, ProcessingError::UploadFailed(_)));
    assert!(!summary_path_for(&video).exists());

    for path in extractor.temp_paths() {
        assert!(!path.exists(), "temp audio left behind: {}", path.display());
    }
}

#[tokio::test]
async fn test_summarize_failure_maps() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "review.mov").await;

    let pipeline = pipeline_with(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeService {
            fail_summarize: true,
            ..Default::default()
        }),
    );

    let err = pipeline.process(&video).await.unwrap_err();
    assert!(matches!(err, ProcessingError::SummarizationFailed(_)));
}

#[tokio::test]
async fn test_empty_summary_is_a_summarization_failure() {
    let temp = TempDir::new().unwrap();
    let video = write_recording(&temp, "short.mp4").await;

    let pipeline = pipeline_with(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeService {
            empty_summary: true,
            ..Default::default()
        }),
    );

    let err = pipeline.process(&video).await.unwrap_err();
    assert!(matches!(err, ProcessingError::SummarizationFailed(_)));
    assert!(!summary_path_for(&video).exists());
}

#[tokio::test]
async fn test_failure_for_one_file_does_not_affect_the_next() {
    let temp = TempDir::new().unwrap();
    let bad = write_recording(&temp, "corrupt.mp4").await;
    let good = write_recording(&temp, "planning.mp4").await;

    let extractor = Arc::new(FakeExtractor::failing_on("corrupt.mp4"));
    let service = Arc::new(FakeService::default());
    let pipeline = pipeline_with(extractor, service);

    assert!(pipeline.process(&bad).await.is_err());

    let outcome = pipeline.process(&good).await.unwrap();
    assert!(matches!(outcome, ProcessOutcome::Completed { .. }));
    assert!(temp.path().join("planning_summary.html").is_file());
}
