//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the remote
//! transcription/summarization service.

pub mod gemini;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{AssetHandle, StructuredSummary};

// Re-export the Gemini adapter
pub use gemini::{GeminiClient, DEFAULT_MODEL, DEFAULT_SUMMARY_PROMPT};

/// Remote transcription/summarization service.
///
/// Both operations may fail transiently (network) or permanently
/// (invalid credential, unsupported input); the pipeline maps either
/// into a per-step `ProcessingError`.
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// Human-readable service name
    fn name(&self) -> &str;

    /// Upload extracted audio; returns a handle usable with
    /// `summarize`.
    async fn upload(&self, audio_path: &Path) -> Result<AssetHandle>;

    /// Transcribe the uploaded audio and produce a structured summary
    /// using the given prompt template.
    async fn summarize(&self, asset: &AssetHandle, prompt: &str) -> Result<StructuredSummary>;
}
