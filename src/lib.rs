//! recap - Automatic meeting-recording summarizer
//!
//! Watches a folder for new meeting video recordings, extracts the audio
//! track, sends it to the Gemini API for transcription and structured
//! summarization, and writes an HTML summary beside the source file.
//!
//! # Architecture
//!
//! Each detected file flows through a fixed sequence:
//! - The watcher filters events by extension and dispatches each
//!   candidate to its own task
//! - The settle detector waits until the file has stopped growing
//! - The single-flight guard admits at most one pipeline run per path
//! - The pipeline extracts audio, calls the remote service, and writes
//!   the summary
//!
//! # Modules
//!
//! - `adapters`: External system integrations (Gemini)
//! - `ingest`: Watching, settling, and admission of new recordings
//! - `pipeline`: Per-file processing (extract, summarize, render)
//! - `domain`: Data structures (StructuredSummary, AssetHandle)
//! - `config`: Settings loading (YAML file + environment)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Watch a folder for new recordings
//! recap watch --dir ~/Videos
//!
//! # Summarize a single recording
//! recap process meeting.mp4
//!
//! # Show resolved configuration
//! recap config
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod pipeline;

// Re-export main types at crate root for convenience
pub use adapters::{GeminiClient, SummaryService};
pub use config::Settings;
pub use domain::{AssetHandle, ParticipantContribution, StructuredSummary};
pub use ingest::{
    await_settled, FlightGuard, FlightPermit, FormatFilter, SettleConfig, SettleOutcome,
    WatchController, WatchEvent, WatcherConfig,
};
pub use pipeline::{MeetingPipeline, ProcessOutcome, ProcessingError, Processor};
