//! Command-line interface for recap.
//!
//! Provides watch mode (monitor a folder continuously), single-file
//! mode, and a config dump. Invoked with no subcommand, it falls back
//! to an interactive mode menu.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::adapters::GeminiClient;
use crate::config::Settings;
use crate::ingest::{WatchController, WatchEvent};
use crate::pipeline::{FfmpegExtractor, MeetingPipeline, ProcessOutcome, Processor};

/// recap - automatic meeting-recording summarizer
#[derive(Parser, Debug)]
#[command(name = "recap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a folder and summarize new recordings as they appear
    Watch {
        /// Directory to watch (defaults to the configured watch folder)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Summarize a single recording and exit
    Process {
        /// Path to the recording
        file: PathBuf,
    },

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Some(Commands::Watch { dir }) => execute_watch(dir).await,
            Some(Commands::Process { file }) => execute_process(file).await,
            Some(Commands::Config) => execute_config().await,
            None => execute_menu().await,
        }
    }
}

/// Interactive mode selection, for invocations without a subcommand
async fn execute_menu() -> Result<()> {
    println!("recap - automatic meeting summarizer");
    println!();

    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select mode")
        .item("1. Watch a folder for new recordings")
        .item("2. Summarize a single recording")
        .default(0)
        .interact()?;

    match choice {
        0 => execute_watch(None).await,
        _ => {
            let path: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Recording file path")
                .interact_text()?;
            execute_process(PathBuf::from(path.trim())).await
        }
    }
}

/// Assemble the production pipeline.
///
/// Fails fast on a missing credential or a missing ffmpeg binary.
fn build_pipeline(settings: &Settings) -> Result<Arc<dyn Processor>> {
    let api_key = settings.api_key()?.to_string();
    let extractor = Arc::new(FfmpegExtractor::locate()?);
    let service = Arc::new(GeminiClient::new(api_key, settings.model.clone()));

    Ok(Arc::new(MeetingPipeline::new(
        extractor,
        service,
        settings.summary_prompt.clone(),
    )))
}

/// Watch mode: monitor the folder until interrupted
async fn execute_watch(dir: Option<PathBuf>) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(dir) = dir {
        settings.watch_dir = dir;
    }

    let processor = build_pipeline(&settings)?;
    let controller = WatchController::new(settings.watcher_config(), processor);

    println!("👁️  Watching: {}", settings.watch_dir.display());
    println!("    Formats: {}", settings.extensions.join(", "));
    println!("    Press Ctrl+C to stop");
    println!();

    let (mut event_rx, handle) = controller.watch().await?;

    // Set up Ctrl+C handler
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        let _ = stop_tx.send(());
    });

    // Event loop
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                print_event(&event);
            }
            _ = &mut stop_rx => {
                println!();
                println!("🛑 Stopping monitor...");
                handle.stop().await?;
                break;
            }
        }
    }

    // Outcomes that finished during the drain
    while let Ok(event) = event_rx.try_recv() {
        print_event(&event);
    }

    println!("✅ Monitor stopped");
    Ok(())
}

fn print_event(event: &WatchEvent) {
    let name = |path: &PathBuf| {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    };

    match event {
        WatchEvent::Completed { path, summary_path } => {
            println!("✅ {} → {}", name(path), name(summary_path));
        }
        WatchEvent::AlreadySummarized { path, .. } => {
            println!("⏭️  Summary already exists for {}", name(path));
        }
        WatchEvent::Dropped { path, reason } => {
            println!("⚠️  Dropped {}: {}", name(path), reason);
        }
        WatchEvent::Rejected { path } => {
            println!("⏭️  Already processing {}", name(path));
        }
        WatchEvent::Failed { path, error } => {
            println!("❌ Failed to process {}: {}", name(path), error);
        }
    }
}

/// Single-file mode: one pipeline run, then exit
async fn execute_process(file: PathBuf) -> Result<()> {
    let settings = Settings::load()?;

    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let processor = build_pipeline(&settings)?;

    println!("🎬 Processing: {}", file.display());

    match processor.process(&file).await {
        Ok(ProcessOutcome::Completed { summary_path }) => {
            println!("💾 Summary saved: {}", summary_path.display());
            Ok(())
        }
        Ok(ProcessOutcome::AlreadySummarized { summary_path }) => {
            println!("⏭️  Summary already exists: {}", summary_path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show the resolved configuration
async fn execute_config() -> Result<()> {
    let settings = Settings::load()?;

    println!();
    println!("recap Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file:       {}",
        settings
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Watch folder:      {}", settings.watch_dir.display());
    println!("Formats:           {}", settings.extensions.join(", "));
    println!("Model:             {}", settings.model);
    println!(
        "API key:           {}",
        if settings.has_api_key() {
            "configured"
        } else {
            "NOT SET (set GEMINI_API_KEY)"
        }
    );
    println!();
    println!("Settle detection:");
    println!(
        "  Poll interval:        {} ms",
        settings.settle.poll_interval.as_millis()
    );
    println!(
        "  Required stable reads: {}",
        settings.settle.required_stable_reads
    );
    println!(
        "  Timeout:              {} s",
        settings.settle.timeout.as_secs()
    );
    println!(
        "  Event debounce:       {} s",
        settings.debounce.as_secs()
    );
    println!();

    if settings.watch_dir.exists() {
        println!("✓ Watch folder exists");
    } else {
        println!("⚠️  Watch folder does not exist yet (created on first watch)");
    }

    Ok(())
}
