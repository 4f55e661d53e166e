//! Audio extraction backend.
//!
//! Shells out to ffmpeg to pull the audio track out of a video file as
//! 16 kHz mono PCM, the format the transcription service handles best.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Extracts the audio track of a video into a wav file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Extract audio from `video` into `audio_out`.
    async fn extract(&self, video: &Path, audio_out: &Path) -> Result<()>;
}

/// ffmpeg-based extractor.
pub struct FfmpegExtractor {
    binary: PathBuf,
}

impl FfmpegExtractor {
    /// Locate ffmpeg via `FFMPEG_PATH` or the system PATH.
    pub fn locate() -> Result<Self> {
        let binary = match std::env::var_os("FFMPEG_PATH") {
            Some(path) => PathBuf::from(path),
            None => which::which("ffmpeg")
                .context("ffmpeg not found on PATH; install it or set FFMPEG_PATH")?,
        };

        Ok(Self { binary })
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn extract(&self, video: &Path, audio_out: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("-nostdin")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(audio_out)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg failed: {}", stderr_tail(&stderr, 4));
        }

        Ok(())
    }
}

/// Last `n` non-empty lines of ffmpeg's stderr; the banner above them
/// is noise.
fn stderr_tail(stderr: &str, n: usize) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = "banner\n\nversion info\nerror: no audio stream\n";
        assert_eq!(stderr_tail(stderr, 1), "error: no audio stream");
        assert_eq!(
            stderr_tail(stderr, 2),
            "version info\nerror: no audio stream"
        );
    }

    #[test]
    fn test_stderr_tail_short_input() {
        assert_eq!(stderr_tail("one line", 4), "one line");
        assert_eq!(stderr_tail("", 4), "");
    }
}
