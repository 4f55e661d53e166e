//! Gemini API adapter.
//!
//! Uploads extracted audio through the Files API (resumable upload
//! protocol), waits for the file to become ACTIVE, then runs two
//! generateContent calls: a verbatim transcript of the audio, followed
//! by a structured summary of that transcript.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::SummaryService;
use crate::domain::{AssetHandle, StructuredSummary};

/// Model used for both transcription and summarization
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Prompt for the transcript pass
pub const TRANSCRIPT_PROMPT: &str =
    "Please transcribe this meeting audio word-for-word in English.";

/// Default summarization prompt. Overridable via configuration.
pub const DEFAULT_SUMMARY_PROMPT: &str = r#"You are an expert meeting summarizer.
Your task: produce a structured meeting summary as a single JSON object.

Rules:
- Return only JSON, with no markdown fences and no commentary.
- Every field must be present; use an empty list when nothing applies.
- Keep each entry concise and readable.

The JSON object must have exactly this shape:

{
  "overview": "concise summary of the meeting's purpose, date, and context",
  "key_topics": ["topic summary"],
  "decisions": ["decision"],
  "action_items": ["action item with responsible person and deadline if available"],
  "participants": [{"name": "participant name", "contribution": "their key input"}]
}
"#;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How long to wait between file-state polls after upload
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Give up if the uploaded file is still processing after this many polls
const FILE_POLL_ATTEMPTS: u32 = 60;

/// Gemini API client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client for the given credential and model.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        )
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Run one generateContent call and return the concatenated
    /// candidate text.
    async fn generate(
        &self,
        parts: Vec<RequestPart>,
        config: Option<GenerationConfig>,
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts,
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .context("Failed to send generateContent request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read generateContent response")?;

        if !status.is_success() {
            anyhow::bail!("{}", format_api_error(status, &body));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Failed to parse generateContent response")?;

        Ok(collect_text(&parsed))
    }

    /// Poll the file resource until the service reports it ACTIVE.
    async fn await_active(&self, mut file: RemoteFile) -> Result<RemoteFile> {
        let mut attempts = 0;

        while file.state.as_deref() == Some("PROCESSING") {
            attempts += 1;
            if attempts > FILE_POLL_ATTEMPTS {
                anyhow::bail!("uploaded file {} never became ACTIVE", file.name);
            }
            tokio::time::sleep(FILE_POLL_INTERVAL).await;

            let response = self
                .client
                .get(self.file_url(&file.name))
                .send()
                .await
                .context("Failed to poll uploaded file state")?;

            let status = response.status();
            let body = response
                .text()
                .await
                .context("Failed to read file state response")?;

            if !status.is_success() {
                anyhow::bail!("{}", format_api_error(status, &body));
            }

            file = serde_json::from_str(&body).context("Failed to parse file state response")?;
        }

        if file.state.as_deref() == Some("FAILED") {
            anyhow::bail!("service failed to process uploaded file {}", file.name);
        }

        Ok(file)
    }
}

#[async_trait]
impl SummaryService for GeminiClient {
    fn name(&self) -> &str {
        "Gemini API"
    }

    async fn upload(&self, audio_path: &Path) -> Result<AssetHandle> {
        let bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file {}", audio_path.display()))?;

        let display_name = audio_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        info!("Uploading {} ({} bytes)", display_name, bytes.len());

        // Resumable upload, step 1: announce the file and obtain the
        // upload session URL
        let start = self
            .client
            .post(self.upload_url())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", "audio/wav")
            .json(&serde_json::json!({
                "file": { "display_name": display_name }
            }))
            .send()
            .await
            .context("Failed to start upload")?;

        let status = start.status();
        if !status.is_success() {
            let body = start.text().await.unwrap_or_default();
            anyhow::bail!("{}", format_api_error(status, &body));
        }

        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .context("Upload start response carried no session URL")?
            .to_string();

        // Step 2: send the bytes and finalize
        let finish = self
            .client
            .post(&session_url)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", "0")
            .body(bytes)
            .send()
            .await
            .context("Failed to upload audio bytes")?;

        let status = finish.status();
        let body = finish
            .text()
            .await
            .context("Failed to read upload response")?;

        if !status.is_success() {
            anyhow::bail!("{}", format_api_error(status, &body));
        }

        let uploaded: UploadResponse =
            serde_json::from_str(&body).context("Failed to parse upload response")?;

        let file = self.await_active(uploaded.file).await?;
        info!("Upload accepted as {}", file.name);

        Ok(AssetHandle {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type.unwrap_or_else(|| "audio/wav".to_string()),
        })
    }

    async fn summarize(&self, asset: &AssetHandle, prompt: &str) -> Result<StructuredSummary> {
        info!("Transcribing {}", asset.name);

        let transcript = self
            .generate(
                vec![
                    RequestPart::file(&asset.mime_type, &asset.uri),
                    RequestPart::text(TRANSCRIPT_PROMPT),
                ],
                None,
            )
            .await?;

        if transcript.trim().is_empty() {
            anyhow::bail!("no transcription received");
        }
        debug!("Transcript: {} chars", transcript.len());

        info!("Generating summary");

        let summary_input = format!("{prompt}\n\nMeeting Transcript:\n{transcript}");
        let raw = self
            .generate(
                vec![RequestPart::text(&summary_input)],
                Some(GenerationConfig {
                    temperature: 0.3,
                    top_p: 1.0,
                    top_k: 40,
                    response_mime_type: Some("application/json".to_string()),
                }),
            )
            .await?;

        if raw.trim().is_empty() {
            anyhow::bail!("no summary generated");
        }

        let summary: StructuredSummary = serde_json::from_str(strip_code_fences(&raw))
            .context("Failed to parse structured summary response")?;

        info!("Summary received ({} topics)", summary.key_topics.len());

        Ok(summary)
    }
}

/// Models occasionally wrap JSON output in a markdown fence despite the
/// prompt; strip one if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (e.g. "json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.strip_suffix("```").map(str::trim).unwrap_or(body.trim())
}

/// Concatenate the text parts of every candidate.
fn collect_text(response: &GenerateResponse) -> String {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

/// Prefer the service's own error message; fall back to the raw body.
fn format_api_error(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "service error (HTTP {}): {}",
            status.as_u16(),
            parsed.error.message
        )
    } else {
        format!("service error (HTTP {}): {}", status.as_u16(), body.trim())
    }
}

// --- Wire format ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

impl RequestPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            file_data: None,
        }
    }

    fn file(mime_type: &str, uri: &str) -> Self {
        Self {
            text: None,
            file_data: Some(FileData {
                mime_type: mime_type.to_string(),
                file_uri: uri.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = GeminiClient::new("KEY".to_string(), "gemini-2.5-flash".to_string());
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=KEY"
        );
        assert_eq!(
            client.file_url("files/abc"),
            "https://generativelanguage.googleapis.com/v1beta/files/abc?key=KEY"
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_collect_candidate_text() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(collect_text(&response), "Hello world");

        let empty: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(collect_text(&empty), "");
    }

    #[test]
    fn test_parse_upload_response() {
        let body = r#"{"file": {"name": "files/abc", "uri": "https://example/files/abc",
                       "mimeType": "audio/wav", "state": "PROCESSING"}}"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.file.name, "files/abc");
        assert_eq!(parsed.file.state.as_deref(), Some("PROCESSING"));
        assert_eq!(parsed.file.mime_type.as_deref(), Some("audio/wav"));
    }

    #[test]
    fn test_format_api_error_prefers_service_message() {
        let body = r#"{"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let formatted = format_api_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(formatted, "service error (HTTP 400): API key not valid");

        let raw = format_api_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "quota exceeded");
        assert_eq!(raw, "service error (HTTP 429): quota exceeded");
    }
}
