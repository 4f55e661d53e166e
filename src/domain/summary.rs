//! Structured summary types.
//!
//! The remote service returns the meeting summary as structured JSON;
//! these types are the parsed form the renderer consumes.

use serde::{Deserialize, Serialize};

/// Opaque reference to an audio file accepted by the remote service.
///
/// Returned by `SummaryService::upload` and consumed by
/// `SummaryService::summarize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetHandle {
    /// Resource name on the service (e.g. `files/abc-123`)
    pub name: String,

    /// URI used to reference the asset in generation requests
    pub uri: String,

    /// MIME type the service recorded for the asset
    pub mime_type: String,
}

/// One participant's key input, as reported by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantContribution {
    pub name: String,
    pub contribution: String,
}

/// Structured meeting summary returned by the remote service.
///
/// Every list field defaults to empty so a partial response still
/// parses; an entirely empty summary is rejected by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSummary {
    /// Concise summary of the meeting's purpose and context
    #[serde(default)]
    pub overview: String,

    /// Key topics discussed
    #[serde(default)]
    pub key_topics: Vec<String>,

    /// Decisions made
    #[serde(default)]
    pub decisions: Vec<String>,

    /// Action items / next steps
    #[serde(default)]
    pub action_items: Vec<String>,

    /// Per-participant contributions
    #[serde(default)]
    pub participants: Vec<ParticipantContribution>,
}

impl StructuredSummary {
    /// True when the service returned no usable content at all.
    pub fn is_empty(&self) -> bool {
        self.overview.trim().is_empty()
            && self.key_topics.is_empty()
            && self.decisions.is_empty()
            && self.action_items.is_empty()
            && self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        assert!(StructuredSummary::default().is_empty());

        let summary = StructuredSummary {
            overview: "   ".to_string(),
            ..Default::default()
        };
        assert!(summary.is_empty());
    }

    #[test]
    fn test_partial_response_parses() {
        let json = r#"{"overview": "Weekly sync", "key_topics": ["roadmap"]}"#;
        let summary: StructuredSummary = serde_json::from_str(json).unwrap();

        assert_eq!(summary.overview, "Weekly sync");
        assert_eq!(summary.key_topics, vec!["roadmap".to_string()]);
        assert!(summary.decisions.is_empty());
        assert!(!summary.is_empty());
    }
}
