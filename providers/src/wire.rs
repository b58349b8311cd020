//! Typed `generateContent` response structures.
//!
//! Only the fields mapscout reads are modeled; everything else is ignored by
//! serde. All fields are optional because Gemini omits empty collections.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Response {
    pub candidates: Option<Vec<Candidate>>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Content {
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Part {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

/// A grounding source. Maps-grounded answers populate `maps`; web-grounded
/// answers populate `web`, which mapscout ignores.
#[derive(Debug, Deserialize)]
pub(crate) struct GroundingChunk {
    pub maps: Option<MapsChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MapsChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub place_answer_sources: Option<PlaceAnswerSources>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaceAnswerSources {
    pub review_snippets: Option<Vec<ReviewSnippet>>,
}

/// Review snippet. Depending on API revision the quoted text arrives as
/// `review`, `quote` or `text`; `title` is the last resort.
#[derive(Debug, Deserialize)]
pub(crate) struct ReviewSnippet {
    pub review: Option<String>,
    pub quote: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
}

impl ReviewSnippet {
    pub(crate) fn into_text(self) -> Option<String> {
        [self.review, self.quote, self.text, self.title]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorInfo {
    pub message: Option<String>,
    pub code: Option<u16>,
}

/// Top-level error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Blocklist,
    ProhibitedContent,
    Spii,
    Other,
    Unknown,
}

impl FinishReason {
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" => Self::Safety,
            "RECITATION" => Self::Recitation,
            "LANGUAGE" => Self::Language,
            "BLOCKLIST" => Self::Blocklist,
            "PROHIBITED_CONTENT" => Self::ProhibitedContent,
            "SPII" => Self::Spii,
            "OTHER" => Self::Other,
            _ => Self::Unknown,
        }
    }

    /// Returns the failure message for blocking reasons, `None` otherwise.
    pub(crate) fn error_message(self) -> Option<&'static str> {
        match self {
            Self::Stop | Self::MaxTokens | Self::Unknown => None,
            Self::Safety => Some("Content filtered by safety settings"),
            Self::Recitation => Some("Response blocked: recitation"),
            Self::Language => Some("Unsupported language"),
            Self::Blocklist => Some("Content contains blocked terms"),
            Self::ProhibitedContent => Some("Prohibited content detected"),
            Self::Spii => Some("Sensitive PII detected"),
            Self::Other => Some("Generation stopped: unknown reason"),
        }
    }
}
