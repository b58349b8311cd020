use std::borrow::Cow;

use thiserror::Error;

/// Model used when neither config nor CLI name one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelParseError {
    #[error("model name cannot be empty")]
    Empty,
    #[error("{0} is not a Gemini model (expected a `gemini-` prefix)")]
    NotGemini(String),
}

/// A Gemini model identifier, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName(Cow<'static, str>);

impl ModelName {
    pub fn parse(raw: &str) -> Result<Self, ModelParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ModelParseError::Empty);
        }
        let normalized = trimmed.trim_start_matches("models/").to_ascii_lowercase();
        if !normalized.starts_with("gemini-") {
            return Err(ModelParseError::NotGemini(trimmed.to_string()));
        }
        if normalized == DEFAULT_MODEL {
            return Ok(Self::default());
        }
        Ok(Self(Cow::Owned(normalized)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_MODEL))
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gemini API key.
///
/// `Debug` is manually implemented to redact the key value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank keys so an empty env var is treated as unset.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}
