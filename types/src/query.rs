use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("search query must not be blank")]
pub struct EmptyQueryError;

/// A search string guaranteed to be non-empty, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyQueryError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Err(EmptyQueryError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<SearchQuery> for String {
    fn from(value: SearchQuery) -> Self {
        value.0
    }
}

impl AsRef<str> for SearchQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{EmptyQueryError, SearchQuery};

    #[test]
    fn trims_surrounding_whitespace() {
        let query = SearchQuery::new("  vegan bakeries \n").unwrap();
        assert_eq!(query.as_str(), "vegan bakeries");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(SearchQuery::new(""), Err(EmptyQueryError));
        assert_eq!(SearchQuery::new(" \t\n "), Err(EmptyQueryError));
    }

    #[test]
    fn keeps_inner_whitespace() {
        let query = SearchQuery::new("tacos  near   me").unwrap();
        assert_eq!(query.to_string(), "tacos  near   me");
    }
}
