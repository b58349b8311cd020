//! Export of the current results.
//!
//! Two artifacts: the JSON file with a fixed name that automation reads, and
//! a CSV lead sheet named after the query. Both read session results and
//! never mutate the session.

use std::path::{Path, PathBuf};

use mapscout_types::Place;
use thiserror::Error;

/// Fixed artifact name; external automation depends on it.
pub const EXPORT_FILE_NAME: &str = "map_data_export.json";

const CSV_FILE_PREFIX: &str = "google_maps_leads_";
const CSV_HEADER: [&str; 4] = ["title", "uri", "summary", "reviews"];
const REVIEW_SEPARATOR: &str = " | ";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pretty-printed (2-space) JSON array of `places` in display order.
pub fn render_export(places: &[Place]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(places)?)
}

/// Write `places` to `dir/map_data_export.json`, replacing any previous export.
pub fn write_export(dir: &Path, places: &[Place]) -> Result<PathBuf, ExportError> {
    let json = render_export(places)?;
    let path = dir.join(EXPORT_FILE_NAME);
    mapscout_utils::atomic_write(&path, json.as_bytes()).map_err(|source| {
        ExportError::Write {
            path: path.clone(),
            source,
        }
    })?;
    tracing::info!(path = %path.display(), places = places.len(), "Exported results");
    Ok(path)
}

/// Lowercased query with whitespace runs turned into `_`. Characters that
/// are not alphanumeric, `-` or `_` are dropped so the name stays inside the
/// export directory.
#[must_use]
pub fn query_slug(query: &str) -> String {
    let mut slug = String::with_capacity(query.len());
    for word in query.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        if word.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(&word);
    }
    if slug.is_empty() {
        slug.push_str("results");
    }
    slug
}

/// `google_maps_leads_{slug}.csv`
#[must_use]
pub fn csv_file_name(query: &str) -> String {
    format!("{CSV_FILE_PREFIX}{}.csv", query_slug(query))
}

/// CSV with a header row and one row per place. Absent summaries are empty
/// fields; review snippets are joined into one column.
pub fn render_csv(places: &[Place]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for place in places {
        let reviews = place.reviews().join(REVIEW_SEPARATOR);
        writer.write_record([
            place.title.as_str(),
            place.uri.as_str(),
            place.summary.as_deref().unwrap_or_default(),
            reviews.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Write `places` to `dir/google_maps_leads_{slug}.csv`.
pub fn write_csv(dir: &Path, query: &str, places: &[Place]) -> Result<PathBuf, ExportError> {
    let bytes = render_csv(places)?;
    let path = dir.join(csv_file_name(query));
    mapscout_utils::atomic_write(&path, &bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), places = places.len(), "Exported CSV");
    Ok(path)
}
