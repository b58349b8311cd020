//! Google Gemini search collaborator.
//!
//! Sends one non-streaming `generateContent` request with the `googleMaps`
//! grounding tool enabled. Places come from the grounding chunks; the
//! analysis is the model's text answer.
//!
//! Note: Gemini API uses mixed casing (`system_instruction` is snake_case,
//! `generationConfig`/`toolConfig` are camelCase).

use std::collections::HashSet;

use serde_json::{Value, json};

use mapscout_types::{ApiKey, GeoLocation, ModelName, Place, SearchResponse};

use crate::{
    GEMINI_API_BASE_URL, SearchCollaborator, SearchError, SearchRequest, http_client,
    read_capped_error_body,
    wire::{self, FinishReason},
};

const SYSTEM_PROMPT: &str = "You are a local market research assistant. \
Use Google Maps to find real businesses that match the user's request. \
After finding them, write a concise market analysis covering how crowded the \
category is, standout options, common strengths and complaints from reviews, \
and any gap a new business could fill. Separate paragraphs with a blank line. \
Do not invent businesses that Maps did not return.";

const TEMPERATURE: f64 = 0.4;

/// Gemini-backed [`SearchCollaborator`].
#[derive(Debug, Clone)]
pub struct GeminiSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    model: ModelName,
}

impl GeminiSearch {
    #[must_use]
    pub fn new(api_key: ApiKey, model: ModelName) -> Self {
        Self {
            client: http_client().clone(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            api_key,
            model,
        }
    }

    /// Point at a different endpoint with a caller-supplied client.
    #[must_use]
    pub fn with_endpoint(mut self, base_url: impl Into<String>, client: reqwest::Client) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.client = client;
        self
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl SearchCollaborator for GeminiSearch {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let body = build_request_body(&request);
        tracing::debug!(
            model = %self.model,
            has_location = request.location.is_some(),
            "Sending Gemini search request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(%status, "Gemini search request failed");
            return Err(api_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        let parsed: wire::Response = serde_json::from_slice(&bytes)
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        let result = parse_response(parsed)?;
        tracing::debug!(places = result.places.len(), "Gemini search complete");
        Ok(result)
    }
}

/// Build the user prompt, folding in the optional area hint.
pub(crate) fn build_prompt(request: &SearchRequest) -> String {
    let mut prompt = format!("Find local businesses for: {}", request.query);
    if let Some(area) = &request.area_hint {
        prompt.push_str(&format!("\nArea: {}", area.trim()));
    } else if request.location.is_some() {
        prompt.push_str("\nArea: near my current location");
    }
    prompt
}

fn lat_lng(location: GeoLocation) -> Value {
    json!({
        "latitude": location.latitude(),
        "longitude": location.longitude(),
    })
}

pub(crate) fn build_request_body(request: &SearchRequest) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(
        "system_instruction".into(),
        json!({ "parts": [{ "text": SYSTEM_PROMPT }] }),
    );
    body.insert(
        "contents".into(),
        json!([{
            "role": "user",
            "parts": [{ "text": build_prompt(request) }]
        }]),
    );
    body.insert("tools".into(), json!([{ "googleMaps": {} }]));
    if let Some(location) = request.location {
        body.insert(
            "toolConfig".into(),
            json!({ "retrievalConfig": { "latLng": lat_lng(location) } }),
        );
    }
    body.insert(
        "generationConfig".into(),
        json!({ "temperature": TEMPERATURE }),
    );
    Value::Object(body)
}

fn api_error(status: u16, body: &str) -> SearchError {
    let message = serde_json::from_str::<wire::ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API error {status}"));
    SearchError::Api {
        status: Some(status),
        message,
    }
}

pub(crate) fn parse_response(response: wire::Response) -> Result<SearchResponse, SearchError> {
    if let Some(error) = response.error {
        return Err(SearchError::Api {
            status: error.code,
            message: error.message.unwrap_or_default(),
        });
    }

    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(SearchError::Blocked(format!("Prompt blocked: {reason}")));
        }
        return Err(SearchError::Decode("response contained no candidates".into()));
    };

    if let Some(message) = candidate
        .finish_reason
        .as_deref()
        .map(FinishReason::parse)
        .and_then(FinishReason::error_message)
    {
        return Err(SearchError::Blocked(message.to_string()));
    }

    let analysis = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect::<String>()
        .trim()
        .to_string();

    let chunks = candidate
        .grounding_metadata
        .and_then(|meta| meta.grounding_chunks)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let places = chunks
        .into_iter()
        .filter_map(|chunk| chunk.maps)
        .filter_map(place_from_chunk)
        .filter(|place| seen.insert(place.uri.clone()))
        .collect();

    Ok(SearchResponse { places, analysis })
}

fn place_from_chunk(chunk: wire::MapsChunk) -> Option<Place> {
    let title = chunk.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
    let uri = chunk.uri.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;

    let mut place = Place::new(title, uri);
    if let Some(summary) = chunk.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        place = place.with_summary(summary);
    }
    let reviews: Vec<String> = chunk
        .place_answer_sources
        .and_then(|sources| sources.review_snippets)
        .unwrap_or_default()
        .into_iter()
        .filter_map(wire::ReviewSnippet::into_text)
        .collect();
    if !reviews.is_empty() {
        place = place.with_review_snippets(reviews);
    }
    Some(place)
}
