//! Original-language hint lookup (TMDB)
//!
//! Best-effort metadata query feeding the Original audio policy: what
//! language was this title produced in? Keyed by the item's external
//! provider ids. Any miss degrades to locale-based selection, so callers
//! treat every failure as "no hint".
//! API docs: https://developer.themoviedb.org/docs

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{MediaItem, MediaKind};

/// Hint lookup error types
#[derive(Error, Debug)]
pub enum HintError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Rate limited (429), retries exhausted")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// TMDB client reduced to the original-language lookup
pub struct OriginalLanguageClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OriginalLanguageClient {
    /// Create a new client with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.themoviedb.org/3")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(3))
                .build()
                .unwrap_or_default(),
            max_retries: 2,
        }
    }

    /// Make an authenticated GET request with retry logic for rate limits
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T, HintError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut retries = 0;

        loop {
            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Accept", "application/json")
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    let parsed: T = serde_json::from_str(&body).map_err(|e| {
                        HintError::InvalidResponse(format!("JSON parse error: {}", e))
                    })?;
                    return Ok(parsed);
                }
                StatusCode::NOT_FOUND => {
                    return Err(HintError::NotFound);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(HintError::RateLimited);
                    }

                    let wait_secs = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(2u64.pow(retries));

                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    continue;
                }
                status => {
                    return Err(HintError::ServerError(status.as_u16()));
                }
            }
        }
    }

    /// Look up the item's original language tag ("ja", "ko", ...).
    ///
    /// Movies and series resolve through their TMDB id; series with only a
    /// TVDB id go through the find endpoint. Items without provider ids
    /// yield `Ok(None)`.
    pub async fn original_language(&self, item: &MediaItem) -> Result<Option<String>, HintError> {
        let language = match (item.kind, &item.tmdb_id, &item.tvdb_id) {
            (MediaKind::Movie, Some(tmdb_id), _) => {
                let response: LanguageResponse =
                    self.get(&format!("/movie/{}", tmdb_id)).await?;
                response.original_language
            }
            (MediaKind::Series, Some(tmdb_id), _) => {
                let response: LanguageResponse = self.get(&format!("/tv/{}", tmdb_id)).await?;
                response.original_language
            }
            (MediaKind::Series, None, Some(tvdb_id)) => {
                let response: FindResponse = self
                    .get(&format!("/find/{}?external_source=tvdb_id", tvdb_id))
                    .await?;
                response
                    .tv_results
                    .into_iter()
                    .next()
                    .and_then(|r| r.original_language)
            }
            _ => {
                debug!("No provider ids on {}, skipping hint lookup", item);
                None
            }
        };
        if let Some(language) = &language {
            debug!("Original language for {} is <{}>", item, language);
        }
        Ok(language)
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct LanguageResponse {
    original_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    tv_results: Vec<LanguageResponse>,
}
