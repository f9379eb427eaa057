//! HTTP client for the renderer's private control API
//!
//! The device embeds an application-level status code in every JSON body,
//! separate from the HTTP status. A status response only counts when HTTP is
//! 200 AND the embedded status is 200 AND the reported duration is positive;
//! anything else is a poll failure for the caller to absorb, never a crash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::PlayState;

const API_SUCCESS: i32 = 200;
const HTTP_TIMEOUT: Duration = Duration::from_secs(2);

/// Renderer API error types
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Renderer returned HTTP {0}")]
    Http(u16),

    #[error("Renderer api status {0}")]
    Api(i32),

    #[error("Invalid status payload: {0}")]
    InvalidPayload(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// One validated status snapshot from the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayStatus {
    pub state: PlayState,
    /// Current position; withheld by the device for some broken streams
    pub position_ms: Option<i64>,
    pub duration_ms: i64,
    /// Currently active audio track, renderer index space (0-based)
    pub audio_index: Option<u32>,
    /// Currently active subtitle track, renderer index space (1-based, 0=off)
    pub subtitle_index: Option<u32>,
    /// Hash of the reported path (or title), used to detect the renderer
    /// switching content underneath us
    pub fingerprint: Option<u64>,
}

/// The narrow surface the sync state machine needs from a renderer.
///
/// Commands are fire-and-forget: success means a parseable, status-OK
/// response and failures are the caller's to log and ignore.
#[async_trait]
pub trait RendererControl: Send + Sync {
    async fn play_status(&self) -> Result<PlayStatus, RendererError>;
    async fn set_audio_track(&self, index: u32) -> Result<(), RendererError>;
    async fn set_subtitle_track(&self, index: u32) -> Result<(), RendererError>;
    async fn seek(&self, position_ms: i64) -> Result<(), RendererError>;
}

/// Client for one renderer device.
///
/// Owns its connection pool; there is deliberately no shared process-wide
/// connection handle.
pub struct RendererClient {
    base_url: String,
    client: reqwest::Client,
}

impl RendererClient {
    /// Create a client for a renderer at `host` (e.g. "127.0.0.1:9529")
    pub fn new(host: impl AsRef<str>) -> Self {
        Self::with_base_url(format!("http://{}", host.as_ref()))
    }

    /// Create a client with a full base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .connect_timeout(HTTP_TIMEOUT)
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// GET a VideoPlay endpoint and validate the embedded status code
    async fn get_api(
        &self,
        command: &str,
        query: &[(&str, String)],
    ) -> Result<StatusResponse, RendererError> {
        let url = format!("{}/VideoPlay/{}", self.base_url, command);
        let response = self.client.get(&url).query(query).send().await?;

        let http_status = response.status();
        if http_status != reqwest::StatusCode::OK {
            return Err(RendererError::Http(http_status.as_u16()));
        }
        let body = response.text().await?;
        let parsed: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| RendererError::InvalidPayload(format!("JSON parse error: {}", e)))?;
        if parsed.status != API_SUCCESS {
            return Err(RendererError::Api(parsed.status));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl RendererControl for RendererClient {
    /// `GET /VideoPlay/getPlayStatus`
    async fn play_status(&self) -> Result<PlayStatus, RendererError> {
        let response = self.get_api("getPlayStatus", &[]).await?;
        let video = response
            .video
            .ok_or_else(|| RendererError::InvalidPayload("missing video object".into()))?;
        // sanity check that the device actually has our media loaded
        let duration = video.duration.unwrap_or(-1);
        if duration <= 0 {
            return Err(RendererError::InvalidPayload(format!(
                "non-positive duration <{}>",
                duration
            )));
        }
        // careful: don't trust positions of "broken" HLS streams
        let position_ms = video.current_position.filter(|p| *p >= 0);
        let fingerprint = video
            .path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or(video.title.as_deref().filter(|t| !t.trim().is_empty()))
            .map(identifier_fingerprint);

        Ok(PlayStatus {
            state: PlayState::from_code(video.status.unwrap_or(-1)),
            position_ms,
            duration_ms: duration,
            audio_index: response.audio.and_then(|a| a.index),
            subtitle_index: response.subtitle.and_then(|s| s.index),
            fingerprint,
        })
    }

    /// `GET /VideoPlay/setAudio?index=N` — audio indices start at 0
    async fn set_audio_track(&self, index: u32) -> Result<(), RendererError> {
        self.get_api("setAudio", &[("index", index.to_string())])
            .await
            .map(|_| ())
    }

    /// `GET /VideoPlay/setSubtitle?index=N` — index 0 turns subtitles off,
    /// real subtitle indices start at 1
    async fn set_subtitle_track(&self, index: u32) -> Result<(), RendererError> {
        self.get_api("setSubtitle", &[("index", index.to_string())])
            .await
            .map(|_| ())
    }

    /// `GET /VideoPlay/seekTo?positon=N` — the parameter name really is
    /// misspelled in the device firmware
    async fn seek(&self, position_ms: i64) -> Result<(), RendererError> {
        self.get_api("seekTo", &[("positon", position_ms.to_string())])
            .await
            .map(|_| ())
    }
}

/// Stable hash of the renderer-reported path/title
fn identifier_fingerprint(identifier: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    identifier.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: i32,
    video: Option<VideoStatusRaw>,
    audio: Option<TrackStatusRaw>,
    subtitle: Option<TrackStatusRaw>,
}

#[derive(Debug, Deserialize)]
struct VideoStatusRaw {
    status: Option<i32>,
    #[serde(rename = "currentPosition")]
    current_position: Option<i64>,
    duration: Option<i64>,
    path: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackStatusRaw {
    index: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = identifier_fingerprint("/storage/movies/clip.mkv");
        let b = identifier_fingerprint("/storage/movies/clip.mkv");
        let c = identifier_fingerprint("/storage/movies/other.mkv");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_status_response_parsing() {
        let body = r#"{
            "status": 200,
            "video": {
                "status": 1,
                "currentPosition": 93000,
                "duration": 5400000,
                "path": "/storage/movies/clip.mkv",
                "title": "clip"
            },
            "audio": { "index": 1 },
            "subtitle": { "index": 0 }
        }"#;
        let parsed: StatusResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, 200);
        let video = parsed.video.unwrap();
        assert_eq!(video.current_position, Some(93000));
        assert_eq!(parsed.audio.unwrap().index, Some(1));
        assert_eq!(parsed.subtitle.unwrap().index, Some(0));
    }
}
