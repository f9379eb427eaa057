//! Data structures and types for rendersync
//!
//! Contains all shared models used across the crate organized by domain:
//! - **Streams**: media stream descriptors as reported by the server
//! - **Preferences**: resolved user policy consumed by the selection engine
//! - **Items**: the media item being played, with external provider ids
//! - **Renderer**: play/session states reported by the external renderer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for "subtitles explicitly off" in the internal index space.
///
/// Distinct from "no opinion" (`None`), which leaves the renderer's own
/// default alone.
pub const SUBTITLE_DISABLED: i32 = -1;

// =============================================================================
// Stream Models
// =============================================================================

/// Stream type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Audio,
    Subtitle,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Audio => write!(f, "audio"),
            StreamKind::Subtitle => write!(f, "subtitle"),
        }
    }
}

/// A single media stream as reported by the server.
///
/// Immutable snapshot for one selection pass; the selection engine only ever
/// borrows these. The *natural index* (0-based position among non-external
/// streams of the same kind) is derived during evaluation, never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStream {
    /// Absolute server-assigned index across all stream types
    pub index: u32,
    pub kind: StreamKind,
    /// Raw language tag, possibly empty ("jpn", "en", "pt-BR", ...)
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channels: Option<u32>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub bit_depth: Option<u32>,
    #[serde(default)]
    pub is_forced: bool,
    #[serde(default)]
    pub is_default: bool,
    /// External streams (sidecar files) are invisible to the renderer's
    /// index space and skipped by the whole engine.
    #[serde(default)]
    pub is_external: bool,
}

impl MediaStream {
    /// Convenience constructor for an audio stream with empty optional fields
    pub fn audio(index: u32, language: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            index,
            kind: StreamKind::Audio,
            language: language.into(),
            codec: codec.into(),
            profile: String::new(),
            title: String::new(),
            channels: None,
            sample_rate: None,
            bit_depth: None,
            is_forced: false,
            is_default: false,
            is_external: false,
        }
    }

    /// Convenience constructor for a subtitle stream
    pub fn subtitle(index: u32, language: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            kind: StreamKind::Subtitle,
            ..Self::audio(index, language, codec)
        }
    }

    /// Human-readable identification for logs
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            self.title.clone()
        } else if !self.language.trim().is_empty() {
            format!("{} ({})", self.language, self.codec)
        } else {
            format!("#{} ({})", self.index, self.codec)
        }
    }
}

impl fmt::Display for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} {}", self.kind, self.index, self.display_title())
    }
}

// =============================================================================
// Preference Models
// =============================================================================

/// Audio language policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioLanguageMode {
    /// Let the renderer device decide everything; no override is computed
    Device,
    /// Pick by merit in the UI locale's language
    Auto,
    /// Prefer default-flagged tracks
    Default,
    /// Prefer the title's original language (needs the hint provider)
    Original,
    /// An explicit language tag ("de", "jpn", ...)
    Language(String),
}

/// Subtitle language policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleLanguageMode {
    /// Follow the UI locale
    Auto,
    /// An explicit language tag
    Language(String),
}

/// Resolved user preferences consumed by one selection pass.
///
/// All values arrive already resolved (preference persistence lives
/// elsewhere); the engine never mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPreferences {
    pub audio_mode: AudioLanguageMode,
    pub subtitle_mode: SubtitleLanguageMode,
    /// Device can bitstream or decode DTS; rebases the dts codec merit and
    /// enables the DTS-HD MA profile bonus
    pub has_dts_decoder: bool,
    pub no_forced_subtitles: bool,
    pub allow_same_language_subtitles: bool,
    pub prefer_sdh_subtitles: bool,
    /// User-forced audio codec, boosted near the top of the codec table
    pub forced_audio_codec: Option<String>,
    /// Active UI locale tag, resolved by the caller ("en", "de-AT", ...)
    pub ui_language_tag: String,
}

impl Default for TrackPreferences {
    fn default() -> Self {
        Self {
            audio_mode: AudioLanguageMode::Auto,
            subtitle_mode: SubtitleLanguageMode::Auto,
            has_dts_decoder: false,
            no_forced_subtitles: false,
            allow_same_language_subtitles: false,
            prefer_sdh_subtitles: false,
            forced_audio_codec: None,
            ui_language_tag: "en".to_string(),
        }
    }
}

// =============================================================================
// Item Models
// =============================================================================

/// Media item kind, as far as the hint provider cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Series,
}

/// The item being handed off to the renderer.
///
/// Episodes resolve their original language through the parent series item;
/// callers pass the series ids here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub tmdb_id: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<String>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            tmdb_id: None,
            tvdb_id: None,
        }
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.id)
    }
}

// =============================================================================
// Renderer Models
// =============================================================================

/// Application-level play state embedded in the renderer's status payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Error,
    Paused,
    Playing,
}

impl PlayState {
    /// Decode the wire value (-1 error, 0 paused, 1 playing); anything
    /// unknown counts as an error status
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => PlayState::Paused,
            1 => PlayState::Playing,
            _ => PlayState::Error,
        }
    }

    /// Healthy means the renderer has our content loaded (paused or playing)
    pub fn is_healthy(self) -> bool {
        matches!(self, PlayState::Paused | PlayState::Playing)
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Error => write!(f, "error"),
            PlayState::Paused => write!(f, "paused"),
            PlayState::Playing => write!(f, "playing"),
        }
    }
}

/// Lifecycle of a renderer sync session; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    StartupProbe,
    Running,
    Stopped,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::StartupProbe => write!(f, "startup-probe"),
            SyncState::Running => write!(f, "running"),
            SyncState::Stopped => write!(f, "stopped"),
        }
    }
}
