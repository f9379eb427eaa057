//! External renderer control and synchronization
//!
//! The renderer is a separate device/process that does the actual decoding
//! and output once playback is handed off; the only way to talk to it is its
//! private HTTP status/command API.
//!
//! Index spaces: the renderer counts audio tracks from 0, but subtitles from
//! 1 with 0 meaning "off". Internally audio is 0-based and subtitles use the
//! explicit [`SUBTITLE_DISABLED`] sentinel.

pub mod api;
pub mod sync;

pub use api::{PlayStatus, RendererClient, RendererControl, RendererError};
pub use sync::{
    RendererSync, StopRequest, SyncHandle, SyncOptions, SyncOutcome, SyncReport, TrackTargets,
};

use crate::models::SUBTITLE_DISABLED;

/// Convert an internal audio/subtitle index pair to the renderer's wire
/// indices. Missing values fall back to the renderer's neutral choice
/// (first audio track, subtitles off).
pub fn to_renderer_index(audio: Option<i32>, subtitle: Option<i32>) -> (u32, u32) {
    let audio_out = match audio {
        Some(idx) if idx >= 0 => idx as u32,
        _ => 0, // "first" track
    };
    let subtitle_out = match subtitle {
        Some(idx) => to_renderer_subtitle_index(idx),
        None => 0,
    };
    (audio_out, subtitle_out)
}

/// Map an internal subtitle index to the renderer's 1-based scheme.
///
/// [`SUBTITLE_DISABLED`] maps to 0 ("off"). Note the asymmetry: the
/// renderer's own "unset" and our explicit "disabled" collapse to the same
/// wire value, so 0 is not losslessly invertible. That is a property of the
/// renderer's protocol, not something to fix here.
pub fn to_renderer_subtitle_index(subtitle: i32) -> u32 {
    if subtitle <= SUBTITLE_DISABLED {
        0
    } else {
        subtitle as u32 + 1
    }
}

/// Map a renderer wire subtitle index back to the internal space. Wire 0
/// always comes back as [`SUBTITLE_DISABLED`] (see
/// [`to_renderer_subtitle_index`] for why the off case is ambiguous).
pub fn from_renderer_subtitle_index(wire: u32) -> i32 {
    if wire == 0 {
        SUBTITLE_DISABLED
    } else {
        wire as i32 - 1
    }
}
