//! Central progress reporting collaborator
//!
//! The sync state machine is the only caller in this crate; implementations
//! forward to whatever central service tracks playback, and are responsible
//! for marshaling onto their own execution context if they need one.

use async_trait::async_trait;

use crate::models::MediaItem;

/// Receives playback lifecycle events for one media item
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Playback was observed starting, at `position_ms` if known
    async fn report_start(&self, item: &MediaItem, position_ms: Option<i64>);

    /// Periodic heartbeat while the renderer is playing
    async fn report_progress(&self, item: &MediaItem, position_ms: i64, paused: bool);

    /// Terminal report; sent exactly once per session
    async fn report_stopped(&self, item: &MediaItem, position_ms: i64);
}

/// Reporter that swallows every event, for callers that only want the
/// track-correction side of a sync session
pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn report_start(&self, _item: &MediaItem, _position_ms: Option<i64>) {}

    async fn report_progress(&self, _item: &MediaItem, _position_ms: i64, _paused: bool) {}

    async fn report_stopped(&self, _item: &MediaItem, _position_ms: i64) {}
}
