//! rendersync - merit-based track selection and external-renderer playback sync
//!
//! The two hard parts of handing playback off to an external renderer box:
//! deterministically picking the best audio/subtitle tracks for the user's
//! preferences, and babysitting the renderer over its private HTTP API until
//! playback ends — correcting tracks and seek position once, heartbeating
//! progress to a central service, and surviving the device's bad days.
//!
//! # Modules
//!
//! - `models` - Stream descriptors, preferences, play/session states
//! - `selection` - Merit evaluation and the fallback-chain track picker
//! - `renderer` - Renderer HTTP client, index mapping, sync state machine
//! - `hints` - Original-language lookup feeding the Original audio policy
//! - `report` - Progress reporting collaborator trait
//! - `config` - Config file handling

pub mod config;
pub mod hints;
pub mod models;
pub mod renderer;
pub mod report;
pub mod selection;

// Re-export commonly used types
pub use models::{
    AudioLanguageMode, MediaItem, MediaKind, MediaStream, PlayState, StreamKind,
    SubtitleLanguageMode, SyncState, TrackPreferences, SUBTITLE_DISABLED,
};

pub use selection::{select_tracks, RankedStream, SubtitleTrack, TrackSelection};

pub use renderer::{
    PlayStatus, RendererClient, RendererControl, RendererError, RendererSync, StopRequest,
    SyncHandle, SyncOptions, SyncOutcome, SyncReport, TrackTargets,
};

pub use hints::OriginalLanguageClient;
pub use report::{NoopReporter, ProgressReporter};
