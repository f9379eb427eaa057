//! Track selection engine
//!
//! Pure, synchronous, single-pass computation: given the server's stream
//! list and the user's resolved preferences, pick the best audio track and
//! at most one subtitle track. No I/O, safe to call from any thread.

pub mod classify;
pub mod language;
pub mod merit;
pub mod picker;

pub use merit::{evaluate_streams, track_counts, RankedStream};
pub use picker::{select_tracks, SubtitleTrack, TrackSelection};
