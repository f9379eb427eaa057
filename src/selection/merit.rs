//! Merit evaluation for candidate streams
//!
//! Every candidate gets a signed merit from codec/profile weights, title
//! substring filters and type-specific bonuses; only non-negative merits
//! survive. Results are keyed by merit value, so two streams with the same
//! merit collapse and the later one wins — downstream fallback logic relies
//! on that to prefer later tracks on exact ties. Keep it that way.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::classify::{
    is_caption_track, is_default_track, is_forced_track, is_sdh_track, matches_language,
};
use crate::models::{AudioLanguageMode, MediaStream, StreamKind, TrackPreferences};

const DEFAULT_AUDIO_FLAG_MERIT: i32 = 1;
const DEFAULT_SUBTITLE_FLAG_MERIT: i32 = 1;
const AUDIO_SURROUND_MERIT: i32 = 5;
const AUDIO_SURROUND_6CH_MERIT: i32 = 15;

const AUDIO_CODEC_MERITS: &[(&str, i32)] = &[
    ("truehd", 12),
    ("eac3", 11),
    ("ac3", 10),
    ("aac", 2),
    ("opus", 1),
    ("ogg", 1),
    ("dts", 0),
];

// "commentar" catches both "commentary" and "commentaries"
const AUDIO_FILTER_MERITS: &[(&str, i32)] = &[("commentar", -99), ("description", -99)];

const AUDIO_PROFILE_MERITS: &[(&str, i32)] = &[("dts-hd ma", 2)];

const SUBTITLE_CODEC_MERITS: &[(&str, i32)] = &[
    ("ass", 6),
    ("ssa", 5),
    ("srt", 3),
    ("subrip", 3),
    ("sub", 2),
    ("pgssub", 1),
    ("pgs", 1),
];

const SUBTITLE_FILTER_MERITS: &[(&str, i32)] = &[
    ("dialog", 10),
    ("full", 9),
    ("non_honorific", 2),
    ("subtitle", 1),
    ("commentar", -99),
    ("sdh", -190),
    ("caption", -190),
    ("sign", -200),
    ("sing", -200),
    ("song", -200),
];

/// A candidate stream together with its natural index.
///
/// The natural index is the stream's 0-based position among non-external
/// streams of its kind in original order — the index space the external
/// renderer understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedStream<'a> {
    pub stream: &'a MediaStream,
    pub natural_index: usize,
}

/// Iterate non-external streams of one kind in natural-index order.
///
/// Filters applied downstream (forced, language) must not disturb the
/// numbering, which is why the enumeration happens here and nowhere else.
fn natural_order(
    streams: &[MediaStream],
    kind: StreamKind,
) -> impl Iterator<Item = RankedStream<'_>> {
    streams
        .iter()
        .filter(move |s| s.kind == kind && !s.is_external)
        .enumerate()
        .map(|(natural_index, stream)| RankedStream {
            stream,
            natural_index,
        })
}

/// Channel layout / sample rate / bit depth bonus for audio candidates
fn audio_quality_merit(stream: &MediaStream) -> i32 {
    let channels = stream.channels.unwrap_or(0);
    let sample_rate = stream.sample_rate.unwrap_or(44000);
    let bit_depth = stream.bit_depth.unwrap_or(16);

    let mut merit = 0;
    if channels > 2 {
        merit += AUDIO_SURROUND_MERIT;
    }
    if channels >= 5 {
        merit += AUDIO_SURROUND_6CH_MERIT;
    }
    if channels >= 7 {
        merit += 1;
    }
    if sample_rate > 48000 {
        merit += 1;
    }
    if bit_depth > 16 {
        merit += 1;
    }
    merit
}

fn base_table(entries: &[(&str, i32)]) -> HashMap<String, i32> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// The three per-call merit tables, cloned from the base tables and adjusted
/// for the given preferences. The base tables are never touched.
struct MeritTables {
    codec: HashMap<String, i32>,
    filter: HashMap<String, i32>,
    profile: HashMap<String, i32>,
}

impl MeritTables {
    fn for_kind(kind: StreamKind, prefs: &TrackPreferences) -> Self {
        match kind {
            StreamKind::Audio => {
                let mut codec = base_table(AUDIO_CODEC_MERITS);
                let mut filter = base_table(AUDIO_FILTER_MERITS);
                let mut profile = HashMap::new();
                if prefs.has_dts_decoder {
                    profile = base_table(AUDIO_PROFILE_MERITS);
                    // lossless MA profile lands next to eac3
                    codec.insert("dts".to_string(), 10 - 1);
                }
                if let Some(forced) = &prefs.forced_audio_codec {
                    // favor the forced codec, surround should still win
                    codec.insert(forced.trim().to_lowercase(), 15);
                }
                if prefs.audio_mode == AudioLanguageMode::Original {
                    filter.insert("original".to_string(), 20);
                }
                Self {
                    codec,
                    filter,
                    profile,
                }
            }
            StreamKind::Subtitle => {
                let codec = base_table(SUBTITLE_CODEC_MERITS);
                let mut filter = base_table(SUBTITLE_FILTER_MERITS);
                if prefs.prefer_sdh_subtitles {
                    filter.insert("sdh".to_string(), 50);
                    filter.insert("caption".to_string(), 40);
                    filter.insert("hearing impaired".to_string(), 30);
                }
                Self {
                    codec,
                    filter,
                    profile: HashMap::new(),
                }
            }
        }
    }
}

/// Score all candidate streams of one kind against the merit tables.
///
/// Returns a map from merit value to candidate; the caller's best pick is
/// the entry with the maximum key (`last_key_value`). Streams excluded by
/// the forced or language filters still occupy their natural index.
///
/// An invalid language filter (not exactly three characters) yields an
/// empty map rather than an error.
pub fn evaluate_streams<'a>(
    streams: &'a [MediaStream],
    prefs: &TrackPreferences,
    kind: StreamKind,
    lang_filter: Option<&str>,
    ignore_forced: bool,
    ignore_filters: bool,
) -> BTreeMap<i32, RankedStream<'a>> {
    if let Some(filter) = lang_filter {
        if filter.len() != 3 {
            warn!("Language filter is not a 3 letter code <{}>", filter);
            return BTreeMap::new();
        }
    }
    let tables = MeritTables::for_kind(kind, prefs);

    let mut out = BTreeMap::new();
    for candidate in natural_order(streams, kind) {
        let stream = candidate.stream;
        if ignore_forced && is_forced_track(stream) {
            continue;
        }
        if let Some(filter) = lang_filter {
            if !matches_language(stream, filter) {
                continue;
            }
        }
        let codec = stream.codec.trim().to_lowercase();
        let profile = stream.profile.trim().to_lowercase();
        let title = stream.title.trim().to_lowercase();

        let mut merit = *tables.codec.get(&codec).unwrap_or(&0);
        merit += *tables.profile.get(&profile).unwrap_or(&0);
        if !ignore_filters && !title.is_empty() {
            for (filter, weight) in &tables.filter {
                if title.contains(filter.as_str()) {
                    merit += weight;
                }
            }
        }
        match kind {
            StreamKind::Audio => {
                merit += audio_quality_merit(stream);
                if is_default_track(stream) {
                    merit += DEFAULT_AUDIO_FLAG_MERIT;
                }
            }
            StreamKind::Subtitle => {
                if is_default_track(stream) {
                    merit += DEFAULT_SUBTITLE_FLAG_MERIT;
                }
            }
        }
        // only keep positive merits; an equal merit replaces the earlier
        // entry, so later streams win exact ties
        if merit >= 0 {
            out.insert(merit, candidate);
        }
    }
    out
}

fn collect_streams<'a>(
    streams: &'a [MediaStream],
    kind: StreamKind,
    lang_filter: Option<&str>,
    predicate: fn(&MediaStream) -> bool,
) -> Vec<RankedStream<'a>> {
    natural_order(streams, kind)
        .filter(|c| match lang_filter {
            Some(filter) => matches_language(c.stream, filter),
            None => true,
        })
        .filter(|c| predicate(c.stream))
        .collect()
}

/// Forced streams of one kind, natural-indexed, optionally language-filtered
pub fn forced_streams<'a>(
    streams: &'a [MediaStream],
    kind: StreamKind,
    lang_filter: Option<&str>,
) -> Vec<RankedStream<'a>> {
    collect_streams(streams, kind, lang_filter, is_forced_track)
}

/// Default-flagged streams of one kind, natural-indexed
pub fn default_streams<'a>(
    streams: &'a [MediaStream],
    kind: StreamKind,
    lang_filter: Option<&str>,
) -> Vec<RankedStream<'a>> {
    collect_streams(streams, kind, lang_filter, is_default_track)
}

/// SDH subtitle streams, natural-indexed
pub fn sdh_streams<'a>(
    streams: &'a [MediaStream],
    lang_filter: Option<&str>,
) -> Vec<RankedStream<'a>> {
    collect_streams(streams, StreamKind::Subtitle, lang_filter, is_sdh_track)
}

/// Caption subtitle streams, natural-indexed
pub fn caption_streams<'a>(
    streams: &'a [MediaStream],
    lang_filter: Option<&str>,
) -> Vec<RankedStream<'a>> {
    collect_streams(streams, StreamKind::Subtitle, lang_filter, is_caption_track)
}

/// Number of (audio, subtitle) tracks in the list, externals included
pub fn track_counts(streams: &[MediaStream]) -> (usize, usize) {
    let mut audio = 0;
    let mut subtitle = 0;
    for stream in streams {
        match stream.kind {
            StreamKind::Audio => audio += 1,
            StreamKind::Subtitle => subtitle += 1,
        }
    }
    (audio, subtitle)
}
