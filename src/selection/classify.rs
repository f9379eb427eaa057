//! Stream classification predicates
//!
//! Sources in the wild are badly tagged, so the flag checks double up with
//! case-insensitive title heuristics. SDH and caption tracks have no flag at
//! all and are detected purely by title.

use tracing::debug;

use super::language;
use crate::models::MediaStream;

fn title_contains(stream: &MediaStream, needle: &str) -> bool {
    !stream.title.is_empty() && stream.title.to_lowercase().contains(needle)
}

/// Forced flag, or "forced" in the title for badly tagged sources
pub fn is_forced_track(stream: &MediaStream) -> bool {
    stream.is_forced || title_contains(stream, "forced")
}

/// Default flag, or "default" in the title for badly tagged sources
pub fn is_default_track(stream: &MediaStream) -> bool {
    stream.is_default || title_contains(stream, "default")
}

/// No SDH flag exists, so check the title
pub fn is_sdh_track(stream: &MediaStream) -> bool {
    title_contains(stream, "sdh")
}

/// No caption flag exists, so check the title
pub fn is_caption_track(stream: &MediaStream) -> bool {
    title_contains(stream, "caption")
}

/// Both raw tags non-empty and equal after trimming, case-insensitive
pub fn is_same_language(a: &MediaStream, b: &MediaStream) -> bool {
    let lang_a = a.language.trim();
    let lang_b = b.language.trim();
    !lang_a.is_empty() && !lang_b.is_empty() && lang_a.eq_ignore_ascii_case(lang_b)
}

/// Whether the stream's tag resolves to the given ISO 639-2/3 code.
///
/// Fails closed: unresolvable stream language or a filter that is not a
/// three-letter code both yield `false`.
pub fn matches_language(stream: &MediaStream, iso3: &str) -> bool {
    if iso3.len() != 3 {
        debug!("Not an ISO3 code <{}>", iso3);
        return false;
    }
    match language::iso3_code(&stream.language) {
        Some(code) => code.eq_ignore_ascii_case(iso3),
        None => false,
    }
}
