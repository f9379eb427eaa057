//! Fallback-chain track selection
//!
//! Applies the preference policy on top of the merit evaluator to pick one
//! audio stream and at most one subtitle stream. Pure function of the
//! inputs; identical `(streams, prefs, hint)` always yields the same result.

use tracing::{debug, warn};

use super::classify::matches_language;
use super::language::iso3_code;
use super::merit::{
    caption_streams, default_streams, evaluate_streams, forced_streams, sdh_streams, track_counts,
    RankedStream,
};
use crate::models::{
    AudioLanguageMode, MediaStream, StreamKind, SubtitleLanguageMode, TrackPreferences,
    SUBTITLE_DISABLED,
};

/// Subtitle outcome of a selection pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubtitleTrack<'a> {
    /// Switch to this stream
    Stream(RankedStream<'a>),
    /// Explicitly turn subtitles off
    Disabled,
}

/// The selected audio track and subtitle decision.
///
/// A missing subtitle entry means "no opinion": the renderer keeps whatever
/// default it picked on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSelection<'a> {
    pub audio: RankedStream<'a>,
    pub subtitle: Option<SubtitleTrack<'a>>,
}

impl TrackSelection<'_> {
    /// Subtitle natural index, with [`SUBTITLE_DISABLED`] for an explicit
    /// off decision and `None` for no opinion
    pub fn subtitle_natural_index(&self) -> Option<i32> {
        self.subtitle.map(|track| match track {
            SubtitleTrack::Stream(ranked) => ranked.natural_index as i32,
            SubtitleTrack::Disabled => SUBTITLE_DISABLED,
        })
    }
}

fn last_merit<'a>(
    merits: std::collections::BTreeMap<i32, RankedStream<'a>>,
) -> Option<RankedStream<'a>> {
    merits.into_iter().next_back().map(|(_, ranked)| ranked)
}

/// Pick the best audio and subtitle tracks for the given preferences.
///
/// Returns `None` ("no override") when the device policy is in charge, when
/// there is nothing worth correcting, or when no language code can be
/// resolved. The hint is the title's original language from the metadata
/// provider and only matters in [`AudioLanguageMode::Original`].
pub fn select_tracks<'a>(
    streams: &'a [MediaStream],
    prefs: &TrackPreferences,
    original_language_hint: Option<&str>,
) -> Option<TrackSelection<'a>> {
    if prefs.audio_mode == AudioLanguageMode::Device {
        return None;
    }
    let (num_audio, num_subtitles) = track_counts(streams);
    if num_audio == 0 {
        debug!("Empty or no audio stream detected, skipping");
        return None;
    }
    if num_audio == 1 && num_subtitles == 0 {
        return None; // nothing to do, let the renderer handle things
    }

    // resolve language codes; any failure means no override
    let locale_code = iso3_code(&prefs.ui_language_tag)?;
    let audio_code = match &prefs.audio_mode {
        AudioLanguageMode::Original => match original_language_hint {
            Some(hint) if !hint.trim().is_empty() => {
                let code = iso3_code(hint)?;
                debug!("Using original-language hint <{}>", code);
                code
            }
            _ => locale_code.clone(),
        },
        AudioLanguageMode::Language(tag) => iso3_code(tag)?,
        _ => locale_code.clone(),
    };
    let subtitle_code = match &prefs.subtitle_mode {
        SubtitleLanguageMode::Language(tag) => iso3_code(tag)?,
        SubtitleLanguageMode::Auto => locale_code,
    };

    let audio = pick_audio(streams, prefs, &audio_code)?;
    let subtitle = if num_subtitles > 0 {
        pick_subtitle(streams, prefs, &subtitle_code, audio.stream)
    } else {
        None
    };

    debug!(
        "Best tracks audio <{}> subtitle <{}>",
        audio.stream.display_title(),
        match &subtitle {
            Some(SubtitleTrack::Stream(ranked)) => ranked.stream.display_title(),
            Some(SubtitleTrack::Disabled) => "disabled".to_string(),
            None => "renderer default".to_string(),
        }
    );
    Some(TrackSelection { audio, subtitle })
}

fn pick_audio<'a>(
    streams: &'a [MediaStream],
    prefs: &TrackPreferences,
    audio_code: &str,
) -> Option<RankedStream<'a>> {
    let mut audio: Option<RankedStream> = None;

    // NOTE: anime seems to use "kor" == "jpn" loosely
    if prefs.audio_mode == AudioLanguageMode::Original {
        let mut defaults = default_streams(streams, StreamKind::Audio, Some(audio_code));
        if defaults.is_empty() && audio_code == "kor" {
            defaults = default_streams(streams, StreamKind::Audio, Some("jpn"));
        }
        audio = defaults.into_iter().next();

        if audio.is_none() {
            let mut merits =
                evaluate_streams(streams, prefs, StreamKind::Audio, Some(audio_code), true, false);
            if merits.is_empty() && audio_code == "kor" {
                merits =
                    evaluate_streams(streams, prefs, StreamKind::Audio, Some("jpn"), true, false);
            }
            audio = last_merit(merits);
        }
    }

    if audio.is_none() && prefs.audio_mode == AudioLanguageMode::Default {
        let mut defaults = default_streams(streams, StreamKind::Audio, Some(audio_code));
        if defaults.is_empty() {
            defaults = default_streams(streams, StreamKind::Audio, None); // any language
        }
        audio = defaults.into_iter().next();
    }

    // highest merit in the target language
    if audio.is_none() {
        audio = last_merit(evaluate_streams(
            streams,
            prefs,
            StreamKind::Audio,
            Some(audio_code),
            true,
            false,
        ));
    }

    // any default track, then anything at all ignoring language and filters
    if audio.is_none() {
        audio = default_streams(streams, StreamKind::Audio, None)
            .into_iter()
            .next()
            .or_else(|| {
                last_merit(evaluate_streams(
                    streams,
                    prefs,
                    StreamKind::Audio,
                    None,
                    true,
                    true,
                ))
            });
    }

    if audio.is_none() {
        warn!("Could not find good audio track, skipping");
    }
    audio
}

fn pick_subtitle<'a>(
    streams: &'a [MediaStream],
    prefs: &TrackPreferences,
    subtitle_code: &str,
    chosen_audio: &MediaStream,
) -> Option<SubtitleTrack<'a>> {
    let mut subtitle: Option<SubtitleTrack> = None;

    if matches_language(chosen_audio, subtitle_code) {
        // audio already speaks the subtitle language
        if prefs.prefer_sdh_subtitles {
            let mut sdh = sdh_streams(streams, Some(subtitle_code));
            if sdh.is_empty() {
                sdh = caption_streams(streams, Some(subtitle_code));
            }
            subtitle = sdh.into_iter().next().map(SubtitleTrack::Stream);
        }
        if subtitle.is_none() && !prefs.no_forced_subtitles {
            subtitle = forced_streams(streams, StreamKind::Subtitle, Some(subtitle_code))
                .into_iter()
                .next()
                .map(SubtitleTrack::Stream);
        }
        if subtitle.is_none() && prefs.allow_same_language_subtitles {
            subtitle = last_merit(evaluate_streams(
                streams,
                prefs,
                StreamKind::Subtitle,
                Some(subtitle_code),
                true,
                false,
            ))
            .map(SubtitleTrack::Stream);
        }
        if subtitle.is_none() {
            subtitle = Some(SubtitleTrack::Disabled);
        }
    } else {
        // foreign audio, find subtitles in the target language
        if prefs.prefer_sdh_subtitles {
            let mut sdh = sdh_streams(streams, Some(subtitle_code));
            if sdh.is_empty() {
                sdh = caption_streams(streams, Some(subtitle_code));
            }
            subtitle = sdh.into_iter().next().map(SubtitleTrack::Stream);
        }
        if subtitle.is_none() {
            let mut merits = evaluate_streams(
                streams,
                prefs,
                StreamKind::Subtitle,
                Some(subtitle_code),
                true,
                false,
            );
            if merits.is_empty() {
                // low quality is still better than nothing
                merits = evaluate_streams(
                    streams,
                    prefs,
                    StreamKind::Subtitle,
                    Some(subtitle_code),
                    true,
                    true,
                );
            }
            subtitle = last_merit(merits).map(SubtitleTrack::Stream);
        }
        // FALLBACK: assume badly language-tagged subs first
        if subtitle.is_none() {
            subtitle = last_merit(evaluate_streams(
                streams,
                prefs,
                StreamKind::Subtitle,
                None,
                true,
                false,
            ))
            .map(SubtitleTrack::Stream);
        }
        // FALLBACK: any forced track
        if subtitle.is_none() && !prefs.no_forced_subtitles {
            subtitle = forced_streams(streams, StreamKind::Subtitle, None)
                .into_iter()
                .next()
                .map(SubtitleTrack::Stream);
        }
        // anything unfiltered left?
        if subtitle.is_none() {
            subtitle = last_merit(evaluate_streams(
                streams,
                prefs,
                StreamKind::Subtitle,
                None,
                true,
                true,
            ))
            .map(SubtitleTrack::Stream);
        }
        // still nothing: leave unset, the renderer keeps its own default
    }
    subtitle
}
