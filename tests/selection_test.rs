//! Track selection engine tests
//!
//! Covers the merit evaluator's properties and the fallback-chain picker
//! against realistic stream lists.

use rendersync::models::{
    AudioLanguageMode, MediaStream, StreamKind, TrackPreferences, SUBTITLE_DISABLED,
};
use rendersync::selection::classify::is_same_language;
use rendersync::selection::merit::evaluate_streams;
use rendersync::selection::{select_tracks, SubtitleTrack};

// =============================================================================
// Builders
// =============================================================================

fn audio(index: u32, lang: &str, codec: &str) -> MediaStream {
    MediaStream::audio(index, lang, codec)
}

fn surround_audio(index: u32, lang: &str, codec: &str, channels: u32) -> MediaStream {
    let mut stream = audio(index, lang, codec);
    stream.channels = Some(channels);
    stream
}

fn subtitle(index: u32, lang: &str, title: &str) -> MediaStream {
    let mut stream = MediaStream::subtitle(index, lang, "srt");
    stream.title = title.to_string();
    stream
}

/// A messy but plausible remux: commentary, surround, forced and sign subs
fn kitchen_sink_streams() -> Vec<MediaStream> {
    let mut default_eng = audio(0, "eng", "ac3");
    default_eng.is_default = true;
    let mut commentary = audio(2, "eng", "aac");
    commentary.title = "Director's Commentary".to_string();
    let mut forced_sub = subtitle(4, "eng", "Forced");
    forced_sub.is_forced = true;
    let mut external_sub = subtitle(6, "eng", "Full");
    external_sub.is_external = true;
    vec![
        default_eng,
        surround_audio(1, "jpn", "truehd", 6),
        commentary,
        subtitle(3, "eng", "Full Subtitles"),
        forced_sub,
        subtitle(5, "jpn", "Signs & Songs"),
        external_sub,
    ]
}

// =============================================================================
// Merit Evaluator Properties
// =============================================================================

/// Every surviving merit is non-negative and the map never holds more
/// entries than there are candidate streams of the requested type
#[test]
fn test_merit_entries_nonnegative_and_bounded() {
    let streams = kitchen_sink_streams();
    let prefs_variants = vec![
        TrackPreferences::default(),
        TrackPreferences {
            audio_mode: AudioLanguageMode::Original,
            has_dts_decoder: true,
            ..TrackPreferences::default()
        },
        TrackPreferences {
            prefer_sdh_subtitles: true,
            forced_audio_codec: Some("aac".to_string()),
            ..TrackPreferences::default()
        },
    ];

    for prefs in &prefs_variants {
        for kind in [StreamKind::Audio, StreamKind::Subtitle] {
            for lang in [None, Some("eng"), Some("jpn"), Some("deu")] {
                for ignore_forced in [false, true] {
                    for ignore_filters in [false, true] {
                        let merits = evaluate_streams(
                            &streams,
                            prefs,
                            kind,
                            lang,
                            ignore_forced,
                            ignore_filters,
                        );
                        let candidates = streams
                            .iter()
                            .filter(|s| s.kind == kind && !s.is_external)
                            .count();
                        assert!(merits.len() <= candidates);
                        for merit in merits.keys() {
                            assert!(*merit >= 0, "negative merit {} survived", merit);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_same_language_is_symmetric_and_reflexive() {
    let streams = kitchen_sink_streams();
    for a in &streams {
        for b in &streams {
            assert_eq!(is_same_language(a, b), is_same_language(b, a));
        }
        assert_eq!(is_same_language(a, a), !a.language.trim().is_empty());
    }
}

// =============================================================================
// Policy Scenarios
// =============================================================================

/// Original-language policy picks the surround Japanese track over the
/// default-flagged English one
#[test]
fn test_original_language_beats_default_flag() {
    let mut default_eng = audio(0, "eng", "ac3");
    default_eng.is_default = true;
    let streams = vec![default_eng, surround_audio(1, "jpn", "truehd", 6)];

    let prefs = TrackPreferences {
        audio_mode: AudioLanguageMode::Original,
        ..TrackPreferences::default()
    };

    // ac3 10 + default 1 on one side, truehd 12 + surround 20 on the other
    let eng = evaluate_streams(&streams, &prefs, StreamKind::Audio, Some("eng"), true, false);
    assert_eq!(*eng.last_key_value().unwrap().0, 11);
    let jpn = evaluate_streams(&streams, &prefs, StreamKind::Audio, Some("jpn"), true, false);
    assert_eq!(*jpn.last_key_value().unwrap().0, 32);

    let selection = select_tracks(&streams, &prefs, Some("jpn")).unwrap();
    assert_eq!(selection.audio.natural_index, 1);
    assert_eq!(selection.audio.stream.codec, "truehd");
}

/// Foreign audio: the full English sub wins over the signs track, whose
/// "sign" filter buries it
#[test]
fn test_foreign_audio_picks_full_subtitle() {
    let mut default_eng = audio(0, "eng", "ac3");
    default_eng.is_default = true;
    let streams = vec![
        default_eng,
        surround_audio(1, "jpn", "truehd", 6),
        subtitle(2, "eng", "Full"),
        subtitle(3, "eng", "Signs"),
    ];

    let prefs = TrackPreferences {
        audio_mode: AudioLanguageMode::Original,
        ..TrackPreferences::default()
    };
    let selection = select_tracks(&streams, &prefs, Some("jpn")).unwrap();
    assert_eq!(selection.audio.natural_index, 1);
    match selection.subtitle {
        Some(SubtitleTrack::Stream(ranked)) => {
            assert_eq!(ranked.natural_index, 0);
            assert_eq!(ranked.stream.title, "Full");
        }
        other => panic!("expected a subtitle stream, got {:?}", other),
    }
}

/// SDH preference wins outright in the same-language branch, merit unseen
#[test]
fn test_sdh_first_when_preferred() {
    let streams = vec![
        audio(0, "eng", "ac3"),
        audio(1, "jpn", "aac"),
        subtitle(2, "eng", "SDH"),
        subtitle(3, "eng", "Full"),
    ];
    let prefs = TrackPreferences {
        prefer_sdh_subtitles: true,
        ..TrackPreferences::default()
    };
    let selection = select_tracks(&streams, &prefs, None).unwrap();
    assert_eq!(selection.audio.stream.language, "eng");
    match selection.subtitle {
        Some(SubtitleTrack::Stream(ranked)) => assert_eq!(ranked.natural_index, 0),
        other => panic!("expected the SDH stream, got {:?}", other),
    }
}

// =============================================================================
// Fallback Chain Edges
// =============================================================================

/// External subtitle streams neither win nor shift natural indices
#[test]
fn test_external_streams_invisible_to_selection() {
    let streams = kitchen_sink_streams();
    let prefs = TrackPreferences {
        audio_mode: AudioLanguageMode::Original,
        ..TrackPreferences::default()
    };
    let selection = select_tracks(&streams, &prefs, Some("ja")).unwrap();
    assert_eq!(selection.audio.natural_index, 1);
    // "Full Subtitles" is the first non-external subtitle
    assert_eq!(selection.subtitle_natural_index(), Some(0));
}

/// Same-language audio with nothing allowed disables subtitles outright
#[test]
fn test_same_language_explicitly_disables() {
    let streams = vec![
        audio(0, "eng", "ac3"),
        audio(1, "jpn", "aac"),
        subtitle(2, "eng", "Full"),
    ];
    let prefs = TrackPreferences {
        no_forced_subtitles: true,
        ..TrackPreferences::default()
    };
    let selection = select_tracks(&streams, &prefs, None).unwrap();
    assert_eq!(selection.subtitle, Some(SubtitleTrack::Disabled));
    assert_eq!(selection.subtitle_natural_index(), Some(SUBTITLE_DISABLED));
}

/// Identical inputs always produce identical results
#[test]
fn test_selection_deterministic_across_calls() {
    let streams = kitchen_sink_streams();
    let prefs = TrackPreferences {
        audio_mode: AudioLanguageMode::Original,
        prefer_sdh_subtitles: true,
        ..TrackPreferences::default()
    };
    let first = select_tracks(&streams, &prefs, Some("jpn")).unwrap();
    for _ in 0..25 {
        let again = select_tracks(&streams, &prefs, Some("jpn")).unwrap();
        assert_eq!(again.audio.natural_index, first.audio.natural_index);
        assert_eq!(
            again.subtitle_natural_index(),
            first.subtitle_natural_index()
        );
    }
}

/// Commentary tracks never win while a clean track exists
#[test]
fn test_commentary_track_avoided() {
    let mut commentary = audio(0, "eng", "truehd");
    commentary.title = "Commentary with the director".to_string();
    commentary.channels = Some(8);
    let streams = vec![commentary, audio(1, "eng", "aac"), subtitle(2, "jpn", "Full")];
    let prefs = TrackPreferences::default();
    let selection = select_tracks(&streams, &prefs, None).unwrap();
    assert_eq!(selection.audio.natural_index, 1);
    assert_eq!(selection.audio.stream.codec, "aac");
}
