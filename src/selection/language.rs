//! Language tag resolution
//!
//! Media servers tag streams with whatever the muxer left behind: ISO 639-1
//! two-letter codes, BCP-47 tags with region subtags, or either flavor of
//! three-letter ISO 639-2 code. Everything is normalized to the terminology
//! three-letter code before comparison so "de", "ger" and "deu" all meet in
//! the middle.

/// Resolve an arbitrary language tag to a canonical ISO 639-2/3 code.
///
/// Returns `None` for empty or unresolvable input; never errors.
pub fn iso3_code(tag: &str) -> Option<String> {
    let primary = tag.trim().split(['-', '_']).next().unwrap_or("");
    if primary.is_empty() || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let primary = primary.to_ascii_lowercase();
    match primary.len() {
        2 => two_letter_to_iso3(&primary).map(str::to_string),
        3 => Some(canonicalize_iso3(&primary)),
        _ => None,
    }
}

/// Map an ISO 639-1 code to its terminology three-letter form
fn two_letter_to_iso3(code: &str) -> Option<&'static str> {
    let iso3 = match code {
        "en" => "eng",
        "es" => "spa",
        "fr" => "fra",
        "de" => "deu",
        "it" => "ita",
        "pt" => "por",
        "ru" => "rus",
        "ja" => "jpn",
        "ko" => "kor",
        "zh" => "zho",
        "ar" => "ara",
        "hi" => "hin",
        "nl" => "nld",
        "pl" => "pol",
        "tr" => "tur",
        "sv" => "swe",
        "no" => "nor",
        "da" => "dan",
        "fi" => "fin",
        "el" => "ell",
        "he" => "heb",
        "hu" => "hun",
        "cs" => "ces",
        "ro" => "ron",
        "bg" => "bul",
        "hr" => "hrv",
        "sl" => "slv",
        "sr" => "srp",
        "uk" => "ukr",
        "vi" => "vie",
        "th" => "tha",
        "id" => "ind",
        "ms" => "msa",
        "is" => "isl",
        "fa" => "fas",
        "ta" => "tam",
        "te" => "tel",
        "tl" => "tgl",
        "ca" => "cat",
        "sk" => "slk",
        "lt" => "lit",
        "lv" => "lav",
        "et" => "est",
        _ => return None,
    };
    Some(iso3)
}

/// Collapse ISO 639-2 bibliographic codes onto their terminology twins
fn canonicalize_iso3(code: &str) -> String {
    let canonical = match code {
        "fre" => "fra",
        "ger" => "deu",
        "chi" => "zho",
        "dut" => "nld",
        "gre" => "ell",
        "cze" => "ces",
        "rum" => "ron",
        "may" => "msa",
        "ice" => "isl",
        "per" => "fas",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "geo" => "kat",
        "mac" => "mkd",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_letter_tags() {
        assert_eq!(iso3_code("en"), Some("eng".to_string()));
        assert_eq!(iso3_code("ja"), Some("jpn".to_string()));
        assert_eq!(iso3_code("DE"), Some("deu".to_string()));
    }

    #[test]
    fn test_bcp47_region_stripped() {
        assert_eq!(iso3_code("pt-BR"), Some("por".to_string()));
        assert_eq!(iso3_code("zh_TW"), Some("zho".to_string()));
        assert_eq!(iso3_code("en-US"), Some("eng".to_string()));
    }

    #[test]
    fn test_bibliographic_collapses_to_terminology() {
        assert_eq!(iso3_code("ger"), Some("deu".to_string()));
        assert_eq!(iso3_code("fre"), Some("fra".to_string()));
        assert_eq!(iso3_code("deu"), Some("deu".to_string()));
    }

    #[test]
    fn test_three_letter_passthrough() {
        assert_eq!(iso3_code("jpn"), Some("jpn".to_string()));
        assert_eq!(iso3_code("KOR"), Some("kor".to_string()));
    }

    #[test]
    fn test_unresolvable() {
        assert_eq!(iso3_code(""), None);
        assert_eq!(iso3_code("  "), None);
        assert_eq!(iso3_code("x"), None);
        assert_eq!(iso3_code("qq"), None);
        assert_eq!(iso3_code("engl"), None);
        assert_eq!(iso3_code("12"), None);
    }
}
