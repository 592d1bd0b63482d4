use std::cmp::Ordering;

use crate::LanguageTag;

/// How well `candidate` serves a client asking for `requested`. Zero means
/// not at all.
///
/// A matching primary language scores 16. On top of that, a script equal to
/// the requested one scores 8 while a candidate without a script scores 4,
/// and a region equal to the requested one scores 2 while a candidate
/// without a region scores 1.
///
/// ```rust
/// use prism::LanguageTag;
/// use prism::multiview::score;
///
/// let tag = |s| LanguageTag::parse(s).unwrap();
/// assert_eq!(score(&tag("zh-Hant-HK"), &tag("zh-Hant-HK")), 16 + 8 + 2);
/// assert_eq!(score(&tag("zh-Hant-HK"), &tag("zh")), 16 + 4 + 1);
/// assert_eq!(score(&tag("zh-Hant-HK"), &tag("zh-Hans")), 16 + 1);
/// assert_eq!(score(&tag("ko-KR"), &tag("ko-KP")), 16 + 4);
/// assert_eq!(score(&tag("en"), &tag("ko")), 0);
/// ```
pub fn score(requested: &LanguageTag, candidate: &LanguageTag) -> u32 {
    if requested.language() != candidate.language() {
        return 0;
    }

    let script = match (requested.script(), candidate.script()) {
        (_, None) => 4,
        (Some(a), Some(b)) if a == b => 8,
        _ => 0,
    };

    let region = match (requested.region(), candidate.region()) {
        (_, None) => 1,
        (Some(a), Some(b)) if a == b => 2,
        _ => 0,
    };

    16 + script + region
}

/// Picks the best of `candidates` for a client whose languages, most
/// preferred first, are `preferences`. Returns the candidate's index.
///
/// A `cookie` naming a candidate's language exactly wins outright.
/// Otherwise the first preference that scores above zero against any
/// candidate picks the highest scoring candidate, the earliest on ties.
/// Candidates without a language never match.
///
/// ```rust
/// use prism::LanguageTag;
/// use prism::multiview::negotiate;
///
/// let tag = |s| LanguageTag::parse(s).unwrap();
/// let views = [Some(tag("en")), Some(tag("zh-Hans")), Some(tag("zh-Hant"))];
///
/// assert_eq!(negotiate(&[tag("zh-Hant-TW"), tag("en")], &views, None), Some(2));
/// assert_eq!(negotiate(&[tag("fr"), tag("en")], &views, None), Some(0));
/// assert_eq!(negotiate(&[tag("zh-Hant-TW")], &views, Some(&tag("en"))), Some(0));
/// assert_eq!(negotiate(&[tag("fr")], &views, None), None);
/// ```
pub fn negotiate(
    preferences: &[LanguageTag],
    candidates: &[Option<LanguageTag>],
    cookie: Option<&LanguageTag>,
) -> Option<usize> {
    if let Some(cookie) = cookie {
        let saved = candidates.iter().position(|c| c.as_ref() == Some(cookie));
        if saved.is_some() {
            return saved;
        }
    }

    preferences.iter().find_map(|requested| {
        let mut best: Option<(usize, u32)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let Some(candidate) = candidate else { continue };
            let score = score(requested, candidate);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    })
}

/// Parses an `Accept-Language` header into language tags, most preferred
/// first. Entries with `q=0`, the `*` wildcard, and unparseable entries are
/// dropped. Entries with equal weight keep their order.
///
/// ```rust
/// use prism::multiview::parse_accept_language;
///
/// let tags = parse_accept_language("ko;q=0.8, en-US, *;q=0.5, fr;q=0, zh-Hant;q=0.8");
/// let tags: Vec<_> = tags.iter().map(|t| t.as_str()).collect();
/// assert_eq!(tags, ["en-US", "ko", "zh-Hant"]);
/// ```
pub fn parse_accept_language(header: &str) -> Vec<LanguageTag> {
    let mut weighted: Vec<(LanguageTag, f32)> = header.split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let q = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            if q <= 0.0 {
                return None;
            }

            LanguageTag::parse(tag).ok().map(|tag| (tag, q))
        })
        .collect();

    weighted.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let views = [Some(tag("ko-KR")), Some(tag("ko-KP"))];
        assert_eq!(negotiate(&[tag("ko")], &views, None), Some(0));

        let views = [Some(tag("ko-KR")), Some(tag("ko"))];
        assert_eq!(negotiate(&[tag("ko-KP")], &views, None), Some(1));
    }

    #[test]
    fn earlier_preferences_win_over_better_scores() {
        let views = [Some(tag("en-US")), Some(tag("ko-KR"))];
        let preferences = [tag("en-GB"), tag("ko-KR")];
        assert_eq!(negotiate(&preferences, &views, None), Some(0));
    }

    #[test]
    fn unknown_cookie_falls_through() {
        let views = [None, Some(tag("en")), Some(tag("ko"))];
        assert_eq!(negotiate(&[tag("ko")], &views, Some(&tag("fr"))), Some(2));
        assert_eq!(negotiate(&[], &views, Some(&tag("EN"))), Some(1));
        assert_eq!(negotiate(&[], &views, None), None);
    }

    #[test]
    fn accept_language_edge_cases() {
        assert!(parse_accept_language("").is_empty());
        assert!(parse_accept_language("*").is_empty());
        assert!(parse_accept_language("en;q=0.000").is_empty());

        let tags = parse_accept_language("en;q=0.5,  ko ; q=0.9 ,not a tag, ja;q=bogus");
        let tags: Vec<_> = tags.iter().map(|t| t.as_str()).collect();
        assert_eq!(tags, ["ja", "ko", "en"]);
    }
}
