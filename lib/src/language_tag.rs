use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use std::{cmp, fmt};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LanguageTagError;
use crate::intern::Table;

static LANGUAGE_TAGS: Table<Box<str>, LanguageTag> = Table::new();

/// An interned language tag: a subset of RFC 5646 consisting of a primary
/// language, an optional script, and an optional region.
///
/// Subtags are stored lowercased and displayed in canonical case:
///
/// ```rust
/// use prism::LanguageTag;
///
/// let tag = LanguageTag::parse("ZH_hant_hk").unwrap();
/// assert_eq!(tag.to_string(), "zh-Hant-HK");
/// assert_eq!(tag, LanguageTag::get("zh", Some("Hant"), Some("HK")).unwrap());
/// ```
#[derive(Clone)]
pub struct LanguageTag(Arc<Record>);

#[derive(Debug)]
struct Record {
    language: Box<str>,
    script: Option<Box<str>>,
    region: Option<Box<str>>,
    display: Box<str>,
}

fn is_language(s: &str) -> bool {
    (2..=3).contains(&s.len()) && s.bytes().all(|c| c.is_ascii_alphabetic())
}

fn is_script(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|c| c.is_ascii_alphabetic())
}

fn is_region(s: &str) -> bool {
    ((2..=3).contains(&s.len()) && s.bytes().all(|c| c.is_ascii_alphabetic()))
        || (s.len() == 3 && s.bytes().all(|c| c.is_ascii_digit()))
}

impl LanguageTag {
    pub fn get(
        language: &str,
        script: Option<&str>,
        region: Option<&str>,
    ) -> Result<LanguageTag, LanguageTagError> {
        let describe = || [Some(language), script, region].into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("-");

        if !is_language(language) {
            return Err(LanguageTagError::new(describe(), "primary language must be 2-3 letters"));
        }

        if script.map_or(false, |s| !is_script(s)) {
            return Err(LanguageTagError::new(describe(), "script must be 4 letters"));
        }

        if region.map_or(false, |r| !is_region(r)) {
            return Err(LanguageTagError::new(describe(), "region must be 2-3 letters or 3 digits"));
        }

        Ok(Self::intern(language, script, region))
    }

    /// Parses a tag of the form `language(-script)?(-region)?`. Both `-` and
    /// `_` are accepted as separators.
    pub fn parse(input: &str) -> Result<LanguageTag, LanguageTagError> {
        let mut subtags = input.split(|c| c == '-' || c == '_');
        let language = subtags.next().unwrap_or_default();
        let mut script = None;
        let mut region = None;
        let mut next = subtags.next();

        if let Some(s) = next.filter(|s| is_script(s)) {
            script = Some(s);
            next = subtags.next();
        }

        if let Some(r) = next.filter(|r| is_region(r)) {
            region = Some(r);
            next = subtags.next();
        }

        if let Some(extra) = next {
            return Err(LanguageTagError::new(input, format!("unexpected subtag {extra:?}")));
        }

        Self::get(language, script, region)
            .map_err(|e| LanguageTagError::new(input, e.reason))
    }

    fn intern(language: &str, script: Option<&str>, region: Option<&str>) -> LanguageTag {
        let language = language.to_ascii_lowercase();
        let script = script.map(|s| s.to_ascii_lowercase());
        let region = region.map(|r| r.to_ascii_lowercase());

        let mut key = language.clone();
        script.iter().chain(region.iter()).for_each(|s| { key.push('-'); key.push_str(s); });

        LANGUAGE_TAGS.intern(key.as_str(), || {
            let mut display = language.clone();
            if let Some(script) = &script {
                display.push('-');
                display.push_str(&script[..1].to_ascii_uppercase());
                display.push_str(&script[1..]);
            }

            if let Some(region) = &region {
                display.push('-');
                display.push_str(&region.to_ascii_uppercase());
            }

            let record = Record {
                language: language.into(),
                script: script.map(|s| s.into()),
                region: region.map(|r| r.into()),
                display: display.into(),
            };

            (key.as_str().into(), LanguageTag(Arc::new(record)))
        })
    }

    #[inline(always)]
    pub fn ptr_eq(a: &LanguageTag, b: &LanguageTag) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// The primary language, lowercase.
    pub fn language(&self) -> &str {
        &self.0.language
    }

    /// The script, lowercase.
    pub fn script(&self) -> Option<&str> {
        self.0.script.as_deref()
    }

    /// The region, lowercase.
    pub fn region(&self) -> Option<&str> {
        self.0.region.as_deref()
    }

    pub fn as_str(&self) -> &str {
        &self.0.display
    }

    /// Returns `true` if `self` falls under `pattern`: the languages are equal
    /// and the script and region of `pattern` are either absent or equal to
    /// those of `self`. An absent subtag in `pattern` is a wildcard; one in
    /// `self` is not, so the relation isn't symmetric.
    ///
    /// ```rust
    /// use prism::LanguageTag;
    ///
    /// let tag = |s| LanguageTag::parse(s).unwrap();
    /// assert!(tag("ko-KR").matches(&tag("ko")));
    /// assert!(!tag("ko").matches(&tag("ko-KR")));
    /// assert!(!tag("ko-KR").matches(&tag("ko-Hang")));
    /// ```
    pub fn matches(&self, pattern: &LanguageTag) -> bool {
        self.language() == pattern.language()
            && pattern.script().map_or(true, |s| self.script() == Some(s))
            && pattern.region().map_or(true, |r| self.region() == Some(r))
    }

    /// Lazily yields every less specific tag, most specific first: without
    /// the region, without the script, then the bare language. When
    /// `include_self` is set, `self` comes first. No tag is yielded twice.
    ///
    /// ```rust
    /// use prism::LanguageTag;
    ///
    /// let tag = LanguageTag::parse("zh-Hant-HK").unwrap();
    /// let reduced: Vec<String> = tag.reduce(false).map(|t| t.to_string()).collect();
    /// assert_eq!(reduced, ["zh-Hant", "zh-HK", "zh"]);
    /// ```
    pub fn reduce(&self, include_self: bool) -> impl Iterator<Item = LanguageTag> + '_ {
        let (script, region) = (self.script(), self.region());
        let candidates = [(script, region), (script, None), (None, region), (None, None)];
        candidates.into_iter()
            .enumerate()
            .filter(move |&(i, c)| (i != 0 || include_self) && !candidates[..i].contains(&c))
            .map(move |(_, (script, region))| Self::intern(self.language(), script, region))
    }
}

impl PartialEq for LanguageTag {
    fn eq(&self, other: &Self) -> bool {
        LanguageTag::ptr_eq(self, other)
    }
}

impl Eq for LanguageTag { }

impl Hash for LanguageTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state)
    }
}

impl PartialOrd for LanguageTag {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageTag {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageTag({})", self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = LanguageTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTag::parse(s)
    }
}

impl TryFrom<&str> for LanguageTag {
    type Error = LanguageTagError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        LanguageTag::parse(value)
    }
}

impl Serialize for LanguageTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LanguageTag {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let string = <std::borrow::Cow<'de, str>>::deserialize(de)?;
        LanguageTag::parse(&string).map_err(serde::de::Error::custom)
    }
}

/// Conversion into an optional [`LanguageTag`], parsing if necessary.
pub trait IntoLanguageTag {
    fn into_language_tag(self) -> Result<Option<LanguageTag>, LanguageTagError>;
}

impl IntoLanguageTag for LanguageTag {
    fn into_language_tag(self) -> Result<Option<LanguageTag>, LanguageTagError> {
        Ok(Some(self))
    }
}

impl IntoLanguageTag for &LanguageTag {
    fn into_language_tag(self) -> Result<Option<LanguageTag>, LanguageTagError> {
        Ok(Some(self.clone()))
    }
}

impl IntoLanguageTag for &str {
    fn into_language_tag(self) -> Result<Option<LanguageTag>, LanguageTagError> {
        LanguageTag::parse(self).map(Some)
    }
}

impl<T: IntoLanguageTag> IntoLanguageTag for Option<T> {
    fn into_language_tag(self) -> Result<Option<LanguageTag>, LanguageTagError> {
        match self {
            Some(tag) => tag.into_language_tag(),
            None => Ok(None),
        }
    }
}

/// A source of human-readable language names, such as a CLDR lookup.
pub trait LanguageNames: Send + Sync {
    /// The name of `tag`, written in `in_language` if given, else in `tag`
    /// itself.
    fn display_name(&self, tag: &LanguageTag, in_language: Option<&LanguageTag>) -> Option<String>;
}

/// Knows no names.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNames;

impl LanguageNames for NoNames {
    fn display_name(&self, _: &LanguageTag, _: Option<&LanguageTag>) -> Option<String> {
        None
    }
}

/// Names from a fixed table, each written in its own language. Lookups fall
/// back through [`LanguageTag::reduce()`].
#[derive(Debug, Default, Clone)]
pub struct StaticNames(FxHashMap<LanguageTag, String>);

impl StaticNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: LanguageTag, name: impl Into<String>) -> &mut Self {
        self.0.insert(tag, name.into());
        self
    }
}

impl<S: Into<String>> FromIterator<(LanguageTag, S)> for StaticNames {
    fn from_iter<I: IntoIterator<Item = (LanguageTag, S)>>(iter: I) -> Self {
        StaticNames(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl LanguageNames for StaticNames {
    fn display_name(&self, tag: &LanguageTag, _: Option<&LanguageTag>) -> Option<String> {
        tag.reduce(true).find_map(|t| self.0.get(&t).cloned())
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(LanguageTag: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    #[test]
    fn interning_and_case() {
        assert!(LanguageTag::ptr_eq(&tag("en-us"), &tag("EN_US")));
        assert!(LanguageTag::ptr_eq(&tag("sr-Latn"), &LanguageTag::get("SR", Some("latn"), None).unwrap()));
        assert_eq!(tag("sr-latn-rs").to_string(), "sr-Latn-RS");
        assert_eq!(tag("es-419").region(), Some("419"));
        assert_eq!(tag("ko-KR").region(), Some("kr"));
    }

    #[test]
    fn three_letter_regions() {
        let usa = tag("en-USA");
        assert_eq!(usa.region(), Some("usa"));
        assert_eq!(usa.to_string(), "en-USA");
        assert_eq!(tag("zh_hant_twn").to_string(), "zh-Hant-TWN");
        assert!(usa.matches(&tag("en")));
        assert!(!usa.matches(&tag("en-US")));
        assert!(LanguageTag::get("en", None, Some("USA")).is_ok());
        assert!(LanguageTag::get("en", None, Some("U5A")).is_err());
    }

    #[test]
    fn rejects_invalid() {
        for bad in ["", "e", "engl", "en-", "en-Latn-US-x", "en-Latin", "en-U", "en-Latn-USAF", "en-1234", "e1", "en--US"] {
            assert!(LanguageTag::parse(bad).is_err(), "{bad:?} should be rejected");
        }

        assert!(LanguageTag::get("en", Some("Lat"), None).is_err());
        assert!(LanguageTag::get("en", None, Some("1")).is_err());
    }

    #[test]
    fn matching() {
        assert!(tag("ko-KR").matches(&tag("ko")));
        assert!(!tag("ko-KR").matches(&tag("ko-Hang")));
        assert!(tag("zh-Hant-HK").matches(&tag("zh")));
        assert!(tag("zh-Hant-HK").matches(&tag("zh-HK")));
        assert!(tag("zh-Hant-HK").matches(&tag("zh-Hant")));
        assert!(!tag("zh-Hant-HK").matches(&tag("zh-Hans")));
        assert!(!tag("en").matches(&tag("ko")));
    }

    #[test]
    fn reduction() {
        let show = |t: &LanguageTag, include: bool| t.reduce(include)
            .map(|t| t.to_string())
            .collect::<Vec<_>>();

        assert_eq!(show(&tag("zh-Hant-HK"), true), ["zh-Hant-HK", "zh-Hant", "zh-HK", "zh"]);
        assert_eq!(show(&tag("ko-KR"), false), ["ko"]);
        assert_eq!(show(&tag("ko-KR"), true), ["ko-KR", "ko"]);
        assert_eq!(show(&tag("sr-Latn"), false), ["sr"]);
        assert!(show(&tag("en"), false).is_empty());
        assert_eq!(show(&tag("en"), true), ["en"]);
    }

    #[test]
    fn static_names_fall_back() {
        let names: StaticNames = [(tag("ko"), "한국어"), (tag("en-GB"), "British English")]
            .into_iter()
            .collect();

        assert_eq!(names.display_name(&tag("ko-KR"), None).as_deref(), Some("한국어"));
        assert_eq!(names.display_name(&tag("en-GB"), None).as_deref(), Some("British English"));
        assert_eq!(names.display_name(&tag("en"), None), None);
        assert_eq!(NoNames.display_name(&tag("en"), None), None);
    }
}
