use std::sync::Arc;
use std::fmt;

use crate::{Content, LanguageTag, MediaType};

/// A conjunction of criteria over a content's media type and language.
///
/// Each criterion holds a list of alternatives and is satisfied if any one
/// of them is. An empty list places no constraint. `negate` inverts the
/// result of the whole conjunction.
///
/// ```rust
/// use prism::{Content, ContentFilter, MediaType, LanguageTag};
///
/// let content = Content::builder("text/html; charset=utf-8").unwrap()
///     .language("ko-KR").unwrap()
///     .build();
///
/// let html = MediaType::parse("text/html").unwrap();
/// let ko = LanguageTag::parse("ko").unwrap();
///
/// assert!(content.matches(&ContentFilter::new().media_type(html.clone())));
/// assert!(!content.matches(&ContentFilter::new().exact_media_type(html.clone())));
/// assert!(content.matches(&ContentFilter::new().language(ko.clone())));
/// assert!(!content.matches(&ContentFilter::new().exact_language(ko.clone())));
/// assert!(!content.matches(&ContentFilter::new().media_type(html).negate()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Compatible media types: see [`MediaType::matches()`].
    pub media_types: Vec<MediaType>,
    /// Identical media types.
    pub exact_media_types: Vec<MediaType>,
    /// Compatible languages: see [`LanguageTag::matches()`].
    pub languages: Vec<LanguageTag>,
    /// Identical languages.
    pub exact_languages: Vec<LanguageTag>,
    pub negate: bool,
}

impl ContentFilter {
    pub fn new() -> Self {
        ContentFilter::default()
    }

    pub fn media_type(mut self, media_type: MediaType) -> Self {
        self.media_types.push(media_type);
        self
    }

    pub fn exact_media_type(mut self, media_type: MediaType) -> Self {
        self.exact_media_types.push(media_type);
        self
    }

    pub fn language(mut self, language: LanguageTag) -> Self {
        self.languages.push(language);
        self
    }

    pub fn exact_language(mut self, language: LanguageTag) -> Self {
        self.exact_languages.push(language);
        self
    }

    pub fn negate(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn test(&self, content: &Content) -> bool {
        fn any<T>(alternatives: &[T], f: impl Fn(&T) -> bool) -> bool {
            alternatives.is_empty() || alternatives.iter().any(f)
        }

        let media_type = content.media_type();
        let language = content.language();
        let result = any(&self.media_types, |m| media_type.matches(m))
            && any(&self.exact_media_types, |m| media_type == m)
            && any(&self.languages, |l| language.map_or(false, |lang| lang.matches(l)))
            && any(&self.exact_languages, |l| language == Some(l));

        result != self.negate
    }
}

type Predicate = Arc<dyn Fn(&Content) -> bool + Send + Sync>;

/// Selects the contents a content transformer applies to: a declarative
/// [`ContentFilter`] or an arbitrary predicate.
#[derive(Clone)]
pub enum Criterion {
    Filter(ContentFilter),
    Predicate(Predicate),
}

impl Criterion {
    /// Accepts every content.
    pub fn any() -> Criterion {
        Criterion::Filter(ContentFilter::default())
    }

    pub fn predicate<F>(f: F) -> Criterion
        where F: Fn(&Content) -> bool + Send + Sync + 'static
    {
        Criterion::Predicate(Arc::new(f))
    }

    pub fn test(&self, content: &Content) -> bool {
        match self {
            Criterion::Filter(filter) => filter.test(content),
            Criterion::Predicate(f) => f(content),
        }
    }
}

impl Default for Criterion {
    fn default() -> Self {
        Criterion::any()
    }
}

impl From<ContentFilter> for Criterion {
    fn from(filter: ContentFilter) -> Self {
        Criterion::Filter(filter)
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Filter(filter) => f.debug_tuple("Filter").field(filter).finish(),
            Criterion::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
