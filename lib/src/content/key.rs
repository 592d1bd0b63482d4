use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::fmt;

use crate::intern::Table;
use crate::{LanguageTag, MediaType};

static CONTENT_KEYS: Table<(MediaType, Option<LanguageTag>), ContentKey> = Table::new();

/// The identity of a representation: its media type and language.
///
/// Keys are interned. Two keys built from the same media type and language
/// are the same key, and equality is a pointer comparison.
///
/// ```rust
/// use prism::{ContentKey, LanguageTag, MediaType};
///
/// let html = MediaType::parse("text/html").unwrap();
/// let ko = LanguageTag::parse("ko").unwrap();
///
/// let a = ContentKey::get(&html, Some(&ko));
/// let b = ContentKey::get(&html, Some(&ko));
/// assert!(ContentKey::ptr_eq(&a, &b));
/// assert_eq!(a.to_string(), "text/html; lang=ko");
/// assert_eq!(ContentKey::get(&html, None).to_string(), "text/html");
/// ```
#[derive(Clone)]
pub struct ContentKey(Arc<Record>);

struct Record {
    media_type: MediaType,
    language: Option<LanguageTag>,
    display: Box<str>,
}

impl ContentKey {
    pub fn get(media_type: &MediaType, language: Option<&LanguageTag>) -> ContentKey {
        let key = (media_type.clone(), language.cloned());
        CONTENT_KEYS.intern(&key, || {
            let display = match language {
                Some(lang) => format!("{media_type}; lang={lang}"),
                None => media_type.to_string(),
            };

            let record = Record {
                media_type: media_type.clone(),
                language: language.cloned(),
                display: display.into(),
            };

            (key.clone(), ContentKey(Arc::new(record)))
        })
    }

    pub fn ptr_eq(a: &ContentKey, b: &ContentKey) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn media_type(&self) -> &MediaType {
        &self.0.media_type
    }

    pub fn language(&self) -> Option<&LanguageTag> {
        self.0.language.as_ref()
    }

    pub fn as_str(&self) -> &str {
        &self.0.display
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        ContentKey::ptr_eq(self, other)
    }
}

impl Eq for ContentKey { }

impl Hash for ContentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state)
    }
}

impl PartialOrd for ContentKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by media type, then by language, with no language first.
impl Ord for ContentKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.media_type().cmp(other.media_type())
            .then_with(|| self.language().cmp(&other.language()))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let html = MediaType::parse("text/html").unwrap();
        let css = MediaType::parse("text/css").unwrap();
        let en = LanguageTag::parse("en").unwrap();
        let ko = LanguageTag::parse("ko").unwrap();

        let mut keys = vec![
            ContentKey::get(&html, Some(&ko)),
            ContentKey::get(&html, None),
            ContentKey::get(&css, Some(&en)),
            ContentKey::get(&html, Some(&en)),
        ];

        keys.sort();
        let keys: Vec<_> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, [
            "text/css; lang=en",
            "text/html",
            "text/html; lang=en",
            "text/html; lang=ko",
        ]);
    }

    #[test]
    fn distinct_parameters_are_distinct_keys() {
        let plain = MediaType::parse("text/html").unwrap();
        let utf8 = MediaType::parse("text/html; charset=UTF8").unwrap();
        let a = ContentKey::get(&plain, None);
        let b = ContentKey::get(&utf8, None);
        assert_ne!(a, b);
        assert_eq!(b, ContentKey::get(&MediaType::parse("text/html;charset=utf-8").unwrap(), None));
    }
}
