mod parse;
mod ext;

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use std::{cmp, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MediaTypeError;
use crate::intern::Table;

pub use ext::EXTENSIONS;

static MEDIA_TYPES: Table<Arc<str>, MediaType> = Table::new();

/// An interned IANA media type: `type/subtype(.subtype)*(+suffix)*(; k=v)*`.
///
/// Two `MediaType`s are equal iff they are the same interned instance, which
/// happens iff their canonical forms are equal. Cloning is a reference-count
/// bump.
///
/// ```rust
/// use prism::MediaType;
///
/// let a = MediaType::parse("Text/HTML;Charset=UTF8").unwrap();
/// let b = MediaType::get("text", &["html"], &[], &[("charset", "utf-8")]).unwrap();
/// assert!(MediaType::ptr_eq(&a, &b));
/// assert_eq!(a.to_string(), "text/html; charset=utf-8");
/// ```
#[derive(Clone)]
pub struct MediaType(Arc<Record>);

#[derive(Debug)]
struct Record {
    ty: Box<str>,
    subtype: Box<[Box<str>]>,
    suffixes: Box<[Box<str>]>,
    parameters: BTreeMap<Box<str>, Box<str>>,
    canonical: Arc<str>,
}

impl MediaType {
    /// Validates and interns a media type from its components. Component and
    /// parameter names are lowercased; a `charset` value is canonicalized.
    pub fn get<S: AsRef<str>>(
        ty: &str,
        subtype: &[S],
        suffixes: &[S],
        parameters: &[(S, S)],
    ) -> Result<MediaType, MediaTypeError> {
        let describe = || {
            let mut s = format!("{ty}/");
            let subtype: Vec<_> = subtype.iter().map(|s| s.as_ref()).collect();
            s.push_str(&subtype.join("."));
            suffixes.iter().for_each(|x| { s.push('+'); s.push_str(x.as_ref()); });
            s
        };

        let parameters = parameters.iter().map(|(k, v)| (k.as_ref(), v.as_ref().to_string()));
        Self::build(&describe(), ty,
            subtype.iter().map(|s| s.as_ref()),
            suffixes.iter().map(|s| s.as_ref()),
            parameters)
    }

    /// Parses and interns a media type string.
    pub fn parse(input: &str) -> Result<MediaType, MediaTypeError> {
        let parts = parse::parse(input)?;
        Self::build(input, parts.ty, parts.subtype.into_iter(), parts.suffixes.into_iter(),
            parts.parameters.into_iter())
    }

    fn build<'a>(
        input: &str,
        ty: &str,
        subtype: impl ExactSizeIterator<Item = &'a str>,
        suffixes: impl Iterator<Item = &'a str>,
        parameters: impl Iterator<Item = (&'a str, String)>,
    ) -> Result<MediaType, MediaTypeError> {
        parse::validate_component(input, "type", ty)?;
        if subtype.len() == 0 {
            return Err(MediaTypeError::new(input, "missing subtype"));
        }

        let mut subtypes = Vec::with_capacity(subtype.len());
        for component in subtype {
            parse::validate_component(input, "subtype", component)?;
            subtypes.push(component.to_ascii_lowercase().into_boxed_str());
        }

        let mut suffix_list = vec![];
        for suffix in suffixes {
            parse::validate_component(input, "suffix", suffix)?;
            suffix_list.push(suffix.to_ascii_lowercase().into_boxed_str());
        }

        let mut params = BTreeMap::new();
        for (name, value) in parameters {
            parse::validate_parameter_name(input, name)?;
            parse::validate_parameter_value(input, &value)?;
            let name = name.to_ascii_lowercase();
            let value = match name.as_str() {
                "charset" => parse::canonical_charset(&value),
                _ => value,
            };

            if params.insert(name.clone().into_boxed_str(), value.into_boxed_str()).is_some() {
                return Err(MediaTypeError::new(input, format!("duplicate parameter {name:?}")));
            }
        }

        Ok(Self::intern(Record {
            ty: ty.to_ascii_lowercase().into(),
            subtype: subtypes.into(),
            suffixes: suffix_list.into(),
            parameters: params,
            canonical: Arc::from(""),
        }))
    }

    /// Interns `record`, whose components must already be valid and
    /// lowercased.
    fn intern(mut record: Record) -> MediaType {
        let canonical = record.canonical_string();
        MEDIA_TYPES.intern(canonical.as_str(), || {
            let key: Arc<str> = Arc::from(canonical.as_str());
            record.canonical = key.clone();
            (key, MediaType(Arc::new(record)))
        })
    }

    #[inline(always)]
    pub fn ptr_eq(a: &MediaType, b: &MediaType) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// The top-level type, e.g. `text` in `text/html`.
    pub fn ty(&self) -> &str {
        &self.0.ty
    }

    pub fn subtypes(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.subtype.iter().map(|s| &**s)
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.suffixes.iter().map(|s| &**s)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.0.parameters.get(&*name.to_ascii_lowercase()).map(|v| &**v)
    }

    /// Parameters, sorted by name.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.parameters.iter().map(|(k, v)| (&**k, &**v))
    }

    pub fn as_str(&self) -> &str {
        &self.0.canonical
    }

    /// Returns `true` if `self` and `other` share type, subtype and suffixes
    /// and every parameter in `other` is present in `self` with the same
    /// value. `self` may carry parameters `other` lacks, so this relation is
    /// not symmetric.
    ///
    /// ```rust
    /// use prism::MediaType;
    ///
    /// let html = MediaType::parse("text/html").unwrap();
    /// let utf8 = MediaType::parse("text/html; charset=utf-8").unwrap();
    /// assert!(utf8.matches(&html));
    /// assert!(!html.matches(&utf8));
    /// ```
    pub fn matches(&self, other: &MediaType) -> bool {
        if MediaType::ptr_eq(self, other) {
            return true;
        }

        self.0.ty == other.0.ty
            && self.0.subtype == other.0.subtype
            && self.0.suffixes == other.0.suffixes
            && other.0.parameters.iter().all(|(k, v)| self.0.parameters.get(k) == Some(v))
    }

    /// Returns this media type with parameter `name` set to `value`, or
    /// removed if `value` is `None`.
    pub fn with_parameter(&self, name: &str, value: Option<&str>) -> Result<MediaType, MediaTypeError> {
        parse::validate_parameter_name(self.as_str(), name)?;
        let name = name.to_ascii_lowercase();
        let parameters = self.parameters()
            .filter(|(k, _)| *k != name)
            .map(|(k, v)| (k, v.to_string()))
            .chain(value.map(|v| (name.as_str(), v.to_string())));

        Self::build(self.as_str(), &self.0.ty, self.subtypes().collect::<Vec<_>>().into_iter(),
            self.suffixes(), parameters)
    }

    /// This media type without any parameters.
    pub fn essence(&self) -> MediaType {
        if self.0.parameters.is_empty() {
            return self.clone();
        }

        Self::intern(Record {
            ty: self.0.ty.clone(),
            subtype: self.0.subtype.clone(),
            suffixes: self.0.suffixes.clone(),
            parameters: BTreeMap::new(),
            canonical: Arc::from(""),
        })
    }
}

impl Record {
    fn canonical_string(&self) -> String {
        let mut s = String::with_capacity(32);
        s.push_str(&self.ty);
        s.push('/');
        for (i, component) in self.subtype.iter().enumerate() {
            if i != 0 { s.push('.'); }
            s.push_str(component);
        }

        for suffix in self.suffixes.iter() {
            s.push('+');
            s.push_str(suffix);
        }

        for (name, value) in &self.parameters {
            s.push_str("; ");
            s.push_str(name);
            s.push('=');
            parse::quote_into(&mut s, value);
        }

        s
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        MediaType::ptr_eq(self, other)
    }
}

impl Eq for MediaType { }

impl Hash for MediaType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state)
    }
}

impl PartialOrd for MediaType {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaType {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaType({})", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s)
    }
}

impl TryFrom<&str> for MediaType {
    type Error = MediaTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MediaType::parse(value)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let string = <std::borrow::Cow<'de, str>>::deserialize(de)?;
        MediaType::parse(&string).map_err(serde::de::Error::custom)
    }
}

/// Conversion into a [`MediaType`], parsing if necessary.
pub trait IntoMediaType {
    fn into_media_type(self) -> Result<MediaType, MediaTypeError>;
}

impl IntoMediaType for MediaType {
    fn into_media_type(self) -> Result<MediaType, MediaTypeError> {
        Ok(self)
    }
}

impl IntoMediaType for &MediaType {
    fn into_media_type(self) -> Result<MediaType, MediaTypeError> {
        Ok(self.clone())
    }
}

impl IntoMediaType for &str {
    fn into_media_type(self) -> Result<MediaType, MediaTypeError> {
        MediaType::parse(self)
    }
}

impl IntoMediaType for String {
    fn into_media_type(self) -> Result<MediaType, MediaTypeError> {
        MediaType::parse(&self)
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(MediaType: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    #[test]
    fn interning() {
        let a = mt("application/vnd.api+json");
        let b = MediaType::get("APPLICATION", &["vnd", "API"], &["json"], &[]).unwrap();
        assert!(MediaType::ptr_eq(&a, &b));
        assert_eq!(a, b);

        let c = mt("text/plain;  b=2 ;a=1");
        let d = mt("text/plain; a=1; b=2");
        assert!(MediaType::ptr_eq(&c, &d));
        assert_eq!(c.to_string(), "text/plain; a=1; b=2");

        assert_ne!(mt("text/plain"), mt("text/plain; a=1"));
    }

    #[test]
    fn accessors() {
        let t = mt("application/vnd.api+json; Charset=\"Latin1\"");
        assert_eq!(t.ty(), "application");
        assert_eq!(t.subtypes().collect::<Vec<_>>(), ["vnd", "api"]);
        assert_eq!(t.suffixes().collect::<Vec<_>>(), ["json"]);
        assert_eq!(t.parameter("CHARSET"), Some("iso-8859-1"));
        assert_eq!(t.to_string(), "application/vnd.api+json; charset=iso-8859-1");
    }

    #[test]
    fn quoting_round_trips() {
        let t = mt(r#"text/plain; title="hello \"world\"""#);
        assert_eq!(t.parameter("title"), Some(r#"hello "world""#));
        assert_eq!(t.to_string(), r#"text/plain; title="hello \"world\"""#);
        assert!(MediaType::ptr_eq(&t, &mt(&t.to_string())));
    }

    #[test]
    fn rejects_invalid() {
        for bad in [
            "", "text", "text/", "/html", "text/html/x", "te xt/html", "text/ht ml",
            "text/.html", "text/html.", "text/html+", "text/html; a=1; A=2",
            "text/html; =1", "text/html; -a=1", "text/html; a=\"1", "text/html;",
        ] {
            assert!(MediaType::parse(bad).is_err(), "{bad:?} should be rejected");
        }

        assert!(MediaType::get("text", &["ht/ml"], &[], &[]).is_err());
        assert!(MediaType::get("text", &["html"], &["a;b"], &[]).is_err());
        assert!(MediaType::get::<&str>("text", &[], &[], &[]).is_err());
    }

    #[test]
    fn matching_is_one_sided() {
        let full = mt("text/html; charset=utf-8; level=1");
        assert!(full.matches(&mt("text/html")));
        assert!(full.matches(&mt("text/html; level=1")));
        assert!(!full.matches(&mt("text/html; level=2")));
        assert!(!mt("text/html").matches(&full));
        assert!(!mt("text/plain").matches(&mt("text/html")));
        assert!(!mt("image/svg+xml").matches(&mt("image/svg")));
    }

    #[test]
    fn with_parameter() {
        let t = mt("text/html");
        let u = t.with_parameter("Charset", Some("UTF8")).unwrap();
        assert_eq!(u, mt("text/html; charset=utf-8"));
        assert_eq!(u.with_parameter("charset", None).unwrap(), t);
        assert_eq!(u.essence(), t);
        assert!(t.with_parameter("bad name", Some("x")).is_err());
    }

    #[test]
    fn essence_is_the_interned_bare_type() {
        let full = mt("Application/VND.api+JSON; charset=latin1; level=1");
        let bare = full.essence();
        assert!(MediaType::ptr_eq(&bare, &mt("application/vnd.api+json")));
        assert_eq!(bare.to_string(), "application/vnd.api+json");
        assert_eq!(bare.parameters().count(), 0);
        assert!(MediaType::ptr_eq(&bare.essence(), &bare));
    }
}
