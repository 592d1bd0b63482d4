use std::ops::Deref;
use std::borrow::Borrow;
use std::path::{Component, Path};
use std::sync::Arc;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Url, is_path_char};

/// An owned, valid resource path. See [`Url`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct UrlBuf(String);

impl UrlBuf {
    /// The root path, `/`.
    pub fn root() -> UrlBuf {
        UrlBuf("/".into())
    }

    pub(crate) fn from_valid(string: String) -> UrlBuf {
        debug_assert!(Url::try_new(&string).is_some(), "invalid URL {string:?}");
        UrlBuf(string)
    }

    pub fn parse<S: Into<String>>(string: S) -> Option<UrlBuf> {
        let string = string.into();
        Url::try_new(&string)?;
        Some(UrlBuf(string))
    }

    pub fn as_url(&self) -> &Url {
        Url::try_new(self.0.as_str()).expect("UrlBuf is always valid")
    }

    pub fn into_arc_url(self) -> Arc<Url> {
        Url::try_from(Arc::from(self.0.into_boxed_str())).expect("UrlBuf is always valid")
    }

    /// ```rust
    /// use prism::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::root();
    /// url.append("bar/baz");
    /// assert_eq!(url.as_str(), "/bar/baz");
    ///
    /// url.append("/foo/bar/");
    /// assert_eq!(url.as_str(), "/bar/baz/foo/bar/");
    ///
    /// url.append("index.html");
    /// assert_eq!(url.as_str(), "/bar/baz/foo/bar/index.html");
    /// ```
    pub fn append(&mut self, segment: &str) -> &mut Self {
        let start = self.0.len();
        match (self.0.ends_with('/'), segment.starts_with('/')) {
            (true, true) => self.0.push_str(&segment[1..]),
            (true, false) | (false, true) => self.0.push_str(segment),
            (false, false) => {
                self.0.push('/');
                self.0.push_str(segment);
            }
        }

        self.encode_tail(start);
        self
    }

    /// Replaces the extension, adding one if there is none, or removes it
    /// when `ext` is `None`. Directory paths are left unchanged.
    ///
    /// ```rust
    /// use prism::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::parse("/post.md").unwrap();
    /// url.set_extension(Some("html"));
    /// assert_eq!(url.as_str(), "/post.html");
    ///
    /// url.set_extension(None);
    /// assert_eq!(url.as_str(), "/post");
    ///
    /// url.set_extension(Some("css"));
    /// assert_eq!(url.as_str(), "/post.css");
    /// ```
    pub fn set_extension(&mut self, ext: Option<&str>) -> &mut Self {
        if self.is_directory() {
            return self;
        }

        let stem_len = self.without_extension().len();
        self.0.truncate(stem_len);
        if let Some(ext) = ext {
            let start = self.0.len();
            self.0.push('.');
            self.0.push_str(ext);
            self.encode_tail(start);
        }

        self
    }

    /// Percent-encodes any byte from `start` on that isn't a path character.
    fn encode_tail(&mut self, start: usize) {
        let is_literal = |b: &u8| is_path_char(b) && *b != b'%';
        if self.0.as_bytes()[start..].iter().all(is_literal) {
            return;
        }

        let mut encoded = String::with_capacity(self.0.len() + 8);
        encoded.push_str(&self.0[..start]);
        for &b in &self.0.as_bytes()[start..] {
            if is_literal(&b) {
                encoded.push(b as char);
            } else {
                encoded.push_str(&format!("%{b:02X}"));
            }
        }

        self.0 = encoded;
    }
}

/// Builds an absolute resource path from a relative file system path,
/// dropping `.` and resolving `..` lexically. Characters that aren't valid in
/// a path are percent-encoded.
///
/// ```rust
/// use std::path::Path;
/// use prism::url::UrlBuf;
///
/// assert_eq!(UrlBuf::from(Path::new("a/./b/../c d.md")).as_str(), "/a/c%20d.md");
/// assert_eq!(UrlBuf::from(Path::new("")).as_str(), "/");
/// ```
impl From<&Path> for UrlBuf {
    fn from(value: &Path) -> Self {
        let mut segments: Vec<String> = vec![];
        for component in value.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => continue,
                Component::ParentDir => { segments.pop(); },
                Component::Normal(v) => segments.push(v.to_string_lossy().into_owned()),
            }
        }

        let mut url = UrlBuf::root();
        for segment in &segments {
            url.append(segment);
        }

        url
    }
}

impl TryFrom<String> for UrlBuf {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match Url::try_new(&value) {
            Some(_) => Ok(UrlBuf(value)),
            None => Err(value),
        }
    }
}

impl From<&Url> for UrlBuf {
    fn from(value: &Url) -> Self {
        value.to_url_buf()
    }
}

impl<'de> Deserialize<'de> for UrlBuf {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let string = String::deserialize(de)?;
        UrlBuf::try_from(string)
            .map_err(|s| serde::de::Error::custom(format!("invalid resource path {s:?}")))
    }
}

impl fmt::Display for UrlBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for UrlBuf {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        self.as_url()
    }
}

impl AsRef<Url> for UrlBuf {
    fn as_ref(&self) -> &Url {
        self.as_url()
    }
}

impl Borrow<Url> for UrlBuf {
    fn borrow(&self) -> &Url {
        self.as_url()
    }
}

impl AsRef<str> for UrlBuf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<UrlBuf> for Arc<Url> {
    fn from(value: UrlBuf) -> Self {
        value.into_arc_url()
    }
}

impl From<UrlBuf> for String {
    fn from(value: UrlBuf) -> Self {
        value.0
    }
}
