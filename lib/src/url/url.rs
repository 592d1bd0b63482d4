use std::ops::Deref;
use std::borrow::Borrow;
use std::sync::Arc;
use std::fmt;

use super::{UrlBuf, is_path_char};

/// A borrowed resource path: an absolute, `/`-separated URL path without a
/// query or fragment, such as `/blog/hello.html` or `/docs/`.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Url(str);

impl Url {
    /// Returns `Some` if `from` is a valid resource path.
    ///
    /// ```rust
    /// use prism::url::Url;
    ///
    /// assert!(Url::try_new("/index.html").is_some());
    /// assert!(Url::try_new("/docs/").is_some());
    /// assert!(Url::try_new("index.html").is_none());
    /// assert!(Url::try_new("/a b").is_none());
    /// assert!(Url::try_new("/a?b").is_none());
    /// ```
    pub const fn try_new(from: &str) -> Option<&Url> {
        if !Self::is_valid_str(from) {
            return None;
        }

        Some(unsafe { &*(from as *const str as *const Url) })
    }

    pub fn try_from(arc: Arc<str>) -> Result<Arc<Url>, Arc<str>> {
        if !Self::is_valid_str(&arc) {
            return Err(arc);
        }

        Ok(unsafe {
            Arc::from_raw(Arc::into_raw(arc) as *const str as *const Url)
        })
    }

    pub fn into(self: Arc<Self>) -> Arc<str> {
        unsafe {
            Arc::from_raw(Arc::into_raw(self) as *const Url as *const str)
        }
    }

    pub const fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_url_buf(&self) -> UrlBuf {
        UrlBuf::from_valid(self.0.to_owned())
    }

    const fn is_valid_str(string: &str) -> bool {
        let bytes = string.as_bytes();
        if bytes.is_empty() || bytes[0] != b'/' {
            return false;
        }

        let mut i = 0;
        while i < bytes.len() {
            if !is_path_char(&bytes[i]) {
                return false;
            }

            i += 1;
        }

        true
    }

    /// Returns `true` if this path names a directory, i.e, ends in `/`.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// The last path segment. Empty for directory paths.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }

    /// The portion of the file name after its last `.`, if any. A leading `.`
    /// doesn't start an extension.
    ///
    /// ```rust
    /// use prism::url::Url;
    ///
    /// let ext = |s| Url::try_new(s).unwrap().extension();
    /// assert_eq!(ext("/a/b.tar.gz"), Some("gz"));
    /// assert_eq!(ext("/a.b/c"), None);
    /// assert_eq!(ext("/.hidden"), None);
    /// assert_eq!(ext("/docs/"), None);
    /// ```
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&name[i + 1..]),
        }
    }

    /// This path without its extension, if it has one.
    ///
    /// ```rust
    /// use prism::url::Url;
    ///
    /// let strip = |s| Url::try_new(s).unwrap().without_extension().as_str();
    /// assert_eq!(strip("/a/b.tar.gz"), "/a/b.tar");
    /// assert_eq!(strip("/a.b/c"), "/a.b/c");
    /// assert_eq!(strip("/"), "/");
    /// ```
    pub fn without_extension(&self) -> &Url {
        match self.extension() {
            Some(ext) => {
                let end = self.0.len() - ext.len() - 1;
                unsafe { &*(&self.0[..end] as *const str as *const Url) }
            }
            None => self,
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Deref for Url {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Borrow<str> for Url {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<Url> for Url {
    fn as_ref(&self) -> &Url {
        self
    }
}

impl ToOwned for Url {
    type Owned = UrlBuf;

    fn to_owned(&self) -> Self::Owned {
        self.to_url_buf()
    }
}

impl PartialEq<str> for Url {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Url {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
