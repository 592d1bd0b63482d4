use std::borrow::Cow;
use std::sync::Arc;
use std::fmt;

use crate::value::Dict;

/// The body of a [`Content`](crate::Content): text or raw bytes.
///
/// A `Body` is an immutable snapshot. Cloning it is cheap, and no clone can
/// be used to change what a `Content` later returns. Use
/// [`Body::into_bytes()`] or [`Body::into_string()`] for an owned, mutable
/// copy.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Body {
    Text(Arc<str>),
    Bytes(Arc<[u8]>),
}

impl Body {
    pub fn empty() -> Body {
        Body::Text("".into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(s) => s.as_bytes(),
            Body::Bytes(b) => b,
        }
    }

    /// The body as text if it is text or if its bytes are valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            Body::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }

    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        match self {
            Body::Text(s) => Cow::Borrowed(s),
            Body::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Converts a UTF-8 `Bytes` body into `Text`. Returns `self` unchanged
    /// otherwise.
    pub fn into_text(self) -> Result<Body, Body> {
        match self {
            Body::Text(_) => Ok(self),
            Body::Bytes(ref b) => match std::str::from_utf8(b) {
                Ok(s) => Ok(Body::Text(s.into())),
                Err(_) => Err(self),
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn into_string(self) -> Option<String> {
        self.as_text().map(|s| s.to_string())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Body::Text(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Body::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
        }
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.into())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value.into())
    }
}

impl From<Arc<str>> for Body {
    fn from(value: Arc<str>) -> Self {
        Body::Text(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(value.into())
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::Bytes(value.into())
    }
}

impl From<Arc<[u8]>> for Body {
    fn from(value: Arc<[u8]>) -> Self {
        Body::Bytes(value)
    }
}

/// What a content loader produces: a body and, optionally, metadata to merge
/// over the content's existing metadata.
#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub body: Body,
    pub metadata: Option<Dict>,
}

impl Loaded {
    pub fn new(body: impl Into<Body>) -> Self {
        Loaded { body: body.into(), metadata: None }
    }

    pub fn with_metadata(mut self, metadata: Dict) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

macro_rules! impl_loaded_from_body {
    ($($T:ty),+) => {
        $(
            impl From<$T> for Loaded {
                fn from(body: $T) -> Self {
                    Loaded::new(body)
                }
            }
        )+
    };
}

impl_loaded_from_body!(Body, &str, String, Arc<str>, Vec<u8>, &[u8], Arc<[u8]>);

impl<B: Into<Body>> From<(B, Dict)> for Loaded {
    fn from((body, metadata): (B, Dict)) -> Self {
        Loaded::new(body).with_metadata(metadata)
    }
}
