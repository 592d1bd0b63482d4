//! Representations: a media type, an optional language, and a lazily loaded
//! body and metadata.

mod body;
mod key;
mod replace;
mod filter;

use std::future::Future;
use std::sync::Arc;
use std::fmt;

use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt, Shared, TryFutureExt};

use crate::error::{Error, LanguageTagError, MediaTypeError, Result};
use crate::language_tag::IntoLanguageTag;
use crate::media_type::IntoMediaType;
use crate::value::Dict;
use crate::{LanguageTag, MediaType};

pub use body::{Body, Loaded};
pub use key::ContentKey;
pub use replace::Replace;
pub use filter::{ContentFilter, Criterion};

/// A single-assignment lazy cell. The inner future runs at most once, no
/// matter how many clones poll it, and every poll after completion replays
/// the cached result, error or not.
pub(crate) type Lazy<T> = Shared<BoxFuture<'static, Result<T>>>;

/// The body and metadata of a content, each in its own lazy cell. A field
/// that was overridden never awaits the cell it replaced.
#[derive(Clone)]
pub(crate) struct LazyPayload {
    pub body: Lazy<Body>,
    pub metadata: Lazy<Arc<Dict>>,
}

/// A lazy cell that is already resolved to `value`.
pub(crate) fn ready<T: Clone + Send + Sync + 'static>(value: T) -> Lazy<T> {
    let cell = future::ok(value).boxed().shared();
    let _ = cell.clone().now_or_never();
    cell
}

impl LazyPayload {
    fn ready(body: Body, metadata: Dict) -> Self {
        LazyPayload { body: ready(body), metadata: ready(Arc::new(metadata)) }
    }

    /// Both cells from one load, which runs at most once.
    pub(crate) fn from_load<F>(load: F) -> Self
        where F: Future<Output = Result<(Body, Arc<Dict>)>> + Send + 'static
    {
        let load = load.boxed().shared();
        LazyPayload {
            body: load.clone().map_ok(|(body, _)| body).boxed().shared(),
            metadata: load.map_ok(|(_, metadata)| metadata).boxed().shared(),
        }
    }

    fn is_loaded(&self) -> bool {
        self.body.peek().is_some() && self.metadata.peek().is_some()
    }
}

type Loader = Box<dyn FnOnce() -> BoxFuture<'static, Result<Loaded>> + Send>;

/// One representation of a resource.
///
/// A `Content` is an immutable, cheap-to-clone handle. Its media type,
/// language, modification time, and entity tag are available immediately.
/// Its body and metadata may be produced by a loader which runs the first
/// time either is requested and never again; concurrent requests await the
/// same load.
///
/// ```rust
/// # futures::executor::block_on(async {
/// use prism::Content;
///
/// let content = Content::builder("text/plain")?
///     .language("ko")?
///     .loader(|| async { Ok("안녕하세요") })
///     .build();
///
/// assert_eq!(content.key().to_string(), "text/plain; lang=ko");
/// assert_eq!(content.body().await?.as_text(), Some("안녕하세요"));
/// # Ok::<(), prism::error::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Content(Arc<Inner>);

struct Inner {
    media_type: MediaType,
    language: Option<LanguageTag>,
    last_modified: DateTime<Utc>,
    etag: Option<Arc<str>>,
    payload: LazyPayload,
}

impl Content {
    /// Starts building a content of type `media_type`. Fails immediately if
    /// `media_type` is a string that doesn't parse.
    pub fn builder<T: IntoMediaType>(media_type: T) -> Result<ContentBuilder, MediaTypeError> {
        Ok(ContentBuilder {
            media_type: media_type.into_media_type()?,
            language: None,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
            etag: None,
            metadata: Dict::new(),
            source: Source::Body(Body::empty()),
        })
    }

    /// A content of type `media_type` with a literal `body` and nothing else.
    pub fn new<T, B>(media_type: T, body: B) -> Result<Content, MediaTypeError>
        where T: IntoMediaType, B: Into<Body>
    {
        Ok(Content::builder(media_type)?.body(body).build())
    }

    pub fn ptr_eq(a: &Content, b: &Content) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn media_type(&self) -> &MediaType {
        &self.0.media_type
    }

    pub fn language(&self) -> Option<&LanguageTag> {
        self.0.language.as_ref()
    }

    /// The content's key, derived from its media type and language.
    pub fn key(&self) -> ContentKey {
        ContentKey::get(self.media_type(), self.language())
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.0.last_modified
    }

    pub fn etag(&self) -> Option<&str> {
        self.0.etag.as_deref()
    }

    /// Returns `true` if the body and metadata have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.0.payload.is_loaded()
    }

    /// The body, loading it if necessary.
    pub async fn body(&self) -> Result<Body> {
        self.0.payload.body.clone().await
    }

    /// A copy of the metadata, loading it if necessary.
    pub async fn metadata(&self) -> Result<Dict> {
        let metadata = self.0.payload.metadata.clone().await?;
        Ok((*metadata).clone())
    }

    /// The body and a copy of the metadata, loading them if necessary.
    pub async fn load(&self) -> Result<(Body, Dict)> {
        let payload = self.0.payload.clone();
        let (body, metadata) = future::try_join(payload.body, payload.metadata).await?;
        Ok((body, (*metadata).clone()))
    }

    /// Returns a new content with the fields set in `replace` overridden and
    /// the rest preserved. Replacing nothing returns `self`.
    ///
    /// Body and metadata overrides are deferred: nothing is loaded until the
    /// new content's body or metadata is requested, and the loader of `self`
    /// still runs at most once no matter how many replacements share it.
    ///
    /// ```rust
    /// use prism::{Content, Replace};
    ///
    /// let content = Content::new("text/plain", "hi").unwrap();
    /// assert!(Content::ptr_eq(&content, &content.replace(Replace::new())));
    ///
    /// let html = content.replace(Replace::new().media_type("text/html").unwrap());
    /// assert_eq!(html.media_type().as_str(), "text/html");
    /// assert_eq!(html.last_modified(), content.last_modified());
    /// ```
    pub fn replace(&self, replace: Replace) -> Content {
        if replace.is_empty() {
            return self.clone();
        }

        let parts = replace.into_parts();
        let payload = parts.payload.compose(&self.0.payload);
        Content(Arc::new(Inner {
            media_type: parts.media_type.unwrap_or_else(|| self.0.media_type.clone()),
            language: parts.language.unwrap_or_else(|| self.0.language.clone()),
            last_modified: parts.last_modified.unwrap_or(self.0.last_modified),
            etag: parts.etag.unwrap_or_else(|| self.0.etag.clone()),
            payload,
        }))
    }

    /// Returns `true` if `self` satisfies `filter`.
    pub fn matches(&self, filter: &ContentFilter) -> bool {
        filter.test(self)
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content")
            .field("media_type", &self.0.media_type)
            .field("language", &self.0.language)
            .field("last_modified", &self.0.last_modified)
            .field("etag", &self.0.etag)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl fmt::Debug for ContentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentBuilder")
            .field("media_type", &self.media_type)
            .field("language", &self.language)
            .field("last_modified", &self.last_modified)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

enum Source {
    Body(Body),
    Loader(Loader),
}

/// Builds a [`Content`]. Returned by [`Content::builder()`].
pub struct ContentBuilder {
    media_type: MediaType,
    language: Option<LanguageTag>,
    last_modified: DateTime<Utc>,
    etag: Option<Arc<str>>,
    metadata: Dict,
    source: Source,
}

impl ContentBuilder {
    /// Sets the language. Fails immediately if `language` is a string that
    /// doesn't parse.
    pub fn language<T: IntoLanguageTag>(mut self, language: T) -> Result<Self, LanguageTagError> {
        self.language = language.into_language_tag()?;
        Ok(self)
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn etag<S: Into<Arc<str>>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// The base metadata. A loader's metadata, if any, is merged over it.
    pub fn metadata(mut self, metadata: Dict) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets a literal body, replacing any loader.
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.source = Source::Body(body.into());
        self
    }

    /// Sets a loader, replacing any literal body. The loader is called at
    /// most once, the first time the body or metadata is requested.
    pub fn loader<F, Fut, L>(mut self, loader: F) -> Self
        where F: FnOnce() -> Fut + Send + 'static,
              Fut: Future<Output = Result<L>> + Send + 'static,
              L: Into<Loaded>
    {
        let loader: Loader = Box::new(move || {
            loader().map(|result| result.map(Into::into)).boxed()
        });

        self.source = Source::Loader(loader);
        self
    }

    pub fn build(self) -> Content {
        let base = self.metadata;
        let payload = match self.source {
            Source::Body(body) => LazyPayload::ready(body, base),
            Source::Loader(loader) => LazyPayload::from_load(async move {
                let Loaded { body, metadata } = loader().await?;
                let mut merged = base;
                merged.extend(metadata.unwrap_or_default());
                Ok::<_, Error>((body, Arc::new(merged)))
            }),
        };

        Content(Arc::new(Inner {
            media_type: self.media_type,
            language: self.language,
            last_modified: self.last_modified,
            etag: self.etag,
            payload,
        }))
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(Content: Send, Sync);
