use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{Error, LanguageTagError, MediaTypeError, Result};
use crate::language_tag::IntoLanguageTag;
use crate::media_type::IntoMediaType;
use crate::value::Dict;
use crate::{LanguageTag, MediaType};
use super::{ready, Body, Loaded, LazyPayload};

type BodyFn = Box<dyn FnOnce(Body) -> BoxFuture<'static, Result<Body>> + Send>;
type MetadataFn = Box<dyn FnOnce(Dict) -> BoxFuture<'static, Result<Dict>> + Send>;
type LoadFn = Box<dyn FnOnce(Body, Dict) -> BoxFuture<'static, Result<Loaded>> + Send>;

enum Override<T, F> {
    Value(T),
    With(F),
}

/// The fields to override in [`Content::replace()`](crate::Content::replace).
///
/// Every field is optional; unset fields keep the original's value. Body and
/// metadata can be set to a literal or computed from the original's, lazily.
/// When several are set, they apply in order: [`Replace::load_with()`], then
/// the body override, then the metadata override.
#[derive(Default)]
pub struct Replace {
    media_type: Option<MediaType>,
    language: Option<Option<LanguageTag>>,
    last_modified: Option<DateTime<Utc>>,
    etag: Option<Option<Arc<str>>>,
    payload: PayloadReplace,
}

#[derive(Default)]
pub(super) struct PayloadReplace {
    load: Option<LoadFn>,
    body: Option<Override<Body, BodyFn>>,
    metadata: Option<Override<Dict, MetadataFn>>,
}

pub(super) struct Parts {
    pub media_type: Option<MediaType>,
    pub language: Option<Option<LanguageTag>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<Option<Arc<str>>>,
    pub payload: PayloadReplace,
}

impl Replace {
    pub fn new() -> Self {
        Replace::default()
    }

    pub fn media_type<T: IntoMediaType>(mut self, media_type: T) -> Result<Self, MediaTypeError> {
        self.media_type = Some(media_type.into_media_type()?);
        Ok(self)
    }

    /// Sets the language. `None` removes it.
    pub fn language<T: IntoLanguageTag>(mut self, language: T) -> Result<Self, LanguageTagError> {
        self.language = Some(language.into_language_tag()?);
        Ok(self)
    }

    pub fn last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Sets the entity tag. `None` removes it.
    pub fn etag<S: Into<Arc<str>>>(mut self, etag: Option<S>) -> Self {
        self.etag = Some(etag.map(Into::into));
        self
    }

    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.payload.body = Some(Override::Value(body.into()));
        self
    }

    /// Computes the new body from the original's when it is first needed.
    pub fn body_with<F, Fut, B>(mut self, f: F) -> Self
        where F: FnOnce(Body) -> Fut + Send + 'static,
              Fut: Future<Output = Result<B>> + Send + 'static,
              B: Into<Body>
    {
        let f: BodyFn = Box::new(move |body| f(body).map(|r| r.map(Into::into)).boxed());
        self.payload.body = Some(Override::With(f));
        self
    }

    /// Replaces the metadata entirely.
    pub fn metadata(mut self, metadata: Dict) -> Self {
        self.payload.metadata = Some(Override::Value(metadata));
        self
    }

    /// Computes the new metadata from (a copy of) the original's when it is
    /// first needed.
    pub fn metadata_with<F, Fut>(mut self, f: F) -> Self
        where F: FnOnce(Dict) -> Fut + Send + 'static,
              Fut: Future<Output = Result<Dict>> + Send + 'static,
    {
        let f: MetadataFn = Box::new(move |metadata| f(metadata).boxed());
        self.payload.metadata = Some(Override::With(f));
        self
    }

    /// Computes a new body, and metadata to merge over the original's, from
    /// the original body and metadata when either is first needed.
    pub fn load_with<F, Fut, L>(mut self, f: F) -> Self
        where F: FnOnce(Body, Dict) -> Fut + Send + 'static,
              Fut: Future<Output = Result<L>> + Send + 'static,
              L: Into<Loaded>
    {
        let f: LoadFn = Box::new(move |body, metadata| {
            f(body, metadata).map(|r| r.map(Into::into)).boxed()
        });

        self.payload.load = Some(f);
        self
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none()
            && self.language.is_none()
            && self.last_modified.is_none()
            && self.etag.is_none()
            && self.payload.is_empty()
    }

    pub(super) fn into_parts(self) -> Parts {
        Parts {
            media_type: self.media_type,
            language: self.language,
            last_modified: self.last_modified,
            etag: self.etag,
            payload: self.payload,
        }
    }
}

impl PayloadReplace {
    fn is_empty(&self) -> bool {
        self.load.is_none() && self.body.is_none() && self.metadata.is_none()
    }

    /// A lazy payload applying `self` to `parent`. Body and metadata are
    /// composed independently: a literal override never awaits the parent,
    /// and an unset one shares the parent's cell.
    pub(super) fn compose(self, parent: &LazyPayload) -> LazyPayload {
        let PayloadReplace { load, body, metadata } = self;
        let base = match load {
            None => parent.clone(),
            Some(load) => {
                let parent = parent.clone();
                LazyPayload::from_load(async move {
                    let (body, metadata) = future::try_join(parent.body, parent.metadata).await?;
                    let loaded = load(body, (*metadata).clone()).await?;
                    let mut merged = (*metadata).clone();
                    merged.extend(loaded.metadata.unwrap_or_default());
                    Ok::<_, Error>((loaded.body, Arc::new(merged)))
                })
            }
        };

        let body = match body {
            None => base.body,
            Some(Override::Value(body)) => ready(body),
            Some(Override::With(f)) => {
                let parent = base.body;
                async move { f(parent.await?).await }.boxed().shared()
            }
        };

        let metadata = match metadata {
            None => base.metadata,
            Some(Override::Value(metadata)) => ready(Arc::new(metadata)),
            Some(Override::With(f)) => {
                let parent = base.metadata;
                async move { f((*parent.await?).clone()).await.map(Arc::new) }.boxed().shared()
            }
        };

        LazyPayload { body, metadata }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::dict;
    use crate::value::Value;
    use crate::{Content, ContentKey};
    use super::*;

    fn counted(counter: &Arc<AtomicUsize>) -> Content {
        let counter = counter.clone();
        Content::builder("text/plain").unwrap()
            .language("en").unwrap()
            .last_modified(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap())
            .etag("abc")
            .metadata(dict!["title" => "Hello"])
            .loader(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("hello")
            })
            .build()
    }

    #[tokio::test]
    async fn replacing_type_preserves_the_rest() {
        let counter = Arc::new(AtomicUsize::new(0));
        let original = counted(&counter);
        let replaced = original.replace(Replace::new().media_type("text/markdown").unwrap());

        assert!(!Content::ptr_eq(&original, &replaced));
        assert_eq!(replaced.media_type().as_str(), "text/markdown");
        assert_eq!(replaced.language(), original.language());
        assert_eq!(replaced.last_modified(), original.last_modified());
        assert_eq!(replaced.etag(), Some("abc"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(replaced.body().await.unwrap(), original.body().await.unwrap());
        assert_eq!(replaced.metadata().await.unwrap(), original.metadata().await.unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_ne!(replaced.key(), original.key());
    }

    #[tokio::test]
    async fn chained_replacements_share_one_load() {
        let counter = Arc::new(AtomicUsize::new(0));
        let original = counted(&counter);

        let upper = original.replace(Replace::new().body_with(|body: Body| async move {
            Ok(body.to_text_lossy().to_uppercase())
        }));

        let tagged = upper.replace(Replace::new().metadata_with(|mut metadata: Dict| async move {
            metadata.insert("tagged".into(), true.into());
            Ok(metadata)
        }));

        let retyped = tagged.replace(Replace::new().media_type("text/x-shout").unwrap());
        let (a, b, c) = futures::join!(retyped.load(), upper.body(), original.body());

        let (body, metadata) = a.unwrap();
        assert_eq!(body.as_text(), Some("HELLO"));
        assert_eq!(metadata["title"], Value::from("Hello"));
        assert_eq!(metadata["tagged"], Value::from(true));
        assert_eq!(b.unwrap().as_text(), Some("HELLO"));
        assert_eq!(c.unwrap().as_text(), Some("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_with_merges_metadata() {
        let content = Content::builder("text/plain").unwrap()
            .metadata(dict!["title" => "Old", "author" => "Kim"])
            .body("body")
            .build();

        let replaced = content.replace(Replace::new().load_with(|body: Body, metadata: Dict| async move {
            assert_eq!(metadata["author"], Value::from("Kim"));
            let text = format!("{}!", body.to_text_lossy());
            Ok((text, dict!["title" => "New"]))
        }));

        let (body, metadata) = replaced.load().await.unwrap();
        assert_eq!(body.as_text(), Some("body!"));
        assert_eq!(metadata["title"], Value::from("New"));
        assert_eq!(metadata["author"], Value::from("Kim"));
    }

    #[tokio::test]
    async fn literal_overrides_skip_the_parent() {
        let original = Content::builder("text/plain").unwrap()
            .loader(|| async {
                let result: Result<&str> = crate::err!("never loaded");
                result
            })
            .build();

        let replaced = original.replace(Replace::new().body("fresh").metadata(Dict::new()));
        assert_eq!(replaced.body().await.unwrap().as_text(), Some("fresh"));
        assert!(original.body().await.is_err());
    }

    #[tokio::test]
    async fn overridden_fields_never_load_the_parent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let original = counted(&counter);

        let body_only = original.replace(Replace::new().body("fresh"));
        assert_eq!(body_only.body().await.unwrap().as_text(), Some("fresh"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let metadata_only = original.replace(Replace::new().metadata(dict!["title" => "Other"]));
        assert_eq!(metadata_only.metadata().await.unwrap()["title"], Value::from("Other"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(body_only.metadata().await.unwrap()["title"], Value::from("Hello"));
        assert_eq!(metadata_only.body().await.unwrap().as_text(), Some("hello"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn body_overrides_survive_failing_parents() {
        let original = Content::builder("text/plain").unwrap()
            .loader(|| async {
                let result: Result<&str> = crate::err!("never loaded");
                result
            })
            .build();

        let replaced = original.replace(Replace::new().body("fresh"));
        assert_eq!(replaced.body().await.unwrap().as_text(), Some("fresh"));
        assert!(replaced.metadata().await.is_err());
    }

    #[test]
    fn clearing_language_changes_key() {
        let content = Content::builder("text/html").unwrap().language("ko").unwrap().build();
        let neutral = content.replace(Replace::new().language(None::<LanguageTag>).unwrap());
        assert_eq!(neutral.language(), None);
        assert_eq!(neutral.key(), ContentKey::get(content.media_type(), None));
        assert!(!Replace::new().etag(None::<&str>).is_empty());
    }
}
