//! Splitting a resource with several representations into one resource per
//! representation, plus a negotiator at the original path.
//!
//! ```text
//!                        ┌──▶ /index.en.html  (text/html; lang=en)
//!  /index.html ─ split ──┼──▶ /index.ko.html  (text/html; lang=ko)
//!  [en, ko]              └──▶ /index.html     (negotiator)
//! ```

mod negotiate;
mod script;
mod type_map;

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{ResourceError, Result};
use crate::pipeline::ResourceDivider;
use crate::url::{Url, UrlBuf};
use crate::value::{Dict, Value};
use crate::{Content, ContentKey, Replace, Resource};

pub use negotiate::{negotiate, parse_accept_language, score};
pub use script::ScriptNegotiator;
pub use type_map::TypeMapNegotiator;

/// One representation of a split resource and the path it moved to.
#[derive(Debug, Clone)]
pub struct View {
    pub path: UrlBuf,
    pub key: ContentKey,
    pub content: Content,
}

/// Produces the content served at a split resource's original path.
///
/// Implemented for every `Fn(&Url, &[View]) -> Result<Content>`.
pub trait Negotiator: Send + Sync + 'static {
    fn negotiate(&self, original: &Url, views: &[View]) -> Result<Content>;
}

impl<F> Negotiator for F
    where F: Fn(&Url, &[View]) -> Result<Content> + Send + Sync + 'static
{
    fn negotiate(&self, original: &Url, views: &[View]) -> Result<Content> {
        self(original, views)
    }
}

/// A [`ResourceDivider`] that gives every representation of a resource its
/// own path.
///
/// Resources with a single representation pass through untouched. Otherwise
/// each representation moves to `{stem}.{token}.{ext}`: `token` is the
/// lowercased language tag, or the media type's extension for a content
/// without one, and `ext` is the media type's extension, or the original
/// one. A directory path such as `/docs/` uses `/docs/index` as its stem.
///
/// Every view's metadata gains `multiViews`, a dictionary from each view's
/// path to its `type` and `language`, and `viewKey`, its own content key.
/// The [`Negotiator`] decides what is served at the original path; it is a
/// [`TypeMapNegotiator`] unless set.
///
/// ```rust
/// use prism::{Content, Resource};
/// use prism::multiview::MultiView;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let en = Content::builder("text/html").unwrap().language("en").unwrap().body("Hi").build();
/// let ko = Content::builder("text/html").unwrap().language("ko").unwrap().body("안녕").build();
/// let resource = Resource::new("/index.html", [en, ko]).unwrap();
///
/// let split = MultiView::new().split(&resource).unwrap();
/// let paths: Vec<_> = split.iter().map(|r| r.path().as_str()).collect();
/// assert_eq!(paths, ["/index.en.html", "/index.ko.html", "/index.html"]);
///
/// let metadata = split[1].single().unwrap().metadata().await.unwrap();
/// assert_eq!(metadata["viewKey"].as_str(), Some("text/html; lang=ko"));
/// # });
/// ```
#[derive(Clone)]
pub struct MultiView {
    negotiator: Arc<dyn Negotiator>,
}

impl MultiView {
    pub fn new() -> Self {
        MultiView { negotiator: Arc::new(TypeMapNegotiator::new()) }
    }

    pub fn negotiator<N: Negotiator>(mut self, negotiator: N) -> Self {
        self.negotiator = Arc::new(negotiator);
        self
    }

    pub fn split(&self, resource: &Resource) -> Result<Vec<Resource>> {
        if resource.len() < 2 {
            return Ok(vec![resource.clone()]);
        }

        let original = resource.path();
        let mut views: Vec<View> = Vec::with_capacity(resource.len());
        for content in resource.sorted_contents() {
            let path = view_path(original, content);
            if let Some(other) = views.iter().find(|view| view.path == path) {
                let reason = format!("{} and {} both map to this path", other.key, content.key());
                return Err(ResourceError::new(path.as_str(), reason).into());
            }

            views.push(View { path, key: content.key(), content: content.clone() });
        }

        tracing::debug!(path = %original, views = views.len(), "splitting into views");
        let map = Value::from(views.iter()
            .map(|view| {
                let entry = crate::dict![
                    "type" => view.content.media_type(),
                    "language" => view.content.language(),
                ];

                (Arc::from(view.path.as_str()), Value::from(entry))
            })
            .collect::<Dict>());

        let mut resources = Vec::with_capacity(views.len() + 1);
        for view in &views {
            let (map, key) = (map.clone(), view.key.clone());
            let content = view.content.replace(Replace::new().metadata_with(move |mut metadata: Dict| async move {
                metadata.insert("multiViews".into(), map);
                metadata.insert("viewKey".into(), Value::from(&key));
                Ok(metadata)
            }));

            resources.push(Resource::new(view.path.as_str(), [content])?);
        }

        let negotiator = self.negotiator.negotiate(original, &views)?;
        resources.push(Resource::new(original.as_str(), [negotiator])?);
        Ok(resources)
    }
}

impl Default for MultiView {
    fn default() -> Self {
        MultiView::new()
    }
}

impl ResourceDivider for MultiView {
    fn divide(&self, resource: Resource) -> BoxFuture<'static, Result<Vec<Resource>>> {
        future::ready(self.split(&resource)).boxed()
    }
}

fn view_path(original: &Url, content: &Content) -> UrlBuf {
    let media_type = content.media_type();
    let token = match content.language() {
        Some(language) => language.as_str().to_ascii_lowercase(),
        None => match media_type.extension() {
            Some(ext) => ext.to_owned(),
            None => media_type.subtypes().last().unwrap_or_default().to_owned(),
        },
    };

    let mut path = original.to_url_buf();
    if original.is_directory() {
        path.append("index");
    }

    let suffix = match media_type.extension().or_else(|| original.extension()) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    };

    path.set_extension(Some(&suffix));
    path
}

/// The latest modification time of any view, for negotiator contents.
pub(crate) fn latest(views: &[View]) -> Option<chrono::DateTime<chrono::Utc>> {
    views.iter().map(|view| view.content.last_modified()).max()
}

#[cfg(test)]
static_assertions::assert_impl_all!(MultiView: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn content(ty: &str, lang: Option<&str>) -> Content {
        Content::builder(ty).unwrap().language(lang).unwrap().body("x").build()
    }

    fn paths(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.path().as_str()).collect()
    }

    #[test]
    fn single_representations_pass_through() {
        let resource = Resource::new("/a.html", [content("text/html", Some("en"))]).unwrap();
        let split = MultiView::new().split(&resource).unwrap();
        assert_eq!(split.len(), 1);
        assert!(Resource::ptr_eq(&split[0], &resource));
    }

    #[test]
    fn derived_paths() {
        let url = |s: &str| UrlBuf::parse(s).unwrap();
        let path = |p: &str, c: &Content| view_path(url(p).as_url(), c).to_string();

        assert_eq!(path("/a.html", &content("text/html", Some("zh-Hant-TW"))), "/a.zh-hant-tw.html");
        assert_eq!(path("/docs/", &content("text/html", Some("ko"))), "/docs/index.ko.html");
        assert_eq!(path("/", &content("text/html", Some("en"))), "/index.en.html");
        assert_eq!(path("/a.md", &content("text/html", None)), "/a.html.html");
        assert_eq!(path("/a.md", &content("application/pdf", None)), "/a.pdf.pdf");
        assert_eq!(path("/a.bin", &content("application/x-thing", Some("en"))), "/a.en.bin");
        assert_eq!(path("/a", &content("application/x-thing", None)), "/a.x-thing");
    }

    #[tokio::test]
    async fn views_know_each_other() {
        let resource = Resource::new("/docs/", [
            content("text/html", Some("en")),
            content("application/pdf", None),
        ]).unwrap();

        let split = MultiView::new().split(&resource).unwrap();
        assert_eq!(paths(&split), ["/docs/index.pdf.pdf", "/docs/index.en.html", "/docs/"]);

        let metadata = split[1].single().unwrap().metadata().await.unwrap();
        let views = metadata["multiViews"].as_dict().unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views["/docs/index.en.html"].as_dict().unwrap()["language"], Value::from("en"));
        assert_eq!(views["/docs/index.pdf.pdf"].as_dict().unwrap()["language"], Value::Null);
        assert_eq!(metadata["viewKey"], Value::from("text/html; lang=en"));

        let negotiator = split[2].single().unwrap();
        assert_eq!(negotiator.media_type().as_str(), "application/x-type-map");
    }

    #[test]
    fn colliding_views_are_errors() {
        let resource = Resource::new("/a.html", [
            content("text/html", Some("en")),
            content("text/html; charset=utf-8", Some("en")),
        ]).unwrap();

        let error = MultiView::new().split(&resource).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Resource);
    }

    #[test]
    fn custom_negotiators() {
        let resource = Resource::new("/a.html", [
            content("text/html", Some("en")),
            content("text/html", Some("ko")),
        ]).unwrap();

        let multiview = MultiView::new().negotiator(|original: &Url, views: &[View]| {
            assert_eq!(original, "/a.html");
            Ok(Content::new("text/plain", format!("{} views", views.len()))?)
        });

        let split = multiview.split(&resource).unwrap();
        assert_eq!(split[2].single().unwrap().media_type().as_str(), "text/plain");
    }
}
