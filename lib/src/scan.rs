use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::fs;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{Chainable, Result};
use crate::pipeline::{Merger, Pipeline};
use crate::url::UrlBuf;
use crate::{Body, Content, LanguageTag, MediaType, Resource};

/// Discovers source files under a root directory as resources.
///
/// Every regular, non-hidden file becomes a content at the path of the file
/// relative to the root. A language suffix before the extension names the
/// content's language and is dropped from the path, so `a/b.ko.md` and
/// `a/b.en.md` are two representations of `/a/b.md`. The media type comes
/// from the extension. Bodies are read when first needed.
///
/// A suffix counts as a language if it is a two-letter language code, or a
/// longer language tag with a script or region, such as `zh-Hant` or
/// `en_US`. `jquery.min.js` has no language.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: Arc<Path>,
}

#[derive(Debug, Default)]
struct FsMetadata(Option<fs::Metadata>);

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl Scanner {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Scanner { root: root.into().into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the root once, returning resources sorted by path.
    pub fn scan(&self) -> Result<Vec<Resource>> {
        use jwalk::WalkDirGeneric;

        if !self.root.is_dir() {
            return err! {
                "scan root is not a directory",
                "root" => self.root.display(),
            };
        }

        let walker = WalkDirGeneric::<FsMetadata>::new(&*self.root)
            .skip_hidden(true)
            .follow_links(true)
            .sort(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        let mut merger = Merger::default();
        for entry in walker {
            let entry = entry.map_err(|e| error!("failed to walk directory", e))
                .chain_with(|| error!("scan failed", "root" => self.root.display()))?;

            let Some(metadata) = entry.client_state.0.as_ref() else { continue };
            if !metadata.is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&*self.root).unwrap_or(&path);
            merger.push(self.resource(relative, &path, metadata)?)?;
        }

        let mut resources = merger.into_vec();
        resources.sort_by(|a, b| a.path().cmp(b.path()));
        tracing::debug!(root = %self.root.display(), resources = resources.len(), "scanned");
        Ok(resources)
    }

    /// A pipeline that rescans the root every time it is drained.
    pub fn pipeline(&self) -> Pipeline {
        let scanner = self.clone();
        Pipeline::new(move || {
            let scanner = scanner.clone();
            stream::once(async move { scanner.scan() })
                .map(|result| match result {
                    Ok(resources) => stream::iter(resources).map(Ok).left_stream(),
                    Err(e) => stream::iter([Err(e)]).right_stream(),
                })
                .flatten()
        })
    }

    fn resource(&self, relative: &Path, path: &Path, metadata: &fs::Metadata) -> Result<Resource> {
        let (url, language) = url_and_language(relative);
        let media_type = match url.extension().and_then(MediaType::from_extension) {
            Some(media_type) => media_type,
            None => MediaType::parse("application/octet-stream")?,
        };

        let last_modified = metadata.modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let etag = format!("\"{:x}-{:x}\"", metadata.len(), last_modified.timestamp_micros());
        let is_text = media_type.ty() == "text";
        let path = path.to_path_buf();
        let content = Content::builder(media_type)?
            .language(language)?
            .last_modified(last_modified)
            .etag(etag)
            .loader(move || async move {
                let bytes = tokio::fs::read(&path).await
                    .chain_with(|| error!("failed to read source file", "path" => path.display()))?;

                let body = Body::from(bytes);
                Ok(if is_text { body.into_text().unwrap_or_else(|body| body) } else { body })
            })
            .build();

        Resource::new(url.as_str(), [content])
    }
}

/// The resource path for a file at `relative` and the language its name
/// carries, if any.
fn url_and_language(relative: &Path) -> (UrlBuf, Option<LanguageTag>) {
    let mut url = UrlBuf::from(relative);
    let language = url.without_extension().extension().and_then(language_suffix);
    if let Some(language) = &language {
        let ext = url.extension().map(String::from);
        url.set_extension(None);
        url.set_extension(ext.as_deref());
        tracing::trace!(path = %url, %language, "language suffix");
    }

    (url, language)
}

fn language_suffix(suffix: &str) -> Option<LanguageTag> {
    let primary = suffix.split(['-', '_']).next()?;
    let has_subtags = primary.len() < suffix.len();
    if primary.len() != 2 && !has_subtags {
        return None;
    }

    LanguageTag::parse(suffix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn split(path: &str) -> (String, Option<String>) {
        let (url, language) = url_and_language(Path::new(path));
        (url.to_string(), language.map(|l| l.to_string()))
    }

    #[test]
    fn language_suffixes() {
        assert_eq!(split("a/b.ko.md"), ("/a/b.md".into(), Some("ko".into())));
        assert_eq!(split("b.zh-hant.md"), ("/b.md".into(), Some("zh-Hant".into())));
        assert_eq!(split("b.en_US.html"), ("/b.html".into(), Some("en-US".into())));
        assert_eq!(split("jquery.min.js"), ("/jquery.min.js".into(), None));
        assert_eq!(split("archive.tar.gz"), ("/archive.tar.gz".into(), None));
        assert_eq!(split("index.html"), ("/index.html".into(), None));
        assert_eq!(split("README"), ("/README".into(), None));
    }

    #[tokio::test]
    async fn scans_files_into_resources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/post.en.md"), "# Hello").unwrap();
        std::fs::write(dir.path().join("blog/post.ko.md"), "# 안녕").unwrap();
        std::fs::write(dir.path().join("style.scss"), "a { b: c }").unwrap();
        std::fs::write(dir.path().join("logo.bin"), [0u8, 1, 2]).unwrap();
        std::fs::write(dir.path().join(".hidden"), "secret").unwrap();

        let resources = Scanner::new(dir.path()).scan().unwrap();
        let paths: Vec<_> = resources.iter().map(|r| r.path().to_string()).collect();
        assert_eq!(paths, ["/blog/post.md", "/logo.bin", "/style.scss"]);

        let post = &resources[0];
        assert_eq!(post.len(), 2);
        let ko = post.sorted_contents()[1].clone();
        assert_eq!(ko.key().to_string(), "text/markdown; lang=ko");
        assert!(ko.etag().is_some());
        assert!(!ko.is_loaded());

        let body = ko.body().await.unwrap();
        assert!(body.is_text());
        assert_eq!(body.as_text(), Some("# 안녕"));

        let logo = resources[1].single().unwrap();
        assert_eq!(logo.media_type().as_str(), "application/octet-stream");
        assert_eq!(logo.body().await.unwrap().as_bytes(), [0, 1, 2]);
    }

    #[tokio::test]
    async fn pipelines_rescan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let pipeline = Scanner::new(dir.path()).pipeline();
        assert_eq!(pipeline.collect().await.unwrap().len(), 1);

        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        assert_eq!(pipeline.collect().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_roots_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(dir.path().join("nope"));
        assert!(scanner.scan().is_err());

        let error = scanner.pipeline().collect().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn read_errors_surface_on_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gone.txt"), "soon").unwrap();

        let resources = Scanner::new(dir.path()).scan().unwrap();
        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();

        let error = resources[0].single().unwrap().body().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Io);
    }
}
