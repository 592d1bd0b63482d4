use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Chainable, ResourceError, Result};
use crate::pipeline::Pipeline;
use crate::url::Url;
use crate::Resource;

/// Writes single-representation resources under an output directory.
///
/// A resource at `/a/b.html` is written to `{root}/a/b.html`, and one at a
/// directory path such as `/a/` to `{root}/a/index.html`. A file already at
/// least as new as the resource is left alone unless forced.
#[derive(Debug, Clone)]
pub struct Writer {
    root: Arc<Path>,
    force: bool,
}

impl Writer {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Writer { root: root.into().into(), force: false }
    }

    /// Write even when the existing file is up to date.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file `path` is written to.
    ///
    /// ```rust
    /// use std::path::Path;
    /// use prism::url::Url;
    /// use prism::write::Writer;
    ///
    /// let writer = Writer::new("public");
    /// let target = |s| writer.target(Url::try_new(s).unwrap()).unwrap();
    /// assert_eq!(target("/"), Path::new("public/index.html"));
    /// assert_eq!(target("/a/b.css"), Path::new("public/a/b.css"));
    /// assert_eq!(target("/a%20b/"), Path::new("public/a b/index.html"));
    /// assert!(writer.target(Url::try_new("/../etc/passwd").unwrap()).is_err());
    /// ```
    pub fn target(&self, path: &Url) -> Result<PathBuf> {
        let mut target = self.root.to_path_buf();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode(segment);
            if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
                return Err(ResourceError::new(path.as_str(), "path escapes the output root").into());
            }

            target.push(segment);
        }

        if path.is_directory() {
            target.push("index.html");
        }

        Ok(target)
    }

    /// Writes `resource`. Returns `false` if the file was up to date.
    pub async fn write(&self, resource: &Resource) -> Result<bool> {
        let Some(content) = resource.single() else {
            let reason = format!("{} representations; split it first", resource.len());
            return Err(ResourceError::new(resource.path().as_str(), reason).into());
        };

        let target = self.target(resource.path())?;
        if !self.force {
            if let Ok(modified) = tokio::fs::metadata(&target).await.and_then(|m| m.modified()) {
                if DateTime::<Utc>::from(modified) >= content.last_modified() {
                    tracing::debug!(path = %resource.path(), target = %target.display(), "up to date; skipped");
                    return Ok(false);
                }
            }
        }

        let body = content.body().await
            .chain_with(|| error!("failed to render resource", "path" => resource.path()))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await
                .chain_with(|| error!("failed to create directory", "path" => parent.display()))?;
        }

        tokio::fs::write(&target, body.as_bytes()).await
            .chain_with(|| error!("failed to write file", "path" => target.display()))?;

        tracing::debug!(path = %resource.path(), target = %target.display(), bytes = body.len(), "wrote");
        Ok(true)
    }

    /// Writes every resource of `pipeline`, concurrently. Returns how many
    /// files were written.
    pub async fn write_all(&self, pipeline: &Pipeline) -> Result<usize> {
        let written = Arc::new(AtomicUsize::new(0));
        pipeline.for_each(|resource| {
            let (writer, written) = (self.clone(), written.clone());
            async move {
                if writer.write(&resource).await? {
                    written.fetch_add(1, Ordering::Relaxed);
                }

                Ok(())
            }
        }).await?;

        Ok(written.load(Ordering::Relaxed))
    }
}

fn percent_decode(segment: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }

        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;
    use crate::{Content, Replace};

    fn at(path: &str, body: &str, secs: i64) -> Resource {
        let content = Content::builder("text/html").unwrap()
            .last_modified(DateTime::<Utc>::from_timestamp(secs, 0).unwrap())
            .body(body)
            .build();

        Resource::new(path, [content]).unwrap()
    }

    #[test]
    fn decoding() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("%ED%95%9C"), "한");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz%4"), "%zz%4");
        assert_eq!(percent_decode("%2e%2E"), "..");
    }

    #[tokio::test]
    async fn writes_and_skips_up_to_date_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer::new(dir.path());

        assert!(writer.write(&at("/docs/", "old", 0)).await.unwrap());
        let target = dir.path().join("docs/index.html");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old");

        // The file on disk is newer than the resource.
        assert!(!writer.write(&at("/docs/", "new", 1)).await.unwrap());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old");

        assert!(writer.clone().force(true).write(&at("/docs/", "new", 1)).await.unwrap());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");

        let future = DateTime::<Utc>::from(std::time::SystemTime::now() + Duration::from_secs(3600));
        let resource = at("/docs/", "newer", 0);
        let content = resource.single().unwrap().replace(Replace::new().last_modified(future));
        let resource = Resource::new("/docs/", [content]).unwrap();
        assert!(writer.write(&resource).await.unwrap());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "newer");
    }

    #[tokio::test]
    async fn multiple_representations_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let en = Content::builder("text/html").unwrap().language("en").unwrap().build();
        let ko = Content::builder("text/html").unwrap().language("ko").unwrap().build();
        let resource = Resource::new("/a.html", [en, ko]).unwrap();

        let error = Writer::new(dir.path()).write(&resource).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Resource);
        assert!(!dir.path().join("a.html").exists());
    }

    #[tokio::test]
    async fn writes_whole_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::from_resources([
            at("/a.html", "a", 0),
            at("/b/c.html", "c", 0),
        ]);

        let writer = Writer::new(dir.path());
        assert_eq!(writer.write_all(&pipeline).await.unwrap(), 2);
        assert_eq!(writer.write_all(&pipeline).await.unwrap(), 0);
        assert_eq!(std::fs::read_to_string(dir.path().join("b/c.html")).unwrap(), "c");
    }
}
