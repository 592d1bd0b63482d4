use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use rustc_hash::FxHashMap;

use crate::error::{Chainable, Error, Result};
use crate::url::Url;
use crate::Resource;
use super::ResourceStream;

/// Resources keyed by path, in the order each path was first seen.
#[derive(Default)]
pub(crate) struct Merger {
    resources: Vec<Resource>,
    index: FxHashMap<Arc<Url>, usize>,
}

impl Merger {
    pub fn push(&mut self, resource: Resource) -> Result<()> {
        match self.index.get(resource.path()) {
            Some(&i) => {
                let merged = self.resources[i].merge(&resource)
                    .chain_with(|| error!("failed to merge resources", "path" => resource.path()))?;

                tracing::debug!(path = %resource.path(), keys = merged.len(), "merged resources");
                self.resources[i] = merged;
            }
            None => {
                self.index.insert(resource.path_arc(), self.resources.len());
                self.resources.push(resource);
            }
        }

        Ok(())
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.resources
    }
}

/// Drains `stream`, merging resources at the same path in first-emission
/// order, then replays the merged resources. The first error ends the stream.
pub(crate) fn merge_paths(stream: ResourceStream) -> ResourceStream {
    let merged = async move {
        stream.try_fold(Merger::default(), |mut merger, resource| async move {
            merger.push(resource)?;
            Ok::<_, Error>(merger)
        }).await
    };

    stream::once(merged)
        .map(|result| match result {
            Ok(merger) => stream::iter(merger.into_vec()).map(Ok).left_stream(),
            Err(e) => stream::iter([Err(e)]).right_stream(),
        })
        .flatten()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::Content;

    fn resource(path: &str, lang: &str) -> Resource {
        let content = Content::builder("text/html").unwrap().language(lang).unwrap().build();
        Resource::new(path, [content]).unwrap()
    }

    #[tokio::test]
    async fn merges_in_first_emission_order() {
        let input = stream::iter([
            resource("/b", "en"),
            resource("/a", "en"),
            resource("/b", "ko"),
        ]).map(Ok).boxed();

        let output: Vec<Resource> = merge_paths(input).try_collect().await.unwrap();
        let paths: Vec<_> = output.iter().map(|r| (r.path().as_str(), r.len())).collect();
        assert_eq!(paths, [("/b", 2), ("/a", 1)]);
    }

    #[tokio::test]
    async fn collisions_are_errors() {
        let input = stream::iter([resource("/", "en"), resource("/", "en")]).map(Ok).boxed();
        let error = merge_paths(input).try_collect::<Vec<_>>().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ContentKey);
        assert!(error.to_string().contains("path: /"));
    }
}
