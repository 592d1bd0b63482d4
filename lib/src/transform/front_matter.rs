use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{Chainable, Result};
use crate::pipeline::ContentTransformer;
use crate::value::{Dict, Format, Toml, Yaml};
use crate::{Body, Content, ContentFilter, Loaded, MediaType, Replace};

/// Moves a leading front matter block out of the body and into metadata.
///
/// The block is YAML between `---` lines or TOML between `+++` lines. Its
/// keys are merged over the content's existing metadata. Bodies without a
/// block, and binary bodies, are left as they are.
///
/// ```rust
/// use prism::transform::FrontMatter;
///
/// let (metadata, rest) = FrontMatter::split("+++\ntitle = \"Hi\"\n+++\n# Hi").unwrap().unwrap();
/// assert_eq!(metadata["title"].as_str(), Some("Hi"));
/// assert_eq!(rest, "# Hi");
///
/// assert!(FrontMatter::split("# No front matter").unwrap().is_none());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FrontMatter {
    _priv: (),
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markdown, HTML, and plain text.
    pub fn filter() -> ContentFilter {
        ["text/markdown", "text/html", "text/plain"].into_iter()
            .filter_map(|ty| MediaType::parse(ty).ok())
            .fold(ContentFilter::new(), |filter, ty| filter.media_type(ty))
    }

    /// Splits `text` into its front matter and the rest, or returns `None`
    /// if `text` doesn't start with a front matter block.
    pub fn split(text: &str) -> Result<Option<(Dict, &str)>> {
        if let Some((block, rest)) = fenced(text, "---") {
            return Ok(Some((parse::<Yaml>(block)?, rest)));
        }

        if let Some((block, rest)) = fenced(text, "+++") {
            return Ok(Some((parse::<Toml>(block)?, rest)));
        }

        Ok(None)
    }
}

fn parse<F: Format>(block: &str) -> Result<Dict> {
    if block.trim().is_empty() {
        return Ok(Dict::new());
    }

    F::read(block).chain_with(|| error!("invalid front matter"))
}

/// The text between a leading `fence` line and the next `fence` line, and
/// the text after it.
fn fenced<'a>(text: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(fence)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == fence {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }

        offset += line.len();
    }

    None
}

impl ContentTransformer for FrontMatter {
    fn transform(&self, content: Content) -> BoxFuture<'static, Result<Content>> {
        let replace = Replace::new().load_with(|body: Body, _: Dict| async move {
            let Some(text) = body.as_text() else {
                return Ok(Loaded::new(body));
            };

            let split = FrontMatter::split(text)?.map(|(metadata, rest)| (metadata, Body::from(rest)));
            Ok(match split {
                Some((metadata, rest)) => Loaded::new(rest).with_metadata(metadata),
                None => Loaded::new(body),
            })
        });

        future::ok(content.replace(replace)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;
    use crate::error::ErrorKind;
    use crate::value::Value;

    async fn run(content: Content) -> Result<(Body, Dict)> {
        FrontMatter::new().transform(content).await?.load().await
    }

    #[tokio::test]
    async fn yaml_front_matter() {
        let content = Content::builder("text/markdown").unwrap()
            .metadata(dict!["title" => "Old", "draft" => true])
            .body("---\ntitle: New\ntags: [a, b]\n---\n# Body\n")
            .build();

        let (body, metadata) = run(content).await.unwrap();
        assert_eq!(body.as_text(), Some("# Body\n"));
        assert_eq!(metadata["title"], Value::from("New"));
        assert_eq!(metadata["draft"], Value::from(true));
        assert_eq!(metadata["tags"].as_slice().map(|s| s.len()), Some(2));
    }

    #[tokio::test]
    async fn toml_front_matter() {
        let content = Content::new("text/markdown", "+++\r\nweight = 3\r\n+++\r\nBody").unwrap();
        let (body, metadata) = run(content).await.unwrap();
        assert_eq!(body.as_text(), Some("Body"));
        assert_eq!(metadata["weight"], Value::from(3));
    }

    #[tokio::test]
    async fn untouched_without_a_block() {
        for text in ["# Title\n---\n", "---\nunterminated: true\n", "---- rule\n"] {
            let (body, metadata) = run(Content::new("text/markdown", text).unwrap()).await.unwrap();
            assert_eq!(body.as_text(), Some(text));
            assert!(metadata.is_empty());
        }

        let bytes = Content::new("text/markdown", vec![0xff, 0xfe]).unwrap();
        let (body, _) = run(bytes).await.unwrap();
        assert_eq!(body.as_bytes(), [0xff, 0xfe]);
    }

    #[test]
    fn empty_and_invalid_blocks() {
        let (metadata, rest) = FrontMatter::split("---\n---\nrest").unwrap().unwrap();
        assert!(metadata.is_empty());
        assert_eq!(rest, "rest");

        let error = FrontMatter::split("+++\ntitle = \n+++\n").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[tokio::test]
    async fn errors_surface_on_load() {
        let content = Content::new("text/markdown", "---\n: : :\n---\n").unwrap();
        let transformed = FrontMatter::new().transform(content).await.unwrap();
        assert!(transformed.body().await.is_err());
    }
}
