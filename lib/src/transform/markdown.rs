use futures::future::{self, BoxFuture, FutureExt};
use pulldown_cmark::{html, Options, Parser};

use crate::error::Result;
use crate::pipeline::ContentTransformer;
use crate::{Body, Content, ContentFilter, MediaType, Replace};

/// Renders Markdown to HTML with `pulldown-cmark`.
///
/// The result is `text/html` in the same language. The body is rendered
/// lazily, when first read.
#[derive(Debug, Clone)]
pub struct Markdown {
    options: Options,
}

impl Markdown {
    /// Every extension except smart punctuation.
    pub fn new() -> Self {
        Markdown { options: Options::all().difference(Options::ENABLE_SMART_PUNCTUATION) }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// `text/markdown`.
    pub fn filter() -> ContentFilter {
        MediaType::parse("text/markdown").into_iter()
            .fold(ContentFilter::new(), |filter, ty| filter.media_type(ty))
    }

    /// Renders `markdown` to an HTML string.
    ///
    /// ```rust
    /// use prism::transform::Markdown;
    ///
    /// let html = Markdown::new().render("# Hi\n\n*there*");
    /// assert_eq!(html, "<h1>Hi</h1>\n<p><em>there</em></p>\n");
    /// ```
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Markdown::new()
    }
}

impl ContentTransformer for Markdown {
    fn transform(&self, content: Content) -> BoxFuture<'static, Result<Content>> {
        let markdown = self.clone();
        let result = Replace::new()
            .media_type("text/html")
            .map(|replace| replace.body_with(move |body: Body| async move {
                match body.as_text() {
                    Some(text) => Ok(markdown.render(text)),
                    None => err!("markdown body is not valid UTF-8"),
                }
            }))
            .map(|replace| content.replace(replace))
            .map_err(Into::into);

        future::ready(result).boxed()
    }
}
