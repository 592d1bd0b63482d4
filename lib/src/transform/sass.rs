use std::path::PathBuf;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::Result;
use crate::pipeline::ContentTransformer;
use crate::{Body, Content, ContentFilter, MediaType, Replace};

/// Compiles SCSS and indented Sass to CSS with `grass`.
#[derive(Debug, Clone, Default)]
pub struct Sass {
    load_paths: Vec<PathBuf>,
    compressed: bool,
}

impl Sass {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory to resolve `@use` and `@import` against.
    pub fn load_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.load_paths.push(path.into());
        self
    }

    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// `text/x-scss` and `text/x-sass`.
    pub fn filter() -> ContentFilter {
        ["text/x-scss", "text/x-sass"].into_iter()
            .filter_map(|ty| MediaType::parse(ty).ok())
            .fold(ContentFilter::new(), |filter, ty| filter.media_type(ty))
    }

    /// Compiles `source` to CSS. `indented` selects the indented syntax.
    pub fn compile(&self, source: &str, indented: bool) -> Result<String> {
        let syntax = match indented {
            true => grass::InputSyntax::Sass,
            false => grass::InputSyntax::Scss,
        };

        let style = match self.compressed {
            true => grass::OutputStyle::Compressed,
            false => grass::OutputStyle::Expanded,
        };

        let options = self.load_paths.iter()
            .fold(grass::Options::default(), |options, path| options.load_path(path))
            .input_syntax(syntax)
            .style(style);

        grass::from_string(source, &options)
            .map_err(|e| error!("failed to render sass as css", e))
    }
}

impl ContentTransformer for Sass {
    fn transform(&self, content: Content) -> BoxFuture<'static, Result<Content>> {
        let sass = self.clone();
        let indented = content.media_type().subtypes().any(|s| s.eq_ignore_ascii_case("x-sass"));
        let result = Replace::new()
            .media_type("text/css")
            .map(|replace| replace.body_with(move |body: Body| async move {
                match body.as_text() {
                    Some(text) => sass.compile(text, indented),
                    None => err!("sass body is not valid UTF-8"),
                }
            }))
            .map(|replace| content.replace(replace))
            .map_err(Into::into);

        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compiles_scss() {
        let content = Content::new("text/x-scss", "$c: red;\na { b { color: $c; } }").unwrap();
        let css = Sass::new().transform(content).await.unwrap();
        assert_eq!(css.media_type().as_str(), "text/css");

        let body = css.body().await.unwrap();
        assert_eq!(body.as_text(), Some("a b {\n  color: red;\n}\n"));
    }

    #[tokio::test]
    async fn compiles_indented_sass() {
        let content = Content::new("text/x-sass", "a\n  color: blue\n").unwrap();
        let css = Sass::new().compressed(true).transform(content).await.unwrap();
        assert_eq!(css.body().await.unwrap().as_text(), Some("a{color:blue}"));
    }

    #[tokio::test]
    async fn syntax_errors_surface_on_read() {
        let content = Content::new("text/x-scss", "a { color: ").unwrap();
        let css = Sass::new().transform(content).await.unwrap();
        assert!(css.body().await.is_err());
    }
}
