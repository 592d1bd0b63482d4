use std::fmt::Write;

use crate::error::Result;
use crate::url::Url;
use crate::Content;
use super::{View, Negotiator};

/// Negotiates on the server: writes an Apache type map
/// (`application/x-type-map`) listing every view, for `mod_negotiation`.
///
/// ```text
/// URI: index.html
///
/// URI: index.en.html
/// Content-Type: text/html
/// Content-Language: en
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeMapNegotiator {
    _priv: (),
}

impl TypeMapNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The type map body for `views` of `original`. URIs are relative to the
    /// original's directory, which has no entry of its own.
    pub fn render(original: &Url, views: &[View]) -> String {
        let mut map = String::new();
        if !original.is_directory() {
            let _ = writeln!(map, "URI: {}\n", original.file_name());
        }

        for view in views {
            let _ = writeln!(map, "URI: {}", view.path.file_name());
            let _ = writeln!(map, "Content-Type: {}", view.content.media_type());
            if let Some(language) = view.content.language() {
                let _ = writeln!(map, "Content-Language: {}", language);
            }

            map.push('\n');
        }

        map
    }
}

impl Negotiator for TypeMapNegotiator {
    fn negotiate(&self, original: &Url, views: &[View]) -> Result<Content> {
        let mut builder = Content::builder("application/x-type-map")?
            .body(Self::render(original, views));

        if let Some(last_modified) = super::latest(views) {
            builder = builder.last_modified(last_modified);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Resource, Content};
    use crate::multiview::MultiView;

    #[tokio::test]
    async fn lists_every_view() {
        let en = Content::builder("text/html").unwrap().language("en").unwrap().body("").build();
        let pdf = Content::builder("application/pdf").unwrap().body(vec![0u8]).build();
        let resource = Resource::new("/guide/", [en, pdf]).unwrap();

        let split = MultiView::new().split(&resource).unwrap();
        let map = split[2].single().unwrap().body().await.unwrap();
        assert_eq!(map.as_text().unwrap(), "URI: index.pdf.pdf\nContent-Type: application/pdf\n\n\
            URI: index.en.html\nContent-Type: text/html\nContent-Language: en\n\n");
    }
}
