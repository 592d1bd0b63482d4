use std::sync::Arc;

use pulldown_cmark_escape::{escape_href, escape_html};
use serde::Serialize;

use crate::error::Result;
use crate::language_tag::{LanguageNames, NoNames};
use crate::url::Url;
use crate::{Content, LanguageTag};
use super::{View, Negotiator};

/// Negotiates in the browser: an HTML page that redirects to the best view.
///
/// The page first honors a language saved in a cookie, then scores the
/// views against `navigator.languages` exactly as [`negotiate()`] does,
/// then falls back to the default language, then to the first view. Without
/// scripts it lists links to every view.
///
/// [`negotiate()`]: super::negotiate()
#[derive(Clone)]
pub struct ScriptNegotiator {
    cookie: String,
    default_language: Option<LanguageTag>,
    names: Arc<dyn LanguageNames>,
}

#[derive(Serialize)]
struct ScriptView<'a> {
    path: &'a str,
    language: Option<&'a str>,
}

const SCRIPT: &str = r#"(function (views, cookieName, fallback) {
  function parse(tag) {
    var parts = tag.toLowerCase().replace(/_/g, "-").split("-");
    var t = { language: parts[0], script: null, region: null };
    for (var i = 1; i < parts.length; i++) {
      var p = parts[i];
      if (p.length === 4 && t.script === null && t.region === null) {
        t.script = p;
      } else if (/^([a-z]{2,3}|[0-9]{3})$/.test(p) && t.region === null) {
        t.region = p;
      }
    }
    return t;
  }

  function score(requested, candidate) {
    if (requested.language !== candidate.language) return 0;
    var s = 16;
    if (candidate.script === null) s += 4;
    else if (requested.script === candidate.script) s += 8;
    if (candidate.region === null) s += 1;
    else if (requested.region === candidate.region) s += 2;
    return s;
  }

  function cookie(name) {
    var pairs = document.cookie ? document.cookie.split(/;\s*/) : [];
    for (var i = 0; i < pairs.length; i++) {
      var eq = pairs[i].indexOf("=");
      if (eq > 0 && pairs[i].slice(0, eq) === name) {
        return decodeURIComponent(pairs[i].slice(eq + 1)).toLowerCase();
      }
    }
    return null;
  }

  function pick() {
    var saved = cookie(cookieName);
    if (saved !== null) {
      for (var i = 0; i < views.length; i++) {
        var lang = views[i].language;
        if (lang !== null && lang.toLowerCase() === saved) return views[i];
      }
    }

    var preferences = navigator.languages && navigator.languages.length
      ? navigator.languages
      : [navigator.language || navigator.userLanguage || ""];

    for (var p = 0; p < preferences.length; p++) {
      var requested = parse(preferences[p]);
      var best = null, bestScore = 0;
      for (var v = 0; v < views.length; v++) {
        if (views[v].language === null) continue;
        var s = score(requested, parse(views[v].language));
        if (s > bestScore) { best = views[v]; bestScore = s; }
      }
      if (best !== null) return best;
    }

    for (var d = 0; d < views.length; d++) {
      if (fallback !== null && views[d].language === fallback) return views[d];
    }

    return views[0];
  }

  var view = pick();
  if (view) location.replace(view.path + location.search + location.hash);
})"#;

impl ScriptNegotiator {
    pub fn new() -> Self {
        ScriptNegotiator {
            cookie: "lang".into(),
            default_language: None,
            names: Arc::new(NoNames),
        }
    }

    /// The cookie holding a visitor's explicit choice. Defaults to `lang`.
    pub fn cookie<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie = name.into();
        self
    }

    pub fn default_language(mut self, language: Option<LanguageTag>) -> Self {
        self.default_language = language;
        self
    }

    /// Where link labels come from. A view with no known name is labeled
    /// with its language tag, or its media type if it has no language.
    pub fn names(mut self, names: Arc<dyn LanguageNames>) -> Self {
        self.names = names;
        self
    }

    fn label(&self, view: &View) -> String {
        match view.content.language() {
            Some(language) => self.names.display_name(language, None)
                .unwrap_or_else(|| language.to_string()),
            None => view.content.media_type().essence().to_string(),
        }
    }

    /// The negotiation page for `views`.
    pub fn render(&self, views: &[View]) -> Result<String> {
        let script_views: Vec<_> = views.iter()
            .map(|view| ScriptView {
                path: view.path.as_str(),
                language: view.content.language().map(|l| l.as_str()),
            })
            .collect();

        let script = format!("{SCRIPT}({}, {}, {});",
            json(&script_views)?,
            json(&self.cookie)?,
            json(&self.default_language.as_ref().map(|l| l.as_str()))?);

        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<meta name=\"robots\" content=\"noindex\">\n<script>\n");
        html.push_str(&script);
        html.push_str("\n</script>\n</head>\n<body>\n<noscript>\n<ul>\n");
        for view in views {
            html.push_str("<li><a href=\"");
            escape_href(&mut html, view.path.as_str()).map_err(|_| escape_error())?;
            html.push('"');
            if let Some(language) = view.content.language() {
                html.push_str(" hreflang=\"");
                escape_html(&mut html, language.as_str()).map_err(|_| escape_error())?;
                html.push('"');
            }

            html.push('>');
            escape_html(&mut html, &self.label(view)).map_err(|_| escape_error())?;
            html.push_str("</a></li>\n");
        }

        html.push_str("</ul>\n</noscript>\n</body>\n</html>\n");
        Ok(html)
    }
}

fn escape_error() -> crate::Error {
    crate::error!("failed to write negotiation page")
}

/// JSON safe to embed in a `<script>` element.
fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

impl Default for ScriptNegotiator {
    fn default() -> Self {
        ScriptNegotiator::new()
    }
}

impl Negotiator for ScriptNegotiator {
    fn negotiate(&self, _: &Url, views: &[View]) -> Result<Content> {
        let mut builder = Content::builder("text/html; charset=utf-8")?
            .body(self.render(views)?);

        if let Some(last_modified) = super::latest(views) {
            builder = builder.last_modified(last_modified);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language_tag::StaticNames;
    use crate::multiview::MultiView;
    use crate::Resource;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    fn resource() -> Resource {
        let en = Content::builder("text/html").unwrap().language("en").unwrap().body("").build();
        let ko = Content::builder("text/html").unwrap().language("ko").unwrap().body("").build();
        Resource::new("/index.html", [en, ko]).unwrap()
    }

    #[tokio::test]
    async fn embeds_views_and_settings() {
        let negotiator = ScriptNegotiator::new()
            .cookie("site-lang")
            .default_language(Some(tag("ko")));

        let split = MultiView::new().negotiator(negotiator).split(&resource()).unwrap();
        let page = split[2].single().unwrap();
        assert_eq!(page.media_type().as_str(), "text/html; charset=utf-8");
        assert_eq!(split[2].path(), "/index.html");

        let html = page.body().await.unwrap().into_string().unwrap();
        assert!(html.contains(r#"[{"path":"/index.en.html","language":"en"},{"path":"/index.ko.html","language":"ko"}]"#));
        assert!(html.contains(r#"], "site-lang", "ko");"#));
        assert!(html.contains("location.replace"));
        assert!(html.contains(r#"<li><a href="/index.ko.html" hreflang="ko">ko</a></li>"#));
    }

    #[test]
    fn labels_are_named_and_escaped() {
        let mut names = StaticNames::new();
        names.insert(tag("ko"), "한국어").insert(tag("en"), "<English>");

        let negotiator = ScriptNegotiator::new().names(Arc::new(names));
        let views: Vec<View> = MultiView::new()
            .negotiator(|_: &Url, views: &[View]| {
                Ok(Content::new("text/plain", views.len().to_string())?)
            })
            .split(&resource())
            .unwrap()
            .into_iter()
            .take(2)
            .map(|r| {
                let content = r.single().unwrap().clone();
                View { path: r.path().to_url_buf(), key: content.key(), content }
            })
            .collect();

        let html = negotiator.render(&views).unwrap();
        assert!(html.contains(">&lt;English&gt;</a>"));
        assert!(html.contains(">한국어</a>"));
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        assert_eq!(json("</script>").unwrap(), r#""<\/script>""#);
    }
}
