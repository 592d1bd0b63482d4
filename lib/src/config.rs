use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Result};
use crate::multiview::{MultiView, ScriptNegotiator, TypeMapNegotiator};
use crate::value::{Dict, Format, Toml};
use crate::LanguageTag;

/// The default settings file name.
pub const SETTINGS_FILE: &str = "prism.toml";

/// How a split resource is negotiated at its original path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NegotiatorKind {
    /// In the browser: see [`ScriptNegotiator`].
    #[default]
    Script,
    /// On the server: see [`TypeMapNegotiator`].
    TypeMap,
}

/// Build settings, usually read from a TOML file. Every field is optional.
///
/// ```rust
/// use prism::config::{Settings, NegotiatorKind};
///
/// let settings = Settings::parse(r#"
///     output = "dist"
///     negotiator = "type-map"
///
///     [site]
///     title = "Hello"
/// "#).unwrap();
///
/// assert_eq!(settings.output.to_str(), Some("dist"));
/// assert_eq!(settings.negotiator, NegotiatorKind::TypeMap);
/// assert_eq!(settings.cookie, "lang");
/// assert_eq!(settings.site["title"].as_str(), Some("Hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Source directory.
    pub source: PathBuf,
    /// Output directory.
    pub output: PathBuf,
    pub negotiator: NegotiatorKind,
    /// The cookie a visitor's explicit language choice is saved in.
    pub cookie: String,
    /// The language the script negotiator falls back to.
    pub default_language: Option<String>,
    /// Rewrite files even if they are up to date.
    pub force: bool,
    /// Compress generated CSS.
    pub compress_css: bool,
    /// Merged into every content's metadata under `site`.
    pub site: Dict,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source: "content".into(),
            output: "public".into(),
            negotiator: NegotiatorKind::default(),
            cookie: "lang".into(),
            default_language: None,
            force: false,
            compress_css: false,
            site: Dict::new(),
        }
    }
}

impl Settings {
    pub fn parse(toml: &str) -> Result<Settings> {
        Toml::read(toml).chain_with(|| error!("invalid settings"))
    }

    /// Reads settings from `path`. Relative `source` and `output`
    /// directories are resolved against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let toml = std::fs::read_to_string(path)
            .chain_with(|| error!("failed to read settings", "path" => path.display()))?;

        let mut settings = Settings::parse(&toml)
            .chain_with(|| error!("failed to load settings", "path" => path.display()))?;

        if let Some(dir) = path.parent() {
            settings.source = dir.join(&settings.source);
            settings.output = dir.join(&settings.output);
        }

        Ok(settings)
    }

    pub fn default_language(&self) -> Result<Option<LanguageTag>> {
        let tag = self.default_language.as_deref()
            .map(LanguageTag::parse)
            .transpose()
            .chain_with(|| error!("invalid setting", "key" => "default_language"))?;

        Ok(tag)
    }

    /// The multi-view divider these settings describe.
    pub fn multiview(&self) -> Result<MultiView> {
        let multiview = match self.negotiator {
            NegotiatorKind::Script => MultiView::new().negotiator(ScriptNegotiator::new()
                .cookie(self.cookie.clone())
                .default_language(self.default_language()?)),
            NegotiatorKind::TypeMap => MultiView::new().negotiator(TypeMapNegotiator::new()),
        };

        Ok(multiview)
    }
}
