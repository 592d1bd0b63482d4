use super::MediaType;

/// File extensions and the media types they denote. When several extensions
/// map to one media type, the first listed is the preferred extension.
pub const EXTENSIONS: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("scss", "text/x-scss"),
    ("sass", "text/x-sass"),
    ("md", "text/markdown"),
    ("markdown", "text/markdown"),
    ("mdown", "text/markdown"),
    ("txt", "text/plain"),
    ("js", "text/javascript"),
    ("mjs", "text/javascript"),
    ("json", "application/json"),
    ("toml", "application/toml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("xml", "application/xml"),
    ("xhtml", "application/xhtml+xml"),
    ("pdf", "application/pdf"),
    ("var", "application/x-type-map"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff2", "font/woff2"),
];

impl MediaType {
    /// The media type for the file extension `ext`, case-insensitively.
    ///
    /// ```rust
    /// use prism::MediaType;
    ///
    /// let md = MediaType::from_extension("MD").unwrap();
    /// assert_eq!(md.as_str(), "text/markdown");
    /// assert!(MediaType::from_extension("unknown").is_none());
    /// ```
    pub fn from_extension(ext: &str) -> Option<MediaType> {
        EXTENSIONS.iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .and_then(|(_, ty)| MediaType::parse(ty).ok())
    }

    /// The preferred file extension for this media type, ignoring parameters.
    ///
    /// ```rust
    /// use prism::MediaType;
    ///
    /// let html = MediaType::parse("text/html; charset=utf-8").unwrap();
    /// assert_eq!(html.extension(), Some("html"));
    /// ```
    pub fn extension(&self) -> Option<&'static str> {
        let essence = self.essence();
        EXTENSIONS.iter()
            .find(|(_, ty)| *ty == essence.as_str())
            .map(|(e, _)| *e)
    }
}
