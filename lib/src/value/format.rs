use serde::de::DeserializeOwned;

use crate::error::{ErrorDetail, Result};

/// A structured data format that deserializes from text.
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` into a `T` or returns an
    /// error if `string` is not a valid `T`.
    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    /// Like [`Format::from_str()`] but returns a crate [`Error`](crate::error::Error)
    /// with context naming the format.
    fn read<T: DeserializeOwned>(string: &str) -> Result<T> {
        Self::from_str(string).map_err(|e| {
            let name = std::any::type_name::<Self>().rsplit("::").next().unwrap_or("?");
            crate::error::Error::from(e).chain(error!("failed to parse data", "format" => name))
        })
    }
}

macro_rules! impl_format {
    ($(#[$attr:meta])* $name:ident : $func:expr, $E:ty) => (
        $(#[$attr])*
        #[derive(Debug, Default, Copy, Clone)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(/// TOML, via `toml`.
    Toml: toml::from_str, toml::de::Error);
impl_format!(/// JSON, via `serde_json`.
    Json: serde_json::from_str, serde_json::Error);
impl_format!(/// YAML, via `serde_yaml`.
    Yaml: serde_yaml::from_str, serde_yaml::Error);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::value::{Dict, Value};

    #[test]
    fn formats_agree_on_values() {
        let toml: Dict = Toml::read("title = \"Foo\"\ncount = 3\nratio = 0.5").unwrap();
        let json: Dict = Json::read(r#"{"title": "Foo", "count": 3, "ratio": 0.5}"#).unwrap();
        let yaml: Dict = Yaml::read("title: Foo\ncount: 3\nratio: 0.5\n").unwrap();

        assert_eq!(toml, json);
        assert_eq!(json, yaml);
        assert_eq!(toml["title"], Value::from("Foo"));
        assert_eq!(toml["count"].to_num(), Some(3u8.into()));
        assert_eq!(toml["ratio"].to_float(), Some(0.5));
    }

    #[test]
    fn nested_values() {
        let yaml: Dict = Yaml::read("tags: [a, b]\nauthor:\n  name: Kim\n").unwrap();
        let tags: Vec<Arc<str>> = yaml["tags"].clone().try_into().unwrap();
        assert_eq!(tags, vec![Arc::from("a"), Arc::from("b")]);

        let author = yaml["author"].as_dict().unwrap();
        assert_eq!(author["name"].as_str(), Some("Kim"));
    }

    #[test]
    fn errors_are_format_errors() {
        let error = Toml::read::<Dict>("title = ").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Format);
        assert!(error.to_string().contains("format: Toml"));
    }
}
