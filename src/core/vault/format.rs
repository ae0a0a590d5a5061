//! Blob formats.
//!
//! A format picks both the file family inside a vault and the shape of the
//! decrypted result.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::core::constants::{ENV_PUBLIC_KEY, STRUCTURED_PUBLIC_KEY};
use crate::core::env::Env;
use crate::error::{Error, Result, VaultError};

/// Vault blob format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Dotenv `KEY=value` lines.
    #[default]
    Env,
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl Format {
    /// File name of the default blob for this format.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Env => ".env",
            Self::Json => ".ejson",
            Self::Toml => ".etoml",
        }
    }

    /// Entry holding the recipient public key.
    pub fn public_key_field(self) -> &'static str {
        match self {
            Self::Env => ENV_PUBLIC_KEY,
            Self::Json | Self::Toml => STRUCTURED_PUBLIC_KEY,
        }
    }

    /// Parse blob contents read from `path`.
    pub(crate) fn parse(self, path: &Path, contents: &str) -> Result<Secrets> {
        let parse_err = |reason: String| VaultError::Parse {
            path: path.to_path_buf(),
            reason,
        };

        match self {
            Self::Env => Ok(Secrets::Flat(
                Env::parse(contents).entries().iter().cloned().collect(),
            )),
            Self::Json => {
                let value: Value =
                    serde_json::from_str(contents).map_err(|e| parse_err(e.to_string()))?;
                nested(value).ok_or_else(|| parse_err("top level must be an object".into()).into())
            }
            Self::Toml => {
                let value: Value = toml::from_str(contents).map_err(|e| parse_err(e.to_string()))?;
                nested(value).ok_or_else(|| parse_err("top level must be a table".into()).into())
            }
        }
    }
}

fn nested(value: Value) -> Option<Secrets> {
    value.is_object().then_some(Secrets::Nested(value))
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Env => "env",
            Self::Json => "json",
            Self::Toml => "toml",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "env" | "dotenv" => Ok(Self::Env),
            "json" | "ejson" => Ok(Self::Json),
            "toml" | "etoml" => Ok(Self::Toml),
            _ => Err(VaultError::UnknownFormat(s.to_string()).into()),
        }
    }
}

/// Secrets read from a vault blob.
#[derive(Debug, Clone, PartialEq)]
pub enum Secrets {
    /// Flat name to value mapping (env format).
    Flat(BTreeMap<String, String>),
    /// Nested document (json and toml formats). Always an object at the top.
    Nested(Value),
}

impl Secrets {
    /// Look up a top-level string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Self::Flat(map) => map.get(key).map(String::as_str),
            Self::Nested(value) => value.get(key).and_then(Value::as_str),
        }
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(map) => map.len(),
            Self::Nested(value) => value.as_object().map_or(0, |m| m.len()),
        }
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render in the text form of `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested document cannot be expressed in `format`
    /// (for example a `null` value in TOML).
    pub fn render(&self, format: Format) -> Result<String> {
        match (self, format) {
            (Self::Flat(map), _) => {
                Ok(Env::from_pairs(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()).to_string())
            }
            (Self::Nested(value), Format::Toml) => Ok(toml::to_string_pretty(value)?),
            (Self::Nested(value), _) => {
                let mut out = serde_json::to_string_pretty(value)?;
                out.push('\n');
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_names() {
        assert_eq!(Format::Env.file_name(), ".env");
        assert_eq!(Format::Json.file_name(), ".ejson");
        assert_eq!(Format::Toml.file_name(), ".etoml");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("etoml".parse::<Format>().unwrap(), Format::Toml);
        assert!("yaml".parse::<Format>().is_err());
    }

    #[test]
    fn test_parse_env_is_flat() {
        let secrets = Format::Env
            .parse(Path::new(".env"), "A=1\n# note\nB=two\n")
            .unwrap();
        assert_eq!(secrets.get("B"), Some("two"));
        assert!(matches!(secrets, Secrets::Flat(ref m) if m.len() == 2));
    }

    #[test]
    fn test_parse_toml_is_nested() {
        let secrets = Format::Toml
            .parse(Path::new(".etoml"), "name = \"x\"\n[db]\nport = 5432\n")
            .unwrap();
        assert_eq!(
            secrets,
            Secrets::Nested(json!({"name": "x", "db": {"port": 5432}}))
        );
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        let err = Format::Json.parse(Path::new(".ejson"), "[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::Parse { .. })));
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = Format::Json.parse(Path::new("vault/.ejson"), "{").unwrap_err();
        assert!(err.to_string().contains("vault/.ejson"));
    }

    #[test]
    fn test_render_shapes() {
        let flat = Secrets::Flat(BTreeMap::from([("K".to_string(), "v".to_string())]));
        assert_eq!(flat.render(Format::Env).unwrap(), "K=v\n");

        let doc = Secrets::Nested(json!({"a": "b"}));
        assert_eq!(doc.render(Format::Toml).unwrap(), "a = \"b\"\n");
        assert_eq!(doc.render(Format::Json).unwrap(), "{\n  \"a\": \"b\"\n}\n");
    }
}
