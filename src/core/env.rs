//! Dotenv documents.
//!
//! Parses and renders `KEY=value` files. Used for env-format vault entries
//! and for the keyring file.

use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// An ordered list of `KEY=value` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    entries: Vec<(String, String)>,
}

impl Env {
    /// Parse dotenv text.
    ///
    /// Skips empty lines and comments (lines starting with #). Supports an
    /// optional `export ` prefix and single- or double-quoted values.
    pub fn parse(contents: &str) -> Self {
        let mut entries = Vec::new();

        for line in contents.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = parse_env_value(value.trim());
                entries.push((key, value));
            }
        }

        Self { entries }
    }

    /// Parse a dotenv file from disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Create from raw key-value pairs.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { entries: pairs }
    }

    /// Write to `path`, readable only by the owner on Unix.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_private(path.as_ref(), &self.to_string())
    }

    /// Get a value by key (first occurrence).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, replacing an existing entry in place or appending.
    pub fn set(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// All entries as key-value pairs.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for Env {
    /// Quotes values that contain whitespace or dotenv-special characters.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}={}", key, render_value(value))?;
        }
        Ok(())
    }
}

/// Replace assignment values in dotenv text, keeping everything else as written.
///
/// `f` receives each assignment's key and parsed value and returns the new
/// value, or `None` to leave the line alone. Comments, blank lines, `export `
/// prefixes, duplicate keys and line endings all survive.
pub fn rewrite_values<E>(
    contents: &str,
    mut f: impl FnMut(&str, &str) -> std::result::Result<Option<String>, E>,
) -> std::result::Result<String, E> {
    let mut out = String::with_capacity(contents.len());

    for line in contents.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let body = body.strip_suffix('\r').unwrap_or(body);
        let ending = &line[body.len()..];

        let trimmed = body.trim_start();
        let eq = match body.find('=') {
            Some(eq) if !trimmed.is_empty() && !trimmed.starts_with('#') => eq,
            _ => {
                out.push_str(line);
                continue;
            }
        };

        let key = body[..eq].trim();
        let key = key.strip_prefix("export ").unwrap_or(key).trim();
        let value = parse_env_value(body[eq + 1..].trim());

        match f(key, &value)? {
            Some(new) => {
                out.push_str(&body[..=eq]);
                out.push_str(&render_value(&new));
                out.push_str(ending);
            }
            None => out.push_str(line),
        }
    }

    Ok(out)
}

/// Write `content` to `path`, readable only by the owner on Unix.
pub(crate) fn write_private(path: &Path, content: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        // Also tighten files that existed before with looser modes.
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        let mut file = std::fs::File::create(path)?;
        file.write_all(content.as_bytes())?;
    }

    Ok(())
}

fn parse_env_value(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return unescape_double_quoted(&raw[1..raw.len() - 1]);
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }

    raw.to_string()
}

fn unescape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn render_value(value: &str) -> String {
    if needs_quotes(value) {
        format!("\"{}\"", escape_env_value(value))
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|ch| ch.is_whitespace())
        || value.contains('#')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('\\')
}

fn escape_env_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }

    escaped
}
