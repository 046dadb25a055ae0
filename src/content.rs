//! Content files: flat key/value records.
//!
//! Every page directory may hold one content file (`*.md` by default) and
//! every attachment may have a sidecar with the same name plus the content
//! extension (`photo.jpg` → `photo.jpg.md`). Both use the same format:
//!
//! ```text
//! Title: Hello
//! -----
//! Author: Jane
//! -----
//! Text: Values may span
//! several lines: colons after the first are kept.
//! ```
//!
//! Records are separated by the configured line token (`-----`), each
//! record is split on the **first** key/value delimiter (`:`), both halves
//! are trimmed and keys are lower-cased.
//!
//! ## Malformed Records
//!
//! A record without a delimiter (or with an empty key) is skipped with a
//! warning. One bad record never discards the rest of the file, and one bad
//! file never aborts a scan.

use crate::config::SiteConfig;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};

/// Ordered, lower-cased key → value mapping parsed from a content file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Keys are lower-cased; a repeated key keeps its first
    /// position and takes the latest value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the given keys (used to keep reserved names off pages).
    pub fn without(mut self, reserved: &[&str]) -> Self {
        self.entries.retain(|(k, _)| !reserved.contains(&k.as_str()));
        self
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Turns the text of one content file into [`Metadata`].
///
/// The production implementation is [`RecordParser`]; tests and embedders
/// can substitute their own.
pub trait ContentParser {
    fn parse(&self, text: &str) -> Metadata;

    /// Read and parse a file. Unreadable files yield empty metadata.
    fn read(&self, path: &Path) -> Metadata {
        match std::fs::read_to_string(path) {
            Ok(text) => self.parse(&text),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read content file");
                Metadata::new()
            }
        }
    }
}

/// Delimiter-based record parser configured from `split-line` and
/// `split-key-value`.
#[derive(Debug, Clone)]
pub struct RecordParser {
    split_line: String,
    split_key_value: String,
}

impl RecordParser {
    pub fn new(split_line: impl Into<String>, split_key_value: impl Into<String>) -> Self {
        Self {
            split_line: split_line.into(),
            split_key_value: split_key_value.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(&config.split_line, &config.split_key_value)
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new("-----", ":")
    }
}

impl ContentParser for RecordParser {
    fn parse(&self, text: &str) -> Metadata {
        let mut metadata = Metadata::new();
        for (index, record) in text.split(self.split_line.as_str()).enumerate() {
            let record = record.trim();
            if record.is_empty() {
                continue;
            }
            match record.split_once(self.split_key_value.as_str()) {
                Some((key, value)) if !key.trim().is_empty() => {
                    metadata.insert(key.trim(), value.trim());
                }
                _ => {
                    tracing::warn!(record = index, "skipping content record without a key");
                }
            }
        }
        metadata
    }
}

/// Sidecar metadata path for an attachment: the full file name plus the
/// content extension (`photo.jpg` → `photo.jpg.md`).
pub fn sidecar_path(file: &Path, extension: &str) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Find the content file of a directory: the first regular file, in name
/// order, whose extension matches case-insensitively. Sidecars of other
/// files in the same directory are not candidates.
pub fn find_content_file(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
                && !p
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
                && !p.with_extension("").is_file()
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
