//! Site configuration module.
//!
//! Handles loading, validating and merging `config.toml`. The file lives in
//! the site root (next to the content directory) and is sparse: stock
//! defaults are merged underneath whatever the user specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content-root = "content"   # Content directory, relative to the site root
//! base-url = ""              # Absolute site URL used to build page URLs
//! extension = "md"           # Content file extension
//! split-line = "-----"       # Record separator in content files
//! split-key-value = ":"      # Key/value separator in content files
//! rewrite = true             # Pretty URLs (`/a/b`) instead of `/?a/b`
//! # home = "home"            # Page served for the empty path
//! # error = "error"          # Page served when nothing matches
//! error-header = true        # Raise the not-found signal on misses
//!
//! [files]
//! images = ["jpg", "jpeg", "gif", "png"]
//! videos = ["mpg", "mpeg", "mp4", "mov", "avi", "flv"]
//! documents = ["pdf", "doc", "xls", "ppt", "docx", "xlsx", "pptx"]
//! sounds = ["mp3", "wav", "m4a"]
//! ```
//!
//! Unknown keys are rejected to catch typos early. Configuration is read
//! once and passed by reference; nothing here is global.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Content directory, relative to the site root.
    pub content_root: String,
    /// Absolute site URL (scheme, host and mount path), no trailing slash.
    pub base_url: String,
    /// Extension of content and sidecar files.
    pub extension: String,
    /// Record separator inside content files.
    pub split_line: String,
    /// Key/value separator inside a record.
    pub split_key_value: String,
    /// Route on the request path when true, on the raw query string otherwise.
    pub rewrite: bool,
    /// Canonical path served for an empty request path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    /// Canonical path served when no page matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raise the not-found signal when no page matches exactly.
    pub error_header: bool,
    /// Attachment extension groups.
    pub files: FilesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: "content".to_string(),
            base_url: String::new(),
            extension: "md".to_string(),
            split_line: "-----".to_string(),
            split_key_value: ":".to_string(),
            rewrite: true,
            home: None,
            error: None,
            error_header: true,
            files: FilesConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate values that the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("extension", &self.extension),
            ("split-line", &self.split_line),
            ("split-key-value", &self.split_key_value),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }

        let groups = self.files.groups();
        for (i, (name, exts)) in groups.iter().enumerate() {
            for ext in exts.iter() {
                if ext.eq_ignore_ascii_case(&self.extension) {
                    return Err(ConfigError::Validation(format!(
                        "files.{name} must not contain the content extension \"{ext}\""
                    )));
                }
                for (other, other_exts) in &groups[i + 1..] {
                    if other_exts.iter().any(|o| o.eq_ignore_ascii_case(ext)) {
                        return Err(ConfigError::Validation(format!(
                            "extension \"{ext}\" listed in both files.{name} and files.{other}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Absolute content directory for a site root.
    pub fn content_dir(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.content_root)
    }
}

/// Attachment extension groups, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub documents: Vec<String>,
    pub sounds: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            images: list(&["jpg", "jpeg", "gif", "png"]),
            videos: list(&["mpg", "mpeg", "mp4", "mov", "avi", "flv"]),
            documents: list(&["pdf", "doc", "xls", "ppt", "docx", "xlsx", "pptx"]),
            sounds: list(&["mp3", "wav", "m4a"]),
        }
    }
}

impl FilesConfig {
    /// Groups in classification order, paired with their config names.
    pub fn groups(&self) -> [(&'static str, &[String]); 4] {
        [
            ("images", &self.images),
            ("videos", &self.videos),
            ("documents", &self.documents),
            ("sounds", &self.sounds),
        ]
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root, over stock defaults.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(root = %root.display(), content_root = %config.content_root, "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Flatfolio Configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Content directory, relative to this file.
content-root = "content"

# Absolute site URL (scheme, host, mount path) without trailing slash.
# Page URLs are built as <base-url>/<path>, or <base-url>/?<path> when
# rewrite is off.
base-url = ""

# ---------------------------------------------------------------------------
# Content files
# ---------------------------------------------------------------------------
# Extension of page content files and attachment sidecars (photo.jpg.md).
extension = "md"

# Record separator and key/value separator inside content files.
split-line = "-----"
split-key-value = ":"

# ---------------------------------------------------------------------------
# Routing
# ---------------------------------------------------------------------------
# Route on the request path (true) or on the raw query string (false).
rewrite = true

# Page served for the empty path. Defaults to the first page.
# home = "home"

# Page served when no page matches the request.
# error = "error"

# Raise the not-found signal when no page matches exactly.
error-header = true

# ---------------------------------------------------------------------------
# Attachments
# ---------------------------------------------------------------------------
# Files in a page directory are grouped by extension (case-insensitive).
[files]
images = ["jpg", "jpeg", "gif", "png"]
videos = ["mpg", "mpeg", "mp4", "mov", "avi", "flv"]
documents = ["pdf", "doc", "xls", "ppt", "docx", "xlsx", "pptx"]
sounds = ["mp3", "wav", "m4a"]
"##
}
