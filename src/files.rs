//! Page attachments.
//!
//! Every non-content file in a page directory whose extension belongs to one
//! of the configured groups becomes a [`FileItem`]; images additionally get
//! their pixel dimensions and MIME type as an [`ImageItem`]. An optional
//! sidecar (`photo.jpg.md`) supplies per-file metadata in the same record
//! format as page content files.
//!
//! Image "resizing" ([`ImageItem::max_width`] and friends) only computes new
//! dimensions for the renderer; no pixels are touched.

use crate::classify::FileKind;
use crate::content::{ContentParser, Metadata, sidecar_path};
use crate::value::{Fields, Value};
use image::{ImageFormat, ImageReader};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// One attachment file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileItem {
    pub path: PathBuf,
    /// File name with extension (`photo.jpg`).
    pub filename: String,
    /// File name without extension (`photo`).
    pub name: String,
    /// Extension as written on disk (`jpg`, `JPG`).
    pub extension: String,
    /// Public URL: the page folder URL plus the file name.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub modified: i64,
    pub kind: FileKind,
    pub metadata: Metadata,
}

impl FileItem {
    /// Stat `path` and read its sidecar, if any.
    pub fn load(
        path: &Path,
        kind: FileKind,
        folder_url: &str,
        parser: &dyn ContentParser,
        content_extension: &str,
    ) -> std::io::Result<Self> {
        let stat = fs::metadata(path)?;
        let modified = stat
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        let sidecar = sidecar_path(path, content_extension);
        let metadata = if sidecar.is_file() {
            parser.read(&sidecar)
        } else {
            Metadata::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            url: format!("{folder_url}{filename}"),
            filename,
            name,
            extension,
            size: stat.len(),
            modified,
            kind,
            metadata,
        })
    }

    /// Human-readable size in 1024 steps (`1.50 KB`). An empty file renders
    /// as `0.00 MB`.
    pub fn nice_size(&self, decimals: usize) -> String {
        if self.size == 0 {
            return "0.00 MB".to_string();
        }
        let mut value = self.size as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.decimals$} {}", SIZE_UNITS[unit])
    }
}

impl Fields for FileItem {
    fn field(&self, key: &str) -> Option<Value> {
        let key = key.to_lowercase();
        let value = match key.as_str() {
            "path" => Value::from(self.path.to_string_lossy().to_string()),
            "filename" => Value::from(self.filename.as_str()),
            "name" => Value::from(self.name.as_str()),
            "extension" => Value::from(self.extension.as_str()),
            "url" => Value::from(self.url.as_str()),
            "size" => Value::Int(self.size as i64),
            "modified" => Value::Int(self.modified),
            "type" => Value::from(self.kind.group()),
            _ => return self.metadata.get(&key).map(Value::from),
        };
        Some(value)
    }
}

/// An image attachment with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageItem {
    #[serde(flatten)]
    pub file: FileItem,
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

impl ImageItem {
    /// Wrap a file, reading dimensions and format from the image header.
    pub fn from_file(file: FileItem) -> Self {
        match probe(&file.path) {
            Some((width, height, mime)) => Self {
                file,
                width,
                height,
                mime: mime.to_string(),
            },
            None => {
                tracing::warn!(path = %file.path.display(), "unreadable image header");
                let mime = ImageFormat::from_path(&file.path)
                    .map(|f| f.to_mime_type())
                    .unwrap_or("application/octet-stream")
                    .to_string();
                Self {
                    file,
                    width: 0,
                    height: 0,
                    mime,
                }
            }
        }
    }

    /// Fit the longer edge into `max` (height when square).
    pub fn max(&self, max: u32) -> Self {
        if self.width > self.height {
            self.max_width(max)
        } else {
            self.max_height(max)
        }
    }

    /// Copy scaled down to at most `max` pixels wide. Never upscales.
    pub fn max_width(&self, max: u32) -> Self {
        if self.width <= max || self.width == 0 {
            return self.clone();
        }
        Self {
            width: max,
            height: scale(self.height, max, self.width),
            ..self.clone()
        }
    }

    /// Copy scaled down to at most `max` pixels high. Never upscales.
    pub fn max_height(&self, max: u32) -> Self {
        if self.height <= max || self.height == 0 {
            return self.clone();
        }
        Self {
            width: scale(self.width, max, self.height),
            height: max,
            ..self.clone()
        }
    }
}

fn scale(side: u32, target: u32, reference: u32) -> u32 {
    (side as f64 * target as f64 / reference as f64).round() as u32
}

fn probe(path: &Path) -> Option<(u32, u32, &'static str)> {
    let reader = ImageReader::open(path).ok()?.with_guessed_format().ok()?;
    let format = reader.format()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some((width, height, format.to_mime_type()))
}

impl Fields for ImageItem {
    fn field(&self, key: &str) -> Option<Value> {
        match key.to_lowercase().as_str() {
            "width" => Some(Value::Int(self.width as i64)),
            "height" => Some(Value::Int(self.height as i64)),
            "mime" => Some(Value::from(self.mime.as_str())),
            _ => self.file.field(key),
        }
    }
}

/// Entry of a page's aggregate `files` collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attachment {
    File(FileItem),
    Image(ImageItem),
}

impl Attachment {
    pub fn file(&self) -> &FileItem {
        match self {
            Attachment::File(f) => f,
            Attachment::Image(img) => &img.file,
        }
    }

    pub fn kind(&self) -> FileKind {
        self.file().kind
    }

    pub fn as_image(&self) -> Option<&ImageItem> {
        match self {
            Attachment::Image(img) => Some(img),
            Attachment::File(_) => None,
        }
    }
}

impl Fields for Attachment {
    fn field(&self, key: &str) -> Option<Value> {
        match self {
            Attachment::File(f) => f.field(key),
            Attachment::Image(img) => img.field(key),
        }
    }
}
