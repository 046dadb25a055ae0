//! Attachment classification by file extension.

use crate::config::FilesConfig;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// The four attachment groups a page exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Document,
    Sound,
}

impl FileKind {
    /// Group name, also the reserved metadata key for that group.
    pub fn group(self) -> &'static str {
        match self {
            FileKind::Image => "images",
            FileKind::Video => "videos",
            FileKind::Document => "documents",
            FileKind::Sound => "sounds",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

/// Maps file names to a [`FileKind`] using the configured extension groups.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    groups: Vec<(FileKind, Vec<String>)>,
}

impl FileClassifier {
    pub fn new(files: &FilesConfig) -> Self {
        fn lower(exts: &[String]) -> Vec<String> {
            exts.iter().map(|e| e.to_ascii_lowercase()).collect()
        }
        Self {
            groups: vec![
                (FileKind::Image, lower(&files.images)),
                (FileKind::Video, lower(&files.videos)),
                (FileKind::Document, lower(&files.documents)),
                (FileKind::Sound, lower(&files.sounds)),
            ],
        }
    }

    /// Classify a file name by its last extension, case-insensitively.
    /// The first group listing the extension wins.
    pub fn classify(&self, file_name: &str) -> Option<FileKind> {
        let ext = Path::new(file_name).extension()?.to_string_lossy().to_ascii_lowercase();
        self.groups
            .iter()
            .find(|(_, exts)| exts.iter().any(|e| *e == ext))
            .map(|(kind, _)| *kind)
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new(&FilesConfig::default())
    }
}
