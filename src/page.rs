//! Pages.
//!
//! One [`Page`] exists per canonical path. A page whose directory holds a
//! content file carries that file's metadata and the directory's attachments;
//! a directory without one yields a *virtual* page that only exists to keep
//! the hierarchy intact (`archive` in `archive/2019`).
//!
//! Pages never own each other. Relations (`children`, `parent`, `prev`,
//! `next`) are answered on demand against the owning graph, reached through
//! a weak back-reference, so a page outliving its graph simply has no
//! relatives.

use crate::classify::{FileClassifier, FileKind};
use crate::collection::Collection;
use crate::config::SiteConfig;
use crate::content::{ContentParser, Metadata, find_content_file};
use crate::files::{Attachment, FileItem, ImageItem};
use crate::graph::GraphInner;
use crate::naming::natural_cmp;
use crate::tree::TreeEntry;
use crate::value::{Fields, Value};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

/// A set of pages keyed by canonical path.
pub type Pages = Collection<Rc<Page>>;

/// Metadata keys that never reach a page: attachments own these names.
pub const RESERVED_KEYS: [&str; 4] = ["images", "videos", "documents", "sounds"];

#[derive(Debug)]
pub struct Page {
    /// Canonical path (`blog/first-post`).
    pub path: String,
    /// Raw path relative to the content root (`02-blog/01-first-post`).
    pub raw: String,
    pub url: String,
    /// Path with `/` replaced by `-`.
    pub id: String,
    /// Backing directory; `None` for virtual pages.
    pub directory: Option<PathBuf>,
    pub content_file: Option<PathBuf>,
    /// Content file stem, empty for virtual pages.
    pub template: String,
    /// Public URL of the raw directory, with trailing slash.
    pub folder: String,
    pub metadata: Metadata,
    /// Number of path segments, 1 for top-level pages.
    pub depth: usize,
    pub visible: bool,
    pub order: Option<u32>,
    pub images: Collection<ImageItem>,
    pub videos: Collection<FileItem>,
    pub documents: Collection<FileItem>,
    pub sounds: Collection<FileItem>,
    /// All attachments, in directory order.
    pub files: Collection<Attachment>,
    pub(crate) active: Cell<bool>,
    pub(crate) graph: Weak<GraphInner>,
}

/// Everything a page needs from its surroundings while being built.
pub(crate) struct PageContext<'a> {
    pub content_dir: &'a Path,
    pub config: &'a SiteConfig,
    pub parser: &'a dyn ContentParser,
    pub classifier: &'a FileClassifier,
}

#[derive(Default)]
struct Attachments {
    images: Collection<ImageItem>,
    videos: Collection<FileItem>,
    documents: Collection<FileItem>,
    sounds: Collection<FileItem>,
    files: Collection<Attachment>,
}

impl Page {
    /// Build the page for one tree entry. The graph reference is attached by
    /// the graph once every page exists.
    pub(crate) fn build(entry: &TreeEntry, ctx: &PageContext<'_>) -> std::io::Result<Self> {
        let config = ctx.config;
        let base = config.base_url.trim_end_matches('/');
        let url = if config.rewrite {
            format!("{base}/{}", entry.path)
        } else {
            format!("{base}/?{}", entry.path)
        };
        let folder = format!(
            "{base}/{}/{}/",
            config.content_root.trim_matches('/'),
            entry.raw
        );

        let dir = ctx.content_dir.join(&entry.raw);
        let content_file = find_content_file(&dir, &config.extension);

        let (directory, template, metadata, attachments) = match &content_file {
            Some(file) => {
                let template = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let metadata = ctx.parser.read(file).without(&RESERVED_KEYS);
                let attachments = load_attachments(&dir, file, &folder, ctx)?;
                (Some(dir), template, metadata, attachments)
            }
            None => {
                tracing::debug!(path = %entry.path, "no content file, virtual page");
                (None, String::new(), Metadata::new(), Attachments::default())
            }
        };

        Ok(Self {
            path: entry.path.clone(),
            raw: entry.raw.clone(),
            url,
            id: entry.path.replace('/', "-"),
            directory,
            content_file,
            template,
            folder,
            metadata,
            depth: entry.path.split('/').count(),
            visible: entry.visible,
            order: entry.order,
            images: attachments.images,
            videos: attachments.videos,
            documents: attachments.documents,
            sounds: attachments.sounds,
            files: attachments.files,
            active: Cell::new(false),
            graph: Weak::new(),
        })
    }

    pub fn hidden(&self) -> bool {
        !self.visible
    }

    /// Numeric order, 0 for hidden pages.
    pub fn prefix(&self) -> u32 {
        self.order.unwrap_or(0)
    }

    pub fn is_virtual(&self) -> bool {
        self.content_file.is_none()
    }

    /// Metadata value by key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)
    }

    /// Pages of the owning graph that pass `keep`; empty once the graph is gone.
    fn select_pages(&self, keep: impl FnMut(&str, &Rc<Page>) -> bool) -> Pages {
        match self.graph.upgrade() {
            Some(graph) => graph.pages.select(keep),
            None => Pages::new(),
        }
    }

    /// Pages exactly one level below this one.
    pub fn children(&self) -> Pages {
        self.select_pages(|key, _| parent_path(key) == Some(self.path.as_str()))
    }

    /// The sibling level this page lives in (itself included): the children
    /// of its parent, or the top-level pages.
    pub fn parent(&self, visible_only: bool) -> Pages {
        let level = parent_path(&self.path);
        self.select_pages(|key, page| parent_path(key) == level && (!visible_only || page.visible))
    }

    /// The page one level up.
    pub fn parent_page(&self) -> Option<Rc<Page>> {
        let parent = parent_path(&self.path)?;
        self.graph.upgrade()?.pages.get(parent).cloned()
    }

    pub fn prev(&self, visible_only: bool) -> Option<Rc<Page>> {
        let siblings = self.parent(visible_only);
        let pos = siblings.position(&self.path)?;
        siblings.eq(pos as isize - 1).cloned()
    }

    pub fn next(&self, visible_only: bool) -> Option<Rc<Page>> {
        let siblings = self.parent(visible_only);
        let pos = siblings.position(&self.path)?;
        siblings.eq(pos as isize + 1).cloned()
    }

    /// True for the resolved page and every ancestor of it.
    pub fn active(&self) -> bool {
        if self.active.get() {
            return true;
        }
        let Some(graph) = self.graph.upgrade() else {
            return false;
        };
        graph.active().is_some_and(|active| {
            active.path == self.path
                || active
                    .path
                    .strip_prefix(self.path.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn has_prev(&self, visible_only: bool) -> bool {
        self.prev(visible_only).is_some()
    }

    pub fn has_next(&self, visible_only: bool) -> bool {
        self.next(visible_only).is_some()
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn has_videos(&self) -> bool {
        !self.videos.is_empty()
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    pub fn has_sounds(&self) -> bool {
        !self.sounds.is_empty()
    }
}

impl Fields for Page {
    fn field(&self, key: &str) -> Option<Value> {
        let key = key.to_lowercase();
        let value = match key.as_str() {
            "path" => Value::from(self.path.as_str()),
            "id" => Value::from(self.id.as_str()),
            "url" => Value::from(self.url.as_str()),
            "template" => Value::from(self.template.as_str()),
            "folder" => Value::from(self.folder.as_str()),
            "depth" => Value::Int(self.depth as i64),
            "prefix" => Value::Int(i64::from(self.prefix())),
            "visible" => Value::Bool(self.visible),
            "hidden" => Value::Bool(self.hidden()),
            "active" => Value::Bool(self.active()),
            _ => return self.metadata.get(&key).map(Value::from),
        };
        Some(value)
    }
}

/// Extra queries on page sets.
impl Pages {
    pub fn visible(&self) -> Self {
        self.select(|_, page| page.visible)
    }

    pub fn invisible(&self) -> Self {
        self.select(|_, page| !page.visible)
    }

    /// Alias of [`invisible`](Self::invisible).
    pub fn hidden(&self) -> Self {
        self.invisible()
    }

    /// Pages at exactly `depth` segments.
    pub fn depth(&self, depth: usize) -> Self {
        self.select(|_, page| page.depth == depth)
    }

    /// The children of the only page in the set; any other set is returned
    /// as is.
    pub fn children(&self) -> Self {
        match (self.len(), self.first()) {
            (1, Some(page)) => page.children(),
            _ => self.clone(),
        }
    }
}

fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

fn load_attachments(
    dir: &Path,
    content_file: &Path,
    folder: &str,
    ctx: &PageContext<'_>,
) -> std::io::Result<Attachments> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort_by(|a, b| natural_cmp(a, b));

    let mut out = Attachments::default();
    for name in names {
        let path = dir.join(&name);
        if path == content_file {
            continue;
        }
        let Some(kind) = ctx.classifier.classify(&name) else {
            continue;
        };
        let file = match FileItem::load(&path, kind, folder, ctx.parser, &ctx.config.extension) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable attachment");
                continue;
            }
        };
        match kind {
            FileKind::Image => {
                let image = ImageItem::from_file(file);
                out.files.insert(name.clone(), Attachment::Image(image.clone()));
                out.images.insert(name, image);
            }
            FileKind::Video => push_file(&mut out.videos, &mut out.files, name, file),
            FileKind::Document => push_file(&mut out.documents, &mut out.files, name, file),
            FileKind::Sound => push_file(&mut out.sounds, &mut out.files, name, file),
        }
    }
    Ok(out)
}

fn push_file(
    group: &mut Collection<FileItem>,
    files: &mut Collection<Attachment>,
    name: String,
    file: FileItem,
) {
    files.insert(name.clone(), Attachment::File(file.clone()));
    group.insert(name, file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RecordParser;
    use std::fs;
    use tempfile::TempDir;

    fn entry(path: &str, raw: &str) -> TreeEntry {
        let name = raw.rsplit('/').next().unwrap();
        let parsed = crate::naming::parse_entry_name(name);
        TreeEntry {
            path: path.to_string(),
            raw: raw.to_string(),
            order: parsed.order,
            visible: parsed.visible,
        }
    }

    fn build(root: &Path, config: &SiteConfig, e: &TreeEntry) -> Page {
        let parser = RecordParser::from_config(config);
        let classifier = FileClassifier::new(&config.files);
        let ctx = PageContext {
            content_dir: root,
            config,
            parser: &parser,
            classifier: &classifier,
        };
        Page::build(e, &ctx).unwrap()
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("02-blog/01-first-post");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("article.md"),
            "Title: First\n-----\nImages: overridden?\n-----\nDate: 2024-05-01",
        )
        .unwrap();
        image::RgbImage::new(8, 4).save(dir.join("cover.png")).unwrap();
        fs::rename(dir.join("cover.png"), dir.join("cover.PNG")).unwrap();
        fs::write(dir.join("notes.pdf"), "pdf").unwrap();
        fs::write(dir.join("theme.mp3"), "mp3").unwrap();
        fs::write(dir.join("clip.mp4"), "mp4").unwrap();
        fs::write(dir.join("readme.txt"), "ignored").unwrap();
        fs::write(dir.join(".DS_Store"), "ignored").unwrap();
        tmp
    }

    #[test]
    fn build_content_page() {
        let tmp = site();
        let config = SiteConfig {
            base_url: "https://example.com/".to_string(),
            ..SiteConfig::default()
        };
        let page = build(tmp.path(), &config, &entry("blog/first-post", "02-blog/01-first-post"));

        assert_eq!(page.url, "https://example.com/blog/first-post");
        assert_eq!(page.id, "blog-first-post");
        assert_eq!(page.template, "article");
        assert_eq!(page.folder, "https://example.com/content/02-blog/01-first-post/");
        assert_eq!(page.depth, 2);
        assert!(page.visible);
        assert_eq!(page.prefix(), 1);
        assert_eq!(page.get("title"), Some("First"));
        assert!(!page.is_virtual());
    }

    #[test]
    fn reserved_metadata_keys_dropped() {
        let tmp = site();
        let page = build(
            tmp.path(),
            &SiteConfig::default(),
            &entry("blog/first-post", "02-blog/01-first-post"),
        );
        assert_eq!(page.get("images"), None);
        assert_eq!(page.images.len(), 1);
    }

    #[test]
    fn attachments_grouped_and_aggregated() {
        let tmp = site();
        let page = build(
            tmp.path(),
            &SiteConfig::default(),
            &entry("blog/first-post", "02-blog/01-first-post"),
        );
        let image = page.images.get("cover.PNG").unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        assert_eq!(image.file.url, "/content/02-blog/01-first-post/cover.PNG");
        assert!(page.documents.contains_key("notes.pdf"));
        assert!(page.sounds.contains_key("theme.mp3"));
        assert!(page.videos.contains_key("clip.mp4"));
        let names: Vec<&str> = page.files.keys().collect();
        assert_eq!(names, vec!["clip.mp4", "cover.PNG", "notes.pdf", "theme.mp3"]);
        assert!(page.has_files() && page.has_images() && page.has_sounds());
    }

    #[test]
    fn virtual_page_has_nothing() {
        let tmp = site();
        fs::write(tmp.path().join("02-blog/cover.png"), "x").unwrap();
        let page = build(tmp.path(), &SiteConfig::default(), &entry("blog", "02-blog"));
        assert!(page.is_virtual());
        assert!(page.directory.is_none());
        assert!(page.metadata.is_empty());
        assert!(!page.has_files());
        assert_eq!(page.template, "");
    }

    #[test]
    fn query_string_urls_without_rewrite() {
        let tmp = site();
        let config = SiteConfig {
            rewrite: false,
            base_url: "http://localhost/site".to_string(),
            ..SiteConfig::default()
        };
        let page = build(tmp.path(), &config, &entry("blog", "02-blog"));
        assert_eq!(page.url, "http://localhost/site/?blog");
    }

    #[test]
    fn hidden_page_prefix_zero() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("notes")).unwrap();
        let page = build(tmp.path(), &SiteConfig::default(), &entry("notes", "notes"));
        assert!(page.hidden());
        assert_eq!(page.prefix(), 0);
        assert_eq!(page.field("hidden"), Some(Value::Bool(true)));
    }

    #[test]
    fn structural_fields_win_over_metadata() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("01-about");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("page.md"), "Path: fake\n-----\nAuthor: Jane").unwrap();
        let page = build(tmp.path(), &SiteConfig::default(), &entry("about", "01-about"));
        assert_eq!(page.field("path"), Some(Value::from("about")));
        assert_eq!(page.field("AUTHOR"), Some(Value::from("Jane")));
        assert_eq!(page.field("depth"), Some(Value::Int(1)));
    }

    #[test]
    fn detached_page_has_no_relatives() {
        let tmp = site();
        let page = build(tmp.path(), &SiteConfig::default(), &entry("blog", "02-blog"));
        assert!(page.children().is_empty());
        assert!(page.parent_page().is_none());
        assert!(page.prev(false).is_none());
        assert!(!page.active());
    }

    #[test]
    fn parent_path_splits_last_segment() {
        assert_eq!(parent_path("a/b/c"), Some("a/b"));
        assert_eq!(parent_path("a"), None);
    }
}
