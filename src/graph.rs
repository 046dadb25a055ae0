//! The page graph: every page of the site plus per-request routing state.
//!
//! A [`PageGraph`] is built for one request and dropped with it:
//!
//! ```text
//! content dir ──scan──► raw tree ──convert──► canonical tree
//!                                                  │ entries (pre-order)
//!                                                  ▼
//!                       Pages (one per canonical path, ancestors first)
//!                                                  │ Request
//!                                                  ▼
//!                                   active page (resolved once, memoized)
//! ```
//!
//! ## Resolution
//!
//! 1. Parse the request into a lookup path and parameters.
//! 2. Empty path: the configured `home` page, else the first page.
//! 3. Exact match on canonical path: that page is active.
//! 4. Otherwise the not-found signal is raised (when `error-header` is on)
//!    and the configured `error` page is tried.
//! 5. Nothing found: no active page. This is a result, not an error.
//!
//! The graph is single-threaded (`Rc`, `Cell`); concurrent requests each
//! build their own.

use crate::classify::FileClassifier;
use crate::config::SiteConfig;
use crate::content::{ContentParser, RecordParser};
use crate::page::{Page, PageContext, Pages};
use crate::router::{Request, Route, parse_route};
use crate::tree::{self, ScanError, TreeNode};
use std::cell::{Cell, OnceCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared state behind a [`PageGraph`]; pages point back here weakly.
#[derive(Debug)]
pub(crate) struct GraphInner {
    pub(crate) pages: Pages,
    tree: TreeNode,
    config: SiteConfig,
    request: Request,
    route: Route,
    active: OnceCell<Option<Rc<Page>>>,
    not_found: Cell<bool>,
}

impl GraphInner {
    pub(crate) fn active(&self) -> Option<Rc<Page>> {
        self.active.get_or_init(|| self.resolve()).clone()
    }

    fn resolve(&self) -> Option<Rc<Page>> {
        let path = if self.route.path.is_empty() {
            match configured_page(&self.config.home) {
                Some(home) => home.to_string(),
                None => self.pages.keys().next().unwrap_or_default().to_string(),
            }
        } else {
            self.route.path.clone()
        };

        if let Some(page) = self.pages.get(&path) {
            tracing::debug!(path = %page.path, "request resolved");
            page.active.set(true);
            return Some(page.clone());
        }

        if self.config.error_header {
            self.not_found.set(true);
            tracing::info!(path = %path, "no page matches request");
        }

        if let Some(error) = configured_page(&self.config.error)
            && let Some(page) = self.pages.get(error)
        {
            tracing::debug!(path = %page.path, "serving error page");
            page.active.set(true);
            return Some(page.clone());
        }

        None
    }
}

/// A `home`/`error` setting as a page path. Blank values count as unset.
fn configured_page(setting: &Option<String>) -> Option<&str> {
    setting
        .as_deref()
        .map(|path| path.trim().trim_matches('/'))
        .filter(|path| !path.is_empty())
}

/// All pages of a site, resolved against one request.
#[derive(Debug, Clone)]
pub struct PageGraph {
    inner: Rc<GraphInner>,
}

impl PageGraph {
    /// Build the graph for `content_dir`, parsing content files with the
    /// configured record delimiters.
    pub fn load(content_dir: &Path, config: &SiteConfig, request: Request) -> Result<Self, GraphError> {
        let parser = RecordParser::from_config(config);
        Self::load_with(content_dir, config, request, &parser)
    }

    /// Build the graph with a custom content parser.
    pub fn load_with(
        content_dir: &Path,
        config: &SiteConfig,
        request: Request,
        parser: &dyn ContentParser,
    ) -> Result<Self, GraphError> {
        let content_dir = std::path::absolute(content_dir)?;
        let tree = tree::convert(&tree::scan(&content_dir)?);
        let classifier = FileClassifier::new(&config.files);
        let ctx = PageContext {
            content_dir: &content_dir,
            config,
            parser,
            classifier: &classifier,
        };

        let mut built = Vec::new();
        for entry in tree::entries(&tree) {
            built.push(Page::build(&entry, &ctx)?);
        }
        tracing::debug!(pages = built.len(), "page graph built");

        let route = parse_route(&request, config.rewrite);
        let inner = Rc::new_cyclic(|weak| {
            let pages = built
                .into_iter()
                .map(|mut page| {
                    page.graph = weak.clone();
                    (page.path.clone(), Rc::new(page))
                })
                .collect();
            GraphInner {
                pages,
                tree,
                config: config.clone(),
                request,
                route,
                active: OnceCell::new(),
                not_found: Cell::new(false),
            }
        });
        Ok(Self { inner })
    }

    /// Every page, depth-first, ancestors before descendants.
    pub fn pages(&self) -> &Pages {
        &self.inner.pages
    }

    pub fn find(&self, path: &str) -> Option<Rc<Page>> {
        self.inner.pages.get(path.trim_matches('/')).cloned()
    }

    /// Depth-1 pages, for menus.
    pub fn top_level(&self) -> Pages {
        self.inner.pages.depth(1)
    }

    /// Canonical tree; visible nodes only when `hide` is set.
    pub fn tree(&self, hide: bool) -> TreeNode {
        if hide {
            tree::hide(&self.inner.tree)
        } else {
            self.inner.tree.clone()
        }
    }

    /// The page resolved from the request, if any. Resolution runs once.
    pub fn active(&self) -> Option<Rc<Page>> {
        self.inner.active()
    }

    /// The active page's ancestor at `level` segments (`1` = its top-level
    /// section). Level 0 has no page.
    pub fn active_at(&self, level: usize) -> Option<Rc<Page>> {
        let active = self.active()?;
        let path = active.path.split('/').take(level).collect::<Vec<_>>().join("/");
        if path.is_empty() {
            return None;
        }
        self.find(&path)
    }

    /// True once resolution missed an exact match with `error-header` on.
    pub fn not_found(&self) -> bool {
        self.active();
        self.inner.not_found.get()
    }

    /// Request parameter, or `default` when absent.
    pub fn param(&self, key: &str, default: &str) -> String {
        self.inner
            .route
            .params
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.inner.route.params
    }

    /// Lookup path derived from the request (empty for the home page).
    pub fn route_path(&self) -> &str {
        &self.inner.route.path
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Attachment count over all pages.
    pub fn file_count(&self) -> usize {
        self.inner.pages.values().map(|p| p.files.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Order;
    use crate::content::Metadata;
    use crate::test_helpers::*;
    use crate::value::{Fields, Value};
    use std::fs;
    use tempfile::TempDir;

    fn graph(uri: &str) -> (TempDir, PageGraph) {
        graph_with(uri, SiteConfig::default())
    }

    fn graph_with(uri: &str, config: SiteConfig) -> (TempDir, PageGraph) {
        let tmp = setup_fixtures();
        let g = PageGraph::load(&tmp.path().join("content"), &config, Request::from_uri(uri)).unwrap();
        (tmp, g)
    }

    fn paths(pages: &Pages) -> Vec<String> {
        page_paths(pages)
    }

    #[test]
    fn pages_in_preorder() {
        let (_tmp, g) = graph("/");
        assert_eq!(
            paths(g.pages()),
            vec![
                "home",
                "blog",
                "blog/first-post",
                "blog/second-post",
                "blog/drafts",
                "about",
                "about/team",
                "archive",
                "archive/2019",
                "error",
            ]
        );
    }

    #[test]
    fn missing_content_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = PageGraph::load(&tmp.path().join("none"), &SiteConfig::default(), Request::default());
        assert!(matches!(result, Err(GraphError::Scan(ScanError::NotADirectory(_)))));
    }

    #[test]
    fn top_level_and_depth() {
        let (_tmp, g) = graph("/");
        assert_eq!(paths(&g.top_level()), vec!["home", "blog", "about", "archive", "error"]);
        assert_eq!(paths(&g.pages().depth(2).visible()), vec![
            "blog/first-post",
            "blog/second-post",
            "about/team",
            "archive/2019",
        ]);
    }

    #[test]
    fn tree_hide_drops_hidden() {
        let (_tmp, g) = graph("/");
        let hidden = g.tree(true);
        assert!(hidden.child("error").is_none());
        assert!(hidden.child("blog").unwrap().child("drafts").is_none());
        let full = g.tree(false);
        assert!(full.child("error").is_some());
    }

    // =========================================================================
    // Routing
    // =========================================================================

    #[test]
    fn exact_match_is_active() {
        let (_tmp, g) = graph("/blog/first-post");
        let active = g.active().unwrap();
        assert_eq!(active.path, "blog/first-post");
        assert!(active.active());
        assert!(!g.not_found());
    }

    #[test]
    fn ancestors_are_active_too() {
        let (_tmp, g) = graph("/blog/first-post");
        assert!(find_page(&g, "blog").active());
        assert!(!find_page(&g, "blog/second-post").active());
        assert!(!find_page(&g, "about").active());
    }

    #[test]
    fn empty_path_without_home_is_first_page() {
        let (_tmp, g) = graph("/");
        assert_eq!(g.active().unwrap().path, "home");
    }

    #[test]
    fn empty_path_with_home() {
        let config = SiteConfig {
            home: Some("about".to_string()),
            ..SiteConfig::default()
        };
        let (_tmp, g) = graph_with("", config);
        assert_eq!(g.active().unwrap().path, "about");
    }

    #[test]
    fn blank_home_falls_back_to_first_page() {
        for home in ["", "  ", "/"] {
            let config: SiteConfig = toml::from_str(&format!("home = \"{home}\"")).unwrap();
            let (_tmp, g) = graph_with("/", config);
            assert_eq!(g.active().unwrap().path, "home", "home = {home:?}");
            assert!(!g.not_found());
        }
    }

    #[test]
    fn blank_error_setting_serves_nothing() {
        let config = SiteConfig {
            error: Some(String::new()),
            ..SiteConfig::default()
        };
        let (_tmp, g) = graph_with("/nope", config);
        assert!(g.active().is_none());
        assert!(g.not_found());
    }

    #[test]
    fn miss_serves_error_page() {
        let config = SiteConfig {
            error: Some("error".to_string()),
            ..SiteConfig::default()
        };
        let (_tmp, g) = graph_with("/nope", config);
        assert_eq!(g.active().unwrap().path, "error");
        assert!(g.not_found());
    }

    #[test]
    fn miss_without_error_page_is_none() {
        let (_tmp, g) = graph("/nope");
        assert!(g.active().is_none());
        assert!(g.not_found());
        assert!(!find_page(&g, "home").active());
    }

    #[test]
    fn error_header_off_keeps_signal_down() {
        let config = SiteConfig {
            error_header: false,
            ..SiteConfig::default()
        };
        let (_tmp, g) = graph_with("/nope", config);
        assert!(g.active().is_none());
        assert!(!g.not_found());
    }

    #[test]
    fn resolution_is_memoized() {
        let (_tmp, g) = graph("/about");
        let first = g.active().unwrap();
        let second = g.active().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        let flagged: Vec<&str> = g
            .pages()
            .values()
            .filter(|p| p.active.get())
            .map(|p| p.path.as_str())
            .collect();
        assert_eq!(flagged, vec!["about"]);
    }

    #[test]
    fn params_and_defaults() {
        let (_tmp, g) = graph("/blog/page:2/tag:rust");
        assert_eq!(g.active().unwrap().path, "blog");
        assert_eq!(g.param("page", "1"), "2");
        assert_eq!(g.param("sort", "date"), "date");
        assert_eq!(g.params().len(), 2);
        assert_eq!(g.route_path(), "blog");
    }

    #[test]
    fn query_routing() {
        let config = SiteConfig {
            rewrite: false,
            ..SiteConfig::default()
        };
        let (_tmp, g) = graph_with("/index.php?about/team", config);
        assert_eq!(g.active().unwrap().path, "about/team");
        assert!(find_page(&g, "about").url.ends_with("/?about"));
    }

    #[test]
    fn active_at_levels() {
        let (_tmp, g) = graph("/blog/first-post");
        assert_eq!(g.active_at(1).unwrap().path, "blog");
        assert_eq!(g.active_at(2).unwrap().path, "blog/first-post");
        assert!(g.active_at(0).is_none());
    }

    #[test]
    fn active_at_without_active_page() {
        let (_tmp, g) = graph("/missing");
        assert!(g.active_at(1).is_none());
    }

    // =========================================================================
    // Relations
    // =========================================================================

    #[test]
    fn children_and_parent() {
        let (_tmp, g) = graph("/");
        let blog = find_page(&g, "blog");
        assert_eq!(paths(&blog.children()), vec!["blog/first-post", "blog/second-post", "blog/drafts"]);
        assert!(blog.has_children());
        let post = find_page(&g, "blog/first-post");
        assert_eq!(post.parent_page().unwrap().path, "blog");
        assert_eq!(paths(&post.parent(true)), vec!["blog/first-post", "blog/second-post"]);
        assert!(!post.has_children());
    }

    #[test]
    fn top_level_parent_is_top_level() {
        let (_tmp, g) = graph("/");
        let about = find_page(&g, "about");
        assert!(about.parent_page().is_none());
        assert_eq!(paths(&about.parent(true)), vec!["home", "blog", "about", "archive"]);
    }

    #[test]
    fn prev_next_among_siblings() {
        let (_tmp, g) = graph("/");
        let first = find_page(&g, "blog/first-post");
        let second = find_page(&g, "blog/second-post");
        assert!(first.prev(false).is_none());
        assert_eq!(first.next(false).unwrap().path, "blog/second-post");
        assert_eq!(second.prev(true).unwrap().path, "blog/first-post");
        assert!(second.next(true).is_none());
        assert_eq!(second.next(false).unwrap().path, "blog/drafts");
        assert!(!second.has_next(true));
    }

    #[test]
    fn hidden_page_has_no_visible_neighbours() {
        let (_tmp, g) = graph("/");
        let drafts = find_page(&g, "blog/drafts");
        assert!(drafts.prev(true).is_none());
        assert_eq!(drafts.prev(false).unwrap().path, "blog/second-post");
    }

    #[test]
    fn set_children() {
        let (_tmp, g) = graph("/");
        let one = g.pages().filter("about");
        assert_eq!(paths(&one.children()), vec!["about/team"]);
        let many = g.pages().filter("blog/*");
        assert_eq!(many.children().len(), many.len());
    }

    #[test]
    fn virtual_intermediate_page() {
        let (_tmp, g) = graph("/archive/2019");
        let archive = find_page(&g, "archive");
        assert!(archive.is_virtual());
        assert!(archive.active());
        assert_eq!(paths(&archive.children()), vec!["archive/2019"]);
    }

    // =========================================================================
    // Queries over pages
    // =========================================================================

    #[test]
    fn filter_and_sort_by_metadata() {
        let (_tmp, g) = graph("/");
        let posts = g.pages().filter("blog/*").filter_with("date", ">=", "2024-01-01", false);
        assert_eq!(paths(&posts), vec!["blog/first-post", "blog/second-post"]);
        let newest = posts.sort_by("date", Order::Desc);
        assert_eq!(paths(&newest), vec!["blog/second-post", "blog/first-post"]);
        // Branching off `posts` left it untouched.
        assert_eq!(paths(&posts), vec!["blog/first-post", "blog/second-post"]);
    }

    #[test]
    fn filter_on_structural_fields() {
        let (_tmp, g) = graph("/");
        let hidden = g.pages().filter_eq("hidden", "1");
        assert_eq!(paths(&hidden), vec!["blog/drafts", "error"]);
        assert_eq!(paths(&g.pages().invisible()), paths(&hidden));
        let deep = g.pages().filter_with("depth", ">", "1", false);
        assert_eq!(deep.len(), 5);
    }

    #[test]
    fn attachments_reachable_from_graph() {
        let (_tmp, g) = graph("/");
        let post = find_page(&g, "blog/first-post");
        assert!(post.has_images());
        assert!(post.has_documents());
        let cover = find_image(&post, "cover.png");
        assert_eq!((cover.width, cover.height), (12, 8));
        assert_eq!(cover.file.metadata.get("caption"), Some("Sunrise over the bay"));
        assert_eq!(find_file(&post, "notes.pdf").url, "/content/02-blog/01-first-post/notes.pdf");
        assert_eq!(g.file_count(), 4);
    }

    #[test]
    fn custom_parser() {
        struct Fixed;
        impl ContentParser for Fixed {
            fn parse(&self, _text: &str) -> Metadata {
                let mut m = Metadata::new();
                m.insert("title", "Fixed");
                m
            }
        }
        let tmp = setup_fixtures();
        let g = PageGraph::load_with(
            &tmp.path().join("content"),
            &SiteConfig::default(),
            Request::default(),
            &Fixed,
        )
        .unwrap();
        assert_eq!(find_page(&g, "about").field("title"), Some(Value::from("Fixed")));
    }

    #[test]
    fn relative_content_dir_gives_absolute_directories() {
        let g = PageGraph::load(
            Path::new("fixtures/content"),
            &SiteConfig::default(),
            Request::default(),
        )
        .unwrap();
        let dir = find_page(&g, "home").directory.clone().unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("fixtures/content/01-home"));
        assert_eq!(find_image(&find_page(&g, "blog/first-post"), "cover.png").width, 12);
    }

    #[test]
    fn pages_outlive_graph_without_relatives() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("01-a/01-b")).unwrap();
        let page = {
            let g = PageGraph::load(tmp.path(), &SiteConfig::default(), Request::default()).unwrap();
            find_page(&g, "a")
        };
        assert!(page.children().is_empty());
        assert!(!page.active());
    }
}
