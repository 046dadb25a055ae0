//! Shared test utilities.
//!
//! Provides the fixture site and lookup helpers that panic with the list of
//! available keys on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let graph = PageGraph::load(&tmp.path().join("content"), &SiteConfig::default(), Request::default()).unwrap();
//!
//! let post = find_page(&graph, "blog/first-post");
//! let cover = find_image(&post, "cover.png");
//! assert_eq!(cover.width, 12);
//! ```

use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

use crate::files::{FileItem, ImageItem};
use crate::graph::PageGraph;
use crate::page::{Page, Pages};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to `<tmp>/content` and return the temp site root.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    let content = tmp.path().join("content");
    std::fs::create_dir_all(&content).unwrap();
    copy_dir_recursive(&fixtures, &content).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Lookups (panic with a clear message on miss)
// =========================================================================

/// Find a page by canonical path. Panics if not found.
pub fn find_page(graph: &PageGraph, path: &str) -> Rc<Page> {
    graph.find(path).unwrap_or_else(|| {
        let paths: Vec<&str> = graph.pages().keys().collect();
        panic!("page '{path}' not found. Available: {paths:?}")
    })
}

/// Find an image attachment by file name. Panics if not found.
pub fn find_image<'a>(page: &'a Page, filename: &str) -> &'a ImageItem {
    page.images.get(filename).unwrap_or_else(|| {
        let names: Vec<&str> = page.images.keys().collect();
        panic!("image '{filename}' not found on '{}'. Available: {names:?}", page.path)
    })
}

/// Find a non-image attachment by file name in any group. Panics if not found.
pub fn find_file<'a>(page: &'a Page, filename: &str) -> &'a FileItem {
    [&page.videos, &page.documents, &page.sounds]
        .into_iter()
        .find_map(|group| group.get(filename))
        .unwrap_or_else(|| {
            let names: Vec<&str> = page.files.keys().collect();
            panic!("file '{filename}' not found on '{}'. Available: {names:?}", page.path)
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Canonical paths of a page set, in order.
pub fn page_paths(pages: &Pages) -> Vec<String> {
    pages.keys().map(str::to_string).collect()
}
