//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (page, attachment) leads with its position and canonical
//! identity; filesystem paths follow as indented `Source:` context lines.
//! The output reads as a content inventory while still pointing back at the
//! directories that produced it.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! 001 home
//! 002 blog
//!     001 first-post
//!     002 second-post
//!     --- drafts (hidden)
//! --- error (hidden)
//! ```
//!
//! ## Pages
//!
//! ```text
//! 002 blog [blog]
//!     Source: 02-blog/blog.md
//!     001 first-post [article]
//!         Source: 02-blog/01-first-post/article.md
//!         Files: 1 image, 1 document
//! 004 archive (virtual)
//!     Source: 04-archive/
//! ```
//!
//! ## Route
//!
//! ```text
//! Request: /blog/page:2
//! Route: blog
//!     page = 2
//! Active: blog → /blog
//! Not found: no
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::content::Metadata;
use crate::graph::PageGraph;
use crate::page::Page;
use crate::tree::TreeNode;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format an ordering prefix as 3-digit zero-padded, `---` when hidden.
fn format_order(order: Option<u32>) -> String {
    match order {
        Some(n) => format!("{:0>3}", n),
        None => "---".to_string(),
    }
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Attachment summary, `None` when the page has no attachments.
///
/// ```text
/// Files: 2 images, 1 sound
/// ```
fn files_line(page: &Page) -> Option<String> {
    let parts: Vec<String> = [
        (page.images.len(), "image"),
        (page.videos.len(), "video"),
        (page.documents.len(), "document"),
        (page.sounds.len(), "sound"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, word)| plural(n, word))
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("Files: {}", parts.join(", ")))
    }
}

// ============================================================================
// Tree
// ============================================================================

/// Format a canonical tree, one node per line.
pub fn format_tree(tree: &TreeNode) -> Vec<String> {
    let mut lines = Vec::new();
    tree_lines(tree, 0, &mut lines);
    lines
}

fn tree_lines(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    for child in &node.children {
        let status = if child.visible { "" } else { " (hidden)" };
        lines.push(format!(
            "{}{} {}{}",
            indent(depth),
            format_order(child.order),
            child.key,
            status
        ));
        tree_lines(child, depth + 1, lines);
    }
}

pub fn print_tree(tree: &TreeNode) {
    for line in format_tree(tree) {
        println!("{}", line);
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Format every page of a graph in depth-first order.
pub fn format_pages(graph: &PageGraph) -> Vec<String> {
    let mut lines = Vec::new();
    for page in graph.pages().values() {
        let base = indent(page.depth - 1);
        let detail = if page.is_virtual() {
            " (virtual)".to_string()
        } else {
            format!(" [{}]", page.template)
        };
        lines.push(format!(
            "{}{} {}{}",
            base,
            format_order(page.order),
            page.path.rsplit('/').next().unwrap_or_default(),
            detail
        ));

        let source = match &page.content_file {
            Some(file) => {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!("{}/{}", page.raw, name)
            }
            None => format!("{}/", page.raw),
        };
        lines.push(format!("{}    Source: {}", base, source));
        if let Some(files) = files_line(page) {
            lines.push(format!("{}    {}", base, files));
        }
    }
    lines
}

pub fn print_pages(graph: &PageGraph) {
    for line in format_pages(graph) {
        println!("{}", line);
    }
}

// ============================================================================
// Route
// ============================================================================

/// Format the resolution of the graph's request.
pub fn format_route(graph: &PageGraph) -> Vec<String> {
    let request = graph.request();
    let mut lines = Vec::new();

    let mut uri = request.path.clone();
    if !request.query.is_empty() {
        uri.push('?');
        uri.push_str(&request.query);
    }
    lines.push(format!("Request: {}", uri));
    if !request.sub_path.is_empty() {
        lines.push(format!("    Sub-path: {}", request.sub_path));
    }

    let route = graph.route_path();
    lines.push(format!("Route: {}", if route.is_empty() { "(home)" } else { route }));
    for (key, value) in graph.params() {
        lines.push(format!("    {} = {}", key, value));
    }

    match graph.active() {
        Some(page) => {
            lines.push(format!("Active: {} → {}", page.path, page.url));
            for (key, value) in page.metadata.iter() {
                lines.push(format!("    {}: {}", key, first_line(value)));
            }
        }
        None => lines.push("Active: none".to_string()),
    }
    lines.push(format!(
        "Not found: {}",
        if graph.not_found() { "yes" } else { "no" }
    ));
    lines
}

/// First line of a value, marked with `...` when more follows.
fn first_line(value: &str) -> String {
    match value.split_once('\n') {
        Some((first, _)) => format!("{}...", first),
        None => value.to_string(),
    }
}

pub fn print_route(graph: &PageGraph) {
    for line in format_route(graph) {
        println!("{}", line);
    }
}

/// JSON view of a routed request.
#[derive(Debug, Serialize)]
pub struct RouteSummary<'a> {
    pub request: &'a str,
    pub route: &'a str,
    pub params: &'a BTreeMap<String, String>,
    pub active: Option<PageSummary>,
    pub not_found: bool,
}

/// JSON view of one page.
#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub path: String,
    pub url: String,
    pub id: String,
    pub template: String,
    pub depth: usize,
    pub visible: bool,
    pub metadata: Metadata,
    pub files: Vec<String>,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        Self {
            path: page.path.clone(),
            url: page.url.clone(),
            id: page.id.clone(),
            template: page.template.clone(),
            depth: page.depth,
            visible: page.visible,
            metadata: page.metadata.clone(),
            files: page.files.keys().map(str::to_string).collect(),
        }
    }
}

pub fn route_summary(graph: &PageGraph) -> RouteSummary<'_> {
    RouteSummary {
        request: &graph.request().path,
        route: graph.route_path(),
        params: graph.params(),
        active: graph.active().map(|p| PageSummary::from(p.as_ref())),
        not_found: graph.not_found(),
    }
}

// ============================================================================
// Check
// ============================================================================

/// One-line summary of a built graph.
///
/// ```text
/// Checked 10 pages (8 visible, 2 hidden, 1 virtual), 4 attachments
/// ```
pub fn format_check(graph: &PageGraph) -> Vec<String> {
    let pages = graph.pages();
    let virtual_pages = pages.values().filter(|p| p.is_virtual()).count();
    vec![format!(
        "Checked {} ({} visible, {} hidden, {} virtual), {}",
        plural(pages.len(), "page"),
        pages.visible().len(),
        pages.invisible().len(),
        virtual_pages,
        plural(graph.file_count(), "attachment"),
    )]
}

pub fn print_check(graph: &PageGraph) {
    for line in format_check(graph) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
