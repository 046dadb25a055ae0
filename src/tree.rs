//! Content tree scanning.
//!
//! Walks the content directory and mirrors its **directories** (files are
//! ignored at this stage) into a [`TreeNode`] hierarchy, then derives the
//! canonical form and the flat, depth-first list of page paths.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── 01-home/                 # visible, canonical "home"
//! │   └── home.md
//! ├── 02-blog/                 # visible, canonical "blog"
//! │   ├── blog.md
//! │   ├── 01-first-post/       # canonical "blog/first-post"
//! │   │   ├── article.md
//! │   │   └── photo.jpg
//! │   └── 02-second-post/
//! │       └── article.md
//! ├── error/                   # hidden (no prefix), canonical "error"
//! │   └── error.md
//! └── 03-archive/              # visible, no content file: virtual page
//!     └── 01-2019/
//!         └── archive.md
//! ```
//!
//! ## Stages
//!
//! 1. [`scan`]: raw tree, children in natural order of their raw names.
//! 2. [`convert`]: canonical tree, keys stripped of their `NN-` prefix.
//! 3. [`hide`]: visible-only tree, for navigation menus.
//! 4. [`builder`] / [`entries`]: depth-first pre-order list of paths. Every
//!    node is emitted (not only leaves) and parents come before children, so
//!    a page's ancestors always exist before the page itself.
//!
//! ## Duplicate Segments
//!
//! `01-about` and `02-about` both map to `about`. The first in natural order
//! keeps the segment; later ones are dropped from the canonical tree with a
//! warning and get no page.

use crate::naming::{natural_cmp, parse_entry_name};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// One directory of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Raw directory name (empty for the root).
    pub name: String,
    /// Key under the parent: the raw name in a scanned tree, the canonical
    /// segment in a converted one.
    pub key: String,
    /// Ordering prefix, if the name carries one.
    pub order: Option<u32>,
    /// True when the raw name carries an ordering prefix.
    pub visible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn root() -> Self {
        Self {
            name: String::new(),
            key: String::new(),
            order: None,
            visible: true,
            children: Vec::new(),
        }
    }

    fn from_dir_name(name: &str) -> Self {
        let parsed = parse_entry_name(name);
        Self {
            name: name.to_string(),
            key: name.to_string(),
            order: parsed.order,
            visible: parsed.visible,
            children: Vec::new(),
        }
    }

    /// Child by key.
    pub fn child(&self, key: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.key == key)
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// A flattened tree node: canonical path plus the raw relative path backing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// `/`-joined canonical segments.
    pub path: String,
    /// `/`-joined raw directory names, relative to the content root.
    pub raw: String,
    pub order: Option<u32>,
    pub visible: bool,
}

/// Scan a content directory into a raw tree.
pub fn scan(root: &Path) -> Result<TreeNode, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut tree = TreeNode::root();
    tree.children = scan_children(root)?;
    tracing::debug!(
        root = %root.display(),
        directories = tree.descendant_count(),
        "content tree scanned"
    );
    Ok(tree)
}

fn scan_children(dir: &Path) -> Result<Vec<TreeNode>, ScanError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| {
            natural_cmp(
                &a.file_name().to_string_lossy(),
                &b.file_name().to_string_lossy(),
            )
        });

    let mut children = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let mut node = TreeNode::from_dir_name(&name);
        node.children = scan_children(entry.path())?;
        children.push(node);
    }
    Ok(children)
}

/// Canonical form: every key becomes the prefix-stripped segment.
/// Unprefixed names keep their raw name as key.
pub fn convert(tree: &TreeNode) -> TreeNode {
    let mut seen = HashSet::new();
    let mut children = Vec::with_capacity(tree.children.len());
    for child in &tree.children {
        let segment = parse_entry_name(&child.name).segment;
        if !seen.insert(segment.clone()) {
            tracing::warn!(
                directory = %child.name,
                segment = %segment,
                "duplicate page segment, directory skipped"
            );
            continue;
        }
        let mut converted = convert(child);
        converted.key = segment;
        children.push(converted);
    }
    TreeNode {
        children,
        ..tree.clone_shallow()
    }
}

/// Visible-only tree: keeps nodes whose raw name carries an ordering prefix,
/// and recursively only their visible descendants.
pub fn hide(tree: &TreeNode) -> TreeNode {
    TreeNode {
        children: tree
            .children
            .iter()
            .filter(|c| c.visible)
            .map(hide)
            .collect(),
        ..tree.clone_shallow()
    }
}

impl TreeNode {
    fn clone_shallow(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            order: self.order,
            visible: self.visible,
            children: Vec::new(),
        }
    }
}

/// Depth-first pre-order list of `/`-joined key paths, one per node below
/// the root.
pub fn builder(tree: &TreeNode) -> Vec<String> {
    entries(tree).into_iter().map(|e| e.path).collect()
}

/// Like [`builder`], pairing each key path with its raw path.
pub fn entries(tree: &TreeNode) -> Vec<TreeEntry> {
    let mut out = Vec::new();
    collect_entries(tree, "", "", &mut out);
    out
}

fn collect_entries(node: &TreeNode, path: &str, raw: &str, out: &mut Vec<TreeEntry>) {
    for child in &node.children {
        let child_path = join(path, &child.key);
        let child_raw = join(raw, &child.name);
        out.push(TreeEntry {
            path: child_path.clone(),
            raw: child_raw.clone(),
            order: child.order,
            visible: child.visible,
        });
        collect_entries(child, &child_path, &child_raw, out);
    }
}

fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}/{segment}")
    }
}
