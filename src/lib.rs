//! # Flatfolio
//!
//! A flat-file content engine. Your filesystem is the database: directories
//! become pages, numeric prefixes order them and mark them visible, and a
//! plain key/value file in each directory gives the page its metadata.
//!
//! # Architecture: Scan, Build, Route, Query
//!
//! ```text
//! 1. Scan    content/   →  TreeNode         (directories → ordered tree)
//! 2. Build   TreeNode   →  PageGraph        (one Page per canonical path)
//! 3. Route   Request    →  active Page      (exact match, home, error page)
//! 4. Query   Pages      →  Pages            (filter, sort, slice; never mutates)
//! ```
//!
//! A [`graph::PageGraph`] is built per request and dropped with it. Nothing
//! is global: configuration is loaded once and passed by reference.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Walks the content directory into raw and canonical trees, flattens them depth-first |
//! | [`graph`] | Builds every page and resolves the active one from the request |
//! | [`page`] | The page type: metadata, attachments, on-demand relations |
//! | [`router`] | Request parsing: sub-path stripping, rewrite mode, `key:value` parameters |
//! | [`collection`] | Ordered, copy-on-filter collection with chainable queries |
//! | [`files`] | Attachment items: files, images with dimensions, sizes |
//! | [`classify`] | Extension → attachment group |
//! | [`content`] | Content file format: `-----`-separated `key: value` records |
//! | [`value`] | Typed field access (`Fields`, `Value`) used by queries |
//! | [`naming`] | `NN-name` directory convention and natural ordering |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ordering and Visibility from One Prefix
//!
//! `02-about` is ordered second and shown in menus; `about` is hidden but
//! still routable. Internally the two are kept apart (`order: Option<u32>`,
//! `visible: bool`) so no call site re-parses directory names.
//!
//! ## Natural, Locale-Independent Ordering
//!
//! Siblings are sorted by [`naming::natural_cmp`]: digit runs compare by
//! value (`2-b` before `10-a`), everything else case-insensitively. Listing
//! order is then the same on every platform.
//!
//! ## Total Queries
//!
//! [`collection::Collection`] operations never fail. Bad patterns, unknown
//! operators and out-of-range indexes give empty results, so a template can
//! chain freely and inspect the outcome.
//!
//! ## Typed Field Access
//!
//! Queries address items by field name (`sort_by("date", ..)`). Pages and
//! attachments implement [`value::Fields`], an explicit lookup that checks
//! structural fields first and metadata second.

pub mod classify;
pub mod collection;
pub mod config;
pub mod content;
pub mod files;
pub mod graph;
pub mod naming;
pub mod output;
pub mod page;
pub mod router;
pub mod tree;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;
