//! Request parsing.
//!
//! Turns an inbound request into the canonical path to look up plus the
//! `key:value` parameters embedded in it:
//!
//! ```text
//! /site/blog/tag:rust/page:2?utm=x      sub-path "site", rewrite on
//!   → strip query           /site/blog/tag:rust/page:2
//!   → trim slashes          site/blog/tag:rust/page:2
//!   → strip sub-path        blog/tag:rust/page:2
//!   → extract parameters    blog            {tag: rust, page: 2}
//! ```
//!
//! With rewrite off the raw query string (`?blog/tag:rust`) is routed
//! instead of the path. Segments and parameters are percent-decoded, `+`
//! decoding to a space.
//!
//! Resolving the path to a page is the graph's job (see
//! [`PageGraph::active`](crate::graph::PageGraph::active)).

use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// The parts of an inbound request the router looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Request path, possibly still carrying a query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
    /// Mount point of the site below the host root.
    pub sub_path: String,
}

impl Request {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            sub_path: String::new(),
        }
    }

    /// Split a request URI (`/a/b?x=1`) into path and query string.
    pub fn from_uri(uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(uri, ""),
        }
    }

    pub fn with_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = sub_path.into();
        self
    }
}

/// A parsed request: lookup path and extracted parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    /// Canonical path to look up; empty for the home page.
    pub path: String,
    pub params: BTreeMap<String, String>,
}

/// Parse a request into a [`Route`].
pub fn parse_route(request: &Request, rewrite: bool) -> Route {
    let raw = if rewrite {
        strip_sub_path(request_path(&request.path), &request.sub_path)
    } else {
        request.query.trim_matches('/')
    };

    let mut params = BTreeMap::new();
    let mut segments = Vec::new();
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        match segment.split_once(':') {
            Some((key, value)) => {
                params.insert(decode(key), decode(value));
            }
            None => segments.push(decode(segment)),
        }
    }

    Route {
        path: segments.join("/"),
        params,
    }
}

fn request_path(path: &str) -> &str {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.trim_matches('/')
}

/// Remove the mount prefix, on segment boundaries only.
fn strip_sub_path<'a>(path: &'a str, sub_path: &str) -> &'a str {
    let sub = sub_path.trim_matches('/');
    if sub.is_empty() {
        return path;
    }
    if path == sub {
        return "";
    }
    match path.strip_prefix(sub) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => path,
    }
}

/// Percent-decode a URL component, treating `+` as a space.
pub fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
