//! Directory-name parsing for the `NN-segment` ordering convention.
//!
//! Every content directory may carry a numeric ordering prefix:
//!
//! - `02-about` → order `Some(2)`, segment `about`, visible
//! - `notes` → order `None`, segment `notes`, hidden
//!
//! The prefix does two jobs on disk (ordering and visibility). Here it is
//! split into two explicit fields on [`ParsedName`] so call sites never
//! re-run the pattern.
//!
//! ## Sibling Ordering
//!
//! Siblings are ordered by [`natural_cmp`] on the *raw* directory name:
//! digit runs compare numerically, everything else compares
//! case-insensitively. `2-b` sorts before `10-a`, `Apple` next to `apple`.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)-([\p{L}\p{N}_-]+)$").expect("static pattern"));

/// Result of parsing a directory name like `02-about`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Ordering prefix if present (e.g. `2` from `02-about`).
    pub order: Option<u32>,
    /// Canonical segment: the name with the prefix stripped, or the raw
    /// name when there is no prefix.
    pub segment: String,
    /// True when the name carries an ordering prefix.
    pub visible: bool,
}

impl ParsedName {
    /// Numeric prefix, `0` for hidden entries.
    pub fn prefix(&self) -> u32 {
        self.order.unwrap_or(0)
    }
}

/// Parse a directory name following the `NN-segment` convention.
///
/// - `"02-about"` → order=Some(2), segment="about", visible
/// - `"010-my_page"` → order=Some(10), segment="my_page", visible
/// - `"notes"` → order=None, segment="notes", hidden
/// - `"001"` → order=None, segment="001", hidden (nothing after the prefix)
/// - `"01-a b"` → order=None, segment="01-a b", hidden (space is not a segment character)
/// - `"99999999999-x"` → order=Some(u32::MAX), segment="x", visible
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(caps) = PREFIXED.captures(name) {
        // Digits only, so the parse can fail on overflow alone.
        let order = caps[1].parse::<u32>().unwrap_or(u32::MAX);
        return ParsedName {
            order: Some(order),
            segment: caps[2].to_string(),
            visible: true,
        };
    }
    ParsedName {
        order: None,
        segment: name.to_string(),
        visible: false,
    }
}

/// Case-insensitive natural comparison.
///
/// Locale independent. Runs of ASCII digits are compared by numeric value
/// (leading zeros ignored), other characters by their lowercase form. Names
/// that compare equal this way fall back to plain byte order so the result
/// is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ord = cmp_digit_runs(&l_run, &r_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
