// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Natural ("human") ordering of filename stems.
//
// A stem is cut into segments on whitespace, `-`, `_` and every other
// non-word character; each segment is cut further into digit and non-digit
// runs. Digit runs compare numerically, so "D2" sorts before "D10".
//
// Token order is fixed: Boundary < Int < Str. A Boundary is appended after
// every segment that ends in text, which makes a name that is a prefix of
// another ("D" vs "DX-1") sort first instead of comparing unrelated tokens.
// Two integers from different segments are kept apart by an empty string
// token so "1-2" never compares equal to "12".

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use pagestamp_core::types::stem_of;
use tracing::trace;

/// Digit run compared by numeric value, of any length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digits(String);

impl Digits {
    fn new(run: &str) -> Self {
        let trimmed = run.trim_start_matches('0');
        Self(if trimmed.is_empty() { "0" } else { trimmed }.to_owned())
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One element of a [`NaturalKey`]. Variant order is the comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// End of a text-terminated segment; lower than everything else.
    Boundary,
    Int(Digits),
    Str(String),
}

/// Composite sort key for a filename stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NaturalKey(Vec<Token>);

impl NaturalKey {
    pub fn new(stem: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();

        for segment in stem.split(is_separator).filter(|s| !s.is_empty()) {
            for (is_digit, run) in runs(segment) {
                if is_digit {
                    if matches!(tokens.last(), Some(Token::Int(_))) {
                        tokens.push(Token::Str(String::new()));
                    }
                    tokens.push(Token::Int(Digits::new(run)));
                } else {
                    tokens.push(Token::Str(run.to_owned()));
                }
            }
            if matches!(tokens.last(), Some(Token::Str(_))) {
                tokens.push(Token::Boundary);
            }
        }

        trace!(stem, ?tokens, "natural key");
        Self(tokens)
    }

    /// Key for the stem of `path`.
    pub fn for_path(path: &Path) -> Self {
        Self::new(&stem_of(path))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_separator(c: char) -> bool {
    c == '_' || !c.is_alphanumeric()
}

/// Maximal runs of ASCII digits and non-digits, in order.
fn runs(segment: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = segment;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some((is_digit, run))
    })
}

/// Stable sort of paths by the natural key of their stems.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| NaturalKey::for_path(p));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(stem: &str) -> NaturalKey {
        NaturalKey::new(stem)
    }

    fn sorted(stems: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = stems.iter().map(|s| s.to_string()).collect();
        v.sort_by_cached_key(|s| key(s));
        v
    }

    #[test]
    fn numbers_compare_by_magnitude() {
        assert!(key("D2") < key("D10"));
        assert!(key("item2") < key("item10"));
        assert!(key("D1") < key("D2"));
        assert_eq!(sorted(&["D10", "D2", "D1"]), ["D1", "D2", "D10"]);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert!(key("D1") < key("D10"));
        assert!(key("D") < key("DX"));
        assert!(key("D-X") < key("DX"));
        assert!(key("L1") < key("L1-VENDOR"));
    }

    #[test]
    fn tokens_match_segmentation() {
        assert_eq!(
            key("L1-VENDOR-FIXTURE").tokens(),
            [
                Token::Str("L".into()),
                Token::Int(Digits::new("1")),
                Token::Str("VENDOR".into()),
                Token::Boundary,
                Token::Str("FIXTURE".into()),
                Token::Boundary,
            ]
        );
    }

    #[test]
    fn adjacent_integer_segments_stay_apart() {
        assert_eq!(
            key("1-2").tokens(),
            [
                Token::Int(Digits::new("1")),
                Token::Str(String::new()),
                Token::Int(Digits::new("2")),
            ]
        );
        assert_ne!(key("1-2"), key("12"));
        assert!(key("1-2") < key("12"));
    }

    #[test]
    fn edge_cases() {
        assert!(key("").is_empty());
        assert!(key("--_ .").is_empty());
        assert!(key("") < key("a"));
        assert_eq!(
            key("abc").tokens(),
            [Token::Str("abc".into()), Token::Boundary]
        );
        assert_eq!(key("a--b"), key("a b"));
    }

    #[test]
    fn huge_and_zero_padded_numbers() {
        assert!(key("p99999999999999999999998") < key("p99999999999999999999999"));
        assert!(key("p9") < key("p99999999999999999999999"));
        assert_eq!(key("p007"), key("p7"));
        assert!(key("p0") < key("p00001"));
    }

    #[test]
    fn ordering_is_total() {
        let stems = [
            "", "a", "A", "1", "01", "1a", "a1", "a-1", "a_1", "1-2", "12", "D1", "D10", "D-X",
            "DX", "L1-x", "L2-x", "x y", "é2", "页3",
        ];
        let keys: Vec<NaturalKey> = stems.iter().map(|s| key(s)).collect();
        for a in &keys {
            assert_eq!(a.cmp(a), Ordering::Equal);
            for b in &keys {
                assert_eq!(a.cmp(b), b.cmp(a).reverse());
                for c in &keys {
                    if a <= b && b <= c {
                        assert!(a <= c, "{a:?} <= {b:?} <= {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn sort_paths_uses_stems_and_is_stable() {
        let mut paths = vec![
            PathBuf::from("z/L2-x.pdf"),
            PathBuf::from("a/L1-x.pdf"),
            PathBuf::from("b/D1-x.pdf"),
            PathBuf::from("c/L1-x.pdf"),
        ];
        sort_paths(&mut paths);
        assert_eq!(
            paths,
            [
                PathBuf::from("b/D1-x.pdf"),
                PathBuf::from("a/L1-x.pdf"),
                PathBuf::from("c/L1-x.pdf"),
                PathBuf::from("z/L2-x.pdf"),
            ]
        );
    }
}
