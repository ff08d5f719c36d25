//! In-memory coverage model: per-file, per-line accumulated hit counts.
//! The parser produces a `Coverage` which downstream consumers then treat
//! as read-only.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Line coverage keyed by source file path.
///
/// Paths are stored verbatim as they appear in the report (no
/// normalization). Line numbers are 1-based; hit counts are the sum of all
/// updates received for a given (path, line) pair.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Coverage {
    files: HashMap<String, BTreeMap<u32, u64>>,
}

impl Coverage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` hits to `(path, line)`, creating entries as needed.
    ///
    /// A single update with `count = 0` still records the line: it is
    /// instrumented but unhit. Callers must pass `line >= 1`.
    pub fn add_hits(&mut self, path: &str, line: u32, count: u64) {
        if let Some(lines) = self.files.get_mut(path) {
            *lines.entry(line).or_insert(0) += count;
        } else {
            let mut lines = BTreeMap::new();
            lines.insert(line, count);
            self.files.insert(path.to_string(), lines);
        }
    }

    /// Distinct paths with at least one recorded line, sorted.
    #[must_use]
    pub fn files(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// The (line → hit count) mapping for `path`. Empty when the path is
    /// unknown.
    #[must_use]
    pub fn hits(&self, path: &str) -> &BTreeMap<u32, u64> {
        static EMPTY: BTreeMap<u32, u64> = BTreeMap::new();
        self.files.get(path).unwrap_or(&EMPTY)
    }

    /// Hit count for a single (path, line) pair, if recorded.
    #[must_use]
    pub fn line_hits(&self, path: &str, line: u32) -> Option<u64> {
        self.files.get(path).and_then(|lines| lines.get(&line).copied())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Fold another coverage in by summing hit counts.
    pub fn merge(&mut self, other: Coverage) {
        for (path, lines) in other.files {
            let target = self.files.entry(path).or_default();
            for (line, count) in lines {
                *target.entry(line).or_insert(0) += count;
            }
        }
    }
}
