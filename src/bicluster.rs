//! # Biclusters
//!
//! A bicluster is a pair of ascending row and column index lists. Its
//! canonical text form, `(rows: [0 3] cols: [1 2 7])`, is the key used by the
//! per-bicluster caches; a list of biclusters is keyed by joining those forms
//! with `", "`.

use std::fmt;

use crate::error::{MoebaError, Result};

/// A (rows, cols) pair, both sorted ascending.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bicluster {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl Bicluster {
    /// Builds a bicluster, sorting both index lists.
    pub fn new(mut rows: Vec<usize>, mut cols: Vec<usize>) -> Self {
        rows.sort_unstable();
        cols.sort_unstable();
        Self { rows, cols }
    }

    /// A bicluster with no rows or no columns.
    pub fn is_degenerate(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Number of cells covered.
    pub fn size(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// Smallest row index, if any.
    pub fn min_row(&self) -> Option<usize> {
        self.rows.first().copied()
    }

    /// Canonical cache key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Canonical form of the column list alone.
    pub fn columns_key(&self) -> String {
        format!("[{}]", join(&self.cols))
    }
}

impl fmt::Display for Bicluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(rows: [{}] cols: [{}])", join(&self.rows), join(&self.cols))
    }
}

fn join(values: &[usize]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical key of a whole bicluster list.
pub fn biclusters_key(biclusters: &[Bicluster]) -> String {
    biclusters
        .iter()
        .map(Bicluster::key)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Numbered form handed to result writers:
/// `Bicluster0: (rows: [..] cols: [..]), Bicluster1: ...`.
pub fn format_translated(biclusters: &[Bicluster]) -> String {
    biclusters
        .iter()
        .enumerate()
        .map(|(i, b)| format!("Bicluster{}: {}", i, b))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads back the output of [`format_translated`].
pub fn parse_biclusters(text: &str) -> Result<Vec<Bicluster>> {
    let mut biclusters = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("Bicluster") {
        rest = &rest[start + "Bicluster".len()..];
        let open = rest
            .find('(')
            .ok_or_else(|| MoebaError::Data(format!("missing '(' in {:?}", text)))?;
        let close = rest
            .find(')')
            .ok_or_else(|| MoebaError::Data(format!("missing ')' in {:?}", text)))?;
        let body = &rest[open + 1..close];

        let rows = bracketed(body, "rows:")?;
        let cols = bracketed(body, "cols:")?;
        biclusters.push(Bicluster::new(rows, cols));
        rest = &rest[close + 1..];
    }

    Ok(biclusters)
}

fn bracketed(body: &str, label: &str) -> Result<Vec<usize>> {
    let at = body
        .find(label)
        .ok_or_else(|| MoebaError::Data(format!("missing {} in {:?}", label, body)))?;
    let tail = &body[at + label.len()..];
    let open = tail
        .find('[')
        .ok_or_else(|| MoebaError::Data(format!("missing '[' after {}", label)))?;
    let close = tail
        .find(']')
        .ok_or_else(|| MoebaError::Data(format!("missing ']' after {}", label)))?;

    tail[open + 1..close]
        .split_whitespace()
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|e| MoebaError::Data(format!("bad index {:?}: {}", token, e)))
        })
        .collect()
}
