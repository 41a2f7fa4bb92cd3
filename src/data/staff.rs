//! Staff tracker CSV access.
//!
//! Loads the tracker into memory with trimmed headers and a normalized
//! ("clean") name per row. Name matching scans the query text for the
//! longest clean name it contains — queries usually embed the name inside
//! a sentence ("what is the psa expiry for John Smith?").

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::AppError;

const NAME_COLUMN: &str = "Name";

static PARENS_RE: OnceLock<Regex> = OnceLock::new();

/// Normalize a name for matching: drop parenthesized segments ("John Smith
/// (nights)"), collapse whitespace, lowercase.
pub fn clean_name(name: &str) -> String {
    let re = PARENS_RE.get_or_init(|| Regex::new(r"\s*\([^)]*\)").unwrap());
    let stripped = re.replace_all(name, "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The staff tracker, loaded once per query run.
#[derive(Debug)]
pub struct StaffDirectory {
    columns: Vec<String>,
    /// lowercase header -> index, for case-insensitive column resolution.
    col_lookup: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
    /// Clean name per row, parallel to `rows`.
    clean_names: Vec<String>,
    name_col: usize,
}

impl StaffDirectory {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::Data(format!("cannot open staff tracker {}: {e}", path.display()))
        })?;
        let dir = Self::from_reader(file)?;
        debug!(rows = dir.rows.len(), path = %path.display(), "staff tracker loaded");
        Ok(dir)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| AppError::Data(format!("staff tracker headers: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let col_lookup: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.to_lowercase(), i))
            .collect();

        let name_col = *col_lookup
            .get(&NAME_COLUMN.to_lowercase())
            .ok_or_else(|| AppError::Data("staff tracker is missing a 'Name' column".into()))?;

        let mut rows = Vec::new();
        let mut clean_names = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| AppError::Data(format!("staff tracker row: {e}")))?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(columns.len(), String::new());
            clean_names.push(clean_name(row.get(name_col).map(String::as_str).unwrap_or("")));
            rows.push(row);
        }

        Ok(Self {
            columns,
            col_lookup,
            rows,
            clean_names,
            name_col,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All display names, in file order, blanks skipped.
    pub fn names(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r[self.name_col].as_str())
            .filter(|n| !n.trim().is_empty())
            .collect()
    }

    /// The row whose clean name is the longest substring of the query.
    pub fn find_best_name_in_text(&self, text: &str) -> Option<usize> {
        let haystack = text.to_lowercase();
        let mut best: Option<usize> = None;
        let mut best_len = 0usize;
        for (idx, name) in self.clean_names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            if haystack.contains(name.as_str()) && name.len() > best_len {
                best = Some(idx);
                best_len = name.len();
            }
        }
        best
    }

    /// Display name for a row (the raw `Name` cell).
    pub fn display_name(&self, row: usize) -> &str {
        self.rows
            .get(row)
            .map(|r| r[self.name_col].as_str())
            .unwrap_or("")
    }

    /// Canonical header for `wanted`, matched case-insensitively.
    pub fn resolve_column(&self, wanted: &str) -> Option<&str> {
        self.col_lookup
            .get(&wanted.trim().to_lowercase())
            .map(|&i| self.columns[i].as_str())
    }

    /// The subset of `wanted` columns that actually exist, in request order.
    pub fn columns_present(&self, wanted: &[&str]) -> Vec<String> {
        wanted
            .iter()
            .filter_map(|w| self.resolve_column(w))
            .map(str::to_string)
            .collect()
    }

    /// First column whose header contains `needle` (case-insensitive).
    pub fn first_column_containing(&self, needle: &str) -> Option<&str> {
        let needle = needle.to_lowercase();
        self.columns
            .iter()
            .find(|c| c.to_lowercase().contains(&needle))
            .map(String::as_str)
    }

    /// Cell value for (row, canonical column). Empty cells yield `Some("")`.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let &col = self.col_lookup.get(&column.trim().to_lowercase())?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}
