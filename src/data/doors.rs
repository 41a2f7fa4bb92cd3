//! Door worksheet access and search.
//!
//! The door spreadsheet has one tab per site and hand-maintained headers
//! that vary between tabs ("Description per C-Cure", "Location
//! Description", stray NBSPs, trailing spaces). Loading normalizes every
//! header and maps it through an alias table onto a canonical record
//! shape; anything unrecognized is dropped.

use std::sync::Arc;

use tracing::debug;

use crate::cache::TtlCache;
use crate::config::DoorsConfig;
use crate::data::sheets::{SheetsClient, Table};
use crate::error::AppError;

/// Canonical door row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorRecord {
    pub site: String,
    pub door_id: String,
    pub description: String,
    pub location: String,
    pub cameras_in: String,
    pub cameras_out: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Canon {
    DoorId,
    Description,
    Location,
    CamerasIn,
    CamerasOut,
}

/// Normalize a header: lowercase, NBSP to space, every non-alphanumeric
/// run collapses to a single space.
fn normalize_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Normalized header -> canonical column. Aliases cover the variants seen
/// across the PPK1/PPK2/Expansion tabs.
fn canonical_column(normalized: &str) -> Option<Canon> {
    match normalized {
        "door id" => Some(Canon::DoorId),
        "description per ccure"
        | "description per c cure"
        | "description per cure"
        | "description percure"
        | "description" => Some(Canon::Description),
        "location description" | "location" => Some(Canon::Location),
        "cameras in" => Some(Canon::CamerasIn),
        "cameras out" => Some(Canon::CamerasOut),
        _ => None,
    }
}

fn clean_cell(s: &str) -> String {
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// All door records across tabs, deduplicated.
#[derive(Debug)]
pub struct DoorDirectory {
    records: Vec<DoorRecord>,
}

impl DoorDirectory {
    /// Build from one table per site label.
    pub fn from_tables(tables: Vec<(String, Table)>) -> Self {
        let mut records: Vec<DoorRecord> = Vec::new();

        for (site, table) in tables {
            let mapping: Vec<Option<Canon>> = table
                .headers()
                .iter()
                .map(|h| canonical_column(&normalize_header(h)))
                .collect();

            for row in table.rows() {
                let mut rec = DoorRecord {
                    site: site.clone(),
                    door_id: String::new(),
                    description: String::new(),
                    location: String::new(),
                    cameras_in: String::new(),
                    cameras_out: String::new(),
                };
                for (col, canon) in mapping.iter().enumerate() {
                    let Some(canon) = canon else { continue };
                    let value = clean_cell(&row[col]);
                    match canon {
                        Canon::DoorId => rec.door_id = value,
                        Canon::Description => rec.description = value,
                        Canon::Location => rec.location = value,
                        Canon::CamerasIn => rec.cameras_in = value,
                        Canon::CamerasOut => rec.cameras_out = value,
                    }
                }

                // Rows with no id, description, or location are sheet noise.
                if rec.door_id.is_empty() && rec.description.is_empty() && rec.location.is_empty()
                {
                    continue;
                }
                if !records.contains(&rec) {
                    records.push(rec);
                }
            }
        }

        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DoorRecord] {
        &self.records
    }

    /// Case-insensitive substring match on id, description, or location.
    pub fn find_by_text(&self, query: &str, limit: usize) -> Vec<&DoorRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return vec![];
        }
        self.records
            .iter()
            .filter(|r| {
                r.door_id.to_lowercase().contains(&q)
                    || r.description.to_lowercase().contains(&q)
                    || r.location.to_lowercase().contains(&q)
            })
            .take(limit)
            .collect()
    }

    /// Exact door id match, case-insensitive.
    pub fn find_by_id(&self, door_id: &str, limit: usize) -> Vec<&DoorRecord> {
        let d = door_id.trim().to_lowercase();
        if d.is_empty() {
            return vec![];
        }
        self.records
            .iter()
            .filter(|r| r.door_id.to_lowercase() == d)
            .take(limit)
            .collect()
    }
}

// ── Source (fetch + cache) ───────────────────────────────────────────────────

enum Inner {
    Remote {
        client: SheetsClient,
        config: DoorsConfig,
    },
    /// Pre-built directory — fixtures and tests.
    Fixed(Arc<DoorDirectory>),
}

/// Owns the door worksheets: fetches every configured tab and keeps one
/// cached snapshot for the configured TTL.
pub struct DoorSource {
    inner: Inner,
    cache: TtlCache<DoorDirectory>,
}

impl DoorSource {
    pub fn new(client: SheetsClient, config: DoorsConfig, ttl: std::time::Duration) -> Self {
        Self {
            inner: Inner::Remote { client, config },
            cache: TtlCache::new(ttl),
        }
    }

    pub fn fixed(directory: DoorDirectory) -> Self {
        Self {
            inner: Inner::Fixed(Arc::new(directory)),
            cache: TtlCache::new(std::time::Duration::ZERO),
        }
    }

    /// The current directory snapshot, fetching if the cache is stale.
    /// `refresh` forces a reload first.
    pub async fn load(&self, refresh: bool) -> Result<Arc<DoorDirectory>, AppError> {
        let (client, config) = match &self.inner {
            Inner::Fixed(directory) => return Ok(Arc::clone(directory)),
            Inner::Remote { client, config } => (client, config),
        };

        if refresh {
            self.cache.invalidate();
        }
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }

        if config.sheet_id.is_empty() {
            return Err(AppError::Sheets("no doors sheet configured".into()));
        }

        let mut tables = Vec::with_capacity(config.tabs.len());
        for tab in &config.tabs {
            let table = client.fetch_table(&config.sheet_id, tab).await?;
            debug!(site = %tab, rows = table.rows().len(), "door tab loaded");
            tables.push((tab.clone(), table));
        }

        Ok(self.cache.store(DoorDirectory::from_tables(tables)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(data: &[&[&str]]) -> Table {
        Table::from_rows(
            data.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn directory() -> DoorDirectory {
        let ppk1 = table(&[
            &["Door ID", "Description per C-Cure", "Location Description", "Cameras IN", "Cameras OUT"],
            &["032E", "East fire exit", "Block E ground", "204", "205"],
            &["D0-17", "Loading bay roller", "Dock", "", "389"],
            &["", "", "", "", ""],
        ]);
        let ppk2 = table(&[
            &["Door ID", "Description", "Location", "Cameras in ", "Cameras out "],
            &["052A", "Main reception", "Front of house", "12", ""],
            &["032E", "East fire exit", "Block E ground", "204", "205"],
        ]);
        DoorDirectory::from_tables(vec![("PPK1".into(), ppk1), ("PPK2".into(), ppk2)])
    }

    #[test]
    fn normalize_header_collapses_punctuation() {
        assert_eq!(normalize_header("Description per C-Cure"), "description per c cure");
        assert_eq!(normalize_header("  Cameras\u{00A0}IN  "), "cameras in");
        assert_eq!(normalize_header("Door_ID"), "door id");
    }

    #[test]
    fn alias_variants_resolve() {
        assert!(canonical_column("description per ccure").is_some());
        assert!(canonical_column("location description").is_some());
        assert!(canonical_column("completely unrelated").is_none());
    }

    #[test]
    fn empty_rows_are_dropped() {
        let dir = directory();
        // 4 data rows survive out of 5 (one blank)
        assert_eq!(dir.records().len(), 4);
    }

    #[test]
    fn find_by_text_matches_id_description_location() {
        let dir = directory();
        assert_eq!(dir.find_by_text("032E", 10).len(), 2);
        assert_eq!(dir.find_by_text("roller", 10).len(), 1);
        assert_eq!(dir.find_by_text("front of house", 10).len(), 1);
        assert!(dir.find_by_text("no such door", 10).is_empty());
    }

    #[test]
    fn find_by_id_is_exact() {
        let dir = directory();
        assert_eq!(dir.find_by_id("032e", 10).len(), 2);
        assert!(dir.find_by_id("032", 10).is_empty());
    }

    #[test]
    fn duplicate_across_tabs_kept_per_site() {
        // Same door row in both tabs differs by site, so both survive.
        let dir = directory();
        let hits = dir.find_by_id("032E", 10);
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].site, hits[1].site);
    }

    #[test]
    fn identical_rows_within_site_deduplicated() {
        let t = table(&[
            &["Door ID", "Description"],
            &["D1", "Same"],
            &["D1", "Same"],
        ]);
        let dir = DoorDirectory::from_tables(vec![("PPK1".into(), t)]);
        assert_eq!(dir.find_by_id("D1", 10).len(), 1);
    }

    #[test]
    fn nbsp_cells_cleaned() {
        let t = table(&[
            &["Door ID", "Location"],
            &["D2", "Block\u{00A0}B"],
        ]);
        let dir = DoorDirectory::from_tables(vec![("PPK1".into(), t)]);
        let hits = dir.find_by_text("block b", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location, "Block B");
    }

    #[test]
    fn limit_respected() {
        let dir = directory();
        assert_eq!(dir.find_by_text("e", 1).len(), 1);
    }
}
