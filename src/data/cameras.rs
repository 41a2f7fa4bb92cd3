//! Camera worksheet access and search.
//!
//! Site sheets are maintained by hand and drift in layout: some have clean
//! "Camera Number"/"Camera Name" columns, some bury the number inside the
//! description, and at least one uses camera titles as column headers.
//! Search therefore works in layers — inferred columns first, then any
//! cell, then the headers-as-titles layout.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::CameraSiteConfig;
use crate::data::sheets::{SheetsClient, Table};
use crate::error::AppError;

/// Candidate headers for the camera-number column, in preference order.
const NUMBER_CANDIDATES: &[&str] = &[
    "Camera Number",
    "Number",
    "#",
    "ID",
    "Cam Number",
    "Cam No",
    "Camera #",
    "Camera ID",
];

/// Candidate headers for the name/description column, in preference order.
const NAME_CANDIDATES: &[&str] = &[
    "Camera Name",
    "Name",
    "Description",
    "Camera Description",
    "Cam Name",
    "Cam Description",
    "Title",
];

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CameraHit {
    pub site: String,
    pub number: String,
    pub name: String,
}

#[derive(Debug)]
struct SiteTable {
    label: String,
    table: Table,
}

/// All camera worksheets, one table per site.
#[derive(Debug)]
pub struct CameraDirectory {
    sites: Vec<SiteTable>,
}

impl CameraDirectory {
    pub fn from_tables(tables: Vec<(String, Table)>) -> Self {
        Self {
            sites: tables
                .into_iter()
                .map(|(label, table)| SiteTable { label, table })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.iter().all(|s| s.table.is_empty())
    }

    /// Search by camera number or name/description fragment.
    ///
    /// If the query names a site, only that site is searched. If the query
    /// contains a bare number, that number is forced as the displayed
    /// camera number — headers sometimes embed stray numbers like "(389)".
    pub fn search(&self, query: &str, limit: usize) -> Vec<CameraHit> {
        let q = query.trim();
        if q.is_empty() {
            return vec![];
        }

        let mut ql = q.to_lowercase();
        let wanted_digits = digits_from_query(q);

        let mut out: Vec<CameraHit> = Vec::new();
        let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
        let wanted_site = self.site_from_query(&ql);

        // The site token is routing, not search text: "ppk2 204" must
        // match cells containing "204", not "ppk2 204".
        if let Some(label) = &wanted_site {
            ql = strip_site_mention(&ql, label);
        }

        for site in &self.sites {
            if let Some(wanted) = &wanted_site {
                if &site.label != wanted {
                    continue;
                }
            }
            self.search_site(site, &ql, wanted_digits.as_deref(), &mut out, &mut seen);
        }

        out.truncate(limit.max(1));
        out
    }

    /// The configured site label the query mentions, if any.
    fn site_from_query(&self, ql: &str) -> Option<String> {
        self.sites
            .iter()
            .find(|s| site_mentioned(ql, &s.label))
            .map(|s| s.label.clone())
    }

    fn search_site(
        &self,
        site: &SiteTable,
        ql: &str,
        wanted_digits: Option<&str>,
        out: &mut Vec<CameraHit>,
        seen: &mut BTreeSet<(String, String, String)>,
    ) {
        let table = &site.table;
        let col_num = pick_column(table.headers(), NUMBER_CANDIDATES);
        let col_name = pick_column(table.headers(), NAME_CANDIDATES);

        if col_num.is_none() && col_name.is_none() {
            self.search_title_headers(site, ql, wanted_digits, out, seen);
            return;
        }

        // Primary pass: match on the inferred number/name columns.
        let mut matched: Vec<usize> = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let num_hit = col_num
                    .map(|c| row[c].to_lowercase().contains(ql))
                    .unwrap_or(false);
                let name_hit = col_name
                    .map(|c| row[c].to_lowercase().contains(ql))
                    .unwrap_or(false);
                num_hit || name_hit
            })
            .map(|(i, _)| i)
            .collect();

        // Fallback: any cell in any column.
        if matched.is_empty() {
            matched = table
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| row.iter().any(|c| c.to_lowercase().contains(ql)))
                .map(|(i, _)| i)
                .collect();
        }

        for idx in matched {
            let row = &table.rows()[idx];

            let number = match wanted_digits {
                Some(d) => d.to_string(),
                None => col_num
                    .and_then(|c| extract_cam_number(&row[c]))
                    .or_else(|| col_name.and_then(|c| extract_cam_number(&row[c])))
                    .unwrap_or_default(),
            };

            let mut name = col_name.map(|c| row[c].trim().to_string()).unwrap_or_default();
            if name.is_empty() {
                name = col_num.map(|c| row[c].trim().to_string()).unwrap_or_default();
            }

            let key = (site.label.clone(), number.clone(), name.clone());
            if seen.insert(key) {
                out.push(CameraHit {
                    site: site.label.clone(),
                    number,
                    name,
                });
            }
        }
    }

    /// Unusual layout: headers are camera titles and cells may hold other
    /// titles. Scan both and match on either.
    fn search_title_headers(
        &self,
        site: &SiteTable,
        ql: &str,
        wanted_digits: Option<&str>,
        out: &mut Vec<CameraHit>,
        seen: &mut BTreeSet<(String, String, String)>,
    ) {
        let table = &site.table;
        for row in table.rows() {
            for (col, header) in table.headers().iter().enumerate() {
                let header = header.trim();
                let value = row[col].trim();
                if header.is_empty() && value.is_empty() {
                    continue;
                }
                if !header.to_lowercase().contains(ql) && !value.to_lowercase().contains(ql) {
                    continue;
                }

                let number = match wanted_digits {
                    Some(d) => d.to_string(),
                    None => extract_cam_number(header)
                        .or_else(|| extract_cam_number(value))
                        .unwrap_or_default(),
                };
                // Prefer the longer of header/value as the display name —
                // on these sheets that is usually the camera description.
                let name = if header.len() >= value.len() {
                    header.to_string()
                } else {
                    value.to_string()
                };

                let key = (site.label.clone(), number.clone(), name.clone());
                if seen.insert(key) {
                    out.push(CameraHit {
                        site: site.label.clone(),
                        number,
                        name,
                    });
                }
            }
        }
    }
}

/// True if the query mentions the site label, with or without a space
/// before a trailing digit run ("ppk1" and "ppk 1" both hit "PPK1").
fn site_mentioned(ql: &str, label: &str) -> bool {
    let l = label.to_lowercase();
    if ql.contains(&l) {
        return true;
    }
    spaced_site_form(&l).map(|s| ql.contains(&s)).unwrap_or(false)
}

/// "ppk1" -> "ppk 1"; labels with no trailing digit run have no spaced form.
fn spaced_site_form(l: &str) -> Option<String> {
    l.find(|c: char| c.is_ascii_digit())
        .filter(|&i| i > 0)
        .map(|i| format!("{} {}", &l[..i], &l[i..]))
}

/// Remove the site mention (either form) from the query, collapsing the
/// whitespace left behind.
fn strip_site_mention(ql: &str, label: &str) -> String {
    let l = label.to_lowercase();
    let mut out = ql.replace(&l, " ");
    if let Some(spaced) = spaced_site_form(&l) {
        out = out.replace(&spaced, " ");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First header matching any candidate — exact (case-insensitive) match
/// across all candidates first, then substring.
fn pick_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    for cand in candidates {
        let cl = cand.to_lowercase();
        if let Some(i) = headers.iter().position(|h| h.to_lowercase() == cl) {
            return Some(i);
        }
    }
    for (i, header) in headers.iter().enumerate() {
        let hl = header.to_lowercase();
        if candidates.iter().any(|cand| hl.contains(&cand.to_lowercase())) {
            return Some(i);
        }
    }
    None
}

static CAM_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static QUERY_DIGITS_RE: OnceLock<Regex> = OnceLock::new();

/// Extract a camera-like number from text: "(204)" -> "204", "#204" -> "204".
fn extract_cam_number(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let re = CAM_NUMBER_RE.get_or_init(|| {
        Regex::new(r"(?:^|[^0-9])(#[ ]*\d{1,4}|\(\s*\d{1,4}\s*\)|\b\d{1,4}\b)").unwrap()
    });
    let token = re.captures(text)?.get(1)?.as_str();
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// The first bare number in the query ("204"), if any.
fn digits_from_query(q: &str) -> Option<String> {
    let re = QUERY_DIGITS_RE.get_or_init(|| Regex::new(r"\b(\d{1,6})\b").unwrap());
    re.captures(q).map(|c| c[1].to_string())
}

// ── Source (fetch + cache) ───────────────────────────────────────────────────

enum Inner {
    Remote {
        client: SheetsClient,
        sites: Vec<CameraSiteConfig>,
    },
    /// Pre-built directory — fixtures and tests.
    Fixed(Arc<CameraDirectory>),
}

/// Owns the camera worksheets: fetches per-site tables and keeps one cached
/// snapshot for the configured TTL.
pub struct CameraSource {
    inner: Inner,
    cache: TtlCache<CameraDirectory>,
}

impl CameraSource {
    pub fn new(
        client: SheetsClient,
        sites: Vec<CameraSiteConfig>,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            inner: Inner::Remote { client, sites },
            cache: TtlCache::new(ttl),
        }
    }

    pub fn fixed(directory: CameraDirectory) -> Self {
        Self {
            inner: Inner::Fixed(Arc::new(directory)),
            cache: TtlCache::new(std::time::Duration::ZERO),
        }
    }

    /// The current directory snapshot, fetching if the cache is stale.
    /// `refresh` forces a reload first.
    pub async fn load(&self, refresh: bool) -> Result<Arc<CameraDirectory>, AppError> {
        let (client, sites) = match &self.inner {
            Inner::Fixed(directory) => return Ok(Arc::clone(directory)),
            Inner::Remote { client, sites } => (client, sites),
        };

        if refresh {
            self.cache.invalidate();
        }
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }

        if sites.is_empty() {
            return Err(AppError::Sheets("no camera sites configured".into()));
        }

        let mut tables = Vec::with_capacity(sites.len());
        for site in sites {
            let table = client.fetch_table(&site.sheet_id, &site.tab).await?;
            debug!(site = %site.label, rows = table.rows().len(), "camera site loaded");
            tables.push((site.label.clone(), table));
        }

        Ok(self.cache.store(CameraDirectory::from_tables(tables)))
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

    fn two_site_directory() -> CameraDirectory {
        let ppk1 = table(&[
            &["Camera Number", "Camera Name"],
            &["204", "Lobby East"],
            &["205", "Lobby West"],
            &["389", "FLIR Perimeter"],
        ]);
        let ppk2 = table(&[
            &["Camera Number", "Camera Name"],
            &["204", "Warehouse Dock"],
        ]);
        CameraDirectory::from_tables(vec![("PPK1".into(), ppk1), ("PPK2".into(), ppk2)])
    }

    #[test]
    fn search_by_number_hits_all_sites() {
        let dir = two_site_directory();
        let hits = dir.search("204", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].site, "PPK1");
        assert_eq!(hits[1].site, "PPK2");
        assert!(hits.iter().all(|h| h.number == "204"));
    }

    #[test]
    fn site_in_query_narrows_search() {
        let dir = two_site_directory();
        let hits = dir.search("ppk2 204", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].site, "PPK2");
        // "ppk 2" with a space works too
        let hits = dir.search("ppk 2 204", 10);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn site_token_excluded_from_matching() {
        let dir = two_site_directory();
        // Cells contain "Warehouse Dock", never "ppk2 warehouse".
        let hits = dir.search("ppk2 warehouse", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Warehouse Dock");
        assert_eq!(
            strip_site_mention("ppk 2 204", "PPK2"),
            "204"
        );
    }

    #[test]
    fn search_by_name_fragment() {
        let dir = two_site_directory();
        let hits = dir.search("flir", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "FLIR Perimeter");
        assert_eq!(hits[0].number, "389");
    }

    #[test]
    fn query_digits_force_displayed_number() {
        // Name contains a stray "(389)" but the query asked for 204.
        let t = table(&[
            &["Camera Number", "Camera Name"],
            &["204", "Gatehouse (389) spare"],
        ]);
        let dir = CameraDirectory::from_tables(vec![("PPK1".into(), t)]);
        let hits = dir.search("204", 10);
        assert_eq!(hits[0].number, "204");
    }

    #[test]
    fn any_cell_fallback() {
        let t = table(&[
            &["Camera Number", "Camera Name", "Notes"],
            &["17", "Stairwell", "near loading bay"],
        ]);
        let dir = CameraDirectory::from_tables(vec![("PPK1".into(), t)]);
        let hits = dir.search("loading bay", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Stairwell");
    }

    #[test]
    fn title_header_layout() {
        // No number/name columns — headers are the camera titles.
        let t = table(&[
            &["Lobby East (204)", "Warehouse Dock (207)"],
            &["", ""],
        ]);
        let dir = CameraDirectory::from_tables(vec![("PPK2".into(), t)]);
        let hits = dir.search("warehouse", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].number, "207");
        assert_eq!(hits[0].name, "Warehouse Dock (207)");
    }

    #[test]
    fn duplicate_rows_deduplicated() {
        let t = table(&[
            &["Camera Number", "Camera Name"],
            &["204", "Lobby East"],
            &["204", "Lobby East"],
        ]);
        let dir = CameraDirectory::from_tables(vec![("PPK1".into(), t)]);
        assert_eq!(dir.search("204", 10).len(), 1);
    }

    #[test]
    fn limit_caps_results() {
        let dir = two_site_directory();
        let hits = dir.search("lobby", 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let dir = two_site_directory();
        assert!(dir.search("   ", 10).is_empty());
    }

    #[test]
    fn pick_column_exact_beats_substring() {
        let headers: Vec<String> = vec!["Old Camera Number".into(), "Number".into()];
        assert_eq!(pick_column(&headers, NUMBER_CANDIDATES), Some(1));
    }

    #[test]
    fn extract_number_variants() {
        assert_eq!(extract_cam_number("#204"), Some("204".into()));
        assert_eq!(extract_cam_number("Gatehouse (389)"), Some("389".into()));
        assert_eq!(extract_cam_number("cam 17 east"), Some("17".into()));
        assert_eq!(extract_cam_number("no digits"), None);
        assert_eq!(extract_cam_number(""), None);
    }

    #[test]
    fn remote_source_without_sites_errors() {
        let config = crate::config::SheetsConfig {
            api_base_url: "http://localhost:0/v4/spreadsheets".into(),
            timeout_seconds: 1,
            cache_ttl_seconds: 60,
        };
        let client = SheetsClient::new(&config, None).unwrap();
        let source = CameraSource::new(client, vec![], std::time::Duration::from_secs(60));
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = rt.block_on(source.load(false)).unwrap_err();
        assert!(err.to_string().contains("no camera sites configured"));
    }

    #[test]
    fn fixed_source_ignores_refresh() {
        let source = CameraSource::fixed(two_site_directory());
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let dir = rt.block_on(source.load(true)).unwrap();
        assert!(!dir.is_empty());
    }
}
