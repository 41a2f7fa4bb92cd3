//! Documentation page checks.
//!
//! Site pages are Markdown/MDX files with a YAML front-matter block
//! between `---` fences at the very top. This module parses that block
//! and validates the fields the site generator relies on: a non-empty
//! `title`, an integer `sidebar_position`, and a `slug` that starts
//! with `/` when given.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

/// The recognised front-matter fields. Unknown keys are tolerated so
/// pages can carry generator-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sidebar_position: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A parsed page: front-matter plus the Markdown body after the fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Outcome of validating one file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub path: PathBuf,
    pub problems: Vec<String>,
}

impl PageReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Split a page into front-matter and body.
///
/// The opening `---` must be the first line of the file, exactly; a BOM
/// or leading blank line means the generator would treat the whole file
/// as body, so we reject it here rather than silently skip the block.
pub fn parse(input: &str) -> Result<Document, AppError> {
    let mut lines = input.split_inclusive('\n');

    let first = lines.next().unwrap_or("");
    if first.trim_end_matches(['\r', '\n']) != "---" {
        return Err(AppError::Docs(
            "page must start with a '---' front-matter fence on line 1".to_string(),
        ));
    }

    let mut yaml = String::new();
    let mut body_start = first.len();
    let mut closed = false;
    for line in lines {
        body_start += line.len();
        if line.trim_end_matches(['\r', '\n']) == "---" {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }
    if !closed {
        return Err(AppError::Docs(
            "front-matter fence is never closed".to_string(),
        ));
    }

    let front_matter: FrontMatter = serde_yml::from_str(&yaml)
        .map_err(|e| AppError::Docs(format!("invalid front-matter YAML: {e}")))?;

    Ok(Document {
        front_matter,
        body: input[body_start..].to_string(),
    })
}

/// Field-level checks on parsed front-matter. Returns one message per
/// problem; an empty vec means the page is valid.
pub fn validate(fm: &FrontMatter) -> Vec<String> {
    let mut problems = Vec::new();

    match &fm.title {
        None => problems.push("missing 'title'".to_string()),
        Some(t) if t.trim().is_empty() => problems.push("'title' is empty".to_string()),
        Some(_) => {}
    }

    if let Some(slug) = &fm.slug
        && !slug.starts_with('/')
    {
        problems.push(format!("'slug' must start with '/': got {slug:?}"));
    }

    problems
}

/// Validate one file: parse errors count as a single problem.
pub fn check_file(path: &Path) -> Result<PageReport, AppError> {
    let text = fs::read_to_string(path)?;
    let problems = match parse(&text) {
        Ok(doc) => validate(&doc.front_matter),
        Err(AppError::Docs(msg)) => vec![msg],
        Err(e) => return Err(e),
    };
    Ok(PageReport {
        path: path.to_path_buf(),
        problems,
    })
}

/// Walk `root` recursively and check every `.md` / `.mdx` page.
///
/// Reports come back sorted by path so output (and exit status) is
/// stable across filesystems.
pub fn check_dir(root: &Path) -> Result<Vec<PageReport>, AppError> {
    let mut pages = Vec::new();
    collect_pages(root, &mut pages)?;
    pages.sort();

    let mut reports = Vec::with_capacity(pages.len());
    for page in pages {
        debug!(path = %page.display(), "checking page");
        reports.push(check_file(&page)?);
    }
    Ok(reports)
}

fn collect_pages(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AppError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_pages(&path, out)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md" | "mdx")
        ) {
            out.push(path);
        }
    }
    Ok(())
}
