//! Operations agent — single entry point with intent routing.
//!
//! Recognises whether a free-text query is about doors, cameras, or staff
//! and dispatches to the specialist. `staff:` / `camera:` / `door:`
//! prefixes force a route. Ambiguous queries fall through the chain
//! doors → cameras → staff and the first actual answer wins.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::agents::{AgentContext, AgentReply, AgentRuntime, cameras, doors};
use crate::error::AppError;

const STAFF_KEYWORDS: &[&str] = &[
    "psa",
    "contact",
    "pin",
    "ldap",
    "l-dap",
    "first aid",
    "safepass",
    "badge",
    "earpiece",
    "emergency",
    "licence",
    "license",
    "expiry",
    "expiration",
];

const CAMERA_KEYWORDS: &[&str] = &["camera", "cctv", "flir", "ppk1", "ppk 1", "ppk2", "ppk 2"];

const DOOR_KEYWORDS: &[&str] = &[
    "door",
    "reader",
    "badge reader",
    "c-cure",
    "ccure",
    "ccure 900",
    "access",
];

static DOOR_CODE_RE: OnceLock<Regex> = OnceLock::new();
static PURE_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static FOR_NAME_RE: OnceLock<Regex> = OnceLock::new();
static CAP_WORD_RE: OnceLock<Regex> = OnceLock::new();

/// Door codes look like "032E" or "52A": 2-4 digits then a letter.
fn door_code_re() -> &'static Regex {
    DOOR_CODE_RE.get_or_init(|| Regex::new(r"(?i)\b\d{2,4}[A-Z]\b").unwrap())
}

/// A query that is essentially one bare number ("204", "cam  389 ").
fn pure_number_re() -> &'static Regex {
    PURE_NUMBER_RE.get_or_init(|| Regex::new(r"^\D*(\d{2,6})\D*$").unwrap())
}

/// "for John Smith" — a capitalized full name after "for".
fn for_name_re() -> &'static Regex {
    FOR_NAME_RE.get_or_init(|| Regex::new(r"\bfor\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+").unwrap())
}

fn cap_word_re() -> &'static Regex {
    CAP_WORD_RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+").unwrap())
}

fn looks_like_door_query(q: &str) -> bool {
    let t = q.to_lowercase();
    DOOR_KEYWORDS.iter().any(|k| t.contains(k)) || door_code_re().is_match(q)
}

fn looks_like_camera_query(q: &str) -> bool {
    let t = q.to_lowercase();
    if CAMERA_KEYWORDS.iter().any(|k| t.contains(k)) {
        return true;
    }
    // A short bare number ("204") is almost always a camera.
    pure_number_re()
        .captures(q)
        .map(|c| c[1].len() <= 4)
        .unwrap_or(false)
}

fn looks_like_staff_query(q: &str) -> bool {
    let t = q.to_lowercase();
    if STAFF_KEYWORDS.iter().any(|k| t.contains(k)) {
        return true;
    }
    if for_name_re().is_match(q) {
        return true;
    }
    // Two or more capitalized words usually means a first + last name.
    cap_word_re().find_iter(q).count() >= 2
}

/// If the lowercased query starts with one of `prefixes`, the remainder
/// of the original query (trimmed).
fn strip_any_prefix<'q>(q: &'q str, lower: &str, prefixes: &[&str]) -> Option<&'q str> {
    prefixes
        .iter()
        .find(|p| lower.starts_with(**p))
        .map(|p| q[p.len()..].trim())
}

pub async fn run(
    runtime: &AgentRuntime,
    query: &str,
    context: &AgentContext,
) -> Result<AgentReply, AppError> {
    let q = query.trim();
    let lower = q.to_lowercase();

    // Hard prefixes — the user can force a route.
    if let Some(rest) = strip_any_prefix(q, &lower, &["staff:"]) {
        debug!("routed by staff prefix");
        return runtime.staff_reply(rest);
    }
    if let Some(rest) = strip_any_prefix(q, &lower, &["camera:", "cameras:"]) {
        debug!("routed by camera prefix");
        return cameras::run(runtime.cameras_source(), rest, context.refresh()).await;
    }
    if let Some(rest) = strip_any_prefix(q, &lower, &["door:", "doors:"]) {
        debug!("routed by door prefix");
        return doors::run(runtime.doors_source(), rest, context.refresh()).await;
    }

    // Intent heuristics.
    if looks_like_door_query(q) {
        debug!("routed by door heuristic");
        return doors::run(runtime.doors_source(), q, context.refresh()).await;
    }
    if looks_like_camera_query(q) {
        debug!("routed by camera heuristic");
        return cameras::run(runtime.cameras_source(), q, context.refresh()).await;
    }
    if looks_like_staff_query(q) {
        debug!("routed by staff heuristic");
        return runtime.staff_reply(q);
    }

    // Fallback chain: doors -> cameras -> staff, first answer wins.
    let reply = doors::run(runtime.doors_source(), q, context.refresh()).await?;
    if reply.is_answer() {
        return Ok(reply);
    }
    let reply = cameras::run(runtime.cameras_source(), q, context.refresh()).await?;
    if reply.is_answer() {
        return Ok(reply);
    }
    let reply = runtime.staff_reply(q)?;
    if reply.is_answer() {
        return Ok(reply);
    }

    Ok(AgentReply::NoMatch(
        "I couldn't determine what you need. Try e.g. 'psa John Smith', '204', or '052A'."
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_heuristics() {
        assert!(looks_like_door_query("032E"));
        assert!(looks_like_door_query("which door near reception"));
        assert!(looks_like_door_query("badge reader loading bay"));
        assert!(!looks_like_door_query("204"));
    }

    #[test]
    fn camera_heuristics() {
        assert!(looks_like_camera_query("204"));
        assert!(looks_like_camera_query("ppk2 389"));
        assert!(looks_like_camera_query("flir on the perimeter"));
        // 5-digit numbers are not camera-like
        assert!(!looks_like_camera_query("12345"));
        assert!(!looks_like_camera_query("john smith"));
    }

    #[test]
    fn staff_heuristics() {
        assert!(looks_like_staff_query("psa Bartosz Stanczuk"));
        assert!(looks_like_staff_query("expiry for somebody"));
        assert!(looks_like_staff_query("details for John Smith"));
        assert!(looks_like_staff_query("John Smith"));
        assert!(!looks_like_staff_query("389"));
    }

    #[test]
    fn door_code_pattern() {
        assert!(door_code_re().is_match("near 052A please"));
        assert!(door_code_re().is_match("032e")); // case-insensitive
        assert!(!door_code_re().is_match("204"));
        assert!(!door_code_re().is_match("A204"));
    }

    #[test]
    fn pure_number_pattern() {
        assert!(pure_number_re().is_match("204"));
        assert!(pure_number_re().is_match("cam 389 "));
        assert!(!pure_number_re().is_match("204 and 205"));
    }
}
