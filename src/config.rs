//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit `--config` path), then applies the `OPSDESK_LOG_LEVEL`
//! env override. Secrets never live in the TOML: the Sheets API key comes
//! from `SHEETS_API_KEY` only.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Staff tracker source configuration.
#[derive(Debug, Clone)]
pub struct StaffConfig {
    /// Path to the staff tracker CSV (already expanded, no `~`).
    pub csv_path: PathBuf,
}

/// Google Sheets access configuration, shared by cameras and doors.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Base URL of the Sheets v4 values API.
    pub api_base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// How long fetched worksheets stay fresh before a reload.
    pub cache_ttl_seconds: u64,
}

/// One camera worksheet: a site label plus where to fetch its sheet.
#[derive(Debug, Clone)]
pub struct CameraSiteConfig {
    /// Site label attached to every row loaded from this sheet (e.g. "PPK1").
    pub label: String,
    pub sheet_id: String,
    pub tab: String,
}

/// Door worksheets: one spreadsheet, one tab per site.
#[derive(Debug, Clone)]
pub struct DoorsConfig {
    pub sheet_id: String,
    /// Tab names; each doubles as the site label for its rows.
    pub tabs: Vec<String>,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub assistant_name: String,
    pub log_level: String,
    pub staff: StaffConfig,
    pub sheets: SheetsConfig,
    /// Camera sites in load order. Loading with no sites configured is an error.
    pub camera_sites: Vec<CameraSiteConfig>,
    pub doors: DoorsConfig,
    /// Agent that handles queries when none is named explicitly.
    pub default_agent: String,
    /// API key from `SHEETS_API_KEY` env var — `None` for public sheets.
    /// Never sourced from TOML.
    pub sheets_api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    assistant: RawAssistant,
    #[serde(default)]
    staff: RawStaff,
    #[serde(default)]
    sheets: RawSheets,
    #[serde(default)]
    cameras: RawCameras,
    #[serde(default)]
    doors: RawDoors,
    #[serde(default)]
    agents: RawAgents,
}

#[derive(Deserialize)]
struct RawAssistant {
    #[serde(default = "default_assistant_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawAssistant {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize)]
struct RawStaff {
    #[serde(default = "default_staff_csv_path")]
    csv_path: String,
}

impl Default for RawStaff {
    fn default() -> Self {
        Self {
            csv_path: default_staff_csv_path(),
        }
    }
}

#[derive(Deserialize)]
struct RawSheets {
    #[serde(default = "default_sheets_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_sheets_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    cache_ttl_seconds: u64,
}

impl Default for RawSheets {
    fn default() -> Self {
        Self {
            api_base_url: default_sheets_api_base_url(),
            timeout_seconds: default_sheets_timeout_seconds(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawCameras {
    /// `[[cameras.sites]]` — one entry per site worksheet.
    #[serde(default)]
    sites: Vec<RawCameraSite>,
}

#[derive(Deserialize)]
struct RawCameraSite {
    label: String,
    sheet_id: String,
    /// Defaults to the site label — most sheets name the tab after the site.
    #[serde(default)]
    tab: Option<String>,
}

#[derive(Deserialize)]
struct RawDoors {
    #[serde(default)]
    sheet_id: String,
    #[serde(default = "default_door_tabs")]
    tabs: Vec<String>,
}

impl Default for RawDoors {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            tabs: default_door_tabs(),
        }
    }
}

#[derive(Deserialize)]
struct RawAgents {
    /// `default = "..."` in `[agents]` — which agent handles unrouted queries.
    #[serde(rename = "default", default = "default_agent_name")]
    default_agent: String,
}

impl Default for RawAgents {
    fn default() -> Self {
        Self {
            default_agent: default_agent_name(),
        }
    }
}

fn default_assistant_name() -> String {
    "opsdesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_staff_csv_path() -> String {
    "data/staff_tracker.csv".to_string()
}

fn default_sheets_api_base_url() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".to_string()
}

fn default_sheets_timeout_seconds() -> u64 {
    30
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_door_tabs() -> Vec<String> {
    vec![
        "PPK1".to_string(),
        "PPK2".to_string(),
        "Expansion".to_string(),
    ]
}

fn default_agent_name() -> String {
    "operations".to_string()
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and the default file does not
/// exist, built-in defaults apply.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("OPSDESK_LOG_LEVEL").ok();

    let default_path = Path::new("config/default.toml");
    match config_path {
        Some(p) => load_from(Path::new(p), log_level_override.as_deref()),
        None if default_path.exists() => load_from(default_path, log_level_override.as_deref()),
        None => Ok(resolve(RawConfig::default_raw(), log_level_override.as_deref())),
    }
}

impl RawConfig {
    fn default_raw() -> Self {
        Self {
            assistant: RawAssistant::default(),
            staff: RawStaff::default(),
            sheets: RawSheets::default(),
            cameras: RawCameras::default(),
            doors: RawDoors::default(),
            agents: RawAgents::default(),
        }
    }
}

/// Internal loader — accepts an explicit path and optional override.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, log_level_override: Option<&str>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    Ok(resolve(parsed, log_level_override))
}

fn resolve(parsed: RawConfig, log_level_override: Option<&str>) -> Config {
    let log_level = log_level_override
        .unwrap_or(&parsed.assistant.log_level)
        .to_string();

    Config {
        assistant_name: parsed.assistant.name,
        log_level,
        staff: StaffConfig {
            csv_path: expand_home(&parsed.staff.csv_path),
        },
        sheets: SheetsConfig {
            api_base_url: parsed.sheets.api_base_url,
            timeout_seconds: parsed.sheets.timeout_seconds,
            cache_ttl_seconds: parsed.sheets.cache_ttl_seconds,
        },
        camera_sites: parsed
            .cameras
            .sites
            .into_iter()
            .map(|s| CameraSiteConfig {
                tab: s.tab.unwrap_or_else(|| s.label.clone()),
                label: s.label,
                sheet_id: s.sheet_id,
            })
            .collect(),
        doors: DoorsConfig {
            sheet_id: parsed.doors.sheet_id,
            tabs: parsed.doors.tabs,
        },
        default_agent: parsed.agents.default_agent,
        sheets_api_key: env::var("SHEETS_API_KEY").ok(),
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
