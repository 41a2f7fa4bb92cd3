//! Agent set and dispatch.
//!
//! Four fixed agents: `staff_directory`, `cameras`, `doors`, and
//! `operations` (the intent router, and the default). Each agent is a
//! deterministic lookup — no model is ever called.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::data::cameras::CameraSource;
use crate::data::doors::DoorSource;
use crate::data::sheets::SheetsClient;
use crate::data::staff::StaffDirectory;
use crate::error::AppError;

pub mod cameras;
pub mod doors;
pub mod ops;
pub mod staff;

/// Agent ids accepted by [`AgentRuntime::run`].
pub const AGENT_IDS: &[&str] = &["staff_directory", "cameras", "doors", "operations"];

/// What an agent produced for a query.
///
/// `NoMatch` still carries user-facing text (a guidance message); the
/// distinction exists so the operations router can fall through to the
/// next specialist structurally instead of sniffing reply strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Answer(String),
    NoMatch(String),
}

impl AgentReply {
    pub fn text(&self) -> &str {
        match self {
            AgentReply::Answer(s) | AgentReply::NoMatch(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            AgentReply::Answer(s) | AgentReply::NoMatch(s) => s,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, AgentReply::Answer(_))
    }
}

/// Free-form key=value pairs passed after the query on the command line.
#[derive(Debug, Default, Clone)]
pub struct AgentContext {
    vars: HashMap<String, String>,
}

impl AgentContext {
    /// Parse `KEY=VALUE` arguments; tokens without `=` are ignored.
    pub fn from_pairs(pairs: &[String]) -> Self {
        let vars = pairs
            .iter()
            .filter_map(|p| {
                p.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.to_string()))
            })
            .collect();
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// `refresh=1` (or `true`/`yes`) forces a worksheet cache reload.
    pub fn refresh(&self) -> bool {
        matches!(self.get("refresh"), Some("1" | "true" | "yes"))
    }
}

/// Everything the agents need to answer queries.
pub struct AgentRuntime {
    staff_csv: PathBuf,
    cameras: CameraSource,
    doors: DoorSource,
}

impl AgentRuntime {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = SheetsClient::new(&config.sheets, config.sheets_api_key.clone())?;
        let ttl = std::time::Duration::from_secs(config.sheets.cache_ttl_seconds);

        Ok(Self {
            staff_csv: config.staff.csv_path.clone(),
            cameras: CameraSource::new(client.clone(), config.camera_sites.clone(), ttl),
            doors: DoorSource::new(client, config.doors.clone(), ttl),
        })
    }

    /// Build a runtime over explicit sources — fixtures and tests.
    pub fn with_sources(staff_csv: PathBuf, cameras: CameraSource, doors: DoorSource) -> Self {
        Self {
            staff_csv,
            cameras,
            doors,
        }
    }

    /// Run one agent against a query.
    pub async fn run(
        &self,
        agent_id: &str,
        query: &str,
        context: &AgentContext,
    ) -> Result<AgentReply, AppError> {
        info!(agent = %agent_id, query_len = query.len(), "dispatching query");
        match agent_id {
            "staff_directory" => self.staff_reply(query),
            "cameras" => cameras::run(&self.cameras, query, context.refresh()).await,
            "doors" => doors::run(&self.doors, query, context.refresh()).await,
            "operations" => ops::run(self, query, context).await,
            _ => Err(AppError::UnknownAgent {
                requested: agent_id.to_string(),
                available: AGENT_IDS.join(", "),
            }),
        }
    }

    /// Load the tracker and answer a staff query. The CSV is small and
    /// local, so it is re-read per query — edits to the tracker are
    /// picked up without any cache plumbing.
    pub(crate) fn staff_reply(&self, query: &str) -> Result<AgentReply, AppError> {
        let directory = StaffDirectory::from_path(&self.staff_csv)?;
        Ok(staff::run(&directory, query))
    }

    pub(crate) fn cameras_source(&self) -> &CameraSource {
        &self.cameras
    }

    pub(crate) fn doors_source(&self) -> &DoorSource {
        &self.doors
    }
}
