//! Doors agent — look up doors by id, description, or location.

use crate::agents::AgentReply;
use crate::data::doors::{DoorRecord, DoorSource};
use crate::error::AppError;

const RESULT_LIMIT: usize = 10;

fn format_record(r: &DoorRecord) -> String {
    let mut cams = Vec::new();
    if !r.cameras_in.is_empty() && !r.cameras_in.eq_ignore_ascii_case("n/a") {
        cams.push(format!("IN: {}", r.cameras_in));
    }
    if !r.cameras_out.is_empty() && !r.cameras_out.eq_ignore_ascii_case("n/a") {
        cams.push(format!("OUT: {}", r.cameras_out));
    }
    let cams = if cams.is_empty() {
        "Cameras: —".to_string()
    } else {
        cams.join(" | ")
    };

    format!(
        "[{}] {} — {} (Location: {}) — {}",
        r.site, r.door_id, r.description, r.location, cams
    )
}

pub async fn run(source: &DoorSource, query: &str, refresh: bool) -> Result<AgentReply, AppError> {
    let directory = source.load(refresh).await?;
    let hits = directory.find_by_text(query, RESULT_LIMIT);

    if hits.is_empty() {
        return Ok(AgentReply::NoMatch("No matching doors.".to_string()));
    }

    let lines: Vec<String> = hits.iter().map(|r| format_record(r)).collect();
    Ok(AgentReply::Answer(lines.join("\n")))
}
