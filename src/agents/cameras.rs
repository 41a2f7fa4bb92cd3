//! Camera agent — look up cameras by number, name fragment, or site.

use crate::agents::AgentReply;
use crate::data::cameras::CameraSource;
use crate::error::AppError;

const RESULT_LIMIT: usize = 10;

pub async fn run(source: &CameraSource, query: &str, refresh: bool) -> Result<AgentReply, AppError> {
    let directory = source.load(refresh).await?;
    let hits = directory.search(query, RESULT_LIMIT);

    if hits.is_empty() {
        return Ok(AgentReply::NoMatch("No matching cameras.".to_string()));
    }

    let lines: Vec<String> = hits
        .iter()
        .map(|h| format!("[{}] #{} — {}", h.site, h.number, h.name))
        .collect();
    Ok(AgentReply::Answer(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cameras::CameraDirectory;
    use crate::data::sheets::Table;

    fn source() -> CameraSource {
        let table = Table::from_rows(vec![
            vec!["Camera Number".into(), "Camera Name".into()],
            vec!["204".into(), "Lobby East".into()],
        ]);
        CameraSource::fixed(CameraDirectory::from_tables(vec![("PPK1".into(), table)]))
    }

    #[tokio::test]
    async fn formats_hits() {
        let reply = run(&source(), "204", false).await.unwrap();
        assert_eq!(reply.into_text(), "[PPK1] #204 — Lobby East");
    }

    #[tokio::test]
    async fn miss_is_no_match() {
        let reply = run(&source(), "999", false).await.unwrap();
        assert!(!reply.is_answer());
        assert_eq!(reply.text(), "No matching cameras.");
    }
}
