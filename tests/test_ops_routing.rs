//! End-to-end routing tests for the operations agent over fixed sources.

use std::io::Write;

use tempfile::NamedTempFile;

use opsdesk::agents::{AgentContext, AgentReply, AgentRuntime};
use opsdesk::data::cameras::{CameraDirectory, CameraSource};
use opsdesk::data::doors::{DoorDirectory, DoorSource};
use opsdesk::data::sheets::Table;

const STAFF_CSV: &str = "\
Name,PSA Licence,PSA Licence exp. DD/MM/YYYY,Contact Number
Tomasz Greplowski,PSA-2001,11/11/2027,0861234567
Adam Quirke,PSA-2002,02/02/2026,0869998888
";

fn camera_source() -> CameraSource {
    let ppk1 = Table::from_rows(vec![
        vec!["Camera Number".into(), "Camera Name".into()],
        vec!["204".into(), "Lobby East".into()],
        vec!["389".into(), "Loading Bay".into()],
    ]);
    let ppk2 = Table::from_rows(vec![
        vec!["Camera Number".into(), "Camera Name".into()],
        vec!["204".into(), "Perimeter North".into()],
    ]);
    CameraSource::fixed(CameraDirectory::from_tables(vec![
        ("PPK1".into(), ppk1),
        ("PPK2".into(), ppk2),
    ]))
}

fn door_source() -> DoorSource {
    let table = Table::from_rows(vec![
        vec![
            "Door ID".into(),
            "Description".into(),
            "Location".into(),
            "Cameras in".into(),
            "Cameras out".into(),
        ],
        vec![
            "052A".into(),
            "Main reception".into(),
            "Front of house".into(),
            "204".into(),
            "389".into(),
        ],
    ]);
    DoorSource::fixed(DoorDirectory::from_tables(vec![("PPK1".into(), table)]))
}

fn runtime() -> (AgentRuntime, NamedTempFile) {
    let mut csv = NamedTempFile::new().unwrap();
    csv.write_all(STAFF_CSV.as_bytes()).unwrap();
    let rt = AgentRuntime::with_sources(csv.path().to_path_buf(), camera_source(), door_source());
    (rt, csv)
}

async fn ask(query: &str) -> AgentReply {
    let (rt, _csv) = runtime();
    rt.run("operations", query, &AgentContext::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_door_code_routes_to_doors() {
    let reply = ask("052A").await;
    assert!(reply.is_answer());
    assert!(reply.text().contains("Main reception"), "got: {}", reply.text());
}

#[tokio::test]
async fn test_bare_number_routes_to_cameras() {
    let reply = ask("204").await;
    assert!(reply.is_answer());
    assert!(reply.text().contains("[PPK1] #204 — Lobby East"));
    assert!(reply.text().contains("[PPK2] #204 — Perimeter North"));
}

#[tokio::test]
async fn test_site_narrowing() {
    let reply = ask("ppk2 204").await;
    assert_eq!(reply.text(), "[PPK2] #204 — Perimeter North");
}

#[tokio::test]
async fn test_name_routes_to_staff() {
    let reply = ask("psa Tomasz Greplowski").await;
    assert!(reply.is_answer());
    assert!(reply.text().contains("PSA-2001"));
}

#[tokio::test]
async fn test_prefix_forces_route() {
    // "Loading Bay" contains capitalized words, but the prefix wins.
    let reply = ask("camera: Loading Bay").await;
    assert_eq!(reply.text(), "[PPK1] #389 — Loading Bay");
}

#[tokio::test]
async fn test_fallback_chain_reaches_staff() {
    // No keywords, no capitals, no digits: none of the heuristics fire,
    // so this walks the doors -> cameras -> staff chain and the staff
    // answer wins.
    let reply = ask("adam quirke").await;
    assert!(reply.is_answer());
    assert!(reply.text().contains("Adam Quirke"));
    assert!(reply.text().contains("02/02/2026"));
}

#[tokio::test]
async fn test_unroutable_query_gets_guidance() {
    let reply = ask("zzz qqq").await;
    assert!(!reply.is_answer());
    assert!(reply.text().contains("couldn't determine"));
}

#[tokio::test]
async fn test_explicit_agent_dispatch() {
    let (rt, _csv) = runtime();
    let reply = rt
        .run("doors", "reception", &AgentContext::default())
        .await
        .unwrap();
    assert!(reply.text().contains("052A"));

    let err = rt
        .run("nonexistent", "x", &AgentContext::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown agent"));
}
