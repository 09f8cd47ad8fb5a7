//! Whole command runs against a mocked job board and Notion.

use std::io::Write;

use applier::models::{Config, HhConfig, NotionConfig, SearchMode};
use applier::pipeline;
use chrono::DateTime;
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> Config {
    let mut config = Config {
        hh: HhConfig {
            api_url: server.uri(),
            token: "hh-token".to_string(),
            resume_id: "r1".to_string(),
            per_page: 2,
            ..HhConfig::default()
        },
        notion: NotionConfig {
            api_url: format!("{}/v1", server.uri()),
            token: "secret".to_string(),
            database_id: "db1".to_string(),
            ..NotionConfig::default()
        },
        ..Config::default()
    };
    config.apply.cover_letter = "Hello".to_string();
    config
}

fn vacancy(id: &str, name: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "employer": {"name": "Acme"}, "alternate_url": ""})
}

async fn mount_listing(server: &MockServer, page: u32, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/resumes/r1/similar_vacancies"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": items,
            "pages": 2,
            "per_page": 2,
            "found": 3,
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn apply_run_skips_blacklisted_and_records_applications() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        0,
        json!([vacancy("1", "Senior Python developer"), vacancy("2", "Python developer")]),
    )
    .await;
    mount_listing(&server, 1, json!([vacancy("3", "Backend developer")])).await;

    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .and(body_string_contains("vacancy_id=1&"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .and(body_string_contains("vacancy_id=2&"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "/negotiations/902"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .and(body_string_contains("vacancy_id=3&"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "/negotiations/903"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page"})))
        .expect(2)
        .mount(&server)
        .await;

    let mut words = NamedTempFile::new().unwrap();
    writeln!(words, "# seniority\nsenior\n\nlead").unwrap();
    let mut config = config(&server);
    config.apply.blacklist_words_file = Some(words.path().to_path_buf());

    let report = pipeline::run_apply(&config, SearchMode::Similar, 2, false)
        .await
        .expect("run");

    assert_eq!(report.units_processed, 2);
    assert!(!report.halted);
}

#[tokio::test]
async fn apply_run_stops_on_quota() {
    let server = MockServer::start().await;
    mount_listing(&server, 0, json!([vacancy("1", "Dev"), vacancy("2", "Dev")])).await;

    Mock::given(method("POST"))
        .and(path("/negotiations"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{"type": "negotiations", "value": "limit_exceeded"}],
        })))
        .expect(1)
        .mount(&server)
        .await;
    // page 1 is discarded before any worker fetches it
    Mock::given(method("GET"))
        .and(path("/resumes/r1/similar_vacancies"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = pipeline::run_apply(&config(&server), SearchMode::Similar, 1, false)
        .await
        .expect("run");

    assert!(report.halted);
    assert_eq!(report.units_processed, 1);
    assert_eq!(report.units_discarded, 1);
}

#[tokio::test]
async fn apply_test_run_sends_nothing() {
    let server = MockServer::start().await;
    mount_listing(&server, 0, json!([vacancy("1", "Dev"), vacancy("2", "Dev")])).await;
    mount_listing(&server, 1, json!([vacancy("3", "Dev")])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = pipeline::run_apply(&config(&server), SearchMode::Similar, 3, true)
        .await
        .expect("run");
    assert_eq!(report.units_processed, 2);
}

#[tokio::test]
async fn apply_requires_credentials() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.hh.token.clear();
    assert!(
        pipeline::run_apply(&config, SearchMode::Similar, 1, false)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn import_records_recent_negotiations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/negotiations"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "902", "created_at": "2024-05-03T10:00:00+0300", "vacancy": vacancy("2", "Dev")},
                {"id": "901", "created_at": "2024-04-20T10:00:00+0300", "vacancy": vacancy("1", "Dev")},
            ],
            "pages": 1,
            "per_page": 2,
            "found": 2,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(body_partial_json(
            json!({"properties": {"HH negotiation url": {"url": "/negotiations/902"}}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page"})))
        .expect(1)
        .mount(&server)
        .await;

    let since = DateTime::parse_from_rfc3339("2024-05-01T00:00:00+03:00").unwrap();
    let report = pipeline::run_import(&config(&server), 2, Some(since), false)
        .await
        .expect("run");
    assert_eq!(report.units_processed, 1);
}

fn query_response(pages: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "results": pages,
        "has_more": false,
        "next_cursor": null,
    }))
}

fn notion_page(id: &str, negotiation_url: &str) -> serde_json::Value {
    json!({"id": id, "properties": {"HH negotiation url": {"url": negotiation_url}}})
}

#[tokio::test]
async fn rejections_mark_discarded_negotiations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .respond_with(query_response(json!([
            notion_page("p1", "/negotiations/1"),
            notion_page("p2", "/negotiations/2"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/negotiations/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": {"id": "discard"}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/negotiations/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": {"id": "response"}})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p2"})))
        .expect(0)
        .mount(&server)
        .await;

    let report = pipeline::run_rejections(&config(&server), 2)
        .await
        .expect("run");
    assert_eq!(report.units_processed, 2);
}

#[tokio::test]
async fn remove_deletes_then_archives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .and(body_partial_json(
            json!({"filter": {"and": [{"status": {"equals": "Wrong"}}]}}),
        ))
        .respond_with(query_response(json!([notion_page("p5", "/negotiations/5")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/negotiations/active/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/p5"))
        .and(body_partial_json(json!({"archived": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p5"})))
        .expect(1)
        .mount(&server)
        .await;

    let report = pipeline::run_remove(&config(&server), 1).await.expect("run");
    assert_eq!(report.units_processed, 1);
}

#[tokio::test]
async fn maintenance_requires_notion() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.notion.database_id.clear();
    assert!(pipeline::run_rejections(&config, 1).await.is_err());
    assert!(pipeline::run_remove(&config, 1).await.is_err());
}

#[tokio::test]
async fn messages_skip_cover_letter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .respond_with(query_response(json!([notion_page("p9", "/negotiations/9")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/negotiations/9/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"text": "Hello", "author": {"participant_type": "applicant"}},
                {"text": "Send your CV", "author": {"participant_type": "employer"}},
                {"text": "Sent", "author": {"participant_type": "applicant"}},
            ],
            "pages": 1,
            "found": 3,
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/blocks/p9/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(2)
        .mount(&server)
        .await;

    let appended = pipeline::run_messages(&config(&server), "9")
        .await
        .expect("run");
    assert_eq!(appended, 2);
}
