use applier::models::{
    Employer, MessageAuthor, NegotiationMessage, NegotiationRecord, NotionConfig, Vacancy,
};
use applier::services::{NotionClient, ResultRecorder, STATUS_APPLIED, STATUS_UNSUCCESSFUL};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> NotionConfig {
    NotionConfig {
        api_url: format!("{}/v1", server.uri()),
        token: "secret".to_string(),
        database_id: "db1".to_string(),
        apply_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        ..NotionConfig::default()
    }
}

fn page(id: &str, negotiation_url: &str) -> serde_json::Value {
    json!({
        "object": "page",
        "id": id,
        "properties": {"HH negotiation url": {"type": "url", "url": negotiation_url}},
    })
}

#[tokio::test]
async fn record_creates_page_with_properties() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(header("Authorization", "Bearer secret"))
        .and(header("Notion-Version", "2022-06-28"))
        .and(body_partial_json(json!({
            "parent": {"database_id": "db1"},
            "properties": {
                "APPLICATION DATE": {"date": {"start": "2024-05-01"}},
                "STATUS": {"status": {"name": "Applied"}},
                "HH negotiation url": {"url": "/negotiations/900"},
                "JOB POST": {"url": "https://hh.ru/vacancy/7"},
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let notion = NotionClient::new(config(&server), 5).expect("client");
    let vacancy = Vacancy {
        id: "7".to_string(),
        name: "Dev".to_string(),
        employer: Employer {
            name: "Acme".to_string(),
        },
        alternate_url: "https://hh.ru/vacancy/7".to_string(),
    };
    notion.record(&vacancy, "/negotiations/900").await.expect("record");
}

#[tokio::test]
async fn disabled_recorder_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notion = NotionClient::new(
        NotionConfig {
            token: String::new(),
            ..config(&server)
        },
        5,
    )
    .expect("client");
    assert!(!notion.is_enabled());
    assert!(notion.require_enabled().is_err());

    let vacancy = Vacancy {
        id: "7".to_string(),
        name: "Dev".to_string(),
        employer: Employer::default(),
        alternate_url: String::new(),
    };
    notion.record(&vacancy, "/negotiations/1").await.expect("no-op");
}

#[tokio::test]
async fn query_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .and(body_partial_json(json!({"start_cursor": "c2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [page("p3", "/negotiations/3")],
            "has_more": false,
            "next_cursor": null,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/databases/db1/query"))
        .and(body_partial_json(json!({
            "filter": {"and": [{"property": "STATUS", "status": {"equals": "Applied"}}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [page("p1", "/negotiations/1"), page("p2", "/negotiations/2")],
            "has_more": true,
            "next_cursor": "c2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notion = NotionClient::new(config(&server), 5).expect("client");
    let records = notion.query_by_status(STATUS_APPLIED).await.expect("query");

    assert_eq!(
        records,
        vec![
            NegotiationRecord {
                page_id: "p1".to_string(),
                negotiation_url: "/negotiations/1".to_string(),
            },
            NegotiationRecord {
                page_id: "p2".to_string(),
                negotiation_url: "/negotiations/2".to_string(),
            },
            NegotiationRecord {
                page_id: "p3".to_string(),
                negotiation_url: "/negotiations/3".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn status_archive_and_messages() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/p1"))
        .and(body_partial_json(
            json!({"properties": {"STATUS": {"status": {"name": "Unsuccessful"}}}}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/pages/p2"))
        .and(body_partial_json(json!({"archived": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/blocks/p1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let notion = NotionClient::new(config(&server), 5).expect("client");
    notion
        .set_status("p1", STATUS_UNSUCCESSFUL)
        .await
        .expect("status");
    notion.archive_page("p2").await.expect("archive");

    let message = NegotiationMessage {
        text: "Thanks, we will call you".to_string(),
        author: MessageAuthor {
            participant_type: "employer".to_string(),
        },
    };
    notion.append_message("p1", &message).await.expect("append");

    let requests = server.received_requests().await.expect("recorded");
    let append = requests
        .iter()
        .find(|r| r.url.path() == "/v1/blocks/p1/children")
        .expect("append request");
    let body: serde_json::Value = serde_json::from_slice(&append.body).expect("json");
    assert_eq!(body["children"][0]["paragraph"]["color"], "gray_background");
    assert_eq!(body["children"][1]["type"], "divider");
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_string("validation_error"))
        .mount(&server)
        .await;

    let notion = NotionClient::new(config(&server), 5).expect("client");
    let err = notion.archive_page("p1").await.unwrap_err();
    assert!(err.to_string().contains("400"));
}
