// src/services/notion.rs

//! Notion database transport.
//!
//! Every application is one page in the configured database. The relative
//! negotiation url (`/negotiations/<id>`) stored on the page links it back to
//! the job board.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{NegotiationMessage, NegotiationRecord, NotionConfig, Vacancy};
use crate::services::ResultRecorder;
use crate::utils::{http, truncate};

const COMPANY: &str = "COMPANY";
const POSITION: &str = "POSITION";
const APPLICATION_DATE: &str = "APPLICATION DATE";
const JOB_POST: &str = "JOB POST";
const STATUS: &str = "STATUS";
const NEGOTIATION_URL: &str = "HH negotiation url";
const RESUME_USED: &str = "RESUME USED";

pub const STATUS_APPLIED: &str = "Applied";
pub const STATUS_UNSUCCESSFUL: &str = "Unsuccessful";
pub const STATUS_WRONG: &str = "Wrong";

/// Notion API client.
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    config: Arc<NotionConfig>,
}

impl NotionClient {
    pub fn new(config: NotionConfig, timeout_secs: u64) -> Result<Self> {
        let client = http::create_notion_client(&config, timeout_secs)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: NotionConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Fail unless token and database are configured.
    pub fn require_enabled(&self) -> Result<()> {
        if self.config.is_enabled() {
            Ok(())
        } else {
            Err(AppError::config(
                "Notion credentials are not provided (notion.token / notion.database_id)",
            ))
        }
    }

    /// Create an application page and return its id.
    pub async fn create_application(&self, vacancy: &Vacancy, negotiation_url: &str) -> Result<String> {
        let mut properties = json!({
            COMPANY: {"title": [{"text": {"content": vacancy.employer_name()}}]},
            POSITION: {"rich_text": [{"type": "text", "text": {"content": vacancy.name}}]},
            APPLICATION_DATE: {"date": {"start": self.config.apply_date().to_string()}},
            JOB_POST: {"url": vacancy.alternate_url},
            STATUS: {"status": {"name": STATUS_APPLIED}},
            NEGOTIATION_URL: {"url": negotiation_url},
        });
        if let Some(resume) = self.config.resume_page_id.as_deref().filter(|r| !r.is_empty()) {
            properties[RESUME_USED] = json!({"relation": [{"id": resume}]});
        }

        let body = json!({
            "parent": {"database_id": self.config.database_id},
            "properties": properties,
        });
        let page: PageObject = self.send_json(reqwest::Method::POST, "pages", &body).await?;
        Ok(page.id)
    }

    /// Pages with the given STATUS that reference a negotiation.
    pub async fn query_by_status(&self, status: &str) -> Result<Vec<NegotiationRecord>> {
        let filter = json!({
            "and": [
                {"property": STATUS, "status": {"equals": status}},
                {"property": NEGOTIATION_URL, "url": {"is_not_empty": true}},
            ]
        });
        let pages = self.query(filter).await?;
        Ok(pages
            .into_iter()
            .filter_map(|page| {
                let negotiation_url = page.negotiation_url()?.to_string();
                Some(NegotiationRecord {
                    page_id: page.id,
                    negotiation_url,
                })
            })
            .collect())
    }

    /// Page recording the given negotiation, if any.
    pub async fn find_by_negotiation(&self, negotiation_url: &str) -> Result<Option<String>> {
        let filter = json!({
            "and": [{"property": NEGOTIATION_URL, "url": {"equals": negotiation_url}}]
        });
        Ok(self.query(filter).await?.into_iter().next().map(|p| p.id))
    }

    pub async fn set_status(&self, page_id: &str, status: &str) -> Result<()> {
        let body = json!({"properties": {STATUS: {"status": {"name": status}}}});
        let _: Value = self
            .send_json(reqwest::Method::PATCH, &format!("pages/{page_id}"), &body)
            .await?;
        Ok(())
    }

    pub async fn archive_page(&self, page_id: &str) -> Result<()> {
        let body = json!({"archived": true});
        let _: Value = self
            .send_json(reqwest::Method::PATCH, &format!("pages/{page_id}"), &body)
            .await?;
        Ok(())
    }

    /// Append one message as a paragraph followed by a divider.
    pub async fn append_message(&self, page_id: &str, message: &NegotiationMessage) -> Result<()> {
        let color = if message.from_applicant() {
            "default"
        } else {
            "gray_background"
        };
        let body = json!({
            "children": [
                {
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {
                        "rich_text": [{"type": "text", "text": {"content": message.text}}],
                        "color": color,
                    },
                },
                {"object": "block", "type": "divider", "divider": {}},
            ]
        });
        let _: Value = self
            .send_json(
                reqwest::Method::PATCH,
                &format!("blocks/{page_id}/children"),
                &body,
            )
            .await?;
        Ok(())
    }

    /// Run a database query, following `next_cursor` until exhausted.
    async fn query(&self, filter: Value) -> Result<Vec<PageObject>> {
        let path = format!("databases/{}/query", self.config.database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({"filter": filter});
            if let Some(start) = &cursor {
                body["start_cursor"] = json!(start);
            }
            let response: QueryResponse =
                self.send_json(reqwest::Method::POST, &path, &body).await?;
            pages.extend(response.results);

            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => break,
            }
        }

        log::debug!("Notion query returned {} pages", pages.len());
        Ok(pages)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        let response = self
            .client
            .request(method.clone(), &url)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::status(
                format!("Notion {method} {path}"),
                status.as_u16(),
                truncate(&text, 300),
            ));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ResultRecorder for NotionClient {
    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn record(&self, vacancy: &Vacancy, record_url: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let page_id = self.create_application(vacancy, record_url).await?;
        log::debug!("Notion page {} created for vacancy {}", page_id, vacancy.id);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageObject {
    id: String,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

impl PageObject {
    fn negotiation_url(&self) -> Option<&str> {
        self.properties
            .get(NEGOTIATION_URL)
            .and_then(|p| p.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}
