// src/services/hh.rs

//! Job board transport.
//!
//! Listing requests, applications and negotiation maintenance all go through
//! one shared `reqwest::Client` that never follows redirects.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{
    ActionOutcome, HhConfig, ListingPage, Negotiation, NegotiationMessage, SearchConfig,
    SearchMode, Vacancy,
};
use crate::services::{ItemAction, PageFetcher};
use crate::utils::{http, truncate};

/// Error value the job board uses when the daily application quota is spent.
const LIMIT_EXCEEDED: &str = "limit_exceeded";

const BODY_LOG_LIMIT: usize = 300;

/// Job board API client shared by every worker.
#[derive(Clone)]
pub struct HhClient {
    client: reqwest::Client,
    config: Arc<HhConfig>,
    cover_letter: Arc<str>,
}

impl HhClient {
    /// Create a client with its own connection pool.
    pub fn new(config: HhConfig, cover_letter: impl Into<String>) -> Result<Self> {
        let client = http::create_hh_client(&config)?;
        Ok(Self::with_client(client, config, cover_letter))
    }

    pub fn with_client(
        client: reqwest::Client,
        config: HhConfig,
        cover_letter: impl Into<String>,
    ) -> Self {
        Self {
            client,
            config: Arc::new(config),
            cover_letter: Arc::from(cover_letter.into()),
        }
    }

    pub fn config(&self) -> &HhConfig {
        &self.config
    }

    /// State id of a negotiation, e.g. `discard` for a rejection.
    pub async fn negotiation_state(&self, negotiation_url: &str) -> Result<Option<String>> {
        let negotiation: NegotiationStateResponse = self
            .get_json("negotiation", &self.config.resolve(negotiation_url), &[])
            .await?;
        Ok(negotiation.state.map(|s| s.id))
    }

    /// Withdraw an active application.
    pub async fn delete_negotiation(&self, negotiation_id: &str) -> Result<()> {
        let url = self
            .config
            .resolve(&format!("negotiations/active/{negotiation_id}"));
        let response = self.client.delete(&url).send().await?;
        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::status(
                format!("DELETE {url}"),
                status.as_u16(),
                truncate(&body, BODY_LOG_LIMIT),
            ));
        }
        Ok(())
    }

    /// Messages of a negotiation thread, oldest first.
    pub async fn negotiation_messages(&self, negotiation_id: &str) -> Result<Vec<NegotiationMessage>> {
        let url = self
            .config
            .resolve(&format!("negotiations/{negotiation_id}/messages"));
        let page: ListingPage<NegotiationMessage> = self.get_json("messages", &url, &[]).await?;
        Ok(page.items)
    }

    fn page_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string())];
        if self.config.per_page > 0 {
            params.push(("per_page", self.config.per_page.to_string()));
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::status(
                format!("{context} {url}"),
                status.as_u16(),
                truncate(&body, BODY_LOG_LIMIT),
            ));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ItemAction for HhClient {
    async fn act(&self, vacancy: &Vacancy) -> Result<ActionOutcome> {
        let form = [
            ("vacancy_id", vacancy.id.as_str()),
            ("resume_id", self.config.resume_id.as_str()),
            ("message", &*self.cover_letter),
        ];
        let response = self
            .client
            .post(self.config.negotiations_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(classify_apply_response(status, location.as_deref(), &body))
    }
}

#[derive(Debug, Deserialize)]
struct NegotiationStateResponse {
    #[serde(default)]
    state: Option<crate::models::NegotiationState>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// Classify the answer to an application request.
pub fn classify_apply_response(status: u16, location: Option<&str>, body: &str) -> ActionOutcome {
    match status {
        201 => match location.filter(|l| !l.is_empty()) {
            Some(url) => ActionOutcome::Applied {
                record_url: url.to_string(),
            },
            None => ActionOutcome::SoftFailure("Created without Location header".to_string()),
        },
        400 | 403 => match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed)
                if parsed
                    .errors
                    .iter()
                    .any(|e| e.value.as_deref() == Some(LIMIT_EXCEEDED)) =>
            {
                ActionOutcome::QuotaExceeded
            }
            Ok(parsed) => ActionOutcome::SoftFailure(parsed.description.unwrap_or_else(|| {
                let kinds: Vec<&str> = parsed
                    .errors
                    .iter()
                    .filter_map(|e| e.value.as_deref().or(e.kind.as_deref()))
                    .collect();
                format!("{status} {}", kinds.join(", "))
            })),
            Err(_) => ActionOutcome::SoftFailure(format!(
                "{status} {}",
                truncate(body, BODY_LOG_LIMIT)
            )),
        },
        303 => ActionOutcome::SoftFailure(format!(
            "External apply required on {}",
            location.unwrap_or_default()
        )),
        _ => ActionOutcome::SoftFailure(format!(
            "Unknown error: {status} {}",
            truncate(body, BODY_LOG_LIMIT)
        )),
    }
}

/// Vacancy listing in one of the search modes.
pub struct VacancyListing {
    hh: HhClient,
    mode: SearchMode,
    search: SearchConfig,
}

impl VacancyListing {
    pub fn new(hh: HhClient, mode: SearchMode, search: SearchConfig) -> Self {
        Self { hh, mode, search }
    }
}

#[async_trait]
impl PageFetcher<Vacancy> for VacancyListing {
    async fn fetch(&self, page: u32) -> Result<ListingPage<Vacancy>> {
        let (url, mut params) = match self.mode {
            SearchMode::Similar => (self.hh.config.similar_vacancies_url(), Vec::new()),
            SearchMode::Query => (self.hh.config.vacancies_url(), self.search.params()),
        };
        params.extend(self.hh.page_params(page));
        self.hh.get_json("vacancy listing", &url, &params).await
    }
}

/// The applicant's negotiations, newest first.
pub struct NegotiationListing {
    hh: HhClient,
}

impl NegotiationListing {
    pub fn new(hh: HhClient) -> Self {
        Self { hh }
    }
}

#[async_trait]
impl PageFetcher<Negotiation> for NegotiationListing {
    async fn fetch(&self, page: u32) -> Result<ListingPage<Negotiation>> {
        let mut params = vec![
            ("order_by", "created_at".to_string()),
            ("order", "desc".to_string()),
        ];
        params.extend(self.hh.page_params(page));
        self.hh
            .get_json("negotiation listing", &self.hh.config.negotiations_url(), &params)
            .await
    }
}
