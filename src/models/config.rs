//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Job board API access
    #[serde(default)]
    pub hh: HhConfig,

    /// Apply run behavior
    #[serde(default)]
    pub apply: ApplyConfig,

    /// Query parameters for the `query` search mode
    #[serde(default)]
    pub search: SearchConfig,

    /// Notion database used to record applications
    #[serde(default)]
    pub notion: NotionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override secrets from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 4] = [
            ("HH_TOKEN", &mut self.hh.token),
            ("HH_RESUME_ID", &mut self.hh.resume_id),
            ("NOTION_TOKEN", &mut self.notion.token),
            ("NOTION_DB_ID", &mut self.notion.database_id),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.hh.user_agent.trim().is_empty() {
            return Err(AppError::validation("hh.user_agent is empty"));
        }
        if self.hh.timeout_secs == 0 {
            return Err(AppError::validation("hh.timeout_secs must be > 0"));
        }
        if self.apply.workers == 0 {
            return Err(AppError::validation("apply.workers must be > 0"));
        }
        url::Url::parse(&self.hh.api_url)
            .map_err(|e| AppError::validation(format!("hh.api_url: {e}")))?;
        if self.notion.is_enabled() {
            url::Url::parse(&self.notion.api_url)
                .map_err(|e| AppError::validation(format!("notion.api_url: {e}")))?;
        }
        Ok(())
    }

    /// Validate that job board credentials are present.
    pub fn require_hh_credentials(&self) -> Result<()> {
        if self.hh.token.trim().is_empty() {
            return Err(AppError::config("hh.token (or HH_TOKEN) is not set"));
        }
        if self.hh.resume_id.trim().is_empty() {
            return Err(AppError::config("hh.resume_id (or HH_RESUME_ID) is not set"));
        }
        Ok(())
    }
}

/// Job board API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HhConfig {
    /// Base API URL
    #[serde(default = "defaults::hh_api_url")]
    pub api_url: String,

    /// Bearer token
    #[serde(default)]
    pub token: String,

    /// Resume used for applications and similar-vacancy search
    #[serde(default)]
    pub resume_id: String,

    /// Value of the HH-User-Agent header
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Page size; 0 keeps the server default
    #[serde(default)]
    pub per_page: u32,
}

impl HhConfig {
    /// URL of the similar vacancies listing for the configured resume.
    pub fn similar_vacancies_url(&self) -> String {
        format!(
            "{}/resumes/{}/similar_vacancies",
            self.api_url.trim_end_matches('/'),
            self.resume_id
        )
    }

    /// URL of the vacancy search listing.
    pub fn vacancies_url(&self) -> String {
        format!("{}/vacancies", self.api_url.trim_end_matches('/'))
    }

    /// URL of the negotiations collection.
    pub fn negotiations_url(&self) -> String {
        format!("{}/negotiations", self.api_url.trim_end_matches('/'))
    }

    /// Resolve a relative negotiation url (e.g. `/negotiations/42`) against the API.
    pub fn resolve(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            relative.trim_matches('/')
        )
    }
}

impl Default for HhConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::hh_api_url(),
            token: String::new(),
            resume_id: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            per_page: 0,
        }
    }
}

/// Apply run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Number of concurrent workers
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Cover letter sent with every application
    #[serde(default)]
    pub cover_letter: String,

    /// File with the cover letter; takes precedence over `cover_letter`
    #[serde(default)]
    pub cover_letter_file: Option<PathBuf>,

    /// Word blacklist, one word per line
    #[serde(default)]
    pub blacklist_words_file: Option<PathBuf>,

    /// Vacancy ids that are never applied to
    #[serde(default)]
    pub blacklist_ids: Vec<String>,

    /// File with additional vacancy ids, one per line
    #[serde(default)]
    pub blacklist_ids_file: Option<PathBuf>,
}

impl ApplyConfig {
    /// Resolve the cover letter text.
    pub fn load_cover_letter(&self) -> Result<String> {
        match &self.cover_letter_file {
            Some(path) => Ok(fs::read_to_string(path)?.trim().to_string()),
            None => Ok(self.cover_letter.clone()),
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            cover_letter: String::new(),
            cover_letter_file: None,
            blacklist_words_file: None,
            blacklist_ids: Vec::new(),
            blacklist_ids_file: None,
        }
    }
}

/// Query parameters for the vacancy search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "defaults::search_text")]
    pub text: String,

    #[serde(default)]
    pub professional_role: Option<u32>,

    #[serde(default)]
    pub search_field: Option<String>,

    /// Comma separated words excluded by the server
    #[serde(default)]
    pub excluded_text: Option<String>,

    #[serde(default)]
    pub work_format: Option<String>,
}

impl SearchConfig {
    /// Query pairs in request order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("text", self.text.clone())];
        if let Some(role) = self.professional_role {
            params.push(("professional_role", role.to_string()));
        }
        if let Some(field) = &self.search_field {
            params.push(("search_field", field.clone()));
        }
        if let Some(excluded) = &self.excluded_text {
            params.push(("excluded_text", excluded.clone()));
        }
        if let Some(format) = &self.work_format {
            params.push(("work_format", format.clone()));
        }
        params
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            text: defaults::search_text(),
            professional_role: None,
            search_field: None,
            excluded_text: None,
            work_format: None,
        }
    }
}

/// Notion database settings. Recording is enabled when both token and
/// database id are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "defaults::notion_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub database_id: String,

    /// Page linked through the RESUME USED relation
    #[serde(default)]
    pub resume_page_id: Option<String>,

    /// Notion-Version header
    #[serde(default = "defaults::notion_version")]
    pub version: String,

    /// Proxy for Notion requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// APPLICATION DATE value; today when unset
    #[serde(default)]
    pub apply_date: Option<NaiveDate>,
}

impl NotionConfig {
    pub fn is_enabled(&self) -> bool {
        !self.token.trim().is_empty() && !self.database_id.trim().is_empty()
    }

    pub fn apply_date(&self) -> NaiveDate {
        self.apply_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::notion_api_url(),
            token: String::new(),
            database_id: String::new(),
            resume_page_id: None,
            version: defaults::notion_version(),
            proxy: None,
            apply_date: None,
        }
    }
}

mod defaults {
    pub fn hh_api_url() -> String {
        "https://api.hh.ru".into()
    }
    pub fn user_agent() -> String {
        "applier/0.1 (applier@localhost)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn workers() -> usize {
        4
    }
    pub fn search_text() -> String {
        "python".into()
    }
    pub fn notion_api_url() -> String {
        "https://api.notion.com/v1".into()
    }
    pub fn notion_version() -> String {
        "2022-06-28".into()
    }
}
