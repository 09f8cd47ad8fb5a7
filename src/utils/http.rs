// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use crate::error::{AppError, Result};
use crate::models::{HhConfig, NotionConfig};

const HH_USER_AGENT: HeaderName = HeaderName::from_static("hh-user-agent");
const NOTION_VERSION: HeaderName = HeaderName::from_static("notion-version");

/// Create the job board client.
///
/// Redirects are never followed: a `303` from the negotiations endpoint is an
/// answer, not a hop.
pub fn create_hh_client(config: &HhConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(HH_USER_AGENT, header_value(&config.user_agent)?);
    if !config.token.is_empty() {
        headers.insert(AUTHORIZATION, bearer(&config.token)?);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}

/// Create the Notion client, routed through the configured proxy if any.
pub fn create_notion_client(config: &NotionConfig, timeout_secs: u64) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer(&config.token)?);
    headers.insert(NOTION_VERSION, header_value(&config.version)?);

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs));
    if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = header_value(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::config(format!("invalid header value: {e}")))
}
