// src/models/listing.rs

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// One page-fetch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    pub page: u32,
}

impl WorkUnit {
    pub fn new(page: u32) -> Self {
        Self { page }
    }
}

/// A decoded listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage<I> {
    #[serde(default = "Vec::new")]
    pub items: Vec<I>,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub found: u64,
}

/// Employer block of a vacancy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    #[serde(default)]
    pub name: String,
}

/// A vacancy from the job board listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: String,
    /// Vacancy title
    pub name: String,
    #[serde(default)]
    pub employer: Employer,
    /// Public page of the vacancy
    #[serde(default)]
    pub alternate_url: String,
}

impl Vacancy {
    pub fn employer_name(&self) -> &str {
        &self.employer.name
    }

    /// Title and employer joined for word matching.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.name, self.employer.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NegotiationState {
    pub id: String,
}

/// An application already present on the job board.
#[derive(Debug, Clone, Deserialize)]
pub struct Negotiation {
    pub id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub state: Option<NegotiationState>,
    pub vacancy: Vacancy,
}

impl Negotiation {
    /// Relative url used as the idempotency key in Notion.
    pub fn url(&self) -> String {
        format!("/negotiations/{}", self.id)
    }
}

/// The job board writes offsets without a colon (`+0300`).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw))
        .map_err(serde::de::Error::custom)
}

/// A Notion page that references a negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationRecord {
    pub page_id: String,
    pub negotiation_url: String,
}

impl NegotiationRecord {
    /// Trailing id of the negotiation url.
    pub fn negotiation_id(&self) -> &str {
        self.negotiation_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// One message in a negotiation thread.
#[derive(Debug, Clone, Deserialize)]
pub struct NegotiationMessage {
    #[serde(default)]
    pub text: String,
    pub author: MessageAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageAuthor {
    pub participant_type: String,
}

impl NegotiationMessage {
    pub fn from_applicant(&self) -> bool {
        self.author.participant_type == "applicant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_vacancy_listing() {
        let page: ListingPage<Vacancy> = serde_json::from_str(
            r#"{
                "items": [{
                    "id": "101",
                    "name": "Python developer",
                    "employer": {"name": "Acme", "id": "7"},
                    "alternate_url": "https://hh.ru/vacancy/101",
                    "salary": null
                }],
                "pages": 3,
                "per_page": 2,
                "found": 5
            }"#,
        )
        .unwrap();

        assert_eq!(page.pages, 3);
        assert_eq!(page.found, 5);
        assert_eq!(page.items[0].employer_name(), "Acme");
        assert_eq!(page.items[0].searchable_text(), "Python developer Acme");
    }

    #[test]
    fn test_decodes_negotiation() {
        let negotiation: Negotiation = serde_json::from_str(
            r#"{
                "id": "555",
                "created_at": "2025-01-02T10:00:00+0300",
                "state": {"id": "discard"},
                "vacancy": {"id": "1", "name": "Dev", "employer": {"name": "Acme"}}
            }"#,
        )
        .unwrap();

        assert_eq!(negotiation.created_at.offset().local_minus_utc(), 3 * 3600);
        assert_eq!(negotiation.url(), "/negotiations/555");
        assert_eq!(negotiation.state.unwrap().id, "discard");
    }

    #[test]
    fn test_record_extracts_negotiation_id() {
        let record = NegotiationRecord {
            page_id: "p".to_string(),
            negotiation_url: "/negotiations/987/".to_string(),
        };
        assert_eq!(record.negotiation_id(), "987");
    }
}
