// src/pipeline/filter.rs

//! Vacancy eligibility checks.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::models::{BlacklistSet, SkipReason, Vacancy};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Decides whether a vacancy may be applied to.
///
/// The word blacklist is checked before the id blacklist; the first match
/// wins.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    blacklist: Arc<BlacklistSet>,
}

impl ItemFilter {
    pub fn new(blacklist: Arc<BlacklistSet>) -> Self {
        Self { blacklist }
    }

    /// Reason to skip the vacancy, or `None` if it is eligible.
    pub fn check(&self, vacancy: &Vacancy) -> Option<SkipReason> {
        if let Some(word) = self.blacklisted_word(&vacancy.searchable_text()) {
            return Some(SkipReason::BlacklistedWord(word));
        }
        if self.blacklist.ids.contains(&vacancy.id) {
            return Some(SkipReason::BlacklistedId);
        }
        None
    }

    pub fn eligible(&self, vacancy: &Vacancy) -> bool {
        self.check(vacancy).is_none()
    }

    fn blacklisted_word(&self, text: &str) -> Option<String> {
        if self.blacklist.words.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        WORD.find_iter(&lowered)
            .map(|m| m.as_str())
            .find(|word| self.blacklist.words.contains(*word))
            .map(str::to_string)
    }
}
