// src/models/blacklist.rs

//! Word and id blacklists loaded once per run.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::ApplyConfig;

/// Immutable blacklist for one run.
#[derive(Debug, Clone, Default)]
pub struct BlacklistSet {
    pub words: HashSet<String>,
    pub ids: HashSet<String>,
}

impl BlacklistSet {
    pub fn new<W, I>(words: W, ids: I) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            ids: ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    /// Build the blacklist from the configured sources.
    pub fn load(config: &ApplyConfig) -> Result<Self> {
        let words = match &config.blacklist_words_file {
            Some(path) => read_lines(path)?,
            None => Vec::new(),
        };
        let mut ids = config.blacklist_ids.clone();
        if let Some(path) = &config.blacklist_ids_file {
            ids.extend(read_lines(path)?);
        }

        let blacklist = Self::new(words, ids);
        log::info!(
            "Blacklist loaded: {} words, {} ids",
            blacklist.words.len(),
            blacklist.ids.len()
        );
        Ok(blacklist)
    }
}

/// Non-empty lines, `#` starts a comment.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
