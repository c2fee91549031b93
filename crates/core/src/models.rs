use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One manifest entry: what to ingest and how to label it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentDescriptor {
    pub title: String,
    #[serde(alias = "path")]
    pub locator: String,
    #[serde(default)]
    pub category: String,
}

impl DocumentDescriptor {
    pub fn new(
        title: impl Into<String>,
        locator: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
            category: category.into(),
        }
    }
}

/// A successfully ingested document. Never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: String,
    pub locator: String,
    pub category: String,
    pub content: String,
    pub pages: u32,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedDocument {
    pub title: String,
    pub locator: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub text: String,
    pub title: String,
    pub locator: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Pages read from the front of each document.
    pub max_pages: u32,
    /// Keep only the first N indexable manifest entries.
    pub max_documents: Option<usize>,
    /// Snippet width in characters, split evenly around the match.
    pub snippet_window: usize,
    pub result_limit: usize,
    /// Query tokens shorter than this are dropped.
    pub min_token_chars: usize,
    /// Documents fetched and extracted at the same time.
    pub concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_pages: 5,
            max_documents: None,
            snippet_window: 500,
            result_limit: 2,
            min_token_chars: 3,
            concurrency: 4,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}
