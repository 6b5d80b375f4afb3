//! Run-scoped URL → page text cache. Each distinct URL is fetched exactly once per run.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::content::fetch::PageFetcher;

/// A URL whose page could not be fetched. The run continues with empty text for it.
#[derive(Debug, Clone, Serialize)]
pub struct FetchWarning {
    pub url: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct PageContentCache {
    pages: HashMap<String, String>,
}

impl PageContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches every distinct URL in `urls` (first-seen order) that is not cached yet.
    /// Failures cache an empty string and are returned as warnings.
    pub async fn warm<'a, I>(&mut self, fetcher: &dyn PageFetcher, urls: I) -> Vec<FetchWarning>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let pending: Vec<&str> = urls
            .into_iter()
            .filter(|url| !self.pages.contains_key(*url) && seen.insert(*url))
            .collect();

        let mut warnings = Vec::new();
        for (i, url) in pending.iter().enumerate() {
            info!("Fetching product page {}/{}: {}", i + 1, pending.len(), url);
            let text = match fetcher.fetch(url).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to fetch {url}: {e}");
                    warnings.push(FetchWarning {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                    String::new()
                }
            };
            self.pages.insert(url.to_string(), text);
        }
        warnings
    }

    /// Cached text for `url`; empty when unknown or when the fetch failed.
    pub fn text(&self, url: &str) -> &str {
        self.pages.get(url.trim()).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
