//! Remote source fetching
//!
//! Pulls raw text from the published sheet CSV endpoint (one request per tab)
//! and from the Apps Script JSON endpoint. Every failure mode (bad status,
//! network error, timeout, empty body) degrades to `None` for that source only.
//!
//! Successful bodies are kept for a revalidation window so repeated reads do
//! not hit the upstream again. Failures are never cached.

use crate::adapters::SourceFormat;
use crate::config::SourcesConfig;
use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::future::join_all;
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One upstream to pull from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSource {
    /// One tab of the published spreadsheet, exported as CSV.
    SheetCsv { sheet: String, url: String },
    /// Apps Script document keyed by tab name.
    ScriptJson { url: String },
}

impl RemoteSource {
    /// Tab URL: the published-sheet base URL with `sheet=<name>` appended.
    pub fn sheet_csv(base_url: &str, sheet: &str) -> Result<Self> {
        let url = Url::parse_with_params(base_url, &[("sheet", sheet)])
            .with_context(|| format!("Invalid sheet base URL: {}", base_url))?;
        Ok(RemoteSource::SheetCsv {
            sheet: sheet.to_string(),
            url: url.to_string(),
        })
    }

    pub fn script_json(url: impl Into<String>) -> Self {
        RemoteSource::ScriptJson { url: url.into() }
    }

    pub fn url(&self) -> &str {
        match self {
            RemoteSource::SheetCsv { url, .. } | RemoteSource::ScriptJson { url } => url,
        }
    }

    /// Tab name for sheet sources; script documents carry their own tab names.
    pub fn sheet(&self) -> Option<&str> {
        match self {
            RemoteSource::SheetCsv { sheet, .. } => Some(sheet),
            RemoteSource::ScriptJson { .. } => None,
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            RemoteSource::SheetCsv { .. } => SourceFormat::Csv,
            RemoteSource::ScriptJson { .. } => SourceFormat::Json,
        }
    }
}

/// A fetched body, or `None` when the source contributed nothing.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub source: RemoteSource,
    pub body: Option<Arc<str>>,
}

#[derive(Debug, Clone)]
struct CachedBody {
    fetched_at: Instant,
    body: Arc<str>,
}

pub struct SourceFetcher {
    client: reqwest::Client,
    revalidate: Duration,
    cache: DashMap<String, CachedBody>,
}

impl SourceFetcher {
    pub fn new(timeout: Duration, revalidate: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            revalidate,
            cache: DashMap::new(),
        })
    }

    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.revalidate_secs),
        )
    }

    fn cached(&self, url: &str) -> Option<Arc<str>> {
        let entry = self.cache.get(url)?;
        if entry.fetched_at.elapsed() < self.revalidate {
            Some(Arc::clone(&entry.body))
        } else {
            None
        }
    }

    /// GET `url` and return its body, or `None` on any failure.
    pub async fn fetch(&self, url: &str) -> Option<Arc<str>> {
        if let Some(body) = self.cached(url) {
            debug!(url = %url, "Serving source from revalidation cache");
            return Some(body);
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    warn!(url = %url, "Source fetch timed out");
                } else {
                    warn!(url = %url, error = %e, "Source fetch failed");
                }
                return None;
            }
        };

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            // The published-sheet endpoint answers 400 for tabs that do not exist
            debug!(url = %url, "Source does not exist upstream");
            return None;
        }
        if !status.is_success() {
            warn!(url = %url, status = %status, "Source returned an error status");
            return None;
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read source body");
                return None;
            }
        };

        if text.trim().is_empty() {
            debug!(url = %url, "Source returned an empty body");
            return None;
        }

        let body: Arc<str> = Arc::from(text);
        self.cache.insert(
            url.to_string(),
            CachedBody {
                fetched_at: Instant::now(),
                body: Arc::clone(&body),
            },
        );
        Some(body)
    }

    /// Fetch every source concurrently; each resolves independently.
    pub async fn fetch_all(&self, sources: &[RemoteSource]) -> Vec<FetchedSource> {
        let results = join_all(sources.iter().map(|source| async move {
            FetchedSource {
                source: source.clone(),
                body: self.fetch(source.url()).await,
            }
        }))
        .await;

        let succeeded = results.iter().filter(|r| r.body.is_some()).count();
        info!(
            requested = sources.len(),
            succeeded,
            "Fetched remote sources"
        );
        results
    }
}

/// Every remote source the configuration enables, in catalog order.
pub fn configured_sources<'a>(
    config: &SourcesConfig,
    sheets: impl IntoIterator<Item = &'a str>,
) -> Vec<RemoteSource> {
    let mut sources = Vec::new();

    if let Some(base) = config.sheet_base_url.as_deref() {
        for sheet in sheets {
            match RemoteSource::sheet_csv(base, sheet) {
                Ok(source) => sources.push(source),
                Err(e) => warn!(sheet = %sheet, error = %e, "Skipping sheet source"),
            }
        }
    }

    if let Some(url) = config.script_url.as_deref() {
        sources.push(RemoteSource::script_json(url));
    }

    if sources.is_empty() {
        debug!("No remote sources configured");
    }
    sources
}
