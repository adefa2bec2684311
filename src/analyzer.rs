//! Ads Analysis Engine
//!
//! This module provides the entry point that orchestrates the ingestion
//! pipeline. It owns the fetcher, the brand resolver and the fallback store,
//! and exposes the read API consumed by reports and the CLI.
//!
//! ## Read Path
//!
//! [`AdsAnalyzer::get_ads_data`] runs one ingestion pass per call:
//!
//! 1. **Fetch**: every configured remote source, concurrently
//! 2. **Parse**: CSV tabs and the Apps Script JSON document become raw tables
//! 3. **Normalize**: headers, brand and values per row; bad rows are dropped
//! 4. **Assemble**: batches are merged in source order with unique ids
//! 5. **Fallback**: a non-empty result replaces the store; an empty one falls
//!    back to the store (the last good remote pass or upload), then to nothing
//! 6. **Filter**: brand and inclusive date range
//!
//! The read path never fails; every problem is logged and degrades to less data.
//!
//! ## Upload Path
//!
//! [`AdsAnalyzer::upload`] parses a CSV or JSON file, resolves brands against
//! the full enumeration (or the catalog for known JSON tabs) and replaces the
//! store in full. Invalid files leave the store untouched.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ads_insights::{AdsAnalyzer, AdsQuery, Brand, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = AdsAnalyzer::new(Config::load()?)?;
//! let fiat = analyzer.get_ads_data(&AdsQuery::for_brand(Brand::Fiat)).await;
//! println!("{} Fiat records", fiat.len());
//! # Ok(())
//! # }
//! ```

use crate::adapters::{RawTable, SourceFormat};
use crate::assembler::DatasetAssembler;
use crate::brand::BrandResolver;
use crate::config::Config;
use crate::fetcher::{configured_sources, FetchedSource, RemoteSource, SourceFetcher};
use crate::headers::HeaderMapping;
use crate::logging::pass_span;
use crate::models::{AdRecord, AdsQuery, UploadResult};
use crate::normalizer::{normalize_table, NormalizedBatch};
use crate::store::{DatasetStore, InMemoryStore};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

pub const UPLOAD_EMPTY: &str = "Nenhum arquivo enviado.";
pub const UPLOAD_NOT_UTF8: &str = "Falha ao processar o arquivo: o conteúdo não está em UTF-8.";
pub const UPLOAD_NO_USABLE_HEADERS: &str =
    "Falha ao processar o arquivo: nenhuma coluna de campanha ou conta foi encontrada.";
pub const UPLOAD_CSV_PARSE_FAILED: &str = "Falha ao processar o arquivo CSV.";
pub const UPLOAD_JSON_PARSE_FAILED: &str = "Falha ao processar o arquivo JSON.";
pub const UPLOAD_READ_FAILED: &str = "Falha ao ler o arquivo enviado.";

fn parse_failed_message(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::Csv => UPLOAD_CSV_PARSE_FAILED,
        SourceFormat::Json => UPLOAD_JSON_PARSE_FAILED,
    }
}

pub struct AdsAnalyzer {
    config: Config,
    resolver: BrandResolver,
    fetcher: SourceFetcher,
    sources: Vec<RemoteSource>,
    store: Arc<dyn DatasetStore>,
}

impl AdsAnalyzer {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    pub fn with_store(config: Config, store: Arc<dyn DatasetStore>) -> Result<Self> {
        let catalog = config.catalog()?;
        let fetcher = SourceFetcher::from_config(&config.sources)?;
        let sources = configured_sources(&config.sources, catalog.sheet_names());

        debug!(
            sources = sources.len(),
            catalog_entries = catalog.entries().len(),
            "Analyzer ready"
        );

        Ok(Self {
            config,
            resolver: BrandResolver::new(catalog),
            fetcher,
            sources,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn DatasetStore> {
        Arc::clone(&self.store)
    }

    pub fn sources(&self) -> &[RemoteSource] {
        &self.sources
    }

    /// Filtered records from remote sources, falling back to the store.
    pub async fn get_ads_data(&self, query: &AdsQuery) -> Vec<AdRecord> {
        let records = self.load_dataset().instrument(pass_span("remote")).await;
        let filtered = DatasetAssembler::filter(&records, query);
        debug!(
            total = records.len(),
            returned = filtered.len(),
            brand = ?query.brand,
            from = ?query.from,
            to = ?query.to,
            "Applied query filters"
        );
        filtered
    }

    async fn load_dataset(&self) -> Arc<Vec<AdRecord>> {
        let remote = self.fetch_remote().await;
        if !remote.is_empty() {
            info!(records = remote.len(), "Using remote dataset");
            self.store.replace(remote);
            return self.store.get();
        }

        let cached = self.store.get();
        if cached.is_empty() {
            info!("No remote data and no cached upload; returning empty dataset");
        } else {
            info!(records = cached.len(), "Remote sources empty; serving cached dataset");
        }
        cached
    }

    /// One fetch-and-normalize pass over every configured remote source.
    pub async fn fetch_remote(&self) -> Vec<AdRecord> {
        if self.sources.is_empty() {
            return Vec::new();
        }

        let fetched = self.fetcher.fetch_all(&self.sources).await;
        let batches: Vec<NormalizedBatch> = fetched
            .iter()
            .flat_map(|fetched| self.tables_from(fetched))
            .map(|table| normalize_table(&table, &self.resolver))
            .collect();

        DatasetAssembler::merge(batches)
    }

    fn tables_from(&self, fetched: &FetchedSource) -> Vec<RawTable> {
        let Some(body) = fetched.body.as_deref() else {
            return Vec::new();
        };

        let adapter = fetched.source.format().adapter();
        match adapter.parse(body) {
            Ok(tables) => match fetched.source.sheet() {
                Some(sheet) => tables.into_iter().map(|t| t.named(sheet)).collect(),
                None => tables,
            },
            Err(e) => {
                warn!(url = %fetched.source.url(), error = %e, "Failed to parse source body");
                Vec::new()
            }
        }
    }

    /// Replace the store with the contents of an uploaded CSV or JSON file.
    pub fn upload(&self, file_name: Option<&str>, bytes: &[u8]) -> UploadResult {
        let span = pass_span("upload");
        let _entered = span.enter();

        if bytes.is_empty() {
            return UploadResult::failed(UPLOAD_EMPTY);
        }

        let content = match std::str::from_utf8(bytes) {
            Ok(text) => text.trim_start_matches('\u{feff}'),
            Err(e) => {
                warn!(file = ?file_name, error = %e, "Upload is not valid UTF-8");
                return UploadResult::failed(UPLOAD_NOT_UTF8);
            }
        };
        if content.trim().is_empty() {
            return UploadResult::failed(UPLOAD_EMPTY);
        }

        let format = SourceFormat::detect(file_name, content);
        let tables = match format.adapter().parse(content) {
            Ok(tables) => tables,
            Err(e) => {
                warn!(file = ?file_name, format = ?format, error = %e, "Failed to parse upload");
                return UploadResult::failed(parse_failed_message(format));
            }
        };

        if !tables
            .iter()
            .any(|t| HeaderMapping::resolve(&t.headers).is_usable())
        {
            warn!(file = ?file_name, "Upload has no usable table");
            return UploadResult::failed(UPLOAD_NO_USABLE_HEADERS);
        }

        let batches: Vec<NormalizedBatch> = tables
            .iter()
            .map(|table| normalize_table(table, &self.resolver))
            .collect();
        let records = DatasetAssembler::merge(batches);
        let row_count = records.len();

        self.store.replace(records);
        info!(file = ?file_name, records = row_count, "Upload stored");

        UploadResult::ok(row_count)
    }

    /// Read a file from disk and [`upload`](Self::upload) it.
    pub async fn upload_file(&self, path: &Path) -> UploadResult {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let name = path.file_name().and_then(|n| n.to_str());
                self.upload(name, &bytes)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read upload file");
                UploadResult::failed(UPLOAD_READ_FAILED)
            }
        }
    }
}
