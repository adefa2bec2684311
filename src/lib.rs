//! Ads Insights Library
//!
//! Ingestion, normalization and reporting for multi-brand advertising
//! performance data. Rows arrive from published spreadsheet tabs (CSV), an
//! Apps Script JSON document, or manual uploads, with headers in English or
//! Portuguese, mixed date formats and shared accounts covering several
//! brands. This library turns them into one canonical, brand-tagged dataset
//! and aggregates it into KPIs, brand and campaign breakdowns, daily series
//! and monthly comparisons.
//!
//! ## Core Features
//!
//! - **Locale-tolerant headers**: declarative alias table with exact and
//!   substring passes
//! - **Brand disambiguation**: explicit per-source mapping, then longest-term
//!   matching scoped to a shared account's candidate brands
//! - **Recomputed rates**: CPL and CPC always derive from the totals
//! - **Fallback chain**: remote sources → last good dataset → empty
//! - **Flexible output formats**: colored terminal reports and JSON
//!
//! ## Architecture Overview
//!
//! - [`adapters`] - CSV and JSON sources to raw tables
//! - [`headers`] - header to canonical field resolution
//! - [`brand`] - source catalog and brand strategies
//! - [`normalizer`] - raw rows to [`AdRecord`]s
//! - [`fetcher`] - HTTP fetch with timeout and revalidation cache
//! - [`store`] - fallback dataset store
//! - [`assembler`] - merge and filter
//! - [`analyzer`] - orchestration, read API and upload
//! - [`aggregator`] - KPIs and breakdowns
//! - [`insights`] - CSV export and the language-model seam
//! - [`display`] - terminal and JSON reports
//! - [`config`] - configuration management with environment variable support
//! - [`logging`] - structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use ads_insights::{aggregator, AdsAnalyzer, AdsQuery, Config};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = AdsAnalyzer::new(Config::load()?)?;
//! let records = analyzer.get_ads_data(&AdsQuery::default()).await;
//! let months = aggregator::monthly_metrics(&records);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod aggregator;
pub mod analyzer;
pub mod assembler;
pub mod brand;
pub mod config;
pub mod dates;
pub mod display;
pub mod fetcher;
pub mod headers;
pub mod insights;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod store;

pub use analyzer::AdsAnalyzer;
pub use config::Config;
pub use models::*;
