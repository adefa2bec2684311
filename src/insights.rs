//! AI insights
//!
//! The language model is an opaque collaborator behind [`InsightsGenerator`]:
//! it receives a CSV slice of the dataset (or a pair of monthly buckets) and
//! returns free text. [`InsightsService`] wraps a generator so that no
//! failure ever reaches the read path; every outcome becomes a message.

use crate::models::{AdRecord, Brand, MonthlyMetric};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

pub const NO_DATA_SUMMARY: &str = "Não há dados para gerar a análise.";
pub const EMPTY_SUMMARY: &str = "A análise de IA não retornou um resultado.";
pub const FAILED_SUMMARY: &str = "Ocorreu um erro ao gerar a análise de IA.";
pub const NO_DATA_REPORT: &str = "Não há dados para gerar o relatório.";
pub const EMPTY_REPORT: &str = "A análise de IA não retornou um relatório.";
pub const FAILED_REPORT: &str = "Ocorreu um erro ao gerar o relatório de IA.";
pub const FAILED_OBSERVATION: &str = "Não foi possível gerar a observação.";

/// Serialize records as CSV with a camelCase header row.
pub fn records_to_csv(records: &[AdRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record).context("Failed to serialize record to CSV")?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

#[async_trait]
pub trait InsightsGenerator: Send + Sync {
    async fn summarize(&self, brand: Brand, csv: &str) -> Result<Option<String>>;

    async fn general_report(&self, csv: &str) -> Result<Option<String>>;

    async fn monthly_observation(
        &self,
        current: &MonthlyMetric,
        previous: Option<&MonthlyMetric>,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightOutcome {
    pub status: InsightStatus,
    pub text: String,
}

impl InsightOutcome {
    fn success(text: String) -> Self {
        Self {
            status: InsightStatus::Success,
            text,
        }
    }

    fn error(text: &str) -> Self {
        Self {
            status: InsightStatus::Error,
            text: text.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InsightStatus::Success
    }
}

struct Messages {
    no_data: &'static str,
    empty: &'static str,
    failed: &'static str,
}

const SUMMARY_MESSAGES: Messages = Messages {
    no_data: NO_DATA_SUMMARY,
    empty: EMPTY_SUMMARY,
    failed: FAILED_SUMMARY,
};

const REPORT_MESSAGES: Messages = Messages {
    no_data: NO_DATA_REPORT,
    empty: EMPTY_REPORT,
    failed: FAILED_REPORT,
};

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

pub struct InsightsService<G> {
    generator: G,
}

impl<G: InsightsGenerator> InsightsService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    fn outcome(result: Result<Option<String>>, messages: &Messages) -> InsightOutcome {
        match result {
            Ok(text) => match non_blank(text) {
                Some(text) => InsightOutcome::success(text),
                None => InsightOutcome::error(messages.empty),
            },
            Err(e) => {
                warn!(error = %e, "Insights generator failed");
                InsightOutcome::error(messages.failed)
            }
        }
    }

    pub async fn brand_summary(&self, brand: Brand, records: &[AdRecord]) -> InsightOutcome {
        if records.is_empty() {
            return InsightOutcome::error(SUMMARY_MESSAGES.no_data);
        }
        let result = match records_to_csv(records) {
            Ok(csv) => {
                debug!(brand = %brand, rows = records.len(), "Requesting brand summary");
                self.generator.summarize(brand, &csv).await
            }
            Err(e) => Err(e),
        };
        Self::outcome(result, &SUMMARY_MESSAGES)
    }

    pub async fn general_report(&self, records: &[AdRecord]) -> InsightOutcome {
        if records.is_empty() {
            return InsightOutcome::error(REPORT_MESSAGES.no_data);
        }
        let result = match records_to_csv(records) {
            Ok(csv) => {
                debug!(rows = records.len(), "Requesting general report");
                self.generator.general_report(&csv).await
            }
            Err(e) => Err(e),
        };
        Self::outcome(result, &REPORT_MESSAGES)
    }

    pub async fn monthly_observation(
        &self,
        current: &MonthlyMetric,
        previous: Option<&MonthlyMetric>,
    ) -> String {
        match self.generator.monthly_observation(current, previous).await {
            Ok(text) => non_blank(text).unwrap_or_else(|| FAILED_OBSERVATION.to_string()),
            Err(e) => {
                warn!(month = %current.month_year, error = %e, "Monthly observation failed");
                FAILED_OBSERVATION.to_string()
            }
        }
    }

    /// Fill `observation` on every month, comparing each with the month before it.
    pub async fn annotate_months(&self, months: Vec<MonthlyMetric>) -> Vec<MonthlyMetric> {
        let observations = join_all(months.iter().enumerate().map(|(idx, current)| {
            let previous = idx.checked_sub(1).and_then(|p| months.get(p));
            self.monthly_observation(current, previous)
        }))
        .await;

        months
            .into_iter()
            .zip(observations)
            .map(|(mut month, observation)| {
                month.observation = Some(observation);
                month
            })
            .collect()
    }
}
