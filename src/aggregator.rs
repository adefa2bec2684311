//! Aggregated views over a canonical dataset.
//!
//! Pure functions of `&[AdRecord]`; input order never changes the totals.
//! Every rate is ratio-of-sums and 0 when its denominator is 0. Counts
//! saturate at `u64::MAX` instead of overflowing.

use crate::dates::month_name_pt;
use crate::models::{AdRecord, Brand, BrandTotals, CampaignMetrics, DailyLeads, KpiSummary, MonthlyMetric, NOT_AVAILABLE};
use crate::normalizer::rate;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

pub const UNNAMED_CAMPAIGN: &str = "Campanha sem nome";

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    investment: f64,
    leads: u64,
    clicks: u64,
    impressions: u64,
}

impl Totals {
    fn add(&mut self, record: &AdRecord) {
        self.investment += record.investment;
        self.leads = self.leads.saturating_add(record.leads);
        self.clicks = self.clicks.saturating_add(record.clicks);
        self.impressions = self.impressions.saturating_add(record.impressions);
    }
}

pub fn kpi_summary(records: &[AdRecord]) -> KpiSummary {
    let mut totals = Totals::default();
    records.iter().for_each(|r| totals.add(r));

    KpiSummary {
        record_count: records.len(),
        total_investment: totals.investment,
        total_leads: totals.leads,
        total_clicks: totals.clicks,
        total_impressions: totals.impressions,
        average_cpl: rate(totals.investment, totals.leads),
        average_cpc: rate(totals.investment, totals.clicks),
    }
}

/// One bucket per calendar month, ascending by `yyyy-MM`.
pub fn monthly_metrics(records: &[AdRecord]) -> Vec<MonthlyMetric> {
    let mut months: BTreeMap<(i32, u32), Totals> = BTreeMap::new();
    for record in records {
        months
            .entry((record.date.year(), record.date.month()))
            .or_default()
            .add(record);
    }

    months
        .into_iter()
        .map(|((year, month), totals)| MonthlyMetric {
            month: month_name_pt(month).to_string(),
            year,
            month_year: format!("{:04}-{:02}", year, month),
            investment: totals.investment,
            conversions: totals.leads,
            reach: totals.impressions,
            cpl: rate(totals.investment, totals.leads),
            observation: None,
        })
        .collect()
}

/// Per-brand totals, most leads first.
pub fn brand_totals(records: &[AdRecord]) -> Vec<BrandTotals> {
    let mut brands: HashMap<Brand, Totals> = HashMap::new();
    for record in records {
        brands.entry(record.brand).or_default().add(record);
    }

    let mut result: Vec<BrandTotals> = brands
        .into_iter()
        .map(|(brand, totals)| BrandTotals {
            brand,
            investment: totals.investment,
            leads: totals.leads,
            clicks: totals.clicks,
            impressions: totals.impressions,
            cpl: rate(totals.investment, totals.leads),
        })
        .collect();

    result.sort_by(|a, b| b.leads.cmp(&a.leads).then_with(|| a.brand.as_str().cmp(b.brand.as_str())));
    result
}

/// Per-campaign totals, most leads first. Unnamed campaigns share one bucket.
pub fn campaign_metrics(records: &[AdRecord]) -> Vec<CampaignMetrics> {
    let mut campaigns: HashMap<&str, Totals> = HashMap::new();
    for record in records {
        let name = match record.campaign_name.trim() {
            "" | NOT_AVAILABLE => UNNAMED_CAMPAIGN,
            name => name,
        };
        campaigns.entry(name).or_default().add(record);
    }

    let mut result: Vec<CampaignMetrics> = campaigns
        .into_iter()
        .map(|(name, totals)| CampaignMetrics {
            campaign_name: name.to_string(),
            investment: totals.investment,
            leads: totals.leads,
            clicks: totals.clicks,
            impressions: totals.impressions,
            cpl: rate(totals.investment, totals.leads),
        })
        .collect();

    result.sort_by(|a, b| b.leads.cmp(&a.leads).then_with(|| a.campaign_name.cmp(&b.campaign_name)));
    result
}

/// Leads and spend per day, ascending by date.
pub fn daily_leads(records: &[AdRecord]) -> Vec<DailyLeads> {
    let mut days: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.date).or_insert((0, 0.0));
        day.0 = day.0.saturating_add(record.leads);
        day.1 += record.investment;
    }

    days.into_iter()
        .map(|(date, (leads, investment))| DailyLeads { date, leads, investment })
        .collect()
}
