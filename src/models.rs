//! Core Data Models
//!
//! This module defines the primary data structures used throughout the ads
//! ingestion pipeline. These models represent the complete flow from a
//! normalized advertising row to the aggregated views consumed by reports.
//!
//! ## Data Flow
//!
//! 1. **Canonical Data**: [`AdRecord`] - One normalized row, tagged with exactly one [`Brand`]
//! 2. **Query**: [`AdsQuery`] - Optional brand and date-range filter for the read API
//! 3. **Aggregation**: [`KpiSummary`], [`BrandTotals`], [`CampaignMetrics`], [`DailyLeads`]
//! 4. **Comparison**: [`MonthlyMetric`] - Month-over-month buckets
//! 5. **Upload**: [`UploadResult`] - Outcome of a manual file upload
//!
//! ## Features
//!
//! - **Serde Integration**: Public types serialize with the camelCase keys the
//!   dashboard and the insights collaborator expect
//! - **Closed Brand Set**: [`Brand`] is an enumeration, so an unresolved brand
//!   cannot be represented in a record
//! - **Calendar Dates**: record dates are [`NaiveDate`], serialized as `yyyy-MM-dd`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder stored in free-text labels that were absent from the source.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Brand {
    Fiat,
    Jeep,
    Ram,
    Peugeot,
    Citroen,
    Nissan,
    Honda,
    Asti,
    Ford,
    Gac,
    Geely,
    #[serde(rename = "GS")]
    Gs,
    Hyundai,
    Kia,
    Leap,
    Neta,
    Omoda,
    Jaecoo,
    Renault,
}

impl Brand {
    /// Every known brand, in declaration order.
    pub const ALL: [Brand; 19] = [
        Brand::Fiat,
        Brand::Jeep,
        Brand::Ram,
        Brand::Peugeot,
        Brand::Citroen,
        Brand::Nissan,
        Brand::Honda,
        Brand::Asti,
        Brand::Ford,
        Brand::Gac,
        Brand::Geely,
        Brand::Gs,
        Brand::Hyundai,
        Brand::Kia,
        Brand::Leap,
        Brand::Neta,
        Brand::Omoda,
        Brand::Jaecoo,
        Brand::Renault,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Brand::Fiat => "Fiat",
            Brand::Jeep => "Jeep",
            Brand::Ram => "Ram",
            Brand::Peugeot => "Peugeot",
            Brand::Citroen => "Citroen",
            Brand::Nissan => "Nissan",
            Brand::Honda => "Honda",
            Brand::Asti => "Asti",
            Brand::Ford => "Ford",
            Brand::Gac => "Gac",
            Brand::Geely => "Geely",
            Brand::Gs => "GS",
            Brand::Hyundai => "Hyundai",
            Brand::Kia => "Kia",
            Brand::Leap => "Leap",
            Brand::Neta => "Neta",
            Brand::Omoda => "Omoda",
            Brand::Jaecoo => "Jaecoo",
            Brand::Renault => "Renault",
        }
    }

    /// Lowercase terms searched for inside campaign/account text.
    pub fn search_terms(self) -> &'static [&'static str] {
        match self {
            Brand::Fiat => &["fiat"],
            Brand::Jeep => &["jeep"],
            Brand::Ram => &["ram"],
            Brand::Peugeot => &["peugeot"],
            Brand::Citroen => &["citroën", "citroen"],
            Brand::Nissan => &["nissan"],
            Brand::Honda => &["honda"],
            Brand::Asti => &["asti"],
            Brand::Ford => &["ford"],
            Brand::Gac => &["gac"],
            Brand::Geely => &["geely"],
            Brand::Gs => &["gs"],
            Brand::Hyundai => &["hyundai"],
            Brand::Kia => &["kia"],
            Brand::Leap => &["leap"],
            Brand::Neta => &["neta"],
            Brand::Omoda => &["omoda"],
            Brand::Jaecoo => &["jaecoo"],
            Brand::Renault => &["renault"],
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBrand(pub String);

impl fmt::Display for UnknownBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown brand: {}", self.0)
    }
}

impl std::error::Error for UnknownBrand {}

impl FromStr for Brand {
    type Err = UnknownBrand;

    /// Case-insensitive match against the brand identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Brand::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownBrand(wanted.to_string()))
    }
}

/// One canonical, normalized advertising row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    pub id: String,
    pub date: NaiveDate,
    pub brand: Brand,
    pub account: String,
    pub campaign_name: String,
    pub ad_set_name: String,
    pub ad_name: String,
    pub investment: f64,
    pub leads: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub cpl: f64,
    pub cpc: f64,
}

/// Filter accepted by the consumer-facing read API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdsQuery {
    pub brand: Option<Brand>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AdsQuery {
    pub fn for_brand(brand: Brand) -> Self {
        Self {
            brand: Some(brand),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetric {
    pub month: String,
    pub year: i32,
    pub month_year: String,
    pub investment: f64,
    pub conversions: u64,
    pub reach: u64,
    pub cpl: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub record_count: usize,
    pub total_investment: f64,
    pub total_leads: u64,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub average_cpl: f64,
    pub average_cpc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandTotals {
    pub brand: Brand,
    pub investment: f64,
    pub leads: u64,
    pub clicks: u64,
    pub impressions: u64,
    pub cpl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetrics {
    pub campaign_name: String,
    pub investment: f64,
    pub leads: u64,
    pub clicks: u64,
    pub impressions: u64,
    pub cpl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLeads {
    pub date: NaiveDate,
    pub leads: u64,
    pub investment: f64,
}

/// Result of a manual upload, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn ok(row_count: usize) -> Self {
        Self {
            success: true,
            row_count: Some(row_count),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            row_count: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_parses_case_insensitively() {
        assert_eq!("fiat".parse::<Brand>(), Ok(Brand::Fiat));
        assert_eq!(" JAECOO ".parse::<Brand>(), Ok(Brand::Jaecoo));
        assert_eq!("gs".parse::<Brand>(), Ok(Brand::Gs));
        assert!("Tesla".parse::<Brand>().is_err());
    }

    #[test]
    fn brand_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&Brand::Gs).unwrap(), "\"GS\"");
        assert_eq!(serde_json::to_string(&Brand::Citroen).unwrap(), "\"Citroen\"");
    }

    #[test]
    fn record_serializes_with_camel_case_and_iso_date() {
        let record = AdRecord {
            id: "2024-01-10-Fiat-0".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            brand: Brand::Fiat,
            account: NOT_AVAILABLE.to_string(),
            campaign_name: "Fiat Sinal Promo".to_string(),
            ad_set_name: NOT_AVAILABLE.to_string(),
            ad_name: NOT_AVAILABLE.to_string(),
            investment: 1000.0,
            leads: 50,
            impressions: 0,
            clicks: 0,
            cpl: 20.0,
            cpc: 0.0,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-10");
        assert_eq!(json["campaignName"], "Fiat Sinal Promo");
        assert_eq!(json["brand"], "Fiat");
    }

    #[test]
    fn upload_result_omits_absent_fields() {
        let json = serde_json::to_string(&UploadResult::ok(3)).unwrap();
        assert_eq!(json, r#"{"success":true,"rowCount":3}"#);

        let json = serde_json::to_string(&UploadResult::failed("boom")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }
}
