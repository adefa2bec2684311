//! Record normalization
//!
//! Turns one raw row (cells aligned with a [`RawTable`]'s headers) into an
//! [`AdRecord`], or a [`RowSkip`] explaining why the row was dropped.
//! Skips are per row; a bad row never aborts its table.
//!
//! Derived rates are always recomputed from the totals. A source's own
//! `Cost per lead` / `CPC` column is only read to log disagreement.

use crate::adapters::RawTable;
use crate::brand::{BrandResolver, RowContext};
use crate::dates::DateParser;
use crate::headers::{CanonicalField, HeaderMapping};
use crate::models::{AdRecord, Brand, NOT_AVAILABLE};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkip {
    #[error("missing date")]
    MissingDate,
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("no brand could be resolved")]
    UnresolvedBrand,
    #[error("malformed row: {0}")]
    Malformed(String),
}

impl RowSkip {
    pub fn kind(&self) -> &'static str {
        match self {
            RowSkip::MissingDate => "missing_date",
            RowSkip::InvalidDate(_) => "invalid_date",
            RowSkip::UnresolvedBrand => "unresolved_brand",
            RowSkip::Malformed(_) => "malformed",
        }
    }
}

/// Lenient decimal parse: blanks and garbage become 0, comma decimals are accepted.
///
/// The first comma is read as the decimal separator and the longest numeric
/// prefix is parsed, so `"1234,50"` is `1234.5` and `"12abc"` is `12`.
/// Negative and non-finite values are clamped to 0.
pub fn parse_number(raw: &str) -> f64 {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return 0.0;
    }
    let value = compact.replacen(',', ".", 1);
    let prefix = numeric_prefix(&value);
    match prefix.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

/// Integral part of [`parse_number`], saturating at `u64::MAX`.
pub fn parse_count(raw: &str) -> u64 {
    parse_number(raw).trunc() as u64
}

fn numeric_prefix(value: &str) -> &str {
    let bytes = value.as_bytes();
    let mut end = 0;
    let mut idx = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        idx += 1;
    }

    let int_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let mut digits = idx > int_start;
    if digits {
        end = idx;
    }

    if idx < bytes.len() && bytes[idx] == b'.' {
        idx += 1;
        let frac_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx > frac_start {
            digits = true;
            end = idx;
        }
    }

    if digits && idx == end && idx < bytes.len() && matches!(bytes[idx], b'e' | b'E') {
        let mut exp = idx + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_start = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_start {
            end = exp;
        }
    }

    &value[..end]
}

/// `numerator / denominator` when both are positive and the result is finite, else 0.
pub fn rate(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 || numerator <= 0.0 {
        return 0.0;
    }
    let value = numerator / denominator as f64;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn cell<'a>(row: &'a [String], mapping: &HeaderMapping, field: CanonicalField) -> &'a str {
    mapping
        .column(field)
        .and_then(|idx| row.get(idx))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn label(row: &[String], mapping: &HeaderMapping, field: CanonicalField) -> String {
    match cell(row, mapping, field) {
        "" => NOT_AVAILABLE.to_string(),
        value => value.to_string(),
    }
}

/// Normalize one row whose brand has already been chosen.
pub fn normalize_row(
    row: &[String],
    mapping: &HeaderMapping,
    brand: Option<Brand>,
    row_index: usize,
) -> Result<AdRecord, RowSkip> {
    let has_content = mapping
        .resolved()
        .any(|(_, idx)| row.get(idx).is_some_and(|c| !c.trim().is_empty()));
    if !has_content {
        return Err(RowSkip::Malformed("no values in any recognized column".to_string()));
    }

    let raw_date = cell(row, mapping, CanonicalField::Date);
    if raw_date.is_empty() {
        return Err(RowSkip::MissingDate);
    }
    let date = DateParser::parse(raw_date).map_err(|_| RowSkip::InvalidDate(raw_date.to_string()))?;

    let brand = brand.ok_or(RowSkip::UnresolvedBrand)?;

    let investment = parse_number(cell(row, mapping, CanonicalField::Investment));
    let leads = parse_count(cell(row, mapping, CanonicalField::Leads));
    let impressions = parse_count(cell(row, mapping, CanonicalField::Impressions));
    let clicks = parse_count(cell(row, mapping, CanonicalField::Clicks));

    let cpl = rate(investment, leads);
    let cpc = rate(investment, clicks);

    for (field, computed) in [(CanonicalField::Cpl, cpl), (CanonicalField::Cpc, cpc)] {
        let source = cell(row, mapping, field);
        if source.is_empty() {
            continue;
        }
        let reported = parse_number(source);
        if (reported - computed).abs() > 0.01 {
            debug!(
                row = row_index,
                field = %field,
                reported,
                computed,
                "Source rate disagrees with recomputed value"
            );
        }
    }

    Ok(AdRecord {
        id: format!("{}-{}-{}", date, brand, row_index),
        date,
        brand,
        account: label(row, mapping, CanonicalField::Account),
        campaign_name: label(row, mapping, CanonicalField::CampaignName),
        ad_set_name: label(row, mapping, CanonicalField::AdSetName),
        ad_name: label(row, mapping, CanonicalField::AdName),
        investment,
        leads,
        impressions,
        clicks,
        cpl,
        cpc,
    })
}

/// Records produced from one table plus per-reason skip counts.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub source: Option<String>,
    pub records: Vec<AdRecord>,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl NormalizedBatch {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Resolve headers, brand and values for every row of a table.
///
/// A table without a campaign or account column yields an empty batch.
pub fn normalize_table(table: &RawTable, resolver: &BrandResolver) -> NormalizedBatch {
    let source = table.name.as_deref();
    let mut batch = NormalizedBatch {
        source: table.name.clone(),
        ..NormalizedBatch::default()
    };

    let mapping = HeaderMapping::resolve(&table.headers);
    if !mapping.is_usable() {
        warn!(
            source = source.unwrap_or("<upload>"),
            headers = ?table.headers,
            "No campaign or account column found; source is unusable"
        );
        return batch;
    }
    debug!(
        source = source.unwrap_or("<upload>"),
        unresolved = ?mapping.unresolved(),
        "Resolved headers"
    );

    for (row_index, row) in table.rows.iter().enumerate() {
        let context = RowContext {
            source_name: source,
            campaign_name: cell(row, &mapping, CanonicalField::CampaignName),
            account: cell(row, &mapping, CanonicalField::Account),
        };
        let brand = resolver.resolve(&context);

        match normalize_row(row, &mapping, brand, row_index) {
            Ok(record) => batch.records.push(record),
            Err(skip) => {
                debug!(
                    source = source.unwrap_or("<upload>"),
                    row = row_index,
                    reason = %skip,
                    "Skipping row"
                );
                *batch.skipped.entry(skip.kind()).or_insert(0) += 1;
            }
        }
    }

    let skipped = batch.skipped_total();
    if skipped > 0 {
        warn!(
            source = source.unwrap_or("<upload>"),
            total_rows = table.rows.len(),
            records = batch.records.len(),
            skipped,
            reasons = ?batch.skipped,
            "Normalized source with skipped rows"
        );
    } else {
        info!(
            source = source.unwrap_or("<upload>"),
            records = batch.records.len(),
            "Normalized source"
        );
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn table(name: Option<&str>, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            name: name.map(str::to_string),
            headers: strings(headers),
            rows: rows.iter().map(|r| strings(r)).collect(),
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1000"), 1000.0);
        assert_eq!(parse_number("1234,50"), 1234.5);
        assert_eq!(parse_number(" 1 234,5 "), 1234.5);
        assert_eq!(parse_number("12abc"), 12.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("1e"), 1.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("-5"), 0.0);
        assert_eq!(parse_number("1e400"), 0.0);
    }

    #[test]
    fn test_parse_count_truncates() {
        assert_eq!(parse_count("50"), 50);
        assert_eq!(parse_count("7,9"), 7);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("1e19"), 10_000_000_000_000_000_000);
        assert_eq!(parse_count("1e30"), u64::MAX);
    }

    #[test]
    fn test_rate() {
        assert_eq!(rate(1000.0, 50), 20.0);
        assert_eq!(rate(1000.0, 0), 0.0);
        assert_eq!(rate(0.0, 10), 0.0);
    }

    #[test]
    fn test_end_to_end_row() {
        let headers = ["Reporting starts", "Campaign name", "Amount spent (BRL)", "Leads"];
        let mapping = HeaderMapping::resolve(&headers);
        let row = strings(&["2024-01-10", "Fiat Sinal Promo", "1000", "50"]);

        let record = normalize_row(&row, &mapping, Some(Brand::Fiat), 0).unwrap();
        assert_eq!(record.id, "2024-01-10-Fiat-0");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(record.investment, 1000.0);
        assert_eq!(record.leads, 50);
        assert_eq!(record.cpl, 20.0);
        assert_eq!(record.cpc, 0.0);
        assert_eq!(record.account, NOT_AVAILABLE);
        assert_eq!(record.ad_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_source_rates_are_overridden() {
        let headers = ["Data", "Campanha", "Investimento", "Cadastros", "Cliques (todos)", "Custo por lead", "CPC (todos)"];
        let mapping = HeaderMapping::resolve(&headers);
        let row = strings(&["15/03/2024", "Kia", "300,00", "3", "0", "999", "5"]);

        let record = normalize_row(&row, &mapping, Some(Brand::Kia), 4).unwrap();
        assert_eq!(record.cpl, 100.0);
        assert_eq!(record.cpc, 0.0);
        assert_eq!(record.id, "2024-03-15-Kia-4");
    }

    #[test]
    fn test_skip_reasons() {
        let mapping = HeaderMapping::resolve(&["Date", "Campaign name", "Leads"]);

        let missing = strings(&["", "Fiat", "1"]);
        assert_eq!(normalize_row(&missing, &mapping, Some(Brand::Fiat), 0), Err(RowSkip::MissingDate));

        let invalid = strings(&["32/13/2024", "Fiat", "1"]);
        assert!(matches!(
            normalize_row(&invalid, &mapping, Some(Brand::Fiat), 0),
            Err(RowSkip::InvalidDate(_))
        ));

        let unresolved = strings(&["2024-01-01", "Promo", "1"]);
        assert_eq!(normalize_row(&unresolved, &mapping, None, 0), Err(RowSkip::UnresolvedBrand));

        let blank = strings(&["", " ", ""]);
        assert!(matches!(
            normalize_row(&blank, &mapping, Some(Brand::Fiat), 0),
            Err(RowSkip::Malformed(_))
        ));
    }

    #[test]
    fn test_normalize_shared_account_split() {
        let mut rows: Vec<&[&str]> = Vec::new();
        for _ in 0..6 {
            rows.push(&["2024-02-01", "Omoda 5 Oferta", "60", "3"]);
        }
        for _ in 0..4 {
            rows.push(&["2024-02-01", "Jaecoo 7 Lançamento", "80", "4"]);
        }
        let table = table(
            Some("Omoda Jaecoo"),
            &["Reporting starts", "Campaign name", "Amount spent (BRL)", "Leads"],
            &rows,
        );

        let batch = normalize_table(&table, &BrandResolver::default());
        assert_eq!(batch.records.len(), 10);
        assert_eq!(batch.skipped_total(), 0);
        assert_eq!(batch.records.iter().filter(|r| r.brand == Brand::Omoda).count(), 6);
        assert_eq!(batch.records.iter().filter(|r| r.brand == Brand::Jaecoo).count(), 4);
    }

    #[test]
    fn test_normalize_counts_skips() {
        let table = table(
            Some("PSA"),
            &["Reporting starts", "Campaign name", "Leads"],
            &[
                &["2024-02-01", "Peugeot 208", "3"],
                &["2024-02-01", "Campanha institucional", "1"],
                &["bad", "Citroen C3", "1"],
            ],
        );
        let batch = normalize_table(&table, &BrandResolver::default());
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped.get("unresolved_brand"), Some(&1));
        assert_eq!(batch.skipped.get("invalid_date"), Some(&1));
    }

    #[test]
    fn test_shared_tab_row_naming_no_brand_is_skipped() {
        let table = table(
            Some("Omoda Jaecoo"),
            &["Reporting starts", "Campaign name", "Amount spent (BRL)", "Leads"],
            &[
                &["2024-03-01", "Institucional Feirão", "100", "5"],
                &["2024-03-01", "Omoda 5 Oferta", "60", "3"],
            ],
        );
        let batch = normalize_table(&table, &BrandResolver::default());
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].brand, Brand::Omoda);
        assert_eq!(batch.skipped.get("unresolved_brand"), Some(&1));
    }

    #[test]
    fn test_unusable_table_yields_nothing() {
        let table = table(None, &["Date", "Leads"], &[&["2024-01-01", "5"]]);
        let batch = normalize_table(&table, &BrandResolver::default());
        assert!(batch.records.is_empty());
    }
}
