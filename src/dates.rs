use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Handles parsing report dates from the formats seen in ad exports
pub struct DateParser;

impl DateParser {
    /// Parse a raw cell into a calendar date.
    ///
    /// Values containing `/` are read as day/month/year (the Brazilian sheet
    /// locale). Everything else is read as year-month-day, falling back to a
    /// full timestamp whose date part is kept.
    pub fn parse(raw: &str) -> Result<NaiveDate> {
        let value = raw.trim();
        if value.is_empty() {
            anyhow::bail!("Empty date value");
        }

        if value.contains('/') {
            return NaiveDate::parse_from_str(value, "%d/%m/%Y")
                .map_err(|e| anyhow::anyhow!("Failed to parse day/month/year date '{}': {}", value, e));
        }

        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(date);
        }

        // Source-native timestamps, e.g. JSON exports serializing a Date
        let timestamp = if value.ends_with('Z') {
            value.replace('Z', "+00:00")
        } else {
            value.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
            return Ok(dt.date_naive());
        }

        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
                return Ok(naive.date());
            }
        }

        anyhow::bail!("Failed to parse date: {}", value)
    }
}

/// Portuguese month name used for monthly comparison labels.
pub fn month_name_pt(month: u32) -> &'static str {
    match month {
        1 => "janeiro",
        2 => "fevereiro",
        3 => "março",
        4 => "abril",
        5 => "maio",
        6 => "junho",
        7 => "julho",
        8 => "agosto",
        9 => "setembro",
        10 => "outubro",
        11 => "novembro",
        12 => "dezembro",
        _ => "desconhecido",
    }
}
