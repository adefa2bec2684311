//! Raw source adapters
//!
//! Every upstream (published sheet CSV, Apps Script JSON document, uploaded
//! file) is turned into one or more [`RawTable`]s here, so header resolution
//! and normalization only ever see one shape.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Header row plus string cells, aligned by column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Sheet/tab name when the source carries one.
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Pick a format from the file extension, sniffing the content otherwise.
    pub fn detect(file_name: Option<&str>, content: &str) -> Self {
        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => SourceFormat::Json,
            Some("csv") | Some("txt") => SourceFormat::Csv,
            _ => {
                let first = content.trim_start().chars().next();
                if matches!(first, Some('{') | Some('[')) {
                    SourceFormat::Json
                } else {
                    SourceFormat::Csv
                }
            }
        }
    }

    pub fn adapter(self) -> Box<dyn SourceAdapter> {
        match self {
            SourceFormat::Csv => Box::new(CsvAdapter),
            SourceFormat::Json => Box::new(JsonAdapter),
        }
    }
}

/// Turns raw source text into tables.
pub trait SourceAdapter: Send + Sync {
    fn parse(&self, content: &str) -> Result<Vec<RawTable>>;
}

/// Comma-delimited text with a header row and optional quoted fields.
pub struct CsvAdapter;

impl SourceAdapter for CsvAdapter {
    fn parse(&self, content: &str) -> Result<Vec<RawTable>> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("CSV content is empty");
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            anyhow::bail!("CSV header row is empty");
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    // skipEmptyLines: rows with no content at all
                    if record.iter().all(str::is_empty) {
                        continue;
                    }
                    rows.push(record.iter().map(str::to_string).collect());
                }
                Err(e) => {
                    // +2: 1-based lines plus the header row
                    warn!(line = idx + 2, error = %e, "Skipping unreadable CSV record");
                }
            }
        }

        debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV table");

        Ok(vec![RawTable {
            name: None,
            headers,
            rows,
        }])
    }
}

/// Apps Script document (`{"<tab>": [{..}, ..]}`) or a bare array of row objects.
pub struct JsonAdapter;

impl JsonAdapter {
    fn table_from_rows(name: Option<String>, rows: &[Value]) -> RawTable {
        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in rows {
            if let Value::Object(map) = row {
                for key in map.keys() {
                    if !positions.contains_key(key) {
                        positions.insert(key.clone(), headers.len());
                        headers.push(key.clone());
                    }
                }
            }
        }

        let mut table_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(map) = row else {
                debug!(table = ?name, "Skipping non-object JSON row");
                continue;
            };
            let mut cells = vec![String::new(); headers.len()];
            for (key, value) in map {
                if let Some(&idx) = positions.get(key) {
                    cells[idx] = stringify_cell(value);
                }
            }
            table_rows.push(cells);
        }

        RawTable {
            name,
            headers,
            rows: table_rows,
        }
    }
}

impl SourceAdapter for JsonAdapter {
    fn parse(&self, content: &str) -> Result<Vec<RawTable>> {
        let document: Value =
            serde_json::from_str(content.trim()).context("Failed to parse JSON document")?;

        match document {
            Value::Array(rows) => Ok(vec![Self::table_from_rows(None, &rows)]),
            Value::Object(tabs) => {
                let mut tables = Vec::with_capacity(tabs.len());
                for (tab, value) in tabs {
                    match value {
                        Value::Array(rows) => tables.push(Self::table_from_rows(Some(tab), &rows)),
                        _ => warn!(tab = %tab, "Skipping JSON tab that is not an array of rows"),
                    }
                }
                Ok(tables)
            }
            _ => anyhow::bail!("Unsupported JSON document: expected an object of tabs or an array of rows"),
        }
    }
}

fn stringify_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
