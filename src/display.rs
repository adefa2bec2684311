//! Output Formatting and Display Management
//!
//! This module handles all output formatting for report results. It provides
//! both human-readable terminal output with colors and structured JSON output
//! for programmatic consumption.
//!
//! ## Report Types
//!
//! - **Overview**: KPI cards plus per-brand totals
//! - **Monthly**: month-over-month comparison with optional observations
//! - **Campaigns**: per-campaign breakdown, most leads first
//! - **Daily**: leads and spend per day
//!
//! ## JSON Output
//!
//! Each report is wrapped in a single key (`overview`, `monthly`,
//! `campaigns`, `daily`) with camelCase fields:
//!
//! ```json
//! {
//!   "monthly": [
//!     {
//!       "month": "janeiro",
//!       "year": 2024,
//!       "monthYear": "2024-01",
//!       "investment": 400.0,
//!       "conversions": 20,
//!       "reach": 2000,
//!       "cpl": 20.0
//!     }
//!   ]
//! }
//! ```
//!
//! Money is shown in the Brazilian convention (`R$ 1.234,50`).

use crate::config::OutputConfig;
use crate::models::*;
use colored::Colorize;
use serde::Serialize;

pub struct DisplayManager {
    currency_symbol: String,
    json_pretty: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}

/// `1234567` → `1.234.567`
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `1234.5` → `R$ 1.234,50`
pub fn format_currency(value: f64, symbol: &str) -> String {
    let cents = (value * 100.0).round().max(0.0) as u64;
    format!("{} {},{:02}", symbol, format_number(cents / 100), cents % 100)
}

impl DisplayManager {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            currency_symbol: output.currency_symbol.clone(),
            json_pretty: output.json_pretty,
        }
    }

    fn money(&self, value: f64) -> String {
        format_currency(value, &self.currency_symbol)
    }

    fn print_json<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error serializing {} data to JSON: {}", key, e);
                return;
            }
        };
        let mut output = serde_json::Map::new();
        output.insert(key.to_string(), value);
        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        match rendered {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing {} data to JSON: {}", key, e),
        }
    }

    fn header(&self, title: &str) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());
    }

    pub fn display_overview(&self, kpis: &KpiSummary, brands: &[BrandTotals], json_output: bool) {
        if json_output {
            self.print_json(
                "overview",
                &serde_json::json!({ "kpis": kpis, "brands": brands }),
            );
            return;
        }

        self.header("Relatório de Anúncios - Visão Geral");

        if kpis.record_count == 0 {
            println!("\n{}", "Nenhum dado encontrado para o período selecionado.".yellow());
            return;
        }

        println!(
            "\n{} {} registros • {} investidos • {} leads\n",
            "📊".bright_yellow(),
            format_number(kpis.record_count as u64).bright_white().bold(),
            self.money(kpis.total_investment).bright_green().bold(),
            format_number(kpis.total_leads).bright_white().bold()
        );
        println!("   {:<14} {}", "CPL médio:", self.money(kpis.average_cpl).bright_green());
        println!("   {:<14} {}", "CPC médio:", self.money(kpis.average_cpc).bright_green());
        println!("   {:<14} {}", "Cliques:", format_number(kpis.total_clicks).bright_white());
        println!("   {:<14} {}", "Impressões:", format_number(kpis.total_impressions).bright_white());

        if brands.is_empty() {
            return;
        }

        println!("\n{}", "Por marca".bright_white().bold());
        for brand in brands {
            let share = if kpis.total_leads > 0 {
                brand.leads as f64 / kpis.total_leads as f64 * 100.0
            } else {
                0.0
            };
            println!(
                "   {:<10} {} leads ({}%) • {} • CPL {}",
                brand.brand.as_str().bright_cyan(),
                format_number(brand.leads).bright_white(),
                format!("{:.0}", share).bright_yellow(),
                self.money(brand.investment).bright_green(),
                self.money(brand.cpl).green()
            );
        }
        println!();
    }

    pub fn display_monthly(&self, months: &[MonthlyMetric], json_output: bool) {
        if json_output {
            self.print_json("monthly", &months);
            return;
        }

        self.header("Relatório de Anúncios - Comparativo Mensal");

        if months.is_empty() {
            println!("\n{}", "Nenhum dado mensal disponível.".yellow());
            return;
        }

        println!();
        let mut previous: Option<&MonthlyMetric> = None;
        for month in months {
            let trend = match previous {
                Some(prev) if month.conversions > prev.conversions => "▲".bright_green(),
                Some(prev) if month.conversions < prev.conversions => "▼".bright_red(),
                Some(_) => "=".white(),
                None => " ".white(),
            };
            println!(
                "{} {} {} — {} • {} conversões • {} alcance • CPL {}",
                "📅".bright_blue(),
                format!("{} {}", month.month, month.year).bright_white().bold(),
                trend,
                self.money(month.investment).bright_green().bold(),
                format_number(month.conversions).bright_white(),
                format_number(month.reach).bright_white(),
                self.money(month.cpl).green()
            );
            if let Some(observation) = &month.observation {
                println!("   {}", observation.italic());
            }
            previous = Some(month);
        }
        println!();
    }

    pub fn display_campaigns(&self, campaigns: &[CampaignMetrics], limit: Option<usize>, json_output: bool) {
        let shown = &campaigns[..limit.unwrap_or(campaigns.len()).min(campaigns.len())];

        if json_output {
            self.print_json("campaigns", &shown);
            return;
        }

        self.header("Relatório de Anúncios - Campanhas");

        if shown.is_empty() {
            println!("\n{}", "Nenhuma campanha encontrada.".yellow());
            return;
        }

        println!();
        for campaign in shown {
            println!(
                "   {} — {} leads • {} • CPL {} • {} cliques",
                campaign.campaign_name.bright_cyan(),
                format_number(campaign.leads).bright_white().bold(),
                self.money(campaign.investment).bright_green(),
                self.money(campaign.cpl).green(),
                format_number(campaign.clicks).bright_white()
            );
        }
        if shown.len() < campaigns.len() {
            println!(
                "\n   {}",
                format!("… e mais {} campanhas", campaigns.len() - shown.len()).dimmed()
            );
        }
        println!();
    }

    pub fn display_daily(&self, days: &[DailyLeads], json_output: bool) {
        if json_output {
            self.print_json("daily", &days);
            return;
        }

        self.header("Relatório de Anúncios - Leads por Dia");

        if days.is_empty() {
            println!("\n{}", "Nenhum dado encontrado para o período selecionado.".yellow());
            return;
        }

        println!();
        for day in days {
            println!(
                "{} {} — {} leads • {}",
                "📅".bright_blue(),
                day.date.format("%d/%m/%Y").to_string().bright_white().bold(),
                format_number(day.leads).bright_white(),
                self.money(day.investment).bright_green()
            );
        }
        println!();
    }

    pub fn display_upload(&self, result: &UploadResult) {
        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        };
        match rendered {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing upload result to JSON: {}", e),
        }
    }
}
