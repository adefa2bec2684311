#![allow(dead_code)]

use ads_insights::config::{Config, SheetConfig};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const FIAT_CSV: &str = "Reporting starts,Campaign name,Amount spent (BRL),Leads\n\
                            2024-01-10,Fiat Sinal Promo,1000,50\n";

pub const PORTUGUESE_CSV: &str = "Início da veiculação,Nome da conta,Nome da campanha,Valor gasto (BRL),Resultados,Impressões,Cliques (todos)\n\
                                  15/03/2024,Kia Sinal,Kia Sportage Março,\"450,00\",9,12000,300\n\
                                  16/03/2024,Kia Sinal,Kia Sportage Março,\"150,50\",0,4000,\n";

pub fn write_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub fn sheet(name: &str, brands: &[&str]) -> SheetConfig {
    SheetConfig {
        name: name.to_string(),
        brands: brands.iter().map(|b| b.to_string()).collect(),
    }
}

/// Config pointing at a mock server, with a short timeout and the given tabs.
pub fn config_for(sheet_base_url: Option<String>, script_url: Option<String>, sheets: Vec<SheetConfig>) -> Config {
    let mut config = Config::default();
    config.sources.sheet_base_url = sheet_base_url;
    config.sources.script_url = script_url;
    config.sources.timeout_secs = 1;
    config.sources.sheets = sheets;
    config
}

/// `count` rows of one campaign on one day, each with `investment` and `leads`.
pub fn csv_rows(date: &str, campaign: &str, investment: &str, leads: u64, count: usize) -> String {
    (0..count)
        .map(|_| format!("{},{},{},{}\n", date, campaign, investment, leads))
        .collect()
}
