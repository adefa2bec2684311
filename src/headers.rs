//! Header resolution
//!
//! Ad exports arrive with English (`Amount spent (BRL)`) or Portuguese
//! (`Valor gasto (BRL)`) headers, sometimes with a BOM or stray whitespace.
//! [`HeaderMapping::resolve`] maps them onto a fixed set of canonical fields
//! using a declarative alias table.
//!
//! Resolution runs in two passes:
//!
//! 1. **Exact**: a normalized header equal to any alias of a field claims it.
//!    The first header in source order wins.
//! 2. **Contains**: fields still unresolved take the first unclaimed header
//!    containing one of their aliases, tried in alias priority order.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Date,
    Account,
    CampaignName,
    AdSetName,
    AdName,
    Investment,
    Leads,
    Impressions,
    Clicks,
    Cpl,
    Cpc,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::Date,
        CanonicalField::Account,
        CanonicalField::CampaignName,
        CanonicalField::AdSetName,
        CanonicalField::AdName,
        CanonicalField::Investment,
        CanonicalField::Leads,
        CanonicalField::Impressions,
        CanonicalField::Clicks,
        CanonicalField::Cpl,
        CanonicalField::Cpc,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Account => "account",
            CanonicalField::CampaignName => "campaignName",
            CanonicalField::AdSetName => "adSetName",
            CanonicalField::AdName => "adName",
            CanonicalField::Investment => "investment",
            CanonicalField::Leads => "leads",
            CanonicalField::Impressions => "impressions",
            CanonicalField::Clicks => "clicks",
            CanonicalField::Cpl => "cpl",
            CanonicalField::Cpc => "cpc",
        }
    }

    /// Lowercase aliases in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Date => &[
                "reporting starts",
                "data",
                "início da veiculação",
                "date",
                "day",
                "dia",
            ],
            CanonicalField::Account => &["account", "account name", "lojas", "nome da conta", "conta"],
            CanonicalField::CampaignName => &["campaign name", "nome da campanha", "campanha"],
            CanonicalField::AdSetName => &["ad set name", "nome do conjunto de anúncios"],
            CanonicalField::AdName => &["ad name", "nome do anúncio"],
            CanonicalField::Investment => &[
                "amount spent (brl)",
                "investimento",
                "valor gasto (brl)",
                "amount spent",
            ],
            CanonicalField::Leads => &["leads", "resultados", "cadastros"],
            CanonicalField::Impressions => &["impressions", "impressões"],
            CanonicalField::Clicks => &["clicks (all)", "cliques (todos)", "clicks"],
            CanonicalField::Cpl => &[
                "cost per lead (brl)",
                "custo por lead",
                "custo por resultado",
                "custo por cadastro",
            ],
            CanonicalField::Cpc => &["cpc (all)", "cpc (todos)", "cpc (custo por clique no link)"],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Trim, drop a leading BOM, lowercase.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Canonical field to column index for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    columns: [Option<usize>; 11],
}

impl HeaderMapping {
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
        let mut mapping = HeaderMapping::default();
        let mut claimed = vec![false; normalized.len()];

        for field in CanonicalField::ALL {
            let aliases = field.aliases();
            let hit = normalized
                .iter()
                .enumerate()
                .find(|(idx, header)| !claimed[*idx] && aliases.contains(&header.as_str()));
            if let Some((idx, _)) = hit {
                mapping.columns[field.slot()] = Some(idx);
                claimed[idx] = true;
            }
        }

        for field in CanonicalField::ALL {
            if mapping.columns[field.slot()].is_some() {
                continue;
            }
            let hit = field.aliases().iter().find_map(|alias| {
                normalized
                    .iter()
                    .enumerate()
                    .find(|(idx, header)| !claimed[*idx] && header.contains(alias))
                    .map(|(idx, _)| idx)
            });
            if let Some(idx) = hit {
                mapping.columns[field.slot()] = Some(idx);
                claimed[idx] = true;
            }
        }

        mapping
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns[field.slot()]
    }

    /// A table can only yield records when a campaign or account column exists.
    pub fn is_usable(&self) -> bool {
        self.column(CanonicalField::CampaignName).is_some() || self.column(CanonicalField::Account).is_some()
    }

    pub fn resolved(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        CanonicalField::ALL
            .iter()
            .filter_map(move |field| self.column(*field).map(|idx| (*field, idx)))
    }

    pub fn unresolved(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .iter()
            .copied()
            .filter(|field| self.column(*field).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_export() {
        let headers = [
            "Reporting starts",
            "Account",
            "Campaign name",
            "Ad set name",
            "Ad name",
            "Amount spent (BRL)",
            "Leads",
            "Impressions",
            "Clicks (all)",
            "Cost per lead (BRL)",
            "CPC (all)",
        ];
        let mapping = HeaderMapping::resolve(&headers);
        for (idx, field) in CanonicalField::ALL.iter().enumerate() {
            assert_eq!(mapping.column(*field), Some(idx), "field {}", field);
        }
        assert!(mapping.unresolved().is_empty());
    }

    #[test]
    fn test_portuguese_export() {
        let headers = [
            "Início da veiculação",
            "Nome da campanha",
            "Valor gasto (BRL)",
            "Resultados",
            "Impressões",
            "Cliques (todos)",
        ];
        let mapping = HeaderMapping::resolve(&headers);
        assert_eq!(mapping.column(CanonicalField::Date), Some(0));
        assert_eq!(mapping.column(CanonicalField::CampaignName), Some(1));
        assert_eq!(mapping.column(CanonicalField::Investment), Some(2));
        assert_eq!(mapping.column(CanonicalField::Leads), Some(3));
        assert_eq!(mapping.column(CanonicalField::Impressions), Some(4));
        assert_eq!(mapping.column(CanonicalField::Clicks), Some(5));
        assert_eq!(mapping.column(CanonicalField::Account), None);
        assert!(mapping.is_usable());
    }

    #[test]
    fn test_bom_and_whitespace() {
        let mapping = HeaderMapping::resolve(&["\u{feff}Data", "  Campanha  "]);
        assert_eq!(mapping.column(CanonicalField::Date), Some(0));
        assert_eq!(mapping.column(CanonicalField::CampaignName), Some(1));
    }

    #[test]
    fn test_contains_fallback() {
        let mapping = HeaderMapping::resolve(&["Campaign name", "Amount spent (BRL) - total"]);
        assert_eq!(mapping.column(CanonicalField::Investment), Some(1));
    }

    #[test]
    fn test_exact_claim_not_reused_by_contains() {
        // "Account" is claimed exactly, so the contains pass for the date has
        // only "Data de início" left
        let mapping = HeaderMapping::resolve(&["Account", "Data de início"]);
        assert_eq!(mapping.column(CanonicalField::Account), Some(0));
        assert_eq!(mapping.column(CanonicalField::Date), Some(1));

        let mapping = HeaderMapping::resolve(&["Conta", "Nome da conta (id)"]);
        assert_eq!(mapping.column(CanonicalField::Account), Some(0));
        assert_eq!(mapping.resolved().count(), 1);
    }

    #[test]
    fn test_first_exact_header_wins() {
        let mapping = HeaderMapping::resolve(&["Leads", "Cadastros"]);
        assert_eq!(mapping.column(CanonicalField::Leads), Some(0));
    }

    #[test]
    fn test_unusable_without_campaign_or_account() {
        let mapping = HeaderMapping::resolve(&["Date", "Leads"]);
        assert!(!mapping.is_usable());
    }
}
