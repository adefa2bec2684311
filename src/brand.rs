//! Brand resolution
//!
//! Every record must carry exactly one [`Brand`]. Resolution is an ordered
//! list of strategies; the first one that answers wins and a row nobody
//! answers for is dropped by the caller.
//!
//! 1. [`ExplicitSourceStrategy`]: the source (sheet tab) is catalogued with a
//!    single brand, so every row in it belongs to that brand.
//! 2. [`LongestSubstringStrategy`]: search the row's campaign name and
//!    account for brand terms. Shared accounts only consider their catalogued
//!    brands; unknown sources consider every brand and also search the source
//!    name. Longer terms win so `Jaecoo` beats a shorter coincidental match,
//!    and terms under four letters must stand as whole words.

use crate::models::Brand;
use anyhow::{Context, Result};
use tracing::trace;

/// One catalogued upstream source and the brands its rows may belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub brands: Vec<Brand>,
}

/// Source (sheet/tab) name to brand lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCatalog {
    entries: Vec<SourceEntry>,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        use Brand::*;
        let defaults: [(&str, &[Brand]); 17] = [
            ("Fiat Sinal", &[Fiat]),
            ("Jeep Sinal", &[Jeep]),
            ("Ram", &[Ram]),
            ("PSA", &[Peugeot, Citroen]),
            ("Nissan Sinal Japan", &[Nissan]),
            ("Honda Mix", &[Honda]),
            ("Asti Seguros", &[Asti]),
            ("Ford Mix", &[Ford]),
            ("Gac Sinal", &[Gac]),
            ("Geely Sinal", &[Geely]),
            ("GS Institucional", &[Gs]),
            ("Hyundai Sinal", &[Hyundai]),
            ("Kia Sinal", &[Kia]),
            ("Leap Sinal", &[Leap]),
            ("Neta Sinal", &[Neta]),
            ("Omoda Jaecoo", &[Omoda, Jaecoo]),
            ("Renault Sinal France", &[Renault]),
        ];

        Self {
            entries: defaults
                .iter()
                .map(|(name, brands)| SourceEntry {
                    name: (*name).to_string(),
                    brands: brands.to_vec(),
                })
                .collect(),
        }
    }
}

impl SourceCatalog {
    /// Build a catalog from `(name, brand names)` pairs, e.g. the `[[sources.sheets]]` config.
    pub fn from_names<N, B>(sheets: impl IntoIterator<Item = (N, Vec<B>)>) -> Result<Self>
    where
        N: Into<String>,
        B: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (name, brands) in sheets {
            let name = name.into();
            let brands = brands
                .iter()
                .map(|b| b.as_ref().parse::<Brand>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid brand list for source '{}'", name))?;
            if brands.is_empty() {
                anyhow::bail!("Source '{}' lists no brands", name);
            }
            entries.push(SourceEntry { name, brands });
        }
        Ok(Self { entries })
    }

    /// Case-insensitive lookup on the trimmed source name.
    pub fn lookup(&self, source_name: &str) -> Option<&[Brand]> {
        let wanted = source_name.trim();
        self.entries
            .iter()
            .find(|e| e.name.trim().eq_ignore_ascii_case(wanted))
            .map(|e| e.brands.as_slice())
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// Text available for resolving one row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowContext<'a> {
    pub source_name: Option<&'a str>,
    pub campaign_name: &'a str,
    pub account: &'a str,
}

pub trait BrandStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, row: &RowContext<'_>, catalog: &SourceCatalog) -> Option<Brand>;
}

pub struct ExplicitSourceStrategy;

impl BrandStrategy for ExplicitSourceStrategy {
    fn name(&self) -> &'static str {
        "explicit-source"
    }

    fn resolve(&self, row: &RowContext<'_>, catalog: &SourceCatalog) -> Option<Brand> {
        match catalog.lookup(row.source_name?) {
            Some([single]) => Some(*single),
            _ => None,
        }
    }
}

pub struct LongestSubstringStrategy;

/// Terms shorter than this only count as whole words, so "ram" inside
/// "Instagram" or "Programa" is not Ram.
const MIN_EMBEDDED_TERM_LEN: usize = 4;

/// `Some(true)` when `term` occurs as a whole word, `Some(false)` when it only
/// occurs inside a longer word. Digits and punctuation count as boundaries.
fn occurrence(haystack: &str, term: &str) -> Option<bool> {
    let bounded = |c: Option<char>| c.map_or(true, |c| !c.is_alphabetic());
    let mut found = None;
    for (idx, _) in haystack.match_indices(term) {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + term.len()..].chars().next();
        if bounded(before) && bounded(after) {
            return Some(true);
        }
        found = Some(false);
    }
    found
}

impl LongestSubstringStrategy {
    /// Longest matching term wins; at equal length a whole-word match beats an
    /// embedded one, then candidate order decides.
    pub fn best_match(text: &str, candidates: &[Brand]) -> Option<Brand> {
        let haystack = text.trim().to_lowercase();
        if haystack.is_empty() {
            return None;
        }

        let mut best: Option<(usize, bool, Brand)> = None;
        for brand in candidates {
            for term in brand.search_terms() {
                let Some(whole_word) = occurrence(&haystack, term) else {
                    continue;
                };
                let len = term.chars().count();
                if !whole_word && len < MIN_EMBEDDED_TERM_LEN {
                    continue;
                }
                let better = match best {
                    Some((best_len, best_whole, _)) => (len, whole_word) > (best_len, best_whole),
                    None => true,
                };
                if better {
                    best = Some((len, whole_word, *brand));
                }
            }
        }
        best.map(|(_, _, brand)| brand)
    }
}

impl BrandStrategy for LongestSubstringStrategy {
    fn name(&self) -> &'static str {
        "longest-substring"
    }

    fn resolve(&self, row: &RowContext<'_>, catalog: &SourceCatalog) -> Option<Brand> {
        let catalogued = row.source_name.and_then(|name| catalog.lookup(name));
        let candidates: &[Brand] = catalogued.unwrap_or(&Brand::ALL);
        // A shared tab's name lists all its brands, so it cannot pick one
        let source_text = match catalogued {
            Some(_) => None,
            None => row.source_name,
        };

        [Some(row.campaign_name), Some(row.account), source_text]
            .into_iter()
            .flatten()
            .find_map(|text| Self::best_match(text, candidates))
    }
}

/// Ordered strategy chain over a source catalog.
pub struct BrandResolver {
    catalog: SourceCatalog,
    strategies: Vec<Box<dyn BrandStrategy>>,
}

impl Default for BrandResolver {
    fn default() -> Self {
        Self::new(SourceCatalog::default())
    }
}

impl BrandResolver {
    pub fn new(catalog: SourceCatalog) -> Self {
        Self {
            catalog,
            strategies: vec![Box::new(ExplicitSourceStrategy), Box::new(LongestSubstringStrategy)],
        }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn resolve(&self, row: &RowContext<'_>) -> Option<Brand> {
        self.strategies.iter().find_map(|strategy| {
            let brand = strategy.resolve(row, &self.catalog)?;
            trace!(strategy = strategy.name(), brand = %brand, "Resolved brand");
            Some(brand)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(source: Option<&'a str>, campaign: &'a str, account: &'a str) -> RowContext<'a> {
        RowContext {
            source_name: source,
            campaign_name: campaign,
            account,
        }
    }

    #[test]
    fn test_explicit_source_skips_text_matching() {
        let resolver = BrandResolver::default();
        // Campaign mentions Jeep, but the tab is Fiat's
        let brand = resolver.resolve(&row(Some("fiat sinal"), "Jeep Compass", ""));
        assert_eq!(brand, Some(Brand::Fiat));
    }

    #[test]
    fn test_shared_account_longest_match() {
        let resolver = BrandResolver::default();
        assert_eq!(
            resolver.resolve(&row(Some("Omoda Jaecoo"), "Jaecoo Lançamento", "")),
            Some(Brand::Jaecoo)
        );
        assert_eq!(
            resolver.resolve(&row(Some("Omoda Jaecoo"), "Omoda 5 Oferta", "")),
            Some(Brand::Omoda)
        );
    }

    #[test]
    fn test_shared_account_ignores_unrelated_brands() {
        let resolver = BrandResolver::default();
        // "Fiat" is not a PSA candidate
        assert_eq!(resolver.resolve(&row(Some("PSA"), "Fiat Toro", "")), None);
        assert_eq!(
            resolver.resolve(&row(Some("PSA"), "Citroën C3 Aircross", "")),
            Some(Brand::Citroen)
        );
        assert_eq!(
            resolver.resolve(&row(Some("PSA"), "", "Peugeot Concessionária")),
            Some(Brand::Peugeot)
        );
    }

    #[test]
    fn test_unknown_source_uses_full_enumeration() {
        let resolver = BrandResolver::default();
        assert_eq!(resolver.resolve(&row(None, "Hyundai Creta", "")), Some(Brand::Hyundai));
        assert_eq!(
            resolver.resolve(&row(Some("Uploads"), "", "Renault Kwid Loja")),
            Some(Brand::Renault)
        );
        assert_eq!(resolver.resolve(&row(None, "Promo geral", "Loja Centro")), None);
    }

    #[test]
    fn test_campaign_text_wins_over_account() {
        let resolver = BrandResolver::default();
        assert_eq!(resolver.resolve(&row(None, "Kia Sportage", "Nissan Loja")), Some(Brand::Kia));
    }

    #[test]
    fn test_equal_length_ties_keep_declared_order() {
        // "fiat" and "jeep" are both four characters; Fiat is declared first
        assert_eq!(
            LongestSubstringStrategy::best_match("jeep e fiat", &[Brand::Fiat, Brand::Jeep]),
            Some(Brand::Fiat)
        );
        assert_eq!(
            LongestSubstringStrategy::best_match("jeep e fiat", &[Brand::Jeep, Brand::Fiat]),
            Some(Brand::Jeep)
        );
    }

    #[test]
    fn test_shared_tab_name_does_not_pick_a_brand() {
        let resolver = BrandResolver::default();
        assert_eq!(
            resolver.resolve(&row(Some("Omoda Jaecoo"), "Institucional Feirão", "Loja Centro")),
            None
        );
        // Unknown sources may still be named after a brand
        assert_eq!(
            resolver.resolve(&row(Some("Ford Uploads"), "Institucional", "")),
            Some(Brand::Ford)
        );
    }

    #[test]
    fn test_short_terms_need_whole_words() {
        let resolver = BrandResolver::default();
        assert_eq!(
            resolver.resolve(&row(None, "Kia Sportage - Instagram", "")),
            Some(Brand::Kia)
        );
        assert_eq!(resolver.resolve(&row(None, "Programa Gac GS8", "")), Some(Brand::Gac));
        assert_eq!(resolver.resolve(&row(None, "Promo Instagram", "")), None);
        assert_eq!(resolver.resolve(&row(None, "Ram 1500", "")), Some(Brand::Ram));
        assert_eq!(resolver.resolve(&row(None, "GS Institucional", "")), Some(Brand::Gs));
    }

    #[test]
    fn test_whole_word_beats_embedded_at_equal_length() {
        // "neta" sits inside "planeta"; "fiat" stands alone
        assert_eq!(
            LongestSubstringStrategy::best_match("planeta fiat", &[Brand::Neta, Brand::Fiat]),
            Some(Brand::Fiat)
        );
        assert_eq!(
            LongestSubstringStrategy::best_match("jaecoo7 lançamento", &[Brand::Omoda, Brand::Jaecoo]),
            Some(Brand::Jaecoo)
        );
    }

    #[test]
    fn test_catalog_from_names() {
        let catalog = SourceCatalog::from_names(vec![("Multimarcas", vec!["fiat", "JEEP"])]).unwrap();
        assert_eq!(catalog.lookup(" multimarcas "), Some(&[Brand::Fiat, Brand::Jeep][..]));
        assert!(SourceCatalog::from_names(vec![("X", vec!["Tesla"])]).is_err());
        assert!(SourceCatalog::from_names(vec![("X", Vec::<String>::new())]).is_err());
    }
}
