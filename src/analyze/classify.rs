//! Keyword classifier: article text → exactly one `Category`.
//!
//! Rules fire in strict priority order, first match wins:
//! 1. company names      → `Company`
//! 2. crypto keywords    → `Crypto`
//! 3. economy keywords   → `Economic { origin }` for the first country in table
//!                         order whose keywords also match, else `GlobalEconomic`
//! 4. otherwise          → `Other`
//!
//! Matching is case-insensitive substring search over `title + " " + description`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload-free category tag, used by allowlists and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Company,
    Crypto,
    Economic,
    GlobalEconomic,
    Other,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Company => "company",
            CategoryKind::Crypto => "crypto",
            CategoryKind::Economic => "economic",
            CategoryKind::GlobalEconomic => "global_economic",
            CategoryKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub country: String,
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Company,
    Crypto,
    Economic { origin: Origin },
    GlobalEconomic,
    Other,
}

impl Category {
    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::Company => CategoryKind::Company,
            Category::Crypto => CategoryKind::Crypto,
            Category::Economic { .. } => CategoryKind::Economic,
            Category::GlobalEconomic => CategoryKind::GlobalEconomic,
            Category::Other => CategoryKind::Other,
        }
    }

    /// Human label with emoji, no markup.
    pub fn label(&self) -> String {
        match self {
            Category::Company => "🏢 Company News".to_string(),
            Category::Crypto => "🪙 Crypto".to_string(),
            Category::Economic { origin } => {
                format!("{} {} Economy", origin.flag, origin.country)
            }
            Category::GlobalEconomic => "🌐 Global Economy".to_string(),
            Category::Other => "🗞️ Other".to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRule {
    pub name: String,
    pub flag: String,
    pub keywords: Vec<String>,
}

/// Keyword tables. Loaded from the `[classifier]` section of the rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    pub companies: Vec<String>,
    pub crypto: Vec<String>,
    pub economy: Vec<String>,
    /// Checked in declared order.
    pub countries: Vec<CountryRule>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            companies: list(&[
                "apple",
                "microsoft",
                "tesla",
                "amazon",
                "alphabet",
                "google",
                "nvidia",
                "meta platforms",
                "netflix",
                "jpmorgan",
                "goldman sachs",
                "berkshire",
                "reliance",
                "tata",
                "infosys",
                "hdfc",
                "adani",
                "samsung",
                "toyota",
                "alibaba",
                "tencent",
            ]),
            crypto: list(&[
                "crypto",
                "bitcoin",
                "ethereum",
                "btc",
                "blockchain",
                "stablecoin",
                "solana",
                "binance",
                "coinbase",
            ]),
            economy: list(&[
                "economy",
                "economic",
                "inflation",
                "interest rate",
                "gdp",
                "recession",
                "central bank",
                "monetary policy",
                "fiscal policy",
                "tariff",
                "bond",
                "stock market",
                "unemployment",
                "federal reserve",
                "rbi",
                "fed ",
                "finance",
            ]),
            countries: vec![
                CountryRule {
                    name: "US".into(),
                    flag: "🇺🇸".into(),
                    keywords: list(&[
                        "united states",
                        "u.s.",
                        "federal reserve",
                        "wall street",
                        "fed ",
                        "american",
                    ]),
                },
                CountryRule {
                    name: "India".into(),
                    flag: "🇮🇳".into(),
                    keywords: list(&["india", "rbi", "sensex", "nifty", "rupee"]),
                },
                CountryRule {
                    name: "China".into(),
                    flag: "🇨🇳".into(),
                    keywords: list(&["china", "chinese", "yuan", "pboc", "beijing"]),
                },
                CountryRule {
                    name: "UK".into(),
                    flag: "🇬🇧".into(),
                    keywords: list(&["britain", "british", "bank of england", "u.k.", "ftse"]),
                },
                CountryRule {
                    name: "Eurozone".into(),
                    flag: "🇪🇺".into(),
                    keywords: list(&["eurozone", "ecb", "european central bank", "euro area"]),
                },
                CountryRule {
                    name: "Japan".into(),
                    flag: "🇯🇵".into(),
                    keywords: list(&["japan", "bank of japan", "boj", "nikkei", "yen"]),
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: ClassifierRules,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifierRules::default())
    }
}

impl Classifier {
    /// Keywords are lowercased once here; blank entries are dropped.
    pub fn new(rules: ClassifierRules) -> Self {
        fn clean(v: Vec<String>) -> Vec<String> {
            v.into_iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.trim().is_empty())
                .collect()
        }
        let countries = rules
            .countries
            .into_iter()
            .map(|c| CountryRule {
                keywords: clean(c.keywords),
                ..c
            })
            .collect();
        Self {
            rules: ClassifierRules {
                companies: clean(rules.companies),
                crypto: clean(rules.crypto),
                economy: clean(rules.economy),
                countries,
            },
        }
    }

    pub fn classify(&self, title: &str, description: &str) -> Category {
        let text = format!("{title} {description}").to_lowercase();
        let hit = |kws: &[String]| kws.iter().any(|k| text.contains(k.as_str()));

        if hit(&self.rules.companies) {
            return Category::Company;
        }
        if hit(&self.rules.crypto) {
            return Category::Crypto;
        }
        if hit(&self.rules.economy) {
            return match self.rules.countries.iter().find(|c| hit(&c.keywords)) {
                Some(c) => Category::Economic {
                    origin: Origin {
                        country: c.name.clone(),
                        flag: c.flag.clone(),
                    },
                },
                None => Category::GlobalEconomic,
            };
        }
        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_other() {
        assert_eq!(Classifier::default().classify("", ""), Category::Other);
    }

    #[test]
    fn company_beats_crypto() {
        let c = Classifier::default();
        let cat = c.classify("Tesla adds Bitcoin to balance sheet", "crypto rally");
        assert_eq!(cat, Category::Company);
    }

    #[test]
    fn economy_with_country_gets_origin() {
        let c = Classifier::default();
        let cat = c.classify("RBI keeps interest rates unchanged", "");
        assert_eq!(cat.kind(), CategoryKind::Economic);
        match cat {
            Category::Economic { origin } => assert_eq!(origin.country, "India"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn first_country_in_table_order_wins() {
        let c = Classifier::default();
        // Both US and China keywords present; US is declared first.
        let cat = c.classify("Tariff talks", "United States and China trade barbs");
        match cat {
            Category::Economic { origin } => assert_eq!(origin.country, "US"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn economy_without_country_is_global() {
        let c = Classifier::default();
        assert_eq!(
            c.classify("Global recession fears grow", "Analysts warn"),
            Category::GlobalEconomic
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_uses_description() {
        let rules = ClassifierRules {
            companies: vec!["ACME Corp".into()],
            crypto: vec![],
            economy: vec![],
            countries: vec![],
        };
        let c = Classifier::new(rules);
        assert_eq!(c.classify("Quarterly numbers", "acme corp beats"), Category::Company);
    }
}
