//! Top-level exam domains and the subcategory → domain table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three fixed groupings of subcategories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[serde(alias = "テクノロジ系")]
    Technology,
    #[serde(alias = "マネジメント系")]
    Management,
    #[serde(alias = "ストラテジ系")]
    Strategy,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Technology, Domain::Management, Domain::Strategy];
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Technology => write!(f, "technology"),
            Domain::Management => write!(f, "management"),
            Domain::Strategy => write!(f, "strategy"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technology" | "tech" | "テクノロジ系" => Ok(Domain::Technology),
            "management" | "mgmt" | "マネジメント系" => Ok(Domain::Management),
            "strategy" | "ストラテジ系" => Ok(Domain::Strategy),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Weight of each domain in the overall level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainWeights {
    #[serde(default = "default_technology_weight")]
    pub technology: f64,
    #[serde(default = "default_management_weight")]
    pub management: f64,
    #[serde(default = "default_strategy_weight")]
    pub strategy: f64,
}

fn default_technology_weight() -> f64 {
    0.55
}
fn default_management_weight() -> f64 {
    0.20
}
fn default_strategy_weight() -> f64 {
    0.25
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self {
            technology: default_technology_weight(),
            management: default_management_weight(),
            strategy: default_strategy_weight(),
        }
    }
}

impl DomainWeights {
    pub fn get(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Technology => self.technology,
            Domain::Management => self.management,
            Domain::Strategy => self.strategy,
        }
    }
}

const DEFAULT_SUBCATEGORIES: &[(&str, Domain)] = &[
    ("basic-theory", Domain::Technology),
    ("algorithm-programming", Domain::Technology),
    ("computer-components", Domain::Technology),
    ("system-components", Domain::Technology),
    ("software-hardware", Domain::Technology),
    ("human-interface-multimedia", Domain::Technology),
    ("database", Domain::Technology),
    ("network", Domain::Technology),
    ("security", Domain::Technology),
    ("development", Domain::Management),
    ("project-management", Domain::Management),
    ("service-management", Domain::Management),
    ("system-strategy", Domain::Strategy),
    ("business-strategy", Domain::Strategy),
    ("corporate-law", Domain::Strategy),
];

fn default_subcategories() -> BTreeMap<String, Domain> {
    DEFAULT_SUBCATEGORIES
        .iter()
        .map(|(name, domain)| (name.to_string(), *domain))
        .collect()
}

/// Maps subcategories to domains and carries the domain weights.
///
/// Subcategories missing from the table still get a level, they just do not
/// contribute to the overall level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTable {
    #[serde(default)]
    pub weights: DomainWeights,
    #[serde(default = "default_subcategories")]
    pub subcategories: BTreeMap<String, Domain>,
}

impl Default for DomainTable {
    fn default() -> Self {
        Self {
            weights: DomainWeights::default(),
            subcategories: default_subcategories(),
        }
    }
}

impl DomainTable {
    pub fn domain_of(&self, subcategory: &str) -> Option<Domain> {
        self.subcategories.get(subcategory).copied()
    }

    pub fn weight(&self, domain: Domain) -> f64 {
        self.weights.get(domain)
    }

    /// Subcategories mapped to `domain`, in name order.
    pub fn subcategories_in(&self, domain: Domain) -> impl Iterator<Item = &str> {
        self.subcategories
            .iter()
            .filter(move |(_, d)| **d == domain)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_exam_syllabus() {
        let table = DomainTable::default();
        assert_eq!(table.subcategories.len(), 15);
        assert_eq!(table.domain_of("basic-theory"), Some(Domain::Technology));
        assert_eq!(table.domain_of("service-management"), Some(Domain::Management));
        assert_eq!(table.domain_of("corporate-law"), Some(Domain::Strategy));
        assert_eq!(table.domain_of("pseudo-language-trace"), None);
        assert_eq!(table.subcategories_in(Domain::Management).count(), 3);

        let total: f64 = Domain::ALL.iter().map(|d| table.weight(*d)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn domain_parse_accepts_labels() {
        assert_eq!("technology".parse::<Domain>().unwrap(), Domain::Technology);
        assert_eq!("ストラテジ系".parse::<Domain>().unwrap(), Domain::Strategy);
        assert!("finance".parse::<Domain>().is_err());
        assert_eq!(Domain::Management.to_string(), "management");
    }

    #[test]
    fn partial_weights_keep_defaults() {
        let weights: DomainWeights = toml::from_str("strategy = 0.5").unwrap();
        assert_eq!(weights.strategy, 0.5);
        assert_eq!(weights.technology, 0.55);
        assert_eq!(weights.management, 0.20);
    }
}
