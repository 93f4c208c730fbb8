//! Rule Classification
//!
//! Maps policy rule identifiers to human-readable rule and classifier
//! names, and derives a severity tier from the headline match count.

use serde::{Deserialize, Serialize};

/// Incident severity tier derived from the maximum match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    /// Fewer than 50 matches
    Low = 0,
    /// 50..=99 matches
    Medium = 1,
    /// 100..=999 matches
    High = 2,
    /// 1000 or more matches
    Critical = 3,
}

impl Severity {
    /// Threshold cascade over the headline match count.
    pub fn from_match_count(max_matches: u64) -> Self {
        if max_matches >= 1000 {
            Self::Critical
        } else if max_matches >= 100 {
            Self::High
        } else if max_matches >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule-id mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMapping {
    pub rule_id: String,
    pub rule_name: String,
    pub classifier_name: String,
}

/// Fixed lookup table from policy rule ids to display names.
///
/// Constructed once at startup and passed explicitly; unknown rule ids
/// produce no entry (decided behavior, see `test_unknown_rule_dropped`).
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    mappings: Vec<RuleMapping>,
}

impl RuleCatalog {
    pub fn new(mappings: Vec<RuleMapping>) -> Self {
        Self { mappings }
    }

    /// The production rule table.
    pub fn production() -> Self {
        fn entry(id: &str, rule: &str, classifier: &str) -> RuleMapping {
            RuleMapping {
                rule_id: id.to_string(),
                rule_name: rule.to_string(),
                classifier_name: classifier.to_string(),
            }
        }

        Self::new(vec![
            entry("18484", "PCI Audit: CCN and CVV", "Credit Card Number with CVV"),
            entry("18483", "PCI Audit: CCN and Expiration Date", "Credit Card Number with Exp Date"),
            entry("18488", "PCI Audit: Credit Card Magnetic Strip", "Credit Card Magnetic Strip Data"),
            entry("18487", "PCI Audit: Credit Card Number (Default)", "Credit Card Number"),
            entry("18794", "US PII: SSN Narrow", "Social Security Number"),
        ])
    }

    /// Resolve rule ids to `(rule_names, classifier_names)`.
    ///
    /// Output order follows input order; ids absent from the table are
    /// silently dropped.
    pub fn classify(&self, rule_ids: &[String]) -> (Vec<String>, Vec<String>) {
        let mut rule_names = Vec::new();
        let mut classifier_names = Vec::new();

        for id in rule_ids {
            if let Some(m) = self.mappings.iter().find(|m| &m.rule_id == id) {
                rule_names.push(m.rule_name.clone());
                classifier_names.push(m.classifier_name.clone());
            }
        }

        (rule_names, classifier_names)
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::production()
    }
}
