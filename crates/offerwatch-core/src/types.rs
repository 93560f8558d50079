//! Domain enums shared across the workspace.
//!
//! The database stores these as plain text columns with CHECK constraints,
//! so every variant carries a stable lowercase wire string. Parsing is
//! lenient on ASCII case but nothing else.

use serde::{Deserialize, Serialize};

/// What kind of product the tracked offer is selling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferCategory {
    Infoproduto,
    Nutra,
}

/// Market the offer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferRegion {
    Brasil,
    Latam,
    Eua,
    Europa,
}

/// Outcome classification of a single scrape attempt chain.
///
/// `Partial` means the page loaded but extraction produced a structurally
/// empty core result; it is distinct from a `Success` with optional fields
/// missing, and distinct from `Failed` (the page never loaded at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Partial,
    Failed,
}

impl OfferCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OfferCategory::Infoproduto => "infoproduto",
            OfferCategory::Nutra => "nutra",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "infoproduto" => Some(OfferCategory::Infoproduto),
            "nutra" => Some(OfferCategory::Nutra),
            _ => None,
        }
    }
}

impl OfferRegion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OfferRegion::Brasil => "brasil",
            OfferRegion::Latam => "latam",
            OfferRegion::Eua => "eua",
            OfferRegion::Europa => "europa",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "brasil" => Some(OfferRegion::Brasil),
            "latam" => Some(OfferRegion::Latam),
            "eua" => Some(OfferRegion::Eua),
            "europa" => Some(OfferRegion::Europa),
            _ => None,
        }
    }
}

impl ScrapeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::Partial => "partial",
            ScrapeStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Some(ScrapeStatus::Success),
            "partial" => Some(ScrapeStatus::Partial),
            "failed" => Some(ScrapeStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_wire_string() {
        for cat in [OfferCategory::Infoproduto, OfferCategory::Nutra] {
            assert_eq!(OfferCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(OfferCategory::parse("ecommerce"), None);
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!(OfferRegion::parse("EUA"), Some(OfferRegion::Eua));
        assert_eq!(OfferRegion::parse("brasil"), Some(OfferRegion::Brasil));
        assert_eq!(OfferRegion::parse("asia"), None);
    }

    #[test]
    fn status_serde_uses_lowercase() {
        let json = serde_json::to_string(&ScrapeStatus::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
        let back: ScrapeStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, ScrapeStatus::Failed);
    }
}
