//! Product categories and their pricing basis

use serde::{Deserialize, Serialize};

/// Product category for a purchase-order line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Monuments,
    Granite,
    Quartz,
}

/// Pricing basis chosen by category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBasis {
    /// Priced per piece (monuments)
    Count,
    /// Priced per square metre (granite, quartz)
    Area,
}

impl Category {
    /// Fixed 2-character prefix embedded in batch codes
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::Monuments => "MN",
            Category::Granite => "GR",
            Category::Quartz => "QR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Monuments => "monuments",
            Category::Granite => "granite",
            Category::Quartz => "quartz",
        }
    }

    pub fn basis(&self) -> PricingBasis {
        match self {
            Category::Monuments => PricingBasis::Count,
            Category::Granite | Category::Quartz => PricingBasis::Area,
        }
    }

    /// Strict parse of a category label (case-insensitive, tolerates the
    /// display variants seen in stored data, e.g. "Monuments" or "quart")
    pub fn parse(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        if l.contains("monument") {
            Some(Category::Monuments)
        } else if l.contains("granite") {
            Some(Category::Granite)
        } else if l.contains("quart") {
            Some(Category::Quartz)
        } else {
            None
        }
    }

    /// Lenient resolution used on the code-generation path. Batch codes are
    /// persisted externally and must never fail generation, so unrecognized
    /// labels fall back to `Monuments` with a logged warning.
    pub fn from_label(label: &str) -> Self {
        Category::parse(label).unwrap_or_else(|| {
            tracing::warn!(label, "unrecognized category, defaulting to monuments");
            Category::Monuments
        })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Monuments => write!(f, "Monuments"),
            Category::Granite => write!(f, "Granite"),
            Category::Quartz => write!(f, "Quartz"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_map() {
        assert_eq!(Category::Monuments.prefix(), "MN");
        assert_eq!(Category::Granite.prefix(), "GR");
        assert_eq!(Category::Quartz.prefix(), "QR");
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(Category::parse("Monuments"), Some(Category::Monuments));
        assert_eq!(Category::parse("granite"), Some(Category::Granite));
        assert_eq!(Category::parse("QUARTZ"), Some(Category::Quartz));
        assert_eq!(Category::parse("quart"), Some(Category::Quartz));
        assert_eq!(Category::parse("marble"), None);
    }

    #[test]
    fn test_from_label_fallback() {
        assert_eq!(Category::from_label("marble"), Category::Monuments);
    }

    #[test]
    fn test_basis() {
        assert_eq!(Category::Monuments.basis(), PricingBasis::Count);
        assert_eq!(Category::Granite.basis(), PricingBasis::Area);
        assert_eq!(Category::Quartz.basis(), PricingBasis::Area);
    }
}
