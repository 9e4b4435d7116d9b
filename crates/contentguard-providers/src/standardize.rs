//! Vendor label normalization
//!
//! Each vendor names its categories differently and scores them on its own
//! scale. Adapters rescale to `[0, 1]` first; this module then maps the labels
//! onto [`STANDARD_CATEGORIES`] using a fixed per-vendor table.

use std::collections::{BTreeMap, HashMap};

/// The complete normalized vocabulary
pub const STANDARD_CATEGORIES: [&str; 6] = [
    "adult_content",
    "violence",
    "hate_speech",
    "self_harm",
    "harassment",
    "advertisement",
];

/// One row of a vendor table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMapping {
    pub provider_label: &'static str,
    pub category: &'static str,
    /// Minimum score (inclusive) for the category to be flagged
    pub severity: f64,
}

const fn mapping(provider_label: &'static str, category: &'static str, severity: f64) -> CategoryMapping {
    CategoryMapping {
        provider_label,
        category,
        severity,
    }
}

const OPENAI: &[CategoryMapping] = &[
    mapping("hate", "hate_speech", 0.7),
    mapping("sexual", "adult_content", 0.7),
    mapping("violence", "violence", 0.7),
    mapping("self-harm", "self_harm", 0.7),
    mapping("harassment", "harassment", 0.7),
];

const AZURE: &[CategoryMapping] = &[
    mapping("Adult", "adult_content", 0.7),
    mapping("Violence", "violence", 0.7),
    mapping("Hate", "hate_speech", 0.7),
    mapping("SelfHarm", "self_harm", 0.7),
];

const GOOGLE: &[CategoryMapping] = &[
    mapping("adult", "adult_content", 0.7),
    mapping("violence", "violence", 0.7),
    mapping("hate", "hate_speech", 0.7),
    mapping("harassment", "harassment", 0.7),
];

const TENCENT: &[CategoryMapping] = &[
    mapping("Porn", "adult_content", 0.7),
    mapping("Terror", "violence", 0.7),
    mapping("Ad", "advertisement", 0.5),
    mapping("Abuse", "hate_speech", 0.7),
];

/// Mapping table for a vendor, empty for unknown names
pub fn mappings(provider: &str) -> &'static [CategoryMapping] {
    match provider {
        "openai" => OPENAI,
        "azure" => AZURE,
        "google" => GOOGLE,
        "tencent" => TENCENT,
        _ => &[],
    }
}

/// Fold vendor labels into normalized categories.
///
/// A category is present (and `true`) iff the vendor reported its label with
/// a score at or above the mapping's severity. Unknown labels and unknown
/// vendors contribute nothing.
pub fn standardize(provider: &str, raw: &HashMap<String, f64>) -> BTreeMap<String, bool> {
    mappings(provider)
        .iter()
        .filter(|m| raw.get(m.provider_label).is_some_and(|score| *score >= m.severity))
        .map(|m| (m.category.to_string(), true))
        .collect()
}
