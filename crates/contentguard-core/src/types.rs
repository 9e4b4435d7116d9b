//! Core types for ContentGuard

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of user-submitted content
///
/// Selects the provider method to call and partitions cache statistics.
/// Non-text content is passed around as a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Audio,
    Video,
}

impl ContentType {
    /// All content types, in code order
    pub const ALL: [ContentType; 4] = [Self::Text, Self::Image, Self::Audio, Self::Video];

    /// Stable single-byte code, used as the cache key prefix
    pub fn code(&self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Image => 1,
            Self::Audio => 2,
            Self::Video => 3,
        }
    }

    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(crate::Error::validation(format!(
                "unknown content type '{}'",
                other
            ))),
        }
    }
}

/// Strictness of the AI decision stage
///
/// Stricter levels block at lower scores. `Standard` stands in for any
/// level value that is not recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Low,
    #[default]
    Medium,
    High,
    Standard,
}

impl FilterLevel {
    /// Score above which analyzed content is blocked
    pub fn block_threshold(&self) -> f64 {
        match self {
            Self::Low => 0.9,
            Self::Medium => 0.7,
            Self::High => 0.5,
            Self::Standard => 0.8,
        }
    }

    /// True if `score` is strictly above this level's threshold
    pub fn should_block(&self, score: f64) -> bool {
        score > self.block_threshold()
    }

    /// Map a numeric level code (1 = low, 2 = medium, 3 = high)
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Standard,
        }
    }

    /// Map a level name, case-insensitively
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Standard,
        }
    }
}

impl fmt::Display for FilterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Standard => "standard",
        };
        f.write_str(name)
    }
}

impl FromStr for FilterLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl<'de> Deserialize<'de> for FilterLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LevelRepr {
            Code(i64),
            Name(String),
        }

        Ok(match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Code(code) => Self::from_code(code),
            LevelRepr::Name(name) => Self::from_name(&name),
        })
    }
}

/// Verdict produced by an AI provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiFilterResult {
    /// Overall risk score in [0, 1]
    pub score: f64,

    /// Normalized categories flagged by the provider
    #[serde(default)]
    pub categories: BTreeMap<String, bool>,

    /// Human-readable findings, in provider order
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl AiFilterResult {
    /// Create a result with a score and no findings
    pub fn new(score: f64) -> Self {
        Self {
            score,
            ..Default::default()
        }
    }

    /// Add a flagged category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into(), true);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

/// Outcome of a full filter run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub is_clean: bool,

    pub score: f64,

    #[serde(default)]
    pub categories: BTreeMap<String, bool>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Which stage blocked the content; absent when clean
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FilterResult {
    /// Blocked result with a single local category
    pub fn blocked(score: f64, category: &str, reason: impl Into<String>) -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(category.to_string(), true);
        Self {
            is_clean: false,
            score,
            categories,
            suggestions: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    /// Result carrying an analyzer verdict through
    pub fn from_analysis(analysis: AiFilterResult, reason: Option<String>) -> Self {
        Self {
            is_clean: reason.is_none(),
            score: analysis.score,
            categories: analysis.categories,
            suggestions: analysis.suggestions,
            reason,
        }
    }
}
