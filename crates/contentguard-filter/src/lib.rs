//! ContentGuard Filter
//!
//! The moderation entry point. [`ContentFilterService::filter`] runs three
//! stages and stops at the first one that rejects the content:
//!
//! 1. Sensitive words (case-insensitive substring match)
//! 2. Regex patterns, in registration order
//! 3. AI analysis through a cached [`AiProvider`](contentguard_providers::AiProvider),
//!    judged against the configured [`FilterLevel`](contentguard_core::FilterLevel)

pub mod analyzer;
pub mod config;
pub mod rules;
pub mod service;

pub use analyzer::AiAnalyzer;
pub use config::{CacheSettings, MonitorSettings, ServiceConfig};
pub use rules::{LocalRules, RuleMatch};
pub use service::ContentFilterService;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ServiceConfig;
    pub use crate::service::ContentFilterService;
    pub use contentguard_core::prelude::*;
}
