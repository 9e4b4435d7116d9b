//! ContentGuard Core
//!
//! Core types and utilities shared across the ContentGuard moderation pipeline.
//!
//! This crate provides:
//! - Content types, filter levels, and moderation verdicts
//! - Error types and result handling
//! - A per-call moderation context carrying a deadline and a cancellation token

pub mod context;
pub mod error;
pub mod types;

pub use context::ModerationContext;
pub use error::{Error, Result};
pub use types::{AiFilterResult, ContentType, FilterLevel, FilterResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::ModerationContext;
    pub use crate::error::{Error, Result};
    pub use crate::types::{AiFilterResult, ContentType, FilterLevel, FilterResult};
}
