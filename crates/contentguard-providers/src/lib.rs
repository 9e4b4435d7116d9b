//! ContentGuard Providers
//!
//! Adapters for third-party moderation APIs.
//!
//! Every vendor is exposed through the [`AiProvider`] trait and built from a
//! [`ProviderConfig`] by [`new_provider`]. Vendor label vocabularies are
//! folded into a fixed set of categories by [`standardize`]. Each adapter
//! keeps its own long-lived result cache so identical inputs are only paid
//! for once.

pub mod azure;
pub mod config;
pub mod google;
mod http;
pub mod openai;
pub mod provider;
pub mod standardize;
pub mod tencent;

pub use config::{ProviderConfig, ProviderType};
pub use provider::{new_provider, AiProvider};
pub use standardize::{standardize, CategoryMapping, STANDARD_CATEGORIES};
pub use tencent::PollPolicy;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ProviderConfig, ProviderType};
    pub use crate::provider::{new_provider, AiProvider};
}
