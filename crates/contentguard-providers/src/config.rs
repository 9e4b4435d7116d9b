//! Provider configuration

use contentguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported moderation vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Azure,
    Google,
    Tencent,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Google => "google",
            Self::Tencent => "tencent",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            "google" => Ok(Self::Google),
            "tencent" => Ok(Self::Tencent),
            other => Err(Error::config(format!(
                "unsupported AI provider type: {}",
                other
            ))),
        }
    }
}

/// Credentials and addressing for one vendor
///
/// `region` is the Google Cloud project id for Google and the API region for
/// Tencent Cloud. `endpoint` replaces the vendor base URL; it is required for
/// Azure and otherwise only used to point at a proxy or a test server.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    #[serde(default)]
    pub api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_secret: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType, api_key: impl Into<String>) -> Self {
        Self {
            provider_type,
            api_key: api_key.into(),
            api_secret: String::new(),
            region: String::new(),
            endpoint: String::new(),
        }
    }

    pub fn with_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = api_secret.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Endpoint without a trailing slash, or `default` when unset
    pub(crate) fn base_url(&self, default: &str) -> String {
        if self.endpoint.is_empty() {
            default.to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }

    pub(crate) fn require(&self, field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(Error::config(format!(
                "{} {} is required",
                self.provider_type, field
            )));
        }
        Ok(())
    }
}

// Keep credentials out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ProviderConfig")
            .field("provider_type", &self.provider_type)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
