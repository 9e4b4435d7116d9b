//! TC3-HMAC-SHA256 request signing

use chrono::{DateTime, Utc};
use contentguard_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host";

/// Signs Tencent Cloud API 3.0 requests
pub struct Tc3Signer {
    secret_id: String,
    secret_key: String,
}

impl Tc3Signer {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// `Authorization` header for a JSON POST to `/` on `host`.
    ///
    /// The credential scope is bound to `service` and to the UTC date of
    /// `timestamp`, so each service must be signed separately.
    pub fn authorization(
        &self,
        service: &str,
        host: &str,
        payload: &str,
        timestamp: i64,
    ) -> Result<String> {
        let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| Error::internal(format!("timestamp {} out of range", timestamp)))?
            .format("%Y-%m-%d")
            .to_string();

        let canonical_request = format!(
            "POST\n/\n\ncontent-type:application/json\nhost:{}\n\n{}\n{}",
            host,
            SIGNED_HEADERS,
            sha256_hex(payload.as_bytes())
        );

        let credential_scope = format!("{}/{}/tc3_request", date, service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            timestamp,
            credential_scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let secret_date = hmac_sha256(format!("TC3{}", self.secret_key).as_bytes(), &date)?;
        let secret_service = hmac_sha256(&secret_date, service)?;
        let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
        let signature: String = hmac_sha256(&secret_signing, &string_to_sign)?
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.secret_id, credential_scope, SIGNED_HEADERS, signature
        ))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::internal(format!("invalid HMAC key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
