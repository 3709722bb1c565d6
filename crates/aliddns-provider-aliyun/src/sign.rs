//! ACS3-HMAC-SHA256 request signing
//!
//! Alidns uses the RPC request style: every parameter travels in the query
//! string and the body is empty. The query string must be sorted by key and
//! RFC3986-encoded, and the exact same string is used both on the wire and
//! in the canonical request.
//!
//! Reference: <https://www.alibabacloud.com/help/en/sdk/product-overview/v3-request-structure-and-signature>

use aliddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::{API_VERSION, AliyunProvider, EMPTY_BODY_SHA256};

/// Signature algorithm name, also the Authorization scheme
pub(crate) const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Headers covered by the signature, lowercase and sorted
pub(crate) const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

impl AliyunProvider {
    /// Build the `Authorization` header value for one request
    ///
    /// # Parameters
    ///
    /// - `action`: API action (e.g. "DescribeDomainRecords")
    /// - `query_string`: Sorted, encoded query string as sent
    /// - `timestamp`: `x-acs-date` value (`%Y-%m-%dT%H:%M:%SZ`, UTC)
    /// - `nonce`: `x-acs-signature-nonce` value
    pub(crate) fn sign(
        &self,
        action: &str,
        query_string: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String> {
        let canonical_headers = format!(
            "host:{}\nx-acs-action:{}\nx-acs-content-sha256:{}\nx-acs-date:{}\nx-acs-signature-nonce:{}\nx-acs-version:{}\n",
            self.host, action, EMPTY_BODY_SHA256, timestamp, nonce, API_VERSION
        );

        let canonical_request = format!(
            "POST\n/\n{}\n{}\n{}\n{}",
            query_string, canonical_headers, SIGNED_HEADERS, EMPTY_BODY_SHA256
        );
        tracing::trace!("Canonical request:\n{}", canonical_request);

        let string_to_sign = format!(
            "{}\n{}",
            ALGORITHM,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = hex::encode(hmac_sha256(
            self.credentials.app_secret.as_bytes(),
            string_to_sign.as_bytes(),
        )?);

        Ok(format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ALGORITHM, self.credentials.app_id, SIGNED_HEADERS, signature
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::config(format!("Unusable signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC3986 percent-encoding (unreserved characters pass through)
pub fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}

/// Serialize flat request parameters into a sorted, encoded query string
///
/// `None` fields (serialized as null) are skipped. Nested values are not
/// used by any Alidns action this crate calls and are rejected.
pub fn query_string<T: Serialize>(params: &T) -> Result<String> {
    let value = serde_json::to_value(params)?;
    let serde_json::Value::Object(map) = value else {
        return Err(Error::invalid_input("Request parameters must be a struct"));
    };

    let mut sorted = BTreeMap::new();
    for (key, value) in map {
        let value = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::invalid_input(format!(
                    "Unsupported nested parameter {}: {}",
                    key, other
                )));
            }
        };
        sorted.insert(key, value);
    }

    Ok(sorted
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
        .collect::<Vec<_>>()
        .join("&"))
}
