//! Mapping of Alidns failures onto the core error type
//!
//! Reference: <https://api.aliyun.com/document/Alidns/2015-01-09/errorCode>

use aliddns_core::Error;
use reqwest::StatusCode;

use crate::PROVIDER_NAME;

/// Map an API error code to an [`Error`]
///
/// `context` names what the call was about (a domain or record id) and is
/// folded into not-found messages.
pub(crate) fn map_api_error(code: &str, message: &str, context: &str) -> Error {
    match code {
        "InvalidAccessKeyId.NotFound"
        | "InvalidAccessKeyId.Inactive"
        | "InvalidAccessKeyId"
        | "SignatureDoesNotMatch"
        | "IncompleteSignature" => Error::auth(format!("{}: {}", code, message)),

        "InvalidDomainName.NoExist"
        | "DomainNotFound"
        | "DomainRecordNotBelongToUser"
        | "InvalidRecordId.NotFound"
        | "InvalidRR.NoExist" => Error::not_found(format!("{} ({}): {}", context, code, message)),

        "Throttling" | "Throttling.User" | "Throttling.Api" => {
            Error::rate_limited(format!("{}: {}", code, message))
        }

        _ => Error::provider(PROVIDER_NAME, format!("{}: {}", code, message)),
    }
}

/// Map a non-success status without a structured error body
pub(crate) fn map_status(status: StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!("Request rejected. Status: {}", status)),
        404 => Error::not_found(format!("Endpoint returned {}", status)),
        429 => Error::rate_limited(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("Server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("Request failed: {} - {}", status, body),
        ),
    }
}
