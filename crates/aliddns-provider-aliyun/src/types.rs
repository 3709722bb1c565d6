//! Alidns request parameters and response bodies
//!
//! Field names follow the API's PascalCase wire format.

use aliddns_core::DomainRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct DescribeDomainRecordsRequest<'a> {
    #[serde(rename = "DomainName")]
    pub domain_name: &'a str,
    #[serde(rename = "PageNumber")]
    pub page_number: u32,
    #[serde(rename = "PageSize")]
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddDomainRecordRequest<'a> {
    #[serde(rename = "DomainName")]
    pub domain_name: &'a str,
    #[serde(rename = "RR")]
    pub rr: &'a str,
    #[serde(rename = "Type")]
    pub record_type: &'a str,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateDomainRecordRequest<'a> {
    #[serde(rename = "RecordId")]
    pub record_id: &'a str,
    #[serde(rename = "RR")]
    pub rr: &'a str,
    #[serde(rename = "Type")]
    pub record_type: &'a str,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteDomainRecordRequest<'a> {
    #[serde(rename = "RecordId")]
    pub record_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords")]
    pub domain_records: Option<DomainRecordsWrapper>,
    #[serde(rename = "TotalCount")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainRecordsWrapper {
    #[serde(rename = "Record")]
    pub record: Option<Vec<AliyunRecord>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliyunRecord {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "DomainName")]
    pub domain_name: Option<String>,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
}

impl AliyunRecord {
    /// Convert to the core record type, filling in `domain` when the
    /// response leaves `DomainName` out
    pub fn into_domain_record(self, domain: &str) -> DomainRecord {
        DomainRecord {
            record_id: self.record_id,
            domain_name: self
                .domain_name
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| domain.to_string()),
            rr: self.rr,
            value: self.value,
            record_type: self.record_type,
            ttl: self.ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddDomainRecordResponse {
    #[serde(rename = "RecordId")]
    pub record_id: String,
}

/// Update and delete only echo identifiers back
#[derive(Debug, Deserialize)]
pub(crate) struct MutationResponse {
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}
