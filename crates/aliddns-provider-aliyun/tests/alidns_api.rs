//! Integration tests for the Alidns client against a mock HTTP server
//!
//! These tests verify the wire contract:
//! - Signed RPC requests carry the action, version and Authorization headers
//! - DescribeDomainRecords walks every page
//! - Error bodies map onto the core error taxonomy
//! - Dry-run mode never sends mutating calls

use aliddns_core::{CredentialsConfig, DnsProvider, Error};
use aliddns_provider_aliyun::{AliyunProvider, DRY_RUN_RECORD_ID};
use serde_json::json;
use std::net::Ipv4Addr;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IP: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);

fn provider(server: &MockServer, dry_run: bool) -> AliyunProvider {
    let config = CredentialsConfig::new("LTAI5tTestKeyId", "TestSecretKey123456", "cn-hangzhou")
        .with_endpoint(server.uri())
        .with_dry_run(dry_run);
    AliyunProvider::new(&config).expect("provider construction succeeds")
}

fn record(id: &str, rr: &str, value: &str) -> serde_json::Value {
    json!({
        "DomainName": "example.com",
        "RecordId": id,
        "RR": rr,
        "Type": "A",
        "Value": value,
        "TTL": 600,
        "Line": "default",
        "Status": "ENABLE"
    })
}

#[tokio::test]
async fn describe_sends_signed_rpc_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .and(header("x-acs-version", "2015-01-09"))
        .and(header(
            "x-acs-content-sha256",
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        ))
        .and(header_exists("x-acs-date"))
        .and(header_exists("x-acs-signature-nonce"))
        .and(header_exists("Authorization"))
        .and(query_param("DomainName", "example.com"))
        .and(query_param("PageNumber", "1"))
        .and(query_param("PageSize", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-1",
            "TotalCount": 1,
            "DomainRecords": { "Record": [record("r1", "www", "198.51.100.1")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = provider(&server, false)
        .describe_records("example.com")
        .await
        .expect("describe succeeds");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id, "r1");
    assert_eq!(records[0].hostname(), "www.example.com");
    assert_eq!(records[0].value, "198.51.100.1");
}

#[tokio::test]
async fn describe_walks_every_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("PageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TotalCount": 3,
            "DomainRecords": { "Record": [
                record("r1", "www", "198.51.100.1"),
                record("r2", "api", "198.51.100.1")
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("PageNumber", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TotalCount": 3,
            "DomainRecords": { "Record": [record("r3", "@", "198.51.100.1")] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = provider(&server, false)
        .describe_records("example.com")
        .await
        .expect("describe succeeds");

    let ids: Vec<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
    assert_eq!(ids, ["r1", "r2", "r3"]);
}

#[tokio::test]
async fn describe_empty_domain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TotalCount": 0,
            "DomainRecords": { "Record": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = provider(&server, false)
        .describe_records("example.com")
        .await
        .expect("describe succeeds");
    assert!(records.is_empty());
}

#[tokio::test]
async fn unknown_domain_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "RequestId": "req-2",
            "Code": "InvalidDomainName.NoExist",
            "Message": "The specified domain name does not exist."
        })))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .describe_records("missing.example")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    assert!(err.to_string().contains("missing.example"));
}

#[tokio::test]
async fn bad_signature_maps_to_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "Code": "SignatureDoesNotMatch",
            "Message": "Specified signature is not matched with our calculation."
        })))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .describe_records("example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn malformed_response_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .describe_records("example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provider { .. }), "got {:?}", err);
}

#[tokio::test]
async fn add_record_returns_new_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .and(query_param("DomainName", "example.com"))
        .and(query_param("RR", "www"))
        .and(query_param("Type", "A"))
        .and(query_param("Value", "203.0.113.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-3",
            "RecordId": "9999985"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record_id = provider(&server, false)
        .add_record("example.com", "www", IP)
        .await
        .expect("add succeeds");
    assert_eq!(record_id, "9999985");
}

#[tokio::test]
async fn update_and_delete_use_record_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "UpdateDomainRecord"))
        .and(query_param("RecordId", "r1"))
        .and(query_param("RR", "www"))
        .and(query_param("Type", "A"))
        .and(query_param("Value", "203.0.113.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-4",
            "RecordId": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "DeleteDomainRecord"))
        .and(query_param("RecordId", "r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-5",
            "RecordId": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server, false);
    provider
        .update_record("r1", "www", IP)
        .await
        .expect("update succeeds");
    provider.delete_record("r1").await.expect("delete succeeds");
}

#[tokio::test]
async fn throttled_update_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "Code": "Throttling.User",
            "Message": "Request was denied due to user flow control."
        })))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .update_record("r1", "www", IP)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimited(_)), "got {:?}", err);
}

#[tokio::test]
async fn dry_run_reads_but_never_mutates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "DescribeDomainRecords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TotalCount": 1,
            "DomainRecords": { "Record": [record("r1", "www", "198.51.100.1")] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "AddDomainRecord"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "UpdateDomainRecord"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "DeleteDomainRecord"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider(&server, true);
    assert_eq!(provider.describe_records("example.com").await.unwrap().len(), 1);
    assert_eq!(
        provider.add_record("example.com", "api", IP).await.unwrap(),
        DRY_RUN_RECORD_ID
    );
    provider.update_record("r1", "www", IP).await.unwrap();
    provider.delete_record("r1").await.unwrap();
}
