//! The blob backend sits behind a CDN and is not read-your-writes
//! consistent, so the update protocol verifies blob writes by re-reading the
//! target with a bounded number of retries. These tests drive that path with
//! a mock endpoint that serves stale content for a while.

use ptzcal::core::config_store::StoreTarget;
use ptzcal::core::update_protocol::{UpdateProtocol, UpdateRequest, VERIFY_ATTEMPTS};
use ptzcal::errors::ConfigError;
use ptzcal::store::blob_store::BlobStore;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STALE: &str = r#"{"camera_config":[{"camera_id":"1","calibration_data":{"5":[10,-3]}}]}"#;
const FRESH: &str = r#"{"camera_config":[{"camera_id":"1","calibration_data":{"5":[20,-10]}}]}"#;

fn calibration_request() -> UpdateRequest {
    UpdateRequest::Calibration {
        camera_id: "1".to_string(),
        landmark: "5".to_string(),
        pan: 20.0,
        tilt: -10.0,
    }
}

fn blob_protocol(server: &MockServer) -> UpdateProtocol {
    let store = BlobStore::new(&server.uri(), Duration::from_secs(5)).unwrap();
    UpdateProtocol::new(Arc::new(store))
}

#[tokio::test]
async fn verification_tolerates_one_stale_read() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // Initial load plus the first verification read see stale content, then
    // the write becomes visible.
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STALE, "application/json"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FRESH, "application/json"))
        .mount(&server)
        .await;

    let protocol = blob_protocol(&server);
    let doc = protocol
        .apply(&StoreTarget::main(), calibration_request())
        .await
        .unwrap();
    assert_eq!(doc.find_camera("1").unwrap().calibration("5"), Some((20.0, -10.0)));
}

#[tokio::test]
async fn verification_accepts_field_writes_carrying_numeric_camera_ids() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // Nothing stored yet, then read-backs return exactly what the write
    // persisted. Loads canonicalize camera ids to strings, so verification
    // must succeed even though the request value carried a numeric id.
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"camera_config":[{"camera_id":1,"calibration_data":{}}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let protocol = blob_protocol(&server);
    let doc = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Field {
                key: "camera_config".to_string(),
                value: serde_json::json!([{"camera_id": 1, "calibration_data": {}}]),
            },
        )
        .await
        .unwrap();
    assert!(doc.find_camera("1").is_some());
}

#[tokio::test]
async fn persistent_staleness_is_a_bounded_verification_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    // One initial load plus exactly VERIFY_ATTEMPTS read-backs; the expect()
    // bound fails the test if verification ever retries without limit.
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STALE, "application/json"))
        .expect(1 + VERIFY_ATTEMPTS as u64)
        .mount(&server)
        .await;

    let protocol = blob_protocol(&server);
    let err = protocol
        .apply(&StoreTarget::main(), calibration_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::VerificationMismatch(_)));
}

#[tokio::test]
async fn failed_blob_put_is_store_unavailable_without_verification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STALE, "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let protocol = blob_protocol(&server);
    let err = protocol
        .apply(&StoreTarget::main(), calibration_request())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::StoreUnavailable(_)));
}

#[tokio::test]
async fn verification_retries_through_transient_read_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    // Initial load succeeds, first verification read errors, second sees the
    // write.
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STALE, "application/json"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config/config.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FRESH, "application/json"))
        .mount(&server)
        .await;

    let protocol = blob_protocol(&server);
    protocol
        .apply(&StoreTarget::main(), calibration_request())
        .await
        .unwrap();
}
