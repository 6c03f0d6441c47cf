use ptzcal::core::config_store::{ConfigStore, StoreTarget};
use ptzcal::core::document::ConfigDocument;
use ptzcal::core::update_protocol::{UpdateProtocol, UpdateRequest};
use ptzcal::errors::ConfigError;
use ptzcal::store::local_file_store::LocalFileStore;
use serde_json::json;
use std::sync::Arc;

const SEED: &[u8] = br#"{"camera_config":[{"camera_id":"1","calibration_data":{"5":[10,-3]}}]}"#;

fn local_protocol(dir: &tempfile::TempDir) -> (Arc<LocalFileStore>, UpdateProtocol) {
    let store = Arc::new(LocalFileStore::new(dir.path().to_str().unwrap()).unwrap());
    let protocol = UpdateProtocol::new(store.clone());
    (store, protocol)
}

async fn seed_main(store: &LocalFileStore) {
    store.save(&StoreTarget::main(), SEED).await.unwrap();
}

#[tokio::test]
async fn fetch_of_unsaved_target_returns_default_document() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, protocol) = local_protocol(&dir);
    let doc = protocol.fetch(&StoreTarget::main()).await.unwrap();
    assert_eq!(doc, ConfigDocument::default());
    assert_eq!(doc.get_field("camera_config"), Some(&json!([])));
}

#[tokio::test]
async fn calibration_update_persists_the_new_setpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let doc = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Calibration {
                camera_id: "1".to_string(),
                landmark: "5".to_string(),
                pan: 20.0,
                tilt: -10.0,
            },
        )
        .await
        .unwrap();
    assert_eq!(doc.find_camera("1").unwrap().calibration("5"), Some((20.0, -10.0)));

    // The persisted bytes agree with the returned document.
    let reloaded = protocol.fetch(&StoreTarget::main()).await.unwrap();
    assert_eq!(reloaded, doc);
}

#[tokio::test]
async fn boundary_setpoints_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    for (pan, tilt) in [(-55.0, -20.0), (55.0, 20.0), (0.0, 0.0), (12.5, -7.25)] {
        let doc = protocol
            .apply(
                &StoreTarget::main(),
                UpdateRequest::Calibration {
                    camera_id: "1".to_string(),
                    landmark: "5".to_string(),
                    pan,
                    tilt,
                },
            )
            .await
            .unwrap();
        assert_eq!(doc.find_camera("1").unwrap().calibration("5"), Some((pan, tilt)));
    }
}

#[tokio::test]
async fn out_of_range_pan_leaves_stored_bytes_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let err = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Calibration {
                camera_id: "1".to_string(),
                landmark: "5".to_string(),
                pan: 60.0,
                tilt: 0.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "pan"));

    // Byte-identical, not merely equivalent.
    assert_eq!(store.load(&StoreTarget::main()).await.unwrap(), SEED);
}

#[tokio::test]
async fn out_of_range_tilt_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let err = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Calibration {
                camera_id: "1".to_string(),
                landmark: "5".to_string(),
                pan: 0.0,
                tilt: -20.5,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "tilt"));
    assert_eq!(store.load(&StoreTarget::main()).await.unwrap(), SEED);
}

#[tokio::test]
async fn unknown_camera_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);

    // Target was never saved; the protocol sees the default empty document.
    let err = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Calibration {
                camera_id: "42".to_string(),
                landmark: "5".to_string(),
                pan: 1.0,
                tilt: 1.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::CameraNotFound(ref id) if id == "42"));

    // Still nothing in the store.
    assert!(matches!(
        store.load(&StoreTarget::main()).await.unwrap_err(),
        ConfigError::NotFound(_)
    ));
}

#[tokio::test]
async fn unknown_landmark_is_never_created() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let err = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Calibration {
                camera_id: "1".to_string(),
                landmark: "99".to_string(),
                pan: 1.0,
                tilt: 1.0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::LandmarkNotFound { ref landmark, .. } if landmark == "99"));
    assert_eq!(store.load(&StoreTarget::main()).await.unwrap(), SEED);
}

#[tokio::test]
async fn sequential_field_updates_do_not_clobber_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, protocol) = local_protocol(&dir);
    let target = StoreTarget::main();

    protocol
        .apply(
            &target,
            UpdateRequest::Field {
                key: "camera_config".to_string(),
                value: json!([{"camera_id": "2", "calibration_data": {}}]),
            },
        )
        .await
        .unwrap();
    protocol
        .apply(
            &target,
            UpdateRequest::Field {
                key: "venue".to_string(),
                value: json!("13"),
            },
        )
        .await
        .unwrap();

    let doc = protocol.fetch(&target).await.unwrap();
    assert_eq!(doc.get_field("venue"), Some(&json!("13")));
    assert!(doc.find_camera("2").is_some());
}

#[tokio::test]
async fn concurrent_updates_to_one_target_serialize_through_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, protocol) = local_protocol(&dir);
    let protocol = Arc::new(protocol);
    let target = StoreTarget::main();

    let a = {
        let protocol = protocol.clone();
        let target = target.clone();
        tokio::spawn(async move {
            protocol
                .apply(
                    &target,
                    UpdateRequest::Field {
                        key: "venue".to_string(),
                        value: json!("13"),
                    },
                )
                .await
        })
    };
    let b = {
        let protocol = protocol.clone();
        let target = target.clone();
        tokio::spawn(async move {
            protocol
                .apply(
                    &target,
                    UpdateRequest::Field {
                        key: "operator".to_string(),
                        value: json!("night-shift"),
                    },
                )
                .await
        })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // The in-process advisory lock serializes the two read-modify-writes, so
    // neither change is lost.
    let doc = protocol.fetch(&target).await.unwrap();
    assert_eq!(doc.get_field("venue"), Some(&json!("13")));
    assert_eq!(doc.get_field("operator"), Some(&json!("night-shift")));
}

#[tokio::test]
async fn path_update_on_missing_intermediate_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let err = protocol
        .apply(
            &StoreTarget::main(),
            UpdateRequest::Path {
                path: "display.units".to_string(),
                value: json!("deg"),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPath { ref segment, .. } if segment == "display"));
    assert_eq!(store.load(&StoreTarget::main()).await.unwrap(), SEED);
}

#[tokio::test]
async fn reapplying_an_update_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;

    let request = UpdateRequest::Calibration {
        camera_id: "1".to_string(),
        landmark: "5".to_string(),
        pan: 20.0,
        tilt: -10.0,
    };
    protocol.apply(&StoreTarget::main(), request.clone()).await.unwrap();
    let first = store.load(&StoreTarget::main()).await.unwrap();
    protocol.apply(&StoreTarget::main(), request).await.unwrap();
    let second = store.load(&StoreTarget::main()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn targets_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    seed_main(&store).await;
    store.save(&StoreTarget::modified(), SEED).await.unwrap();

    protocol
        .apply(
            &StoreTarget::modified(),
            UpdateRequest::Calibration {
                camera_id: "1".to_string(),
                landmark: "5".to_string(),
                pan: 20.0,
                tilt: -10.0,
            },
        )
        .await
        .unwrap();

    // Main target still holds the seed document.
    assert_eq!(store.load(&StoreTarget::main()).await.unwrap(), SEED);
    let modified = protocol.fetch(&StoreTarget::modified()).await.unwrap();
    assert_eq!(
        modified.find_camera("1").unwrap().calibration("5"),
        Some((20.0, -10.0))
    );
}

#[tokio::test]
async fn malformed_stored_document_surfaces_as_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    store
        .save(&StoreTarget::main(), b"{\"camera_config\": \"oops\"}")
        .await
        .unwrap();

    let err = protocol.fetch(&StoreTarget::main()).await.unwrap_err();
    assert!(matches!(err, ConfigError::MalformedDocument(_)));
}

#[tokio::test]
async fn normalize_rewrites_a_target_in_canonical_form() {
    let dir = tempfile::tempdir().unwrap();
    let (store, protocol) = local_protocol(&dir);
    // Compact JSON with a numeric camera id, as a hand-edit might leave it.
    store
        .save(
            &StoreTarget::main(),
            br#"{"camera_config":[{"camera_id":1,"calibration_data":{"5":[10,-3]}}]}"#,
        )
        .await
        .unwrap();

    let doc = protocol.normalize(&StoreTarget::main()).await.unwrap();

    let bytes = store.load(&StoreTarget::main()).await.unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.starts_with("{\n  \"camera_config\""));
    assert!(text.contains("\"camera_id\": \"1\""));
    assert_eq!(ConfigDocument::parse(&bytes).unwrap(), doc);
}

#[tokio::test]
async fn normalize_of_unsaved_target_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, protocol) = local_protocol(&dir);
    let err = protocol.normalize(&StoreTarget::main()).await.unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}
