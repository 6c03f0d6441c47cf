use crate::core::config_store::{ConfigStore, StoreTarget};
use crate::core::document::ConfigDocument;
use crate::core::validation;
use crate::errors::ConfigError;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A blob write behind the CDN is not read-your-writes consistent, so a
/// failed read-back is retried a bounded number of times before the update
/// is reported as a VerificationMismatch. Never unbounded.
pub const VERIFY_ATTEMPTS: u32 = 3;
pub const VERIFY_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Exactly one change operation per protocol run.
#[derive(Debug, Clone)]
pub enum UpdateRequest {
    /// Blind top-level field assignment (whole-section overwrites).
    Field { key: String, value: Value },
    /// Dot-path assignment; intermediate segments must already exist.
    Path { path: String, value: Value },
    /// Replace an existing landmark's [pan, tilt] setpoint pair.
    Calibration {
        camera_id: String,
        landmark: String,
        pan: f64,
        tilt: f64,
    },
}

impl UpdateRequest {
    fn describe(&self) -> String {
        match self {
            UpdateRequest::Field { key, .. } => format!("field '{}'", key),
            UpdateRequest::Path { path, .. } => format!("path '{}'", path),
            UpdateRequest::Calibration {
                camera_id, landmark, ..
            } => format!("calibration camera '{}' landmark '{}'", camera_id, landmark),
        }
    }
}

/// One end-to-end update: load -> validate -> mutate -> persist -> verify.
/// Validation failures are terminal before anything is mutated or persisted;
/// a persist failure discards the in-memory change. Updates to the same
/// target serialize through a per-target advisory mutex; distinct targets
/// proceed independently. Last-write-wins across processes is accepted.
pub struct UpdateProtocol {
    store: Arc<dyn ConfigStore>,
    target_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UpdateProtocol {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        UpdateProtocol {
            store,
            target_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    async fn lock_for(&self, target: &StoreTarget) -> Arc<Mutex<()>> {
        let mut locks = self.target_locks.lock().await;
        locks
            .entry(target.name().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current document for a target. A target that was never saved is a
    /// default empty document, not an error.
    pub async fn fetch(&self, target: &StoreTarget) -> Result<ConfigDocument, ConfigError> {
        match self.store.load(target).await {
            Ok(bytes) => ConfigDocument::parse(&bytes),
            Err(ConfigError::NotFound(reason)) => {
                debug!("'{}' has no stored document ({}), using default", target, reason);
                Ok(ConfigDocument::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs one update end to end and returns the persisted document.
    pub async fn apply(
        &self,
        target: &StoreTarget,
        request: UpdateRequest,
    ) -> Result<ConfigDocument, ConfigError> {
        let op_start_time = Instant::now();
        info!("🛠️ Applying {} to target '{}'", request.describe(), target);

        let lock = self.lock_for(target).await;
        let _guard = lock.lock().await;

        // Loading
        let mut doc = self.fetch(target).await?;

        // Validating: terminal before any mutation, nothing persisted.
        validate_request(&doc, &request)?;

        // Mutating: total once validation passed.
        apply_request(&mut doc, &request)?;

        // Persisting. Parsing the serialized bytes back yields the document as
        // every later load will see it (camera ids canonicalized to strings),
        // which is the form read-back verification must compare against.
        let bytes = doc.serialize()?;
        let persisted = ConfigDocument::parse(&bytes)?;
        self.store.save(target, &bytes).await?;
        debug!(
            "💾 Persisted {} bytes to '{}' on {} in {:?}",
            bytes.len(),
            target,
            self.store.describe(),
            op_start_time.elapsed()
        );

        // Verifying: only for backends without read-your-writes consistency.
        if !self.store.is_read_consistent() {
            let description = request.describe();
            self.verify_visible(target, &description, |current| {
                request_is_visible(current, &persisted, &request)
            })
            .await?;
        }

        info!(
            "✅ Applied {} to '{}' in {:?}",
            request.describe(),
            target,
            op_start_time.elapsed()
        );
        Ok(persisted)
    }

    /// Rewrites a target in canonical pretty-printed form. The stored bytes
    /// are parsed, normalized and saved back; a target that was never saved
    /// surfaces as [`ConfigError::NotFound`].
    pub async fn normalize(&self, target: &StoreTarget) -> Result<ConfigDocument, ConfigError> {
        let op_start_time = Instant::now();
        info!("🛠️ Normalizing target '{}'", target);

        let lock = self.lock_for(target).await;
        let _guard = lock.lock().await;

        let raw_bytes = self.store.load(target).await?;
        let doc = ConfigDocument::parse(&raw_bytes)?;
        let bytes = doc.serialize()?;
        self.store.save(target, &bytes).await?;

        if !self.store.is_read_consistent() {
            self.verify_visible(target, "normalized document", |current| current == &doc)
                .await?;
        }

        info!(
            "✅ Normalized '{}' ({} -> {} bytes) in {:?}",
            target,
            raw_bytes.len(),
            bytes.len(),
            op_start_time.elapsed()
        );
        Ok(doc)
    }

    async fn verify_visible<F>(
        &self,
        target: &StoreTarget,
        description: &str,
        is_visible: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&ConfigDocument) -> bool,
    {
        for attempt in 1..=VERIFY_ATTEMPTS {
            match self.fetch(target).await {
                Ok(current) if is_visible(&current) => {
                    debug!(
                        "🔍 Verified {} on '{}' (attempt {}/{})",
                        description, target, attempt, VERIFY_ATTEMPTS
                    );
                    return Ok(());
                }
                Ok(_) => {
                    warn!(
                        "🔍 Read-back of '{}' does not show {} yet (attempt {}/{})",
                        target, description, attempt, VERIFY_ATTEMPTS
                    );
                }
                Err(e) => {
                    warn!(
                        "🔍 Read-back of '{}' failed during verification (attempt {}/{}): {}",
                        target, attempt, VERIFY_ATTEMPTS, e
                    );
                }
            }
            if attempt < VERIFY_ATTEMPTS {
                tokio::time::sleep(VERIFY_RETRY_DELAY).await;
            }
        }
        Err(ConfigError::VerificationMismatch(format!(
            "'{}' did not reflect {} after {} attempts",
            target, description, VERIFY_ATTEMPTS
        )))
    }
}

fn validate_request(doc: &ConfigDocument, request: &UpdateRequest) -> Result<(), ConfigError> {
    match request {
        UpdateRequest::Field { key, .. } => {
            if key.is_empty() {
                return Err(ConfigError::Validation {
                    field: "field".to_string(),
                    detail: "field name must not be empty".to_string(),
                });
            }
            Ok(())
        }
        UpdateRequest::Path { path, .. } => doc.check_path(path),
        UpdateRequest::Calibration {
            camera_id,
            landmark,
            pan,
            tilt,
        } => {
            if camera_id.is_empty() {
                return Err(ConfigError::Validation {
                    field: "camera_id".to_string(),
                    detail: "camera id must not be empty".to_string(),
                });
            }
            if landmark.is_empty() {
                return Err(ConfigError::Validation {
                    field: "landmark".to_string(),
                    detail: "landmark id must not be empty".to_string(),
                });
            }
            if !validation::pan_in_range(*pan) {
                return Err(ConfigError::Validation {
                    field: "pan".to_string(),
                    detail: format!(
                        "{} is outside [{}, {}]",
                        pan,
                        validation::PAN_MIN,
                        validation::PAN_MAX
                    ),
                });
            }
            if !validation::tilt_in_range(*tilt) {
                return Err(ConfigError::Validation {
                    field: "tilt".to_string(),
                    detail: format!(
                        "{} is outside [{}, {}]",
                        tilt,
                        validation::TILT_MIN,
                        validation::TILT_MAX
                    ),
                });
            }
            if !validation::camera_exists(doc, camera_id) {
                return Err(ConfigError::CameraNotFound(camera_id.clone()));
            }
            if !validation::landmark_exists(doc, camera_id, landmark) {
                return Err(ConfigError::LandmarkNotFound {
                    camera: camera_id.clone(),
                    landmark: landmark.clone(),
                });
            }
            Ok(())
        }
    }
}

// Cannot fail for a request that passed validate_request against the same
// document; the Result is propagated anyway rather than unwrapped.
fn apply_request(doc: &mut ConfigDocument, request: &UpdateRequest) -> Result<(), ConfigError> {
    match request {
        UpdateRequest::Field { key, value } => {
            doc.set_field(key, value.clone());
            Ok(())
        }
        UpdateRequest::Path { path, value } => doc.set_path(path, value.clone()),
        UpdateRequest::Calibration {
            camera_id,
            landmark,
            pan,
            tilt,
        } => doc.set_calibration(camera_id, landmark, *pan, *tilt),
    }
}

// Compares the read-back against the persisted document rather than the raw
// request value: parsing canonicalizes camera ids, so a raw value carrying
// numeric ids would never match what a load returns.
fn request_is_visible(
    doc: &ConfigDocument,
    persisted: &ConfigDocument,
    request: &UpdateRequest,
) -> bool {
    match request {
        UpdateRequest::Field { key, .. } => doc.get_field(key) == persisted.get_field(key),
        UpdateRequest::Path { path, .. } => doc.get_path(path) == persisted.get_path(path),
        UpdateRequest::Calibration {
            camera_id,
            landmark,
            pan,
            tilt,
        } => doc
            .find_camera(camera_id)
            .and_then(|cam| cam.calibration(landmark))
            == Some((*pan, *tilt)),
    }
}
