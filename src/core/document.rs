use crate::errors::ConfigError;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const CAMERA_CONFIG_KEY: &str = "camera_config";
pub const CAMERA_ID_KEY: &str = "camera_id";
pub const CALIBRATION_DATA_KEY: &str = "calibration_data";

/// In-memory calibration document. The top level is an open schema: anything
/// besides `camera_config` round-trips through parse/serialize untouched.
/// Camera ids are canonicalized to strings at parse time, so lookups never
/// have to care whether the file was written with `"camera_id": 1` or `"1"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

/// Read-only view of one entry in `camera_config`.
pub struct CameraEntry<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> CameraEntry<'a> {
    pub fn camera_id(&self) -> &str {
        // Canonicalized to a string at parse time.
        self.obj
            .get(CAMERA_ID_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.obj.get("name").and_then(Value::as_str)
    }

    pub fn ip(&self) -> Option<&str> {
        self.obj.get("ip").and_then(Value::as_str)
    }

    fn calibration_data(&self) -> Option<&Map<String, Value>> {
        self.obj.get(CALIBRATION_DATA_KEY).and_then(Value::as_object)
    }

    pub fn has_landmark(&self, landmark: &str) -> bool {
        self.calibration_data()
            .map(|cal| cal.contains_key(landmark))
            .unwrap_or(false)
    }

    pub fn landmark_ids(&self) -> Vec<&str> {
        self.calibration_data()
            .map(|cal| cal.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The stored `[pan, tilt]` pair for a landmark, if present and numeric.
    pub fn calibration(&self, landmark: &str) -> Option<(f64, f64)> {
        let tuple = self.calibration_data()?.get(landmark)?.as_array()?;
        if tuple.len() != 2 {
            return None;
        }
        Some((tuple[0].as_f64()?, tuple[1].as_f64()?))
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        let mut root = Map::new();
        root.insert(CAMERA_CONFIG_KEY.to_string(), Value::Array(Vec::new()));
        ConfigDocument { root }
    }
}

impl ConfigDocument {
    /// Parses and shape-checks a document. A missing `camera_config` defaults
    /// to an empty list (partial documents are fine); a present one must be
    /// an array of objects each carrying `camera_id` and `calibration_data`.
    /// Out-of-range pan/tilt values written by earlier tooling are accepted
    /// here; ranges are enforced only at the update boundary.
    pub fn parse(bytes: &[u8]) -> Result<ConfigDocument, ConfigError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ConfigError::MalformedDocument(format!("invalid JSON: {}", e)))?;

        let mut root = match value {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::MalformedDocument(format!(
                    "top level must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        match root.get_mut(CAMERA_CONFIG_KEY) {
            None => {
                root.insert(CAMERA_CONFIG_KEY.to_string(), Value::Array(Vec::new()));
            }
            Some(Value::Array(entries)) => {
                let mut seen_ids: HashSet<String> = HashSet::new();
                for (idx, entry) in entries.iter_mut().enumerate() {
                    let obj = entry.as_object_mut().ok_or_else(|| {
                        ConfigError::MalformedDocument(format!(
                            "camera_config[{}] is not an object",
                            idx
                        ))
                    })?;
                    let canonical_id = canonical_camera_id(obj.get(CAMERA_ID_KEY))
                        .ok_or_else(|| {
                            ConfigError::MalformedDocument(format!(
                                "camera_config[{}] is missing a string or numeric camera_id",
                                idx
                            ))
                        })?;
                    if !seen_ids.insert(canonical_id.clone()) {
                        return Err(ConfigError::MalformedDocument(format!(
                            "duplicate camera_id '{}'",
                            canonical_id
                        )));
                    }
                    match obj.get(CALIBRATION_DATA_KEY) {
                        Some(Value::Object(_)) => {}
                        Some(_) => {
                            return Err(ConfigError::MalformedDocument(format!(
                                "camera '{}' calibration_data is not an object",
                                canonical_id
                            )))
                        }
                        None => {
                            return Err(ConfigError::MalformedDocument(format!(
                                "camera '{}' is missing calibration_data",
                                canonical_id
                            )))
                        }
                    }
                    obj.insert(CAMERA_ID_KEY.to_string(), Value::String(canonical_id));
                }
            }
            Some(other) => {
                return Err(ConfigError::MalformedDocument(format!(
                    "camera_config must be an array, got {}",
                    json_type_name(other)
                )))
            }
        }

        Ok(ConfigDocument { root })
    }

    /// Pretty-printed UTF-8 JSON, 2-space indentation, original key order.
    pub fn serialize(&self) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec_pretty(&self.root)
            .map_err(|e| ConfigError::MalformedDocument(format!("serialization failed: {}", e)))
    }

    pub fn cameras(&self) -> impl Iterator<Item = CameraEntry<'_>> {
        self.root
            .get(CAMERA_CONFIG_KEY)
            .and_then(Value::as_array)
            .map(|a| a.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_object().map(|obj| CameraEntry { obj }))
    }

    /// String-canonicalized camera lookup.
    pub fn find_camera(&self, camera_id: &str) -> Option<CameraEntry<'_>> {
        self.cameras().find(|cam| cam.camera_id() == camera_id)
    }

    fn find_camera_mut(&mut self, camera_id: &str) -> Option<&mut Map<String, Value>> {
        self.root
            .get_mut(CAMERA_CONFIG_KEY)?
            .as_array_mut()?
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|obj| {
                obj.get(CAMERA_ID_KEY).and_then(Value::as_str) == Some(camera_id)
            })
    }

    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Blind top-level assignment; replaces or creates the field.
    pub fn set_field(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_string(), value);
    }

    /// Resolves a dot-separated path to a value, if every segment exists.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current: &Value = self.root.get(path.split('.').next()?)?;
        for segment in path.split('.').skip(1) {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Checks that every segment except the last resolves to an object, i.e.
    /// that `set_path` with the same path cannot fail.
    pub fn check_path(&self, path: &str) -> Result<(), ConfigError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidPath {
                path: path.to_string(),
                segment: String::new(),
            });
        }
        let mut current: &Map<String, Value> = &self.root;
        for segment in &segments[..segments.len() - 1] {
            current = match current.get(*segment).and_then(Value::as_object) {
                Some(obj) => obj,
                None => {
                    return Err(ConfigError::InvalidPath {
                        path: path.to_string(),
                        segment: (*segment).to_string(),
                    })
                }
            };
        }
        Ok(())
    }

    /// Dot-path assignment. Every intermediate segment must already exist as
    /// an object; fails closed with `InvalidPath` naming the first missing
    /// segment instead of silently creating deep structure. The final segment
    /// is assigned unconditionally.
    pub fn set_path(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        self.check_path(path)?;
        let segments: Vec<&str> = path.split('.').collect();
        let mut current: &mut Map<String, Value> = &mut self.root;
        for segment in &segments[..segments.len() - 1] {
            // check_path proved each hop resolves to an object
            current = current
                .get_mut(*segment)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| ConfigError::InvalidPath {
                    path: path.to_string(),
                    segment: (*segment).to_string(),
                })?;
        }
        current.insert(segments[segments.len() - 1].to_string(), value);
        Ok(())
    }

    /// Replaces an existing landmark's `[pan, tilt]` pair. The camera and the
    /// landmark key must both already exist; a missing landmark is an error,
    /// never an implicit insert.
    pub fn set_calibration(
        &mut self,
        camera_id: &str,
        landmark: &str,
        pan: f64,
        tilt: f64,
    ) -> Result<(), ConfigError> {
        let camera = self
            .find_camera_mut(camera_id)
            .ok_or_else(|| ConfigError::CameraNotFound(camera_id.to_string()))?;
        let calibration = camera
            .get_mut(CALIBRATION_DATA_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ConfigError::LandmarkNotFound {
                camera: camera_id.to_string(),
                landmark: landmark.to_string(),
            })?;
        if !calibration.contains_key(landmark) {
            return Err(ConfigError::LandmarkNotFound {
                camera: camera_id.to_string(),
                landmark: landmark.to_string(),
            });
        }
        calibration.insert(
            landmark.to_string(),
            Value::Array(vec![json_number(pan), json_number(tilt)]),
        );
        Ok(())
    }
}

fn canonical_camera_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_number(x: f64) -> Value {
    // Integral setpoints serialize without a trailing ".0", matching the
    // files the venue tooling has always written.
    if x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        Value::Number((x as i64).into())
    } else {
        serde_json::Number::from_f64(x)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
