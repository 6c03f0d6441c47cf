use crate::core::document::ConfigDocument;

// Setpoint limits for the PTZ heads installed at the venues.
pub const PAN_MIN: f64 = -55.0;
pub const PAN_MAX: f64 = 55.0;
pub const TILT_MIN: f64 = -20.0;
pub const TILT_MAX: f64 = 20.0;
pub const ZOOM_MIN: f64 = 0.0;
pub const ZOOM_MAX: f64 = 16000.0;

pub fn pan_in_range(pan: f64) -> bool {
    (PAN_MIN..=PAN_MAX).contains(&pan)
}

pub fn tilt_in_range(tilt: f64) -> bool {
    (TILT_MIN..=TILT_MAX).contains(&tilt)
}

pub fn zoom_in_range(zoom: f64) -> bool {
    (ZOOM_MIN..=ZOOM_MAX).contains(&zoom)
}

pub fn camera_exists(doc: &ConfigDocument, camera_id: &str) -> bool {
    doc.find_camera(camera_id).is_some()
}

pub fn landmark_exists(doc: &ConfigDocument, camera_id: &str, landmark: &str) -> bool {
    doc.find_camera(camera_id)
        .map(|cam| cam.has_landmark(landmark))
        .unwrap_or(false)
}
