use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Document Not Found: {0}")]
    NotFound(String),

    #[error("Malformed Document: {0}")]
    MalformedDocument(String),

    #[error("Store Unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Validation Error: {field}: {detail}")]
    Validation { field: String, detail: String },

    #[error("Invalid Path '{path}': segment '{segment}' does not exist or is not an object")]
    InvalidPath { path: String, segment: String },

    #[error("Verification Mismatch: {0}")]
    VerificationMismatch(String),

    #[error("Camera Not Found: no camera with id '{0}'")]
    CameraNotFound(String),

    #[error("Landmark Not Found: camera '{camera}' has no landmark '{landmark}'")]
    LandmarkNotFound { camera: String, landmark: String },

    #[error("File I/O Error: {0}")]
    Io(String),

    #[error("Script Error: {0}")]
    Script(String),
}

impl ConfigError {
    /// HTTP-style status for callers surfacing results over a web boundary:
    /// input/reference problems map to 400, store and verification problems to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            ConfigError::MalformedDocument(_)
            | ConfigError::Validation { .. }
            | ConfigError::InvalidPath { .. }
            | ConfigError::CameraNotFound(_)
            | ConfigError::LandmarkNotFound { .. } => 400,
            ConfigError::NotFound(_)
            | ConfigError::StoreUnavailable(_)
            | ConfigError::Network(_)
            | ConfigError::VerificationMismatch(_)
            | ConfigError::Io(_)
            | ConfigError::Script(_) => 500,
        }
    }
}

// Allow conversion from std::io::Error to ConfigError::Io
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_problems_are_client_errors() {
        let err = ConfigError::Validation {
            field: "pan".to_string(),
            detail: "60 is outside [-55, 55]".to_string(),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(ConfigError::CameraNotFound("9".to_string()).status_code(), 400);
        assert_eq!(
            ConfigError::MalformedDocument("invalid JSON".to_string()).status_code(),
            400
        );
    }

    #[test]
    fn store_problems_are_server_errors() {
        assert_eq!(
            ConfigError::StoreUnavailable("timeout".to_string()).status_code(),
            500
        );
        assert_eq!(
            ConfigError::VerificationMismatch("stale".to_string()).status_code(),
            500
        );
    }
}
