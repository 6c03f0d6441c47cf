use crate::errors::ConfigError;
use async_trait::async_trait;

/// A named logical document instance within a store. An explicit value passed
/// into every store call; there is no process-wide default path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreTarget {
    name: String,
}

impl StoreTarget {
    pub fn named(name: &str) -> Self {
        StoreTarget { name: name.to_string() }
    }

    /// The live document pushed to the cameras.
    pub fn main() -> Self {
        StoreTarget::named("config")
    }

    /// The operator's working copy, exported for download.
    pub fn modified() -> Self {
        StoreTarget::named("config_modified")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name (local backend) or key suffix (blob backend).
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

impl std::fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// --- The ConfigStore Trait ---

/// Maps a logical target name to bytes in a backing medium, and back.
/// Format-agnostic: a missing target surfaces as `ConfigError::NotFound` and
/// is translated into a default document by the layer above, never here.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Human-readable description of the backing medium, for log lines.
    fn describe(&self) -> String;

    /// Current content for `target`. `NotFound` if nothing was ever saved,
    /// `StoreUnavailable` if the backing medium errors.
    async fn load(&self, target: &StoreTarget) -> Result<Vec<u8>, ConfigError>;

    /// Persists content, replacing any prior value. Atomic from the caller's
    /// point of view: a concurrent load sees either the old or the new bytes.
    async fn save(&self, target: &StoreTarget, bytes: &[u8]) -> Result<(), ConfigError>;

    /// Whether saved bytes are immediately visible to a subsequent `load`.
    /// Remote blob backends are eventually consistent; writers that need
    /// read-your-writes must verify with bounded retries.
    fn is_read_consistent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_file_names() {
        assert_eq!(StoreTarget::main().file_name(), "config.json");
        assert_eq!(StoreTarget::modified().file_name(), "config_modified.json");
        assert_eq!(StoreTarget::named("scratch").file_name(), "scratch.json");
    }
}
