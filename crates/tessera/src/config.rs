//! Engine configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TesseraError};

/// Tunable bounds for the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Lowest accepted priority (clients and tasks).
    pub priority_min: f64,
    /// Highest accepted priority (clients and tasks).
    pub priority_max: f64,
    /// Minimum task duration.
    pub min_duration: f64,
    /// Lowest valid phase number.
    pub min_phase: i64,
    /// Emit an info notice when tasks with only preferred phases are left
    /// out of the phase-capacity sums.
    pub report_uncounted_demand: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            priority_min: 1.0,
            priority_max: 5.0,
            min_duration: 1.0,
            min_phase: 1,
            report_uncounted_demand: true,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TesseraError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.check()?;
        Ok(config)
    }

    /// Reject inconsistent bounds.
    pub fn check(&self) -> Result<()> {
        if !(self.priority_min <= self.priority_max) {
            return Err(TesseraError::Config(format!(
                "priorityMin ({}) must not exceed priorityMax ({})",
                self.priority_min, self.priority_max
            )));
        }
        if !self.min_duration.is_finite() {
            return Err(TesseraError::Config("minDuration must be a finite number".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"priorityMax": 10}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.priority_max, 10.0);
        assert_eq!(config.priority_min, 1.0);
        assert!(config.report_uncounted_demand);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"priorityMin": 6, "priorityMax": 2}"#).unwrap();

        assert!(matches!(
            EngineConfig::from_file(file.path()),
            Err(TesseraError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EngineConfig::from_file("/nonexistent/tessera.json"),
            Err(TesseraError::Io { .. })
        ));
    }
}
