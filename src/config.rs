//! Application configuration.
//!
//! The configuration selects catalogers and file tasks for a run; a
//! snapshot of it is embedded in every produced document's descriptor so a
//! document records how it was generated.

use crate::error::{Result, SbomForgeError};
use crate::utils::glob;
use serde::{Deserialize, Serialize};

/// Digest algorithms this build can compute.
const SUPPORTED_DIGEST_ALGORITHMS: &[&str] = &["sha256"];

/// Configuration for a cataloging run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ForgeConfig {
    /// Catalogers to run; `None` runs every registered cataloger
    pub catalogers: Option<Vec<String>>,
    /// Glob patterns excluded from source indexing
    pub exclusions: Vec<String>,
    /// Record filesystem metadata for every indexed file
    pub file_metadata: bool,
    /// Compute content digests for every indexed file
    pub file_digests: bool,
    pub digest_algorithms: Vec<String>,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            catalogers: None,
            exclusions: Vec::new(),
            file_metadata: false,
            file_digests: false,
            digest_algorithms: vec!["sha256".to_string()],
        }
    }
}

impl ForgeConfig {
    /// Check the configuration for contradictions before a run starts.
    pub fn validate(&self) -> Result<()> {
        if let Some(selection) = &self.catalogers {
            let known = crate::catalogers::names();
            for name in selection {
                if !known.contains(&name.as_str()) {
                    return Err(SbomForgeError::config(format!(
                        "unknown cataloger {name:?} (available: {})",
                        known.join(", ")
                    )));
                }
            }
        }

        for pattern in &self.exclusions {
            if glob::compile(pattern).is_err() {
                return Err(SbomForgeError::config(format!(
                    "invalid exclusion pattern {pattern:?}"
                )));
            }
        }

        if self.file_digests {
            for algorithm in &self.digest_algorithms {
                if !SUPPORTED_DIGEST_ALGORITHMS.contains(&algorithm.as_str()) {
                    return Err(SbomForgeError::config(format!(
                        "unsupported digest algorithm {algorithm:?} (supported: {})",
                        SUPPORTED_DIGEST_ALGORITHMS.join(", ")
                    )));
                }
            }
        }

        Ok(())
    }

    /// The configuration snapshot embedded in the document descriptor.
    pub fn snapshot(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ForgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_cataloger_is_rejected() {
        let config = ForgeConfig {
            catalogers: Some(vec!["frobnicator-cataloger".to_string()]),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_digest_algorithm_is_rejected() {
        let config = ForgeConfig {
            file_digests: true,
            digest_algorithms: vec!["md5".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_round_trips() {
        let config = ForgeConfig {
            exclusions: vec!["target/**".to_string()],
            file_metadata: true,
            ..Default::default()
        };
        let snapshot = config.snapshot().expect("snapshot");
        let restored: ForgeConfig = serde_json::from_value(snapshot).expect("restore");
        assert_eq!(restored.exclusions, config.exclusions);
        assert!(restored.file_metadata);
    }
}
