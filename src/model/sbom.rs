//! The canonical in-memory SBOM document.

use super::{
    Coordinates, FileDigest, FileMetadata, LinuxRelease, PackageCollection, Relationship,
    SourceDescription,
};
use std::collections::BTreeMap;

/// Producer identity stamped into every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
    /// Snapshot of the configuration the run used
    pub configuration: Option<serde_json::Value>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            configuration: None,
        }
    }

    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// Everything discovered within the content source.
///
/// Each field has exactly one producing task during a run; the maps are
/// ordered so encoders emit them deterministically.
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    pub packages: PackageCollection,
    pub file_metadata: BTreeMap<Coordinates, FileMetadata>,
    pub file_digests: BTreeMap<Coordinates, Vec<FileDigest>>,
    pub linux_distribution: Option<LinuxRelease>,
}

/// The canonical SBOM aggregate: one source, one producer descriptor, the
/// discovered artifacts, and the relationship edges between them.
#[derive(Debug, Clone, Default)]
pub struct Sbom {
    pub source: SourceDescription,
    pub descriptor: Descriptor,
    pub artifacts: Artifacts,
    pub relationships: Vec<Relationship>,
}

impl Sbom {
    pub fn new(source: SourceDescription, descriptor: Descriptor) -> Self {
        Self {
            source,
            descriptor,
            artifacts: Artifacts::default(),
            relationships: Vec::new(),
        }
    }

    /// Relationships in deterministic output order.
    ///
    /// Discovery order is a race between concurrent tasks; documents must
    /// not depend on it.
    pub fn sorted_relationships(&self) -> Vec<&Relationship> {
        let mut relationships: Vec<&Relationship> = self.relationships.iter().collect();
        relationships.sort_by_key(|r| r.sort_key());
        relationships
    }

    /// Every file coordinate with observed metadata or digests.
    pub fn file_coordinates(&self) -> Vec<&Coordinates> {
        let mut coordinates: Vec<&Coordinates> = self
            .artifacts
            .file_metadata
            .keys()
            .chain(self.artifacts.file_digests.keys())
            .collect();
        coordinates.sort();
        coordinates.dedup();
        coordinates
    }
}
