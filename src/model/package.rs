//! The package artifact: the unit of discovery for every cataloger.

use super::{ArtifactId, ArtifactRef, Identifiable, License, LocationSet};
use crate::utils::hash::canonical_json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The ecosystem type tag of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PackageType {
    Apk,
    Deb,
    Gem,
    GoModule,
    JavaArchive,
    Npm,
    Python,
    Rpm,
    RustCrate,
    #[default]
    Unknown,
}

impl PackageType {
    pub fn label(&self) -> &'static str {
        match self {
            PackageType::Apk => "apk",
            PackageType::Deb => "deb",
            PackageType::Gem => "gem",
            PackageType::GoModule => "go-module",
            PackageType::JavaArchive => "java-archive",
            PackageType::Npm => "npm",
            PackageType::Python => "python",
            PackageType::Rpm => "rpm",
            PackageType::RustCrate => "rust-crate",
            PackageType::Unknown => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "apk" => PackageType::Apk,
            "deb" => PackageType::Deb,
            "gem" => PackageType::Gem,
            "go-module" => PackageType::GoModule,
            "java-archive" => PackageType::JavaArchive,
            "npm" => PackageType::Npm,
            "python" => PackageType::Python,
            "rpm" => PackageType::Rpm,
            "rust-crate" => PackageType::RustCrate,
            _ => PackageType::Unknown,
        }
    }

    /// The package-url ecosystem type for this package type, if one exists.
    pub fn purl_type(&self) -> Option<&'static str> {
        match self {
            PackageType::Apk => Some("apk"),
            PackageType::Deb => Some("deb"),
            PackageType::Gem => Some("gem"),
            PackageType::GoModule => Some("golang"),
            PackageType::JavaArchive => Some("maven"),
            PackageType::Npm => Some("npm"),
            PackageType::Python => Some("pypi"),
            PackageType::Rpm => Some("rpm"),
            PackageType::RustCrate => Some("cargo"),
            PackageType::Unknown => None,
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for PackageType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for PackageType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(PackageType::from_label(&label))
    }
}

/// The source language of a package, where one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Go,
    Java,
    JavaScript,
    Python,
    Ruby,
    Rust,
    #[default]
    Unknown,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Unknown => "unknown",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "go" => Language::Go,
            "java" => Language::Java,
            "javascript" => Language::JavaScript,
            "python" => Language::Python,
            "ruby" => Language::Ruby,
            "rust" => Language::Rust,
            _ => Language::Unknown,
        }
    }
}

impl Serialize for Language {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Language::from_label(&label))
    }
}

/// Typed metadata payload attached to a package, discriminated by the
/// cataloger that produced it.
///
/// Decoded documents carrying metadata of a type this build does not know
/// keep the payload verbatim under [`PackageMetadata::Raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PackageMetadata {
    CargoLockEntry(CargoLockEntry),
    NpmPackageLockEntry(NpmPackageLockEntry),
    PythonPipfileLockEntry(PythonPipfileLockEntry),
    Raw(serde_json::Value),
    #[default]
    None,
}

impl PackageMetadata {
    /// The discriminant name written to document models.
    pub fn type_name(&self) -> &'static str {
        match self {
            PackageMetadata::CargoLockEntry(_) => "CargoLockEntry",
            PackageMetadata::NpmPackageLockEntry(_) => "NpmPackageLockEntry",
            PackageMetadata::PythonPipfileLockEntry(_) => "PythonPipfileLockEntry",
            PackageMetadata::Raw(_) => "Raw",
            PackageMetadata::None => "",
        }
    }

    /// Reconstruct typed metadata from a document's discriminant + payload.
    pub fn from_document(type_name: &str, payload: Option<serde_json::Value>) -> Self {
        let Some(value) = payload else {
            return PackageMetadata::None;
        };
        match type_name {
            "CargoLockEntry" => serde_json::from_value(value.clone())
                .map(PackageMetadata::CargoLockEntry)
                .unwrap_or(PackageMetadata::Raw(value)),
            "NpmPackageLockEntry" => serde_json::from_value(value.clone())
                .map(PackageMetadata::NpmPackageLockEntry)
                .unwrap_or(PackageMetadata::Raw(value)),
            "PythonPipfileLockEntry" => serde_json::from_value(value.clone())
                .map(PackageMetadata::PythonPipfileLockEntry)
                .unwrap_or(PackageMetadata::Raw(value)),
            _ => PackageMetadata::Raw(value),
        }
    }

    pub fn to_value(&self) -> Option<serde_json::Value> {
        match self {
            PackageMetadata::None => None,
            other => serde_json::to_value(other).ok(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PackageMetadata::None)
    }
}

/// One `[[package]]` record from a Cargo.lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CargoLockEntry {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// One dependency record from an npm package-lock.json file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NpmPackageLockEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    #[serde(default)]
    pub dev: bool,
}

/// One dependency record from a Pipfile.lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PythonPipfileLockEntry {
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub index: String,
}

/// A discovered software package.
///
/// Identity is derived from (name, version, type, metadata), except when a
/// decoded document supplies its own identifier, which is preserved verbatim
/// so the document's relationship edges keep resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// Name of the cataloger that discovered this package
    pub found_by: String,
    pub locations: LocationSet,
    pub licenses: Vec<License>,
    pub language: Language,
    pub package_type: PackageType,
    pub cpes: Vec<String>,
    pub purl: String,
    pub metadata: PackageMetadata,
    #[serde(skip)]
    pub raw_id: Option<ArtifactId>,
}

impl Package {
    /// Identity derived from the package's distinguishing fields.
    pub fn derived_id(&self) -> ArtifactId {
        let metadata = self
            .metadata
            .to_value()
            .map(|v| canonical_json(&v))
            .unwrap_or_default();
        ArtifactId::from_fields(&[
            self.name.trim(),
            self.version.trim(),
            self.package_type.label(),
            &metadata,
        ])
    }

    /// Preserve an identifier declared by an external document.
    ///
    /// We can't substitute a locally derived id: consumers of the original
    /// document hold references to the declared one.
    pub fn set_raw_id(&mut self, id: ArtifactId) {
        self.raw_id = Some(id);
    }

    pub fn has_raw_id(&self) -> bool {
        self.raw_id.is_some()
    }

    /// Merge another discovery of the same package into this one, unioning
    /// location evidence and CPE candidates.
    pub fn merge(&mut self, other: &Package) {
        self.locations.merge(&other.locations);
        for cpe in &other.cpes {
            if !self.cpes.contains(cpe) {
                self.cpes.push(cpe.clone());
            }
        }
    }
}

impl Identifiable for Package {
    fn id(&self) -> ArtifactId {
        match &self.raw_id {
            Some(id) => id.clone(),
            None => self.derived_id(),
        }
    }

    fn reference(&self) -> ArtifactRef {
        ArtifactRef::Package(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;

    fn sample_package(name: &str, version: &str) -> Package {
        Package {
            name: name.to_string(),
            version: version.to_string(),
            found_by: "cargo-lock-cataloger".to_string(),
            locations: vec![Location::new("Cargo.lock")].into(),
            package_type: PackageType::RustCrate,
            language: Language::Rust,
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = sample_package("serde", "1.0.200");
        let b = sample_package("serde", "1.0.200");
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_identity_distinguishes_versions_and_types() {
        let a = sample_package("serde", "1.0.200");
        let b = sample_package("serde", "1.0.201");
        assert_ne!(a.id(), b.id());

        let mut c = sample_package("serde", "1.0.200");
        c.package_type = PackageType::Npm;
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_identity_ignores_locations() {
        let a = sample_package("serde", "1.0.200");
        let mut b = sample_package("serde", "1.0.200");
        b.locations.insert(Location::new("vendor/Cargo.lock"));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_raw_id_overrides_derived() {
        let mut pkg = sample_package("serde", "1.0.200");
        let derived = pkg.id();
        pkg.set_raw_id(ArtifactId::new("document-declared-id"));
        assert_eq!(pkg.id().as_str(), "document-declared-id");
        assert_ne!(pkg.id(), derived);
    }

    #[test]
    fn test_metadata_distinguishes_identity() {
        let a = sample_package("serde", "1.0.200");
        let mut b = sample_package("serde", "1.0.200");
        b.metadata = PackageMetadata::CargoLockEntry(CargoLockEntry {
            name: "serde".into(),
            version: "1.0.200".into(),
            ..Default::default()
        });
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_merge_unions_locations_and_cpes() {
        let mut a = sample_package("serde", "1.0.200");
        a.cpes.push("cpe:2.3:a:serde:serde:1.0.200:*:*:*:*:*:*:*".into());
        let mut b = sample_package("serde", "1.0.200");
        b.locations.insert(Location::new("vendor/Cargo.lock"));
        b.cpes.push("cpe:2.3:a:serde:serde:1.0.200:*:*:*:*:*:*:*".into());

        a.merge(&b);
        assert_eq!(a.locations.len(), 2);
        assert_eq!(a.cpes.len(), 1);
    }

    #[test]
    fn test_metadata_document_round_trip() {
        let metadata = PackageMetadata::CargoLockEntry(CargoLockEntry {
            name: "regex".into(),
            version: "1.10.0".into(),
            source: Some("registry+https://github.com/rust-lang/crates.io-index".into()),
            checksum: None,
            dependencies: vec!["regex-syntax".into()],
        });

        let restored =
            PackageMetadata::from_document(metadata.type_name(), metadata.to_value());
        assert_eq!(metadata, restored);
    }

    #[test]
    fn test_unknown_metadata_type_kept_raw() {
        let payload = serde_json::json!({"installedSize": 1024});
        let restored = PackageMetadata::from_document("ApkDbEntry", Some(payload.clone()));
        assert_eq!(restored, PackageMetadata::Raw(payload));
    }
}
