//! File coordinates, locations, and per-file evidence.

use super::{ArtifactId, ArtifactRef, Identifiable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An addressable position within the content source: the concrete path plus
/// the filesystem or layer it was observed in.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Coordinates {
    /// Path within the source, relative to its root
    #[serde(rename = "path")]
    pub real_path: String,
    /// Identifier of the originating filesystem or image layer, empty for
    /// plain directory sources
    #[serde(rename = "layerID", default, skip_serializing_if = "String::is_empty")]
    pub file_system_id: String,
}

impl Coordinates {
    pub fn new(real_path: impl Into<String>) -> Self {
        Self {
            real_path: real_path.into(),
            file_system_id: String::new(),
        }
    }

    pub fn in_file_system(real_path: impl Into<String>, fs_id: impl Into<String>) -> Self {
        Self {
            real_path: real_path.into(),
            file_system_id: fs_id.into(),
        }
    }
}

impl Identifiable for Coordinates {
    fn id(&self) -> ArtifactId {
        ArtifactId::from_fields(&[&self.real_path, &self.file_system_id])
    }

    fn reference(&self) -> ArtifactRef {
        ArtifactRef::File(self.clone())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file_system_id.is_empty() {
            write!(f, "{}", self.real_path)
        } else {
            write!(f, "{} (fs {})", self.real_path, self.file_system_id)
        }
    }
}

/// A coordinate plus the access path it was reached through (symlink chains
/// and image squash paths can differ from the real path).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Location {
    #[serde(flatten)]
    pub coordinates: Coordinates,
    /// The virtual path used to reach the file, when different from the
    /// real path
    #[serde(
        rename = "accessPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_path: Option<String>,
}

impl Location {
    pub fn new(real_path: impl Into<String>) -> Self {
        Self {
            coordinates: Coordinates::new(real_path),
            access_path: None,
        }
    }

    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            access_path: None,
        }
    }

    pub fn with_access_path(mut self, access_path: impl Into<String>) -> Self {
        self.access_path = Some(access_path.into());
        self
    }

    pub fn real_path(&self) -> &str {
        &self.coordinates.real_path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coordinates)
    }
}

/// A deduplicated, deterministically ordered set of locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct LocationSet(BTreeSet<Location>);

impl LocationSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, location: Location) {
        self.0.insert(location);
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.0.contains(location)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union another set into this one.
    pub fn merge(&mut self, other: &LocationSet) {
        for location in other.iter() {
            self.0.insert(location.clone());
        }
    }
}

impl FromIterator<Location> for LocationSet {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Location>> for LocationSet {
    fn from(locations: Vec<Location>) -> Self {
        locations.into_iter().collect()
    }
}

/// The kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileKind {
    #[default]
    Regular,
    Directory,
    SymbolicLink,
    Irregular,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Regular => "RegularFile",
            FileKind::Directory => "Directory",
            FileKind::SymbolicLink => "SymbolicLink",
            FileKind::Irregular => "IrregularFile",
        }
    }

    /// Unknown labels fall back to the irregular kind rather than failing a
    /// decode.
    pub fn from_label(label: &str) -> Self {
        match label {
            "RegularFile" => FileKind::Regular,
            "Directory" => FileKind::Directory,
            "SymbolicLink" => FileKind::SymbolicLink,
            _ => FileKind::Irregular,
        }
    }
}

impl Serialize for FileKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for FileKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(FileKind::from_label(&label))
    }
}

/// Observed metadata for one file coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub kind: FileKind,
    /// Unix permission bits, octal-rendered by document codecs
    pub mode: u32,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_destination: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
}

/// One computed digest for a file coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub algorithm: String,
    pub value: String,
}
