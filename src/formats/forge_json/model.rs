//! Serialized document model for the native forge-json format.

use crate::model::{Coordinates, FileDigest, FileKind, LinuxRelease, Location};
use serde::{Deserialize, Serialize};

/// The top-level forge-json document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub artifacts: Vec<PackageModel>,
    #[serde(rename = "artifactRelationships", default)]
    pub artifact_relationships: Vec<RelationshipModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileModel>,
    pub source: SourceModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<LinuxRelease>,
    pub descriptor: DescriptorModel,
    pub schema: SchemaModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageModel {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(rename = "foundBy", default)]
    pub found_by: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default)]
    pub cpes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purl: String,
    #[serde(
        rename = "metadataType",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub metadata_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipModel {
    pub parent: String,
    pub child: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModel {
    pub id: String,
    pub location: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadataModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub digests: Vec<FileDigest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadataModel {
    /// Permission bits rendered as their octal digits (0o644 is stored
    /// as the number 644)
    pub mode: u32,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: u64,
    #[serde(
        rename = "linkDestination",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub link_destination: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceModel {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub scheme: String,
    pub target: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorModel {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaModel {
    pub version: String,
    pub url: String,
}
