//! Description of the content source a scan ran against.

use super::{ArtifactId, ArtifactRef, Identifiable};
use serde::{Deserialize, Serialize};

/// The kind of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceScheme {
    #[default]
    Directory,
    File,
    Image,
}

/// Metadata captured for a container image source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub user_input: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Where the scanned content came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourceDescription {
    /// Identifier declared by a decoded document; derived when absent
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub scheme: SourceScheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageMetadata>,
}

impl SourceDescription {
    pub fn for_directory(path: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            scheme: SourceScheme::Directory,
            path: Some(path.into()),
            image: None,
        }
    }

    pub fn for_file(path: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            scheme: SourceScheme::File,
            path: Some(path.into()),
            image: None,
        }
    }

    pub fn for_image(image: ImageMetadata) -> Self {
        Self {
            id: String::new(),
            scheme: SourceScheme::Image,
            path: None,
            image: Some(image),
        }
    }

    fn derived_id(&self) -> ArtifactId {
        let scheme = match self.scheme {
            SourceScheme::Directory => "directory",
            SourceScheme::File => "file",
            SourceScheme::Image => "image",
        };
        let target = match (&self.path, &self.image) {
            (Some(path), _) => path.clone(),
            (None, Some(image)) => image.image_id.clone(),
            (None, None) => String::new(),
        };
        ArtifactId::from_fields(&[scheme, &target])
    }
}

impl Identifiable for SourceDescription {
    fn id(&self) -> ArtifactId {
        if self.id.is_empty() {
            self.derived_id()
        } else {
            ArtifactId::new(self.id.clone())
        }
    }

    fn reference(&self) -> ArtifactRef {
        ArtifactRef::Source(self.id())
    }
}
