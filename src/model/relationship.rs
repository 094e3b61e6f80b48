//! Typed, directed edges between identifiable artifacts.

use super::{ArtifactId, Coordinates, Identifiable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed reference to a relationship endpoint.
///
/// Endpoints are resolved through a typed lookup table during decode, so an
/// edge can only ever point at a package, a file coordinate, or the source
/// description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactRef {
    Package(ArtifactId),
    File(Coordinates),
    Source(ArtifactId),
}

impl ArtifactRef {
    pub fn id(&self) -> ArtifactId {
        match self {
            ArtifactRef::Package(id) | ArtifactRef::Source(id) => id.clone(),
            ArtifactRef::File(coordinates) => coordinates.id(),
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRef::Package(id) => write!(f, "package:{id}"),
            ArtifactRef::File(coordinates) => write!(f, "file:{coordinates}"),
            ArtifactRef::Source(id) => write!(f, "source:{id}"),
        }
    }
}

/// The enumerated relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ownership-by-file-overlap")]
    OwnershipByFileOverlap,
    #[serde(rename = "dependency-of")]
    DependencyOf,
    #[serde(rename = "evident-by")]
    EvidentBy,
}

impl RelationshipKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelationshipKind::Contains => "contains",
            RelationshipKind::OwnershipByFileOverlap => "ownership-by-file-overlap",
            RelationshipKind::DependencyOf => "dependency-of",
            RelationshipKind::EvidentBy => "evident-by",
        }
    }

    /// Resolve an exact kind label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "contains" => Some(RelationshipKind::Contains),
            "ownership-by-file-overlap" => Some(RelationshipKind::OwnershipByFileOverlap),
            "dependency-of" => Some(RelationshipKind::DependencyOf),
            "evident-by" => Some(RelationshipKind::EvidentBy),
            _ => None,
        }
    }

    /// Resolve a kind label from an external document, coercing near-miss
    /// spellings.
    ///
    /// Documents produced by other tools carry kind strings like
    /// "runtime-dependency-of"; any unrecognized label containing
    /// "dependency-of" is read as [`RelationshipKind::DependencyOf`] rather
    /// than dropping the edge. This is a deliberate compatibility shim
    /// inherited from the wire formats, not an extension point.
    pub fn coerce(label: &str) -> Option<Self> {
        if let Some(kind) = Self::from_label(label) {
            return Some(kind);
        }
        if label.contains("dependency-of") {
            tracing::warn!(
                "assuming {:?} for relationship kind {label:?}",
                RelationshipKind::DependencyOf.label()
            );
            return Some(RelationshipKind::DependencyOf);
        }
        tracing::warn!("unknown relationship kind: {label:?}");
        None
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A directed, typed edge between two identifiable artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: ArtifactRef,
    pub to: ArtifactRef,
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Relationship {
    pub fn new(from: &dyn Identifiable, to: &dyn Identifiable, kind: RelationshipKind) -> Self {
        Self {
            from: from.reference(),
            to: to.reference(),
            kind,
            data: None,
        }
    }

    pub fn between(from: ArtifactRef, to: ArtifactRef, kind: RelationshipKind) -> Self {
        Self {
            from,
            to,
            kind,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sort key giving deterministic edge ordering for document output.
    pub fn sort_key(&self) -> (ArtifactId, ArtifactId, &'static str) {
        (self.from.id(), self.to.id(), self.kind.label())
    }
}
