//! Stable artifact identity.
//!
//! Every node in the SBOM graph (package, file coordinate, source
//! description) exposes an [`ArtifactId`] derived deterministically from its
//! distinguishing fields. Identical inputs always hash to the same id, which
//! is what lets independent catalogers discover the same package and have it
//! land on a single graph node.

use crate::utils::hash::{content_hash, hash_to_hex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable identifier for one artifact in the SBOM graph.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Wrap an identifier taken verbatim from an external document.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive an identifier from the distinguishing fields of an artifact.
    ///
    /// The parts are joined with a separator that cannot occur in field
    /// content, so `("ab", "c")` and `("a", "bc")` hash differently.
    pub fn from_fields(parts: &[&str]) -> Self {
        let joined = parts.join("\u{0}");
        Self(hash_to_hex(content_hash(joined.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ArtifactId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ArtifactId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Implemented by every graph node that carries a stable identity.
pub trait Identifiable {
    /// The stable identifier for this artifact.
    fn id(&self) -> ArtifactId;

    /// A typed reference to this artifact, usable as a relationship endpoint.
    fn reference(&self) -> super::ArtifactRef;
}
