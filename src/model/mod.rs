//! The canonical, format-agnostic SBOM data model.
//!
//! Every document codec encodes from and decodes into these types. Identity
//! is the load-bearing concept: packages, file coordinates, and the source
//! description all expose a stable [`ArtifactId`] that relationship edges
//! reference, and that the decode path uses to stitch a document's graph
//! back together.

mod collection;
mod file;
mod identity;
mod license;
mod package;
mod relationship;
mod release;
mod sbom;
mod source;

pub use collection::PackageCollection;
pub use file::{Coordinates, FileDigest, FileKind, FileMetadata, Location, LocationSet};
pub use identity::{ArtifactId, Identifiable};
pub use license::License;
pub use package::{
    CargoLockEntry, Language, NpmPackageLockEntry, Package, PackageMetadata, PackageType,
    PythonPipfileLockEntry,
};
pub use relationship::{ArtifactRef, Relationship, RelationshipKind};
pub use release::LinuxRelease;
pub use sbom::{Artifacts, Descriptor, Sbom};
pub use source::{ImageMetadata, SourceDescription, SourceScheme};
