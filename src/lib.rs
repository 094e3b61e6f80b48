//! **A library for generating and converting Software Bills of Materials (SBOMs).**
//!
//! `sbom-forge` inventories the software packages present in a filesystem
//! and produces a canonical graph of packages, files, and the relationships
//! between them, exportable in multiple standardized document formats. It is
//! designed as a foundation for supply chain security and compliance
//! tooling that needs machine-readable, reproducible records of what
//! software is present.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: The canonical, format-agnostic document model. The
//!   [`Sbom`] aggregate holds a source description, a producer descriptor,
//!   the discovered artifacts, and the typed relationship edges between
//!   them. Identity is central: every package, file coordinate, and source
//!   exposes a stable [`ArtifactId`] used to deduplicate and cross-reference
//!   artifacts.
//! - **[`catalog`]**: The cataloging machinery. A [`FileResolver`] provides
//!   glob- and MIME-queryable access to a content source, the
//!   [`GenericCataloger`] dispatches parser plugins over matching locations,
//!   and the orchestrator runs many catalogers concurrently while merging
//!   their output into one aggregate.
//! - **[`catalogers`]**: Built-in ecosystem catalogers (Cargo.lock,
//!   package-lock.json, Pipfile.lock) registered by name.
//! - **[`formats`]**: The format registry and codecs. Each on-disk SBOM
//!   standard is a [`Format`] with encode/decode/validate functions and a
//!   version-compatibility range; [`FormatRegistry::identify`] recognizes
//!   documents from raw bytes.
//! - **[`bus`]**: The typed event bus lifecycle collaborators subscribe to.
//!
//! ## Getting Started: Scanning a Directory
//!
//! ```no_run
//! use sbom_forge::catalog::{
//!     run_tasks, CancelToken, DirectoryResolver, PackageTask, Task,
//! };
//! use sbom_forge::model::{Descriptor, Sbom, SourceDescription};
//! use sbom_forge::{catalogers, EventBus};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = DirectoryResolver::new("path/to/project", &[])?;
//!     let tasks: Vec<Box<dyn Task>> = catalogers::all()
//!         .into_iter()
//!         .map(|c| Box::new(PackageTask::new(c, Default::default())) as Box<dyn Task>)
//!         .collect();
//!
//!     let mut sbom = Sbom::new(
//!         SourceDescription::for_directory("path/to/project"),
//!         Descriptor::new("sbom-forge", "0.1.0"),
//!     );
//!     run_tasks(&tasks, &resolver, &mut sbom, &EventBus::new(), &CancelToken::new())?;
//!
//!     println!("found {} packages", sbom.artifacts.packages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Encoding and Decoding Documents
//!
//! ```no_run
//! use sbom_forge::formats::FormatRegistry;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = FormatRegistry::default();
//!
//!     // decode any identifiable document
//!     let mut file = std::fs::File::open("sbom.json")?;
//!     let (sbom, format) = registry.decode(&mut file)?;
//!     println!("decoded a {} document", format.id());
//!
//!     // re-encode in another format
//!     let cyclonedx = registry.by_name("cyclonedx-json").expect("registered");
//!     let bytes = registry.encode(&sbom, cyclonedx)?;
//!     std::fs::write("sbom.cdx.json", bytes)?;
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Variable names like `old`/`new` are clear in context
    clippy::similar_names
)]

pub mod bus;
pub mod catalog;
pub mod catalogers;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod model;
pub mod utils;

// Re-export main types for convenience
pub use bus::{Event, EventBus, FinalAction};
pub use catalog::{
    CancelToken, Cataloger, DirectoryResolver, FileResolver, GenericCataloger, MemoryResolver,
    Parser,
};
pub use cleanup::CleanupGuard;
pub use config::ForgeConfig;
pub use error::{ErrorContext, Result, SbomForgeError};
pub use formats::{Format, FormatRegistry};
pub use model::{
    ArtifactId, ArtifactRef, Identifiable, Package, PackageCollection, Relationship,
    RelationshipKind, Sbom,
};
