//! Cataloger for Rust Cargo.lock files.

use crate::catalog::{Environment, FileResolver, GenericCataloger, LocationReader, Parsed};
use crate::error::{Result, SbomForgeError};
use crate::model::{
    CargoLockEntry, Language, Package, PackageMetadata, PackageType, Relationship,
    RelationshipKind,
};
use packageurl::PackageUrl;
use serde::Deserialize;
use std::collections::HashMap;

const CATALOGER_NAME: &str = "cargo-lock-cataloger";

/// Returns a new Cargo.lock cataloger.
pub fn new_cargo_lock_cataloger() -> GenericCataloger {
    GenericCataloger::new(CATALOGER_NAME).with_parser_by_globs(parse_cargo_lock, &["**/Cargo.lock"])
}

#[derive(Debug, Deserialize)]
struct CargoLockFile {
    #[serde(default)]
    package: Vec<CargoLockEntry>,
}

/// Parser for Cargo.lock contents, returning all rust crates recorded in the
/// lock file plus the dependency edges the file declares.
fn parse_cargo_lock(
    _resolver: &dyn FileResolver,
    _environment: Option<&Environment>,
    mut reader: LocationReader,
) -> Result<Parsed> {
    let content = reader.read_string()?;
    let lock: CargoLockFile = toml::from_str(&content)
        .map_err(|e| SbomForgeError::decode("parsing Cargo.lock", e.to_string()))?;

    let location = reader.location.clone();
    let mut packages = Vec::with_capacity(lock.package.len());
    for entry in &lock.package {
        packages.push(new_package_from_lock_entry(entry, &location));
    }

    // The lock file names each crate's direct dependencies; resolve them
    // back to the packages built above.
    let by_name: HashMap<&str, &Package> =
        packages.iter().map(|p| (p.name.as_str(), p)).collect();
    let mut relationships = Vec::new();
    for (entry, package) in lock.package.iter().zip(&packages) {
        for dependency in &entry.dependencies {
            let dep_name = dependency.split_whitespace().next().unwrap_or(dependency);
            if let Some(dep_package) = by_name.get(dep_name) {
                relationships.push(Relationship::new(
                    *dep_package,
                    package,
                    RelationshipKind::DependencyOf,
                ));
            }
        }
    }

    Ok(Parsed {
        packages,
        relationships,
    })
}

fn new_package_from_lock_entry(
    entry: &CargoLockEntry,
    location: &crate::model::Location,
) -> Package {
    Package {
        name: entry.name.clone(),
        version: entry.version.clone(),
        found_by: CATALOGER_NAME.to_string(),
        locations: vec![location.clone()].into(),
        language: Language::Rust,
        package_type: PackageType::RustCrate,
        purl: cargo_purl(&entry.name, &entry.version),
        metadata: PackageMetadata::CargoLockEntry(entry.clone()),
        ..Default::default()
    }
}

fn cargo_purl(name: &str, version: &str) -> String {
    match PackageUrl::new("cargo", name) {
        Ok(mut purl) => {
            purl.with_version(version);
            purl.to_string()
        }
        Err(err) => {
            tracing::warn!("unable to build purl for crate {name}: {err}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CancelToken, Cataloger, MemoryResolver};
    use crate::model::Identifiable;

    const CARGO_LOCK: &str = r#"
version = 3

[[package]]
name = "memchr"
version = "2.7.1"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "523dc4f511e55ab87b694dc30d0f820d60906ef06413f93d4d7a1385599cc149"

[[package]]
name = "aho-corasick"
version = "1.1.2"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "b2969dcb958b36655471fc61f7e416fa76033bdd4bfed0678d8fee1e2d07a1f0"
dependencies = [
 "memchr",
]
"#;

    #[test]
    fn test_parses_all_lock_entries() {
        let resolver = MemoryResolver::new().with_file("Cargo.lock", CARGO_LOCK);
        let cataloger = new_cargo_lock_cataloger();
        let result = cataloger.catalog(&resolver, None, &CancelToken::new());

        assert!(result.error.is_none());
        assert_eq!(result.packages.len(), 2);

        let memchr = result
            .packages
            .iter()
            .find(|p| p.name == "memchr")
            .expect("memchr package");
        assert_eq!(memchr.version, "2.7.1");
        assert_eq!(memchr.package_type, PackageType::RustCrate);
        assert_eq!(memchr.language, Language::Rust);
        assert_eq!(memchr.purl, "pkg:cargo/memchr@2.7.1");
        assert_eq!(memchr.found_by, CATALOGER_NAME);
    }

    #[test]
    fn test_lock_dependencies_become_edges() {
        let resolver = MemoryResolver::new().with_file("Cargo.lock", CARGO_LOCK);
        let result = new_cargo_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        assert_eq!(result.relationships.len(), 1);
        let edge = &result.relationships[0];
        assert_eq!(edge.kind, RelationshipKind::DependencyOf);

        let memchr = result
            .packages
            .iter()
            .find(|p| p.name == "memchr")
            .expect("memchr");
        assert_eq!(edge.from.id(), memchr.id());
    }

    #[test]
    fn test_keeps_typed_metadata() {
        let resolver = MemoryResolver::new().with_file("Cargo.lock", CARGO_LOCK);
        let result = new_cargo_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        let aho = result
            .packages
            .iter()
            .find(|p| p.name == "aho-corasick")
            .expect("aho-corasick");
        match &aho.metadata {
            PackageMetadata::CargoLockEntry(entry) => {
                assert_eq!(entry.dependencies, vec!["memchr"]);
                assert!(entry.checksum.is_some());
            }
            other => panic!("expected CargoLockEntry metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lock_reports_parser_error() {
        let resolver = MemoryResolver::new().with_file("Cargo.lock", "not [valid toml");
        let result = new_cargo_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        assert!(result.packages.is_empty());
        assert!(result.error.is_some());
    }
}
