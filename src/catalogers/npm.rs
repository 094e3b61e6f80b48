//! Cataloger for npm package-lock.json files.

use crate::catalog::{Environment, FileResolver, GenericCataloger, LocationReader, Parsed};
use crate::error::{Result, SbomForgeError};
use crate::model::{
    Language, Location, NpmPackageLockEntry, Package, PackageMetadata, PackageType,
};
use packageurl::PackageUrl;
use serde::Deserialize;
use std::collections::BTreeMap;

const CATALOGER_NAME: &str = "npm-package-lock-cataloger";

/// Returns a new package-lock.json cataloger.
pub fn new_package_lock_cataloger() -> GenericCataloger {
    GenericCataloger::new(CATALOGER_NAME)
        .with_parser_by_globs(parse_package_lock, &["**/package-lock.json"])
}

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    dependencies: BTreeMap<String, PackageLockDependency>,
}

#[derive(Debug, Deserialize)]
struct PackageLockDependency {
    version: String,
    resolved: Option<String>,
    integrity: Option<String>,
    #[serde(default)]
    dev: bool,
    // Nested trees appear when multiple versions of one package coexist
    #[serde(default)]
    dependencies: BTreeMap<String, PackageLockDependency>,
}

/// Parser for package-lock.json contents, returning every installed module
/// across the full (possibly nested) dependency tree.
fn parse_package_lock(
    _resolver: &dyn FileResolver,
    _environment: Option<&Environment>,
    mut reader: LocationReader,
) -> Result<Parsed> {
    let content = reader.read_string()?;
    let lock: PackageLock = serde_json::from_str(&content)
        .map_err(|e| SbomForgeError::decode("parsing package-lock.json", e.to_string()))?;

    let location = reader.location.clone();
    let mut packages = Vec::new();
    collect_dependencies(&lock.dependencies, &location, &mut packages);
    Ok(Parsed::packages(packages))
}

fn collect_dependencies(
    dependencies: &BTreeMap<String, PackageLockDependency>,
    location: &Location,
    out: &mut Vec<Package>,
) {
    for (name, dependency) in dependencies {
        out.push(new_package_from_lock(name, dependency, location));
        collect_dependencies(&dependency.dependencies, location, out);
    }
}

fn new_package_from_lock(
    name: &str,
    dependency: &PackageLockDependency,
    location: &Location,
) -> Package {
    Package {
        name: name.to_string(),
        version: dependency.version.clone(),
        found_by: CATALOGER_NAME.to_string(),
        locations: vec![location.clone()].into(),
        language: Language::JavaScript,
        package_type: PackageType::Npm,
        purl: npm_purl(name, &dependency.version),
        metadata: PackageMetadata::NpmPackageLockEntry(NpmPackageLockEntry {
            resolved: dependency.resolved.clone(),
            integrity: dependency.integrity.clone(),
            dev: dependency.dev,
        }),
        ..Default::default()
    }
}

fn npm_purl(name: &str, version: &str) -> String {
    match PackageUrl::new("npm", name) {
        Ok(mut purl) => {
            purl.with_version(version);
            purl.to_string()
        }
        Err(err) => {
            tracing::warn!("unable to build purl for module {name}: {err}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CancelToken, Cataloger, MemoryResolver};

    const PACKAGE_LOCK: &str = r#"{
  "name": "demo-app",
  "version": "1.0.0",
  "lockfileVersion": 1,
  "dependencies": {
    "lodash": {
      "version": "4.17.21",
      "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz",
      "integrity": "sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+LFTGHVxVjcXPs17LhbZVGedAJv8XZ1tvj5FvSg=="
    },
    "chalk": {
      "version": "4.1.2",
      "dev": true,
      "dependencies": {
        "ansi-styles": {
          "version": "4.3.0"
        }
      }
    }
  }
}"#;

    #[test]
    fn test_parses_nested_dependency_tree() {
        let resolver = MemoryResolver::new().with_file("package-lock.json", PACKAGE_LOCK);
        let result =
            new_package_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        assert!(result.error.is_none());
        let mut names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["ansi-styles", "chalk", "lodash"]);
    }

    #[test]
    fn test_keeps_resolution_metadata() {
        let resolver = MemoryResolver::new().with_file("package-lock.json", PACKAGE_LOCK);
        let result =
            new_package_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        let lodash = result
            .packages
            .iter()
            .find(|p| p.name == "lodash")
            .expect("lodash");
        assert_eq!(lodash.purl, "pkg:npm/lodash@4.17.21");
        match &lodash.metadata {
            PackageMetadata::NpmPackageLockEntry(entry) => {
                assert!(entry.resolved.as_deref().is_some_and(|r| r.contains("registry.npmjs.org")));
                assert!(!entry.dev);
            }
            other => panic!("expected NpmPackageLockEntry metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_dev_flag_survives() {
        let resolver = MemoryResolver::new().with_file("package-lock.json", PACKAGE_LOCK);
        let result =
            new_package_lock_cataloger().catalog(&resolver, None, &CancelToken::new());

        let chalk = result
            .packages
            .iter()
            .find(|p| p.name == "chalk")
            .expect("chalk");
        match &chalk.metadata {
            PackageMetadata::NpmPackageLockEntry(entry) => assert!(entry.dev),
            other => panic!("expected NpmPackageLockEntry metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lock_reports_parser_error() {
        let resolver = MemoryResolver::new().with_file("package-lock.json", "{]");
        let result =
            new_package_lock_cataloger().catalog(&resolver, None, &CancelToken::new());
        assert!(result.error.is_some());
    }
}
