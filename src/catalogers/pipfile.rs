//! Cataloger for Python Pipfile.lock files.

use crate::catalog::{Environment, FileResolver, GenericCataloger, LocationReader, Parsed};
use crate::error::{Result, SbomForgeError};
use crate::model::{
    Language, Location, Package, PackageMetadata, PackageType, PythonPipfileLockEntry,
};
use packageurl::PackageUrl;
use serde::Deserialize;
use std::collections::BTreeMap;

const CATALOGER_NAME: &str = "python-pipfile-lock-cataloger";

/// Returns a new Pipfile.lock cataloger.
pub fn new_pipfile_lock_cataloger() -> GenericCataloger {
    GenericCataloger::new(CATALOGER_NAME)
        .with_parser_by_globs(parse_pipfile_lock, &["**/Pipfile.lock"])
}

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(default)]
    default: BTreeMap<String, PipfileDependency>,
    #[serde(default)]
    develop: BTreeMap<String, PipfileDependency>,
}

#[derive(Debug, Deserialize)]
struct PipfileDependency {
    version: Option<String>,
    #[serde(default)]
    hashes: Vec<String>,
    index: Option<String>,
}

/// Parser for Pipfile.lock contents, returning the pinned packages of both
/// the default and develop groups.
fn parse_pipfile_lock(
    _resolver: &dyn FileResolver,
    _environment: Option<&Environment>,
    mut reader: LocationReader,
) -> Result<Parsed> {
    let content = reader.read_string()?;
    let lock: PipfileLock = serde_json::from_str(&content)
        .map_err(|e| SbomForgeError::decode("parsing Pipfile.lock", e.to_string()))?;

    let location = reader.location.clone();
    let mut packages = Vec::new();
    for group in [&lock.default, &lock.develop] {
        for (name, dependency) in group {
            if let Some(package) = new_package_from_lock(name, dependency, &location) {
                packages.push(package);
            }
        }
    }
    Ok(Parsed::packages(packages))
}

fn new_package_from_lock(
    name: &str,
    dependency: &PipfileDependency,
    location: &Location,
) -> Option<Package> {
    // Pinned entries carry "==1.2.3"; entries without a concrete pin are
    // not catalogable.
    let version = dependency
        .version
        .as_deref()?
        .trim_start_matches("==")
        .to_string();
    if version.is_empty() {
        return None;
    }

    Some(Package {
        name: name.to_string(),
        version: version.clone(),
        found_by: CATALOGER_NAME.to_string(),
        locations: vec![location.clone()].into(),
        language: Language::Python,
        package_type: PackageType::Python,
        purl: python_purl(name, &version),
        metadata: PackageMetadata::PythonPipfileLockEntry(PythonPipfileLockEntry {
            hashes: dependency.hashes.clone(),
            index: dependency.index.clone().unwrap_or_default(),
        }),
        ..Default::default()
    })
}

fn python_purl(name: &str, version: &str) -> String {
    match PackageUrl::new("pypi", name) {
        Ok(mut purl) => {
            purl.with_version(version);
            purl.to_string()
        }
        Err(err) => {
            tracing::warn!("unable to build purl for distribution {name}: {err}");
            String::new()
        }
    }
}
