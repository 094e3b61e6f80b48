//! The identity-keyed package collection.

use super::{ArtifactId, Identifiable, Package};
use indexmap::IndexMap;

/// All packages discovered during a run, keyed by identity.
///
/// Insertion merges: when two catalogers discover the same package (equal
/// identity), their location evidence is unioned onto one node instead of
/// producing a duplicate.
#[derive(Debug, Clone, Default)]
pub struct PackageCollection {
    packages: IndexMap<ArtifactId, Package>,
}

impl PackageCollection {
    pub fn new() -> Self {
        Self {
            packages: IndexMap::new(),
        }
    }

    /// Insert a package, merging into an existing node on identity collision.
    pub fn add(&mut self, package: Package) {
        let id = package.id();
        match self.packages.get_mut(&id) {
            Some(existing) => existing.merge(&package),
            None => {
                self.packages.insert(id, package);
            }
        }
    }

    pub fn get(&self, id: &ArtifactId) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.packages.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate packages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Packages sorted by (name, version, type) for deterministic output.
    pub fn sorted(&self) -> Vec<&Package> {
        let mut packages: Vec<&Package> = self.packages.values().collect();
        packages.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.version.cmp(&b.version))
                .then_with(|| a.package_type.cmp(&b.package_type))
        });
        packages
    }

    /// All package identities in the collection.
    pub fn ids(&self) -> Vec<ArtifactId> {
        self.packages.keys().cloned().collect()
    }

    /// Move every package out of another collection into this one.
    pub fn extend(&mut self, other: PackageCollection) {
        for (_, package) in other.packages {
            self.add(package);
        }
    }
}

impl FromIterator<Package> for PackageCollection {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut collection = Self::new();
        for package in iter {
            collection.add(package);
        }
        collection
    }
}
