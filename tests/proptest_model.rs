//! Property tests for identity derivation and version matching.

use proptest::prelude::*;
use sbom_forge::formats::version_matches;
use sbom_forge::model::{Identifiable, Language, Location, Package, PackageType};

fn package(name: &str, version: &str, location: &str) -> Package {
    Package {
        name: name.to_string(),
        version: version.to_string(),
        found_by: "prop-cataloger".to_string(),
        locations: vec![Location::new(location)].into(),
        language: Language::Rust,
        package_type: PackageType::RustCrate,
        ..Default::default()
    }
}

proptest! {
    /// Identical (name, version, type, metadata) tuples always derive
    /// identical identities, regardless of discovery location.
    #[test]
    fn identity_is_deterministic(
        name in "[a-z][a-z0-9-]{0,20}",
        version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        location_a in "[a-z/]{1,20}",
        location_b in "[a-z/]{1,20}",
    ) {
        let a = package(&name, &version, &location_a);
        let b = package(&name, &version, &location_b);
        prop_assert_eq!(a.id(), b.id());
    }

    /// Distinct versions never collide on identity.
    #[test]
    fn distinct_versions_have_distinct_identities(
        name in "[a-z][a-z0-9-]{0,20}",
        major in 0u32..1000,
    ) {
        let a = package(&name, &format!("{major}.0.0"), "x");
        let b = package(&name, &format!("{}.0.0", major + 1), "x");
        prop_assert_ne!(a.id(), b.id());
    }

    /// Every version matches itself and the any-version sentinel.
    #[test]
    fn version_matching_is_reflexive(
        version in "[0-9]{1,2}(\\.[0-9]{1,2}){0,3}",
    ) {
        prop_assert!(version_matches(&version, &version));
        prop_assert!(version_matches(&version, "any"));
        prop_assert!(version_matches("any", &version));
    }

    /// A version always matches its own major-segment prefix, and a
    /// trailing wildcard over it.
    #[test]
    fn version_matches_its_prefix(
        major in 0u32..100,
        minor in 0u32..100,
        patch in 0u32..100,
    ) {
        let full = format!("{major}.{minor}.{patch}");
        let major_minor = format!("{}.{}", major, minor);
        let major_wildcard = format!("{}.*", major);
        let next_major_minor = format!("{}.{}", major + 1, minor);
        prop_assert!(version_matches(&full, &major.to_string()));
        prop_assert!(version_matches(&full, &major_minor));
        prop_assert!(version_matches(&full, &major_wildcard));
        prop_assert!(!version_matches(&full, &next_major_minor));
    }
}
