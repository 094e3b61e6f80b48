//! The native forge-json format: full-fidelity round trip of the canonical
//! document model.

mod decoder;
mod encoder;
pub mod model;

use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::formats::Format;

pub const ID: &str = "forge-json";

/// Version of the document schema this build writes and accepts.
pub const JSON_SCHEMA_VERSION: &str = "1.1.0";

pub const SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/binarly-io/sbom-forge/main/schema/json/schema-1.1.0.json";

pub fn format() -> Format {
    Format::new(
        ID,
        JSON_SCHEMA_VERSION,
        Some(encoder::encode),
        Some(decoder::decode),
        Some(validate),
        &["json", "forge"],
    )
}

/// Structural pre-check: the schema URL marks a forge-json document without
/// requiring a full decode.
fn validate(bytes: &[u8]) -> Result<()> {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct SchemaOnly {
        schema: model::SchemaModel,
    }

    let document: SchemaOnly = serde_json::from_slice(bytes).map_err(|e| {
        SbomForgeError::format("forge-json", FormatErrorKind::Validate(e.to_string()))
    })?;

    // note: all schema versions are accepted
    if document.schema.url.contains("sbom-forge") {
        Ok(())
    } else {
        Err(SbomForgeError::format(
            "forge-json",
            FormatErrorKind::Validate("document does not carry a forge schema".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Coordinates, Descriptor, FileDigest, FileMetadata, Identifiable, Language, Location,
        Package, PackageType, Relationship, RelationshipKind, Sbom, SourceDescription,
    };

    fn sample_sbom() -> Sbom {
        let mut sbom = Sbom::new(
            SourceDescription::for_directory("/srv/app"),
            Descriptor::new("sbom-forge", "0.1.0"),
        );

        let serde_pkg = Package {
            name: "serde".into(),
            version: "1.0.200".into(),
            found_by: "cargo-lock-cataloger".into(),
            locations: vec![Location::new("Cargo.lock")].into(),
            language: Language::Rust,
            package_type: PackageType::RustCrate,
            purl: "pkg:cargo/serde@1.0.200".into(),
            ..Default::default()
        };
        let serde_derive_pkg = Package {
            name: "serde_derive".into(),
            version: "1.0.200".into(),
            found_by: "cargo-lock-cataloger".into(),
            locations: vec![Location::new("Cargo.lock")].into(),
            language: Language::Rust,
            package_type: PackageType::RustCrate,
            purl: "pkg:cargo/serde_derive@1.0.200".into(),
            ..Default::default()
        };

        sbom.relationships.push(Relationship::new(
            &serde_derive_pkg,
            &serde_pkg,
            RelationshipKind::DependencyOf,
        ));
        sbom.artifacts.packages.add(serde_pkg);
        sbom.artifacts.packages.add(serde_derive_pkg);

        let coords = Coordinates::new("Cargo.lock");
        sbom.artifacts.file_metadata.insert(
            coords.clone(),
            FileMetadata {
                mode: 0o644,
                size: 1234,
                mime_type: "text/plain".into(),
                ..Default::default()
            },
        );
        sbom.artifacts.file_digests.insert(
            coords,
            vec![FileDigest {
                algorithm: "sha256".into(),
                value: "ab".repeat(32),
            }],
        );
        sbom
    }

    #[test]
    fn test_round_trip_preserves_identities_and_edges() {
        let original = sample_sbom();
        let format = format();

        let mut encoded = Vec::new();
        format.encode(&mut encoded, &original).expect("encode");

        let decoded = format.decode(&mut encoded.as_slice()).expect("decode");

        let mut original_ids = original.artifacts.packages.ids();
        let mut decoded_ids = decoded.artifacts.packages.ids();
        original_ids.sort();
        decoded_ids.sort();
        assert_eq!(original_ids, decoded_ids);

        assert_eq!(decoded.relationships.len(), 1);
        assert_eq!(
            decoded.relationships[0].kind,
            RelationshipKind::DependencyOf
        );

        assert_eq!(decoded.artifacts.file_metadata.len(), 1);
        let metadata = decoded
            .artifacts
            .file_metadata
            .values()
            .next()
            .expect("metadata");
        assert_eq!(metadata.mode, 0o644);
        assert_eq!(decoded.artifacts.file_digests.len(), 1);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let sbom = sample_sbom();
        let format = format();

        let mut first = Vec::new();
        format.encode(&mut first, &sbom).expect("encode");
        let mut second = Vec::new();
        format.encode(&mut second, &sbom).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_accepts_own_output() {
        let format = format();
        let mut encoded = Vec::new();
        format.encode(&mut encoded, &sample_sbom()).expect("encode");
        assert!(format.validate(&encoded).is_ok());
    }

    #[test]
    fn test_validate_rejects_foreign_documents() {
        let format = format();
        assert!(format
            .validate(br#"{"bomFormat": "CycloneDX", "specVersion": "1.4"}"#)
            .is_err());
    }

    #[test]
    fn test_decode_drops_unresolvable_edges() {
        let sbom = sample_sbom();
        let format = format();
        let mut encoded = Vec::new();
        format.encode(&mut encoded, &sbom).expect("encode");

        let mut document: serde_json::Value =
            serde_json::from_slice(&encoded).expect("parse encoded doc");
        document["artifactRelationships"]
            .as_array_mut()
            .expect("relationships array")
            .push(serde_json::json!({
                "parent": "0000000000000000",
                "child": "ffffffffffffffff",
                "type": "contains"
            }));
        let tampered = serde_json::to_vec(&document).expect("serialize");

        let decoded = format.decode(&mut tampered.as_slice()).expect("decode");
        // the bogus edge is dropped, the valid one survives
        assert_eq!(decoded.relationships.len(), 1);
    }

    #[test]
    fn test_decode_coerces_dependency_like_kinds() {
        let sbom = sample_sbom();
        let format = format();
        let mut encoded = Vec::new();
        format.encode(&mut encoded, &sbom).expect("encode");

        let mut document: serde_json::Value =
            serde_json::from_slice(&encoded).expect("parse encoded doc");
        document["artifactRelationships"][0]["type"] =
            serde_json::Value::String("runtime-dependency-of".into());
        let tampered = serde_json::to_vec(&document).expect("serialize");

        let decoded = format.decode(&mut tampered.as_slice()).expect("decode");
        assert_eq!(decoded.relationships.len(), 1);
        assert_eq!(
            decoded.relationships[0].kind,
            RelationshipKind::DependencyOf
        );
    }

    #[test]
    fn test_decode_drops_wholly_unknown_kinds_without_failing() {
        let sbom = sample_sbom();
        let format = format();
        let mut encoded = Vec::new();
        format.encode(&mut encoded, &sbom).expect("encode");

        let mut document: serde_json::Value =
            serde_json::from_slice(&encoded).expect("parse encoded doc");
        document["artifactRelationships"][0]["type"] =
            serde_json::Value::String("shares-build-cache-with".into());
        let tampered = serde_json::to_vec(&document).expect("serialize");

        let decoded = format.decode(&mut tampered.as_slice()).expect("decode");
        assert!(decoded.relationships.is_empty());
        assert_eq!(decoded.artifacts.packages.len(), 2);
    }

    #[test]
    fn test_decoded_packages_keep_document_ids() {
        let sbom = sample_sbom();
        let format = format();
        let mut encoded = Vec::new();
        format.encode(&mut encoded, &sbom).expect("encode");

        let mut document: serde_json::Value =
            serde_json::from_slice(&encoded).expect("parse encoded doc");
        document["artifacts"][0]["id"] = serde_json::Value::String("externally-chosen-id".into());
        // keep the graph consistent with the renamed node
        let tampered = serde_json::to_vec(&document).expect("serialize");

        let decoded = format.decode(&mut tampered.as_slice()).expect("decode");
        let ids: Vec<String> = decoded
            .artifacts
            .packages
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert!(ids.contains(&"externally-chosen-id".to_string()));
    }
}
