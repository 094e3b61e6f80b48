//! SPDX 2.x JSON codec.

use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::formats::Format;
use crate::model::{
    ArtifactId, ArtifactRef, Identifiable, License, Package, Relationship, RelationshipKind, Sbom,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

pub const ID: &str = "spdx-json";

const SPDX_VERSION: &str = "SPDX-2.3";
/// 2.2 and 2.3 documents share the structure this codec reads.
const ACCEPTED_VERSIONS: &str = "2.*";

pub fn format() -> Format {
    Format::new(ID, ACCEPTED_VERSIONS, Some(encode), Some(decode), Some(validate), &[])
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SpdxDocument {
    #[serde(rename = "spdxVersion")]
    spdx_version: String,
    #[serde(rename = "dataLicense", default)]
    data_license: String,
    #[serde(rename = "SPDXID", default)]
    spdx_id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "documentNamespace", default)]
    document_namespace: String,
    #[serde(rename = "creationInfo", default)]
    creation_info: CreationInfo,
    #[serde(default)]
    packages: Vec<SpdxPackage>,
    #[serde(default)]
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CreationInfo {
    #[serde(default)]
    created: String,
    #[serde(default)]
    creators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(rename = "versionInfo", default, skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(rename = "downloadLocation", default)]
    download_location: String,
    #[serde(
        rename = "licenseConcluded",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    license_concluded: Option<String>,
    #[serde(rename = "externalRefs", default, skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<ExternalRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ExternalRef {
    #[serde(rename = "referenceCategory")]
    reference_category: String,
    #[serde(rename = "referenceType")]
    reference_type: String,
    #[serde(rename = "referenceLocator")]
    reference_locator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SpdxRelationship {
    #[serde(rename = "spdxElementId")]
    spdx_element_id: String,
    #[serde(rename = "relatedSpdxElement")]
    related_spdx_element: String,
    #[serde(rename = "relationshipType")]
    relationship_type: String,
}

/// A document-unique SPDX identifier for a package.
pub(crate) fn spdx_element_id(package: &Package) -> String {
    let raw = format!(
        "SPDXRef-Package-{}-{}-{}",
        package.package_type.label(),
        package.name,
        package.id()
    );
    // SPDX identifiers allow only letters, digits, '.', and '-'
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn encode(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    let packages = sbom.artifacts.packages.sorted();
    let id_for: HashMap<ArtifactId, String> = packages
        .iter()
        .map(|package| (package.id(), spdx_element_id(package)))
        .collect();

    let mut relationships = Vec::new();
    for relationship in sbom.sorted_relationships() {
        let (ArtifactRef::Package(from), ArtifactRef::Package(to)) =
            (&relationship.from, &relationship.to)
        else {
            // SPDX packages are the only elements this codec writes
            continue;
        };
        let (Some(element), Some(related)) = (id_for.get(from), id_for.get(to)) else {
            continue;
        };
        let relationship_type = match relationship.kind {
            RelationshipKind::Contains => "CONTAINS",
            RelationshipKind::DependencyOf => "DEPENDENCY_OF",
            RelationshipKind::OwnershipByFileOverlap | RelationshipKind::EvidentBy => "OTHER",
        };
        relationships.push(SpdxRelationship {
            spdx_element_id: element.clone(),
            related_spdx_element: related.clone(),
            relationship_type: relationship_type.to_string(),
        });
    }

    let document = SpdxDocument {
        spdx_version: SPDX_VERSION.to_string(),
        data_license: "CC0-1.0".to_string(),
        spdx_id: "SPDXRef-DOCUMENT".to_string(),
        name: sbom
            .source
            .path
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        document_namespace: format!(
            "https://binarly.io/spdxdocs/sbom-forge/{}",
            sbom.source.id()
        ),
        creation_info: CreationInfo {
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            creators: vec![format!(
                "Tool: {}-{}",
                sbom.descriptor.name, sbom.descriptor.version
            )],
        },
        packages: packages.iter().map(|p| to_spdx_package(p, &id_for)).collect(),
        relationships,
    };

    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|e| SbomForgeError::format(ID, FormatErrorKind::Encode(e.to_string())))?;
    writeln!(writer)?;
    Ok(())
}

fn to_spdx_package(package: &Package, id_for: &HashMap<ArtifactId, String>) -> SpdxPackage {
    let license = package
        .licenses
        .iter()
        .find(|license| license.is_valid_spdx())
        .map(|license| license.as_str().to_string());
    SpdxPackage {
        spdx_id: id_for
            .get(&package.id())
            .cloned()
            .unwrap_or_else(|| spdx_element_id(package)),
        name: package.name.clone(),
        version_info: (!package.version.is_empty()).then(|| package.version.clone()),
        download_location: "NOASSERTION".to_string(),
        license_concluded: license,
        external_refs: if package.purl.is_empty() {
            Vec::new()
        } else {
            vec![ExternalRef {
                reference_category: "PACKAGE-MANAGER".to_string(),
                reference_type: "purl".to_string(),
                reference_locator: package.purl.clone(),
            }]
        },
    }
}

fn decode(bytes: &[u8]) -> Result<Sbom> {
    let document: SpdxDocument = serde_json::from_slice(bytes)
        .map_err(|e| SbomForgeError::decode("unable to decode spdx-json", e.to_string()))?;
    if !document.spdx_version.starts_with("SPDX-") {
        return Err(SbomForgeError::decode(
            "unable to decode spdx-json",
            format!("unexpected spdxVersion {:?}", document.spdx_version),
        ));
    }

    let mut sbom = Sbom::default();
    let mut refs: HashMap<String, ArtifactRef> = HashMap::new();

    for spdx_package in &document.packages {
        let package = from_spdx_package(spdx_package);
        refs.insert(spdx_package.spdx_id.clone(), package.reference());
        sbom.artifacts.packages.add(package);
    }

    for relationship in &document.relationships {
        let Some((kind, reversed)) = map_relationship_type(&relationship.relationship_type)
        else {
            continue;
        };
        let (Some(element), Some(related)) = (
            refs.get(&relationship.spdx_element_id),
            refs.get(&relationship.related_spdx_element),
        ) else {
            tracing::warn!(
                "relationship references unknown SPDX element ({} -> {}), dropping edge",
                relationship.spdx_element_id,
                relationship.related_spdx_element
            );
            continue;
        };
        let (from, to) = if reversed {
            (related.clone(), element.clone())
        } else {
            (element.clone(), related.clone())
        };
        sbom.relationships
            .push(Relationship::between(from, to, kind));
    }

    Ok(sbom)
}

/// Map an SPDX relationship type onto a forge kind.
///
/// `DEPENDS_ON` carries the same fact as `DEPENDENCY_OF` with the endpoints
/// swapped, so it maps with a reversal rather than being dropped.
fn map_relationship_type(relationship_type: &str) -> Option<(RelationshipKind, bool)> {
    match relationship_type {
        "CONTAINS" => Some((RelationshipKind::Contains, false)),
        "DEPENDENCY_OF" => Some((RelationshipKind::DependencyOf, false)),
        "DEPENDS_ON" => Some((RelationshipKind::DependencyOf, true)),
        "DESCRIBES" | "DESCRIBED_BY" | "OTHER" => None,
        other => {
            tracing::warn!("unsupported SPDX relationship type {other:?}, dropping edge");
            None
        }
    }
}

fn from_spdx_package(spdx_package: &SpdxPackage) -> Package {
    let purl = spdx_package
        .external_refs
        .iter()
        .find(|r| r.reference_type == "purl")
        .map(|r| r.reference_locator.clone())
        .unwrap_or_default();

    let mut package = Package {
        name: spdx_package.name.clone(),
        version: spdx_package.version_info.clone().unwrap_or_default(),
        package_type: super::cyclonedx::package_type_from_purl(&purl),
        purl,
        licenses: spdx_package
            .license_concluded
            .iter()
            .filter(|l| !l.is_empty() && *l != "NOASSERTION" && *l != "NONE")
            .map(|l| License::from(l.as_str()))
            .collect(),
        ..Default::default()
    };
    package.set_raw_id(ArtifactId::new(spdx_package.spdx_id.clone()));
    package
}

fn validate(bytes: &[u8]) -> Result<()> {
    #[derive(Deserialize)]
    struct Markers {
        #[serde(rename = "spdxVersion")]
        spdx_version: String,
        #[serde(rename = "SPDXID")]
        #[allow(dead_code)]
        spdx_id: String,
    }

    let markers: Markers = serde_json::from_slice(bytes)
        .map_err(|e| SbomForgeError::format(ID, FormatErrorKind::Validate(e.to_string())))?;
    if markers.spdx_version.starts_with("SPDX-") {
        Ok(())
    } else {
        Err(SbomForgeError::format(
            ID,
            FormatErrorKind::Validate("missing SPDX version marker".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Descriptor, Language, Location, PackageType, SourceDescription};

    fn sample_sbom() -> Sbom {
        let mut sbom = Sbom::new(
            SourceDescription::for_directory("/srv/app"),
            Descriptor::new("sbom-forge", "0.1.0"),
        );
        let requests = Package {
            name: "requests".into(),
            version: "2.31.0".into(),
            found_by: "python-pipfile-lock-cataloger".into(),
            locations: vec![Location::new("Pipfile.lock")].into(),
            language: Language::Python,
            package_type: PackageType::Python,
            purl: "pkg:pypi/requests@2.31.0".into(),
            licenses: vec![License::new("Apache-2.0")],
            ..Default::default()
        };
        let urllib3 = Package {
            name: "urllib3".into(),
            version: "2.1.0".into(),
            found_by: "python-pipfile-lock-cataloger".into(),
            locations: vec![Location::new("Pipfile.lock")].into(),
            language: Language::Python,
            package_type: PackageType::Python,
            purl: "pkg:pypi/urllib3@2.1.0".into(),
            ..Default::default()
        };
        sbom.relationships.push(Relationship::new(
            &urllib3,
            &requests,
            RelationshipKind::DependencyOf,
        ));
        sbom.artifacts.packages.add(requests);
        sbom.artifacts.packages.add(urllib3);
        sbom
    }

    #[test]
    fn test_round_trip_keeps_packages_and_edges() {
        let original = sample_sbom();
        let format = format();

        let mut encoded = Vec::new();
        format.encode(&mut encoded, &original).expect("encode");
        let decoded = format.decode(&mut encoded.as_slice()).expect("decode");

        assert_eq!(decoded.artifacts.packages.len(), 2);
        assert_eq!(decoded.relationships.len(), 1);
        assert_eq!(decoded.relationships[0].kind, RelationshipKind::DependencyOf);

        let requests = decoded
            .artifacts
            .packages
            .iter()
            .find(|p| p.name == "requests")
            .expect("requests");
        assert_eq!(requests.purl, "pkg:pypi/requests@2.31.0");
        assert_eq!(requests.package_type, PackageType::Python);
        assert_eq!(requests.licenses.len(), 1);
    }

    #[test]
    fn test_depends_on_maps_with_reversed_endpoints() {
        let format = format();
        let mut bytes: &[u8] = br#"{
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "demo",
            "packages": [
                {"SPDXID": "SPDXRef-a", "name": "alpha", "downloadLocation": "NOASSERTION"},
                {"SPDXID": "SPDXRef-b", "name": "beta", "downloadLocation": "NOASSERTION"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-a", "relatedSpdxElement": "SPDXRef-b", "relationshipType": "DEPENDS_ON"}
            ]
        }"#;
        let decoded = format.decode(&mut bytes).expect("decode");
        assert_eq!(decoded.relationships.len(), 1);
        let edge = &decoded.relationships[0];
        assert_eq!(edge.kind, RelationshipKind::DependencyOf);
        // alpha DEPENDS_ON beta means beta is a dependency of alpha
        assert_eq!(edge.from.id().as_str(), "SPDXRef-b");
        assert_eq!(edge.to.id().as_str(), "SPDXRef-a");
    }

    #[test]
    fn test_unknown_relationship_types_drop_without_failing() {
        let format = format();
        let mut bytes: &[u8] = br#"{
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "demo",
            "packages": [
                {"SPDXID": "SPDXRef-a", "name": "alpha", "downloadLocation": "NOASSERTION"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-a", "relatedSpdxElement": "SPDXRef-a", "relationshipType": "AMENDS"}
            ]
        }"#;
        let decoded = format.decode(&mut bytes).expect("decode");
        assert!(decoded.relationships.is_empty());
        assert_eq!(decoded.artifacts.packages.len(), 1);
    }

    #[test]
    fn test_spdx_ids_are_sanitized() {
        let package = Package {
            name: "libstdc++".into(),
            version: "13".into(),
            package_type: PackageType::Deb,
            ..Default::default()
        };
        let id = spdx_element_id(&package);
        assert!(id.starts_with("SPDXRef-Package-deb-libstdc--"));
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    }

    #[test]
    fn test_validate_distinguishes_formats() {
        let format = format();
        assert!(format
            .validate(br#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}"#)
            .is_ok());
        assert!(format
            .validate(br#"{"bomFormat": "CycloneDX", "specVersion": "1.4"}"#)
            .is_err());
    }
}
