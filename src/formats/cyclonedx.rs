//! CycloneDX codecs (JSON and XML).
//!
//! Both variants share one interchange model; the XML side wraps it in the
//! element containers the schema requires. Packages carry their forge type
//! tags through CycloneDX `properties` entries so a decode can restore them.

use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::formats::Format;
use crate::model::{
    ArtifactId, ArtifactRef, Identifiable, Language, License, Package, PackageType, Relationship,
    RelationshipKind, Sbom,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

pub const JSON_ID: &str = "cyclonedx-json";
pub const XML_ID: &str = "cyclonedx-xml";

/// The schema version this build writes.
const SPEC_VERSION: &str = "1.4";
/// Minor schema revisions stay structurally readable by this codec.
const ACCEPTED_VERSIONS: &str = "1.*";

const XMLNS: &str = "http://cyclonedx.org/schema/bom/1.4";

const TYPE_PROPERTY: &str = "forge:package:type";
const LANGUAGE_PROPERTY: &str = "forge:package:language";
const FOUND_BY_PROPERTY: &str = "forge:package:found-by";

pub fn json_format() -> Format {
    Format::new(
        JSON_ID,
        ACCEPTED_VERSIONS,
        Some(encode_json),
        Some(decode_json),
        Some(validate_json),
        &[],
    )
}

pub fn xml_format() -> Format {
    Format::new(
        XML_ID,
        ACCEPTED_VERSIONS,
        Some(encode_xml),
        Some(decode_xml),
        Some(validate_xml),
        &["cyclonedx", "cdx"],
    )
}

// ============================================================================
// Interchange model (JSON shape)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CdxBom {
    bom_format: String,
    spec_version: String,
    #[serde(default)]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<CdxMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<CdxComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<CdxDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tools: Vec<CdxTool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor: Option<String>,
    name: String,
    version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxComponent {
    #[serde(rename = "bom-ref", default, skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<CdxLicenseChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    properties: Vec<CdxProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxLicenseChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxProperty {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CdxDependency {
    #[serde(rename = "ref")]
    dependency_ref: String,
    #[serde(rename = "dependsOn", default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
}

// ============================================================================
// Aggregate -> interchange model
// ============================================================================

fn to_bom(sbom: &Sbom) -> CdxBom {
    let components = sbom
        .artifacts
        .packages
        .sorted()
        .into_iter()
        .map(to_component)
        .collect();

    // parent bom-ref -> sorted dependency refs
    let mut depends: HashMap<String, Vec<String>> = HashMap::new();
    for relationship in sbom.sorted_relationships() {
        if relationship.kind != RelationshipKind::DependencyOf {
            continue;
        }
        if let (ArtifactRef::Package(dependency), ArtifactRef::Package(parent)) =
            (&relationship.from, &relationship.to)
        {
            depends
                .entry(parent.to_string())
                .or_default()
                .push(dependency.to_string());
        }
    }
    let mut dependencies: Vec<CdxDependency> = depends
        .into_iter()
        .map(|(dependency_ref, depends_on)| CdxDependency {
            dependency_ref,
            depends_on,
        })
        .collect();
    dependencies.sort_by(|a, b| a.dependency_ref.cmp(&b.dependency_ref));

    CdxBom {
        bom_format: "CycloneDX".to_string(),
        spec_version: SPEC_VERSION.to_string(),
        version: 1,
        metadata: Some(CdxMetadata {
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            tools: vec![CdxTool {
                vendor: Some("binarly-io".to_string()),
                name: sbom.descriptor.name.clone(),
                version: sbom.descriptor.version.clone(),
            }],
        }),
        components,
        dependencies,
    }
}

fn to_component(package: &Package) -> CdxComponent {
    let mut properties = Vec::new();
    if package.package_type != PackageType::Unknown {
        properties.push(CdxProperty {
            name: TYPE_PROPERTY.to_string(),
            value: package.package_type.label().to_string(),
        });
    }
    if package.language != Language::Unknown {
        properties.push(CdxProperty {
            name: LANGUAGE_PROPERTY.to_string(),
            value: package.language.label().to_string(),
        });
    }
    if !package.found_by.is_empty() {
        properties.push(CdxProperty {
            name: FOUND_BY_PROPERTY.to_string(),
            value: package.found_by.clone(),
        });
    }

    CdxComponent {
        bom_ref: Some(package.id().to_string()),
        component_type: "library".to_string(),
        name: package.name.clone(),
        version: (!package.version.is_empty()).then(|| package.version.clone()),
        purl: (!package.purl.is_empty()).then(|| package.purl.clone()),
        licenses: package
            .licenses
            .iter()
            .map(|license| CdxLicenseChoice {
                expression: Some(license.as_str().to_string()),
            })
            .collect(),
        properties,
    }
}

// ============================================================================
// Interchange model -> aggregate
// ============================================================================

fn from_bom(bom: &CdxBom) -> Sbom {
    let mut sbom = Sbom::default();
    let mut refs: HashMap<String, ArtifactRef> = HashMap::new();

    for component in &bom.components {
        let package = from_component(component);
        let reference = package.reference();
        if let Some(bom_ref) = &component.bom_ref {
            refs.insert(bom_ref.clone(), reference);
        }
        sbom.artifacts.packages.add(package);
    }

    for dependency in &bom.dependencies {
        let Some(parent) = refs.get(&dependency.dependency_ref) else {
            tracing::warn!(
                "dependency ref {:?} is not a known component, dropping edges",
                dependency.dependency_ref
            );
            continue;
        };
        for child_ref in &dependency.depends_on {
            let Some(child) = refs.get(child_ref) else {
                tracing::warn!(
                    "dependsOn ref {child_ref:?} is not a known component, dropping edge"
                );
                continue;
            };
            sbom.relationships.push(Relationship::between(
                child.clone(),
                parent.clone(),
                RelationshipKind::DependencyOf,
            ));
        }
    }

    sbom
}

fn from_component(component: &CdxComponent) -> Package {
    let property = |name: &str| -> Option<&str> {
        component
            .properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    };

    let package_type = property(TYPE_PROPERTY)
        .map(PackageType::from_label)
        .filter(|t| *t != PackageType::Unknown)
        .unwrap_or_else(|| {
            component
                .purl
                .as_deref()
                .map(package_type_from_purl)
                .unwrap_or_default()
        });

    let mut package = Package {
        name: component.name.clone(),
        version: component.version.clone().unwrap_or_default(),
        found_by: property(FOUND_BY_PROPERTY).unwrap_or_default().to_string(),
        language: property(LANGUAGE_PROPERTY)
            .map(Language::from_label)
            .unwrap_or_default(),
        package_type,
        purl: component.purl.clone().unwrap_or_default(),
        licenses: component
            .licenses
            .iter()
            .filter_map(|choice| choice.expression.as_deref())
            .map(License::from)
            .collect(),
        ..Default::default()
    };
    if let Some(bom_ref) = &component.bom_ref {
        package.set_raw_id(ArtifactId::new(bom_ref.clone()));
    }
    package
}

/// Infer the forge package type from a purl's ecosystem segment.
pub(crate) fn package_type_from_purl(purl: &str) -> PackageType {
    let ecosystem = purl
        .strip_prefix("pkg:")
        .and_then(|rest| rest.split('/').next())
        .unwrap_or("");
    match ecosystem {
        "apk" => PackageType::Apk,
        "cargo" => PackageType::RustCrate,
        "deb" => PackageType::Deb,
        "gem" => PackageType::Gem,
        "golang" => PackageType::GoModule,
        "maven" => PackageType::JavaArchive,
        "npm" => PackageType::Npm,
        "pypi" => PackageType::Python,
        "rpm" => PackageType::Rpm,
        _ => PackageType::Unknown,
    }
}

// ============================================================================
// JSON codec
// ============================================================================

fn encode_json(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    let bom = to_bom(sbom);
    serde_json::to_writer_pretty(&mut *writer, &bom).map_err(|e| {
        SbomForgeError::format("cyclonedx-json", FormatErrorKind::Encode(e.to_string()))
    })?;
    writeln!(writer)?;
    Ok(())
}

fn decode_json(bytes: &[u8]) -> Result<Sbom> {
    let bom: CdxBom = serde_json::from_slice(bytes)
        .map_err(|e| SbomForgeError::decode("unable to decode cyclonedx-json", e.to_string()))?;
    if bom.bom_format != "CycloneDX" {
        return Err(SbomForgeError::decode(
            "unable to decode cyclonedx-json",
            format!("unexpected bomFormat {:?}", bom.bom_format),
        ));
    }
    Ok(from_bom(&bom))
}

fn validate_json(bytes: &[u8]) -> Result<()> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Markers {
        bom_format: String,
        #[allow(dead_code)]
        spec_version: String,
    }

    let markers: Markers = serde_json::from_slice(bytes).map_err(|e| {
        SbomForgeError::format("cyclonedx-json", FormatErrorKind::Validate(e.to_string()))
    })?;
    if markers.bom_format == "CycloneDX" {
        Ok(())
    } else {
        Err(SbomForgeError::format(
            "cyclonedx-json",
            FormatErrorKind::Validate("missing CycloneDX marker".to_string()),
        ))
    }
}

// ============================================================================
// XML codec
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "bom")]
struct XmlBom {
    #[serde(rename = "@xmlns")]
    xmlns: String,
    #[serde(rename = "@version")]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<XmlMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    components: Option<XmlComponents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependencies: Option<XmlDependencies>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct XmlMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct XmlComponents {
    #[serde(rename = "component", default)]
    component: Vec<XmlComponent>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct XmlComponent {
    #[serde(rename = "@type")]
    component_type: String,
    #[serde(rename = "@bom-ref", default, skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct XmlDependencies {
    #[serde(rename = "dependency", default)]
    dependency: Vec<XmlDependency>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct XmlDependency {
    #[serde(rename = "@ref")]
    dependency_ref: String,
    #[serde(rename = "dependency", default)]
    dependency: Vec<XmlDependency>,
}

fn encode_xml(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    let bom = to_bom(sbom);
    let xml = XmlBom {
        xmlns: XMLNS.to_string(),
        version: bom.version.max(1),
        metadata: bom
            .metadata
            .as_ref()
            .map(|metadata| XmlMetadata {
                timestamp: metadata.timestamp.clone(),
            }),
        components: Some(XmlComponents {
            component: bom
                .components
                .iter()
                .map(|component| XmlComponent {
                    component_type: component.component_type.clone(),
                    bom_ref: component.bom_ref.clone(),
                    name: component.name.clone(),
                    version: component.version.clone(),
                    purl: component.purl.clone(),
                })
                .collect(),
        }),
        dependencies: Some(XmlDependencies {
            dependency: bom
                .dependencies
                .iter()
                .map(|dependency| XmlDependency {
                    dependency_ref: dependency.dependency_ref.clone(),
                    dependency: dependency
                        .depends_on
                        .iter()
                        .map(|depends_on| XmlDependency {
                            dependency_ref: depends_on.clone(),
                            dependency: Vec::new(),
                        })
                        .collect(),
                })
                .collect(),
        }),
    };

    let body = quick_xml::se::to_string(&xml).map_err(|e| {
        SbomForgeError::format("cyclonedx-xml", FormatErrorKind::Encode(e.to_string()))
    })?;
    writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(writer, "{body}")?;
    Ok(())
}

fn decode_xml(bytes: &[u8]) -> Result<Sbom> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| SbomForgeError::decode("unable to decode cyclonedx-xml", e.to_string()))?;
    let xml: XmlBom = quick_xml::de::from_str(content)
        .map_err(|e| SbomForgeError::decode("unable to decode cyclonedx-xml", e.to_string()))?;

    // project onto the shared interchange model
    let bom = CdxBom {
        bom_format: "CycloneDX".to_string(),
        spec_version: SPEC_VERSION.to_string(),
        version: xml.version,
        metadata: None,
        components: xml
            .components
            .map(|components| {
                components
                    .component
                    .into_iter()
                    .map(|component| CdxComponent {
                        bom_ref: component.bom_ref,
                        component_type: component.component_type,
                        name: component.name,
                        version: component.version,
                        purl: component.purl,
                        licenses: Vec::new(),
                        properties: Vec::new(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        dependencies: xml
            .dependencies
            .map(|dependencies| {
                dependencies
                    .dependency
                    .into_iter()
                    .map(|dependency| CdxDependency {
                        dependency_ref: dependency.dependency_ref,
                        depends_on: dependency
                            .dependency
                            .into_iter()
                            .map(|child| child.dependency_ref)
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };
    Ok(from_bom(&bom))
}

fn validate_xml(bytes: &[u8]) -> Result<()> {
    let content = String::from_utf8_lossy(bytes);
    if content.contains("<bom") && content.contains("cyclonedx.org/schema/bom") {
        Ok(())
    } else {
        Err(SbomForgeError::format(
            "cyclonedx-xml",
            FormatErrorKind::Validate("missing CycloneDX bom markers".to_string()),
        ))
    }
}
