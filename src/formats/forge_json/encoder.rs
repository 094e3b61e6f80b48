//! Sbom aggregate to forge-json document conversion.

use super::model::{
    DescriptorModel, Document, FileMetadataModel, FileModel, PackageModel, RelationshipModel,
    SchemaModel, SourceModel,
};
use super::{JSON_SCHEMA_VERSION, SCHEMA_URL};
use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::model::{Identifiable, Package, Sbom, SourceScheme};
use std::io::Write;

pub(super) fn encode(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    let document = to_document(sbom);
    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|e| SbomForgeError::format("forge-json", FormatErrorKind::Encode(e.to_string())))?;
    writeln!(writer)?;
    Ok(())
}

/// Build the serialized document. All collections are emitted in sorted
/// order so identical aggregates always produce identical bytes.
pub(super) fn to_document(sbom: &Sbom) -> Document {
    Document {
        artifacts: sbom
            .artifacts
            .packages
            .sorted()
            .into_iter()
            .map(to_package_model)
            .collect(),
        artifact_relationships: sbom
            .sorted_relationships()
            .into_iter()
            .map(|relationship| RelationshipModel {
                parent: relationship.from.id().to_string(),
                child: relationship.to.id().to_string(),
                kind: relationship.kind.label().to_string(),
                metadata: relationship.data.clone(),
            })
            .collect(),
        files: to_file_models(sbom),
        source: to_source_model(sbom),
        distro: sbom.artifacts.linux_distribution.clone(),
        descriptor: DescriptorModel {
            name: sbom.descriptor.name.clone(),
            version: sbom.descriptor.version.clone(),
            configuration: sbom.descriptor.configuration.clone(),
        },
        schema: SchemaModel {
            version: JSON_SCHEMA_VERSION.to_string(),
            url: SCHEMA_URL.to_string(),
        },
    }
}

fn to_package_model(package: &Package) -> PackageModel {
    PackageModel {
        id: package.id().to_string(),
        name: package.name.clone(),
        version: package.version.clone(),
        package_type: package.package_type.label().to_string(),
        found_by: package.found_by.clone(),
        locations: package.locations.iter().cloned().collect(),
        licenses: package
            .licenses
            .iter()
            .map(|license| license.as_str().to_string())
            .collect(),
        language: match package.language {
            crate::model::Language::Unknown => String::new(),
            language => language.label().to_string(),
        },
        cpes: package.cpes.clone(),
        purl: package.purl.clone(),
        metadata_type: package.metadata.type_name().to_string(),
        metadata: package.metadata.to_value(),
    }
}

fn to_file_models(sbom: &Sbom) -> Vec<FileModel> {
    sbom.file_coordinates()
        .into_iter()
        .map(|coordinates| {
            let metadata =
                sbom.artifacts
                    .file_metadata
                    .get(coordinates)
                    .map(|metadata| FileMetadataModel {
                        // permission bits travel as their octal digits
                        mode: format!("{:o}", metadata.mode).parse().unwrap_or(0),
                        kind: metadata.kind,
                        size: metadata.size,
                        link_destination: metadata.link_destination.clone(),
                        mime_type: metadata.mime_type.clone(),
                    });
            let digests = sbom
                .artifacts
                .file_digests
                .get(coordinates)
                .cloned()
                .unwrap_or_default();
            FileModel {
                id: coordinates.id().to_string(),
                location: coordinates.clone(),
                metadata,
                digests,
            }
        })
        .collect()
}

fn to_source_model(sbom: &Sbom) -> SourceModel {
    let source = &sbom.source;
    let (scheme, target) = match source.scheme {
        SourceScheme::Directory => (
            "directory",
            serde_json::Value::String(source.path.clone().unwrap_or_default()),
        ),
        SourceScheme::File => (
            "file",
            serde_json::Value::String(source.path.clone().unwrap_or_default()),
        ),
        SourceScheme::Image => (
            "image",
            serde_json::to_value(source.image.clone().unwrap_or_default())
                .unwrap_or(serde_json::Value::Null),
        ),
    };
    SourceModel {
        id: source.id().to_string(),
        scheme: scheme.to_string(),
        target,
    }
}
