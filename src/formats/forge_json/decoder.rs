//! forge-json document to Sbom aggregate conversion.

use super::model::{Document, FileModel, PackageModel, SourceModel};
use crate::error::{Result, SbomForgeError};
use crate::model::{
    ArtifactId, ArtifactRef, Artifacts, Descriptor, FileMetadata, Identifiable, ImageMetadata,
    Language, License, Package, PackageMetadata, PackageType, Relationship, RelationshipKind,
    Sbom, SourceDescription, SourceScheme,
};
use std::collections::HashMap;

pub(super) fn decode(bytes: &[u8]) -> Result<Sbom> {
    let document: Document = serde_json::from_slice(bytes)
        .map_err(|e| SbomForgeError::decode("unable to decode forge-json", e.to_string()))?;
    to_sbom(document)
}

pub(super) fn to_sbom(document: Document) -> Result<Sbom> {
    let mut id_aliases: HashMap<String, String> = HashMap::new();

    let mut artifacts = Artifacts::default();
    for model in &document.artifacts {
        artifacts.packages.add(to_package(model, &mut id_aliases));
    }

    for file in &document.files {
        if let Some(metadata) = &file.metadata {
            artifacts
                .file_metadata
                .insert(file.location.clone(), to_file_metadata(file, metadata));
        }
        if !file.digests.is_empty() {
            artifacts
                .file_digests
                .insert(file.location.clone(), file.digests.clone());
        }
    }
    artifacts.linux_distribution = document.distro.clone();

    let source = to_source(&document.source);

    let relationships = to_relationships(&document, &artifacts, &source, &id_aliases);

    Ok(Sbom {
        source,
        descriptor: Descriptor {
            name: document.descriptor.name.clone(),
            version: document.descriptor.version.clone(),
            configuration: document.descriptor.configuration.clone(),
        },
        artifacts,
        relationships,
    })
}

fn to_package(model: &PackageModel, id_aliases: &mut HashMap<String, String>) -> Package {
    let mut package = Package {
        name: model.name.clone(),
        version: model.version.clone(),
        found_by: model.found_by.clone(),
        locations: model.locations.clone().into(),
        licenses: model
            .licenses
            .iter()
            .map(|license| License::new(license.clone()))
            .collect(),
        language: Language::from_label(&model.language),
        package_type: PackageType::from_label(&model.package_type),
        cpes: model.cpes.clone(),
        purl: model.purl.clone(),
        metadata: PackageMetadata::from_document(&model.metadata_type, model.metadata.clone()),
        ..Default::default()
    };

    // We can't derive our own id here: consumers of the original document
    // hold references to the declared one, so it is preserved verbatim.
    package.set_raw_id(ArtifactId::new(model.id.clone()));

    // Alias bookkeeping for ids that shifted during decode. Currently the
    // preserved id always wins, so the table stays empty, but resolution
    // consults it to stay compatible with documents that need it.
    let id = package.id();
    if id.as_str() != model.id {
        id_aliases.insert(model.id.clone(), id.to_string());
    }

    package
}

fn to_file_metadata(file: &FileModel, metadata: &super::model::FileMetadataModel) -> FileMetadata {
    // the document stores permission bits as octal digits
    let mode = u32::from_str_radix(&metadata.mode.to_string(), 8).unwrap_or_else(|_| {
        tracing::warn!(
            "invalid mode in file catalog @ location={} mode={}",
            file.location,
            metadata.mode
        );
        0
    });
    FileMetadata {
        kind: metadata.kind,
        mode,
        size: metadata.size,
        link_destination: metadata.link_destination.clone(),
        mime_type: metadata.mime_type.clone(),
    }
}

fn to_source(model: &SourceModel) -> SourceDescription {
    let mut source = match model.scheme.as_str() {
        "file" => SourceDescription {
            scheme: SourceScheme::File,
            path: model.target.as_str().map(str::to_string),
            ..Default::default()
        },
        "image" => {
            let image: Option<ImageMetadata> =
                serde_json::from_value(model.target.clone()).ok();
            if image.is_none() {
                tracing::warn!("unable to parse source target as image metadata");
            }
            SourceDescription {
                scheme: SourceScheme::Image,
                image,
                ..Default::default()
            }
        }
        other => {
            if other != "directory" {
                tracing::warn!("unknown source type {other:?}, assuming directory");
            }
            SourceDescription {
                scheme: SourceScheme::Directory,
                path: model.target.as_str().map(str::to_string),
                ..Default::default()
            }
        }
    };
    source.id = model.id.clone();
    source
}

/// Resolve every document relationship against the identity map.
///
/// Edges with unresolvable endpoints or uncoercible kinds are dropped with
/// a warning; a malformed relationship subset never fails the decode.
fn to_relationships(
    document: &Document,
    artifacts: &Artifacts,
    source: &SourceDescription,
    id_aliases: &HashMap<String, String>,
) -> Vec<Relationship> {
    let mut id_map: HashMap<String, ArtifactRef> = HashMap::new();

    for package in artifacts.packages.iter() {
        id_map.insert(package.id().to_string(), package.reference());
        for location in package.locations.iter() {
            id_map.insert(
                location.coordinates.id().to_string(),
                location.coordinates.reference(),
            );
        }
    }

    for file in &document.files {
        id_map.insert(file.id.clone(), file.location.reference());
    }

    id_map.insert(source.id().to_string(), source.reference());

    let resolve = |document_id: &str| -> Option<ArtifactRef> {
        let aliased = id_aliases
            .get(document_id)
            .map(String::as_str)
            .unwrap_or(document_id);
        id_map.get(aliased).cloned()
    };

    let mut relationships = Vec::new();
    for model in &document.artifact_relationships {
        let Some(from) = resolve(&model.parent) else {
            tracing::warn!(
                "relationship parent {:?} is not a known artifact, dropping edge",
                model.parent
            );
            continue;
        };
        let Some(to) = resolve(&model.child) else {
            tracing::warn!(
                "relationship child {:?} is not a known artifact, dropping edge",
                model.child
            );
            continue;
        };
        let Some(kind) = RelationshipKind::coerce(&model.kind) else {
            continue;
        };

        let mut relationship = Relationship::between(from, to, kind);
        relationship.data = model.metadata.clone();
        relationships.push(relationship);
    }
    relationships
}
