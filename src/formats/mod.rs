//! Document format registry and codecs.
//!
//! Every on-disk SBOM standard is represented by a [`Format`]: an
//! identifier, the schema version range it accepts, optional name aliases,
//! and up to three functions (encode, decode, validate). Formats are
//! registered into an explicit [`FormatRegistry`] at construction; nothing
//! here is process-global.

pub mod cyclonedx;
pub mod forge_json;
pub mod spdx_json;
pub mod spdx_tag_value;
pub mod table;
pub mod text;

use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::model::Sbom;
use std::io::{Read, Write};

/// The reserved version specifier matching every version.
pub const ANY_VERSION: &str = "any";

/// Writes an aggregate as this format's byte representation.
pub type Encoder = fn(&mut dyn Write, &Sbom) -> Result<()>;
/// Reconstructs an aggregate from this format's byte representation.
pub type Decoder = fn(&[u8]) -> Result<Sbom>;
/// Cheap structural pre-check distinguishing this format from others.
pub type Validator = fn(&[u8]) -> Result<()>;

/// One registered document format.
///
/// Display-only formats (table, text) legitimately carry no decoder or
/// validator; requesting the missing operation is a typed error, not a
/// panic.
#[derive(Clone)]
pub struct Format {
    id: &'static str,
    version: &'static str,
    aliases: &'static [&'static str],
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
    validator: Option<Validator>,
}

impl Format {
    pub fn new(
        id: &'static str,
        version: &'static str,
        encoder: Option<Encoder>,
        decoder: Option<Decoder>,
        validator: Option<Validator>,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            version,
            aliases,
            encoder,
            decoder,
            validator,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    pub fn supports_encoding(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn supports_decoding(&self) -> bool {
        self.decoder.is_some()
    }

    /// Encode an aggregate into the writer.
    ///
    /// Encoding is deterministic for identical input: packages,
    /// relationships, and file maps are emitted in sorted order.
    pub fn encode(&self, writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
        let encoder = self.encoder.ok_or_else(|| {
            SbomForgeError::format("encode", FormatErrorKind::MissingEncoder(self.id))
        })?;
        encoder(writer, sbom)
    }

    /// Decode an aggregate from the reader.
    pub fn decode(&self, reader: &mut dyn Read) -> Result<Sbom> {
        let decoder = self.decoder.ok_or_else(|| {
            SbomForgeError::format("decode", FormatErrorKind::MissingDecoder(self.id))
        })?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(SbomForgeError::format(
                format!("decode {}", self.id),
                FormatErrorKind::Decode("empty input".to_string()),
            ));
        }
        decoder(&bytes)
    }

    /// Check whether the bytes structurally belong to this format.
    pub fn validate(&self, bytes: &[u8]) -> Result<()> {
        let validator = self.validator.ok_or_else(|| {
            SbomForgeError::format("validate", FormatErrorKind::MissingValidator(self.id))
        })?;
        if bytes.is_empty() {
            return Err(SbomForgeError::format(
                format!("validate {}", self.id),
                FormatErrorKind::Validate("empty input".to_string()),
            ));
        }
        validator(bytes)
    }
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format")
            .field("id", &self.id)
            .field("version", &self.version)
            .finish()
    }
}

/// Registry of all installable formats.
///
/// Construct once at startup and pass by reference; identification order is
/// registration order, with the native format first.
pub struct FormatRegistry {
    formats: Vec<Format>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_default_formats()
    }
}

impl FormatRegistry {
    /// Registry containing every built-in format.
    pub fn with_default_formats() -> Self {
        Self {
            formats: vec![
                forge_json::format(),
                cyclonedx::json_format(),
                cyclonedx::xml_format(),
                spdx_json::format(),
                spdx_tag_value::format(),
                table::format(),
                text::format(),
            ],
        }
    }

    /// Registry over an explicit format list (mainly for tests and
    /// downstream applications installing their own codecs).
    pub fn new(formats: Vec<Format>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.formats.iter().map(Format::id).collect()
    }

    /// Resolve a case-normalized name or alias. Absence is a valid outcome,
    /// not an error.
    pub fn by_name(&self, name: &str) -> Option<&Format> {
        let cleaned = clean_format_name(name);
        self.formats.iter().find(|format| {
            clean_format_name(format.id) == cleaned
                || format
                    .aliases
                    .iter()
                    .any(|alias| clean_format_name(alias) == cleaned)
        })
    }

    /// Resolve by name, additionally requiring version compatibility.
    pub fn by_name_and_version(&self, name: &str, version: &str) -> Option<&Format> {
        let format = self.by_name(name)?;
        if version.is_empty() || version_matches(version, format.version) {
            Some(format)
        } else {
            None
        }
    }

    /// Inspect raw content and return the best-matching format, if any.
    pub fn identify(&self, bytes: &[u8]) -> Option<&Format> {
        if bytes.is_empty() {
            return None;
        }
        self.formats
            .iter()
            .find(|format| format.validator.is_some() && format.validate(bytes).is_ok())
    }

    /// Encode an aggregate to bytes with the given format.
    pub fn encode(&self, sbom: &Sbom, format: &Format) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        format.encode(&mut buffer, sbom)?;
        Ok(buffer)
    }

    /// Identify and decode a document from the reader.
    pub fn decode(&self, reader: &mut dyn Read) -> Result<(Sbom, &Format)> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(SbomForgeError::format(
                "decode",
                FormatErrorKind::Decode("empty input".to_string()),
            ));
        }
        let format = self.identify(&bytes).ok_or_else(|| {
            SbomForgeError::format("decode", FormatErrorKind::Unidentified)
        })?;
        let sbom = format.decode(&mut bytes.as_slice())?;
        Ok((sbom, format))
    }
}

/// Normalize a format name for lookup: lowercase, separators dropped.
fn clean_format_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '_'], "")
}

/// Whether a requested version specifier is compatible with a declared one.
///
/// Versions are dot-separated segments, optionally ending in a `*` wildcard
/// segment. Compatibility compares segment-by-segment over the shorter
/// prefix; a wildcard segment matches anything and stops the comparison, and
/// extra trailing segments on either side never disqualify a match. Document
/// schemas evolve with minor/patch versions that stay structurally readable
/// by the same codec, so one codec can declare a range without maintaining a
/// version list.
pub fn version_matches(version: &str, target: &str) -> bool {
    if version == ANY_VERSION || target == ANY_VERSION {
        return true;
    }
    let version_segments: Vec<&str> = version.split('.').collect();
    let target_segments: Vec<&str> = target.split('.').collect();
    for (ours, theirs) in version_segments.iter().zip(target_segments.iter()) {
        if *ours == "*" || *theirs == "*" {
            return true;
        }
        if ours != theirs {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_resolves_ids_and_aliases() {
        let registry = FormatRegistry::default();
        let cases = [
            // native
            ("json", "forge-json"),
            ("forge-json", "forge-json"),
            ("forgejson", "forge-json"),
            ("forge", "forge-json"),
            // CycloneDX JSON
            ("cyclonedx-json", "cyclonedx-json"),
            ("cyclonedxjson", "cyclonedx-json"),
            // CycloneDX XML
            ("cyclonedx", "cyclonedx-xml"),
            ("cyclonedx-xml", "cyclonedx-xml"),
            ("cyclonedxxml", "cyclonedx-xml"),
            ("cdx", "cyclonedx-xml"),
            // SPDX
            ("spdx-json", "spdx-json"),
            ("spdxjson", "spdx-json"),
            ("spdx", "spdx-tag-value"),
            ("spdx-tag-value", "spdx-tag-value"),
            ("spdx-tv", "spdx-tag-value"),
            ("spdxtv", "spdx-tag-value"),
            // display formats
            ("table", "table"),
            ("forge-table", "table"),
            ("text", "text"),
            ("forge-text", "text"),
        ];
        for (name, want) in cases {
            let format = registry.by_name(name);
            assert_eq!(
                format.map(Format::id),
                Some(want),
                "resolving name {name:?}"
            );
        }
    }

    #[test]
    fn test_by_name_absence_is_none() {
        let registry = FormatRegistry::default();
        assert!(registry.by_name("carrier-pigeon").is_none());
    }

    #[test]
    fn test_by_name_and_version_filters() {
        let registry = FormatRegistry::default();
        assert!(registry.by_name_and_version("spdx-json", "2.3").is_some());
        assert!(registry.by_name_and_version("spdx-json", "2").is_some());
        assert!(registry.by_name_and_version("spdx-json", "").is_some());
        assert!(registry.by_name_and_version("spdx-json", "3.0").is_none());
    }

    #[test]
    fn test_version_matches() {
        let cases = [
            // (version, target, matches)
            (ANY_VERSION, "6", true),
            ("6", ANY_VERSION, true),
            ("3", "3", true),
            ("3.1", "3", true),
            ("3.1", "3.1", true),
            ("7.1.3", "7.*", true),
            ("7.4.8", "7.4.*", true),
            ("7.19.11", "7", true),
            ("7.55.2", "7.55", true),
            ("7.32.6", "7.32.6", true),
            ("3", "4", false),
            ("7.2.5", "8.2.5", false),
            ("7.2.9", "7.1", false),
            ("7.2", "7.1", false),
            ("7.32.6", "7.32.5", false),
        ];
        for (version, target, want) in cases {
            assert_eq!(
                version_matches(version, target),
                want,
                "version_matches({version:?}, {target:?})"
            );
        }
    }

    #[test]
    fn test_identify_empty_input_is_none() {
        let registry = FormatRegistry::default();
        assert!(registry.identify(&[]).is_none());
    }

    #[test]
    fn test_decode_empty_input_is_typed_error() {
        let registry = FormatRegistry::default();
        let mut empty: &[u8] = &[];
        let result = registry.decode(&mut empty);
        assert!(matches!(
            result,
            Err(SbomForgeError::Format { .. })
        ));
    }

    #[test]
    fn test_every_format_survives_empty_input() {
        let registry = FormatRegistry::default();
        for format in registry.formats() {
            if format.supports_decoding() {
                let mut empty: &[u8] = &[];
                assert!(
                    format.decode(&mut empty).is_err(),
                    "{} decode must error on empty input",
                    format.id()
                );
            }
            if format.validator.is_some() {
                assert!(
                    format.validate(&[]).is_err(),
                    "{} validate must error on empty input",
                    format.id()
                );
            }
        }
    }

    #[test]
    fn test_display_formats_have_no_decoder() {
        let registry = FormatRegistry::default();
        for id in ["table", "text", "spdx-tag-value"] {
            let format = registry.by_name(id).expect("format registered");
            let mut bytes: &[u8] = b"anything";
            let err = format.decode(&mut bytes).expect_err("decoder missing");
            assert!(err.to_string().contains("decode"), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_clean_format_name() {
        assert_eq!(clean_format_name("SPDX-Tag-Value"), "spdxtagvalue");
        assert_eq!(clean_format_name("forge_json"), "forgejson");
    }
}
