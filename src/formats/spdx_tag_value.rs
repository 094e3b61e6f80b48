//! SPDX tag-value encoder.
//!
//! Write-only: the tag-value rendition exists for toolchains that still
//! require it, and round-tripping goes through the JSON codecs.

use crate::error::Result;
use crate::formats::Format;
use crate::model::Sbom;
use chrono::{SecondsFormat, Utc};
use std::io::Write;

pub const ID: &str = "spdx-tag-value";

pub fn format() -> Format {
    Format::new(ID, "2.3", Some(encode), None, None, &["spdx", "spdx-tv"])
}

fn encode(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    writeln!(writer, "SPDXVersion: SPDX-2.3")?;
    writeln!(writer, "DataLicense: CC0-1.0")?;
    writeln!(writer, "SPDXID: SPDXRef-DOCUMENT")?;
    writeln!(
        writer,
        "DocumentName: {}",
        sbom.source.path.as_deref().unwrap_or("unknown")
    )?;
    writeln!(
        writer,
        "Creator: Tool: {}-{}",
        sbom.descriptor.name, sbom.descriptor.version
    )?;
    writeln!(
        writer,
        "Created: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;

    for package in sbom.artifacts.packages.sorted() {
        writeln!(writer)?;
        writeln!(writer, "##### Package: {}", package.name)?;
        writeln!(writer)?;
        writeln!(writer, "PackageName: {}", package.name)?;
        writeln!(writer, "SPDXID: {}", super::spdx_json::spdx_element_id(package))?;
        if !package.version.is_empty() {
            writeln!(writer, "PackageVersion: {}", package.version)?;
        }
        writeln!(writer, "PackageDownloadLocation: NOASSERTION")?;
        match package.licenses.iter().find(|l| l.is_valid_spdx()) {
            Some(license) => writeln!(writer, "PackageLicenseConcluded: {license}")?,
            None => writeln!(writer, "PackageLicenseConcluded: NOASSERTION")?,
        }
        if !package.purl.is_empty() {
            writeln!(
                writer,
                "ExternalRef: PACKAGE-MANAGER purl {}",
                package.purl
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{License, Location, Package, PackageType};

    #[test]
    fn test_encode_renders_package_stanzas() {
        let mut sbom = Sbom::default();
        sbom.source = crate::model::SourceDescription::for_directory("/srv/app");
        sbom.descriptor = crate::model::Descriptor::new("sbom-forge", "0.1.0");
        sbom.artifacts.packages.add(Package {
            name: "memchr".into(),
            version: "2.7.1".into(),
            locations: vec![Location::new("Cargo.lock")].into(),
            package_type: PackageType::RustCrate,
            purl: "pkg:cargo/memchr@2.7.1".into(),
            licenses: vec![License::new("MIT")],
            ..Default::default()
        });

        let format = format();
        let mut out = Vec::new();
        format.encode(&mut out, &sbom).expect("encode");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.starts_with("SPDXVersion: SPDX-2.3"));
        assert!(text.contains("PackageName: memchr"));
        assert!(text.contains("PackageVersion: 2.7.1"));
        assert!(text.contains("PackageLicenseConcluded: MIT"));
        assert!(text.contains("ExternalRef: PACKAGE-MANAGER purl pkg:cargo/memchr@2.7.1"));
    }

    #[test]
    fn test_format_is_write_only() {
        let format = format();
        assert!(format.supports_encoding());
        assert!(!format.supports_decoding());
    }
}
