//! Plain text encoder.

use crate::error::Result;
use crate::formats::{Format, ANY_VERSION};
use crate::model::{Sbom, SourceScheme};
use std::io::Write;

pub const ID: &str = "text";

pub fn format() -> Format {
    Format::new(ID, ANY_VERSION, Some(encode), None, None, &["forge-text"])
}

fn encode(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    match sbom.source.scheme {
        SourceScheme::Directory | SourceScheme::File => {
            writeln!(
                writer,
                "[Path: {}]",
                sbom.source.path.as_deref().unwrap_or("unknown")
            )?;
        }
        SourceScheme::Image => {
            let name = sbom
                .source
                .image
                .as_ref()
                .map(|image| image.user_input.as_str())
                .unwrap_or("unknown");
            writeln!(writer, "[Image: {name}]")?;
        }
    }

    for package in sbom.artifacts.packages.sorted() {
        writeln!(writer, "[{}]", package.name)?;
        writeln!(writer, "  Version:\t{}", package.version)?;
        writeln!(writer, "  Type:\t\t{}", package.package_type)?;
        if !package.found_by.is_empty() {
            writeln!(writer, "  Found by:\t{}", package.found_by)?;
        }
    }
    Ok(())
}
