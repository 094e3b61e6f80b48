//! Human-readable table encoder.

use crate::error::Result;
use crate::formats::{Format, ANY_VERSION};
use crate::model::Sbom;
use std::io::Write;

pub const ID: &str = "table";

pub fn format() -> Format {
    Format::new(ID, ANY_VERSION, Some(encode), None, None, &["forge-table"])
}

fn encode(writer: &mut dyn Write, sbom: &Sbom) -> Result<()> {
    let packages = sbom.artifacts.packages.sorted();
    if packages.is_empty() {
        writeln!(writer, "No packages discovered")?;
        return Ok(());
    }

    let mut rows: Vec<[String; 3]> = vec![[
        "NAME".to_string(),
        "VERSION".to_string(),
        "TYPE".to_string(),
    ]];
    for package in packages {
        rows.push([
            package.name.clone(),
            package.version.clone(),
            package.package_type.label().to_string(),
        ]);
    }

    let mut widths = [0usize; 3];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    for row in &rows {
        writeln!(
            writer,
            "{:<name$}  {:<version$}  {:<kind$}",
            row[0],
            row[1],
            row[2],
            name = widths[0],
            version = widths[1],
            kind = widths[2],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Package, PackageType};

    #[test]
    fn test_encode_aligns_columns() {
        let mut sbom = Sbom::default();
        sbom.artifacts.packages.add(Package {
            name: "a-very-long-package-name".into(),
            version: "1.0.0".into(),
            package_type: PackageType::Npm,
            ..Default::default()
        });
        sbom.artifacts.packages.add(Package {
            name: "b".into(),
            version: "2".into(),
            package_type: PackageType::RustCrate,
            ..Default::default()
        });

        let mut out = Vec::new();
        format().encode(&mut out, &sbom).expect("encode");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        // version column starts at the same offset on every line
        let offset = lines[0].find("VERSION").expect("header column");
        assert_eq!(&lines[1][offset..offset + 1], "1");
        assert_eq!(&lines[2][offset..offset + 1], "2");
    }

    #[test]
    fn test_encode_empty_catalog() {
        let mut out = Vec::new();
        format().encode(&mut out, &Sbom::default()).expect("encode");
        assert!(String::from_utf8(out).expect("utf8").contains("No packages"));
    }
}
