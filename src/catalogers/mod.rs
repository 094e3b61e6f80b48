//! Built-in ecosystem catalogers.
//!
//! Each submodule provides one concrete cataloger as a constructor over the
//! generic engine; this module is the explicit registration table the rest
//! of the application selects from.

pub mod cargo;
pub mod npm;
pub mod pipfile;

use crate::catalog::{Cataloger, GenericCataloger};
use crate::error::{Result, SbomForgeError};

type Constructor = fn() -> GenericCataloger;

/// The registration table: cataloger name to constructor.
const REGISTRY: &[(&str, Constructor)] = &[
    ("cargo-lock-cataloger", cargo::new_cargo_lock_cataloger),
    ("npm-package-lock-cataloger", npm::new_package_lock_cataloger),
    (
        "python-pipfile-lock-cataloger",
        pipfile::new_pipfile_lock_cataloger,
    ),
];

/// Names of every registered cataloger.
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Instantiate every registered cataloger.
pub fn all() -> Vec<Box<dyn Cataloger>> {
    REGISTRY
        .iter()
        .map(|(_, constructor)| Box::new(constructor()) as Box<dyn Cataloger>)
        .collect()
}

/// Instantiate the catalogers selected by name.
pub fn select(selection: &[String]) -> Result<Vec<Box<dyn Cataloger>>> {
    let mut catalogers = Vec::with_capacity(selection.len());
    for name in selection {
        let constructor = REGISTRY
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, constructor)| constructor)
            .ok_or_else(|| {
                SbomForgeError::config(format!(
                    "unknown cataloger {name:?} (available: {})",
                    names().join(", ")
                ))
            })?;
        catalogers.push(Box::new(constructor()) as Box<dyn Cataloger>);
    }
    Ok(catalogers)
}
