//! Cataloging: resolver access, the generic cataloger engine, and the
//! concurrent task orchestrator.

mod generic;
mod orchestrator;
mod resolver;

pub use generic::{CatalogResult, Cataloger, Environment, GenericCataloger, Parsed, Parser};
pub use orchestrator::{
    event_loop, run_tasks, FileDigestsTask, FileMetadataTask, PackageTask, Task,
};
pub use resolver::{
    all_locations, DirectoryResolver, FileResolver, LocationReader, MemoryResolver,
};

use crate::model::LinuxRelease;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared across a run.
///
/// Catalogers check it between locations; an external interrupt sets it and
/// the run winds down with its cleanup registrations intact.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Standard locations of the os-release record, in precedence order.
const OS_RELEASE_GLOBS: &[&str] = &["etc/os-release", "usr/lib/os-release"];

/// Identify the Linux distribution of the scanned filesystem, if any.
pub fn detect_linux_release(resolver: &dyn FileResolver) -> Option<LinuxRelease> {
    let locations = match resolver.files_by_glob(OS_RELEASE_GLOBS) {
        Ok(locations) => locations,
        Err(err) => {
            tracing::warn!("unable to query for os-release: {err}");
            return None;
        }
    };

    for location in locations {
        let mut reader = match resolver.open(&location) {
            Ok(reader) => reader,
            Err(err) => {
                tracing::warn!("unable to open {location}: {err}");
                continue;
            }
        };
        match reader.read_string() {
            Ok(content) => {
                if let Some(release) = LinuxRelease::from_os_release(&content) {
                    return Some(release);
                }
            }
            Err(err) => tracing::warn!("unable to read {location}: {err}"),
        }
    }
    None
}
