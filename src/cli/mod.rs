//! Command handlers behind the thin clap shell in `main.rs`.

use crate::bus::{Event, EventBus, FinalAction};
use crate::catalog::{
    detect_linux_release, event_loop, run_tasks, CancelToken, DirectoryResolver, FileDigestsTask,
    FileMetadataTask, PackageTask, Task,
};
use crate::catalogers;
use crate::cleanup::CleanupGuard;
use crate::config::ForgeConfig;
use crate::error::{FormatErrorKind, Result, SbomForgeError};
use crate::formats::{Format, FormatRegistry};
use crate::model::{Descriptor, Sbom, SourceDescription};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

/// Producer name stamped into every document descriptor.
pub const APPLICATION_NAME: &str = "sbom-forge";

/// Options for the `scan` command.
pub struct ScanOptions {
    pub path: PathBuf,
    pub format_name: String,
    pub format_version: String,
    pub output_file: Option<PathBuf>,
    pub config: ForgeConfig,
}

/// Catalog a directory tree and deliver the document in the chosen format.
pub fn run_scan(options: ScanOptions) -> Result<()> {
    options.config.validate()?;
    let registry = FormatRegistry::default();
    let format = resolve_format(&registry, &options.format_name, &options.format_version)?;

    let bus = EventBus::new();
    let subscription = bus.subscribe();
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        // Non-fatal if a handler cannot be installed (e.g. in tests)
        ctrlc::set_handler(move || cancel.cancel()).ok();
    }

    let cleanup = CleanupGuard::new();
    let (err_tx, err_rx) = channel::<SbomForgeError>();

    let worker_bus = bus.clone();
    let worker_cancel = cancel.clone();
    let worker_format = format.clone();
    let output_file = options.output_file.clone();
    let config = options.config.clone();
    let path = options.path.clone();

    std::thread::spawn(move || {
        let outcome = scan_worker(
            &path,
            &config,
            worker_format,
            output_file,
            &worker_bus,
            &worker_cancel,
        );
        if let Err(error) = outcome {
            let _ = err_tx.send(error);
        }
        // err_tx drops here, signalling the event loop that the worker is done
    });

    event_loop(err_rx, subscription, cleanup)
}

fn scan_worker(
    path: &Path,
    config: &ForgeConfig,
    format: Format,
    output_file: Option<PathBuf>,
    bus: &EventBus,
    cancel: &CancelToken,
) -> Result<()> {
    bus.publish(Event::IndexingStarted {
        path: path.display().to_string(),
    });
    let resolver = DirectoryResolver::new(path, &config.exclusions)?;

    let environment = crate::catalog::Environment {
        linux_release: detect_linux_release(&resolver),
    };

    let selected = match &config.catalogers {
        Some(selection) => catalogers::select(selection)?,
        None => catalogers::all(),
    };

    let mut tasks: Vec<Box<dyn Task>> = selected
        .into_iter()
        .map(|cataloger| {
            Box::new(PackageTask::new(cataloger, environment.clone())) as Box<dyn Task>
        })
        .collect();
    if config.file_metadata {
        tasks.push(Box::new(FileMetadataTask));
    }
    if config.file_digests {
        tasks.push(Box::new(FileDigestsTask::new(
            config.digest_algorithms.clone(),
        )));
    }

    let descriptor = Descriptor::new(APPLICATION_NAME, env!("CARGO_PKG_VERSION"));
    let descriptor = match config.snapshot() {
        Some(snapshot) => descriptor.with_configuration(snapshot),
        None => descriptor,
    };
    let mut sbom = Sbom::new(
        SourceDescription::for_directory(path.display().to_string()),
        descriptor,
    );
    sbom.artifacts.linux_distribution = environment.linux_release.clone();

    run_tasks(&tasks, &resolver, &mut sbom, bus, cancel)?;

    bus.publish(Event::Exit(FinalAction::new(move || {
        let mut buffer = Vec::new();
        format.encode(&mut buffer, &sbom)?;
        write_output(output_file.as_deref(), &buffer)
    })));
    Ok(())
}

/// Options for the `convert` command.
pub struct ConvertOptions {
    pub input: PathBuf,
    pub format_name: String,
    pub format_version: String,
    pub output_file: Option<PathBuf>,
}

/// Decode any identifiable document and re-encode it in the chosen format.
pub fn run_convert(options: ConvertOptions) -> Result<()> {
    let registry = FormatRegistry::default();
    let target = resolve_format(&registry, &options.format_name, &options.format_version)?;

    let mut file = std::fs::File::open(&options.input)
        .map_err(|e| SbomForgeError::io(&options.input, e))?;
    let (sbom, detected) = registry.decode(&mut file)?;
    tracing::info!(
        "decoded {} document with {} packages",
        detected.id(),
        sbom.artifacts.packages.len()
    );

    let bytes = registry.encode(&sbom, target)?;
    write_output(options.output_file.as_deref(), &bytes)
}

/// Print the format registry: ids, accepted versions, aliases, capabilities.
pub fn run_formats() -> Result<()> {
    let registry = FormatRegistry::default();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{:<16} {:<10} {:<10} ALIASES", "ID", "VERSION", "CODEC")?;
    for format in registry.formats() {
        let codec = match (format.supports_encoding(), format.supports_decoding()) {
            (true, true) => "enc+dec",
            (true, false) => "enc",
            (false, true) => "dec",
            (false, false) => "-",
        };
        writeln!(
            out,
            "{:<16} {:<10} {:<10} {}",
            format.id(),
            format.version(),
            codec,
            format.aliases().join(", ")
        )?;
    }
    Ok(())
}

fn resolve_format<'a>(
    registry: &'a FormatRegistry,
    name: &str,
    version: &str,
) -> Result<&'a Format> {
    let Some(format) = registry.by_name(name) else {
        return Err(SbomForgeError::config(format!(
            "unknown format {name:?} (available: {})",
            registry.ids().join(", ")
        )));
    };
    registry.by_name_and_version(name, version).ok_or_else(|| {
        SbomForgeError::format(
            "resolving output format",
            FormatErrorKind::UnsupportedVersion {
                id: format.id().to_string(),
                requested: version.to_string(),
                supported: format.version().to_string(),
            },
        )
    })
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes).map_err(|e| SbomForgeError::io(path, e))?;
            tracing::info!("report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(bytes)?;
        }
    }
    Ok(())
}
