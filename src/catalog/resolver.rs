//! Content source access.
//!
//! Catalogers never touch a storage backend directly; they query a
//! [`FileResolver`] for locations and open them for reading. The trait is
//! the whole contract — a resolver may be backed by a directory, an image
//! layer set, or an in-memory fixture, and it must be safe for concurrent
//! use by multiple cataloger tasks.

use crate::error::{CatalogErrorKind, Result, SbomForgeError};
use crate::model::{FileDigest, FileKind, FileMetadata, Location};
use crate::utils::{glob, hash::bytes_to_hex};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read access to one location's content.
pub struct LocationReader {
    pub location: Location,
    reader: Box<dyn Read + Send>,
}

impl LocationReader {
    pub fn new(location: Location, reader: Box<dyn Read + Send>) -> Self {
        Self { location, reader }
    }

    /// Read the full content as a UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let mut content = String::new();
        self.reader
            .read_to_string(&mut content)
            .map_err(|e| SbomForgeError::io(self.location.real_path(), e))?;
        Ok(content)
    }

    /// Read the full content as bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.reader
            .read_to_end(&mut content)
            .map_err(|e| SbomForgeError::io(self.location.real_path(), e))?;
        Ok(content)
    }
}

impl Read for LocationReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Glob- and MIME-queryable read access over a content source.
///
/// Implementations are read-only and shareable across threads.
pub trait FileResolver: Send + Sync {
    /// Locations whose path matches any of the given glob patterns.
    fn files_by_glob(&self, patterns: &[&str]) -> Result<Vec<Location>>;

    /// Locations whose detected MIME type is any of the given types.
    fn files_by_mime_type(&self, types: &[&str]) -> Result<Vec<Location>>;

    /// Open a location for reading.
    fn open(&self, location: &Location) -> Result<LocationReader>;

    /// Observed filesystem metadata for a location.
    ///
    /// The default derives what it can from content alone; backends with a
    /// real filesystem override this with stat-level data.
    fn file_metadata(&self, location: &Location) -> Result<FileMetadata> {
        let mut reader = self.open(location)?;
        let content = reader.read_bytes()?;
        Ok(FileMetadata {
            kind: FileKind::Regular,
            mode: 0,
            size: content.len() as u64,
            link_destination: None,
            mime_type: String::new(),
        })
    }

    /// Content digests for a location, one per requested algorithm.
    ///
    /// Only `sha256` is currently computed; other names are skipped.
    fn file_digests(&self, location: &Location, algorithms: &[&str]) -> Result<Vec<FileDigest>> {
        let mut reader = self.open(location)?;
        let content = reader.read_bytes()?;
        Ok(digest_bytes(&content, algorithms))
    }
}

fn digest_bytes(content: &[u8], algorithms: &[&str]) -> Vec<FileDigest> {
    let mut digests = Vec::new();
    for algorithm in algorithms {
        if *algorithm == "sha256" {
            let mut hasher = Sha256::new();
            hasher.update(content);
            digests.push(FileDigest {
                algorithm: "sha256".to_string(),
                value: bytes_to_hex(&hasher.finalize()),
            });
        } else {
            tracing::warn!("unsupported digest algorithm {algorithm:?}, skipping");
        }
    }
    digests
}

// ============================================================================
// Directory-backed resolver
// ============================================================================

#[derive(Debug)]
struct IndexedEntry {
    location: Location,
    absolute: PathBuf,
    mime_type: String,
}

/// A resolver over a directory tree.
///
/// The tree is walked and indexed once at construction; queries run against
/// the index and never touch the filesystem again until a location is
/// opened.
pub struct DirectoryResolver {
    root: PathBuf,
    entries: Vec<IndexedEntry>,
}

impl DirectoryResolver {
    /// Index a directory tree, skipping paths matched by the exclusion
    /// globs.
    pub fn new(root: impl Into<PathBuf>, exclusions: &[String]) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SbomForgeError::catalog(
                "indexing content source",
                CatalogErrorKind::Resolver(format!("{} is not a directory", root.display())),
            ));
        }

        let mut entries = Vec::new();
        let walker = ignore::WalkBuilder::new(&root)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let relative = match entry.path().strip_prefix(&root) {
                Ok(relative) => normalize_path(relative),
                Err(_) => continue,
            };
            if exclusions.iter().any(|p| glob::matches(p, &relative)) {
                continue;
            }
            let mime_type = guess_mime_type(entry.path(), &relative);
            entries.push(IndexedEntry {
                location: Location::new(relative),
                absolute: entry.path().to_path_buf(),
                mime_type,
            });
        }

        entries.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_for(&self, location: &Location) -> Option<&IndexedEntry> {
        self.entries
            .iter()
            .find(|e| e.location.coordinates == location.coordinates)
    }
}

impl FileResolver for DirectoryResolver {
    fn files_by_glob(&self, patterns: &[&str]) -> Result<Vec<Location>> {
        let mut matched = Vec::new();
        for entry in &self.entries {
            if patterns
                .iter()
                .any(|p| glob::matches(p, entry.location.real_path()))
            {
                matched.push(entry.location.clone());
            }
        }
        Ok(matched)
    }

    fn files_by_mime_type(&self, types: &[&str]) -> Result<Vec<Location>> {
        let mut matched = Vec::new();
        for entry in &self.entries {
            if types.iter().any(|t| *t == entry.mime_type) {
                matched.push(entry.location.clone());
            }
        }
        Ok(matched)
    }

    fn open(&self, location: &Location) -> Result<LocationReader> {
        let entry = self.entry_for(location).ok_or_else(|| {
            SbomForgeError::catalog(
                "opening location",
                CatalogErrorKind::Resolver(format!("unindexed location {location}")),
            )
        })?;
        let file = std::fs::File::open(&entry.absolute)
            .map_err(|e| SbomForgeError::io(&entry.absolute, e))?;
        Ok(LocationReader::new(location.clone(), Box::new(file)))
    }

    fn file_metadata(&self, location: &Location) -> Result<FileMetadata> {
        let entry = self.entry_for(location).ok_or_else(|| {
            SbomForgeError::catalog(
                "reading file metadata",
                CatalogErrorKind::Resolver(format!("unindexed location {location}")),
            )
        })?;
        let meta = std::fs::symlink_metadata(&entry.absolute)
            .map_err(|e| SbomForgeError::io(&entry.absolute, e))?;

        let kind = if meta.file_type().is_symlink() {
            FileKind::SymbolicLink
        } else if meta.is_dir() {
            FileKind::Directory
        } else if meta.is_file() {
            FileKind::Regular
        } else {
            FileKind::Irregular
        };

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode() & 0o7777
        };
        #[cfg(not(unix))]
        let mode = 0;

        let link_destination = if meta.file_type().is_symlink() {
            std::fs::read_link(&entry.absolute)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        } else {
            None
        };

        Ok(FileMetadata {
            kind,
            mode,
            size: meta.len(),
            link_destination,
            mime_type: entry.mime_type.clone(),
        })
    }
}

fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Best-effort MIME detection: extension table first, then a short content
/// sniff for executables and binary blobs.
fn guess_mime_type(absolute: &Path, relative: &str) -> String {
    let by_extension = match Path::new(relative)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
    {
        "json" => Some("application/json"),
        "xml" => Some("text/xml"),
        "toml" | "lock" | "txt" | "cfg" | "ini" | "md" => Some("text/plain"),
        "yaml" | "yml" => Some("application/yaml"),
        "gz" | "tgz" => Some("application/gzip"),
        "zip" | "jar" | "war" | "ear" => Some("application/zip"),
        _ => None,
    };
    if let Some(mime) = by_extension {
        return mime.to_string();
    }

    let mut prefix = [0u8; 512];
    let read = std::fs::File::open(absolute)
        .and_then(|mut f| f.read(&mut prefix))
        .unwrap_or(0);
    let prefix = &prefix[..read];

    if prefix.starts_with(&[0x7f, b'E', b'L', b'F']) {
        "application/x-executable".to_string()
    } else if prefix.starts_with(b"#!") {
        "text/x-shellscript".to_string()
    } else if prefix.contains(&0) {
        "application/octet-stream".to_string()
    } else {
        "text/plain".to_string()
    }
}

// ============================================================================
// In-memory resolver
// ============================================================================

/// A resolver over an in-memory file table.
///
/// Used by unit and integration tests to exercise catalogers without a real
/// filesystem; kept public because parser plugins are expected to test
/// against it as well.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: BTreeMap<Location, (String, Vec<u8>)>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.add_file_with_mime(path, content, "text/plain");
    }

    pub fn add_file_with_mime(&mut self, path: &str, content: impl Into<Vec<u8>>, mime: &str) {
        self.files
            .insert(Location::new(path), (mime.to_string(), content.into()));
    }
}

impl FileResolver for MemoryResolver {
    fn files_by_glob(&self, patterns: &[&str]) -> Result<Vec<Location>> {
        Ok(self
            .files
            .keys()
            .filter(|l| patterns.iter().any(|p| glob::matches(p, l.real_path())))
            .cloned()
            .collect())
    }

    fn files_by_mime_type(&self, types: &[&str]) -> Result<Vec<Location>> {
        Ok(self
            .files
            .iter()
            .filter(|(_, (mime, _))| types.iter().any(|t| t == mime))
            .map(|(l, _)| l.clone())
            .collect())
    }

    fn open(&self, location: &Location) -> Result<LocationReader> {
        let (_, content) = self.files.get(location).ok_or_else(|| {
            SbomForgeError::catalog(
                "opening location",
                CatalogErrorKind::Resolver(format!("no such file {location}")),
            )
        })?;
        Ok(LocationReader::new(
            location.clone(),
            Box::new(std::io::Cursor::new(content.clone())),
        ))
    }
}

/// Every location known to a resolver.
pub fn all_locations(resolver: &dyn FileResolver) -> Result<Vec<Location>> {
    resolver.files_by_glob(&["**"])
}
