//! The generic glob/MIME-dispatch cataloger.
//!
//! A concrete cataloger is just a name plus (parser, selector) pairs: the
//! selector picks locations out of the resolver, the parser turns each
//! location's content into packages and relationships. All ecosystem
//! knowledge lives in the parsers; this engine only dispatches.

use super::resolver::{FileResolver, LocationReader};
use super::CancelToken;
use crate::error::{CatalogErrorKind, JoinedErrors, Result, SbomForgeError};
use crate::model::{LinuxRelease, Location, Package, Relationship};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shared context handed to every parser invocation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub linux_release: Option<LinuxRelease>,
}

/// What one parser invocation produced.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub packages: Vec<Package>,
    pub relationships: Vec<Relationship>,
}

impl Parsed {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn packages(packages: Vec<Package>) -> Self {
        Self {
            packages,
            relationships: Vec::new(),
        }
    }
}

/// A parser plugin.
///
/// Pure function contract: deterministic for identical inputs, no hidden
/// state, safe to call concurrently with other catalogers sharing the same
/// resolver. Plain functions with the matching signature implement this
/// automatically.
pub trait Parser: Send + Sync {
    fn parse(
        &self,
        resolver: &dyn FileResolver,
        environment: Option<&Environment>,
        reader: LocationReader,
    ) -> Result<Parsed>;
}

impl<F> Parser for F
where
    F: Fn(&dyn FileResolver, Option<&Environment>, LocationReader) -> Result<Parsed>
        + Send
        + Sync,
{
    fn parse(
        &self,
        resolver: &dyn FileResolver,
        environment: Option<&Environment>,
        reader: LocationReader,
    ) -> Result<Parsed> {
        self(resolver, environment, reader)
    }
}

/// How a parser's candidate locations are selected.
#[derive(Debug, Clone)]
enum Selector {
    Globs(Vec<String>),
    MimeTypes(Vec<String>),
}

struct ParserEntry {
    parser: Arc<dyn Parser>,
    selector: Selector,
}

/// What a cataloger run produced.
///
/// Packages and relationships from successful locations are returned even
/// when some locations failed; the joined error reports every failure.
#[derive(Default)]
pub struct CatalogResult {
    pub packages: Vec<Package>,
    pub relationships: Vec<Relationship>,
    pub error: Option<SbomForgeError>,
}

/// A unit that discovers packages of one ecosystem given a content resolver.
pub trait Cataloger: Send + Sync {
    fn name(&self) -> &str;

    fn catalog(
        &self,
        resolver: &dyn FileResolver,
        environment: Option<&Environment>,
        cancel: &CancelToken,
    ) -> CatalogResult;
}

/// The standard [`Cataloger`] implementation, configured from parser/selector
/// pairs.
pub struct GenericCataloger {
    name: String,
    entries: Vec<ParserEntry>,
}

impl GenericCataloger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Bind a parser to a set of glob patterns.
    pub fn with_parser_by_globs<P>(mut self, parser: P, globs: &[&str]) -> Self
    where
        P: Parser + 'static,
    {
        self.entries.push(ParserEntry {
            parser: Arc::new(parser),
            selector: Selector::Globs(globs.iter().map(|s| s.to_string()).collect()),
        });
        self
    }

    /// Bind a parser to a set of MIME types.
    pub fn with_parser_by_mime_types<P>(mut self, parser: P, types: &[&str]) -> Self
    where
        P: Parser + 'static,
    {
        self.entries.push(ParserEntry {
            parser: Arc::new(parser),
            selector: Selector::MimeTypes(types.iter().map(|s| s.to_string()).collect()),
        });
        self
    }

    fn select_locations(
        &self,
        resolver: &dyn FileResolver,
        selector: &Selector,
    ) -> Result<BTreeSet<Location>> {
        let locations = match selector {
            Selector::Globs(globs) => {
                let patterns: Vec<&str> = globs.iter().map(String::as_str).collect();
                resolver.files_by_glob(&patterns)?
            }
            Selector::MimeTypes(types) => {
                let types: Vec<&str> = types.iter().map(String::as_str).collect();
                resolver.files_by_mime_type(&types)?
            }
        };
        // The set both deduplicates (a location matched by two patterns is
        // parsed once) and fixes processing order.
        Ok(locations.into_iter().collect())
    }
}

impl Cataloger for GenericCataloger {
    fn name(&self) -> &str {
        &self.name
    }

    fn catalog(
        &self,
        resolver: &dyn FileResolver,
        environment: Option<&Environment>,
        cancel: &CancelToken,
    ) -> CatalogResult {
        let mut result = CatalogResult::default();
        let mut failures = JoinedErrors::new();
        let mut cancelled = false;

        'entries: for entry in &self.entries {
            let locations = match self.select_locations(resolver, &entry.selector) {
                Ok(locations) => locations,
                Err(err) => {
                    failures.push(format!("{}: selector query failed: {err}", self.name));
                    continue;
                }
            };

            for location in locations {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break 'entries;
                }

                let reader = match resolver.open(&location) {
                    Ok(reader) => reader,
                    Err(err) => {
                        failures.push(format!("{location}: {err}"));
                        continue;
                    }
                };

                match entry.parser.parse(resolver, environment, reader) {
                    Ok(parsed) => {
                        result.packages.extend(parsed.packages);
                        result.relationships.extend(parsed.relationships);
                    }
                    Err(err) => {
                        tracing::warn!(
                            cataloger = %self.name,
                            location = %location,
                            "parser failed: {err}"
                        );
                        failures.push(format!("{location}: {err}"));
                    }
                }
            }
        }

        if cancelled {
            result.error = Some(SbomForgeError::Cancelled);
        } else if !failures.is_empty() {
            result.error = Some(SbomForgeError::catalog(
                format!("cataloger {}", self.name),
                CatalogErrorKind::Joined(failures),
            ));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolver::MemoryResolver;
    use crate::model::{Language, PackageType};

    fn stub_parser(
        _resolver: &dyn FileResolver,
        _environment: Option<&Environment>,
        mut reader: LocationReader,
    ) -> Result<Parsed> {
        let content = reader.read_string()?;
        let location = reader.location.clone();
        let packages = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| Package {
                name: line.trim().to_string(),
                version: "1.0.0".to_string(),
                found_by: "stub-cataloger".to_string(),
                locations: vec![location.clone()].into(),
                package_type: PackageType::Npm,
                language: Language::JavaScript,
                ..Default::default()
            })
            .collect();
        Ok(Parsed::packages(packages))
    }

    fn failing_parser(
        _resolver: &dyn FileResolver,
        _environment: Option<&Environment>,
        reader: LocationReader,
    ) -> Result<Parsed> {
        Err(SbomForgeError::catalog(
            "stub failure",
            CatalogErrorKind::Parser {
                location: reader.location.to_string(),
                message: "unreadable".to_string(),
            },
        ))
    }

    #[test]
    fn test_zero_matches_is_empty_and_error_free() {
        let resolver = MemoryResolver::new().with_file("README.md", "docs");
        let cataloger =
            GenericCataloger::new("stub-cataloger").with_parser_by_globs(stub_parser, &["**/deps.list"]);

        let result = cataloger.catalog(&resolver, None, &CancelToken::new());
        assert!(result.packages.is_empty());
        assert!(result.relationships.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_matched_locations_are_parsed() {
        let resolver = MemoryResolver::new()
            .with_file("a/deps.list", "left\npad")
            .with_file("b/deps.list", "lodash");
        let cataloger =
            GenericCataloger::new("stub-cataloger").with_parser_by_globs(stub_parser, &["**/deps.list"]);

        let result = cataloger.catalog(&resolver, None, &CancelToken::new());
        assert!(result.error.is_none());
        assert_eq!(result.packages.len(), 3);
    }

    #[test]
    fn test_overlapping_patterns_parse_each_location_once() {
        let resolver = MemoryResolver::new().with_file("deps.list", "one");
        let cataloger = GenericCataloger::new("stub-cataloger")
            .with_parser_by_globs(stub_parser, &["**/deps.list", "deps.list"]);

        let result = cataloger.catalog(&resolver, None, &CancelToken::new());
        assert_eq!(result.packages.len(), 1);
    }

    #[test]
    fn test_parser_failure_does_not_abort_siblings() {
        let resolver = MemoryResolver::new()
            .with_file("bad/deps.list", "ignored")
            .with_file("good/other.list", "kept");
        let cataloger = GenericCataloger::new("stub-cataloger")
            .with_parser_by_globs(failing_parser, &["bad/*"])
            .with_parser_by_globs(stub_parser, &["good/*"]);

        let result = cataloger.catalog(&resolver, None, &CancelToken::new());
        assert_eq!(result.packages.len(), 1, "sibling parser still ran");
        let error = result.error.expect("joined error expected");
        assert!(error.to_string().contains("stub-cataloger"));
    }

    #[test]
    fn test_mime_type_dispatch() {
        let mut resolver = MemoryResolver::new();
        resolver.add_file_with_mime("bin/app", "app", "application/x-executable");
        resolver.add_file("src/app.txt", "src");

        let cataloger = GenericCataloger::new("stub-cataloger")
            .with_parser_by_mime_types(stub_parser, &["application/x-executable"]);

        let result = cataloger.catalog(&resolver, None, &CancelToken::new());
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.packages[0].name, "app");
    }

    #[test]
    fn test_cancellation_stops_processing() {
        let resolver = MemoryResolver::new()
            .with_file("a/deps.list", "one")
            .with_file("b/deps.list", "two");
        let cataloger =
            GenericCataloger::new("stub-cataloger").with_parser_by_globs(stub_parser, &["**/deps.list"]);

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = cataloger.catalog(&resolver, None, &cancel);
        assert!(result.packages.is_empty());
        assert!(matches!(result.error, Some(SbomForgeError::Cancelled)));
    }
}
