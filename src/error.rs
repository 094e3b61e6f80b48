//! Unified error types for sbom-forge.
//!
//! This module provides the error hierarchy for the library, with rich
//! context for debugging and user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sbom-forge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomForgeError {
    /// Errors during cataloging
    #[error("Cataloging failed: {context}")]
    Catalog {
        context: String,
        #[source]
        source: CatalogErrorKind,
    },

    /// Errors during SBOM document encoding/decoding/validation
    #[error("Format operation failed: {context}")]
    Format {
        context: String,
        #[source]
        source: FormatErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The run was interrupted before completing
    #[error("Operation cancelled")]
    Cancelled,
}

/// Specific cataloging error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CatalogErrorKind {
    #[error("Resolver query failed: {0}")]
    Resolver(String),

    #[error("Parser failed at {location}: {message}")]
    Parser { location: String, message: String },

    #[error("{0}")]
    Joined(JoinedErrors),

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },
}

/// Specific format error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormatErrorKind {
    #[error("Content does not match any registered format")]
    Unidentified,

    #[error("Format '{id}' does not support version {requested} (supported: {supported})")]
    UnsupportedVersion {
        id: String,
        requested: String,
        supported: String,
    },

    #[error("Format '{0}' has no encoder")]
    MissingEncoder(&'static str),

    #[error("Format '{0}' has no decoder")]
    MissingDecoder(&'static str),

    #[error("Format '{0}' has no validator")]
    MissingValidator(&'static str),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validate(String),
}

/// A collection of errors accumulated across the locations of one cataloger.
///
/// One failing parser never aborts its siblings, so each failure is kept and
/// joined into a single error reported when the cataloger finishes.
#[derive(Debug, Default)]
pub struct JoinedErrors(Vec<String>);

impl JoinedErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parser error(s): {}", self.0.len(), self.0.join("; "))
    }
}

impl std::error::Error for JoinedErrors {}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for sbom-forge operations
pub type Result<T> = std::result::Result<T, SbomForgeError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SbomForgeError {
    /// Create a catalog error with context
    pub fn catalog(context: impl Into<String>, source: CatalogErrorKind) -> Self {
        Self::Catalog {
            context: context.into(),
            source,
        }
    }

    /// Create a format error with context
    pub fn format(context: impl Into<String>, source: FormatErrorKind) -> Self {
        Self::Format {
            context: context.into(),
            source,
        }
    }

    /// Create a decode error for malformed document content
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::format(context, FormatErrorKind::Decode(message.into()))
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SbomForgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SbomForgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::format(
            "JSON deserialization",
            FormatErrorKind::Decode(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is prepended to the error's existing context, creating
/// a chain that shows the path through the code.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    ///
    /// The closure is only called if the result is an error, which is more
    /// efficient when the context string is expensive to compute.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<SbomForgeError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: SbomForgeError, new_ctx: &str) -> SbomForgeError {
    match err {
        SbomForgeError::Catalog {
            context: existing,
            source,
        } => SbomForgeError::Catalog {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomForgeError::Format {
            context: existing,
            source,
        } => SbomForgeError::Format {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomForgeError::Io {
            path,
            message,
            source,
        } => SbomForgeError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        SbomForgeError::Config(msg) => SbomForgeError::Config(chain_context(new_ctx, &msg)),
        SbomForgeError::Cancelled => SbomForgeError::Cancelled,
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
