//! Typed errors for funcopgen.
//!
//! Provides structured error types instead of anyhow for better
//! library ergonomics and pattern matching.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for funcopgen operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Error while loading the Go package.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Error while generating options for a type.
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Error while persisting generated output.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Error building a configuration.
    #[error("Config error: {0}")]
    Builder(#[from] BuilderError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error while loading and parsing the Go package.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Failed to read the package directory or one of its files.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory holds no Go source files.
    #[error("No Go files in {0}")]
    NoGoFiles(PathBuf),

    /// Files in the directory declare different packages.
    #[error("Expected only one package in {dir}, found {found:?}")]
    MultiplePackages { dir: PathBuf, found: Vec<String> },

    /// Syntax error in a Go source file.
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
}

/// Error while generating functional options for a single type.
///
/// Any of these aborts the type; no partial file is written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    /// Requested type is not a struct declared in the package.
    #[error(
        "Unknown type {name:?} in package {package:?} ({dir:?}); declared structs: [{}]",
        .declared.join(", ")
    )]
    UnknownType {
        name: String,
        package: String,
        dir: PathBuf,
        declared: Vec<String>,
    },

    /// Field type expression has a shape the generator does not handle.
    #[error("Field {field:?}: unhandled type expression {shape}")]
    UnsupportedExpression { field: String, shape: String },

    /// Field tag does not follow the `key:"value"` syntax.
    #[error("Field {field:?}: malformed tag `{tag}`: {reason}")]
    MalformedTag {
        field: String,
        tag: String,
        reason: String,
    },

    /// Two fields resolve to the same option function name.
    #[error("Option name {name:?} is produced by both {first} and {second}")]
    NamingCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// Error while persisting generated output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    /// IO error on a specific path.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the temporary file into place.
    #[error("Failed to persist {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    /// Generated files differ from what is on disk (check mode).
    #[error("Generated files are out of date: {}", .files.join(", "))]
    Stale { files: Vec<String> },
}

/// Error building a configuration value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// A required builder field was never set.
    #[error("{builder}: missing required field `{field}`")]
    MissingRequiredField {
        builder: &'static str,
        field: &'static str,
    },

    /// A field was set to a value the configuration cannot use.
    #[error("{builder}: invalid value for `{field}`: {reason}")]
    InvalidField {
        builder: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Result type alias using funcopgen's Error.
pub type Result<T> = std::result::Result<T, Error>;
