//! funcopgen: functional options generator for Go struct types.
//!
//! Reads the struct declarations of a Go package directory and writes, for
//! each requested type, a Go file with:
//!
//! - an option type `type Option func(*T)`,
//! - optionally a `NewT(opts ...Option) *T` constructor applying the
//!   `default:"..."` tags of its fields,
//! - one `func <Prefix><Field>(x <type>) Option` per field.
//!
//! The pipeline per type is: [`syntax`] loads the package, [`catalog`]
//! resolves each field's [`signature`] and [`tags`], [`naming`] picks the
//! function names, [`imports`] selects the imports the output needs, and
//! [`synth`] renders the file. [`Generator`] drives it for a batch of types
//! and hands the text to an [`OutputSink`].
//!
//! # Quick Start
//!
//! ```no_run
//! use funcopgen::{generate, FsSink, GeneratorConfig};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::builder()
//!     .type_names(vec!["Animal".to_string()])
//!     .prefix("With")
//!     .factory(true)
//!     .build()?;
//! let dir = Path::new("./animal");
//! generate(dir, config, &mut FsSink::new(dir))?;
//! # Ok::<(), funcopgen::Error>(())
//! ```

mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod imports;
pub mod naming;
pub mod output;
pub mod signature;
pub mod synth;
pub mod syntax;
pub mod tags;

// Re-export core types for convenience
pub use config::GeneratorConfig;
pub use error::{BuilderError, Error, GenerateError, LoadError, Result, WriteError};
pub use generator::Generator;
pub use output::{CheckSink, FsSink, MemorySink, OutputSink};
pub use synth::GeneratedFile;

use std::path::Path;

/// Load the package in `dir` and generate every configured type into `sink`.
///
/// Returns the generated file names in processing order.
pub fn generate(
    dir: &Path,
    config: GeneratorConfig,
    sink: &mut dyn OutputSink,
) -> Result<Vec<String>> {
    let package = syntax::load_package(dir)?;
    Generator::new(config).run(&package, sink)
}
