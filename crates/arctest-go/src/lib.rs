//! # arctest-go
//!
//! Tree-sitter based Go source extraction for arctest.
//!
//! Turns a directory tree of Go sources into the `arctest-core` model: one
//! [`Package`](arctest_core::Package) per directory, keyed by its
//! `/`-separated path relative to the project root (`.` for the root).
//!
//! - [`LanguageExtractor`] trait for per-file extraction
//! - [`GoExtractor`] for Go imports, structs, interfaces, and methods
//! - [`PackageLoader`] for directory discovery and package assembly
//! - [`ParsePackages`] to populate an [`Architecture`](arctest_core::Architecture)
//!
//! ```ignore
//! use arctest_core::Architecture;
//! use arctest_go::ParsePackages;
//!
//! let mut arch = Architecture::new("path/to/project");
//! arch.parse_all()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod extractor;
pub mod go;
pub mod loader;

pub use error::ExtractionError;
pub use extractor::{FileAnalysis, ImportInfo, LanguageExtractor, MethodDecl};
pub use go::GoExtractor;
pub use loader::{PackageLoader, ParsePackages};
