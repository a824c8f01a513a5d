//! Language-agnostic extraction types and trait.
//!
//! `LanguageExtractor` is the extension point for source languages. An
//! extractor turns the text of one file into a [`FileAnalysis`]; the
//! [`PackageLoader`](crate::PackageLoader) merges the analyses of one
//! directory into a single package.

use arctest_core::{Interface, Method, Struct};

use crate::error::ExtractionError;

/// A single import extracted from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Line number (1-indexed).
    pub line: usize,
    /// Import path without quotes (e.g. `github.com/acme/app/domain`).
    pub path: String,
    /// Explicit import name (`dom "…/domain"`, `_`, `.`), if any.
    pub alias: Option<String>,
}

/// A method declaration with its receiver type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Line number (1-indexed).
    pub line: usize,
    /// Receiver base type name, pointer and type arguments removed.
    pub receiver: String,
    /// The extracted signature.
    pub method: Method,
}

/// Result of analyzing a single source file.
#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    /// Name from the package clause, if present.
    pub package_name: Option<String>,
    /// Imports in source order.
    pub imports: Vec<ImportInfo>,
    /// Struct declarations, without methods.
    pub structs: Vec<Struct>,
    /// Interface declarations.
    pub interfaces: Vec<Interface>,
    /// Methods bound to a receiver, in source order.
    pub methods: Vec<MethodDecl>,
}

/// Trait for language-specific Tree-sitter extraction.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g. `"go"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g. `&[".go"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Whether a file name should be analyzed.
    fn accepts(&self, file_name: &str) -> bool {
        self.extensions().iter().any(|ext| file_name.ends_with(ext))
    }

    /// Extracts package name, imports, and declarations from source code.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Parse`] when the source has syntax errors
    /// and [`ExtractionError::Language`] when the grammar cannot be loaded.
    fn analyze(&self, source: &str) -> Result<FileAnalysis, ExtractionError>;
}
