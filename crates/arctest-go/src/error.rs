//! Extraction errors.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while turning Go sources into packages.
///
/// Any of these aborts the directory being loaded; nothing from a failed
/// run is registered in the architecture.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A file or directory could not be read.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A source file did not parse cleanly.
    #[error("Parse error{} at {line}:{column}", in_file(.path))]
    Parse {
        /// Source file (empty until attached by the loader).
        path: PathBuf,
        /// Line of the first error node (1-indexed).
        line: usize,
        /// Column of the first error node (1-indexed).
        column: usize,
    },

    /// A requested package root does not exist.
    #[error("package directory not found: {0}")]
    NotFound(PathBuf),

    /// The grammar could not be loaded into the parser.
    #[error("failed to load Go grammar: {0}")]
    Language(String),

    /// An exclude glob did not compile.
    #[error("Invalid exclude pattern: {0}")]
    Exclude(#[from] glob::PatternError),
}

impl ExtractionError {
    /// Attaches a file path to a [`Parse`](Self::Parse) error.
    #[must_use]
    pub fn at(self, file: &Path) -> Self {
        match self {
            Self::Parse { line, column, .. } => Self::Parse {
                path: file.to_path_buf(),
                line,
                column,
            },
            other => other,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn in_file(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" in {}", path.display())
    }
}

impl From<walkdir::Error> for ExtractionError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        Self::Io { path, source }
    }
}
