//! Directory discovery and package assembly.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use arctest_core::{Architecture, Package};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::ExtractionError;
use crate::extractor::{FileAnalysis, LanguageExtractor};
use crate::go::GoExtractor;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

/// Walks a project tree and builds one [`Package`] per source directory.
pub struct PackageLoader {
    root: PathBuf,
    extractor: Box<dyn LanguageExtractor>,
    exclude_patterns: Vec<glob::Pattern>,
}

impl PackageLoader {
    /// Creates a Go loader for the project at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extractor: Box::new(GoExtractor::new()),
            exclude_patterns: Vec::new(),
        }
    }

    /// Replaces the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn LanguageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Adds an exclude glob, matched against `/`-separated paths relative
    /// to the root (e.g. `gen/**`).
    ///
    /// A trailing `/**` also excludes the directory itself, so the walk
    /// never enters it.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob is invalid.
    pub fn exclude(mut self, pattern: &str) -> Result<Self, ExtractionError> {
        self.exclude_patterns.push(glob::Pattern::new(pattern)?);
        if let Some(dir) = pattern.strip_suffix("/**").filter(|d| !d.is_empty()) {
            self.exclude_patterns.push(glob::Pattern::new(dir)?);
        }
        Ok(self)
    }

    /// Adds multiple exclude globs.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob is invalid.
    pub fn excludes<I, S>(mut self, patterns: I) -> Result<Self, ExtractionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self = self.exclude(pattern.as_ref())?;
        }
        Ok(self)
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every package under `start` (a path relative to the root, or
    /// `.` for the whole tree), in path order.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is missing, a directory or file cannot
    /// be read, or a file fails to parse.
    pub fn load(&self, start: impl AsRef<Path>) -> Result<Vec<Package>, ExtractionError> {
        let start = self.root.join(start.as_ref());
        if !start.is_dir() {
            return Err(ExtractionError::NotFound(start));
        }

        let mut packages = Vec::new();
        let walker = WalkDir::new(&start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped_dir(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(package) = self.load_dir(entry.path())? {
                packages.push(package);
            }
        }

        Ok(packages)
    }

    /// Loads the single package in `dir`, or `None` if it holds no
    /// analyzable files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or one of its files cannot be read
    /// or parsed.
    pub fn load_dir(&self, dir: &Path) -> Result<Option<Package>, ExtractionError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| ExtractionError::io(dir, e))? {
            let entry = entry.map_err(|e| ExtractionError::io(dir, e))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if path.is_file() && self.extractor.accepts(&name) {
                files.push(path);
            } else if path.is_file() && name.ends_with(".go") {
                debug!(file = %path.display(), "skipping test file");
            }
        }
        if files.is_empty() {
            return Ok(None);
        }
        files.sort();

        let mut analyses = Vec::with_capacity(files.len());
        for file in &files {
            let source =
                std::fs::read_to_string(file).map_err(|e| ExtractionError::io(file, e))?;
            let analysis = self.extractor.analyze(&source).map_err(|e| e.at(file))?;
            analyses.push(analysis);
        }

        let path = self.relative_path(dir);
        let package = assemble(&path, dir, analyses);
        debug!(
            package = package.name(),
            path = %path,
            imports = package.imports().len(),
            structs = package.structs().len(),
            interfaces = package.interfaces().len(),
            "discovered package"
        );
        Ok(Some(package))
    }

    /// `/`-separated path of `dir` relative to the root; `.` for the root.
    fn relative_path(&self, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            ".".to_string()
        } else {
            parts.join("/")
        }
    }

    fn is_skipped_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&name.as_ref())
        {
            debug!(dir = %entry.path().display(), "skipping directory");
            return true;
        }

        let relative = self.relative_path(entry.path());
        if self.exclude_patterns.iter().any(|p| p.matches(&relative)) {
            debug!(dir = %relative, "excluded by pattern");
            return true;
        }
        false
    }
}

/// Merges per-file analyses into one package.
///
/// Types are registered before any method is attached, so a method may
/// precede its struct in file order or live in another file.
fn assemble(path: &str, dir: &Path, analyses: Vec<FileAnalysis>) -> Package {
    let name = analyses
        .iter()
        .find_map(|a| a.package_name.clone())
        .unwrap_or_else(|| {
            dir.file_name()
                .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned())
        });

    let mut package = Package::new(name, path);
    let mut pending = Vec::new();

    for analysis in analyses {
        for import in analysis.imports {
            package.add_import(import.path, import.alias.as_deref());
        }
        for s in analysis.structs {
            package.add_struct(s);
        }
        for i in analysis.interfaces {
            package.add_interface(i);
        }
        pending.extend(analysis.methods);
    }

    for decl in pending {
        if !package.attach_method(&decl.receiver, decl.method) {
            debug!(
                receiver = %decl.receiver,
                line = decl.line,
                "receiver is not a struct of this package"
            );
        }
    }

    package
}

/// Populates an [`Architecture`] from Go sources under its root.
pub trait ParsePackages {
    /// Parses the given roots (relative to the architecture root), each
    /// recursively. Returns the number of packages registered.
    ///
    /// All roots are loaded before anything is registered, so a failure
    /// leaves the architecture unchanged.
    ///
    /// # Errors
    ///
    /// See [`PackageLoader::load`].
    fn parse_packages<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, ExtractionError>;

    /// Parses the whole tree under the architecture root.
    ///
    /// # Errors
    ///
    /// See [`PackageLoader::load`].
    fn parse_all(&mut self) -> Result<usize, ExtractionError>;

    /// Like [`parse_all`](Self::parse_all) with a custom loader, e.g. one
    /// carrying exclude patterns.
    ///
    /// # Errors
    ///
    /// See [`PackageLoader::load`].
    fn parse_with(&mut self, loader: &PackageLoader) -> Result<usize, ExtractionError>;
}

impl ParsePackages for Architecture {
    fn parse_packages<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, ExtractionError> {
        let loader = PackageLoader::new(self.root());
        let mut loaded: BTreeMap<String, Package> = BTreeMap::new();
        for path in paths {
            for package in loader.load(path)? {
                loaded.insert(package.path().to_string(), package);
            }
        }
        Ok(register(self, loaded.into_values()))
    }

    fn parse_all(&mut self) -> Result<usize, ExtractionError> {
        self.parse_packages(&["."])
    }

    fn parse_with(&mut self, loader: &PackageLoader) -> Result<usize, ExtractionError> {
        let packages = loader.load(".")?;
        Ok(register(self, packages))
    }
}

fn register(arch: &mut Architecture, packages: impl IntoIterator<Item = Package>) -> usize {
    let mut count = 0;
    for package in packages {
        if let Some(previous) = arch.insert_package(package) {
            warn!(path = previous.path(), "package replaced");
        }
        count += 1;
    }
    info!(packages = count, root = %arch.root().display(), "parsed packages");
    count
}
