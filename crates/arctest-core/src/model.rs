//! The flat, queryable architecture model.
//!
//! An extractor builds [`Package`] values and registers them in an
//! [`Architecture`]. Once registered, packages are only reachable through
//! shared references, so the model is read-only for every rule engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name; empty for unnamed parameters.
    pub name: String,
    /// Type text as written (`T`, `pkg.T`, `*T`, `*pkg.T`), or empty when
    /// the shape is not recognized.
    pub type_text: String,
}

impl Parameter {
    /// Creates a new parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, type_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
        }
    }

    /// Type text with one leading pointer marker removed.
    #[must_use]
    pub fn normalized_type(&self) -> &str {
        self.type_text
            .strip_prefix('*')
            .unwrap_or(self.type_text.as_str())
    }
}

/// A method signature, bound to a struct or declared by an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Ordered parameter list.
    pub params: Vec<Parameter>,
    /// Whether the method declares any result.
    pub has_return: bool,
}

impl Method {
    /// Creates a new method.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<Parameter>, has_return: bool) -> Self {
        Self {
            name: name.into(),
            params,
            has_return,
        }
    }

    /// Approximate signature equivalence: same name, same parameter count,
    /// and both or neither returning a value.
    #[must_use]
    pub fn signature_matches(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self.has_return == other.has_return
    }
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Type text, same conventions as [`Parameter::type_text`].
    pub type_text: String,
}

impl Field {
    /// Creates a new field.
    #[must_use]
    pub fn new(name: impl Into<String>, type_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
        }
    }
}

/// A struct declaration with the methods bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    name: String,
    package_path: String,
    fields: Vec<Field>,
    methods: Vec<Method>,
}

impl Struct {
    /// Creates a struct not yet attached to a package.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            package_path: String::new(),
            fields,
            methods: Vec::new(),
        }
    }

    /// Struct name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the owning package.
    #[must_use]
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// `<package path>.<Name>`, used by layer-scoped struct patterns.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package_path, self.name)
    }

    /// Declared fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Bound methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Finds a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Attaches a method. Used by extractors before registration.
    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}

/// An interface declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    package_path: String,
    methods: Vec<Method>,
}

impl Interface {
    /// Creates an interface not yet attached to a package.
    #[must_use]
    pub fn new(name: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            name: name.into(),
            package_path: String::new(),
            methods,
        }
    }

    /// Interface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the owning package.
    #[must_use]
    pub fn package_path(&self) -> &str {
        &self.package_path
    }

    /// Declared method set.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// One package: a directory of source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    path: String,
    imports: Vec<String>,
    import_aliases: BTreeMap<String, String>,
    structs: BTreeMap<String, Struct>,
    interfaces: BTreeMap<String, Interface>,
}

impl Package {
    /// Creates an empty package.
    ///
    /// `path` is the package identity (relative directory path).
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            imports: Vec::new(),
            import_aliases: BTreeMap::new(),
            structs: BTreeMap::new(),
            interfaces: BTreeMap::new(),
        }
    }

    /// Declared package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package path (identity).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Import paths in file-encounter order, duplicates included.
    #[must_use]
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Alias to import path. Unaliased imports are keyed by their last
    /// path segment.
    #[must_use]
    pub fn import_aliases(&self) -> &BTreeMap<String, String> {
        &self.import_aliases
    }

    /// Structs keyed by name.
    #[must_use]
    pub fn structs(&self) -> &BTreeMap<String, Struct> {
        &self.structs
    }

    /// Interfaces keyed by name.
    #[must_use]
    pub fn interfaces(&self) -> &BTreeMap<String, Interface> {
        &self.interfaces
    }

    /// Records an import. `alias` is the explicit import name, if any.
    pub fn add_import(&mut self, import_path: impl Into<String>, alias: Option<&str>) {
        let import_path = import_path.into();
        let alias = alias.map_or_else(
            || {
                import_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(import_path.as_str())
                    .to_string()
            },
            str::to_string,
        );
        self.import_aliases.insert(alias, import_path.clone());
        self.imports.push(import_path);
    }

    /// Registers a struct, binding it to this package.
    pub fn add_struct(&mut self, mut s: Struct) {
        s.package_path.clone_from(&self.path);
        self.structs.insert(s.name.clone(), s);
    }

    /// Registers an interface, binding it to this package.
    pub fn add_interface(&mut self, mut i: Interface) {
        i.package_path.clone_from(&self.path);
        self.interfaces.insert(i.name.clone(), i);
    }

    /// Binds a method to the struct named `receiver`.
    ///
    /// Returns `false` (and drops the method) when no such struct exists.
    pub fn attach_method(&mut self, receiver: &str, method: Method) -> bool {
        match self.structs.get_mut(receiver) {
            Some(s) => {
                s.add_method(method);
                true
            }
            None => false,
        }
    }
}

/// The aggregate root: every extracted package keyed by path.
#[derive(Debug, Clone, Default)]
pub struct Architecture {
    root: PathBuf,
    packages: BTreeMap<String, Package>,
}

impl Architecture {
    /// Creates an empty architecture rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Root directory packages are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registers a package, replacing any previous package at the same path.
    pub fn insert_package(&mut self, package: Package) -> Option<Package> {
        self.packages.insert(package.path.clone(), package)
    }

    /// All packages keyed by path, in path order.
    #[must_use]
    pub fn packages(&self) -> &BTreeMap<String, Package> {
        &self.packages
    }

    /// Looks up a package by path.
    #[must_use]
    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Every struct across all packages, in package then name order.
    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.packages.values().flat_map(|p| p.structs.values())
    }

    /// Every interface across all packages, in package then name order.
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.packages.values().flat_map(|p| p.interfaces.values())
    }
}
