//! Go language extractor using Tree-sitter.

use std::borrow::Cow;
use std::ops::Range;
use std::path::PathBuf;

use arctest_core::{is_builtin_type, Field, Interface, Method, Parameter, Struct};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::ExtractionError;
use crate::extractor::{FileAnalysis, ImportInfo, LanguageExtractor, MethodDecl};

/// Extracts imports, structs, interfaces, and methods from Go source.
pub struct GoExtractor {
    language: Language,
}

impl GoExtractor {
    /// Creates a new Go extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
        node.utf8_text(src).unwrap_or("")
    }

    fn package_name(node: Node<'_>, src: &[u8]) -> Option<String> {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "package_identifier" {
                return Some(Self::text(child, src).to_owned());
            }
        }
        None
    }

    fn extract_imports(node: Node<'_>, src: &[u8], out: &mut Vec<ImportInfo>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => {
                    if let Some(import) = Self::import_spec(child, src) {
                        out.push(import);
                    }
                }
                "import_spec_list" => Self::extract_imports(child, src, out),
                _ => {}
            }
        }
    }

    fn import_spec(node: Node<'_>, src: &[u8]) -> Option<ImportInfo> {
        let path = node.child_by_field_name("path")?;
        let path = Self::text(path, src)
            .trim_matches(|c| c == '"' || c == '`')
            .to_owned();
        if path.is_empty() {
            return None;
        }
        Some(ImportInfo {
            line: node.start_position().row + 1,
            path,
            alias: node
                .child_by_field_name("name")
                .map(|n| Self::text(n, src).to_owned()),
        })
    }

    fn extract_types(node: Node<'_>, src: &[u8], result: &mut FileAnalysis) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            if spec.kind() != "type_spec" {
                continue;
            }
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            let name = Self::text(name, src);
            match ty.kind() {
                "struct_type" => result
                    .structs
                    .push(Struct::new(name, Self::struct_fields(ty, src))),
                "interface_type" if Self::is_constraint(ty, src) => {
                    tracing::debug!(interface = name, "skipping constraint interface");
                }
                "interface_type" => result
                    .interfaces
                    .push(Interface::new(name, Self::interface_methods(ty, src))),
                _ => {}
            }
        }
    }

    /// Named fields only; embedded fields have no name and are skipped.
    fn struct_fields(node: Node<'_>, src: &[u8]) -> Vec<Field> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for list in node.named_children(&mut cursor) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            let mut list_cursor = list.walk();
            for decl in list.named_children(&mut list_cursor) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let type_text = decl
                    .child_by_field_name("type")
                    .map(|t| Self::type_text(t, src))
                    .unwrap_or_default();
                let mut name_cursor = decl.walk();
                for name in decl.children_by_field_name("name", &mut name_cursor) {
                    fields.push(Field::new(Self::text(name, src), type_text.clone()));
                }
            }
        }
        fields
    }

    /// Whether the interface lists a type set (`~int`, `int | string`, `int`)
    /// rather than only methods and embedded interfaces. Such interfaces can
    /// only constrain type parameters.
    fn is_constraint(node: Node<'_>, src: &[u8]) -> bool {
        let mut cursor = node.walk();
        let is_constraint = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "type_elem")
            .any(|elem| {
                if elem.named_child_count() != 1 {
                    return true;
                }
                match elem.named_child(0) {
                    Some(t) if t.kind() == "type_identifier" => {
                        is_builtin_type(Self::text(t, src))
                    }
                    Some(t) => !matches!(t.kind(), "qualified_type" | "generic_type"),
                    None => true,
                }
            });
        is_constraint
    }

    /// Method elements only; embedded interfaces and type sets are ignored.
    fn interface_methods(node: Node<'_>, src: &[u8]) -> Vec<Method> {
        let mut methods = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    if let Some(method) = Self::signature(child, src) {
                        methods.push(method);
                    }
                }
                "method_spec_list" => methods.extend(Self::interface_methods(child, src)),
                _ => {}
            }
        }
        methods
    }

    fn signature(node: Node<'_>, src: &[u8]) -> Option<Method> {
        let name = Self::text(node.child_by_field_name("name")?, src);
        let params = node
            .child_by_field_name("parameters")
            .map(|p| Self::parameters(p, src))
            .unwrap_or_default();
        let has_return = node.child_by_field_name("result").is_some();
        Some(Method::new(name, params, has_return))
    }

    /// One parameter per declared name; an unnamed declaration yields one
    /// parameter with an empty name.
    fn parameters(list: Node<'_>, src: &[u8]) -> Vec<Parameter> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            match decl.kind() {
                "parameter_declaration" => {
                    let type_text = decl
                        .child_by_field_name("type")
                        .map(|t| Self::type_text(t, src))
                        .unwrap_or_default();
                    let mut name_cursor = decl.walk();
                    let names: Vec<&str> = decl
                        .children_by_field_name("name", &mut name_cursor)
                        .map(|n| Self::text(n, src))
                        .collect();
                    if names.is_empty() {
                        params.push(Parameter::new("", type_text));
                    } else {
                        for name in names {
                            params.push(Parameter::new(name, type_text.clone()));
                        }
                    }
                }
                "variadic_parameter_declaration" => {
                    let name = decl
                        .child_by_field_name("name")
                        .map_or("", |n| Self::text(n, src));
                    params.push(Parameter::new(name, ""));
                }
                _ => {}
            }
        }
        params
    }

    /// `T`, `pkg.T`, `*T`, `*pkg.T`; empty for every other shape.
    fn type_text(node: Node<'_>, src: &[u8]) -> String {
        match node.kind() {
            "type_identifier" => Self::text(node, src).to_owned(),
            "qualified_type" => {
                match (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) {
                    (Some(pkg), Some(name)) => {
                        format!("{}.{}", Self::text(pkg, src), Self::text(name, src))
                    }
                    _ => String::new(),
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(inner) if matches!(inner.kind(), "type_identifier" | "qualified_type") => {
                    format!("*{}", Self::type_text(inner, src))
                }
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

    /// Base type name of a receiver: `T`, `*T`, `T[K]`, `*T[K]`.
    fn receiver_type(node: Node<'_>, src: &[u8]) -> Option<String> {
        match node.kind() {
            "type_identifier" => Some(Self::text(node, src).to_owned()),
            "pointer_type" | "parenthesized_type" => node
                .named_child(0)
                .and_then(|inner| Self::receiver_type(inner, src)),
            "generic_type" => node
                .child_by_field_name("type")
                .and_then(|inner| Self::receiver_type(inner, src)),
            _ => None,
        }
    }

    fn extract_method(node: Node<'_>, src: &[u8]) -> Option<MethodDecl> {
        let receiver_list = node.child_by_field_name("receiver")?;
        let mut cursor = receiver_list.walk();
        let mut receiver = None;
        for decl in receiver_list.named_children(&mut cursor) {
            if decl.kind() == "parameter_declaration" {
                receiver = decl
                    .child_by_field_name("type")
                    .and_then(|t| Self::receiver_type(t, src));
                break;
            }
        }

        Some(MethodDecl {
            line: node.start_position().row + 1,
            receiver: receiver?,
            method: Self::signature(node, src)?,
        })
    }

    fn parse(parser: &mut Parser, source: &str) -> Result<Tree, ExtractionError> {
        parser.parse(source, None).ok_or(ExtractionError::Parse {
            path: PathBuf::new(),
            line: 1,
            column: 1,
        })
    }

    fn first_error(node: Node<'_>) -> Option<Node<'_>> {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            return None;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(found) = Self::first_error(child) {
                return Some(found);
            }
        }
        None
    }
}

/// Top-level generic type aliases (`type Set[T comparable] = map[T]bool`),
/// which the bundled grammar rejects, as byte ranges with their names.
fn generic_aliases(source: &str) -> Vec<(Range<usize>, &str)> {
    let bytes = source.as_bytes();
    let mut found = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let line_end = source[start..]
            .find('\n')
            .map_or(bytes.len(), |i| start + i);
        let mut next = line_end + 1;
        if let Some((name, open)) = generic_type_head(&source[start..line_end]) {
            let mut i = scan(bytes, start + open, false);
            while matches!(bytes.get(i), Some(b' ' | b'\t')) {
                i += 1;
            }
            if bytes.get(i) == Some(&b'=') && bytes.get(i + 1) != Some(&b'=') {
                let end = scan(bytes, i + 1, true);
                found.push((start..end, name));
                next = end + 1;
            }
        }
        start = next;
    }
    found
}

/// Name and `[` offset of a line shaped `type Name[`.
fn generic_type_head(line: &str) -> Option<(&str, usize)> {
    let rest = line.trim_start().strip_prefix("type")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let rest = rest.trim_start();
    let name_len = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (name, after) = rest.split_at(name_len);
    let after = after.trim_start();
    if name.is_empty() || !after.starts_with('[') {
        return None;
    }
    Some((name, line.len() - after.len()))
}

/// Scans from `i` over balanced brackets, strings and line comments.
///
/// Returns the offset just past the group opened at `i`, or with
/// `until_newline` the first newline outside any group.
fn scan(bytes: &[u8], mut i: usize, until_newline: bool) -> usize {
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !until_newline {
                    return i + 1;
                }
            }
            b'\n' if depth == 0 && until_newline => return i,
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' && quote != b'`' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Replaces everything but newlines inside `ranges` with spaces so the
/// remaining declarations keep their line numbers.
fn blank_out(source: &str, ranges: &[(Range<usize>, &str)]) -> String {
    source
        .char_indices()
        .map(|(i, c)| {
            if c != '\n' && ranges.iter().any(|(range, _)| range.contains(&i)) {
                ' '
            } else {
                c
            }
        })
        .collect()
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for GoExtractor {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn accepts(&self, file_name: &str) -> bool {
        file_name.ends_with(".go") && !file_name.ends_with("_test.go")
    }

    fn analyze(&self, source: &str) -> Result<FileAnalysis, ExtractionError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ExtractionError::Language(e.to_string()))?;

        let mut tree = Self::parse(&mut parser, source)?;
        let mut text = Cow::Borrowed(source);
        if tree.root_node().has_error() {
            let aliases = generic_aliases(source);
            if !aliases.is_empty() {
                for (range, name) in &aliases {
                    let line = source[..range.start].matches('\n').count() + 1;
                    tracing::warn!(alias = %name, line, "skipping generic type alias");
                }
                text = Cow::Owned(blank_out(source, &aliases));
                tree = Self::parse(&mut parser, &text)?;
            }
        }

        let src = text.as_bytes();
        let root = tree.root_node();

        if root.has_error() {
            let at = Self::first_error(root).unwrap_or(root).start_position();
            return Err(ExtractionError::Parse {
                path: PathBuf::new(),
                line: at.row + 1,
                column: at.column + 1,
            });
        }

        let mut result = FileAnalysis::default();

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "package_clause" => {
                    result.package_name = Self::package_name(node, src);
                }
                "import_declaration" => Self::extract_imports(node, src, &mut result.imports),
                "type_declaration" => Self::extract_types(node, src, &mut result),
                "method_declaration" => {
                    if let Some(method) = Self::extract_method(node, src) {
                        result.methods.push(method);
                    }
                }
                _ => {}
            }
        }

        Ok(result)
    }
}
