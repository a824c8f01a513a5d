//! Compiled regular-expression patterns.

use regex::Regex;
use std::fmt;

use crate::error::PatternError;

/// A regular expression compiled once at construction.
///
/// Construction fails on invalid syntax, so a bad pattern can never end up
/// silently matching nothing.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    compiled: Regex,
}

impl Pattern {
    /// Compiles a new pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] naming the pattern if it does not compile.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let compiled = Regex::new(pattern).map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
        })
    }

    /// Tests whether the pattern matches anywhere in `candidate`.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.compiled.is_match(candidate)
    }

    /// Returns the source text of the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Fragment synthesis: turns layer patterns into path-suffix expressions.
///
/// A *fragment* is a layer pattern with one leading `^` and one trailing `$`
/// removed. Fragments are re-wrapped so they match at a path-segment
/// boundary, which lets a layer declared as `domain` cover both
/// `domain` and `domain/entities` (and `github.com/acme/app/domain`), but
/// never `mydomain`.
///
/// These functions are pure string transformations; compiling the result
/// is left to the caller.
pub mod fragment {
    /// Removes one leading `^` and one trailing `$` from a pattern.
    #[must_use]
    pub fn strip_anchors(pattern: &str) -> &str {
        let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
        pattern.strip_suffix('$').unwrap_or(pattern)
    }

    /// Wraps a pattern's fragment as "any path ending in the fragment, or
    /// nested below it, at a segment boundary".
    #[must_use]
    pub fn suffix_expression(pattern: &str) -> String {
        format!("(?:^|/)(?:{})(?:/.*)?$", strip_anchors(pattern))
    }

    /// Alternation of [`suffix_expression`] over several patterns.
    #[must_use]
    pub fn any_suffix_expression<S: AsRef<str>>(patterns: &[S]) -> String {
        patterns
            .iter()
            .map(|p| suffix_expression(p.as_ref()))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Restricts a struct pattern to structs living under one of the layer
    /// patterns.
    ///
    /// The result only matches a qualified struct name of the form
    /// `<package path>.<Name>`. A pattern that already starts with `^` is
    /// treated as pre-scoped and returned unchanged.
    #[must_use]
    pub fn scoped_struct_expression<S: AsRef<str>>(layer_patterns: &[S], pattern: &str) -> String {
        if pattern.starts_with('^') {
            return pattern.to_string();
        }
        let fragments = layer_patterns
            .iter()
            .map(|p| format!("(?:{})", strip_anchors(p.as_ref())))
            .collect::<Vec<_>>()
            .join("|");
        format!(r"^(?:.*/)?(?:{fragments})(?:/[^.]*)?\.(?:{pattern})")
    }
}
