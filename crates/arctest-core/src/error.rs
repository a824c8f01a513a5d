//! Error taxonomy for rule and layer construction.
//!
//! Violations are never errors. These types cover bad configuration only:
//! patterns that fail to compile and references that cannot be resolved.

/// A pattern string failed to compile as a regular expression.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid pattern `{pattern}`: {source}")]
pub struct PatternError {
    /// The offending pattern text.
    pub pattern: String,
    /// The underlying regex error.
    #[source]
    pub source: regex::Error,
}

/// Errors raised while declaring rules and layers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    /// A pattern did not compile.
    #[error("{context}: {source}")]
    Pattern {
        /// Which pattern slot failed (e.g. "source pattern").
        context: String,
        /// The compile error.
        #[source]
        source: PatternError,
    },

    /// A dependency rule was given an empty pattern.
    #[error("{which} pattern must not be empty")]
    EmptyPattern {
        /// Either `"source"` or `"target"`.
        which: &'static str,
    },

    /// A layer name could not be resolved.
    #[error("{role} layer `{name}` not found")]
    UnknownLayer {
        /// Either `"source"` or `"target"`.
        role: &'static str,
        /// The missing layer name.
        name: String,
    },

    /// A layer-scoped rule constructor was used before `bind`.
    #[error("layer `{layer}` is not associated with an architecture")]
    Unbound {
        /// The unbound layer's name.
        layer: String,
    },

    /// A lookup named a package that was never extracted.
    #[error("package `{0}` not found")]
    PackageNotFound(String),

    /// A lookup named an interface missing from its package.
    #[error("interface `{name}` not found in package `{package}`")]
    InterfaceNotFound {
        /// Interface name.
        name: String,
        /// Package path searched.
        package: String,
    },
}

impl RuleError {
    pub(crate) fn pattern(context: &str, source: PatternError) -> Self {
        Self::Pattern {
            context: context.to_string(),
            source,
        }
    }
}
