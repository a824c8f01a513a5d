//! # arctest
//!
//! Architecture conformance testing for Go codebases.
//!
//! Declare layers and the dependencies allowed between them, plus rules
//! about which structs implement which interfaces and which parameter
//! shapes methods accept. arctest parses the project with Tree-sitter and
//! reports every violation as a plain message.
//!
//! ## Programmatic use
//!
//! ```ignore
//! use arctest::{Architecture, Layer, ParsePackages};
//!
//! let mut arch = Architecture::new("path/to/project");
//! arch.parse_all()?;
//!
//! let mut layered = arch.new_layered_architecture(vec![
//!     Layer::new("Domain", ["^domain$"])?,
//!     Layer::new("Application", ["^application$"])?,
//! ]);
//! layered.add_rule("Application", "Domain")?;
//!
//! let (passed, violations) = layered.validate(&arch);
//! ```
//!
//! ## Configuration-driven use
//!
//! ```ignore
//! use arctest::Config;
//!
//! let config = Config::from_file(".arctest.yml".as_ref())?;
//! let report = config.run_architecture_tests("path/to/project".as_ref())?;
//! assert!(report.passed(), "{:#?}", report.violations);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod runner;

pub use config::{Config, ConfigError, Format};
pub use runner::BuiltArchitecture;

pub use arctest_core::{
    fragment, implements, is_builtin_type, Architecture, CheckReport, DependencyRule, Field,
    Interface, InterfaceImplementationRule, Layer, LayeredArchitecture, Method, Package,
    Parameter, ParameterRule, Pattern, PatternError, RuleError, Struct, TypeClass,
};
pub use arctest_go::{ExtractionError, GoExtractor, LanguageExtractor, PackageLoader, ParsePackages};
