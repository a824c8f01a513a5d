//! # arctest-core
//!
//! In-memory architecture model and rule engines for architecture
//! conformance checks.
//!
//! This crate is parser-agnostic: it defines the flat model that an
//! extractor fills (packages, structs, interfaces, methods) and the rule
//! engines that evaluate it:
//!
//! - [`Pattern`] and the [`fragment`] helpers shared by every rule kind
//! - [`DependencyRule`] for allow/deny import rules between package sets
//! - [`InterfaceImplementationRule`] for structural "implements" checks
//! - [`ParameterRule`] for interface/struct parameter shape checks
//! - [`Layer`] and [`LayeredArchitecture`] for whole-architecture layering
//!
//! Every engine returns plain violation strings. Violations are findings,
//! not errors; errors are reserved for bad patterns and bad references.
//!
//! ## Example
//!
//! ```ignore
//! use arctest_core::{Architecture, Layer, LayeredArchitecture};
//!
//! let domain = Layer::new("Domain", ["domain"])?;
//! let app = Layer::new("Application", ["application"])?;
//! let mut layered = LayeredArchitecture::new(vec![domain, app]);
//! layered.add_rule("Application", "Domain")?;
//!
//! let violations = layered.check(&arch);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dependency;
mod error;
mod interfaces;
mod layer;
mod model;
mod parameters;
mod pattern;
mod report;

pub use dependency::DependencyRule;
pub use error::{PatternError, RuleError};
pub use interfaces::{implements, InterfaceImplementationRule};
pub use layer::{Layer, LayeredArchitecture};
pub use model::{Architecture, Field, Interface, Method, Package, Parameter, Struct};
pub use parameters::{is_builtin_type, ParameterRule, TypeClass};
pub use pattern::{fragment, Pattern};
pub use report::CheckReport;
