//! Aggregated result of a check run.

use serde::Serialize;

/// Ordered violation messages collected across every engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Violation messages in engine order.
    pub violations: Vec<String>,
}

impl CheckReport {
    /// Creates an empty (passing) report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no violations were recorded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Appends violations from one engine.
    pub fn extend(&mut self, violations: impl IntoIterator<Item = String>) {
        self.violations.extend(violations);
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Same as [`passed`](Self::passed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl From<Vec<String>> for CheckReport {
    fn from(violations: Vec<String>) -> Self {
        Self { violations }
    }
}
