//! Diagnostics: structured reports attached to a compilation unit.
//!
//! User-input problems never abort the pipeline: they are accumulated in
//! order and the walk continues. Reports are never deduplicated
//! automatically; features that need dedup do it by construction.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{NodeId, Span};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic report with its originating node.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Stable code; downstream tooling pattern-matches on this.
    pub code: &'static str,
    pub severity: Severity,
    pub message: Arc<str>,
    /// The AST node the report is attached to.
    pub node: NodeId,
    /// Byte range of the node in its source file.
    pub span: Span,
    /// The specific word within the node the report is about, if any.
    pub word: Option<SmolStr>,
}

impl Diagnostic {
    pub fn error(node: NodeId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, node, span, message)
    }

    pub fn warning(node: NodeId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, node, span, message)
    }

    pub fn info(node: NodeId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Info, node, span, message)
    }

    fn new(severity: Severity, node: NodeId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self {
            code: codes::UNCATEGORIZED,
            severity,
            message: message.into(),
            node,
            span,
            word: None,
        }
    }

    /// Set the stable code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    /// Set the word the report is about.
    pub fn with_word(mut self, word: impl Into<SmolStr>) -> Self {
        self.word = Some(word.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
///
/// Codes are part of the output contract: build tooling matches on them,
/// so they never change meaning once published.
pub mod codes {
    pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

    // ------------------------------------------------------------------
    // Syntax
    // ------------------------------------------------------------------
    pub const CSS_PARSE_ERROR: &str = "CSS_PARSE_ERROR";
    pub const INVALID_SELECTOR: &str = "INVALID_SELECTOR";

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------
    pub const REDECLARE_SYMBOL: &str = "REDECLARE_SYMBOL";

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------
    pub const EMPTY_IMPORT_FROM: &str = "EMPTY_IMPORT_FROM";
    pub const MISSING_IMPORT_FROM: &str = "MISSING_IMPORT_FROM";
    pub const ST_IMPORT_STAR: &str = "ST_IMPORT_STAR";
    pub const MULTIPLE_FROM_IN_IMPORT: &str = "MULTIPLE_FROM_IN_IMPORT";
    pub const LOWERCASE_DEFAULT_IMPORT: &str = "LOWERCASE_DEFAULT_IMPORT";
    pub const UNKNOWN_IMPORT_PROP: &str = "UNKNOWN_IMPORT_PROP";
    pub const NO_IMPORT_IN_NESTED_SCOPE: &str = "NO_IMPORT_IN_NESTED_SCOPE";
    pub const UNKNOWN_IMPORTED_FILE: &str = "UNKNOWN_IMPORTED_FILE";
    pub const UNKNOWN_IMPORTED_SYMBOL: &str = "UNKNOWN_IMPORTED_SYMBOL";
    pub const INVALID_ST_IMPORT_SYNTAX: &str = "INVALID_ST_IMPORT_SYNTAX";

    // ------------------------------------------------------------------
    // Build-time variables (`:vars`, `value()`)
    // ------------------------------------------------------------------
    pub const NO_VARS_IN_NESTED_SCOPE: &str = "NO_VARS_IN_NESTED_SCOPE";
    pub const UNKNOWN_VAR: &str = "UNKNOWN_VAR";
    pub const CYCLIC_VALUE: &str = "CYCLIC_VALUE";

    // ------------------------------------------------------------------
    // Classes, types, extends
    // ------------------------------------------------------------------
    pub const CANNOT_EXTEND_UNKNOWN_SYMBOL: &str = "CANNOT_EXTEND_UNKNOWN_SYMBOL";
    pub const CANNOT_EXTEND_IN_COMPLEX_SELECTOR: &str = "CANNOT_EXTEND_IN_COMPLEX_SELECTOR";
    pub const UNSCOPED_TYPE_SELECTOR: &str = "UNSCOPED_TYPE_SELECTOR";
    pub const INVALID_ST_GLOBAL: &str = "INVALID_ST_GLOBAL";

    // ------------------------------------------------------------------
    // Custom states
    // ------------------------------------------------------------------
    pub const STATE_STARTS_WITH_HYPHEN: &str = "STATE_STARTS_WITH_HYPHEN";
    pub const RESERVED_STATE_NAME: &str = "RESERVED_STATE_NAME";
    pub const UNKNOWN_STATE_TYPE: &str = "UNKNOWN_STATE_TYPE";
    pub const TEMPLATE_MISSING_PARAMETER: &str = "TEMPLATE_MISSING_PARAMETER";
    pub const TEMPLATE_MULTI_PARAMETER: &str = "TEMPLATE_MULTI_PARAMETER";
    pub const REDECLARE_STATE: &str = "REDECLARE_STATE";
    pub const STATE_DEFINITION_IN_COMPLEX_SELECTOR: &str =
        "STATE_DEFINITION_IN_COMPLEX_SELECTOR";
    pub const STATE_VALIDATION_FAILED: &str = "STATE_VALIDATION_FAILED";
    pub const UNKNOWN_STATE: &str = "UNKNOWN_STATE";

    // ------------------------------------------------------------------
    // Custom properties
    // ------------------------------------------------------------------
    pub const ILLEGAL_PROPERTY_NAME: &str = "ILLEGAL_PROPERTY_NAME";
    pub const MISSING_PROPERTY_DESCRIPTOR: &str = "MISSING_PROPERTY_DESCRIPTOR";

    // ------------------------------------------------------------------
    // Keyframes
    // ------------------------------------------------------------------
    pub const RESERVED_KEYFRAMES_NAME: &str = "RESERVED_KEYFRAMES_NAME";
    pub const ILLEGAL_KEYFRAMES_NESTING: &str = "ILLEGAL_KEYFRAMES_NESTING";

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------
    pub const RESERVED_LAYER_NAME: &str = "RESERVED_LAYER_NAME";

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------
    pub const RESERVED_CONTAINER_NAME: &str = "RESERVED_CONTAINER_NAME";
    pub const UNKNOWN_CONTAINER_TYPE: &str = "UNKNOWN_CONTAINER_TYPE";
    pub const MISSING_CONTAINER_TYPE: &str = "MISSING_CONTAINER_TYPE";
    pub const UNRESOLVED_CONTAINER_NAME: &str = "UNRESOLVED_CONTAINER_NAME";

    // ------------------------------------------------------------------
    // Mixins
    // ------------------------------------------------------------------
    pub const UNKNOWN_MIXIN: &str = "UNKNOWN_MIXIN";
    pub const CIRCULAR_MIXIN: &str = "CIRCULAR_MIXIN";

    // ------------------------------------------------------------------
    // @st-scope
    // ------------------------------------------------------------------
    pub const MISSING_SCOPING_SELECTOR: &str = "MISSING_SCOPING_SELECTOR";
    pub const ILLEGAL_SCOPE_DECLARATION: &str = "ILLEGAL_SCOPE_DECLARATION";
}

// ============================================================================
// DIAGNOSTIC BAG
// ============================================================================

/// Collects diagnostics during analyze and transform.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    reports: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report.
    pub fn add(&mut self, report: Diagnostic) {
        self.reports.push(report);
    }

    /// Get all reports in emission order.
    pub fn reports(&self) -> &[Diagnostic] {
        &self.reports
    }

    pub fn error_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Take all reports, leaving the bag empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.reports)
    }

    /// Move every report from `other` into this bag.
    pub fn absorb(&mut self, other: &mut DiagnosticBag) {
        self.reports.append(&mut other.reports);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::empty_span;

    #[test]
    fn builder_sets_code_and_word() {
        let d = Diagnostic::warning(NodeId(3), empty_span(), "redeclared")
            .with_code(codes::REDECLARE_SYMBOL)
            .with_word("a");
        assert_eq!(d.code, "REDECLARE_SYMBOL");
        assert_eq!(d.word.as_deref(), Some("a"));
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn bag_counts_and_order() {
        let mut bag = DiagnosticBag::new();
        bag.add(Diagnostic::error(NodeId(0), empty_span(), "first"));
        bag.add(Diagnostic::warning(NodeId(1), empty_span(), "second"));
        bag.add(Diagnostic::error(NodeId(2), empty_span(), "third"));
        assert_eq!(bag.error_count(), 2);
        assert_eq!(bag.warning_count(), 1);
        assert!(bag.has_errors());
        let reports = bag.take();
        assert_eq!(&*reports[0].message, "first");
        assert_eq!(&*reports[2].message, "third");
        assert!(bag.is_empty());
    }
}
