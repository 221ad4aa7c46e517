//! # stcss-core
//!
//! Core library for parsing, semantic analysis, and transformation of the
//! stcss scoped-CSS dialect: imports, scoped classes, custom pseudo-states,
//! build-time variables, mixins, and namespaced CSS features
//! (`@container`, `@layer`, custom properties, `@keyframes`).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! compiler  → Stcss facade (per-file cache, analyze + transform orchestration)
//!   ↓
//! pipeline  → analyzer (one AST walk) and transformer (clone + rewrite)
//!   ↓
//! features  → pluggable analyze/transform units, one per dialect construct
//!   ↓
//! semantic  → symbols, symbol table, module metadata, import-chain resolver
//!   ↓
//! css       → logos lexer, block parser, mutable AST, value/selector tokenizers
//!   ↓
//! base      → primitives (NodeId, spans)
//! ```
//!
//! The `host` module sits beside the stack: it is the filesystem seam
//! (module resolution + file reading) injected into the facade.

// ============================================================================
// MODULES (dependency order: base → css → semantic → features → pipeline)
// ============================================================================

/// Foundation types: NodeId, span re-exports
pub mod base;

/// CSS dialect syntax: lexer, parser, mutable AST, value/selector tokenizers
pub mod css;

/// Structured reports accumulated per compilation unit
pub mod diagnostics;

/// Semantic model: symbols, symbol table, module metadata, resolver
pub mod semantic;

/// Feature units: analyze/transform logic for each dialect construct
pub mod features;

/// Analyze and transform passes
pub mod pipeline;

/// Filesystem seam: module resolution and file reading
pub mod host;

/// The Stcss facade: per-file cache and compile orchestration
pub mod compiler;

// Re-export the surface consumed by build tooling
pub use base::{NodeId, Span};
pub use compiler::{Stcss, TransformResult};
pub use diagnostics::{Diagnostic, DiagnosticBag, Severity, codes};
pub use host::{FsHost, HostError, MemoryHost, ModuleHost};
pub use pipeline::ModuleExports;
pub use semantic::{Imported, ModuleMeta, SheetKind, StSymbol, SymbolKind};
