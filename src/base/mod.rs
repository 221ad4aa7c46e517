//! Foundation types for the stcss compiler.
//!
//! This module provides the primitives used throughout the pipeline:
//! - [`NodeId`] - per-parse AST node identity
//! - [`Span`] - byte-offset source ranges (re-exported from text-size)
//!
//! This module has NO dependencies on other stcss modules.

pub use text_size::{TextRange, TextSize};

/// Byte-offset range of a syntax node in its source file.
pub type Span = TextRange;

/// Unique identifier for an AST node within one parsed file.
///
/// Ids are assigned by the parser in document order and survive the
/// transform-phase deep clone, so diagnostics emitted against the clone
/// still point at the original node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Id used for symbols that have no syntactic definition site
    /// (e.g. the implicit `root` class).
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }
}

/// An empty span for synthetic nodes.
pub fn empty_span() -> Span {
    TextRange::empty(TextSize::new(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_id_is_reserved() {
        assert!(NodeId::SYNTHETIC.is_synthetic());
        assert!(!NodeId(0).is_synthetic());
    }
}
