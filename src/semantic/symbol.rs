//! Symbol model for the stcss dialect.
//!
//! Every named entity a module defines or imports is an [`StSymbol`]: a
//! closed sum type discriminated by [`SymbolKind`]. Symbols live in one
//! of a module's lookup namespaces (see [`SymbolNamespace`]); within one
//! namespace a local name maps to at most one symbol.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{NodeId, Span};

/// Index of the [`crate::semantic::Imported`] record that introduced an
/// imported symbol, within its module's `imports` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportRef(pub usize);

/// Fieldless mirror of the symbol variants, used for typed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Element,
    Var,
    CssVar,
    Container,
    Layer,
    Keyframes,
    Import,
}

/// Lookup namespaces. Classes, elements, build-time vars and main-block
/// imports share one namespace; the CSS-feature names each get their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolNamespace {
    Main,
    CssVar,
    Keyframes,
    Layer,
    Container,
}

impl SymbolKind {
    pub fn namespace(self) -> SymbolNamespace {
        match self {
            SymbolKind::Class | SymbolKind::Element | SymbolKind::Var | SymbolKind::Import => {
                SymbolNamespace::Main
            }
            SymbolKind::CssVar => SymbolNamespace::CssVar,
            SymbolKind::Keyframes => SymbolNamespace::Keyframes,
            SymbolKind::Layer => SymbolNamespace::Layer,
            SymbolKind::Container => SymbolNamespace::Container,
        }
    }
}

/// How a main-namespace import binds its local name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `@st-import Name from "..."` refers to the target module itself.
    Default,
    /// `[local]` / `[origin as local]` refers to `origin` in the target.
    Named { origin: SmolStr },
}

/// A named entity registered in a module's symbol table.
#[derive(Debug, Clone, PartialEq)]
pub enum StSymbol {
    Class {
        name: SmolStr,
        node: NodeId,
        span: Span,
        /// Selector text that replaces the scoped class (`-st-global`).
        global_selector: Option<String>,
        /// Local name of the symbol this class extends (`-st-extends`).
        extends: Option<SmolStr>,
        /// Custom states declared on this class, in declaration order.
        states: IndexMap<SmolStr, StateDef>,
    },
    Element {
        name: SmolStr,
        node: NodeId,
        span: Span,
        /// Custom states declared on this element, in declaration order.
        states: IndexMap<SmolStr, StateDef>,
    },
    /// A build-time variable from a `:vars` block.
    Var {
        name: SmolStr,
        node: NodeId,
        span: Span,
        value: String,
    },
    /// A CSS custom property (`--name`, name stored without the dashes).
    CssVar {
        name: SmolStr,
        node: NodeId,
        span: Span,
        global: bool,
        import: Option<ImportRef>,
    },
    Container {
        name: SmolStr,
        node: NodeId,
        span: Span,
        global: bool,
        import: Option<ImportRef>,
    },
    Layer {
        name: SmolStr,
        node: NodeId,
        span: Span,
        global: bool,
        import: Option<ImportRef>,
    },
    Keyframes {
        name: SmolStr,
        node: NodeId,
        span: Span,
        global: bool,
        import: Option<ImportRef>,
    },
    Import {
        name: SmolStr,
        node: NodeId,
        span: Span,
        import: ImportRef,
        kind: ImportKind,
    },
}

impl StSymbol {
    pub fn name(&self) -> &SmolStr {
        match self {
            StSymbol::Class { name, .. }
            | StSymbol::Element { name, .. }
            | StSymbol::Var { name, .. }
            | StSymbol::CssVar { name, .. }
            | StSymbol::Container { name, .. }
            | StSymbol::Layer { name, .. }
            | StSymbol::Keyframes { name, .. }
            | StSymbol::Import { name, .. } => name,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            StSymbol::Class { .. } => SymbolKind::Class,
            StSymbol::Element { .. } => SymbolKind::Element,
            StSymbol::Var { .. } => SymbolKind::Var,
            StSymbol::CssVar { .. } => SymbolKind::CssVar,
            StSymbol::Container { .. } => SymbolKind::Container,
            StSymbol::Layer { .. } => SymbolKind::Layer,
            StSymbol::Keyframes { .. } => SymbolKind::Keyframes,
            StSymbol::Import { .. } => SymbolKind::Import,
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            StSymbol::Class { node, .. }
            | StSymbol::Element { node, .. }
            | StSymbol::Var { node, .. }
            | StSymbol::CssVar { node, .. }
            | StSymbol::Container { node, .. }
            | StSymbol::Layer { node, .. }
            | StSymbol::Keyframes { node, .. }
            | StSymbol::Import { node, .. } => *node,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            StSymbol::Class { span, .. }
            | StSymbol::Element { span, .. }
            | StSymbol::Var { span, .. }
            | StSymbol::CssVar { span, .. }
            | StSymbol::Container { span, .. }
            | StSymbol::Layer { span, .. }
            | StSymbol::Keyframes { span, .. }
            | StSymbol::Import { span, .. } => *span,
        }
    }

    /// The import record this symbol came from, if it is imported.
    pub fn import_ref(&self) -> Option<ImportRef> {
        match self {
            StSymbol::Import { import, .. } => Some(*import),
            StSymbol::CssVar { import, .. }
            | StSymbol::Container { import, .. }
            | StSymbol::Layer { import, .. }
            | StSymbol::Keyframes { import, .. } => *import,
            StSymbol::Class { .. } | StSymbol::Element { .. } | StSymbol::Var { .. } => None,
        }
    }

    /// Whether the symbol is exempt from namespacing.
    pub fn is_global(&self) -> bool {
        match self {
            StSymbol::CssVar { global, .. }
            | StSymbol::Container { global, .. }
            | StSymbol::Layer { global, .. }
            | StSymbol::Keyframes { global, .. } => *global,
            _ => false,
        }
    }
}

// ============================================================================
// CUSTOM STATE DEFINITIONS
// ============================================================================

/// A custom pseudo-state declared with `-st-states`.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDef {
    /// `name` toggles by presence.
    Boolean,
    /// `name(<type>) [default]` carries a validated parameter.
    Param {
        param: StateParam,
        default: Option<String>,
    },
    /// `name(".x[attr]")` is a literal selector substituted at usage.
    Mapped { template: String },
    /// `name("[attr=$0]", <type>) [default]` is a selector template with
    /// exactly one placeholder and one parameter.
    Template {
        template: String,
        param: StateParam,
        default: Option<String>,
    },
}

/// Parameter type of a custom state, with its validation arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum StateParam {
    Enum {
        options: Vec<SmolStr>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        multiple_of: Option<f64>,
    },
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        contains: Option<String>,
        regex: Option<String>,
    },
    /// A space-separated tag list; the value must be a single tag.
    Tag,
}
