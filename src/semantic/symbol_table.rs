//! Per-module symbol table.
//!
//! Insertion order is preserved per namespace: it drives JS export key
//! order, which is part of the observable output contract. Conflicts
//! never throw; the caller turns [`InsertOutcome::KeptExisting`] into a
//! redeclare diagnostic.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::symbol::{StSymbol, SymbolKind, SymbolNamespace};

/// What to do when a name is already taken in its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeclarePolicy {
    /// Keep the existing symbol; the caller reports a redeclare.
    FirstWins,
    /// Replace the existing symbol (forced definitions such as
    /// `@property` and `@layer` re-opening).
    Overwrite,
    /// Keep the existing symbol silently (repeated harmless
    /// definitions, e.g. the same class in several rules).
    SafeRedeclare,
}

/// Result of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An existing symbol was kept under [`RedeclarePolicy::FirstWins`];
    /// the caller should emit a redeclare diagnostic.
    KeptExisting,
    Overwritten,
    KeptSilently,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    main: IndexMap<SmolStr, StSymbol>,
    css_vars: IndexMap<SmolStr, StSymbol>,
    keyframes: IndexMap<SmolStr, StSymbol>,
    layers: IndexMap<SmolStr, StSymbol>,
    containers: IndexMap<SmolStr, StSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, ns: SymbolNamespace) -> &IndexMap<SmolStr, StSymbol> {
        match ns {
            SymbolNamespace::Main => &self.main,
            SymbolNamespace::CssVar => &self.css_vars,
            SymbolNamespace::Keyframes => &self.keyframes,
            SymbolNamespace::Layer => &self.layers,
            SymbolNamespace::Container => &self.containers,
        }
    }

    fn bucket_mut(&mut self, ns: SymbolNamespace) -> &mut IndexMap<SmolStr, StSymbol> {
        match ns {
            SymbolNamespace::Main => &mut self.main,
            SymbolNamespace::CssVar => &mut self.css_vars,
            SymbolNamespace::Keyframes => &mut self.keyframes,
            SymbolNamespace::Layer => &mut self.layers,
            SymbolNamespace::Container => &mut self.containers,
        }
    }

    /// Insert a symbol into the namespace its kind belongs to.
    pub fn insert(&mut self, symbol: StSymbol, policy: RedeclarePolicy) -> InsertOutcome {
        let ns = symbol.kind().namespace();
        let name = symbol.name().clone();
        let bucket = self.bucket_mut(ns);
        if bucket.contains_key(&name) {
            match policy {
                RedeclarePolicy::FirstWins => InsertOutcome::KeptExisting,
                RedeclarePolicy::SafeRedeclare => InsertOutcome::KeptSilently,
                RedeclarePolicy::Overwrite => {
                    bucket.insert(name, symbol);
                    InsertOutcome::Overwritten
                }
            }
        } else {
            bucket.insert(name, symbol);
            InsertOutcome::Inserted
        }
    }

    /// Look up a symbol by name within a namespace.
    pub fn get(&self, name: &str, ns: SymbolNamespace) -> Option<&StSymbol> {
        self.bucket(ns).get(name)
    }

    /// Look up a symbol by name, returning `None` on kind mismatch.
    pub fn get_kind(&self, name: &str, kind: SymbolKind) -> Option<&StSymbol> {
        self.bucket(kind.namespace())
            .get(name)
            .filter(|s| s.kind() == kind)
    }

    pub fn get_mut(&mut self, name: &str, ns: SymbolNamespace) -> Option<&mut StSymbol> {
        self.bucket_mut(ns).get_mut(name)
    }

    /// All symbols in a namespace, in insertion order.
    pub fn all(&self, ns: SymbolNamespace) -> impl Iterator<Item = (&SmolStr, &StSymbol)> {
        self.bucket(ns).iter()
    }

    /// All symbols of one kind, in insertion order.
    pub fn all_of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = (&SmolStr, &StSymbol)> {
        self.bucket(kind.namespace())
            .iter()
            .filter(move |(_, s)| s.kind() == kind)
    }

    pub fn len(&self, ns: SymbolNamespace) -> usize {
        self.bucket(ns).len()
    }

    pub fn is_empty(&self, ns: SymbolNamespace) -> bool {
        self.bucket(ns).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{NodeId, empty_span};
    use crate::semantic::symbol::ImportRef;

    fn container(name: &str, global: bool) -> StSymbol {
        StSymbol::Container {
            name: name.into(),
            node: NodeId(0),
            span: empty_span(),
            global,
            import: None,
        }
    }

    #[test]
    fn first_definition_wins() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.insert(container("con", false), RedeclarePolicy::FirstWins),
            InsertOutcome::Inserted
        );
        assert_eq!(
            table.insert(container("con", true), RedeclarePolicy::FirstWins),
            InsertOutcome::KeptExisting
        );
        assert!(!table
            .get("con", SymbolNamespace::Container)
            .unwrap()
            .is_global());
    }

    #[test]
    fn overwrite_policy_replaces() {
        let mut table = SymbolTable::new();
        table.insert(container("con", false), RedeclarePolicy::FirstWins);
        assert_eq!(
            table.insert(container("con", true), RedeclarePolicy::Overwrite),
            InsertOutcome::Overwritten
        );
        assert!(table
            .get("con", SymbolNamespace::Container)
            .unwrap()
            .is_global());
    }

    #[test]
    fn namespaces_are_independent() {
        let mut table = SymbolTable::new();
        table.insert(container("shared", false), RedeclarePolicy::FirstWins);
        let layer = StSymbol::Layer {
            name: "shared".into(),
            node: NodeId(1),
            span: empty_span(),
            global: false,
            import: Some(ImportRef(0)),
        };
        assert_eq!(
            table.insert(layer, RedeclarePolicy::FirstWins),
            InsertOutcome::Inserted
        );
        assert!(table.get("shared", SymbolNamespace::Container).is_some());
        assert!(table.get("shared", SymbolNamespace::Layer).is_some());
    }

    #[test]
    fn kind_mismatch_returns_none() {
        let mut table = SymbolTable::new();
        table.insert(container("con", false), RedeclarePolicy::FirstWins);
        assert!(table.get_kind("con", SymbolKind::Container).is_some());
        assert!(table.get_kind("con", SymbolKind::Layer).is_none());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut table = SymbolTable::new();
        for name in ["c", "a", "b"] {
            table.insert(container(name, false), RedeclarePolicy::FirstWins);
        }
        let names: Vec<_> = table
            .all(SymbolNamespace::Container)
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
