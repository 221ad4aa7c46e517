//! Semantic model: symbols, per-module symbol table, module metadata,
//! and the cross-module import-chain resolver.

pub mod meta;
pub mod resolver;
pub mod symbol;
pub mod symbol_table;

pub use meta::{FeatureData, Imported, ModuleMeta, SheetKind};
pub use resolver::{ModuleGraph, ResolveOutcome, ResolvedSymbol, SymbolResolver};
pub use symbol::{
    ImportKind, ImportRef, StSymbol, StateDef, StateParam, SymbolKind, SymbolNamespace,
};
pub use symbol_table::{InsertOutcome, RedeclarePolicy, SymbolTable};
