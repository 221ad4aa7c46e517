//! Feature framework.
//!
//! A feature is a static unit implementing a subset of the analyze and
//! transform hooks for one dialect construct. Features are registered in
//! one explicit ordered list ([`FEATURES`]); analyze hooks run in
//! registration order per node during a single top-down walk, and every
//! feature's `transform_resolve` runs before any rewrite hook so one
//! feature's resolution is available to another's rewrite.
//!
//! Side-effect contract: analyze hooks may mutate `meta.data` and
//! `meta.symbols` but never the AST; transform hooks mutate the cloned
//! tree and may remove nodes but never touch the symbol table.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::ast::{AtRule, Declaration, Rule};
use crate::css::selector::SelectorNode;
use crate::diagnostics::{Diagnostic, DiagnosticBag, codes};
use crate::semantic::meta::ModuleMeta;
use crate::semantic::resolver::{ModuleGraph, ResolveOutcome, SymbolResolver};
use crate::semantic::symbol::{StSymbol, StateDef, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::{InsertOutcome, RedeclarePolicy};

use indexmap::IndexMap;

pub mod css_container;
pub mod css_custom_property;
pub mod css_keyframes;
pub mod css_layer;
pub mod css_type;
pub mod st_class;
pub mod st_import;
pub mod st_mixin;
pub mod st_scope;
pub mod st_states;
pub mod st_vars;

/// CSS-wide keywords that are never valid feature identifiers.
pub const CSS_WIDE_KEYWORDS: &[&str] = &[
    "initial",
    "inherit",
    "unset",
    "revert",
    "revert-layer",
    "default",
];

/// The fixed feature registration order. Import first so later features
/// see import symbols; mixin last so it can consume every other
/// feature's resolution.
pub static FEATURES: &[&dyn Feature] = &[
    &st_import::StImport,
    &st_vars::StVars,
    &st_class::StClass,
    &css_type::CssType,
    &st_states::StStates,
    &css_custom_property::CssCustomProperty,
    &css_keyframes::CssKeyframes,
    &css_layer::CssLayer,
    &css_container::CssContainer,
    &st_scope::StScope,
    &st_mixin::StMixin,
];

// ============================================================================
// ANCESTRY
// ============================================================================

/// A node on the walk path above the current node.
#[derive(Clone, Copy)]
pub enum Ancestor<'w> {
    Rule(&'w Rule),
    AtRule(&'w AtRule),
}

/// The walk path above the current node, outermost first.
#[derive(Clone, Copy)]
pub struct Ancestry<'w>(pub &'w [Ancestor<'w>]);

impl<'w> Ancestry<'w> {
    pub const EMPTY: Ancestry<'static> = Ancestry(&[]);

    pub fn is_nested(&self) -> bool {
        !self.0.is_empty()
    }

    /// Whether any ancestor is a rule (as opposed to conditional at-rules).
    pub fn in_rule(&self) -> bool {
        self.0.iter().any(|a| matches!(a, Ancestor::Rule(_)))
    }

    pub fn nearest_rule(&self) -> Option<&'w Rule> {
        self.0.iter().rev().find_map(|a| match a {
            Ancestor::Rule(rule) => Some(*rule),
            Ancestor::AtRule(_) => None,
        })
    }
}

// ============================================================================
// CONTEXTS
// ============================================================================

/// Context handed to analyze hooks. The AST is walked separately and is
/// not reachable from here, which keeps the analyze pass read-only over
/// the tree by construction.
pub struct AnalyzeContext<'m> {
    pub meta: &'m mut ModuleMeta,
}

impl AnalyzeContext<'_> {
    pub fn error(&mut self, node: NodeId, span: Span, code: &'static str, message: impl Into<std::sync::Arc<str>>) {
        self.meta
            .diagnostics
            .add(Diagnostic::error(node, span, message).with_code(code));
    }

    pub fn warning(&mut self, node: NodeId, span: Span, code: &'static str, message: impl Into<std::sync::Arc<str>>) {
        self.meta
            .diagnostics
            .add(Diagnostic::warning(node, span, message).with_code(code));
    }

    pub fn info(&mut self, node: NodeId, span: Span, code: &'static str, message: impl Into<std::sync::Arc<str>>) {
        self.meta
            .diagnostics
            .add(Diagnostic::info(node, span, message).with_code(code));
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.meta.diagnostics.add(diagnostic);
    }

    /// Register a symbol, emitting the standard redeclare warning when an
    /// existing first definition wins.
    pub fn register(&mut self, symbol: StSymbol, policy: RedeclarePolicy) -> InsertOutcome {
        let name = symbol.name().clone();
        let node = symbol.node();
        let span = symbol.span();
        let outcome = self.meta.symbols.insert(symbol, policy);
        if outcome == InsertOutcome::KeptExisting {
            self.meta.diagnostics.add(
                Diagnostic::warning(node, span, format!("redeclare symbol \"{name}\""))
                    .with_code(codes::REDECLARE_SYMBOL)
                    .with_word(name),
            );
        }
        outcome
    }
}

/// Context for the resolve-all sub-phase: one feature resolving every
/// symbol it owns for one module. `diagnostics` is wired only when the
/// module is the entry of the current transform; dependency modules are
/// resolved silently (they report on their own compilation).
pub struct ResolveContext<'g, 'a> {
    pub meta: &'g ModuleMeta,
    pub resolver: &'a mut SymbolResolver<'g>,
    pub maps: &'a mut ResolvedMaps,
    pub diagnostics: Option<&'a mut DiagnosticBag>,
}

impl ResolveContext<'_, '_> {
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(bag) = self.diagnostics.as_deref_mut() {
            bag.add(diagnostic);
        }
    }
}

// ============================================================================
// RESOLVED SYMBOL MAPS
// ============================================================================

/// Where a name ultimately resolved: the defining module's namespace and
/// the symbol's name there. Every entry is reachable from the current
/// module by following import chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub path: SmolStr,
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub global: bool,
}

impl ResolvedTarget {
    /// The output identifier: `namespace__name`, or the bare name for
    /// globals.
    pub fn scoped(&self) -> String {
        if self.global {
            self.name.to_string()
        } else {
            scope_name(&self.namespace, &self.name)
        }
    }

    /// The output custom-property form: `--namespace-name`.
    pub fn scoped_css_var(&self) -> String {
        if self.global {
            format!("--{}", self.name)
        } else {
            scope_css_var(&self.namespace, &self.name)
        }
    }
}

/// One link in a class's `-st-extends` chain.
#[derive(Debug, Clone)]
pub struct ClassLink {
    pub path: SmolStr,
    pub namespace: SmolStr,
    pub name: SmolStr,
    /// False for element symbols, which render as a bare type name.
    pub is_class: bool,
    pub states: IndexMap<SmolStr, StateDef>,
    /// `-st-global` replacement selector, if the class declared one.
    pub global_selector: Option<String>,
    /// True when the defining module is native CSS (no namespacing).
    pub global_module: bool,
}

impl ClassLink {
    /// The selector fragment this link renders to.
    pub fn scoped_class(&self) -> String {
        if let Some(selector) = &self.global_selector {
            selector.clone()
        } else if !self.is_class {
            self.name.to_string()
        } else if self.global_module {
            format!(".{}", self.name)
        } else {
            format!(".{}", scope_name(&self.namespace, &self.name))
        }
    }

    /// The identifier used in the JS class export.
    pub fn export_name(&self) -> String {
        self.scoped_class().trim_start_matches('.').to_string()
    }
}

/// A class or element with its full extends chain, closest first.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub kind: SymbolKind,
    pub chain: Vec<ClassLink>,
}

impl ResolvedClass {
    pub fn subject(&self) -> &ClassLink {
        &self.chain[0]
    }
}

/// Per-module resolution output of the resolve-all sub-phase, consumed
/// by every rewrite hook (and by mixin expansion for origin modules).
#[derive(Debug, Default, Clone)]
pub struct ResolvedMaps {
    pub classes: FxHashMap<SmolStr, ResolvedClass>,
    pub elements: FxHashMap<SmolStr, ResolvedClass>,
    /// Build-time variables, fully evaluated.
    pub st_vars: FxHashMap<SmolStr, String>,
    pub css_vars: FxHashMap<SmolStr, ResolvedTarget>,
    pub keyframes: FxHashMap<SmolStr, ResolvedTarget>,
    pub layers: FxHashMap<SmolStr, ResolvedTarget>,
    pub containers: FxHashMap<SmolStr, ResolvedTarget>,
}

/// The module whose semantics apply to the node being rewritten. The
/// entry module for the main walk; the mixin's origin module while its
/// expanded content is processed.
#[derive(Clone)]
pub struct ModuleScope {
    pub path: SmolStr,
    pub namespace: SmolStr,
    pub native: bool,
    pub maps: Rc<ResolvedMaps>,
    /// Mixin argument overrides for `value()` expansion.
    pub var_overrides: FxHashMap<SmolStr, String>,
}

// ============================================================================
// TRANSFORM CONTEXT
// ============================================================================

/// What a rewrite hook decided about its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Keep,
    Remove,
}

/// Shared state of one transform pass over one entry module.
pub struct TransformContext<'g> {
    pub graph: ModuleGraph<'g>,
    pub resolver: SymbolResolver<'g>,
    pub features: &'static [&'static dyn Feature],
    pub entry: SmolStr,
    pub diagnostics: DiagnosticBag,
    /// Mixin expansion stack: (module path, mixin name).
    pub mixin_guard: Vec<(SmolStr, SmolStr)>,
    maps_cache: FxHashMap<SmolStr, Rc<ResolvedMaps>>,
}

impl<'g> TransformContext<'g> {
    pub fn new(
        graph: ModuleGraph<'g>,
        features: &'static [&'static dyn Feature],
        entry: impl Into<SmolStr>,
    ) -> Self {
        Self {
            graph,
            resolver: SymbolResolver::new(graph),
            features,
            entry: entry.into(),
            diagnostics: DiagnosticBag::new(),
            mixin_guard: Vec::new(),
            maps_cache: FxHashMap::default(),
        }
    }

    /// The module scope for `path`, building its resolved maps on first
    /// request. Returns `None` for modules missing from the graph.
    pub fn scope_for(&mut self, path: &str) -> Option<ModuleScope> {
        let meta = self.graph.meta(path)?;
        if !self.maps_cache.contains_key(path) {
            let maps = self.resolve_module(meta);
            self.maps_cache.insert(SmolStr::new(path), Rc::new(maps));
        }
        Some(ModuleScope {
            path: meta.path.clone(),
            namespace: meta.namespace.clone(),
            native: meta.kind == crate::semantic::meta::SheetKind::NativeCss,
            maps: Rc::clone(&self.maps_cache[path]),
            var_overrides: FxHashMap::default(),
        })
    }

    fn resolve_module(&mut self, meta: &'g ModuleMeta) -> ResolvedMaps {
        tracing::debug!(path = %meta.path, "transform_resolve");
        let is_entry = meta.path == self.entry;
        let mut maps = ResolvedMaps::default();
        for feature in self.features {
            let mut rctx = ResolveContext {
                meta,
                resolver: &mut self.resolver,
                maps: &mut maps,
                diagnostics: if is_entry {
                    Some(&mut self.diagnostics)
                } else {
                    None
                },
            };
            feature.transform_resolve(&mut rctx);
        }
        maps
    }
}

// ============================================================================
// EXPORTS
// ============================================================================

/// The per-file JS export table. Key order follows symbol insertion
/// order, which is part of the observable output contract.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleExports {
    pub classes: IndexMap<SmolStr, String>,
    pub st_vars: IndexMap<SmolStr, String>,
    pub vars: IndexMap<SmolStr, String>,
    pub keyframes: IndexMap<SmolStr, String>,
    pub layers: IndexMap<SmolStr, String>,
    pub containers: IndexMap<SmolStr, String>,
}

// ============================================================================
// FEATURE TRAIT
// ============================================================================

#[allow(unused_variables)]
pub trait Feature: Sync {
    fn name(&self) -> &'static str;

    /// Initialize this feature's private data bucket and implicit symbols.
    fn meta_init(&self, meta: &mut ModuleMeta) {}

    /// Called for every rule, including the `:import`/`:vars` pseudo
    /// blocks (whose bodies are otherwise not walked).
    fn analyze_rule(&self, ctx: &mut AnalyzeContext<'_>, rule: &Rule, ancestry: &Ancestry<'_>) {}

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, ancestry: &Ancestry<'_>) {}

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
    }

    fn analyze_selector_node(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        node: &SelectorNode,
        rule: &Rule,
        ancestry: &Ancestry<'_>,
    ) {
    }

    /// Resolve every symbol this feature owns for `rctx.meta`, recording
    /// results in `rctx.maps`.
    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {}

    fn transform_at_rule(
        &self,
        ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        NodeAction::Keep
    }

    fn transform_declaration(
        &self,
        ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        decl: &mut Declaration,
    ) -> NodeAction {
        NodeAction::Keep
    }

    fn transform_js_exports(
        &self,
        ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &ModuleMeta,
        exports: &mut ModuleExports,
    ) {
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// The deterministic namespacing join for identifiers.
pub fn scope_name(namespace: &str, name: &str) -> String {
    format!("{namespace}__{name}")
}

/// The deterministic namespacing join for custom properties.
pub fn scope_css_var(namespace: &str, name: &str) -> String {
    format!("--{namespace}-{name}")
}

/// The legacy pseudo blocks handled wholesale by a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoBlock {
    Import,
    Vars,
}

pub fn pseudo_block_kind(selector: &str) -> Option<PseudoBlock> {
    match selector.trim() {
        ":import" => Some(PseudoBlock::Import),
        ":vars" => Some(PseudoBlock::Vars),
        _ => None,
    }
}

/// The archetype resolve step shared by the container/layer/keyframes/
/// css-var features: for every symbol in `ns`, either record the local
/// definition or follow the import chain, warning on dead-ends.
pub fn resolve_feature_symbols(
    rctx: &mut ResolveContext<'_, '_>,
    ns: SymbolNamespace,
) -> Vec<(SmolStr, ResolvedTarget)> {
    let mut resolved = Vec::new();
    let meta = rctx.meta;
    let names: Vec<(SmolStr, NodeId, Span, bool)> = meta
        .symbols
        .all(ns)
        .map(|(name, sym)| (name.clone(), sym.node(), sym.span(), sym.import_ref().is_some()))
        .collect();
    let native = meta.kind == crate::semantic::meta::SheetKind::NativeCss;
    for (name, node, span, is_imported) in names {
        if !is_imported {
            let sym = meta.symbols.get(&name, ns).expect("symbol just listed");
            resolved.push((
                name.clone(),
                ResolvedTarget {
                    path: meta.path.clone(),
                    namespace: meta.namespace.clone(),
                    name: name.clone(),
                    global: sym.is_global() || native,
                },
            ));
            continue;
        }
        match rctx.resolver.deep_resolve(&meta.path, &name, ns) {
            ResolveOutcome::Resolved(found) => {
                let def_native =
                    found.meta.kind == crate::semantic::meta::SheetKind::NativeCss;
                resolved.push((
                    name.clone(),
                    ResolvedTarget {
                        path: found.meta.path.clone(),
                        namespace: found.meta.namespace.clone(),
                        name: found.symbol.name().clone(),
                        global: found.symbol.is_global() || def_native,
                    },
                ));
            }
            // the import feature reports unknown files once per statement
            ResolveOutcome::UnknownFile { .. } => {}
            ResolveOutcome::UnknownSymbol { file, name: origin } => {
                rctx.report(
                    Diagnostic::warning(
                        node,
                        span,
                        format!("cannot resolve imported symbol \"{origin}\" in \"{file}\""),
                    )
                    .with_code(codes::UNKNOWN_IMPORTED_SYMBOL)
                    .with_word(origin),
                );
            }
            ResolveOutcome::NotFound => {}
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespacing_joins_are_deterministic() {
        assert_eq!(scope_name("entry", "con"), "entry__con");
        assert_eq!(scope_css_var("entry", "a"), "--entry-a");
    }

    #[test]
    fn pseudo_blocks_are_detected() {
        assert_eq!(pseudo_block_kind(":import"), Some(PseudoBlock::Import));
        assert_eq!(pseudo_block_kind(" :vars "), Some(PseudoBlock::Vars));
        assert_eq!(pseudo_block_kind(".a"), None);
        assert_eq!(pseudo_block_kind(":importx"), None);
    }

    #[test]
    fn feature_order_starts_with_import_and_ends_with_mixin() {
        assert_eq!(FEATURES.first().map(|f| f.name()), Some("st-import"));
        assert_eq!(FEATURES.last().map(|f| f.name()), Some("st-mixin"));
    }
}
