//! Build-time variables: the `:vars` block and `value()` references.
//!
//! Variables are evaluated during resolve (transitively, across
//! modules); `value()` calls in declaration values are expanded during
//! rewrite from the already-evaluated map of the module scope, so mixin
//! content picks up the mixin origin's variables.

use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::ast::Rule;
use crate::css::value::{ValueNode, serialize_value, tokenize_value, trim_spaces};
use crate::diagnostics::{Diagnostic, codes};
use crate::semantic::meta::SheetKind;
use crate::semantic::resolver::{ResolveOutcome, SymbolResolver};
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, Feature, ModuleExports, ModuleScope, NodeAction, PseudoBlock,
    ResolveContext, TransformContext, pseudo_block_kind,
};

pub struct StVars;

impl Feature for StVars {
    fn name(&self) -> &'static str {
        "st-vars"
    }

    fn analyze_rule(&self, ctx: &mut AnalyzeContext<'_>, rule: &Rule, ancestry: &Ancestry<'_>) {
        if pseudo_block_kind(&rule.selector) != Some(PseudoBlock::Vars)
            || ctx.meta.kind != SheetKind::StCss
        {
            return;
        }
        if ancestry.is_nested() {
            ctx.warning(
                rule.id,
                rule.span,
                codes::NO_VARS_IN_NESTED_SCOPE,
                ":vars cannot be used inside a rule; the block is ignored",
            );
            return;
        }
        for decl in rule.decls() {
            ctx.register(
                StSymbol::Var {
                    name: SmolStr::new(&decl.prop),
                    node: decl.id,
                    span: decl.span,
                    value: decl.value.clone(),
                },
                RedeclarePolicy::FirstWins,
            );
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        let meta = rctx.meta;
        let candidates: Vec<(SmolStr, NodeId, Span, SymbolKind)> = meta
            .symbols
            .all(SymbolNamespace::Main)
            .filter(|(_, sym)| matches!(sym.kind(), SymbolKind::Var | SymbolKind::Import))
            .map(|(name, sym)| (name.clone(), sym.node(), sym.span(), sym.kind()))
            .collect();
        for (name, node, span, kind) in candidates {
            if kind == SymbolKind::Import {
                // only imports that ultimately name a variable belong here;
                // dead imports are reported by the import feature
                let is_var = matches!(
                    rctx.resolver.deep_resolve(&meta.path, &name, SymbolNamespace::Main),
                    ResolveOutcome::Resolved(found) if matches!(found.symbol, StSymbol::Var { .. })
                );
                if !is_var {
                    continue;
                }
            }
            let mut issues = Vec::new();
            let mut stack = Vec::new();
            if let Some(value) = evaluate_var(
                rctx.resolver,
                &meta.path,
                &name,
                &mut stack,
                &mut issues,
                node,
                span,
            ) {
                rctx.maps.st_vars.insert(name, value);
            }
            for issue in issues {
                rctx.report(issue);
            }
        }
    }

    fn transform_declaration(
        &self,
        ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        decl: &mut crate::css::ast::Declaration,
    ) -> NodeAction {
        if scope.native || !decl.value.contains("value(") {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&decl.value);
        let expanded = expand_value_calls(&nodes, scope, ctx, decl.id, decl.span);
        decl.value = serialize_value(&expanded);
        NodeAction::Keep
    }

    fn transform_js_exports(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &crate::semantic::meta::ModuleMeta,
        exports: &mut ModuleExports,
    ) {
        for (name, sym) in meta.symbols.all_of_kind(SymbolKind::Var) {
            let StSymbol::Var { value, .. } = sym else {
                continue;
            };
            let exported = scope
                .maps
                .st_vars
                .get(name)
                .cloned()
                .unwrap_or_else(|| value.clone());
            exports.st_vars.insert(name.clone(), exported);
        }
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate a variable reference to its final text, following import
/// chains and expanding nested `value()` calls. A cycle or unknown
/// reference yields `None` plus a diagnostic for the caller to report.
pub(crate) fn evaluate_var(
    resolver: &mut SymbolResolver<'_>,
    from_path: &str,
    name: &str,
    stack: &mut Vec<(SmolStr, SmolStr)>,
    issues: &mut Vec<Diagnostic>,
    node: NodeId,
    span: Span,
) -> Option<String> {
    let (def_path, raw_value) =
        match resolver.deep_resolve(from_path, name, SymbolNamespace::Main) {
            ResolveOutcome::Resolved(found) => match found.symbol {
                StSymbol::Var { value, .. } => (found.meta.path.clone(), value.clone()),
                _ => {
                    issues.push(
                        Diagnostic::warning(node, span, format!("unknown variable \"{name}\""))
                            .with_code(codes::UNKNOWN_VAR)
                            .with_word(SmolStr::new(name)),
                    );
                    return None;
                }
            },
            _ => {
                issues.push(
                    Diagnostic::warning(node, span, format!("unknown variable \"{name}\""))
                        .with_code(codes::UNKNOWN_VAR)
                        .with_word(SmolStr::new(name)),
                );
                return None;
            }
        };

    let key = (def_path.clone(), SmolStr::new(name));
    if stack.contains(&key) {
        issues.push(
            Diagnostic::warning(node, span, format!("cyclic value reference \"{name}\""))
                .with_code(codes::CYCLIC_VALUE)
                .with_word(SmolStr::new(name)),
        );
        return None;
    }
    stack.push(key);
    let nodes = tokenize_value(&raw_value);
    let expanded = expand_nodes(&nodes, resolver, &def_path, stack, issues, node, span);
    stack.pop();
    Some(serialize_value(&expanded))
}

fn expand_nodes(
    nodes: &[ValueNode],
    resolver: &mut SymbolResolver<'_>,
    module_path: &str,
    stack: &mut Vec<(SmolStr, SmolStr)>,
    issues: &mut Vec<Diagnostic>,
    node: NodeId,
    span: Span,
) -> Vec<ValueNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for vnode in nodes {
        match vnode {
            ValueNode::Func { name, args } if name == "value" => {
                let target = value_call_target(args);
                let replacement = target.as_ref().and_then(|var| {
                    evaluate_var(resolver, module_path, var, stack, issues, node, span)
                });
                match replacement {
                    Some(text) => out.push(ValueNode::Ident(SmolStr::new(text))),
                    None => out.push(vnode.clone()),
                }
            }
            ValueNode::Func { name, args } => out.push(ValueNode::Func {
                name: name.clone(),
                args: expand_nodes(args, resolver, module_path, stack, issues, node, span),
            }),
            other => out.push(other.clone()),
        }
    }
    out
}

/// The variable name of a `value(<name>)` call.
fn value_call_target(args: &[ValueNode]) -> Option<SmolStr> {
    let compact = trim_spaces(args.to_vec());
    match compact.as_slice() {
        [ValueNode::Ident(name)] => Some(name.clone()),
        _ => None,
    }
}

/// Expand `value()` calls against an already-resolved module scope
/// (mixin overrides first, then the scope's evaluated variables).
fn expand_value_calls(
    nodes: &[ValueNode],
    scope: &ModuleScope,
    ctx: &mut TransformContext<'_>,
    node: NodeId,
    span: Span,
) -> Vec<ValueNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for vnode in nodes {
        match vnode {
            ValueNode::Func { name, args } if name == "value" => {
                let target = value_call_target(args);
                let replacement = target.as_ref().and_then(|var| {
                    lookup_scope_var(scope, var)
                });
                match replacement {
                    Some(text) => out.push(ValueNode::Ident(SmolStr::new(text))),
                    None => {
                        if let Some(var) = target {
                            ctx.diagnostics.add(
                                Diagnostic::warning(
                                    node,
                                    span,
                                    format!("unknown variable \"{var}\""),
                                )
                                .with_code(codes::UNKNOWN_VAR)
                                .with_word(var),
                            );
                        }
                        out.push(vnode.clone());
                    }
                }
            }
            ValueNode::Func { name, args } => out.push(ValueNode::Func {
                name: name.clone(),
                args: expand_value_calls(args, scope, ctx, node, span),
            }),
            other => out.push(other.clone()),
        }
    }
    out
}

pub(crate) fn lookup_scope_var(scope: &ModuleScope, name: &str) -> Option<String> {
    if let Some(overridden) = scope.var_overrides.get(name) {
        return Some(overridden.clone());
    }
    scope.maps.st_vars.get(name).cloned()
}
