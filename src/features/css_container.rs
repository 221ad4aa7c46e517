//! `@container` and the `container`/`container-name` properties,
//! namespaced per module.
//!
//! A statement `@container name;` with no block is a pure definition: it
//! registers the name and is removed from the output entirely.

use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::ast::{AtRule, Declaration};
use crate::css::value::{ValueNode, as_st_global, serialize_value, tokenize_value};
use crate::diagnostics::{Diagnostic, codes};
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, CSS_WIDE_KEYWORDS, Feature, ModuleExports, ModuleScope, NodeAction,
    ResolveContext, TransformContext,
};

pub struct CssContainer;

const LOGICAL_KEYWORDS: &[&str] = &["and", "or", "not"];
const CONTAINER_TYPES: &[&str] = &["normal", "size", "inline-size"];

impl Feature for CssContainer {
    fn name(&self) -> &'static str {
        "css-container"
    }

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        _ancestry: &Ancestry<'_>,
    ) {
        match decl.prop.as_str() {
            "container-name" => {
                let nodes = tokenize_value(&decl.value);
                self.register_names(ctx, &nodes, decl.id, decl.span, RedeclarePolicy::SafeRedeclare);
            }
            "container" => {
                let nodes = tokenize_value(&decl.value);
                let slash = nodes.iter().position(|n| matches!(n, ValueNode::Slash));
                let names = match slash {
                    Some(idx) => &nodes[..idx],
                    None => &nodes[..],
                };
                self.register_names(ctx, names, decl.id, decl.span, RedeclarePolicy::SafeRedeclare);
                if let Some(idx) = slash {
                    self.validate_shorthand_type(ctx, &nodes[idx + 1..], decl.id, decl.span);
                }
            }
            _ => {}
        }
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, _ancestry: &Ancestry<'_>) {
        if at.name != "container" {
            return;
        }
        let nodes = tokenize_value(&at.prelude);
        if at.body.is_none() && is_pure_definition(&nodes) {
            // an explicit statement definition overrides earlier ones
            self.register_names(ctx, &nodes, at.id, at.span, RedeclarePolicy::Overwrite);
            return;
        }
        // usage form: only validate the queried name
        if let Some(ValueNode::Ident(name)) = nodes.iter().find(|n| !n.is_space())
            && is_reserved_container_name(name)
        {
            ctx.error(
                at.id,
                at.span,
                codes::RESERVED_CONTAINER_NAME,
                format!("\"{name}\" is a reserved container name"),
            );
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        for (name, target) in super::resolve_feature_symbols(rctx, SymbolNamespace::Container) {
            rctx.maps.containers.insert(name, target);
        }
    }

    fn transform_at_rule(
        &self,
        ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        if at.name != "container" || scope.native {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&at.prelude);
        if at.body.is_none() && is_pure_definition(&nodes) {
            // definitions never reach the output
            return NodeAction::Remove;
        }
        // rewrite the queried container name (the first identifier)
        let mut rewritten = Vec::with_capacity(nodes.len());
        let mut renamed = false;
        for node in &nodes {
            match node {
                ValueNode::Ident(name) if !renamed => {
                    renamed = true;
                    match scope.maps.containers.get(name.as_str()) {
                        Some(target) => rewritten.push(ValueNode::Ident(target.scoped().into())),
                        None => {
                            ctx.diagnostics.add(
                                Diagnostic::error(
                                    at.id,
                                    at.span,
                                    format!("unresolved container name \"{name}\""),
                                )
                                .with_code(codes::UNRESOLVED_CONTAINER_NAME)
                                .with_word(name.clone()),
                            );
                            rewritten.push(node.clone());
                        }
                    }
                }
                node @ ValueNode::Func { .. } if !renamed && as_st_global(node).is_some() => {
                    renamed = true;
                    let name = as_st_global(node).expect("checked st-global");
                    rewritten.push(ValueNode::Ident(name));
                }
                // `@container name(...)` with no space before the query
                ValueNode::Func { name, args } if !renamed => {
                    renamed = true;
                    match scope.maps.containers.get(name.as_str()) {
                        Some(target) => rewritten.push(ValueNode::Func {
                            name: target.scoped().into(),
                            args: args.clone(),
                        }),
                        None => {
                            ctx.diagnostics.add(
                                Diagnostic::error(
                                    at.id,
                                    at.span,
                                    format!("unresolved container name \"{name}\""),
                                )
                                .with_code(codes::UNRESOLVED_CONTAINER_NAME)
                                .with_word(name.clone()),
                            );
                            rewritten.push(node.clone());
                        }
                    }
                }
                _ => rewritten.push(node.clone()),
            }
        }
        at.prelude = serialize_value(&rewritten);
        NodeAction::Keep
    }

    fn transform_declaration(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        decl: &mut Declaration,
    ) -> NodeAction {
        if !matches!(decl.prop.as_str(), "container" | "container-name") || scope.native {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&decl.value);
        let mut past_slash = false;
        let rewritten: Vec<ValueNode> = nodes
            .iter()
            .map(|node| match node {
                ValueNode::Slash => {
                    past_slash = true;
                    node.clone()
                }
                ValueNode::Ident(name) if !past_slash && name != "none" => {
                    match scope.maps.containers.get(name.as_str()) {
                        Some(target) => ValueNode::Ident(target.scoped().into()),
                        None => node.clone(),
                    }
                }
                node @ ValueNode::Func { .. } if !past_slash => match as_st_global(node) {
                    Some(name) => ValueNode::Ident(name),
                    None => node.clone(),
                },
                _ => node.clone(),
            })
            .collect();
        decl.value = serialize_value(&rewritten);
        NodeAction::Keep
    }

    fn transform_js_exports(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &crate::semantic::meta::ModuleMeta,
        exports: &mut ModuleExports,
    ) {
        for (name, _) in meta.symbols.all_of_kind(SymbolKind::Container) {
            if let Some(target) = scope.maps.containers.get(name) {
                exports.containers.insert(name.clone(), target.scoped());
            }
        }
    }
}

impl CssContainer {
    fn register_names(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        nodes: &[ValueNode],
        node: NodeId,
        span: Span,
        policy: RedeclarePolicy,
    ) {
        for vnode in nodes {
            match vnode {
                ValueNode::Ident(name) => {
                    // the keyword `none` is never a container name
                    if name == "none" {
                        continue;
                    }
                    if is_reserved_container_name(name) {
                        ctx.error(
                            node,
                            span,
                            codes::RESERVED_CONTAINER_NAME,
                            format!("\"{name}\" is a reserved container name"),
                        );
                        continue;
                    }
                    self.register(ctx, name.clone(), node, span, false, policy);
                }
                fn_node @ ValueNode::Func { .. } => {
                    if let Some(name) = as_st_global(fn_node) {
                        self.register(ctx, name, node, span, true, policy);
                    }
                }
                _ => {}
            }
        }
    }

    fn register(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        name: SmolStr,
        node: NodeId,
        span: Span,
        global: bool,
        policy: RedeclarePolicy,
    ) {
        // an imported binding stays authoritative over local redefinition
        let policy = match ctx.meta.symbols.get(&name, SymbolNamespace::Container) {
            Some(existing) if existing.import_ref().is_some() => RedeclarePolicy::SafeRedeclare,
            _ => policy,
        };
        ctx.register(
            StSymbol::Container {
                name,
                node,
                span,
                global,
                import: None,
            },
            policy,
        );
    }

    fn validate_shorthand_type(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        nodes: &[ValueNode],
        node: NodeId,
        span: Span,
    ) {
        let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
        match compact.as_slice() {
            [] => ctx.error(
                node,
                span,
                codes::MISSING_CONTAINER_TYPE,
                "expected a container type after \"/\"",
            ),
            [ValueNode::Ident(ty)] if CONTAINER_TYPES.contains(&ty.as_str()) => {}
            [ValueNode::Ident(ty)] => ctx.error(
                node,
                span,
                codes::UNKNOWN_CONTAINER_TYPE,
                format!("unknown container type \"{ty}\""),
            ),
            _ => ctx.error(
                node,
                span,
                codes::UNKNOWN_CONTAINER_TYPE,
                "expected a single container type keyword",
            ),
        }
    }
}

fn is_reserved_container_name(name: &str) -> bool {
    LOGICAL_KEYWORDS.contains(&name) || CSS_WIDE_KEYWORDS.contains(&name)
}

/// A prelude consisting only of identifiers (no query condition).
fn is_pure_definition(nodes: &[ValueNode]) -> bool {
    let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
    !compact.is_empty()
        && compact.iter().all(|&n| {
            matches!(n, ValueNode::Ident(_)) || as_st_global(n).is_some()
        })
}
