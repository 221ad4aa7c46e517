//! `@keyframes` names, namespaced per module.

use crate::css::ast::{AtRule, Declaration};
use crate::css::value::{ValueNode, as_st_global, serialize_value, tokenize_value};
use crate::diagnostics::codes;
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, CSS_WIDE_KEYWORDS, Feature, ModuleExports, ModuleScope, NodeAction,
    ResolveContext, TransformContext, resolve_feature_symbols,
};

pub struct CssKeyframes;

const ANIMATION_PROPS: &[&str] = &["animation", "animation-name"];

impl Feature for CssKeyframes {
    fn name(&self) -> &'static str {
        "css-keyframes"
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, ancestry: &Ancestry<'_>) {
        if at.name != "keyframes" {
            return;
        }
        if ancestry.in_rule() {
            ctx.error(
                at.id,
                at.span,
                codes::ILLEGAL_KEYFRAMES_NESTING,
                "@keyframes cannot be nested inside a rule",
            );
            return;
        }
        let nodes = tokenize_value(&at.prelude);
        let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
        let (name, global) = match compact.as_slice() {
            [ValueNode::Ident(name)] => (name.clone(), false),
            [node @ ValueNode::Func { .. }] => match as_st_global(node) {
                Some(name) => (name, true),
                None => return,
            },
            _ => return,
        };
        if name == "none" || CSS_WIDE_KEYWORDS.contains(&name.as_str()) {
            ctx.error(
                at.id,
                at.span,
                codes::RESERVED_KEYFRAMES_NAME,
                format!("\"{name}\" is a reserved keyframes name"),
            );
            return;
        }
        ctx.register(
            StSymbol::Keyframes {
                name,
                node: at.id,
                span: at.span,
                global,
                import: None,
            },
            RedeclarePolicy::FirstWins,
        );
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        for (name, target) in resolve_feature_symbols(rctx, SymbolNamespace::Keyframes) {
            rctx.maps.keyframes.insert(name, target);
        }
    }

    fn transform_at_rule(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        if at.name != "keyframes" {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&at.prelude);
        let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
        let renamed = match compact.as_slice() {
            [ValueNode::Ident(name)] => scope
                .maps
                .keyframes
                .get(name.as_str())
                .map(|target| target.scoped()),
            [node @ ValueNode::Func { .. }] => as_st_global(node).map(|name| name.to_string()),
            _ => None,
        };
        if let Some(renamed) = renamed {
            at.prelude = renamed;
        }
        NodeAction::Keep
    }

    fn transform_declaration(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        decl: &mut Declaration,
    ) -> NodeAction {
        if !ANIMATION_PROPS.contains(&decl.prop.as_str()) {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&decl.value);
        let rewritten: Vec<ValueNode> = nodes
            .iter()
            .map(|node| match node {
                ValueNode::Ident(name) => match scope.maps.keyframes.get(name.as_str()) {
                    Some(target) => ValueNode::Ident(target.scoped().into()),
                    None => node.clone(),
                },
                other => other.clone(),
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
        for (name, _) in meta.symbols.all_of_kind(SymbolKind::Keyframes) {
            if let Some(target) = scope.maps.keyframes.get(name) {
                exports.keyframes.insert(name.clone(), target.scoped());
            }
        }
    }
}
