//! `@layer` names, namespaced per module. Dotted names (`base.controls`)
//! are resolved segment by segment; `@import ... layer(name)` preludes
//! participate too.

use smol_str::SmolStr;

use crate::css::ast::AtRule;
use crate::css::value::{
    ValueNode, as_st_global, serialize_value, split_commas, split_dotted, tokenize_value,
};
use crate::diagnostics::codes;
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, CSS_WIDE_KEYWORDS, Feature, ModuleExports, ModuleScope, NodeAction,
    ResolveContext, TransformContext, resolve_feature_symbols,
};

pub struct CssLayer;

impl Feature for CssLayer {
    fn name(&self) -> &'static str {
        "css-layer"
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, _ancestry: &Ancestry<'_>) {
        match at.name.as_str() {
            "layer" => {
                let nodes = tokenize_value(&at.prelude);
                for segment in split_commas(&nodes) {
                    let compact: Vec<&ValueNode> =
                        segment.iter().filter(|n| !n.is_space()).collect();
                    match compact.as_slice() {
                        [ValueNode::Ident(name)] => {
                            for part in split_dotted(name) {
                                self.register_layer(ctx, at, &part, false);
                            }
                        }
                        [node @ ValueNode::Func { .. }] => {
                            if let Some(name) = as_st_global(node) {
                                self.register_layer(ctx, at, &name, true);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import" => {
                for name in import_layer_names(&at.prelude) {
                    self.register_layer(ctx, at, &name, false);
                }
            }
            _ => {}
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        for (name, target) in resolve_feature_symbols(rctx, SymbolNamespace::Layer) {
            rctx.maps.layers.insert(name, target);
        }
    }

    fn transform_at_rule(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        match at.name.as_str() {
            "layer" => {
                let nodes = tokenize_value(&at.prelude);
                let rewritten: Vec<Vec<ValueNode>> = split_commas(&nodes)
                    .iter()
                    .map(|segment| {
                        let compact: Vec<&ValueNode> =
                            segment.iter().filter(|n| !n.is_space()).collect();
                        match compact.as_slice() {
                            [ValueNode::Ident(name)] => {
                                vec![ValueNode::Ident(scope_dotted(scope, name))]
                            }
                            [node @ ValueNode::Func { .. }] => match as_st_global(node) {
                                Some(name) => vec![ValueNode::Ident(name)],
                                None => segment.clone(),
                            },
                            _ => segment.clone(),
                        }
                    })
                    .collect();
                let mut out: Vec<ValueNode> = Vec::new();
                for (i, segment) in rewritten.into_iter().enumerate() {
                    if i > 0 {
                        out.push(ValueNode::Comma);
                        out.push(ValueNode::Space);
                    }
                    out.extend(segment);
                }
                at.prelude = serialize_value(&out);
                NodeAction::Keep
            }
            "import" => {
                let nodes = tokenize_value(&at.prelude);
                let rewritten: Vec<ValueNode> = nodes
                    .iter()
                    .map(|node| match node {
                        ValueNode::Func { name, args } if name == "layer" => {
                            let args = args
                                .iter()
                                .map(|arg| match arg {
                                    ValueNode::Ident(layer) => {
                                        ValueNode::Ident(scope_dotted(scope, layer))
                                    }
                                    other => other.clone(),
                                })
                                .collect();
                            ValueNode::Func {
                                name: name.clone(),
                                args,
                            }
                        }
                        other => other.clone(),
                    })
                    .collect();
                at.prelude = serialize_value(&rewritten);
                NodeAction::Keep
            }
            _ => NodeAction::Keep,
        }
    }

    fn transform_js_exports(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &crate::semantic::meta::ModuleMeta,
        exports: &mut ModuleExports,
    ) {
        for (name, _) in meta.symbols.all_of_kind(SymbolKind::Layer) {
            if let Some(target) = scope.maps.layers.get(name) {
                exports.layers.insert(name.clone(), target.scoped());
            }
        }
    }
}

impl CssLayer {
    fn register_layer(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, name: &str, global: bool) {
        if CSS_WIDE_KEYWORDS.contains(&name) || name == "none" {
            ctx.error(
                at.id,
                at.span,
                codes::RESERVED_LAYER_NAME,
                format!("\"{name}\" is a reserved layer name"),
            );
            return;
        }
        // re-opening a layer is a forced redefinition, not a conflict;
        // an imported binding stays authoritative
        let policy = match ctx.meta.symbols.get(name, SymbolNamespace::Layer) {
            Some(existing) if existing.import_ref().is_some() => RedeclarePolicy::SafeRedeclare,
            _ => RedeclarePolicy::Overwrite,
        };
        ctx.register(
            StSymbol::Layer {
                name: SmolStr::new(name),
                node: at.id,
                span: at.span,
                global,
                import: None,
            },
            policy,
        );
    }
}

/// Scope every segment of a (possibly dotted) layer name.
fn scope_dotted(scope: &ModuleScope, name: &str) -> SmolStr {
    let scoped: Vec<String> = split_dotted(name)
        .iter()
        .map(|part| match scope.maps.layers.get(part.as_str()) {
            Some(target) => target.scoped(),
            None => part.clone(),
        })
        .collect();
    SmolStr::new(scoped.join("."))
}

/// Layer names referenced from an `@import` prelude.
fn import_layer_names(prelude: &str) -> Vec<SmolStr> {
    tokenize_value(prelude)
        .iter()
        .filter_map(|node| match node {
            ValueNode::Func { name, args } if name == "layer" => {
                args.iter().find_map(|arg| match arg {
                    ValueNode::Ident(layer) => Some(layer.clone()),
                    _ => None,
                })
            }
            _ => None,
        })
        .collect()
}
