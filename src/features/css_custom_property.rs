//! CSS custom properties: `--name` declarations, `var()` references and
//! `@property` registrations, namespaced per module.

use smol_str::SmolStr;

use crate::css::ast::{AtRule, Declaration};
use crate::css::value::{ValueNode, as_st_global, serialize_value, tokenize_value};
use crate::diagnostics::codes;
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, Feature, ModuleExports, ModuleScope, NodeAction, ResolveContext,
    TransformContext, resolve_feature_symbols, scope_css_var,
};

pub struct CssCustomProperty;

const REQUIRED_DESCRIPTORS: &[&str] = &["syntax", "inherits"];

impl Feature for CssCustomProperty {
    fn name(&self) -> &'static str {
        "css-custom-property"
    }

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        _ancestry: &Ancestry<'_>,
    ) {
        if let Some(name) = decl.prop.strip_prefix("--") {
            ctx.register(
                StSymbol::CssVar {
                    name: SmolStr::new(name),
                    node: decl.id,
                    span: decl.span,
                    global: false,
                    import: None,
                },
                RedeclarePolicy::SafeRedeclare,
            );
        }
        // usage sites count as definitions so bare references still scope
        for reference in var_references(&decl.value) {
            ctx.register(
                StSymbol::CssVar {
                    name: reference,
                    node: decl.id,
                    span: decl.span,
                    global: false,
                    import: None,
                },
                RedeclarePolicy::SafeRedeclare,
            );
        }
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, _ancestry: &Ancestry<'_>) {
        if at.name != "property" {
            return;
        }
        let nodes = tokenize_value(&at.prelude);
        let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
        let (raw_name, global) = match compact.as_slice() {
            [ValueNode::Ident(name)] => (name.clone(), false),
            [node @ ValueNode::Func { .. }] => match as_st_global(node) {
                Some(name) => (name, true),
                None => {
                    ctx.error(
                        at.id,
                        at.span,
                        codes::ILLEGAL_PROPERTY_NAME,
                        format!("invalid @property name \"{}\"", at.prelude),
                    );
                    return;
                }
            },
            _ => {
                ctx.error(
                    at.id,
                    at.span,
                    codes::ILLEGAL_PROPERTY_NAME,
                    format!("invalid @property name \"{}\"", at.prelude),
                );
                return;
            }
        };
        let Some(name) = raw_name.strip_prefix("--") else {
            ctx.error(
                at.id,
                at.span,
                codes::ILLEGAL_PROPERTY_NAME,
                format!("@property name \"{raw_name}\" must start with \"--\""),
            );
            return;
        };

        // explicit registration overrides an earlier implicit one
        ctx.register(
            StSymbol::CssVar {
                name: SmolStr::new(name),
                node: at.id,
                span: at.span,
                global,
                import: None,
            },
            RedeclarePolicy::Overwrite,
        );

        self.validate_descriptors(ctx, at);
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        for (name, target) in resolve_feature_symbols(rctx, SymbolNamespace::CssVar) {
            rctx.maps.css_vars.insert(name, target);
        }
    }

    fn transform_at_rule(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        if at.name != "property" {
            return NodeAction::Keep;
        }
        let nodes = tokenize_value(&at.prelude);
        let compact: Vec<&ValueNode> = nodes.iter().filter(|n| !n.is_space()).collect();
        let renamed = match compact.as_slice() {
            [ValueNode::Ident(name)] => name
                .strip_prefix("--")
                .and_then(|n| scope.maps.css_vars.get(n))
                .map(|target| target.scoped_css_var()),
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
        if let Some(name) = decl.prop.strip_prefix("--")
            && let Some(target) = scope.maps.css_vars.get(name)
        {
            decl.prop = target.scoped_css_var();
        }
        if decl.value.contains("var(") {
            let nodes = tokenize_value(&decl.value);
            decl.value = serialize_value(&rewrite_var_calls(&nodes, scope));
        }
        NodeAction::Keep
    }

    fn transform_js_exports(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &crate::semantic::meta::ModuleMeta,
        exports: &mut ModuleExports,
    ) {
        for (name, _) in meta.symbols.all_of_kind(SymbolKind::CssVar) {
            if let Some(target) = scope.maps.css_vars.get(name) {
                exports.vars.insert(name.clone(), target.scoped_css_var());
            }
        }
    }
}

impl CssCustomProperty {
    fn validate_descriptors(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule) {
        let Some(body) = &at.body else {
            ctx.warning(
                at.id,
                at.span,
                codes::MISSING_PROPERTY_DESCRIPTOR,
                "@property requires a descriptor block",
            );
            return;
        };
        let mut syntax_value: Option<String> = None;
        let mut seen: Vec<&str> = Vec::new();
        for node in body {
            if let crate::css::ast::Node::Decl(decl) = node {
                if decl.prop == "syntax" {
                    syntax_value = Some(decl.value.trim().trim_matches('"').to_string());
                }
                seen.push(decl.prop.as_str());
            }
        }
        for descriptor in REQUIRED_DESCRIPTORS {
            if !seen.contains(descriptor) {
                ctx.warning(
                    at.id,
                    at.span,
                    codes::MISSING_PROPERTY_DESCRIPTOR,
                    format!("@property is missing the \"{descriptor}\" descriptor"),
                );
            }
        }
        let universal_syntax = syntax_value.as_deref() == Some("*");
        if !universal_syntax && !seen.contains(&"initial-value") {
            ctx.warning(
                at.id,
                at.span,
                codes::MISSING_PROPERTY_DESCRIPTOR,
                "@property with a non-universal syntax requires an \"initial-value\" descriptor",
            );
        }
    }
}

/// Custom property names referenced via `var()` in a value.
fn var_references(value: &str) -> Vec<SmolStr> {
    if !value.contains("var(") {
        return Vec::new();
    }
    let mut refs = Vec::new();
    collect_var_refs(&tokenize_value(value), &mut refs);
    refs
}

fn collect_var_refs(nodes: &[ValueNode], refs: &mut Vec<SmolStr>) {
    for node in nodes {
        match node {
            ValueNode::Func { name, args } if name == "var" => {
                if let Some(ValueNode::Ident(first)) =
                    args.iter().find(|n| !n.is_space())
                    && let Some(var_name) = first.strip_prefix("--")
                {
                    refs.push(SmolStr::new(var_name));
                }
                collect_var_refs(args, refs);
            }
            ValueNode::Func { args, .. } | ValueNode::Paren(args) | ValueNode::Bracket(args) => {
                collect_var_refs(args, refs)
            }
            _ => {}
        }
    }
}

fn rewrite_var_calls(nodes: &[ValueNode], scope: &ModuleScope) -> Vec<ValueNode> {
    nodes
        .iter()
        .map(|node| match node {
            ValueNode::Func { name, args } if name == "var" => {
                let mut args = rewrite_var_calls(args, scope);
                if let Some(first) = args.iter_mut().find(|n| !n.is_space())
                    && let ValueNode::Ident(ident) = first
                    && let Some(var_name) = ident.strip_prefix("--")
                {
                    let renamed = scope
                        .maps
                        .css_vars
                        .get(var_name)
                        .map(|target| target.scoped_css_var())
                        .unwrap_or_else(|| scope_css_var(&scope.namespace, var_name));
                    if !scope.native {
                        *ident = SmolStr::new(renamed);
                    }
                }
                ValueNode::Func {
                    name: name.clone(),
                    args,
                }
            }
            ValueNode::Func { name, args } => ValueNode::Func {
                name: name.clone(),
                args: rewrite_var_calls(args, scope),
            },
            other => other.clone(),
        })
        .collect()
}
