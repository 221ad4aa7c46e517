//! Type-selector feature: element symbol registration and resolution.
//!
//! Component-like type selectors (capitalized, by convention) register
//! element symbols so states declared on them resolve; imported names
//! used as type selectors are rewritten by the selector scoping pass via
//! the class maps.

use smol_str::SmolStr;

use crate::css::ast::Rule;
use crate::css::selector::SelectorNode;
use crate::diagnostics::codes;
use crate::semantic::meta::SheetKind;
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{AnalyzeContext, Ancestry, ClassLink, Feature, ResolveContext, ResolvedClass};

pub struct CssType;

impl Feature for CssType {
    fn name(&self) -> &'static str {
        "css-type"
    }

    fn analyze_selector_node(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        node: &SelectorNode,
        rule: &Rule,
        _ancestry: &Ancestry<'_>,
    ) {
        if ctx.meta.kind != SheetKind::StCss {
            return;
        }
        let SelectorNode::Type(name) = node else {
            return;
        };
        let component_like = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        let known = ctx.meta.symbols.get(name, SymbolNamespace::Main).is_some();
        if !component_like && !known {
            // plain html tags pass through untouched
            return;
        }
        if component_like && !known {
            ctx.info(
                rule.id,
                rule.span,
                codes::UNSCOPED_TYPE_SELECTOR,
                format!("component selector \"{name}\" is not imported"),
            );
        }
        ctx.register(
            StSymbol::Element {
                name: name.clone(),
                node: rule.id,
                span: rule.span,
                states: Default::default(),
            },
            RedeclarePolicy::SafeRedeclare,
        );
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        let meta = rctx.meta;
        let elements: Vec<SmolStr> = meta
            .symbols
            .all_of_kind(SymbolKind::Element)
            .map(|(name, _)| name.clone())
            .collect();
        for name in elements {
            let Some(StSymbol::Element { states, .. }) =
                meta.symbols.get(&name, SymbolNamespace::Main)
            else {
                continue;
            };
            rctx.maps.elements.insert(
                name.clone(),
                ResolvedClass {
                    kind: SymbolKind::Element,
                    chain: vec![ClassLink {
                        path: meta.path.clone(),
                        namespace: meta.namespace.clone(),
                        name: name.clone(),
                        is_class: false,
                        states: states.clone(),
                        global_selector: None,
                        global_module: meta.kind == SheetKind::NativeCss,
                    }],
                },
            );
        }
    }
}
