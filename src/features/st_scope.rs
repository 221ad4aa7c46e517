//! `@st-scope`: scopes every nested rule under a selector prefix.
//!
//! Analysis validates the wrapper; the transformer unwraps it and
//! prefixes the nested rules' selectors with the transformed scoping
//! selector.

use crate::css::ast::{AtRule, Node};
use crate::css::selector::{SelectorNode, parse_selector_list};
use crate::diagnostics::codes;
use crate::semantic::meta::SheetKind;
use crate::semantic::symbol::StSymbol;
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{AnalyzeContext, Ancestry, Feature};

pub struct StScope;

impl Feature for StScope {
    fn name(&self) -> &'static str {
        "st-scope"
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, ancestry: &Ancestry<'_>) {
        if at.name != "st-scope" || ctx.meta.kind != SheetKind::StCss {
            return;
        }
        if ancestry.is_nested() {
            ctx.warning(
                at.id,
                at.span,
                codes::MISSING_SCOPING_SELECTOR,
                "@st-scope must be a top-level statement",
            );
        }
        if at.prelude.trim().is_empty() {
            ctx.error(
                at.id,
                at.span,
                codes::MISSING_SCOPING_SELECTOR,
                "@st-scope requires a scoping selector",
            );
        }
        // the scoping selector itself defines symbols (the walk only
        // reaches the wrapper's body)
        for selector in parse_selector_list(&at.prelude).selectors {
            for node in selector.nodes {
                match node {
                    SelectorNode::Class(name) => {
                        ctx.register(
                            StSymbol::Class {
                                name,
                                node: at.id,
                                span: at.span,
                                global_selector: None,
                                extends: None,
                                states: Default::default(),
                            },
                            RedeclarePolicy::SafeRedeclare,
                        );
                    }
                    SelectorNode::Type(name)
                        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) =>
                    {
                        ctx.register(
                            StSymbol::Element {
                                name,
                                node: at.id,
                                span: at.span,
                                states: Default::default(),
                            },
                            RedeclarePolicy::SafeRedeclare,
                        );
                    }
                    _ => {}
                }
            }
        }
        for node in at.body.iter().flatten() {
            if let Node::Decl(decl) = node {
                ctx.error(
                    decl.id,
                    decl.span,
                    codes::ILLEGAL_SCOPE_DECLARATION,
                    "declarations are not allowed directly inside @st-scope",
                );
            }
        }
    }
}
