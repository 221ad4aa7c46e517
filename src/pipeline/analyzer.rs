//! Analyze pass: a single top-down walk of the parsed tree.
//!
//! Each node is dispatched to every feature's matching analyze hook in
//! registration order. The walk reads the tree and writes only the
//! module metadata (symbols, imports, feature buckets, diagnostics).

use crate::base::NodeId;
use crate::css::ast::{Node, Root};
use crate::diagnostics::codes;
use crate::features::{AnalyzeContext, Ancestor, Ancestry, Feature, pseudo_block_kind};
use crate::semantic::meta::ModuleMeta;

/// Populate `meta` from `ast`. The tree is stored on the meta by the
/// caller afterwards; during the walk it stays immutable.
pub fn analyze(features: &[&dyn Feature], ast: &Root, meta: &mut ModuleMeta) {
    tracing::debug!(path = %meta.path, "analyze");
    for feature in features {
        feature.meta_init(meta);
    }

    let mut ctx = AnalyzeContext { meta };
    for error in &ast.errors {
        ctx.error(
            NodeId::SYNTHETIC,
            error.span,
            codes::CSS_PARSE_ERROR,
            error.message.clone(),
        );
    }

    let mut stack: Vec<Ancestor<'_>> = Vec::new();
    walk(&mut ctx, features, &ast.nodes, &mut stack);
}

fn walk<'w>(
    ctx: &mut AnalyzeContext<'_>,
    features: &[&dyn Feature],
    nodes: &'w [Node],
    stack: &mut Vec<Ancestor<'w>>,
) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                if pseudo_block_kind(&rule.selector).is_some() {
                    // the owning feature consumes the whole block
                    for feature in features {
                        feature.analyze_rule(ctx, rule, &Ancestry(&stack[..]));
                    }
                    continue;
                }
                for feature in features {
                    feature.analyze_rule(ctx, rule, &Ancestry(&stack[..]));
                }
                let list = crate::css::selector::parse_selector_list(&rule.selector);
                if list.selectors.is_empty() && !rule.selector.trim().is_empty() {
                    ctx.warning(
                        rule.id,
                        rule.span,
                        codes::INVALID_SELECTOR,
                        format!("unparsable selector \"{}\"", rule.selector),
                    );
                }
                dispatch_selector_nodes(ctx, features, rule, &Ancestry(&stack[..]), &list);
                stack.push(Ancestor::Rule(rule));
                walk(ctx, features, &rule.nodes, stack);
                stack.pop();
            }
            Node::AtRule(at) => {
                for feature in features {
                    feature.analyze_at_rule(ctx, at, &Ancestry(&stack[..]));
                }
                if let Some(body) = &at.body {
                    stack.push(Ancestor::AtRule(at));
                    walk(ctx, features, body, stack);
                    stack.pop();
                }
            }
            Node::Decl(decl) => {
                for feature in features {
                    feature.analyze_declaration(ctx, decl, &Ancestry(&stack[..]));
                }
            }
        }
    }
}

/// Dispatch every selector node to the features, descending into the
/// selector arguments of functional pseudo-classes (`:not(...)` etc.).
fn dispatch_selector_nodes(
    ctx: &mut AnalyzeContext<'_>,
    features: &[&dyn Feature],
    rule: &crate::css::ast::Rule,
    ancestry: &Ancestry<'_>,
    list: &crate::css::selector::SelectorList,
) {
    use crate::css::selector::SelectorNode;
    use crate::features::st_states::SELECTOR_FUNCTION_PSEUDOS;

    for selector in &list.selectors {
        for sel_node in &selector.nodes {
            for feature in features {
                feature.analyze_selector_node(ctx, sel_node, rule, ancestry);
            }
            if let SelectorNode::PseudoClass {
                name,
                arg: Some(arg),
            } = sel_node
                && SELECTOR_FUNCTION_PSEUDOS.contains(&name.as_str())
            {
                let inner = crate::css::selector::parse_selector_list(arg);
                dispatch_selector_nodes(ctx, features, rule, ancestry, &inner);
            }
        }
    }
}
