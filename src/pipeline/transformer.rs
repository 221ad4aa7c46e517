//! Transform pass: clone the analyzed tree, resolve every feature's
//! symbols, rewrite the clone, and assemble the JS export table.
//!
//! The pass has two sub-phases: resolve-all (every feature's
//! `transform_resolve`, memoized per module so mixin origins reuse it)
//! and rewrite-all (selector scoping, declaration and at-rule rewriting,
//! node removal, `@st-scope` unwrapping, mixin expansion).

use crate::base::{NodeId, Span};
use crate::css::ast::{AtRule, Node, Root};
use crate::css::selector::{
    Selector, SelectorNode, parse_selector_list, split_top_level_commas,
};
use crate::diagnostics::{Diagnostic, DiagnosticBag, codes};
use crate::features::st_mixin;
use crate::features::st_states::{
    SELECTOR_FUNCTION_PSEUDOS, is_native_pseudo, render_state_usage,
};
use crate::features::{
    Feature, ModuleExports, ModuleScope, NodeAction, ResolvedClass, TransformContext,
    pseudo_block_kind,
};
use crate::semantic::resolver::ModuleGraph;
use crate::semantic::symbol::StateDef;

/// Result of transforming one entry module.
pub struct TransformOutput {
    pub target: Root,
    pub exports: ModuleExports,
    pub diagnostics: DiagnosticBag,
}

/// Transform the module at `entry`. Returns `None` when the module is
/// not present in the graph (the facade analyzes before transforming).
pub fn transform(
    graph: ModuleGraph<'_>,
    features: &'static [&'static dyn Feature],
    entry: &str,
) -> Option<TransformOutput> {
    let meta = graph.meta(entry)?;
    tracing::debug!(path = %entry, "transform");
    let mut ctx = TransformContext::new(graph, features, entry);
    let scope = ctx.scope_for(entry)?;

    let mut target = meta.ast.clone();
    transform_nodes(&mut ctx, &scope, &mut target.nodes, true);

    let mut exports = ModuleExports::default();
    for feature in features {
        feature.transform_js_exports(&mut ctx, &scope, meta, &mut exports);
    }

    Some(TransformOutput {
        target,
        exports,
        diagnostics: ctx.diagnostics,
    })
}

/// Rewrite a node list in place. `scope_selectors` is off inside
/// `@keyframes` bodies, where frame selectors (`from`, `50%`) are not
/// scopable.
pub(crate) fn transform_nodes(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    nodes: &mut Vec<Node>,
    scope_selectors: bool,
) {
    let features = ctx.features;
    let mut i = 0;
    while i < nodes.len() {
        match &nodes[i] {
            Node::Rule(_) => {
                let (remove, siblings) = {
                    let Node::Rule(rule) = &mut nodes[i] else {
                        unreachable!()
                    };
                    if pseudo_block_kind(&rule.selector).is_some() {
                        // :import / :vars never reach the output
                        (true, Vec::new())
                    } else {
                        if scope_selectors {
                            let text = rule.selector.clone();
                            rule.selector =
                                scope_selector_text(ctx, scope, &text, rule.id, rule.span);
                        }
                        transform_nodes(ctx, scope, &mut rule.nodes, scope_selectors);
                        let siblings = st_mixin::expand_rule(ctx, scope, rule);
                        (false, siblings)
                    }
                };
                if remove {
                    nodes.remove(i);
                    continue;
                }
                i += 1;
                if !siblings.is_empty() {
                    let count = siblings.len();
                    nodes.splice(i..i, siblings);
                    i += count;
                }
            }
            Node::AtRule(at) if at.name == "st-scope" => {
                let Node::AtRule(mut at) = nodes.remove(i) else {
                    unreachable!()
                };
                let prefix = scope_selector_text(ctx, scope, &at.prelude, at.id, at.span);
                let mut children = at.body.take().unwrap_or_default();
                children.retain(|n| !matches!(n, Node::Decl(_)));
                transform_nodes(ctx, scope, &mut children, scope_selectors);
                apply_scope_prefix(&mut children, &prefix);
                let count = children.len();
                nodes.splice(i..i, children);
                i += count;
            }
            Node::AtRule(_) => {
                let action = {
                    let Node::AtRule(at) = &mut nodes[i] else {
                        unreachable!()
                    };
                    let mut action = NodeAction::Keep;
                    for feature in features {
                        if feature.transform_at_rule(ctx, scope, at) == NodeAction::Remove {
                            action = NodeAction::Remove;
                        }
                    }
                    if action == NodeAction::Keep
                        && let Some(body) = &mut at.body
                    {
                        let inner_scoping = scope_selectors && at.name != "keyframes";
                        transform_nodes(ctx, scope, body, inner_scoping);
                    }
                    action
                };
                if action == NodeAction::Remove {
                    nodes.remove(i);
                    continue;
                }
                i += 1;
            }
            Node::Decl(_) => {
                let action = {
                    let Node::Decl(decl) = &mut nodes[i] else {
                        unreachable!()
                    };
                    let mut action = NodeAction::Keep;
                    for feature in features {
                        if feature.transform_declaration(ctx, scope, decl) == NodeAction::Remove {
                            action = NodeAction::Remove;
                        }
                    }
                    action
                };
                if action == NodeAction::Remove {
                    nodes.remove(i);
                    continue;
                }
                i += 1;
            }
        }
    }
}

/// Run every feature's at-rule rewrite on a detached node (used for the
/// re-created conditional wrappers around expanded mixins).
pub(crate) fn apply_at_rule_hooks(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    at: &mut AtRule,
) {
    let features = ctx.features;
    for feature in features {
        let _ = feature.transform_at_rule(ctx, scope, at);
    }
}

// ============================================================================
// SELECTOR SCOPING
// ============================================================================

/// Scope one selector list in the given module scope.
pub(crate) fn scope_selector_text(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    text: &str,
    node: NodeId,
    span: Span,
) -> String {
    if scope.native {
        return text.to_string();
    }
    let mut list = parse_selector_list(text);
    if list.selectors.is_empty() {
        return text.to_string();
    }
    for selector in &mut list.selectors {
        scope_complex(ctx, scope, selector, node, span);
    }
    list.to_string()
}

fn scope_complex(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    selector: &mut Selector,
    node: NodeId,
    span: Span,
) {
    let maps = scope.maps.clone();
    // the resolved subject of the current compound, for state lookup
    let mut subject: Option<ResolvedClass> = None;
    let mut idx = 0;
    while idx < selector.nodes.len() {
        let replacement = match &selector.nodes[idx] {
            SelectorNode::Class(name) => match maps.classes.get(name) {
                Some(resolved) => {
                    subject = Some(resolved.clone());
                    Some(SelectorNode::Raw(resolved.subject().scoped_class()))
                }
                None => {
                    subject = None;
                    None
                }
            },
            SelectorNode::Type(name) => {
                if let Some(resolved) = maps.classes.get(name) {
                    // imported component used as a type selector
                    subject = Some(resolved.clone());
                    Some(SelectorNode::Raw(resolved.subject().scoped_class()))
                } else if let Some(resolved) = maps.elements.get(name) {
                    subject = Some(resolved.clone());
                    None
                } else {
                    subject = None;
                    None
                }
            }
            SelectorNode::Combinator(_) | SelectorNode::Nesting => {
                subject = None;
                None
            }
            SelectorNode::PseudoClass { name, arg } => {
                if SELECTOR_FUNCTION_PSEUDOS.contains(&name.as_str()) {
                    let name = name.clone();
                    let arg = arg.clone();
                    arg.map(|inner| SelectorNode::PseudoClass {
                        name,
                        arg: Some(scope_selector_text(ctx, scope, &inner, node, span)),
                    })
                } else if is_native_pseudo(name) {
                    None
                } else {
                    let name = name.clone();
                    let arg = arg.clone();
                    rewrite_state(ctx, scope, subject.as_ref(), &name, arg.as_deref(), node, span)
                        .map(SelectorNode::Raw)
                }
            }
            _ => None,
        };
        if let Some(new_node) = replacement {
            selector.nodes[idx] = new_node;
        }
        idx += 1;
    }
}

/// Resolve a custom state through the subject's extends chain (closest
/// ancestor wins) and render its output fragment.
fn rewrite_state(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    subject: Option<&ResolvedClass>,
    name: &str,
    arg: Option<&str>,
    node: NodeId,
    span: Span,
) -> Option<String> {
    let subject = subject?;
    for link in &subject.chain {
        let Some(def) = link.states.get(name) else {
            continue;
        };
        let value = match arg {
            Some(raw) => Some(crate::features::st_states::expand_default(
                raw,
                &scope.maps.st_vars,
            )),
            None => state_default(def).map(|default| {
                // defaults resolve against the defining module's variables
                match ctx.scope_for(&link.path) {
                    Some(def_scope) => crate::features::st_states::expand_default(
                        default,
                        &def_scope.maps.st_vars,
                    ),
                    None => default.to_string(),
                }
            }),
        };
        match render_state_usage(link, name, def, value) {
            Ok(fragment) => return Some(fragment),
            Err(message) => {
                ctx.diagnostics.add(
                    Diagnostic::error(node, span, message)
                        .with_code(codes::STATE_VALIDATION_FAILED)
                        .with_word(name.to_string()),
                );
                return None;
            }
        }
    }
    ctx.diagnostics.add(
        Diagnostic::error(node, span, format!("unknown state \"{name}\""))
            .with_code(codes::UNKNOWN_STATE)
            .with_word(name.to_string()),
    );
    None
}

fn state_default(def: &StateDef) -> Option<&str> {
    match def {
        StateDef::Param { default, .. } | StateDef::Template { default, .. } => default.as_deref(),
        _ => None,
    }
}

// ============================================================================
// @st-scope PREFIXING
// ============================================================================

/// Prefix top-level rules (and rules inside conditional at-rules) with
/// the scoping selector. Nested rules keep their relative selectors.
fn apply_scope_prefix(nodes: &mut [Node], prefix: &str) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                rule.selector = join_scope_prefix(prefix, &rule.selector);
            }
            Node::AtRule(at) => {
                if let Some(body) = &mut at.body {
                    apply_scope_prefix(body, prefix);
                }
            }
            Node::Decl(_) => {}
        }
    }
}

fn join_scope_prefix(prefix: &str, selector: &str) -> String {
    let prefixes: Vec<&str> = split_top_level_commas(prefix)
        .into_iter()
        .map(str::trim)
        .collect();
    let mut parts = Vec::new();
    for part in split_top_level_commas(selector) {
        let part = part.trim();
        for pre in &prefixes {
            if part.contains('&') {
                parts.push(part.replace('&', pre));
            } else {
                parts.push(format!("{pre} {part}"));
            }
        }
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_prefix_joins_and_distributes() {
        assert_eq!(join_scope_prefix(".theme", ".a, .b"), ".theme .a, .theme .b");
        assert_eq!(join_scope_prefix(".t1, .t2", ".a"), ".t1 .a, .t2 .a");
        assert_eq!(join_scope_prefix(".theme", "&.on"), ".theme.on");
    }
}
