//! Mixin expansion: `-st-mixin: name, other(param value)`.
//!
//! The target rule receives a deep copy of the mixin's defining rule-set,
//! positionally merged at the `-st-mixin` declaration. Copied content is
//! processed through the same feature pipeline as locally authored code,
//! but against the mixin's origin module scope, so custom properties,
//! variables, containers and layers inside the copy resolve where the
//! mixin was written. Nested mixins expand recursively behind a cycle
//! guard.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::ast::{AtRule, Declaration, Node, Rule};
use crate::css::selector::{SelectorNode, parse_selector_list, split_top_level_commas};
use crate::css::value::{ValueNode, serialize_value, split_commas, tokenize_value};
use crate::diagnostics::{Diagnostic, codes};
use crate::pipeline::transformer::{apply_at_rule_hooks, transform_nodes};
use crate::semantic::meta::{ModuleMeta, SheetKind};
use crate::semantic::symbol::{StSymbol, SymbolNamespace};

use super::{AnalyzeContext, Ancestry, Feature, ModuleScope, TransformContext};

pub struct StMixin;

/// Per-rule mixin applications collected during analyze. Later
/// `-st-mixin` declarations on the same rule append; none overwrite.
#[derive(Debug, Default)]
pub struct MixinData {
    pub per_rule: FxHashMap<NodeId, Vec<MixinRef>>,
}

#[derive(Debug, Clone)]
pub struct MixinRef {
    pub name: SmolStr,
    pub overrides: FxHashMap<SmolStr, String>,
    /// The `-st-mixin` declaration this application came from.
    pub decl: NodeId,
    pub span: Span,
}

impl Feature for StMixin {
    fn name(&self) -> &'static str {
        "st-mixin"
    }

    fn meta_init(&self, meta: &mut ModuleMeta) {
        meta.data.insert(MixinData::default());
    }

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
        if decl.prop != "-st-mixin" || ctx.meta.kind != SheetKind::StCss {
            return;
        }
        let Some(rule) = ancestry.nearest_rule() else {
            return;
        };
        let refs = parse_mixin_value(decl);
        ctx.meta
            .data
            .get_mut::<MixinData>()
            .per_rule
            .entry(rule.id)
            .or_default()
            .extend(refs);
    }
}

fn parse_mixin_value(decl: &Declaration) -> Vec<MixinRef> {
    let nodes = tokenize_value(&decl.value);
    let mut refs = Vec::new();
    for segment in split_commas(&nodes) {
        let compact: Vec<&ValueNode> = segment.iter().filter(|n| !n.is_space()).collect();
        match compact.as_slice() {
            [ValueNode::Ident(name)] => refs.push(MixinRef {
                name: name.clone(),
                overrides: FxHashMap::default(),
                decl: decl.id,
                span: decl.span,
            }),
            [ValueNode::Func { name, args }] => {
                let mut overrides = FxHashMap::default();
                for arg in split_commas(args) {
                    // `param value` pairs override the origin's variables
                    if let Some((ValueNode::Ident(param), rest)) = arg.split_first() {
                        let value = serialize_value(rest).trim().to_string();
                        if !value.is_empty() {
                            overrides.insert(param.clone(), value);
                        }
                    }
                }
                refs.push(MixinRef {
                    name: name.clone(),
                    overrides,
                    decl: decl.id,
                    span: decl.span,
                });
            }
            _ => {}
        }
    }
    refs
}

// ============================================================================
// EXPANSION
// ============================================================================

/// Expand every `-st-mixin` application of `rule`, replacing the mixin
/// declarations with inlined content. Returned nodes are siblings to be
/// inserted after the rule in its parent. The rule's selector and
/// declarations must already be transformed.
pub fn expand_rule(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    rule: &mut Rule,
) -> Vec<Node> {
    if !rule
        .nodes
        .iter()
        .any(|n| matches!(n, Node::Decl(d) if d.prop == "-st-mixin"))
    {
        return Vec::new();
    }
    let refs: Vec<MixinRef> = ctx
        .graph
        .meta(&scope.path)
        .and_then(|meta| meta.data.try_get::<MixinData>())
        .and_then(|data| data.per_rule.get(&rule.id).cloned())
        .unwrap_or_default();

    let mut siblings = Vec::new();
    let original = std::mem::take(&mut rule.nodes);
    let mut merged = Vec::with_capacity(original.len());
    for node in original {
        match node {
            Node::Decl(decl) if decl.prop == "-st-mixin" => {
                for mixin in refs.iter().filter(|m| m.decl == decl.id) {
                    let (inline, mut rest) = expand_one(ctx, scope, &rule.selector, mixin);
                    merged.extend(inline);
                    siblings.append(&mut rest);
                }
            }
            other => merged.push(other),
        }
    }
    rule.nodes = merged;
    siblings
}

/// Expand a single mixin application into (inline nodes, sibling nodes).
fn expand_one(
    ctx: &mut TransformContext<'_>,
    scope: &ModuleScope,
    target_selector: &str,
    mixin: &MixinRef,
) -> (Vec<Node>, Vec<Node>) {
    let found = ctx
        .resolver
        .deep_resolve(&scope.path, &mixin.name, SymbolNamespace::Main)
        .resolved();
    let Some(found) = found else {
        ctx.diagnostics.add(
            Diagnostic::error(
                mixin.decl,
                mixin.span,
                format!("unknown mixin \"{}\"", mixin.name),
            )
            .with_code(codes::UNKNOWN_MIXIN)
            .with_word(mixin.name.clone()),
        );
        return (Vec::new(), Vec::new());
    };
    let StSymbol::Class {
        name: origin_class, ..
    } = found.symbol
    else {
        ctx.diagnostics.add(
            Diagnostic::error(
                mixin.decl,
                mixin.span,
                format!("\"{}\" is not a mixin-able class", mixin.name),
            )
            .with_code(codes::UNKNOWN_MIXIN)
            .with_word(mixin.name.clone()),
        );
        return (Vec::new(), Vec::new());
    };
    let origin_meta = found.meta;
    let origin_class = origin_class.clone();

    let guard_key = (origin_meta.path.clone(), origin_class.clone());
    if ctx.mixin_guard.contains(&guard_key) {
        ctx.diagnostics.add(
            Diagnostic::error(
                mixin.decl,
                mixin.span,
                format!("circular mixin \"{}\"", mixin.name),
            )
            .with_code(codes::CIRCULAR_MIXIN)
            .with_word(mixin.name.clone()),
        );
        return (Vec::new(), Vec::new());
    }
    ctx.mixin_guard.push(guard_key);

    let Some(mut origin_scope) = ctx.scope_for(&origin_meta.path) else {
        ctx.mixin_guard.pop();
        return (Vec::new(), Vec::new());
    };
    origin_scope.var_overrides = mixin.overrides.clone();

    // the selector fragment the origin class renders to, used to re-base
    // variant selectors onto the target
    let origin_fragment = origin_scope
        .maps
        .classes
        .get(&origin_class)
        .map(|rc| rc.subject().scoped_class())
        .unwrap_or_else(|| format!(".{origin_class}"));

    let mut candidates = Vec::new();
    collect_rules(&origin_meta.ast.nodes, &origin_class, &mut Vec::new(), &mut candidates);

    let mut inline = Vec::new();
    let mut siblings = Vec::new();
    for (wrappers, rule) in candidates {
        let is_base = is_base_rule(&rule, &origin_class);

        // run the copy through the full pipeline in the origin's scope
        let mut processed = vec![Node::Rule(rule)];
        transform_nodes(ctx, &origin_scope, &mut processed, true);
        let mut processed = processed.into_iter();
        let Some(Node::Rule(main)) = processed.next() else {
            continue;
        };
        let extra: Vec<Node> = processed
            .map(|node| rebase_node(node, &origin_fragment, target_selector))
            .collect();

        if is_base && wrappers.is_empty() {
            inline.extend(main.nodes);
        } else {
            let body_rule = Rule {
                id: main.id,
                span: main.span,
                selector: if is_base {
                    target_selector.to_string()
                } else {
                    rebase_selector(&main.selector, &origin_fragment, target_selector)
                },
                nodes: main.nodes,
            };
            siblings.push(wrap_in_at_rules(ctx, &origin_scope, wrappers, body_rule));
        }
        siblings.extend(extra);
    }

    ctx.mixin_guard.pop();
    (inline, siblings)
}

/// Collect origin rules that mention the mixin class, with their
/// conditional at-rule wrappers.
fn collect_rules(
    nodes: &[Node],
    class: &SmolStr,
    wrappers: &mut Vec<AtRule>,
    out: &mut Vec<(Vec<AtRule>, Rule)>,
) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                if selector_mentions_class(&rule.selector, class) {
                    out.push((wrappers.clone(), rule.clone()));
                }
            }
            Node::AtRule(at) => {
                if let Some(body) = &at.body
                    && at.name != "keyframes"
                {
                    wrappers.push(AtRule {
                        id: at.id,
                        span: at.span,
                        name: at.name.clone(),
                        prelude: at.prelude.clone(),
                        body: None,
                    });
                    collect_rules(body, class, wrappers, out);
                    wrappers.pop();
                }
            }
            Node::Decl(_) => {}
        }
    }
}

fn selector_mentions_class(selector: &str, class: &SmolStr) -> bool {
    parse_selector_list(selector).selectors.iter().any(|sel| {
        sel.nodes
            .iter()
            .any(|node| matches!(node, SelectorNode::Class(name) if name == class))
    })
}

fn is_base_rule(rule: &Rule, class: &SmolStr) -> bool {
    parse_selector_list(&rule.selector).selectors.iter().any(|sel| {
        matches!(sel.nodes.as_slice(), [SelectorNode::Class(name)] if name == class)
    })
}

/// Re-create the origin's conditional wrappers around a rule, with their
/// preludes rewritten in the origin scope.
fn wrap_in_at_rules(
    ctx: &mut TransformContext<'_>,
    origin_scope: &ModuleScope,
    wrappers: Vec<AtRule>,
    rule: Rule,
) -> Node {
    let mut node = Node::Rule(rule);
    for mut wrapper in wrappers.into_iter().rev() {
        apply_at_rule_hooks(ctx, origin_scope, &mut wrapper);
        wrapper.body = Some(vec![node]);
        node = Node::AtRule(wrapper);
    }
    node
}

/// Replace the scoped origin class in a transformed variant selector
/// with the target rule's selector, distributing over both lists.
fn rebase_selector(variant: &str, origin_fragment: &str, target_selector: &str) -> String {
    let targets: Vec<&str> = split_top_level_commas(target_selector)
        .into_iter()
        .map(str::trim)
        .collect();
    let mut parts = Vec::new();
    for piece in split_top_level_commas(variant) {
        let piece = piece.trim();
        if !piece.contains(origin_fragment) {
            parts.push(piece.to_string());
            continue;
        }
        for target in &targets {
            parts.push(piece.replace(origin_fragment, target));
        }
    }
    parts.join(", ")
}

fn rebase_node(node: Node, origin_fragment: &str, target_selector: &str) -> Node {
    match node {
        Node::Rule(mut rule) => {
            rule.selector = rebase_selector(&rule.selector, origin_fragment, target_selector);
            Node::Rule(rule)
        }
        Node::AtRule(mut at) => {
            if let Some(body) = at.body.take() {
                at.body = Some(
                    body.into_iter()
                        .map(|n| rebase_node(n, origin_fragment, target_selector))
                        .collect(),
                );
            }
            Node::AtRule(at)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::empty_span;

    fn mixin_decl(value: &str) -> Declaration {
        Declaration {
            id: NodeId(7),
            span: empty_span(),
            prop: "-st-mixin".into(),
            value: value.into(),
            important: false,
        }
    }

    #[test]
    fn parses_plain_and_parameterized_applications() {
        let refs = parse_mixin_value(&mixin_decl("mixA, mixB(color red, width 10px)"));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "mixA");
        assert!(refs[0].overrides.is_empty());
        assert_eq!(refs[1].name, "mixB");
        assert_eq!(refs[1].overrides.get("color").map(String::as_str), Some("red"));
        assert_eq!(
            refs[1].overrides.get("width").map(String::as_str),
            Some("10px")
        );
    }

    #[test]
    fn rebasing_distributes_over_selector_lists() {
        assert_eq!(
            rebase_selector(".m__mix:hover", ".m__mix", ".e__a, .e__b"),
            ".e__a:hover, .e__b:hover"
        );
        assert_eq!(
            rebase_selector(".m__mix .child, .other", ".m__mix", ".e__a"),
            ".e__a .child, .other"
        );
    }
}
