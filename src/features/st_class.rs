//! Class feature: selector class registration, `-st-extends` links,
//! `-st-global` exemptions, and the class export table.

use smol_str::SmolStr;

use crate::css::ast::{Declaration, Rule};
use crate::css::selector::{SelectorNode, parse_selector_list};
use crate::diagnostics::{Diagnostic, codes};
use crate::semantic::meta::{ModuleMeta, SheetKind};
use crate::semantic::resolver::{ResolveOutcome, SymbolResolver};
use crate::semantic::symbol::{StSymbol, SymbolKind, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, ClassLink, Feature, ModuleExports, ModuleScope, NodeAction,
    ResolveContext, ResolvedClass, TransformContext,
};

pub struct StClass;

impl Feature for StClass {
    fn name(&self) -> &'static str {
        "st-class"
    }

    fn meta_init(&self, meta: &mut ModuleMeta) {
        if meta.kind != SheetKind::StCss {
            return;
        }
        // every stylesheet owns an implicit root class
        meta.symbols.insert(
            StSymbol::Class {
                name: SmolStr::new("root"),
                node: crate::base::NodeId::SYNTHETIC,
                span: crate::base::empty_span(),
                global_selector: None,
                extends: None,
                states: Default::default(),
            },
            RedeclarePolicy::SafeRedeclare,
        );
    }

    fn analyze_selector_node(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        node: &SelectorNode,
        rule: &Rule,
        _ancestry: &Ancestry<'_>,
    ) {
        let SelectorNode::Class(name) = node else {
            return;
        };
        ctx.register(
            StSymbol::Class {
                name: name.clone(),
                node: rule.id,
                span: rule.span,
                global_selector: None,
                extends: None,
                states: Default::default(),
            },
            RedeclarePolicy::SafeRedeclare,
        );
    }

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
        if ctx.meta.kind != SheetKind::StCss {
            return;
        }
        match decl.prop.as_str() {
            "-st-extends" => self.analyze_extends(ctx, decl, ancestry),
            "-st-global" => self.analyze_global(ctx, decl, ancestry),
            _ => {}
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        let meta = rctx.meta;
        let names: Vec<(SmolStr, SymbolKind)> = meta
            .symbols
            .all(SymbolNamespace::Main)
            .filter(|(_, sym)| matches!(sym.kind(), SymbolKind::Class | SymbolKind::Import))
            .map(|(name, sym)| (name.clone(), sym.kind()))
            .collect();
        for (name, _) in names {
            let mut issues = Vec::new();
            if let Some(resolved) = build_chain(rctx.resolver, &meta.path, &name, &mut issues) {
                rctx.maps.classes.insert(name, resolved);
            }
            for issue in issues {
                rctx.report(issue);
            }
        }
    }

    fn transform_declaration(
        &self,
        _ctx: &mut TransformContext<'_>,
        _scope: &ModuleScope,
        decl: &mut Declaration,
    ) -> NodeAction {
        match decl.prop.as_str() {
            "-st-extends" | "-st-global" => NodeAction::Remove,
            _ => NodeAction::Keep,
        }
    }

    fn transform_js_exports(
        &self,
        _ctx: &mut TransformContext<'_>,
        scope: &ModuleScope,
        meta: &ModuleMeta,
        exports: &mut ModuleExports,
    ) {
        for (name, _) in meta.symbols.all(SymbolNamespace::Main) {
            let Some(resolved) = scope.maps.classes.get(name) else {
                continue;
            };
            if resolved.kind != SymbolKind::Class {
                continue;
            }
            let parts: Vec<String> = resolved
                .chain
                .iter()
                .filter(|link| link.is_class)
                .map(ClassLink::export_name)
                .collect();
            exports.classes.insert(name.clone(), parts.join(" "));
        }
    }
}

impl StClass {
    fn analyze_extends(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
        let Some(subject) = simple_rule_subject(ancestry) else {
            ctx.error(
                decl.id,
                decl.span,
                codes::CANNOT_EXTEND_IN_COMPLEX_SELECTOR,
                "-st-extends is only valid inside a simple class or element rule",
            );
            return;
        };
        let target = decl.value.trim();
        if target.is_empty() || target.contains(char::is_whitespace) {
            ctx.error(
                decl.id,
                decl.span,
                codes::CANNOT_EXTEND_UNKNOWN_SYMBOL,
                format!("invalid -st-extends target \"{}\"", decl.value),
            );
            return;
        }
        if let Some(StSymbol::Class { extends, .. }) =
            ctx.meta.symbols.get_mut(&subject, SymbolNamespace::Main)
        {
            *extends = Some(SmolStr::new(target));
        }
    }

    fn analyze_global(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
        let Some(subject) = simple_rule_subject(ancestry) else {
            ctx.warning(
                decl.id,
                decl.span,
                codes::INVALID_ST_GLOBAL,
                "-st-global is only valid inside a simple class rule",
            );
            return;
        };
        let raw = decl.value.trim();
        let selector = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
            .unwrap_or(raw)
            .trim()
            .to_string();
        if selector.is_empty() || parse_selector_list(&selector).selectors.len() != 1 {
            ctx.warning(
                decl.id,
                decl.span,
                codes::INVALID_ST_GLOBAL,
                format!("-st-global expects a single selector, got \"{raw}\""),
            );
            return;
        }
        if let Some(StSymbol::Class {
            global_selector, ..
        }) = ctx.meta.symbols.get_mut(&subject, SymbolNamespace::Main)
        {
            *global_selector = Some(selector);
        }
    }
}

/// The single class subject of the nearest rule, when its selector is
/// one simple class selector.
fn simple_rule_subject(ancestry: &Ancestry<'_>) -> Option<SmolStr> {
    let rule = ancestry.nearest_rule()?;
    let list = parse_selector_list(&rule.selector);
    let [selector] = list.selectors.as_slice() else {
        return None;
    };
    match selector.nodes.as_slice() {
        [SelectorNode::Class(name)] => Some(name.clone()),
        _ => None,
    }
}

/// Follow a name to its defining class/element and that class's
/// `-st-extends` ancestors, closest first.
pub(crate) fn build_chain(
    resolver: &mut SymbolResolver<'_>,
    from_path: &str,
    name: &str,
    issues: &mut Vec<Diagnostic>,
) -> Option<ResolvedClass> {
    let mut chain: Vec<ClassLink> = Vec::new();
    let mut kind = SymbolKind::Class;
    let mut visited: Vec<(SmolStr, SmolStr)> = Vec::new();
    let mut cursor: Option<(SmolStr, SmolStr)> = Some((SmolStr::new(from_path), SmolStr::new(name)));
    // definition site of the previous link, for extends diagnostics
    let mut last_site = (crate::base::NodeId::SYNTHETIC, crate::base::empty_span());

    while let Some((path, local)) = cursor.take() {
        if visited.contains(&(path.clone(), local.clone())) {
            break;
        }
        visited.push((path.clone(), local.clone()));

        let found = match resolver.deep_resolve(&path, &local, SymbolNamespace::Main) {
            ResolveOutcome::Resolved(found) => found,
            _ => {
                if chain.is_empty() {
                    return None;
                }
                issues.push(
                    Diagnostic::warning(
                        last_site.0,
                        last_site.1,
                        format!("cannot extend unknown symbol \"{local}\""),
                    )
                    .with_code(codes::CANNOT_EXTEND_UNKNOWN_SYMBOL)
                    .with_word(local.clone()),
                );
                break;
            }
        };
        last_site = (found.symbol.node(), found.symbol.span());

        match found.symbol {
            StSymbol::Class {
                name: def_name,
                global_selector,
                extends,
                states,
                ..
            } => {
                if chain.is_empty() {
                    kind = SymbolKind::Class;
                }
                chain.push(ClassLink {
                    path: found.meta.path.clone(),
                    namespace: found.meta.namespace.clone(),
                    name: def_name.clone(),
                    is_class: true,
                    states: states.clone(),
                    global_selector: global_selector.clone(),
                    global_module: found.meta.kind == SheetKind::NativeCss,
                });
                if let Some(ext) = extends {
                    cursor = Some((found.meta.path.clone(), ext.clone()));
                }
            }
            StSymbol::Element {
                name: def_name,
                states,
                ..
            } => {
                if chain.is_empty() {
                    kind = SymbolKind::Element;
                }
                chain.push(ClassLink {
                    path: found.meta.path.clone(),
                    namespace: found.meta.namespace.clone(),
                    name: def_name.clone(),
                    is_class: false,
                    states: states.clone(),
                    global_selector: None,
                    global_module: found.meta.kind == SheetKind::NativeCss,
                });
            }
            _ => {
                if chain.is_empty() {
                    return None;
                }
                break;
            }
        }
    }

    if chain.is_empty() {
        None
    } else {
        Some(ResolvedClass { kind, chain })
    }
}
