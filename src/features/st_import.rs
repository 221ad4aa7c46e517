//! Import feature.
//!
//! Two syntaxes produce equivalent [`Imported`] records:
//!
//! ```css
//! @st-import Button, [part, label as lbl, keyframes(fade as f)] from "./button.st.css";
//! :import {
//!     -st-from: "./button.st.css";
//!     -st-default: Button;
//!     -st-named: part, label as lbl, keyframes(fade as f);
//! }
//! ```
//!
//! Import statements never reach the output CSS.

use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::ast::{AtRule, Declaration, Rule};
use crate::css::value::{ValueNode, split_commas, tokenize_value};
use crate::diagnostics::{Diagnostic, codes};
use crate::host::dirname;
use crate::semantic::meta::{Imported, ModuleMeta, SheetKind};
use crate::semantic::resolver::ResolveOutcome;
use crate::semantic::symbol::{ImportKind, ImportRef, StSymbol, SymbolNamespace};
use crate::semantic::symbol_table::RedeclarePolicy;

use super::{
    AnalyzeContext, Ancestry, Feature, ModuleScope, NodeAction, PseudoBlock, ResolveContext,
    TransformContext, pseudo_block_kind,
};

pub struct StImport;

impl Feature for StImport {
    fn name(&self) -> &'static str {
        "st-import"
    }

    fn analyze_at_rule(&self, ctx: &mut AnalyzeContext<'_>, at: &AtRule, ancestry: &Ancestry<'_>) {
        if at.name != "st-import" || ctx.meta.kind != SheetKind::StCss {
            return;
        }
        if ancestry.is_nested() {
            ctx.warning(
                at.id,
                at.span,
                codes::NO_IMPORT_IN_NESTED_SCOPE,
                "@st-import cannot be used inside a rule; the statement is ignored",
            );
            return;
        }
        if let Some(imported) = parse_st_import(ctx, at) {
            commit_import(ctx, imported);
        }
    }

    fn analyze_rule(&self, ctx: &mut AnalyzeContext<'_>, rule: &Rule, ancestry: &Ancestry<'_>) {
        if pseudo_block_kind(&rule.selector) != Some(PseudoBlock::Import)
            || ctx.meta.kind != SheetKind::StCss
        {
            return;
        }
        if ancestry.is_nested() {
            ctx.warning(
                rule.id,
                rule.span,
                codes::NO_IMPORT_IN_NESTED_SCOPE,
                ":import cannot be used inside a rule; the statement is ignored",
            );
            return;
        }
        if let Some(imported) = parse_legacy_import(ctx, rule) {
            commit_import(ctx, imported);
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        let meta = rctx.meta;
        for record in &meta.imports {
            if rctx
                .resolver
                .graph()
                .request_target(&meta.path, &record.request)
                .is_none()
            {
                rctx.report(
                    Diagnostic::warning(
                        record.rule,
                        record.span,
                        format!("cannot resolve imported file \"{}\"", record.request),
                    )
                    .with_code(codes::UNKNOWN_IMPORTED_FILE)
                    .with_word(record.request.clone()),
                );
                continue;
            }
            // main-namespace bindings; typed sub-namespaces are checked
            // by their owning features
            let mut locals: Vec<SmolStr> = Vec::new();
            if let Some(default) = &record.default_export {
                locals.push(default.clone());
            }
            locals.extend(
                record
                    .named
                    .keys()
                    .filter(|local| !local.starts_with("--"))
                    .cloned(),
            );
            for local in locals {
                if let ResolveOutcome::UnknownSymbol { file, name } =
                    rctx.resolver
                        .deep_resolve(&meta.path, &local, SymbolNamespace::Main)
                {
                    rctx.report(
                        Diagnostic::warning(
                            record.rule,
                            record.span,
                            format!("cannot resolve imported symbol \"{name}\" in \"{file}\""),
                        )
                        .with_code(codes::UNKNOWN_IMPORTED_SYMBOL)
                        .with_word(name),
                    );
                }
            }
        }
    }

    fn transform_at_rule(
        &self,
        _ctx: &mut TransformContext<'_>,
        _scope: &ModuleScope,
        at: &mut AtRule,
    ) -> NodeAction {
        if at.name == "st-import" {
            NodeAction::Remove
        } else {
            NodeAction::Keep
        }
    }
}

/// Import statements of a module, in source order.
pub fn get_import_statements(meta: &ModuleMeta) -> &[Imported] {
    &meta.imports
}

// ============================================================================
// @st-import PARSING
// ============================================================================

fn parse_st_import(ctx: &mut AnalyzeContext<'_>, at: &AtRule) -> Option<Imported> {
    let nodes = tokenize_value(&at.prelude);

    // split at the trailing `from "<path>"`
    let from_idx = nodes.iter().rposition(
        |n| matches!(n, ValueNode::Ident(ident) if ident == "from"),
    );
    let Some(from_idx) = from_idx else {
        ctx.error(
            at.id,
            at.span,
            codes::INVALID_ST_IMPORT_SYNTAX,
            "@st-import is missing a `from \"<path>\"` clause",
        );
        return None;
    };
    let request = nodes[from_idx + 1..].iter().find_map(|n| match n {
        ValueNode::QuotedString(raw) => Some(unquote(raw)),
        _ => None,
    });
    let Some(request) = request else {
        ctx.error(
            at.id,
            at.span,
            codes::INVALID_ST_IMPORT_SYNTAX,
            "@st-import is missing a quoted path after `from`",
        );
        return None;
    };
    if request.trim().is_empty() {
        ctx.error(
            at.id,
            at.span,
            codes::EMPTY_IMPORT_FROM,
            "import path cannot be empty",
        );
        return None;
    }

    let mut imported = Imported::new(
        request,
        dirname(&ctx.meta.path),
        at.id,
        at.span,
    );

    for segment in split_commas(&nodes[..from_idx]) {
        let compact: Vec<&ValueNode> = segment.iter().filter(|n| !n.is_space()).collect();
        match compact.as_slice() {
            [ValueNode::Ident(name)] => {
                if name == "*" {
                    ctx.error(
                        at.id,
                        at.span,
                        codes::ST_IMPORT_STAR,
                        "star import is not supported",
                    );
                } else if imported.default_export.is_some() {
                    ctx.error(
                        at.id,
                        at.span,
                        codes::INVALID_ST_IMPORT_SYNTAX,
                        format!("unexpected identifier \"{name}\" after the default import"),
                    );
                } else {
                    imported.default_export = Some(name.clone());
                }
            }
            [ValueNode::Bracket(inner)] => {
                parse_named_block(ctx, at.id, at.span, inner, &mut imported);
            }
            [] => {}
            _ => {
                ctx.error(
                    at.id,
                    at.span,
                    codes::INVALID_ST_IMPORT_SYNTAX,
                    "unexpected token in @st-import",
                );
            }
        }
    }

    validate_default_casing(ctx, at.id, at.span, &imported);
    Some(imported)
}

// ============================================================================
// LEGACY :import PARSING
// ============================================================================

const KNOWN_IMPORT_PROPS: &[&str] = &["-st-from", "-st-default", "-st-named"];

fn parse_legacy_import(ctx: &mut AnalyzeContext<'_>, rule: &Rule) -> Option<Imported> {
    let mut from: Option<String> = None;
    let mut default_export: Option<SmolStr> = None;
    let mut named_decls: Vec<&Declaration> = Vec::new();

    for decl in rule.decls() {
        match decl.prop.as_str() {
            "-st-from" => {
                if from.is_some() {
                    ctx.warning(
                        decl.id,
                        decl.span,
                        codes::MULTIPLE_FROM_IN_IMPORT,
                        "multiple -st-from declarations; the last one wins",
                    );
                }
                from = Some(unquote(decl.value.trim()));
            }
            "-st-default" => default_export = Some(SmolStr::new(decl.value.trim())),
            "-st-named" => named_decls.push(decl),
            other => {
                if !KNOWN_IMPORT_PROPS.contains(&other) {
                    ctx.warning(
                        decl.id,
                        decl.span,
                        codes::UNKNOWN_IMPORT_PROP,
                        format!("unknown declaration \"{other}\" inside :import"),
                    );
                }
            }
        }
    }

    let Some(from) = from else {
        ctx.error(
            rule.id,
            rule.span,
            codes::MISSING_IMPORT_FROM,
            ":import is missing an -st-from declaration",
        );
        return None;
    };
    if from.trim().is_empty() {
        ctx.error(
            rule.id,
            rule.span,
            codes::EMPTY_IMPORT_FROM,
            "import path cannot be empty",
        );
        return None;
    }

    let mut imported = Imported::new(from, dirname(&ctx.meta.path), rule.id, rule.span);
    imported.default_export = default_export;
    for decl in named_decls {
        let nodes = tokenize_value(&decl.value);
        parse_named_block(ctx, decl.id, decl.span, &nodes, &mut imported);
    }

    validate_default_casing(ctx, rule.id, rule.span, &imported);
    Some(imported)
}

// ============================================================================
// SHARED PARSING
// ============================================================================

/// Parse the body of a named block (`a, b as c, keyframes(d as e)`) into
/// the import record's maps.
fn parse_named_block(
    ctx: &mut AnalyzeContext<'_>,
    node: NodeId,
    span: Span,
    nodes: &[ValueNode],
    imported: &mut Imported,
) {
    for segment in split_commas(nodes) {
        let compact: Vec<&ValueNode> = segment.iter().filter(|n| !n.is_space()).collect();
        match compact.as_slice() {
            [ValueNode::Ident(name)] => {
                if name == "*" {
                    ctx.error(node, span, codes::ST_IMPORT_STAR, "star import is not supported");
                } else {
                    imported.named.insert(name.clone(), name.clone());
                }
            }
            [
                ValueNode::Ident(origin),
                ValueNode::Ident(as_kw),
                ValueNode::Ident(local),
            ] if as_kw == "as" => {
                if origin == "*" {
                    ctx.error(node, span, codes::ST_IMPORT_STAR, "star import is not supported");
                } else {
                    imported.named.insert(local.clone(), origin.clone());
                }
            }
            [ValueNode::Func { name, args }] => {
                let bucket = match name.as_str() {
                    "keyframes" => &mut imported.keyframes,
                    "layer" => &mut imported.layers,
                    "container" => &mut imported.containers,
                    other => {
                        ctx.error(
                            node,
                            span,
                            codes::INVALID_ST_IMPORT_SYNTAX,
                            format!("unknown typed import \"{other}()\""),
                        );
                        continue;
                    }
                };
                for entry in split_commas(args) {
                    let compact: Vec<&ValueNode> =
                        entry.iter().filter(|n| !n.is_space()).collect();
                    match compact.as_slice() {
                        [ValueNode::Ident(name)] => {
                            bucket.insert(name.clone(), name.clone());
                        }
                        [
                            ValueNode::Ident(origin),
                            ValueNode::Ident(as_kw),
                            ValueNode::Ident(local),
                        ] if as_kw == "as" => {
                            bucket.insert(local.clone(), origin.clone());
                        }
                        _ => ctx.error(
                            node,
                            span,
                            codes::INVALID_ST_IMPORT_SYNTAX,
                            "invalid typed import entry",
                        ),
                    }
                }
            }
            _ => ctx.error(
                node,
                span,
                codes::INVALID_ST_IMPORT_SYNTAX,
                "invalid named import entry",
            ),
        }
    }
}

fn validate_default_casing(
    ctx: &mut AnalyzeContext<'_>,
    node: NodeId,
    span: Span,
    imported: &Imported,
) {
    let Some(default) = &imported.default_export else {
        return;
    };
    let is_stylesheet = imported.request.ends_with(".css");
    if is_stylesheet
        && default
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
    {
        ctx.warning(
            node,
            span,
            codes::LOWERCASE_DEFAULT_IMPORT,
            format!("default import \"{default}\" of a stylesheet should start with an uppercase letter"),
        );
    }
}

/// Register the record's symbols and append it to the module's import
/// list.
fn commit_import(ctx: &mut AnalyzeContext<'_>, imported: Imported) {
    let import_ref = ImportRef(ctx.meta.imports.len());
    let node = imported.rule;
    let span = imported.span;

    if let Some(default) = imported.default_export.clone() {
        ctx.register(
            StSymbol::Import {
                name: default,
                node,
                span,
                import: import_ref,
                kind: ImportKind::Default,
            },
            RedeclarePolicy::FirstWins,
        );
    }
    for (local, origin) in imported.named.clone() {
        if let Some(var_name) = local.strip_prefix("--") {
            ctx.register(
                StSymbol::CssVar {
                    name: SmolStr::new(var_name),
                    node,
                    span,
                    global: false,
                    import: Some(import_ref),
                },
                RedeclarePolicy::FirstWins,
            );
        } else {
            ctx.register(
                StSymbol::Import {
                    name: local,
                    node,
                    span,
                    import: import_ref,
                    kind: ImportKind::Named { origin },
                },
                RedeclarePolicy::FirstWins,
            );
        }
    }
    for (local, _) in imported.keyframes.clone() {
        ctx.register(
            StSymbol::Keyframes {
                name: local,
                node,
                span,
                global: false,
                import: Some(import_ref),
            },
            RedeclarePolicy::FirstWins,
        );
    }
    for (local, _) in imported.layers.clone() {
        ctx.register(
            StSymbol::Layer {
                name: local,
                node,
                span,
                global: false,
                import: Some(import_ref),
            },
            RedeclarePolicy::FirstWins,
        );
    }
    for (local, _) in imported.containers.clone() {
        ctx.register(
            StSymbol::Container {
                name: local,
                node,
                span,
                global: false,
                import: Some(import_ref),
            },
            RedeclarePolicy::FirstWins,
        );
    }

    ctx.meta.imports.push(imported);
}

// ============================================================================
// IMPORT PATCH HELPER
// ============================================================================

/// Serialize an import record back to the legacy `:import` block form.
/// Parsing the output yields a record equivalent to the input.
pub fn serialize_imported(imported: &Imported) -> String {
    let mut out = String::new();
    out.push_str(":import {\n");
    out.push_str(&format!("    -st-from: \"{}\";\n", imported.request));
    if let Some(default) = &imported.default_export {
        out.push_str(&format!("    -st-default: {default};\n"));
    }
    let mut named: Vec<String> = imported
        .named
        .iter()
        .map(|(local, origin)| entry_text(local, origin))
        .collect();
    for (bucket, name) in [
        (&imported.keyframes, "keyframes"),
        (&imported.layers, "layer"),
        (&imported.containers, "container"),
    ] {
        if !bucket.is_empty() {
            let entries: Vec<String> = bucket
                .iter()
                .map(|(local, origin)| entry_text(local, origin))
                .collect();
            named.push(format!("{name}({})", entries.join(", ")));
        }
    }
    if !named.is_empty() {
        out.push_str(&format!("    -st-named: {};\n", named.join(", ")));
    }
    out.push('}');
    out
}

fn entry_text(local: &str, origin: &str) -> String {
    if local == origin {
        local.to_string()
    } else {
        format!("{origin} as {local}")
    }
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
        {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::empty_span;

    fn analyze_prelude(prelude: &str) -> ModuleMeta {
        let mut meta = ModuleMeta::new("/entry.st.css", "entry", SheetKind::StCss);
        let at = AtRule {
            id: NodeId(0),
            span: empty_span(),
            name: "st-import".into(),
            prelude: prelude.into(),
            body: None,
        };
        let mut ctx = AnalyzeContext { meta: &mut meta };
        StImport.analyze_at_rule(&mut ctx, &at, &Ancestry::EMPTY);
        meta
    }

    #[test]
    fn parses_default_and_named() {
        let meta = analyze_prelude("Button, [part, label as lbl] from \"./b.st.css\"");
        let record = &meta.imports[0];
        assert_eq!(record.request, "./b.st.css");
        assert_eq!(record.default_export.as_deref(), Some("Button"));
        assert_eq!(record.named.get("part").map(|s| s.as_str()), Some("part"));
        assert_eq!(record.named.get("lbl").map(|s| s.as_str()), Some("label"));
        assert!(
            meta.symbols
                .get("Button", SymbolNamespace::Main)
                .is_some()
        );
        assert!(meta.symbols.get("lbl", SymbolNamespace::Main).is_some());
    }

    #[test]
    fn parses_typed_imports_into_sub_namespaces() {
        let meta = analyze_prelude(
            "[container(c1, c2 as local), layer(base), keyframes(fade as f)] from \"./b.st.css\"",
        );
        let record = &meta.imports[0];
        assert_eq!(record.containers.get("c1").map(|s| s.as_str()), Some("c1"));
        assert_eq!(record.containers.get("local").map(|s| s.as_str()), Some("c2"));
        assert_eq!(record.layers.get("base").map(|s| s.as_str()), Some("base"));
        assert_eq!(record.keyframes.get("f").map(|s| s.as_str()), Some("fade"));
        assert!(meta.symbols.get("c1", SymbolNamespace::Container).is_some());
        assert!(meta.symbols.get("base", SymbolNamespace::Layer).is_some());
        assert!(meta.symbols.get("f", SymbolNamespace::Keyframes).is_some());
    }

    #[test]
    fn star_import_is_an_error() {
        let meta = analyze_prelude("[*] from \"./b.st.css\"");
        assert!(
            meta.diagnostics
                .reports()
                .iter()
                .any(|d| d.code == codes::ST_IMPORT_STAR)
        );
    }

    #[test]
    fn empty_from_is_an_error() {
        let meta = analyze_prelude("Button from \"  \"");
        assert!(
            meta.diagnostics
                .reports()
                .iter()
                .any(|d| d.code == codes::EMPTY_IMPORT_FROM)
        );
        assert!(meta.imports.is_empty());
    }

    #[test]
    fn lowercase_default_for_stylesheet_warns() {
        let meta = analyze_prelude("button from \"./b.st.css\"");
        assert!(
            meta.diagnostics
                .reports()
                .iter()
                .any(|d| d.code == codes::LOWERCASE_DEFAULT_IMPORT)
        );
    }

    #[test]
    fn css_var_named_import_registers_in_css_var_namespace() {
        let meta = analyze_prelude("[--accent] from \"./b.st.css\"");
        assert!(meta.symbols.get("accent", SymbolNamespace::CssVar).is_some());
    }

    #[test]
    fn legacy_block_round_trip() {
        let meta = analyze_prelude("Btn, [a, b as c, keyframes(k as l)] from \"./f.st.css\"");
        let serialized = serialize_imported(&meta.imports[0]);

        let root = crate::css::parse(&serialized);
        let crate::css::Node::Rule(rule) = &root.nodes[0] else {
            panic!("expected legacy rule");
        };
        let mut meta2 = ModuleMeta::new("/entry.st.css", "entry", SheetKind::StCss);
        let mut ctx = AnalyzeContext { meta: &mut meta2 };
        StImport.analyze_rule(&mut ctx, rule, &Ancestry::EMPTY);

        let a = &meta.imports[0];
        let b = &meta2.imports[0];
        assert_eq!(a.request, b.request);
        assert_eq!(a.default_export, b.default_export);
        assert_eq!(a.named, b.named);
        assert_eq!(a.keyframes, b.keyframes);
    }
}
