//! Custom pseudo-states: `-st-states` definitions and `:state` usage.
//!
//! ```css
//! .root {
//!     -st-states: open,
//!                 size(enum(small, medium, large)) medium,
//!                 count(number(min(0), max(9))),
//!                 label(string(minLength(2))),
//!                 col("[data-col=$0]", string);
//! }
//! ```
//!
//! Definitions are validated during analyze; default values are
//! validated at transform time because they may reference build-time
//! variables.

use smol_str::SmolStr;

use crate::css::ast::Declaration;
use crate::css::selector::SelectorNode;
use crate::css::value::{ValueNode, serialize_value, split_commas, tokenize_value, trim_spaces};
use crate::diagnostics::{Diagnostic, codes};
use crate::semantic::meta::SheetKind;
use crate::semantic::symbol::{StSymbol, StateDef, StateParam, SymbolNamespace};

use super::{
    AnalyzeContext, Ancestry, ClassLink, Feature, ModuleScope, NodeAction, ResolveContext,
    TransformContext,
};

pub struct StStates;

/// Native pseudo-classes a custom state may not shadow. Also consulted
/// by the selector scoping pass to leave native pseudo-classes alone.
pub const NATIVE_PSEUDO_CLASSES: &[&str] = &[
    "active", "any-link", "autofill", "blank", "buffering", "checked", "current", "default",
    "defined", "dir", "disabled", "empty", "enabled", "first", "first-child", "first-of-type",
    "focus", "focus-visible", "focus-within", "fullscreen", "future", "has", "host", "hover",
    "in-range", "indeterminate", "invalid", "is", "lang", "last-child", "last-of-type", "left",
    "link", "matches", "modal", "muted", "not", "nth-child", "nth-last-child", "nth-last-of-type",
    "nth-of-type", "only-child", "only-of-type", "optional", "out-of-range", "past", "paused",
    "placeholder-shown", "playing", "popover-open", "read-only", "read-write", "required",
    "right", "root", "scope", "seeking", "stalled", "target", "user-invalid", "user-valid",
    "valid", "visited", "volume-locked", "where",
];

/// Functional pseudo-classes whose argument is itself a selector list.
pub const SELECTOR_FUNCTION_PSEUDOS: &[&str] = &["not", "is", "where", "has", "matches"];

pub fn is_native_pseudo(name: &str) -> bool {
    NATIVE_PSEUDO_CLASSES.binary_search(&name).is_ok()
}

impl Feature for StStates {
    fn name(&self) -> &'static str {
        "st-states"
    }

    fn analyze_declaration(
        &self,
        ctx: &mut AnalyzeContext<'_>,
        decl: &Declaration,
        ancestry: &Ancestry<'_>,
    ) {
        if decl.prop != "-st-states" || ctx.meta.kind != SheetKind::StCss {
            return;
        }
        let Some(subject) = state_subject(ancestry) else {
            ctx.error(
                decl.id,
                decl.span,
                codes::STATE_DEFINITION_IN_COMPLEX_SELECTOR,
                "-st-states is only valid inside a simple class or element rule",
            );
            return;
        };
        let states = parse_states_value(ctx, decl);
        let Some(symbol) = ctx
            .meta
            .symbols
            .get_mut(&subject, SymbolNamespace::Main)
        else {
            return;
        };
        let existing = match symbol {
            StSymbol::Class { states, .. } | StSymbol::Element { states, .. } => states,
            _ => return,
        };
        let mut duplicates = Vec::new();
        for (name, def) in states {
            if existing.contains_key(&name) {
                duplicates.push(name);
            } else {
                existing.insert(name, def);
            }
        }
        for name in duplicates {
            ctx.warning(
                decl.id,
                decl.span,
                codes::REDECLARE_STATE,
                format!("state \"{name}\" is already declared; the first definition wins"),
            );
        }
    }

    fn transform_resolve(&self, rctx: &mut ResolveContext<'_, '_>) {
        // defaults may reference build-time variables, so they are
        // validated here, after the vars feature has evaluated them
        let meta = rctx.meta;
        let mut issues = Vec::new();
        for (_, sym) in meta.symbols.all(SymbolNamespace::Main) {
            let states = match sym {
                StSymbol::Class { states, .. } | StSymbol::Element { states, .. } => states,
                _ => continue,
            };
            for (state_name, def) in states {
                let (param, default) = match def {
                    StateDef::Param { param, default } | StateDef::Template { param, default, .. } => {
                        (param, default)
                    }
                    _ => continue,
                };
                let Some(default) = default else { continue };
                let expanded = expand_default(default, &rctx.maps.st_vars);
                if let Err(message) = validate_param(param, &expanded) {
                    issues.push(
                        Diagnostic::error(
                            sym.node(),
                            sym.span(),
                            format!(
                                "default value \"{expanded}\" of state \"{state_name}\" is invalid: {message}"
                            ),
                        )
                        .with_code(codes::STATE_VALIDATION_FAILED)
                        .with_word(state_name.clone()),
                    );
                }
            }
        }
        for issue in issues {
            rctx.report(issue);
        }
    }

    fn transform_declaration(
        &self,
        _ctx: &mut TransformContext<'_>,
        _scope: &ModuleScope,
        decl: &mut Declaration,
    ) -> NodeAction {
        if decl.prop == "-st-states" {
            NodeAction::Remove
        } else {
            NodeAction::Keep
        }
    }
}

/// The subject of a `-st-states` declaration: the single class or type
/// of the nearest rule.
fn state_subject(ancestry: &Ancestry<'_>) -> Option<SmolStr> {
    let rule = ancestry.nearest_rule()?;
    let list = crate::css::selector::parse_selector_list(&rule.selector);
    let [selector] = list.selectors.as_slice() else {
        return None;
    };
    match selector.nodes.as_slice() {
        [SelectorNode::Class(name)] | [SelectorNode::Type(name)] => Some(name.clone()),
        _ => None,
    }
}

// ============================================================================
// DEFINITION PARSING
// ============================================================================

fn parse_states_value(ctx: &mut AnalyzeContext<'_>, decl: &Declaration) -> Vec<(SmolStr, StateDef)> {
    let nodes = tokenize_value(&decl.value);
    let mut states = Vec::new();
    for segment in split_commas(&nodes) {
        let compact: Vec<&ValueNode> = segment.iter().filter(|n| !n.is_space()).collect();
        let (name, def) = match compact.as_slice() {
            [ValueNode::Ident(name)] => (name.clone(), Some(StateDef::Boolean)),
            [ValueNode::Func { name, args }, rest @ ..] => {
                let default = if rest.is_empty() {
                    None
                } else {
                    Some(
                        serialize_value(&rest.iter().map(|n| (*n).clone()).collect::<Vec<_>>())
                            .trim()
                            .to_string(),
                    )
                };
                (name.clone(), parse_state_def(ctx, decl, name, args, default))
            }
            _ => {
                ctx.error(
                    decl.id,
                    decl.span,
                    codes::UNKNOWN_STATE_TYPE,
                    format!("invalid state definition \"{}\"", serialize_value(&segment)),
                );
                continue;
            }
        };
        if name.starts_with('-') {
            ctx.error(
                decl.id,
                decl.span,
                codes::STATE_STARTS_WITH_HYPHEN,
                format!("state \"{name}\" cannot start with \"-\""),
            );
            continue;
        }
        if is_native_pseudo(&name) {
            ctx.error(
                decl.id,
                decl.span,
                codes::RESERVED_STATE_NAME,
                format!("state \"{name}\" collides with a native pseudo-class"),
            );
            continue;
        }
        if let Some(def) = def {
            states.push((name, def));
        }
    }
    states
}

fn parse_state_def(
    ctx: &mut AnalyzeContext<'_>,
    decl: &Declaration,
    state_name: &SmolStr,
    args: &[ValueNode],
    default: Option<String>,
) -> Option<StateDef> {
    let segments = split_commas(args);
    if segments.is_empty() {
        return Some(StateDef::Boolean);
    }

    let first: Vec<&ValueNode> = segments[0].iter().filter(|n| !n.is_space()).collect();
    if let [ValueNode::QuotedString(raw)] = first.as_slice() {
        // mapped or template state
        let template = unquote(raw);
        let placeholders = template.matches("$0").count();
        let params = &segments[1..];
        return match (placeholders, params.len()) {
            (0, 0) => Some(StateDef::Mapped { template }),
            (1, 1) => {
                let param = parse_param(ctx, decl, &params[0])?;
                Some(StateDef::Template {
                    template,
                    param,
                    default,
                })
            }
            (p, n) if p < 1 || n < 1 => {
                ctx.error(
                    decl.id,
                    decl.span,
                    codes::TEMPLATE_MISSING_PARAMETER,
                    format!(
                        "template state \"{state_name}\" requires exactly one $0 placeholder and one parameter"
                    ),
                );
                None
            }
            _ => {
                ctx.error(
                    decl.id,
                    decl.span,
                    codes::TEMPLATE_MULTI_PARAMETER,
                    format!(
                        "template state \"{state_name}\" accepts exactly one $0 placeholder and one parameter"
                    ),
                );
                None
            }
        };
    }

    if segments.len() > 1 {
        ctx.error(
            decl.id,
            decl.span,
            codes::UNKNOWN_STATE_TYPE,
            format!("state \"{state_name}\" accepts a single type definition"),
        );
        return None;
    }
    match first.as_slice() {
        [ValueNode::Ident(kw)] if kw == "boolean" => Some(StateDef::Boolean),
        _ => {
            let param = parse_param(ctx, decl, &segments[0])?;
            Some(StateDef::Param { param, default })
        }
    }
}

fn parse_param(
    ctx: &mut AnalyzeContext<'_>,
    decl: &Declaration,
    segment: &[ValueNode],
) -> Option<StateParam> {
    let compact: Vec<&ValueNode> = segment.iter().filter(|n| !n.is_space()).collect();
    match compact.as_slice() {
        [ValueNode::Ident(kw)] => match kw.as_str() {
            "string" => Some(StateParam::String {
                min_length: None,
                max_length: None,
                contains: None,
                regex: None,
            }),
            "number" => Some(StateParam::Number {
                min: None,
                max: None,
                multiple_of: None,
            }),
            "tag" => Some(StateParam::Tag),
            other => {
                unknown_type(ctx, decl, other);
                None
            }
        },
        [ValueNode::Func { name, args }] => match name.as_str() {
            "enum" => {
                let options: Vec<SmolStr> = split_commas(args)
                    .iter()
                    .filter_map(|seg| {
                        let compact = trim_spaces(seg.clone());
                        match compact.as_slice() {
                            [ValueNode::Ident(option)] => Some(option.clone()),
                            _ => None,
                        }
                    })
                    .collect();
                if options.is_empty() {
                    unknown_type(ctx, decl, "enum()");
                    None
                } else {
                    Some(StateParam::Enum { options })
                }
            }
            "string" => parse_string_checks(ctx, decl, args),
            "number" => parse_number_checks(ctx, decl, args),
            other => {
                unknown_type(ctx, decl, other);
                None
            }
        },
        _ => {
            unknown_type(ctx, decl, &serialize_value(segment));
            None
        }
    }
}

fn parse_string_checks(
    ctx: &mut AnalyzeContext<'_>,
    decl: &Declaration,
    args: &[ValueNode],
) -> Option<StateParam> {
    let mut min_length = None;
    let mut max_length = None;
    let mut contains = None;
    let mut regex = None;
    for segment in split_commas(args) {
        let compact = trim_spaces(segment);
        let [ValueNode::Func { name, args }] = compact.as_slice() else {
            unknown_type(ctx, decl, &serialize_value(&compact));
            continue;
        };
        let arg = single_arg_text(args);
        match (name.as_str(), arg) {
            ("minLength", Some(v)) => min_length = v.parse().ok(),
            ("maxLength", Some(v)) => max_length = v.parse().ok(),
            ("contains", Some(v)) => contains = Some(v),
            ("regex", Some(v)) => regex = Some(v),
            (other, _) => unknown_type(ctx, decl, other),
        }
    }
    Some(StateParam::String {
        min_length,
        max_length,
        contains,
        regex,
    })
}

fn parse_number_checks(
    ctx: &mut AnalyzeContext<'_>,
    decl: &Declaration,
    args: &[ValueNode],
) -> Option<StateParam> {
    let mut min = None;
    let mut max = None;
    let mut multiple_of = None;
    for segment in split_commas(args) {
        let compact = trim_spaces(segment);
        let [ValueNode::Func { name, args }] = compact.as_slice() else {
            unknown_type(ctx, decl, &serialize_value(&compact));
            continue;
        };
        let arg = single_arg_text(args).and_then(|v| v.parse::<f64>().ok());
        match (name.as_str(), arg) {
            ("min", Some(v)) => min = Some(v),
            ("max", Some(v)) => max = Some(v),
            ("multipleOf", Some(v)) => multiple_of = Some(v),
            (other, _) => unknown_type(ctx, decl, other),
        }
    }
    Some(StateParam::Number {
        min,
        max,
        multiple_of,
    })
}

fn single_arg_text(args: &[ValueNode]) -> Option<String> {
    let compact = trim_spaces(args.to_vec());
    match compact.as_slice() {
        [ValueNode::Ident(text)] => Some(text.to_string()),
        [ValueNode::QuotedString(raw)] => Some(unquote(raw)),
        _ => None,
    }
}

fn unknown_type(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, what: &str) {
    ctx.error(
        decl.id,
        decl.span,
        codes::UNKNOWN_STATE_TYPE,
        format!("unknown state type \"{what}\""),
    );
}

fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'').to_string()
}

// ============================================================================
// VALIDATION & RENDERING
// ============================================================================

/// Validate a state parameter value, returning the type-specific message
/// on failure.
pub fn validate_param(param: &StateParam, value: &str) -> Result<(), String> {
    match param {
        StateParam::Enum { options } => {
            if options.iter().any(|o| o == value) {
                Ok(())
            } else {
                let expected: Vec<&str> = options.iter().map(|o| o.as_str()).collect();
                Err(format!(
                    "expected one of [{}], got \"{value}\"",
                    expected.join(", ")
                ))
            }
        }
        StateParam::Number {
            min,
            max,
            multiple_of,
        } => {
            let number: f64 = value
                .parse()
                .map_err(|_| format!("expected a number, got \"{value}\""))?;
            if let Some(min) = min
                && number < *min
            {
                return Err(format!("{number} is below the minimum {min}"));
            }
            if let Some(max) = max
                && number > *max
            {
                return Err(format!("{number} is above the maximum {max}"));
            }
            if let Some(step) = multiple_of
                && (number % step).abs() > f64::EPSILON
            {
                return Err(format!("{number} is not a multiple of {step}"));
            }
            Ok(())
        }
        StateParam::String {
            min_length,
            max_length,
            contains,
            regex,
        } => {
            let length = value.chars().count();
            if let Some(min) = min_length
                && length < *min
            {
                return Err(format!("length {length} is below minLength {min}"));
            }
            if let Some(max) = max_length
                && length > *max
            {
                return Err(format!("length {length} is above maxLength {max}"));
            }
            if let Some(needle) = contains
                && !value.contains(needle.as_str())
            {
                return Err(format!("\"{value}\" does not contain \"{needle}\""));
            }
            if let Some(pattern) = regex {
                let compiled = regex::Regex::new(pattern)
                    .map_err(|_| format!("invalid regex \"{pattern}\""))?;
                if !compiled.is_match(value) {
                    return Err(format!("\"{value}\" does not match /{pattern}/"));
                }
            }
            Ok(())
        }
        StateParam::Tag => {
            if value.contains(char::is_whitespace) {
                Err(format!("tag value \"{value}\" cannot contain whitespace"))
            } else {
                Ok(())
            }
        }
    }
}

/// Render a state usage to its output selector fragment.
///
/// `value` is the usage argument (or the state's default), already
/// expanded through build-time variables.
pub fn render_state_usage(
    link: &ClassLink,
    name: &str,
    def: &StateDef,
    value: Option<String>,
) -> Result<String, String> {
    match def {
        StateDef::Boolean => {
            if value.is_some() {
                return Err(format!("boolean state \"{name}\" accepts no parameter"));
            }
            Ok(format!(".{}", boolean_state_class(&link.namespace, name)))
        }
        StateDef::Param { param, .. } => {
            let Some(value) = value else {
                return Err(format!("state \"{name}\" requires a parameter"));
            };
            validate_param(param, &value)?;
            let clean = sanitize(&value);
            Ok(format!(
                ".{}---{name}-{}-{clean}",
                link.namespace,
                clean.chars().count()
            ))
        }
        StateDef::Mapped { template } => Ok(template.clone()),
        StateDef::Template {
            template, param, ..
        } => {
            let Some(value) = value else {
                return Err(format!("state \"{name}\" requires a parameter"));
            };
            validate_param(param, &value)?;
            Ok(template.replace("$0", &value))
        }
    }
}

/// The class emitted for a boolean state.
pub fn boolean_state_class(namespace: &str, state: &str) -> String {
    format!("{namespace}--{state}")
}

/// Expand `value()` references inside a default value.
pub(crate) fn expand_default(
    default: &str,
    st_vars: &rustc_hash::FxHashMap<SmolStr, String>,
) -> String {
    if !default.contains("value(") {
        return default.to_string();
    }
    let nodes = tokenize_value(default);
    let expanded: Vec<ValueNode> = nodes
        .iter()
        .map(|node| match node {
            ValueNode::Func { name, args } if name == "value" => {
                let target = trim_spaces(args.clone());
                if let [ValueNode::Ident(var)] = target.as_slice()
                    && let Some(value) = st_vars.get(var)
                {
                    ValueNode::Ident(SmolStr::new(value))
                } else {
                    node.clone()
                }
            }
            other => other.clone(),
        })
        .collect();
    serialize_value(&expanded)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
