use stcss::{MemoryHost, Stcss, TransformResult, codes};

fn compile(files: &[(&str, &str)], entry: &str) -> TransformResult {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host).transform_path(entry).unwrap()
}

#[test]
fn classes_are_namespaced_and_exported() {
    let result = compile(
        &[("/entry.st.css", ".a {}\n.b .a {}")],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains(".entry__a {"), "css was:\n{css}");
    assert!(css.contains(".entry__b .entry__a {"), "css was:\n{css}");
    assert_eq!(
        result.exports.classes.get("a").map(String::as_str),
        Some("entry__a")
    );
    // the implicit root class is always exported
    assert_eq!(
        result.exports.classes.get("root").map(String::as_str),
        Some("entry__root")
    );
}

#[test]
fn extends_chain_composes_the_class_export() {
    let result = compile(
        &[
            ("/base.st.css", ".base {}"),
            (
                "/entry.st.css",
                "@st-import [base] from './base.st.css';\n.derived { -st-extends: base; }",
            ),
        ],
        "/entry.st.css",
    );
    assert_eq!(
        result.exports.classes.get("derived").map(String::as_str),
        Some("entry__derived base__base")
    );
    // -st-extends is build-time only
    assert!(!result.css().contains("-st-extends"));
}

#[test]
fn st_global_class_emits_the_literal_selector() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".header { -st-global: \".site-header\"; }\n.header:hover {}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains(".site-header {"), "css was:\n{css}");
    assert!(css.contains(".site-header:hover {"), "css was:\n{css}");
    assert!(!css.contains("entry__header"), "css was:\n{css}");
}

#[test]
fn extends_of_unknown_symbol_warns_at_transform() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".a { -st-extends: nosuch; }",
        )],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::CANNOT_EXTEND_UNKNOWN_SYMBOL
                && d.word.as_deref() == Some("nosuch"))
    );
}

#[test]
fn extends_in_complex_selector_is_rejected() {
    let result = compile(
        &[("/entry.st.css", ".a .b { -st-extends: whatever; }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::CANNOT_EXTEND_IN_COMPLEX_SELECTOR)
    );
}

#[test]
fn unimported_component_selector_reports_info() {
    let result = compile(
        &[("/entry.st.css", "Gallery { color: red; }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNSCOPED_TYPE_SELECTOR)
    );
    // unknown components are left as-is
    assert!(result.css().contains("Gallery {"));
}

#[test]
fn st_scope_prefixes_nested_rules_and_unwraps() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@st-scope .theme {\n    .a { color: red; }\n    .b { color: blue; }\n}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(!css.contains("@st-scope"), "css was:\n{css}");
    assert!(css.contains(".entry__theme .entry__a {"), "css was:\n{css}");
    assert!(css.contains(".entry__theme .entry__b {"), "css was:\n{css}");
}

#[test]
fn st_scope_nesting_selector_joins_without_descendant_combinator() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@st-scope .theme {\n    &.on { color: red; }\n}",
        )],
        "/entry.st.css",
    );
    assert!(
        result.css().contains(".entry__theme.entry__on {"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn declarations_inside_st_scope_error_and_are_dropped() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@st-scope .theme {\n    color: red;\n    .a {}\n}",
        )],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::ILLEGAL_SCOPE_DECLARATION)
    );
    assert!(!result.css().contains("color: red"));
}

#[test]
fn st_scope_without_selector_errors() {
    let result = compile(
        &[("/entry.st.css", "@st-scope {\n    .a {}\n}")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::MISSING_SCOPING_SELECTOR)
    );
}
