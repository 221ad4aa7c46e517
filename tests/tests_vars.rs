use stcss::{MemoryHost, Stcss, TransformResult, codes};

fn compile(files: &[(&str, &str)], entry: &str) -> TransformResult {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host).transform_path(entry).unwrap()
}

#[test]
fn value_calls_expand_and_the_block_is_removed() {
    let result = compile(
        &[(
            "/entry.st.css",
            ":vars { accent: #ff0000; }\n.a { color: value(accent); }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("color: #ff0000;"), "css was:\n{css}");
    assert!(!css.contains(":vars"), "css was:\n{css}");
    assert_eq!(
        result.exports.st_vars.get("accent").map(String::as_str),
        Some("#ff0000")
    );
}

#[test]
fn variables_resolve_transitively() {
    let result = compile(
        &[(
            "/entry.st.css",
            ":vars { base: 4px; double: value(base) value(base); }\n.a { padding: value(double); }",
        )],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("padding: 4px 4px;"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn variables_resolve_across_modules() {
    let result = compile(
        &[
            ("/theme.st.css", ":vars { accent: rebeccapurple; }"),
            (
                "/entry.st.css",
                "@st-import [accent] from './theme.st.css';\n.a { color: value(accent); }",
            ),
        ],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("color: rebeccapurple;"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn cyclic_values_warn_and_keep_the_reference() {
    let result = compile(
        &[(
            "/entry.st.css",
            ":vars { a: value(b); b: value(a); }\n.x { width: value(a); }",
        )],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::CYCLIC_VALUE)
    );
}

#[test]
fn unknown_variable_warns_and_keeps_the_call() {
    let result = compile(
        &[("/entry.st.css", ".a { color: value(missing); }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNKNOWN_VAR && d.word.as_deref() == Some("missing"))
    );
    assert!(result.css().contains("value(missing)"));
}

#[test]
fn nested_value_calls_inside_functions_expand() {
    let result = compile(
        &[(
            "/entry.st.css",
            ":vars { w: 10px; }\n.a { width: calc(value(w) * 2); }",
        )],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("width: calc(10px * 2);"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn custom_properties_are_namespaced_and_exported() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".a { --accent: red; color: var(--accent); }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("--entry-accent: red;"), "css was:\n{css}");
    assert!(css.contains("color: var(--entry-accent);"), "css was:\n{css}");
    assert_eq!(
        result.exports.vars.get("accent").map(String::as_str),
        Some("--entry-accent")
    );
}

#[test]
fn imported_custom_property_uses_defining_namespace() {
    let result = compile(
        &[
            ("/theme.st.css", ".a { --accent: red; }"),
            (
                "/entry.st.css",
                "@st-import [--accent] from './theme.st.css';\n.b { color: var(--accent); }",
            ),
        ],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("color: var(--theme-accent);"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn at_property_registers_and_renames() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@property --angle {\n    syntax: \"<angle>\";\n    inherits: false;\n    initial-value: 0deg;\n}\n.a { rotate: var(--angle); }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("@property --entry-angle"), "css was:\n{css}");
    assert!(css.contains("var(--entry-angle)"), "css was:\n{css}");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn at_property_missing_descriptors_warn() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@property --angle {\n    syntax: \"<angle>\";\n}",
        )],
        "/entry.st.css",
    );
    let missing: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == codes::MISSING_PROPERTY_DESCRIPTOR)
        .collect();
    // inherits and initial-value are both missing
    assert_eq!(missing.len(), 2, "{:?}", result.diagnostics);
}

#[test]
fn st_global_property_is_exempt() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@property st-global(--raw) {\n    syntax: \"*\";\n    inherits: false;\n}\n.a { color: var(--raw); }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("@property --raw"), "css was:\n{css}");
    assert!(css.contains("var(--raw)"), "css was:\n{css}");
}
