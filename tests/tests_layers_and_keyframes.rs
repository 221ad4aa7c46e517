use stcss::{MemoryHost, Stcss, TransformResult, codes};

fn compile(files: &[(&str, &str)], entry: &str) -> TransformResult {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host).transform_path(entry).unwrap()
}

#[test]
fn layer_names_are_namespaced_in_statement_and_block_forms() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@layer base, theme;\n@layer base {\n    .a { color: red; }\n}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("@layer entry__base, entry__theme;"), "css was:\n{css}");
    assert!(css.contains("@layer entry__base {"), "css was:\n{css}");
    assert_eq!(
        result.exports.layers.get("base").map(String::as_str),
        Some("entry__base")
    );
    assert_eq!(
        result.exports.layers.get("theme").map(String::as_str),
        Some("entry__theme")
    );
}

#[test]
fn dotted_layer_segments_resolve_independently() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@layer base.controls {\n    .a {}\n}",
        )],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("@layer entry__base.entry__controls {"),
        "css was:\n{}",
        result.css()
    );
    assert!(result.exports.layers.contains_key("base"));
    assert!(result.exports.layers.contains_key("controls"));
}

#[test]
fn escaped_dot_is_part_of_the_layer_name() {
    let result = compile(
        &[("/entry.st.css", "@layer one\\.piece;")],
        "/entry.st.css",
    );
    // a single symbol, not two segments
    assert_eq!(result.exports.layers.len(), 1);
    assert!(result.exports.layers.contains_key("one\\.piece"));
}

#[test]
fn imported_layer_uses_defining_namespace() {
    let result = compile(
        &[
            ("/dep.st.css", "@layer base;"),
            (
                "/entry.st.css",
                "@st-import [layer(base)] from './dep.st.css';\n@layer base {\n    .a {}\n}",
            ),
        ],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("@layer dep__base {"),
        "css was:\n{}",
        result.css()
    );
    assert_eq!(
        result.exports.layers.get("base").map(String::as_str),
        Some("dep__base")
    );
}

#[test]
fn reserved_layer_name_is_rejected() {
    let result = compile(
        &[("/entry.st.css", "@layer initial;")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::RESERVED_LAYER_NAME)
    );
    assert!(result.exports.layers.is_empty());
}

#[test]
fn keyframes_are_namespaced_with_their_usages() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@keyframes slide {\n    from { opacity: 0; }\n    to { opacity: 1; }\n}\n.a { animation: slide 2s ease; }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("@keyframes entry__slide {"), "css was:\n{css}");
    assert!(css.contains("animation: entry__slide 2s ease;"), "css was:\n{css}");
    // frame selectors are untouched
    assert!(css.contains("from {"), "css was:\n{css}");
    assert_eq!(
        result.exports.keyframes.get("slide").map(String::as_str),
        Some("entry__slide")
    );
}

#[test]
fn st_global_keyframes_are_exempt() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@keyframes st-global(fade) {}\n.a { animation-name: fade; }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("@keyframes fade {"), "css was:\n{css}");
    assert!(css.contains("animation-name: fade;"), "css was:\n{css}");
}

#[test]
fn imported_keyframes_with_alias_resolve_to_origin() {
    let result = compile(
        &[
            ("/anim.st.css", "@keyframes fade {}"),
            (
                "/entry.st.css",
                "@st-import [keyframes(fade as f)] from './anim.st.css';\n.a { animation-name: f; }",
            ),
        ],
        "/entry.st.css",
    );
    assert!(
        result.css().contains("animation-name: anim__fade;"),
        "css was:\n{}",
        result.css()
    );
    assert_eq!(
        result.exports.keyframes.get("f").map(String::as_str),
        Some("anim__fade")
    );
}

#[test]
fn reserved_keyframes_name_is_rejected() {
    let result = compile(
        &[("/entry.st.css", "@keyframes none {}")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::RESERVED_KEYFRAMES_NAME)
    );
}

#[test]
fn keyframes_nested_in_a_rule_error() {
    let result = compile(
        &[("/entry.st.css", ".a { @keyframes broken {} }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::ILLEGAL_KEYFRAMES_NESTING)
    );
}
