use stcss::{MemoryHost, Stcss, TransformResult, codes};

fn compile(files: &[(&str, &str)], entry: &str) -> TransformResult {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host).transform_path(entry).unwrap()
}

#[test]
fn mixin_declarations_inline_in_place() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".mix { color: blue; border: 1px; }\n.target { width: 1px; -st-mixin: mix; height: 2px; }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    let target_rule = css
        .split("\n\n")
        .find(|chunk| chunk.contains(".entry__target"))
        .expect("target rule in output");
    // positional merge: width, then the mixin content, then height
    let width = target_rule.find("width: 1px").unwrap();
    let color = target_rule.find("color: blue").unwrap();
    let border = target_rule.find("border: 1px").unwrap();
    let height = target_rule.find("height: 2px").unwrap();
    assert!(width < color && color < border && border < height, "rule was:\n{target_rule}");
    assert!(!css.contains("-st-mixin"), "css was:\n{css}");
}

#[test]
fn mixin_content_resolves_in_its_origin_module() {
    let result = compile(
        &[
            ("/a.st.css", ".mix { prop: var(--a); }"),
            (
                "/entry.st.css",
                "@st-import [mix] from './a.st.css';\n.root { -st-mixin: mix; }",
            ),
        ],
        "/entry.st.css",
    );
    // the custom property keeps the origin module's namespace
    assert!(
        result.css().contains("prop: var(--a-a);"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn variant_rules_are_rebased_onto_the_target() {
    let result = compile(
        &[
            (
                "/a.st.css",
                ".mix { color: blue; }\n.mix:hover { color: red; }",
            ),
            (
                "/entry.st.css",
                "@st-import [mix] from './a.st.css';\n.root { -st-mixin: mix; }",
            ),
        ],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains(".entry__root:hover"), "css was:\n{css}");
    assert!(!css.contains(".a__mix"), "origin class must not leak:\n{css}");
}

#[test]
fn conditional_wrapper_is_recreated_as_a_sibling() {
    let result = compile(
        &[
            (
                "/a.st.css",
                "@media (min-width: 100px) { .mix { color: red; } }\n.mix { color: blue; }",
            ),
            (
                "/entry.st.css",
                "@st-import [mix] from './a.st.css';\n.root { -st-mixin: mix; }",
            ),
        ],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(
        css.contains("@media (min-width: 100px)"),
        "css was:\n{css}"
    );
    // the wrapped copy targets the consuming rule
    let media_pos = css.find("@media").unwrap();
    assert!(
        css[media_pos..].contains(".entry__root"),
        "css was:\n{css}"
    );
}

#[test]
fn mixin_arguments_override_origin_variables() {
    let result = compile(
        &[
            (
                "/a.st.css",
                ":vars { accent: blue; }\n.mix { color: value(accent); }",
            ),
            (
                "/entry.st.css",
                "@st-import [mix] from './a.st.css';\n.plain { -st-mixin: mix; }\n.custom { -st-mixin: mix(accent green); }",
            ),
        ],
        "/entry.st.css",
    );
    let css = result.css();
    let plain = css
        .split("\n\n")
        .find(|chunk| chunk.contains(".entry__plain"))
        .expect("plain rule");
    let custom = css
        .split("\n\n")
        .find(|chunk| chunk.contains(".entry__custom"))
        .expect("custom rule");
    assert!(plain.contains("color: blue;"), "rule was:\n{plain}");
    assert!(custom.contains("color: green;"), "rule was:\n{custom}");
}

#[test]
fn repeated_mixin_declarations_append() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".m1 { color: red; }\n.m2 { color: blue; }\n.target { -st-mixin: m1; -st-mixin: m2; }",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    let target_rule = css
        .split("\n\n")
        .find(|chunk| chunk.contains(".entry__target"))
        .expect("target rule");
    let red = target_rule.find("color: red").unwrap();
    let blue = target_rule.find("color: blue").unwrap();
    assert!(red < blue, "rule was:\n{target_rule}");
}

#[test]
fn nested_mixins_expand_recursively() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".inner { color: red; }\n.outer { -st-mixin: inner; width: 1px; }\n.target { -st-mixin: outer; }",
        )],
        "/entry.st.css",
    );
    let target_rule = result.css();
    let target_chunk = target_rule
        .split("\n\n")
        .find(|chunk| chunk.contains(".entry__target"))
        .expect("target rule");
    assert!(target_chunk.contains("color: red"), "rule was:\n{target_chunk}");
    assert!(target_chunk.contains("width: 1px"), "rule was:\n{target_chunk}");
}

#[test]
fn self_referential_mixin_is_a_transform_error() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".mix { color: red; -st-mixin: mix; }\n.target { -st-mixin: mix; }",
        )],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::CIRCULAR_MIXIN)
    );
}

#[test]
fn unknown_mixin_is_a_transform_error() {
    let result = compile(
        &[("/entry.st.css", ".target { -st-mixin: nosuch; }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNKNOWN_MIXIN && d.word.as_deref() == Some("nosuch"))
    );
    assert!(!result.css().contains("-st-mixin"));
}
