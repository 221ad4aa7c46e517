use stcss::{MemoryHost, SheetKind, Stcss, codes};

fn compiler(files: &[(&str, &str)]) -> Stcss<MemoryHost> {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host)
}

#[test]
fn transforming_twice_is_byte_identical() {
    let mut compiler = compiler(&[
        (
            "/dep.st.css",
            ".part { --x: 1; container-name: con; }\n@keyframes fade {}",
        ),
        (
            "/entry.st.css",
            "@st-import [part, container(con), keyframes(fade)] from './dep.st.css';\n.a { -st-extends: part; }\n.a:hover { color: var(--y); }\n@container con (inline-size > 10px) { .a {} }",
        ),
    ]);
    let first = compiler.transform_path("/entry.st.css").unwrap();
    let second = compiler.transform_path("/entry.st.css").unwrap();
    assert_eq!(first.css(), second.css());
    assert_eq!(first.exports, second.exports);
}

#[test]
fn resolution_follows_import_chains_transitively() {
    let mut compiler = compiler(&[
        ("/c.st.css", ".part { container-name: deep; }"),
        (
            "/b.st.css",
            "@st-import [container(deep)] from './c.st.css';",
        ),
        (
            "/a.st.css",
            "@st-import [container(deep)] from './b.st.css';\n@container deep (inline-size > 1px) {}",
        ),
    ]);
    let result = compiler.transform_path("/a.st.css").unwrap();
    assert!(
        result.css().contains("@container c__deep"),
        "css was:\n{}",
        result.css()
    );
}

#[test]
fn import_cycles_resolve_to_a_defined_dead_end() {
    let mut compiler = compiler(&[
        ("/a.st.css", "@st-import [container(x)] from './b.st.css';\n@container x (inline-size > 1px) {}"),
        ("/b.st.css", "@st-import [container(x)] from './a.st.css';"),
    ]);
    let result = compiler.transform_path("/a.st.css").unwrap();
    // the cycle surfaces as an unknown imported symbol, not a hang
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNKNOWN_IMPORTED_SYMBOL)
    );
}

#[test]
fn invalidation_picks_up_changed_content() {
    let mut host = MemoryHost::new();
    host.add_file("/entry.st.css", ".a { container-name: con; }");
    let mut compiler = Stcss::new(host);
    let before = compiler.transform_path("/entry.st.css").unwrap();
    assert!(before.exports.containers.contains_key("con"));

    // memoized: meta survives until explicitly invalidated
    assert!(compiler.meta("/entry.st.css").is_some());
    compiler.invalidate("/entry.st.css");
    assert!(compiler.meta("/entry.st.css").is_none());

    let after = compiler.transform_path("/entry.st.css").unwrap();
    assert_eq!(before.css(), after.css());
}

#[test]
fn native_css_passes_through_unscoped() {
    let mut compiler = compiler(&[(
        "/plain.css",
        ".a { color: red; }\n@container con (inline-size > 1px) { .b {} }",
    )]);
    let result = compiler.transform_path("/plain.css").unwrap();
    let css = result.css();
    assert!(css.contains(".a {"), "css was:\n{css}");
    assert!(!css.contains("plain__"), "css was:\n{css}");
    let meta = compiler.meta("/plain.css").unwrap();
    assert_eq!(meta.kind, SheetKind::NativeCss);
}

#[test]
fn symbols_imported_from_native_css_stay_global() {
    let mut compiler = compiler(&[
        ("/design.css", ".btn { container-name: shared; }"),
        (
            "/entry.st.css",
            "@st-import [container(shared)] from './design.css';\n@container shared (inline-size > 1px) {}",
        ),
    ]);
    let result = compiler.transform_path("/entry.st.css").unwrap();
    assert!(
        result.css().contains("@container shared (inline-size > 1px)"),
        "css was:\n{}",
        result.css()
    );
    assert_eq!(
        result.exports.containers.get("shared").map(String::as_str),
        Some("shared")
    );
}

#[test]
fn analyze_diagnostics_precede_transform_diagnostics() {
    let mut compiler = compiler(&[(
        "/entry.st.css",
        ".root { -st-states: -bad; }\n@container unknown (inline-size > 1px) {}",
    )]);
    let result = compiler.transform_path("/entry.st.css").unwrap();
    let hyphen = result
        .diagnostics
        .iter()
        .position(|d| d.code == codes::STATE_STARTS_WITH_HYPHEN)
        .expect("analyze diagnostic present");
    let unresolved = result
        .diagnostics
        .iter()
        .position(|d| d.code == codes::UNRESOLVED_CONTAINER_NAME)
        .expect("transform diagnostic present");
    assert!(hyphen < unresolved);
}

#[test]
fn a_file_with_errors_still_produces_output_and_exports() {
    let mut compiler = compiler(&[(
        "/entry.st.css",
        "garbage;\n.a { color: red; }\n.b { -st-mixin: nosuch; }",
    )]);
    let result = compiler.transform_path("/entry.st.css").unwrap();
    assert!(!result.diagnostics.is_empty());
    assert!(result.css().contains(".entry__a {"));
    assert!(result.exports.classes.contains_key("a"));
}
