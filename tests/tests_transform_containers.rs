use stcss::{MemoryHost, Stcss, TransformResult, codes};

fn compile(files: &[(&str, &str)], entry: &str) -> TransformResult {
    let mut host = MemoryHost::new();
    for (path, source) in files {
        host.add_file(*path, *source);
    }
    Stcss::new(host).transform_path(entry).unwrap()
}

#[test]
fn scopes_container_definition_and_usage() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".a { container-name: con; }\n@container con (inline-size>100px) {}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("container-name: entry__con;"), "css was:\n{css}");
    assert!(
        css.contains("@container entry__con (inline-size>100px)"),
        "css was:\n{css}"
    );
    assert_eq!(
        result.exports.containers.get("con").map(String::as_str),
        Some("entry__con")
    );
}

#[test]
fn imported_container_scopes_to_its_defining_module() {
    let result = compile(
        &[
            (
                "/imported.st.css",
                ".a { container-name: c1; }",
            ),
            (
                "/entry.st.css",
                "@st-import [container(c1)] from './imported.st.css';\n@container c1 (inline-size > 100px) {}",
            ),
        ],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(
        css.contains("@container imported__c1 (inline-size > 100px)"),
        "css was:\n{css}"
    );
    assert_eq!(
        result.exports.containers.get("c1").map(String::as_str),
        Some("imported__c1")
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn st_global_container_is_exempt_from_namespacing() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".a { container-name: st-global(foo); }\n@container foo (inline-size > 1px) {}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(css.contains("container-name: foo;"), "css was:\n{css}");
    assert!(css.contains("@container foo (inline-size > 1px)"), "css was:\n{css}");
    assert!(!css.contains("entry__foo"));
    assert_eq!(
        result.exports.containers.get("foo").map(String::as_str),
        Some("foo")
    );
}

#[test]
fn unresolved_container_name_reports_exactly_once() {
    let result = compile(
        &[("/entry.st.css", "@container unknown (inline-size > 100px) {}")],
        "/entry.st.css",
    );
    let unresolved: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == codes::UNRESOLVED_CONTAINER_NAME)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].word.as_deref(), Some("unknown"));
    // the rewrite falls back to the original identifier
    assert!(result.css().contains("@container unknown"));
}

#[test]
fn statement_definition_is_removed_from_output() {
    let result = compile(
        &[(
            "/entry.st.css",
            "@container con;\n@container con (inline-size > 100px) {}",
        )],
        "/entry.st.css",
    );
    let css = result.css();
    assert!(!css.contains("@container entry__con;"), "css was:\n{css}");
    assert!(css.contains("@container entry__con (inline-size > 100px)"));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn container_shorthand_validates_type_keyword() {
    let result = compile(
        &[(
            "/entry.st.css",
            ".a { container: con / bogus; }\n.b { container: other / ; }",
        )],
        "/entry.st.css",
    );
    let diag_codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code).collect();
    assert!(diag_codes.contains(&codes::UNKNOWN_CONTAINER_TYPE));
    assert!(diag_codes.contains(&codes::MISSING_CONTAINER_TYPE));
    // valid names still register and scope
    assert!(result.css().contains("entry__con / bogus"));
}

#[test]
fn reserved_container_names_are_rejected() {
    let result = compile(
        &[("/entry.st.css", ".a { container-name: and; }")],
        "/entry.st.css",
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::RESERVED_CONTAINER_NAME)
    );
    assert!(result.exports.containers.is_empty());
}

#[test]
fn none_is_never_registered() {
    let result = compile(
        &[("/entry.st.css", ".a { container-name: none; }")],
        "/entry.st.css",
    );
    assert!(result.exports.containers.is_empty());
    assert!(result.css().contains("container-name: none;"));
}
