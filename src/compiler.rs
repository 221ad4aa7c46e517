//! The Stcss facade: per-file meta cache and compile orchestration.
//!
//! One facade instance owns one build's caches. Analysis is memoized by
//! path; transforming a file first analyzes its whole import closure, so
//! cross-module resolution sees every reachable module. Cache
//! invalidation is explicit: the owning build tool calls
//! [`Stcss::invalidate`] (or [`Stcss::clear_cache`]) whenever a file's
//! content changes.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::css::{Root, parse};
use crate::diagnostics::Diagnostic;
use crate::features::{FEATURES, ModuleExports};
use crate::host::{HostError, ModuleHost, dirname};
use crate::pipeline::{analyze, transformer};
use crate::semantic::meta::{ModuleMeta, SheetKind};
use crate::semantic::resolver::ModuleGraph;

/// Computes a module's namespace from its path and source text.
/// Injected so builds can choose hashed vs. readable namespaces.
pub type NamespaceFn = Box<dyn Fn(&str, &str) -> SmolStr>;

/// Per-file transform result: the stable surface consumed by build
/// tooling.
#[derive(Debug)]
pub struct TransformResult {
    pub path: SmolStr,
    pub namespace: SmolStr,
    pub target: Root,
    pub exports: ModuleExports,
    /// Analyze diagnostics followed by transform diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformResult {
    /// Print the transformed stylesheet.
    pub fn css(&self) -> String {
        self.target.to_string()
    }
}

pub struct Stcss<H: ModuleHost> {
    host: H,
    namespace_of: NamespaceFn,
    metas: FxHashMap<SmolStr, ModuleMeta>,
    /// (importing module, raw request) -> resolved path, None = not found.
    requests: FxHashMap<(SmolStr, SmolStr), Option<SmolStr>>,
}

impl<H: ModuleHost> Stcss<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            namespace_of: Box::new(default_namespace),
            metas: FxHashMap::default(),
            requests: FxHashMap::default(),
        }
    }

    /// Replace the namespace computation.
    pub fn with_namespace(mut self, namespace_of: impl Fn(&str, &str) -> SmolStr + 'static) -> Self {
        self.namespace_of = Box::new(namespace_of);
        self
    }

    /// Parse and analyze a module, memoized by path.
    pub fn analyze_path(&mut self, path: &str) -> Result<&ModuleMeta, HostError> {
        if !self.metas.contains_key(path) {
            let source = self.host.read(path)?;
            let ast = parse(&source);
            let namespace = (self.namespace_of)(path, &source);
            let mut meta = ModuleMeta::new(path, namespace, sheet_kind(path));
            analyze(FEATURES, &ast, &mut meta);
            meta.ast = ast;
            self.metas.insert(SmolStr::new(path), meta);
        }
        Ok(&self.metas[path])
    }

    /// Analyze `entry` and every module reachable through its imports.
    fn ensure_closure(&mut self, entry: &str) -> Result<(), HostError> {
        let mut queue = vec![SmolStr::new(entry)];
        let mut seen: FxHashSet<SmolStr> = queue.iter().cloned().collect();
        while let Some(path) = queue.pop() {
            self.analyze_path(&path)?;
            let imports: Vec<(SmolStr, SmolStr)> = self.metas[&path]
                .imports
                .iter()
                .map(|imp| (imp.request.clone(), imp.context.clone()))
                .collect();
            for (request, context) in imports {
                let key = (path.clone(), request.clone());
                let target = match self.requests.get(&key) {
                    Some(cached) => cached.clone(),
                    None => {
                        let resolved = self.host.resolve(&context, &request).ok();
                        self.requests.insert(key, resolved.clone());
                        resolved
                    }
                };
                if let Some(target) = target
                    && seen.insert(target.clone())
                {
                    queue.push(target);
                }
            }
        }
        Ok(())
    }

    /// Transform a module: analyze its closure, rewrite its tree, and
    /// assemble its exports. A file with errors still produces a
    /// best-effort result.
    pub fn transform_path(&mut self, path: &str) -> Result<TransformResult, HostError> {
        self.ensure_closure(path)?;
        let graph = ModuleGraph::new(&self.metas, &self.requests);
        let output =
            transformer::transform(graph, FEATURES, path).expect("entry analyzed by closure");

        let meta = self.metas.get_mut(path).expect("entry analyzed by closure");
        meta.target = Some(output.target.clone());

        let mut diagnostics: Vec<Diagnostic> = meta.diagnostics.reports().to_vec();
        diagnostics.extend(output.diagnostics.reports().iter().cloned());

        Ok(TransformResult {
            path: SmolStr::new(path),
            namespace: meta.namespace.clone(),
            target: output.target,
            exports: output.exports,
            diagnostics,
        })
    }

    /// The analyzed meta of a module, if it is cached.
    pub fn meta(&self, path: &str) -> Option<&ModuleMeta> {
        self.metas.get(path)
    }

    /// Drop one file's cached analysis (call when its content changed).
    pub fn invalidate(&mut self, path: &str) {
        self.metas.remove(path);
        self.requests.retain(|(from, _), _| from != path);
    }

    /// Drop every cache (start of a fresh build).
    pub fn clear_cache(&mut self) {
        self.metas.clear();
        self.requests.clear();
    }
}

fn sheet_kind(path: &str) -> SheetKind {
    if path.ends_with(".st.css") {
        SheetKind::StCss
    } else {
        SheetKind::NativeCss
    }
}

/// Default namespace: the sanitized file stem (`/dir/entry.st.css` ->
/// `entry`). Deterministic across builds of unchanged input.
pub fn default_namespace(path: &str, _source: &str) -> SmolStr {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file
        .strip_suffix(".st.css")
        .or_else(|| file.strip_suffix(".css"))
        .unwrap_or(file);
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        SmolStr::new("ns")
    } else {
        SmolStr::new(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn default_namespace_strips_extensions() {
        assert_eq!(default_namespace("/a/entry.st.css", ""), "entry");
        assert_eq!(default_namespace("/a/plain.css", ""), "plain");
        assert_eq!(default_namespace("weird name.st.css", ""), "weird-name");
    }

    #[test]
    fn analyze_is_memoized_until_invalidated() {
        let host = MemoryHost::new().with_file("/entry.st.css", ".a {}");
        let mut compiler = Stcss::new(host);
        compiler.analyze_path("/entry.st.css").unwrap();
        assert!(compiler.meta("/entry.st.css").is_some());
        compiler.invalidate("/entry.st.css");
        assert!(compiler.meta("/entry.st.css").is_none());
    }

    #[test]
    fn native_css_is_detected_by_extension() {
        assert_eq!(sheet_kind("/a.st.css"), SheetKind::StCss);
        assert_eq!(sheet_kind("/a.css"), SheetKind::NativeCss);
    }
}
