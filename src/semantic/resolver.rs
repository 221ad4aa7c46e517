//! Cross-module symbol resolution.
//!
//! [`SymbolResolver::deep_resolve`] follows import chains, possibly
//! through several intermediate modules, to the defining module and
//! symbol. Cycles and dead-ends are defined outcomes, never unbounded
//! recursion. Results are memoized per (module path, namespace, name);
//! the owning facade clears the cache when files change.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::meta::{ImportedBucket, ModuleMeta};
use super::symbol::{ImportKind, StSymbol, SymbolNamespace};

/// Read access to every analyzed module reachable in the current build,
/// plus the host's request-resolution results.
#[derive(Clone, Copy)]
pub struct ModuleGraph<'a> {
    metas: &'a FxHashMap<SmolStr, ModuleMeta>,
    /// (importing module path, raw request) -> resolved path, or `None`
    /// when the host reported the module as not found.
    requests: &'a FxHashMap<(SmolStr, SmolStr), Option<SmolStr>>,
}

impl<'a> ModuleGraph<'a> {
    pub fn new(
        metas: &'a FxHashMap<SmolStr, ModuleMeta>,
        requests: &'a FxHashMap<(SmolStr, SmolStr), Option<SmolStr>>,
    ) -> Self {
        Self { metas, requests }
    }

    pub fn meta(&self, path: &str) -> Option<&'a ModuleMeta> {
        self.metas.get(path)
    }

    /// The path a request resolved to, if the host could resolve it.
    pub fn request_target(&self, from: &str, request: &str) -> Option<&'a SmolStr> {
        self.requests
            .get(&(SmolStr::new(from), SmolStr::new(request)))
            .and_then(|r| r.as_ref())
    }
}

/// A symbol together with its defining module.
#[derive(Clone, Copy)]
pub struct ResolvedSymbol<'g> {
    pub meta: &'g ModuleMeta,
    pub symbol: &'g StSymbol,
}

/// Outcome of a deep resolution request.
pub enum ResolveOutcome<'g> {
    Resolved(ResolvedSymbol<'g>),
    /// The import chain hit a request the host could not resolve.
    UnknownFile { request: SmolStr },
    /// A file resolved, but the requested name is absent from it
    /// (or the chain cycled back on itself).
    UnknownSymbol { file: SmolStr, name: SmolStr },
    /// No symbol with that name exists in the starting module.
    NotFound,
}

impl<'g> ResolveOutcome<'g> {
    pub fn resolved(self) -> Option<ResolvedSymbol<'g>> {
        match self {
            ResolveOutcome::Resolved(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Cached {
    Resolved {
        path: SmolStr,
        name: SmolStr,
        ns: SymbolNamespace,
    },
    UnknownFile {
        request: SmolStr,
    },
    UnknownSymbol {
        file: SmolStr,
        name: SmolStr,
    },
    NotFound,
}

pub struct SymbolResolver<'g> {
    graph: ModuleGraph<'g>,
    cache: FxHashMap<(SmolStr, SymbolNamespace, SmolStr), Cached>,
}

impl<'g> SymbolResolver<'g> {
    pub fn new(graph: ModuleGraph<'g>) -> Self {
        Self {
            graph,
            cache: FxHashMap::default(),
        }
    }

    pub fn graph(&self) -> ModuleGraph<'g> {
        self.graph
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Follow the import chain of `name` in the module at `path` until a
    /// non-import symbol is found or the chain dead-ends.
    pub fn deep_resolve(
        &mut self,
        path: &str,
        name: &str,
        ns: SymbolNamespace,
    ) -> ResolveOutcome<'g> {
        let key = (SmolStr::new(path), ns, SmolStr::new(name));
        if let Some(cached) = self.cache.get(&key) {
            return self.materialize(cached.clone());
        }
        let cached = self.walk(path, name, ns);
        tracing::trace!(?path, ?name, ?ns, outcome = ?cached, "deep_resolve");
        self.cache.insert(key, cached.clone());
        self.materialize(cached)
    }

    fn walk(&self, start_path: &str, start_name: &str, ns: SymbolNamespace) -> Cached {
        let mut path = SmolStr::new(start_path);
        let mut name = SmolStr::new(start_name);
        let mut visited: FxHashSet<(SmolStr, SmolStr)> = FxHashSet::default();
        visited.insert((path.clone(), name.clone()));
        let mut hops = 0usize;

        loop {
            let Some(meta) = self.graph.meta(&path) else {
                return if hops == 0 {
                    Cached::NotFound
                } else {
                    Cached::UnknownSymbol { file: path, name }
                };
            };
            let Some(symbol) = meta.symbols.get(&name, ns) else {
                return if hops == 0 {
                    Cached::NotFound
                } else {
                    Cached::UnknownSymbol { file: path, name }
                };
            };
            let Some(import_ref) = symbol.import_ref() else {
                return Cached::Resolved { path, name, ns };
            };
            let Some(imported) = meta.imports.get(import_ref.0) else {
                return Cached::NotFound;
            };
            let Some(target) = self.graph.request_target(&path, &imported.request) else {
                return Cached::UnknownFile {
                    request: imported.request.clone(),
                };
            };
            let Some(origin) = origin_name(symbol, imported, ns) else {
                return Cached::UnknownSymbol {
                    file: target.clone(),
                    name: name.clone(),
                };
            };
            path = target.clone();
            name = origin;
            hops += 1;
            if !visited.insert((path.clone(), name.clone())) {
                // import cycle: a defined dead-end
                return Cached::UnknownSymbol { file: path, name };
            }
        }
    }

    fn materialize(&self, cached: Cached) -> ResolveOutcome<'g> {
        match cached {
            Cached::Resolved { path, name, ns } => {
                let Some(meta) = self.graph.meta(&path) else {
                    return ResolveOutcome::NotFound;
                };
                let Some(symbol) = meta.symbols.get(&name, ns) else {
                    return ResolveOutcome::NotFound;
                };
                ResolveOutcome::Resolved(ResolvedSymbol { meta, symbol })
            }
            Cached::UnknownFile { request } => ResolveOutcome::UnknownFile { request },
            Cached::UnknownSymbol { file, name } => ResolveOutcome::UnknownSymbol { file, name },
            Cached::NotFound => ResolveOutcome::NotFound,
        }
    }
}

/// The name to look up in the import's target module.
fn origin_name(
    symbol: &StSymbol,
    imported: &super::meta::Imported,
    ns: SymbolNamespace,
) -> Option<SmolStr> {
    match ns {
        SymbolNamespace::Main => match symbol {
            StSymbol::Import { kind, .. } => match kind {
                // a default import refers to the target stylesheet's root
                ImportKind::Default => Some(SmolStr::new("root")),
                ImportKind::Named { origin } => Some(origin.clone()),
            },
            _ => None,
        },
        SymbolNamespace::CssVar => {
            // css vars are bound through the named block with their dashes
            let raw = format!("--{}", symbol.name());
            imported
                .origin_of(&raw, ImportedBucket::Named)
                .map(|origin| SmolStr::new(origin.trim_start_matches("--")))
        }
        SymbolNamespace::Keyframes => imported
            .origin_of(symbol.name(), ImportedBucket::Keyframes)
            .cloned(),
        SymbolNamespace::Layer => imported
            .origin_of(symbol.name(), ImportedBucket::Layers)
            .cloned(),
        SymbolNamespace::Container => imported
            .origin_of(symbol.name(), ImportedBucket::Containers)
            .cloned(),
    }
}
