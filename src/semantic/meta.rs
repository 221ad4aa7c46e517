//! Per-module metadata: the analyzed state of one source file.

use std::any::{Any, TypeId};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{NodeId, Span};
use crate::css::Root;
use crate::diagnostics::DiagnosticBag;

use super::symbol_table::SymbolTable;

/// Whether a module uses the full dialect or is a native CSS file.
/// Native CSS files skip the namespacing features: their symbols are
/// registered for cross-module resolution but emitted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    StCss,
    NativeCss,
}

/// One `@st-import` statement or legacy `:import` block.
///
/// Created during analyze; consumed during transform to resolve
/// cross-module references. Import statements never reach the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    /// The raw specifier as written.
    pub request: SmolStr,
    /// Base directory for relative resolution (the importing file's dir).
    pub context: SmolStr,
    pub default_export: Option<SmolStr>,
    /// local name -> origin name
    pub named: IndexMap<SmolStr, SmolStr>,
    pub keyframes: IndexMap<SmolStr, SmolStr>,
    pub layers: IndexMap<SmolStr, SmolStr>,
    pub containers: IndexMap<SmolStr, SmolStr>,
    /// The AST node the import was parsed from.
    pub rule: NodeId,
    pub span: Span,
}

impl Imported {
    pub fn new(request: impl Into<SmolStr>, context: impl Into<SmolStr>, rule: NodeId, span: Span) -> Self {
        Self {
            request: request.into(),
            context: context.into(),
            default_export: None,
            named: IndexMap::new(),
            keyframes: IndexMap::new(),
            layers: IndexMap::new(),
            containers: IndexMap::new(),
            rule,
            span,
        }
    }

    /// The origin name bound to `local` within one typed sub-namespace.
    pub fn origin_of(&self, local: &str, bucket: ImportedBucket) -> Option<&SmolStr> {
        match bucket {
            ImportedBucket::Named => self.named.get(local),
            ImportedBucket::Keyframes => self.keyframes.get(local),
            ImportedBucket::Layers => self.layers.get(local),
            ImportedBucket::Containers => self.containers.get(local),
        }
    }
}

/// The typed sub-namespaces of an import statement's named block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportedBucket {
    Named,
    Keyframes,
    Layers,
    Containers,
}

// ============================================================================
// FEATURE DATA
// ============================================================================

/// Typed per-feature private buckets on the shared module metadata.
///
/// Each feature owns the bucket of its own state type and must not touch
/// another feature's bucket. Reading a bucket that was never registered
/// is a programmer error (an invariant violation, not user input) and
/// panics.
#[derive(Default)]
pub struct FeatureData {
    buckets: FxHashMap<TypeId, Box<dyn Any>>,
}

impl std::fmt::Debug for FeatureData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureData")
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

impl FeatureData {
    pub fn insert<T: Any>(&mut self, value: T) {
        self.buckets.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any>(&self) -> &T {
        self.buckets
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
            .unwrap_or_else(|| {
                panic!(
                    "feature bucket {} was not registered in meta_init",
                    std::any::type_name::<T>()
                )
            })
    }

    pub fn get_mut<T: Any>(&mut self) -> &mut T {
        self.buckets
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut())
            .unwrap_or_else(|| {
                panic!(
                    "feature bucket {} was not registered in meta_init",
                    std::any::type_name::<T>()
                )
            })
    }

    pub fn try_get<T: Any>(&self) -> Option<&T> {
        self.buckets
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }
}

// ============================================================================
// MODULE META
// ============================================================================

/// The analyzed state of one source file.
///
/// Constructed empty, populated by one analyze walk, then read (never
/// extended) by the transform pass, which stores its output in `target`.
#[derive(Debug)]
pub struct ModuleMeta {
    pub path: SmolStr,
    pub namespace: SmolStr,
    pub kind: SheetKind,
    /// The parsed source tree. Immutable after analyze.
    pub ast: Root,
    pub symbols: SymbolTable,
    /// Import statements in source order.
    pub imports: Vec<Imported>,
    /// Analyze-time diagnostics. Transform diagnostics live on the
    /// transform result so repeated transforms do not accumulate.
    pub diagnostics: DiagnosticBag,
    pub data: FeatureData,
    /// The transformed tree from the most recent transform, if any.
    pub target: Option<Root>,
}

impl ModuleMeta {
    pub fn new(path: impl Into<SmolStr>, namespace: impl Into<SmolStr>, kind: SheetKind) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            kind,
            ast: Root::default(),
            symbols: SymbolTable::new(),
            imports: Vec::new(),
            diagnostics: DiagnosticBag::new(),
            data: FeatureData::default(),
            target: None,
        }
    }

    /// Import statements in source order.
    pub fn import_statements(&self) -> &[Imported] {
        &self.imports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct DemoBucket {
        count: usize,
    }

    #[test]
    fn feature_data_round_trip() {
        let mut data = FeatureData::default();
        data.insert(DemoBucket::default());
        data.get_mut::<DemoBucket>().count += 1;
        assert_eq!(data.get::<DemoBucket>().count, 1);
    }

    #[test]
    #[should_panic(expected = "was not registered")]
    fn missing_bucket_panics() {
        let data = FeatureData::default();
        let _ = data.get::<DemoBucket>();
    }

    #[test]
    fn imported_origin_lookup() {
        let mut imported = Imported::new("./a.st.css", "/", NodeId(0), crate::base::empty_span());
        imported.containers.insert("local".into(), "origin".into());
        assert_eq!(
            imported
                .origin_of("local", ImportedBucket::Containers)
                .map(|s| s.as_str()),
            Some("origin")
        );
        assert!(imported.origin_of("local", ImportedBucket::Named).is_none());
    }
}
