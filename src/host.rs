//! Filesystem seam: module resolution and file reading.
//!
//! The core never touches the filesystem directly; the facade is handed
//! a [`ModuleHost`]. [`MemoryHost`] backs tests and in-memory builds,
//! [`FsHost`] reads from disk.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("module not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait ModuleHost {
    /// Resolve a specifier relative to the importing file's directory.
    fn resolve(&self, from_dir: &str, specifier: &str) -> Result<SmolStr, HostError>;

    /// Read a resolved module's source text.
    fn read(&self, path: &str) -> Result<Arc<str>, HostError>;
}

/// The directory part of a `/`-separated module path.
pub fn dirname(path: &str) -> SmolStr {
    match path.rfind('/') {
        Some(0) => SmolStr::new("/"),
        Some(idx) => SmolStr::new(&path[..idx]),
        None => SmolStr::new("."),
    }
}

/// Join a relative specifier onto a base directory and normalize `.`/`..`
/// segments. Absolute specifiers pass through.
pub fn join_normalize(base: &str, specifier: &str) -> String {
    let joined = if specifier.starts_with('/') {
        specifier.to_string()
    } else {
        format!("{base}/{specifier}")
    };
    let absolute = joined.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    if absolute {
        format!("/{}", segments.join("/"))
    } else {
        segments.join("/")
    }
}

// ============================================================================
// MEMORY HOST
// ============================================================================

/// In-memory module store with `/`-separated absolute paths.
#[derive(Debug, Default)]
pub struct MemoryHost {
    files: FxHashMap<SmolStr, Arc<str>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<SmolStr>, source: impl Into<Arc<str>>) {
        self.files.insert(path.into(), source.into());
    }

    pub fn with_file(mut self, path: impl Into<SmolStr>, source: impl Into<Arc<str>>) -> Self {
        self.add_file(path, source);
        self
    }
}

impl ModuleHost for MemoryHost {
    fn resolve(&self, from_dir: &str, specifier: &str) -> Result<SmolStr, HostError> {
        if !(specifier.starts_with('.') || specifier.starts_with('/')) {
            // bare specifiers (package resolution) are out of scope
            return Err(HostError::NotFound(specifier.to_string()));
        }
        let resolved = SmolStr::new(join_normalize(from_dir, specifier));
        if self.files.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(HostError::NotFound(specifier.to_string()))
        }
    }

    fn read(&self, path: &str) -> Result<Arc<str>, HostError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }
}

// ============================================================================
// FS HOST
// ============================================================================

/// Disk-backed host. Paths are platform paths rendered with `/`.
#[derive(Debug, Default)]
pub struct FsHost;

impl FsHost {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleHost for FsHost {
    fn resolve(&self, from_dir: &str, specifier: &str) -> Result<SmolStr, HostError> {
        if !(specifier.starts_with('.') || specifier.starts_with('/')) {
            return Err(HostError::NotFound(specifier.to_string()));
        }
        let joined: PathBuf = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else {
            Path::new(from_dir).join(specifier)
        };
        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
        }
        if normalized.is_file() {
            Ok(SmolStr::new(normalized.to_string_lossy().replace('\\', "/")))
        } else {
            Err(HostError::NotFound(specifier.to_string()))
        }
    }

    fn read(&self, path: &str) -> Result<Arc<str>, HostError> {
        std::fs::read_to_string(path)
            .map(Arc::from)
            .map_err(|source| HostError::Io {
                path: path.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirname_handles_root_and_bare_names() {
        assert_eq!(dirname("/a/b/entry.st.css"), "/a/b");
        assert_eq!(dirname("/entry.st.css"), "/");
        assert_eq!(dirname("entry.st.css"), ".");
    }

    #[test]
    fn join_normalize_collapses_dot_segments() {
        assert_eq!(join_normalize("/a/b", "./c.st.css"), "/a/b/c.st.css");
        assert_eq!(join_normalize("/a/b", "../c.st.css"), "/a/c.st.css");
        assert_eq!(join_normalize("/a", "/abs.css"), "/abs.css");
    }

    #[test]
    fn memory_host_resolves_relative_specifiers() {
        let host = MemoryHost::new().with_file("/dir/b.st.css", ".x {}");
        assert_eq!(host.resolve("/dir", "./b.st.css").unwrap(), "/dir/b.st.css");
        assert!(matches!(
            host.resolve("/dir", "./missing.st.css"),
            Err(HostError::NotFound(_))
        ));
        assert!(matches!(
            host.resolve("/dir", "some-package"),
            Err(HostError::NotFound(_))
        ));
    }

    #[test]
    fn fs_host_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.st.css");
        std::fs::write(&file, ".a {}").unwrap();
        let host = FsHost::new();
        let base = dir.path().to_string_lossy().to_string();
        let resolved = host.resolve(&base, "./a.st.css").unwrap();
        assert_eq!(&*host.read(&resolved).unwrap(), ".a {}");
    }
}
