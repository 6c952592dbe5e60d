//! Transitive import resolution.
//!
//! [`Resolver::resolve`] walks a module's imports, loads every file not yet
//! registered or in flight, parses it, registers it and walks its imports in
//! turn. All loads of one call are joined inside the returned future; the
//! report says whether the registry was quiescent when that join finished.

mod loader;
mod path;


use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use crate::ast::{Module, parse_source};
use crate::registry::{SharedRegistry, UnitState};
use crate::token::ParseError;
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};

pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use path::{
    BUILTIN_MODULES, WREN_EXTENSION, candidate_paths, identity_of, is_builtin_module, normalize_import_path,
    normalize_path, origin_dir_of,
};

/// Non-fatal outcomes met while resolving. None of them stops the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// No candidate path exists for an import.
    ImportNotFound { import: String, from: PathBuf },
    ReadFailure { identity: String, error: String },
    /// An imported file was found but does not parse.
    Syntax { identity: String, error: ParseError },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::ImportNotFound { import, from } => {
                write!(f, "couldn't find {} in any path (imported from {})", import, from.display())
            }
            ResolveWarning::ReadFailure { identity, error } => write!(f, "error reading {}: {}", identity, error),
            ResolveWarning::Syntax { identity, error } => write!(f, "{}: {}", identity, error),
        }
    }
}

impl std::error::Error for ResolveWarning {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Identities this call parsed and registered, in completion order.
    pub loaded: Vec<String>,
    pub warnings: Vec<ResolveWarning>,
    /// No identity was pending once this call's loads had all finished.
    pub settled: bool,
}

/// Ordered, append-only directory list shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths(Arc<RwLock<Vec<PathBuf>>>);

impl SearchPaths {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self(Arc::new(RwLock::new(paths.into_iter().collect())))
    }

    /// Appends `path` unless it is already listed.
    pub fn push(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut paths = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Identities one `resolve` call marked pending and has not finished yet.
/// Dropping the guard releases them, so a cancelled call never leaves an
/// identity pending.
struct PendingGuard {
    registry: SharedRegistry,
    identities: FastHashSet<String>,
}

impl PendingGuard {
    fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            identities: fast_hash_set_new(),
        }
    }

    fn begin(&mut self, identity: &str) -> bool {
        if !self.registry.lock().begin_load(identity) {
            return false;
        }
        self.identities.insert(identity.to_string());
        true
    }

    /// Registers the outcome and returns the module when it is now the one
    /// stored under `identity`.
    fn complete(&mut self, identity: &str, module: Option<Module>) -> Option<Arc<Module>> {
        self.identities.remove(identity);
        let mut registry = self.registry.lock();
        let parsed = module.is_some();
        if registry.complete_load(identity, module) && parsed {
            registry.get(identity)
        } else {
            None
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.identities.is_empty() {
            return;
        }
        let mut registry = self.registry.lock();
        for identity in self.identities.drain() {
            debug!(target: "wrena::resolver", identity = %identity, "released unfinished load");
            registry.complete_load(&identity, None);
        }
    }
}

type Load = BoxFuture<'static, (String, PathBuf, io::Result<String>)>;

#[derive(Clone)]
pub struct Resolver {
    registry: SharedRegistry,
    loader: Arc<dyn SourceLoader>,
    search_paths: SearchPaths,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("search_paths", &self.search_paths.snapshot())
            .finish_non_exhaustive()
    }
}

impl Resolver {
    pub fn new(registry: SharedRegistry, loader: Arc<dyn SourceLoader>, search_paths: SearchPaths) -> Self {
        Self {
            registry,
            loader,
            search_paths,
        }
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search_paths
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Resolves `module`'s imports transitively. `origin_dir` is the directory
    /// of the file `module` was parsed from.
    pub async fn resolve(&self, module: &Module, origin_dir: &Path) -> ResolveReport {
        let mut report = ResolveReport::default();
        let mut guard = PendingGuard::new(self.registry.clone());
        let mut in_flight: FuturesUnordered<Load> = FuturesUnordered::new();

        self.schedule_imports(module, origin_dir, &mut guard, &mut in_flight, &mut report);

        while let Some((identity, path, result)) = in_flight.next().await {
            let parsed = match result {
                Ok(text) => match parse_source(&text) {
                    Ok(module) => Some(module),
                    Err(error) => {
                        warn!(target: "wrena::resolver", identity = %identity, %error, "imported file failed to parse");
                        report.warnings.push(ResolveWarning::Syntax {
                            identity: identity.clone(),
                            error,
                        });
                        None
                    }
                },
                Err(error) => {
                    warn!(target: "wrena::resolver", identity = %identity, %error, "error reading file");
                    report.warnings.push(ResolveWarning::ReadFailure {
                        identity: identity.clone(),
                        error: error.to_string(),
                    });
                    None
                }
            };

            let Some(registered) = guard.complete(&identity, parsed) else {
                continue;
            };
            debug!(target: "wrena::resolver", identity = %identity, "registered import");
            report.loaded.push(identity);

            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
            self.schedule_imports(&registered, &dir, &mut guard, &mut in_flight, &mut report);
        }

        report.settled = self.registry.lock().is_settled();
        report
    }

    fn schedule_imports(
        &self,
        module: &Module,
        origin_dir: &Path,
        guard: &mut PendingGuard,
        in_flight: &mut FuturesUnordered<Load>,
        report: &mut ResolveReport,
    ) {
        let search_paths = self.search_paths.snapshot();

        for import in module.imports() {
            let literal = import.path.text.as_str();
            if is_builtin_module(literal) {
                continue;
            }

            let normalized = normalize_import_path(literal);
            let candidates = candidate_paths(origin_dir, &normalized, &search_paths);

            let known = {
                let registry = self.registry.lock();
                candidates
                    .iter()
                    .any(|candidate| registry.state(&identity_of(candidate)) != UnitState::Absent)
            };
            if known {
                continue;
            }

            let Some(found) = candidates.into_iter().find(|candidate| self.loader.exists(candidate)) else {
                warn!(
                    target: "wrena::resolver",
                    import = %normalized,
                    from = %origin_dir.display(),
                    "couldn't find file in any path"
                );
                report.warnings.push(ResolveWarning::ImportNotFound {
                    import: normalized,
                    from: origin_dir.to_path_buf(),
                });
                continue;
            };

            let identity = identity_of(&found);
            // Another resolution may have claimed it since the check above.
            if !guard.begin(&identity) {
                continue;
            }

            debug!(target: "wrena::resolver", identity = %identity, "loading import");
            let read = self.loader.read(&found);
            in_flight.push(async move { (identity, found, read.await) }.boxed());
        }
    }
}
