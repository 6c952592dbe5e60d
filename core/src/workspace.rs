use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::ast::parse_source;
use crate::config::AnalyzerConfig;
use crate::index::{Completion, Signature, SymbolIndex};
use crate::registry::{SharedRegistry, UnitState};
use crate::resolver::{FsLoader, ResolveReport, Resolver, SearchPaths, SourceLoader, identity_of, origin_dir_of};
use crate::token::ParseError;

/// Identity plus text of one file or synthetic source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub identity: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(identity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            text: text.into(),
        }
    }
}

/// Host-facing entry point: owns the registry, drives resolution on document
/// changes and publishes a fresh [`SymbolIndex`] whenever resolution settles.
pub struct Workspace {
    registry: SharedRegistry,
    resolver: Resolver,
    walk_budget: usize,
    index_tx: watch::Sender<Arc<SymbolIndex>>,
}

impl Workspace {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_loader(config, Arc::new(FsLoader))
    }

    pub fn with_loader(config: AnalyzerConfig, loader: Arc<dyn SourceLoader>) -> Self {
        let registry = SharedRegistry::new();
        let search_paths = SearchPaths::new(config.search_paths);
        let resolver = Resolver::new(registry.clone(), loader, search_paths);
        let (index_tx, _) = watch::channel(Arc::new(SymbolIndex::default()));
        Self {
            registry,
            resolver,
            walk_budget: config.walk_budget,
            index_tx,
        }
    }

    /// Registers a synthetic unit (the core library listing, say) as-is. Its
    /// imports are not followed.
    pub fn seed(&self, unit: SourceUnit) -> Result<(), ParseError> {
        let module = parse_source(&unit.text)?;
        self.registry.lock().insert(unit.identity, module);
        self.publish_if_settled();
        Ok(())
    }

    /// Re-parses `identity`, replaces its module and resolves its imports.
    /// On a parse error the previously registered module stays in place.
    pub async fn document_changed(&self, identity: &str, text: &str) -> Result<ResolveReport, ParseError> {
        let identity = identity_of(Path::new(identity));
        let module = match parse_source(text) {
            Ok(module) => module,
            Err(error) => {
                warn!(target: "wrena::workspace", identity = %identity, %error, "document failed to parse");
                return Err(error);
            }
        };

        self.registry.lock().insert(identity.clone(), module.clone());
        debug!(target: "wrena::workspace", identity = %identity, "document registered");

        let report = self.resolver.resolve(&module, &origin_dir_of(&identity)).await;
        if report.settled {
            self.publish_if_settled();
        }
        Ok(report)
    }

    /// Like [`document_changed`](Self::document_changed), but only when the
    /// identity is not registered yet. Returns `None` when nothing was done.
    pub async fn open_document(&self, identity: &str, text: &str) -> Result<Option<ResolveReport>, ParseError> {
        let normalized = identity_of(Path::new(identity));
        if self.registry.lock().state(&normalized) == UnitState::Ready {
            return Ok(None);
        }
        self.document_changed(&normalized, text).await.map(Some)
    }

    pub fn add_search_path(&self, path: impl Into<PathBuf>) {
        self.resolver.search_paths().push(path);
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.resolver.search_paths().snapshot()
    }

    /// The index as of the last settle.
    pub fn index(&self) -> Arc<SymbolIndex> {
        self.index_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SymbolIndex>> {
        self.index_tx.subscribe()
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.index().completions().to_vec()
    }

    pub fn signatures(&self, method: &str) -> Vec<Signature> {
        self.index().signatures_for(method).into_iter().cloned().collect()
    }

    pub fn variables(&self, identity: &str) -> Vec<Completion> {
        self.index().variables_in(&identity_of(Path::new(identity))).to_vec()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    fn publish_if_settled(&self) {
        let index = {
            let registry = self.registry.lock();
            if !registry.is_settled() {
                return;
            }
            SymbolIndex::rebuild_with_budget(&registry, self.walk_budget)
        };
        debug!(
            target: "wrena::workspace",
            completions = index.completions().len(),
            signatures = index.signatures().len(),
            "index rebuilt"
        );
        self.index_tx.send_replace(Arc::new(index));
    }
}
