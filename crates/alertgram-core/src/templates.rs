//! Named template cache with lazy loading, hot reload and default fallback.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{errors::Error, Result};

/// Reserved name of the configured default template.
pub const DEFAULT_TEMPLATE: &str = "default";

/// A loaded template source, syntax-checked at load time.
#[derive(Debug)]
pub struct Template {
    pub name: String,
    pub source: String,
}

/// Shared, immutable handle. Two handles are "the same template" when they
/// point at the same allocation.
pub type TemplateHandle = Arc<Template>;

/// Filesystem collaborator: turn a path into a template handle.
#[async_trait]
pub trait TemplateLoader: Send + Sync {
    async fn load(&self, name: &str, path: &Path) -> Result<TemplateHandle>;
}

/// Reads templates from disk and rejects sources that do not parse.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsTemplateLoader;

#[async_trait]
impl TemplateLoader for FsTemplateLoader {
    async fn load(&self, name: &str, path: &Path) -> Result<TemplateHandle> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Template {
                name: name.to_string(),
                message: format!("cannot read {}: {e}", path.display()),
            })?;

        check_syntax(name, &source)?;

        Ok(Arc::new(Template {
            name: name.to_string(),
            source,
        }))
    }
}

fn check_syntax(name: &str, source: &str) -> Result<()> {
    let env = minijinja::Environment::new();
    env.template_from_named_str(name, source)
        .map(|_| ())
        .map_err(|e| Error::Template {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// Name-keyed template cache shared by all requests.
///
/// Entries are whole `Arc`s swapped under a write lock, so a reader sees either
/// the old or the new handle, never a partial one. Entries are never removed.
pub struct TemplateStore {
    loader: Arc<dyn TemplateLoader>,
    default_path: PathBuf,
    reload: bool,
    entries: RwLock<Entries>,
}

struct Entries {
    default: TemplateHandle,
    /// Every other name. Never holds `DEFAULT_TEMPLATE`.
    named: HashMap<String, TemplateHandle>,
}

impl Entries {
    fn get(&self, name: &str) -> Option<TemplateHandle> {
        if name == DEFAULT_TEMPLATE {
            Some(self.default.clone())
        } else {
            self.named.get(name).cloned()
        }
    }

    fn insert(&mut self, name: &str, handle: TemplateHandle) {
        if name == DEFAULT_TEMPLATE {
            self.default = handle;
        } else {
            self.named.insert(name.to_string(), handle);
        }
    }
}

impl TemplateStore {
    /// Build the store and eagerly load the default template.
    ///
    /// Failing to load the default is a startup error.
    pub async fn new(
        loader: Arc<dyn TemplateLoader>,
        default_path: impl Into<PathBuf>,
        reload: bool,
    ) -> Result<Self> {
        let default_path = default_path.into();
        tracing::info!(path = %default_path.display(), "default template");
        let default = loader.load(DEFAULT_TEMPLATE, &default_path).await?;

        Ok(Self {
            loader,
            default_path,
            reload,
            entries: RwLock::new(Entries {
                default,
                named: HashMap::new(),
            }),
        })
    }

    pub fn reload_enabled(&self) -> bool {
        self.reload
    }

    /// The current `default` handle.
    pub async fn default_handle(&self) -> TemplateHandle {
        self.entries.read().await.default.clone()
    }

    /// Resolve `name` (empty means `default`) to a handle.
    ///
    /// Load failures are logged and answered with the default handle, which is
    /// then cached under `name` until the next reload.
    pub async fn resolve(&self, name: &str) -> TemplateHandle {
        let name = if name.trim().is_empty() {
            DEFAULT_TEMPLATE
        } else {
            name
        };

        if !self.reload {
            if let Some(h) = self.entries.read().await.get(name) {
                return h;
            }
        }

        tracing::info!(template = %name, "reloading template");
        let path = self.path_for(name);
        let loaded = self.loader.load(name, &path).await;

        let mut entries = self.entries.write().await;
        match loaded {
            Ok(handle) => {
                entries.insert(name, handle.clone());
                handle
            }
            Err(e) => {
                tracing::warn!(
                    template = %name,
                    error = %e,
                    "problem with load template, using default"
                );
                // A broken default keeps its last good handle.
                let fallback = entries.default.clone();
                entries.insert(name, fallback.clone());
                fallback
            }
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        if name == DEFAULT_TEMPLATE {
            self.default_path.clone()
        } else {
            PathBuf::from(name)
        }
    }
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("default_path", &self.default_path)
            .field("reload", &self.reload)
            .finish()
    }
}
