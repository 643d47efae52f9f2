//! Everything discovery, execution and suggestion read from the host.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::convert::ConverterSet;
use crate::registry::cache::CommandCache;
use crate::registry::declare::CodeSurface;
use crate::scene::{ObjectDirectory, Scene};
use crate::settings::ConsoleSettings;

/// Reports whether the host is live (playing) or in its editing state.
pub trait HostState: Send + Sync {
    fn is_live(&self) -> bool;
}

/// A host state toggled by the embedding application.
#[derive(Debug)]
pub struct HostMode {
    live: AtomicBool,
}

impl HostMode {
    pub fn new(live: bool) -> Self {
        Self {
            live: AtomicBool::new(live),
        }
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }
}

impl Default for HostMode {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HostState for HostMode {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct ConsoleContext {
    pub surface: Arc<CodeSurface>,
    pub directory: Arc<dyn ObjectDirectory>,
    pub host: Arc<dyn HostState>,
    pub converters: Arc<ConverterSet>,
    /// Allow-list of module-name globs, matched case-insensitively.
    pub module_patterns: Vec<String>,
    /// `None` disables the command cache.
    pub cache: Option<CommandCache>,
}

impl ConsoleContext {
    /// Live host, empty scene, built-in converters, default allow-list, no cache.
    pub fn new(surface: CodeSurface) -> Self {
        Self {
            surface: Arc::new(surface),
            directory: Arc::new(Scene::new()),
            host: Arc::new(HostMode::default()),
            converters: Arc::new(ConverterSet::default()),
            module_patterns: ConsoleSettings::default().module_patterns,
            cache: None,
        }
    }

    /// Apply the allow-list and cache settings. The cache file lives in
    /// `config_dir`.
    pub fn configured(mut self, settings: &ConsoleSettings, config_dir: &Path) -> Self {
        self.module_patterns = settings.module_patterns.clone();
        self.cache = settings
            .cache_enabled
            .then(|| CommandCache::new(crate::paths::command_cache_path(config_dir)));
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn ObjectDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostState>) -> Self {
        self.host = host;
        self
    }

    pub fn with_converters(mut self, converters: ConverterSet) -> Self {
        self.converters = Arc::new(converters);
        self
    }

    pub fn with_module_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.module_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache(mut self, cache: CommandCache) -> Self {
        self.cache = Some(cache);
        self
    }
}
