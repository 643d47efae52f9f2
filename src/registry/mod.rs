pub mod cache;
pub mod catalog;
pub mod declare;
pub mod discovery;
pub mod execute;
pub mod validation;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::ConsoleContext;
use crate::model::{ParamType, TypeKey, Value};

use declare::{Callable, Factory, SuggestFn, SuggestionProvider};

// ── Command metadata ────────────────────────────────────────────

/// When a command may run, relative to the host's live/playing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    RuntimeOnly,
    EditorOnly,
    Both,
}

impl ExecutionMode {
    pub fn label(self) -> &'static str {
        match self {
            ExecutionMode::RuntimeOnly => "runtime only",
            ExecutionMode::EditorOnly => "editor only",
            ExecutionMode::Both => "runtime and editor",
        }
    }

    pub fn allows(self, live: bool) -> bool {
        match self {
            ExecutionMode::RuntimeOnly => live,
            ExecutionMode::EditorOnly => !live,
            ExecutionMode::Both => true,
        }
    }
}

/// How a non-static command finds the instance(s) it runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingPolicy {
    /// First active instance.
    #[default]
    Single,
    /// Every active instance.
    All,
    /// First instance, active or not.
    SingleInactive,
    /// Every instance, active or not.
    AllInactive,
    /// First instance, created through the type's factory if none exists.
    Singleton,
    /// The first argument supplies the instance.
    Argument,
}

impl BindingPolicy {
    pub fn includes_inactive(self) -> bool {
        matches!(
            self,
            BindingPolicy::SingleInactive | BindingPolicy::AllInactive | BindingPolicy::Singleton
        )
    }
}

/// Where a parameter's completions come from.
#[derive(Clone, Default)]
pub enum SuggestionSource {
    #[default]
    None,
    Static(Vec<String>),
    /// A sibling suggestion method of the declaring type.
    Method { name: String, func: SuggestFn },
    Provider(Arc<dyn SuggestionProvider>),
    /// Every registered command name.
    CommandNames,
}

impl fmt::Debug for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionSource::None => f.write_str("None"),
            SuggestionSource::Static(items) => f.debug_tuple("Static").field(items).finish(),
            SuggestionSource::Method { name, .. } => f.debug_tuple("Method").field(name).finish(),
            SuggestionSource::Provider(_) => f.write_str("Provider"),
            SuggestionSource::CommandNames => f.write_str("CommandNames"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: ParamType,
    pub is_optional: bool,
    pub default: Option<Value>,
    pub suggestions: SuggestionSource,
}

impl ParameterDescriptor {
    /// `name:type`, bracketed when optional.
    pub fn signature(&self) -> String {
        let repr = format!("{}:{}", self.name, self.ty.display_name());
        if self.is_optional {
            format!("[{repr}]")
        } else {
            repr
        }
    }

    /// Value used when the caller leaves this (optional) parameter out.
    pub fn fallback_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.ty.zero_value())
    }
}

/// Immutable metadata for one discovered command.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
    pub execution_mode: ExecutionMode,
    pub binding: BindingPolicy,
    pub is_static: bool,
    pub declaring_type: TypeKey,
    /// Method identity within the declaring type.
    pub method: String,
    pub callable: Callable,
    pub parameters: Vec<ParameterDescriptor>,
    /// Creates the declaring type for `Singleton` binding.
    pub factory: Option<Factory>,
}

impl CommandDescriptor {
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional).count()
    }

    pub fn parameter_types(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.ty.identity()).collect()
    }

    pub fn signature(&self) -> String {
        self.parameters
            .iter()
            .map(ParameterDescriptor::signature)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One-line help: `name signature — description`.
    pub fn help_line(&self) -> String {
        let head = format!("{} {}", self.name, self.signature());
        let head = head.trim_end();
        if self.description.is_empty() {
            head.to_string()
        } else {
            format!("{head} — {}", self.description)
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("execution_mode", &self.execution_mode)
            .field("binding", &self.binding)
            .field("is_static", &self.is_static)
            .field("declaring_type", &self.declaring_type)
            .field("method", &self.method)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

// ── Discovery report ────────────────────────────────────────────

/// Where the current registry contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Cache,
    Scan,
    /// Discovery had already run and was not forced.
    Unchanged,
}

/// Structured discovery result. Failures are reported here, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub source: DiscoverySource,
}

// ── Registry ────────────────────────────────────────────────────

/// Canonical name → descriptor map, plus the alias map. Insertion ordered.
#[derive(Debug, Default)]
pub struct Registry {
    commands: IndexMap<String, Arc<CommandDescriptor>>,
    aliases: IndexMap<String, Arc<CommandDescriptor>>,
    /// Types already scanned; full rescans clear it.
    scanned: HashSet<TypeKey>,
    has_discovered: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &IndexMap<String, Arc<CommandDescriptor>> {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn has_discovered(&self) -> bool {
        self.has_discovered
    }

    /// Case-insensitive lookup by name, then by alias.
    pub fn get(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        let key = name.to_lowercase();
        self.commands.get(&key).or_else(|| self.aliases.get(&key))
    }

    /// Add a descriptor. First discovered wins: a later duplicate name is
    /// dropped, a later duplicate alias is not registered.
    pub fn insert(&mut self, descriptor: CommandDescriptor) -> bool {
        if self.commands.contains_key(&descriptor.name) {
            tracing::warn!(
                command = %descriptor.name,
                declaring_type = %descriptor.declaring_type,
                "duplicate command dropped"
            );
            return false;
        }
        let descriptor = Arc::new(descriptor);
        if let Some(alias) = &descriptor.alias {
            if self.aliases.contains_key(alias) {
                tracing::warn!(command = %descriptor.name, %alias, "duplicate alias ignored");
            } else {
                self.aliases.insert(alias.clone(), descriptor.clone());
            }
        }
        self.commands.insert(descriptor.name.clone(), descriptor);
        true
    }

    /// Drop every descriptor and the scanned-type memo.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.aliases.clear();
        self.scanned.clear();
        self.has_discovered = false;
    }

    /// Flat records of the current contents, as written to the cache.
    pub fn snapshot(&self) -> Vec<cache::CachedCommand> {
        self.commands
            .values()
            .map(|d| cache::CachedCommand::from(d.as_ref()))
            .collect()
    }

    /// Populate the registry. Without `force`, a completed discovery is a
    /// no-op and a non-empty cache replaces the scan. With `force`, the
    /// cache is ignored and everything is rescanned and re-persisted.
    pub fn discover_commands(&mut self, ctx: &ConsoleContext, force: bool) -> DiscoveryReport {
        if self.has_discovered && !force {
            return DiscoveryReport {
                success: true,
                message: format!("Commands already discovered: {}", self.len()),
                count: self.len(),
                source: DiscoverySource::Unchanged,
            };
        }

        if !force {
            if let Some(cache) = &ctx.cache {
                let records = cache.load();
                if !records.is_empty() {
                    let descriptors = cache::rehydrate(&records, &ctx.surface);
                    let scanned = descriptors.iter().map(|d| d.declaring_type.clone()).collect();
                    self.replace(descriptors, scanned);
                    tracing::info!(count = self.len(), "loaded commands from cache");
                    return DiscoveryReport {
                        success: true,
                        message: format!("Loaded {} commands from cache.", self.len()),
                        count: self.len(),
                        source: DiscoverySource::Cache,
                    };
                }
            }
        }

        let mut scanned = HashSet::new();
        match discovery::discover(ctx, &mut scanned) {
            Ok(outcome) => {
                self.replace(outcome.commands, scanned);
                self.persist(ctx);
                DiscoveryReport {
                    success: true,
                    message: format!("Command discovery complete: {} commands found", self.len()),
                    count: self.len(),
                    source: DiscoverySource::Scan,
                }
            }
            // Previous contents stay in place so the caller can keep using them.
            Err(e) => DiscoveryReport {
                success: false,
                message: e.to_string(),
                count: self.len(),
                source: DiscoverySource::Scan,
            },
        }
    }

    /// Scan only types not seen by a previous scan, e.g. modules registered
    /// after start-up. Existing descriptors are kept.
    pub fn scan_new_types(&mut self, ctx: &ConsoleContext) -> DiscoveryReport {
        let before = self.len();
        match discovery::discover(ctx, &mut self.scanned) {
            Ok(outcome) => {
                for descriptor in outcome.commands {
                    self.insert(descriptor);
                }
                self.has_discovered = true;
                self.persist(ctx);
                let added = self.len() - before;
                DiscoveryReport {
                    success: true,
                    message: format!("Discovered {added} new commands"),
                    count: self.len(),
                    source: DiscoverySource::Scan,
                }
            }
            Err(e) => DiscoveryReport {
                success: false,
                message: e.to_string(),
                count: self.len(),
                source: DiscoverySource::Scan,
            },
        }
    }

    fn replace(&mut self, descriptors: Vec<CommandDescriptor>, scanned: HashSet<TypeKey>) {
        self.clear();
        for descriptor in descriptors {
            self.insert(descriptor);
        }
        self.scanned = scanned;
        self.has_discovered = true;
    }

    fn persist(&self, ctx: &ConsoleContext) {
        let Some(cache) = &ctx.cache else {
            return;
        };
        match cache.save(self.commands.values().map(AsRef::as_ref)) {
            Ok(count) => tracing::info!(count, path = %cache.path().display(), "command cache saved"),
            Err(e) => tracing::warn!(path = %cache.path().display(), "failed to save command cache: {e}"),
        }
    }
}
