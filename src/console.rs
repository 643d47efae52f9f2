//! The console facade a UI layer talks to: execution, suggestions, history,
//! the log buffer and its events.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::ConsoleContext;
use crate::events::{trace_entry, LogBuffer, LogEntry, LogKind, LogSink};
use crate::history::{CommandHistory, HistoryState};
use crate::registry::declare::ModuleDecl;
use crate::registry::execute::{self, ConsoleAction};
use crate::registry::{catalog, DiscoveryReport, Registry};
use crate::settings::ConsoleSettings;

/// Registry shared between the console and any other reader. Writers hold
/// the lock for a whole rebuild, so readers never see a partial map.
pub type SharedRegistry = Arc<RwLock<Registry>>;

type LogListener = Box<dyn FnMut(&LogEntry) + Send>;
type ClearListener = Box<dyn FnMut() + Send>;

pub struct Console {
    ctx: ConsoleContext,
    registry: SharedRegistry,
    history: CommandHistory,
    logs: VecDeque<LogEntry>,
    log_limit: usize,
    log_listeners: Vec<LogListener>,
    clear_listeners: Vec<ClearListener>,
}

impl Console {
    /// Build the console and run the initial discovery. A host that is not
    /// live always rescans; a live host may start from the cache.
    pub fn new(ctx: ConsoleContext, settings: &ConsoleSettings) -> Self {
        let mut console = Self {
            ctx,
            registry: Arc::new(RwLock::new(Registry::new())),
            history: CommandHistory::new(settings.history_limit),
            logs: VecDeque::new(),
            log_limit: settings.log_limit.max(1),
            log_listeners: Vec::new(),
            clear_listeners: Vec::new(),
        };

        console.add_log(">Console initializing...", LogKind::Info);
        console.add_log(">Gathering commands...", LogKind::Info);
        let force = !console.ctx.host.is_live();
        let report = console.discover(force);
        if !report.success {
            console.add_log(&report.message, LogKind::Error);
        }
        console.add_log(
            &format!(">Console initialized. Commands discovered: {}", report.count),
            LogKind::Info,
        );
        console
    }

    pub fn context(&self) -> &ConsoleContext {
        &self.ctx
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// Read-only access to the registry. Holds the read lock for `f`.
    pub fn with_registry<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Registry) -> R,
    {
        let guard = self.registry.read();
        f(&guard)
    }

    // ── Execution ───────────────────────────────────────────────

    pub fn execute_command(&mut self, input: &str) {
        if !input.trim().is_empty() {
            self.history.push(input.trim());
        }
        let mut buf = LogBuffer::new();
        let actions = {
            let registry = self.registry.read();
            execute::execute(&self.ctx, &registry, input, &mut buf)
        };
        self.append(buf);
        for action in actions {
            match action {
                ConsoleAction::ClearLogs => self.clear(),
                ConsoleAction::RefreshCommands => {
                    self.refresh_commands();
                }
            }
        }
    }

    pub fn suggestions(&mut self, input: &str) -> Vec<String> {
        let mut buf = LogBuffer::new();
        let items = {
            let registry = self.registry.read();
            crate::suggest::suggestions(&self.ctx, &registry, input, &mut buf)
        };
        self.append(buf);
        items
    }

    // ── Discovery ───────────────────────────────────────────────

    /// Force a full rescan and log the new total.
    pub fn refresh_commands(&mut self) -> DiscoveryReport {
        let report = self.discover(true);
        if report.success {
            self.add_log(&format!("Commands refreshed. Total: {}", report.count), LogKind::Info);
        } else {
            self.add_log(&report.message, LogKind::Error);
        }
        report
    }

    /// Register a module loaded after start-up and scan only its new types.
    pub fn register_module(&mut self, module: ModuleDecl) -> DiscoveryReport {
        Arc::make_mut(&mut self.ctx.surface).register(module);
        let report = self.registry.write().scan_new_types(&self.ctx);
        if !report.success {
            self.add_log(&report.message, LogKind::Error);
        }
        report
    }

    fn discover(&mut self, force: bool) -> DiscoveryReport {
        let report = self.registry.write().discover_commands(&self.ctx, force);
        tracing::info!(
            success = report.success,
            count = report.count,
            source = ?report.source,
            "{}",
            report.message
        );
        report
    }

    /// Canonical command names, sorted.
    pub fn available_commands(&self) -> Vec<String> {
        self.with_registry(|r| {
            let mut names: Vec<String> = r.commands().keys().cloned().collect();
            names.sort();
            names
        })
    }

    /// `name signature — description` for one command.
    pub fn command_help(&self, name: &str) -> Option<String> {
        self.with_registry(|r| r.get(name).map(|d| d.help_line()))
    }

    pub fn help_text(&self, topic: Option<&str>) -> String {
        self.with_registry(|r| catalog::help_text(r, topic))
    }

    // ── History ─────────────────────────────────────────────────

    pub fn previous_history(&mut self) -> String {
        self.history.previous()
    }

    pub fn next_history(&mut self) -> String {
        self.history.next()
    }

    pub fn history(&self) -> &[String] {
        self.history.entries()
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    // ── Logs ────────────────────────────────────────────────────

    pub fn add_log(&mut self, message: &str, kind: LogKind) {
        self.push_entry(LogEntry::new(message, kind));
    }

    /// Drop every buffered line and notify clear listeners.
    pub fn clear(&mut self) {
        self.logs.clear();
        for listener in &mut self.clear_listeners {
            listener();
        }
    }

    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter()
    }

    pub fn log_count(&self) -> usize {
        self.logs.len()
    }

    pub fn on_log_added(&mut self, listener: impl FnMut(&LogEntry) + Send + 'static) {
        self.log_listeners.push(Box::new(listener));
    }

    pub fn on_logs_cleared(&mut self, listener: impl FnMut() + Send + 'static) {
        self.clear_listeners.push(Box::new(listener));
    }

    fn append(&mut self, buf: LogBuffer) {
        for entry in buf.entries {
            self.push_entry(entry);
        }
    }

    fn push_entry(&mut self, entry: LogEntry) {
        trace_entry(&entry);
        for listener in &mut self.log_listeners {
            listener(&entry);
        }
        self.logs.push_back(entry);
        while self.logs.len() > self.log_limit {
            self.logs.pop_front();
        }
    }
}

impl LogSink for Console {
    fn log(&mut self, entry: LogEntry) {
        self.push_entry(entry);
    }
}
