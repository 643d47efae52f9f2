// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dev_console::context::{ConsoleContext, HostMode};
use dev_console::events::{LogEntry, LogKind, LOGS_CLEARED, LOG_ADDED};
use dev_console::registry::catalog;
use dev_console::registry::declare::CodeSurface;
use dev_console::scene::Scene;
use dev_console::{builtin, demo, paths, settings, Console};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "dev-console", about = "Developer console over a demo game scene", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config directory override (settings and command cache)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Rescan modules instead of trusting the command cache
    #[arg(long, global = true)]
    refresh: bool,

    /// Start with the host in editor mode (not live)
    #[arg(long, global = true)]
    editor: bool,

    /// Neither read nor write the command cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Tracing filter, e.g. `debug` or `dev_console=trace` (defaults to RUST_LOG, then `warn`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print console events as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive prompt (default)
    Repl,
    /// Execute one command line and exit
    Run {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        line: Vec<String>,
    },
    /// Print completions for a partial input
    Suggest { input: String },
    /// List registered commands
    List,
    /// Print help for a group or command
    Help { topic: Option<String> },
}

// ── Setup ────────────────────────────────────────────────────────

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_console(cli: &Cli, host: Arc<HostMode>) -> Console {
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let mut loaded = settings::load_settings(&config_dir).unwrap_or_default();
    if cli.no_cache {
        loaded.cache_enabled = false;
    }

    let scene = Arc::new(Scene::new());
    demo::populate_scene(&scene);

    let surface = CodeSurface::new()
        .with_module(builtin::module())
        .with_module(demo::module(scene.clone()));
    let ctx = ConsoleContext::new(surface)
        .configured(&loaded, &config_dir)
        .with_directory(scene)
        .with_host(host);

    let mut console = Console::new(ctx, &loaded);
    if cli.refresh {
        console.refresh_commands();
    }
    console
}

// ── Output formatting ────────────────────────────────────────────

fn print_entry(entry: &LogEntry, json: bool) {
    if json {
        let line = serde_json::json!({
            "event": LOG_ADDED,
            "kind": entry.kind,
            "message": entry.message,
        });
        println!("{line}");
        return;
    }
    match entry.kind {
        LogKind::Info => println!("{}", entry.message),
        LogKind::Warning => println!("warning: {}", entry.message),
        LogKind::Error => println!("error: {}", entry.message),
    }
}

fn print_cleared(json: bool) {
    if json {
        println!("{}", serde_json::json!({ "event": LOGS_CLEARED }));
    } else {
        println!("(console cleared)");
    }
}

/// Echo console events to stdout from now on. Returns a counter of error
/// lines seen.
fn attach_output(console: &mut Console, json: bool) -> Arc<AtomicUsize> {
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    console.on_log_added(move |entry| {
        if entry.kind == LogKind::Error {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        print_entry(entry, json);
    });
    console.on_logs_cleared(move || print_cleared(json));
    errors
}

// ── REPL ─────────────────────────────────────────────────────────

const REPL_HELP: &str = "\
Type a command line to execute it. Prompt shortcuts:
  ?<input>   show completions for <input>
  !!         repeat the previous line
  :editor    switch the host to editor mode
  :live      switch the host to live mode
  :history   list entered lines
  :quit      exit";

fn run_repl(console: &mut Console, host: &HostMode, json: bool) {
    for entry in console.logs() {
        print_entry(entry, json);
    }
    attach_output(console, json);
    if !json {
        println!("{REPL_HELP}");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();
        match line {
            ":quit" | ":q" => break,
            ":editor" => host.set_live(false),
            ":live" => host.set_live(true),
            ":history" => {
                let state = console.history_state();
                println!("{} entries, cursor at {}", state.len, state.cursor);
                for (i, entry) in console.history().iter().enumerate() {
                    println!("  {i:>3}  {entry}");
                }
            }
            "!!" => {
                let previous = console.previous_history();
                if previous.is_empty() {
                    println!("(no history)");
                } else {
                    println!("{previous}");
                    console.execute_command(&previous);
                }
            }
            _ => match line.strip_prefix('?') {
                Some(partial) => {
                    for item in console.suggestions(partial) {
                        println!("  {item}");
                    }
                }
                None => console.execute_command(line),
            },
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let host = Arc::new(HostMode::new(!cli.editor));
    let mut console = build_console(&cli, host.clone());

    match &cli.command {
        None | Some(Commands::Repl) => run_repl(&mut console, &host, cli.json),
        Some(Commands::Run { line }) => {
            let errors = attach_output(&mut console, cli.json);
            console.execute_command(&line.join(" "));
            if errors.load(Ordering::Relaxed) > 0 {
                process::exit(1);
            }
        }
        Some(Commands::Suggest { input }) => {
            let errors = attach_output(&mut console, cli.json);
            let items = console.suggestions(input);
            if cli.json {
                println!("{}", serde_json::to_string(&items).unwrap_or_default());
            } else {
                for item in items {
                    println!("{item}");
                }
            }
            if errors.load(Ordering::Relaxed) > 0 {
                process::exit(1);
            }
        }
        Some(Commands::List) => {
            let entries = console.with_registry(catalog::command_entries);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries).unwrap_or_default());
            } else {
                for entry in entries {
                    let head = format!("{} {}", entry.name, entry.signature);
                    println!("{:<40} {}", head.trim(), entry.description);
                }
            }
        }
        Some(Commands::Help { topic }) => {
            println!("{}", console.help_text(topic.as_deref()));
        }
    }
}
