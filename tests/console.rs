#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dev_console::context::{ConsoleContext, HostMode};
use dev_console::convert::{ConverterSet, ParameterConverter, ParseContext};
use dev_console::events::LogKind;
use dev_console::model::{ParamType, Value};
use dev_console::registry::cache::CommandCache;
use dev_console::registry::declare::{CodeSurface, CommandMarker, MethodDecl, ModuleDecl, ParamDecl, TypeDecl};
use dev_console::registry::{BindingPolicy, ExecutionMode, Registry};
use dev_console::scene::Scene;
use dev_console::settings::ConsoleSettings;
use dev_console::{builtin, demo, paths, Console, ConsoleError};

struct Turret {
    id: usize,
}

fn game_surface(scene: &Arc<Scene>) -> CodeSurface {
    CodeSurface::new()
        .with_module(builtin::module())
        .with_module(demo::module(scene.clone()))
}

fn demo_console(settings: &ConsoleSettings, config_dir: &std::path::Path, live: bool) -> (Console, Arc<Scene>) {
    let scene = Arc::new(Scene::new());
    demo::populate_scene(&scene);
    let ctx = ConsoleContext::new(game_surface(&scene))
        .configured(settings, config_dir)
        .with_directory(scene.clone())
        .with_host(Arc::new(HostMode::new(live)));
    (Console::new(ctx, settings), scene)
}

fn lines(console: &Console, kind: LogKind) -> Vec<String> {
    console
        .logs()
        .filter(|e| e.kind == kind)
        .map(|e| e.message.clone())
        .collect()
}

#[test]
fn cache_is_written_then_reused_on_live_start() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings::default();

    let (first, _) = demo_console(&settings, dir.path(), true);
    let cache_path = paths::command_cache_path(dir.path());
    assert!(cache_path.exists());

    let cached = CommandCache::new(cache_path).load();
    assert_eq!(cached.len(), first.available_commands().len());
    let heal = cached.iter().find(|c| c.name == "player.heal").unwrap();
    assert_eq!(heal.parameter_types, vec!["int"]);
    assert!(!heal.is_static);
    let tp = cached.iter().find(|c| c.name == "player.teleport").unwrap();
    assert_eq!(tp.alias.as_deref(), Some("tp"));

    // A second console starts from the cache and its commands still run.
    let (mut second, _) = demo_console(&settings, dir.path(), true);
    assert_eq!(second.available_commands(), first.available_commands());
    second.execute_command("tp 4,5,6");
    assert_eq!(lines(&second, LogKind::Info).last().unwrap(), "Player moved to (4, 5, 6)");
}

#[test]
fn disabled_cache_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings {
        cache_enabled: false,
        ..ConsoleSettings::default()
    };
    let (console, _) = demo_console(&settings, dir.path(), true);
    assert!(!console.available_commands().is_empty());
    assert!(!paths::command_cache_path(dir.path()).exists());
}

#[test]
fn module_patterns_limit_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings {
        module_patterns: vec!["DEVTOOLS*".into()],
        cache_enabled: false,
        ..ConsoleSettings::default()
    };
    let (console, _) = demo_console(&settings, dir.path(), true);
    assert!(console.available_commands().iter().all(|n| n.starts_with("console.")));
}

#[test]
fn refresh_is_refused_while_live_and_allowed_in_editor() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings::default();

    let (mut live, _) = demo_console(&settings, dir.path(), true);
    live.execute_command("console.refresh_commands");
    assert_eq!(
        lines(&live, LogKind::Warning),
        vec!["Command 'console.refresh_commands' can only be executed in the editor."]
    );

    let (mut editor, _) = demo_console(&settings, dir.path(), false);
    editor.execute_command("console.refresh_commands");
    let total = editor.available_commands().len();
    assert_eq!(
        lines(&editor, LogKind::Info).last().unwrap(),
        &format!("Commands refreshed. Total: {total}")
    );
}

#[test]
fn boolean_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings::default();
    let (mut console, scene) = demo_console(&settings, dir.path(), true);

    console.execute_command("world.set_active grunt_1 NO");
    assert_eq!(lines(&console, LogKind::Info).last().unwrap(), "'grunt_1' active: false");
    console.execute_command("world.set_active grunt_1 YES");
    assert_eq!(lines(&console, LogKind::Info).last().unwrap(), "'grunt_1' active: true");
    console.execute_command("world.set_active grunt_1 0");
    assert!(dev_console::scene::ObjectDirectory::find_object(scene.as_ref(), "grunt_1").is_none());

    console.execute_command("world.set_active grunt_1 maybe");
    let errors = lines(&console, LogKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("'maybe'"));
}

#[test]
fn arity_with_optional_default() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let surface = CodeSurface::new().with_module(
        ModuleDecl::new("game.arity").with_type(
            TypeDecl::new::<Turret>().method(
                MethodDecl::new_static("aim", move |call| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    let x: i32 = call.arg(0)?;
                    let y: i32 = call.arg(1)?;
                    let fire: bool = call.arg(2)?;
                    call.print(&format!("{x} {y} {fire}"));
                    Ok(())
                })
                .command(CommandMarker::new())
                .param(ParamDecl::new("x", ParamType::Int))
                .param(ParamDecl::new("y", ParamType::Int))
                .param(ParamDecl::new("fire", ParamType::Bool).optional()),
            ),
        ),
    );
    let mut console = Console::new(ConsoleContext::new(surface), &ConsoleSettings::default());

    console.execute_command("aim 1");
    assert_eq!(
        lines(&console, LogKind::Error),
        vec!["Command 'aim' is missing required parameter 'y' (expects at least 2, got 1)"]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    console.execute_command("aim 1 2");
    assert_eq!(lines(&console, LogKind::Info).last().unwrap(), "1 2 false");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn runtime_only_command_is_gated_in_editor() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let surface = CodeSurface::new().with_module(
        ModuleDecl::new("game.gate").with_type(
            TypeDecl::new::<Turret>().method(
                MethodDecl::new_static("fire", move |_call| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .command(CommandMarker::new().mode(ExecutionMode::RuntimeOnly)),
            ),
        ),
    );
    let host = Arc::new(HostMode::new(false));
    let ctx = ConsoleContext::new(surface).with_host(host.clone());
    let mut console = Console::new(ctx, &ConsoleSettings::default());

    console.execute_command("fire");
    assert_eq!(lines(&console, LogKind::Warning), vec!["Command 'fire' can only be executed at runtime."]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    host.set_live(true);
    console.execute_command("fire");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn fan_out_continues_past_a_failing_instance() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let surface = CodeSurface::new().with_module(
        ModuleDecl::new("game.turrets").with_type(
            TypeDecl::new::<Turret>().method(
                MethodDecl::instance::<Turret, _>("reload", move |turret, call| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    if turret.id == 1 {
                        return Err("jammed".into());
                    }
                    call.print(&format!("turret {} reloaded", turret.id));
                    Ok(())
                })
                .command(CommandMarker::new().binding(BindingPolicy::All)),
            ),
        ),
    );
    let scene = Arc::new(Scene::new());
    for id in 0..3 {
        scene.spawn(&format!("turret_{id}"), Turret { id });
    }
    let ctx = ConsoleContext::new(surface).with_directory(scene);
    let mut console = Console::new(ctx, &ConsoleSettings::default());

    console.execute_command("reload");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(lines(&console, LogKind::Error), vec!["Error executing command [reload]: jammed"]);
    assert_eq!(
        lines(&console, LogKind::Info)[3..],
        ["turret 0 reloaded", "turret 2 reloaded"]
    );
}

#[test]
fn suggestions_through_the_console() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ConsoleSettings::default();
    let (mut console, _) = demo_console(&settings, dir.path(), true);

    assert_eq!(console.suggestions("player.he"), vec!["player.heal", "player.health"]);
    assert_eq!(console.suggestions("settings.difficulty h"), vec!["hard"]);
    assert_eq!(console.suggestions("world.set_active gr"), vec!["grunt_1", "grunt_2"]);
    assert_eq!(console.suggestions("console.help world."), vec!["world.spawn_enemy", "world.set_active", "world.objects"]);
}

#[test]
fn registry_discovery_is_idempotent() {
    let scene = Arc::new(Scene::new());
    let ctx = ConsoleContext::new(game_surface(&scene)).with_directory(scene);
    let mut registry = Registry::new();
    let first = registry.discover_commands(&ctx, true);
    let names: Vec<String> = registry.commands().keys().cloned().collect();

    let again = registry.discover_commands(&ctx, false);
    assert_eq!(again.count, first.count);
    assert_eq!(registry.commands().keys().cloned().collect::<Vec<_>>(), names);
}

#[derive(Debug, PartialEq)]
struct Rgb(u8, u8, u8);

/// `#rrggbb` → `Rgb`.
struct HexColor;

impl ParameterConverter for HexColor {
    fn can_parse(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Named(name) if name == "Color")
    }

    fn parse(&self, token: &str, _ty: &ParamType, param_name: &str, _ctx: &ParseContext<'_>) -> Result<Value, ConsoleError> {
        let invalid = || ConsoleError::ParseError {
            parameter: param_name.to_string(),
            token: token.to_string(),
            reason: "expected #rrggbb".into(),
        };
        let hex = token.strip_prefix('#').filter(|h| h.len() == 6).ok_or_else(invalid)?;
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Value::Custom(Arc::new(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))))
    }
}

#[test]
fn appended_converter_feeds_custom_values_to_commands() {
    let surface = CodeSurface::new().with_module(
        ModuleDecl::new("game.paint").with_type(
            TypeDecl::new::<Turret>().method(
                MethodDecl::new_static("paint", |call| {
                    let color = call
                        .args()
                        .first()
                        .and_then(|v| v.as_custom::<Rgb>())
                        .ok_or_else(|| "no color".to_string())?;
                    call.print(&format!("painted {color:?}"));
                    Ok(())
                })
                .command(CommandMarker::new())
                .param(ParamDecl::new("color", ParamType::Named("Color".into()))),
            ),
        ),
    );
    let ctx = ConsoleContext::new(surface).with_converters(ConverterSet::default().with(HexColor));
    let mut console = Console::new(ctx, &ConsoleSettings::default());

    console.execute_command("paint #ff8000");
    assert_eq!(lines(&console, LogKind::Info).last().unwrap(), "painted Rgb(255, 128, 0)");
    console.execute_command("paint orange");
    assert_eq!(
        lines(&console, LogKind::Error),
        vec!["Parameter 'color': cannot parse 'orange': expected #rrggbb"]
    );
}
