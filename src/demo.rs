//! A small `game` module covering every binding policy, plus a populated
//! scene for it to run against. The CLI loads both so the console has
//! something to drive out of the box.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::{ParamType, Value, Vector3};
use crate::registry::declare::{CommandMarker, MethodDecl, ModuleDecl, ParamDecl, TypeDecl};
use crate::registry::validation::validate_finite;
use crate::registry::{BindingPolicy, ExecutionMode};
use crate::scene::Scene;

pub const MODULE_NAME: &str = "game.demo";

pub struct Player {
    pub health: Mutex<i32>,
    pub max_health: i32,
    pub position: Mutex<Vector3>,
}

impl Player {
    pub fn new(max_health: i32) -> Self {
        Self {
            health: Mutex::new(max_health),
            max_health,
            position: Mutex::new(Vector3::ZERO),
        }
    }
}

pub struct Enemy {
    pub kind: String,
    pub hp: Mutex<i32>,
}

impl Enemy {
    pub fn new(kind: &str, hp: i32) -> Self {
        Self {
            kind: kind.to_string(),
            hp: Mutex::new(hp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];
}

/// Created on first use when no object carries it.
pub struct GameSettings {
    pub difficulty: Mutex<Difficulty>,
    pub time_scale: Mutex<f32>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            difficulty: Mutex::new(Difficulty::Normal),
            time_scale: Mutex::new(1.0),
        }
    }
}

/// A component attached to arbitrary objects; targeted by name.
pub struct Health {
    pub hp: Mutex<i32>,
}

impl Health {
    pub fn new(hp: i32) -> Self {
        Self { hp: Mutex::new(hp) }
    }
}

/// Declaring type of the scene-level static commands.
pub struct World;

/// Spawn the objects the demo commands expect: one player, three enemies
/// (one dormant) and a crate carrying a `Health` component.
pub fn populate_scene(scene: &Scene) {
    scene.spawn("player", Player::new(100));
    scene.spawn("grunt_1", Enemy::new("grunt", 30));
    scene.spawn("grunt_2", Enemy::new("grunt", 30));
    scene.spawn("brute", Enemy::new("brute", 80));
    scene.set_active("brute", false);
    scene.spawn("crate", Health::new(10));
}

pub fn module(scene: Arc<Scene>) -> ModuleDecl {
    ModuleDecl::new(MODULE_NAME)
        .with_type(player_type())
        .with_type(enemy_type())
        .with_type(settings_type())
        .with_type(health_type())
        .with_type(world_type(scene))
}

fn player_type() -> TypeDecl {
    TypeDecl::new::<Player>()
        .prefix("player")
        .method(
            MethodDecl::instance::<Player, _>("heal", |player, call| {
                let amount: i32 = call.arg(0)?;
                if amount < 0 {
                    return Err("amount must not be negative".into());
                }
                let mut hp = player.health.lock();
                *hp = (*hp + amount).min(player.max_health);
                let line = format!("Player healed to {}/{}", *hp, player.max_health);
                drop(hp);
                call.print(&line);
                Ok(())
            })
            .command(CommandMarker::new().description("Restore player health"))
            .param(ParamDecl::new("amount", ParamType::Int).default_value(Value::Int(25))),
        )
        .method(
            MethodDecl::instance::<Player, _>("health", |player, call| {
                let hp = *player.health.lock();
                call.print(&format!("Player health: {hp}/{}", player.max_health));
                Ok(())
            })
            .command(CommandMarker::new().description("Show player health").mode(ExecutionMode::Both)),
        )
        .method(
            MethodDecl::instance::<Player, _>("teleport", |player, call| {
                let to: Vector3 = call.arg(0)?;
                *player.position.lock() = to;
                call.print(&format!("Player moved to {to}"));
                Ok(())
            })
            .command(CommandMarker::new().alias("tp").description("Move the player"))
            .param(ParamDecl::new("to", ParamType::Vector3)),
        )
}

fn enemy_type() -> TypeDecl {
    TypeDecl::new::<Enemy>()
        .prefix("enemy")
        .method(
            MethodDecl::instance::<Enemy, _>("kill_all", |enemy, call| {
                *enemy.hp.lock() = 0;
                call.print(&format!("Killed {}", enemy.kind));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Kill every active enemy")
                    .binding(BindingPolicy::All),
            ),
        )
        .method(
            MethodDecl::instance::<Enemy, _>("list", |enemy, call| {
                let hp = *enemy.hp.lock();
                call.print(&format!("{} (hp {hp})", enemy.kind));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("List enemies, dormant ones included")
                    .mode(ExecutionMode::Both)
                    .binding(BindingPolicy::AllInactive),
            ),
        )
        .method(
            MethodDecl::instance::<Enemy, _>("inspect", |enemy, call| {
                let hp = *enemy.hp.lock();
                call.print(&format!("First enemy: {} (hp {hp})", enemy.kind));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Show the first enemy, dormant or not")
                    .mode(ExecutionMode::Both)
                    .binding(BindingPolicy::SingleInactive),
            ),
        )
}

fn settings_type() -> TypeDecl {
    let names: Vec<String> = crate::util::serde_variant_names(&Difficulty::ALL);
    TypeDecl::new::<GameSettings>()
        .prefix("settings")
        .singleton(GameSettings::default)
        .method(
            MethodDecl::instance::<GameSettings, _>("difficulty", |settings, call| {
                let level: Difficulty = call.enum_arg(0)?;
                *settings.difficulty.lock() = level;
                call.print(&format!("Difficulty set to {level:?}"));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Set the game difficulty")
                    .mode(ExecutionMode::Both)
                    .binding(BindingPolicy::Singleton),
            )
            .param(ParamDecl::new("level", ParamType::enumeration("Difficulty", &Difficulty::ALL)).suggest(names)),
        )
        .method(
            MethodDecl::instance::<GameSettings, _>("time_scale", |settings, call| {
                let scale: f32 = call.arg(0)?;
                validate_finite(f64::from(scale), "scale")?;
                if scale < 0.0 {
                    return Err("scale must not be negative".into());
                }
                *settings.time_scale.lock() = scale;
                call.print(&format!("Time scale: {scale}"));
                Ok(())
            })
            .command(CommandMarker::new().description("Set the simulation speed").binding(BindingPolicy::Singleton))
            .param(ParamDecl::new("scale", ParamType::Float).default_value(Value::Float(1.0))),
        )
        .method(
            MethodDecl::instance::<GameSettings, _>("show", |settings, call| {
                let difficulty = *settings.difficulty.lock();
                let scale = *settings.time_scale.lock();
                call.print(&format!("Difficulty: {difficulty:?} | Time scale: {scale}"));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Show game settings")
                    .mode(ExecutionMode::Both)
                    .binding(BindingPolicy::Singleton),
            ),
        )
}

fn health_type() -> TypeDecl {
    TypeDecl::new::<Health>()
        .prefix("health")
        .method(
            MethodDecl::instance::<Health, _>("damage", |health, call| {
                let amount: i32 = call.arg(0)?;
                let mut hp = health.hp.lock();
                *hp = (*hp - amount).max(0);
                let line = format!("Health now {}", *hp);
                drop(hp);
                call.print(&line);
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Damage the named object's Health component")
                    .binding(BindingPolicy::Argument),
            )
            .param(ParamDecl::new("target", ParamType::component::<Health>()))
            .param(ParamDecl::new("amount", ParamType::Int)),
        )
}

fn world_type(scene: Arc<Scene>) -> TypeDecl {
    let names = scene.clone();
    let spawn_scene = scene.clone();
    let active_scene = scene.clone();
    let list_scene = scene;

    TypeDecl::new::<World>()
        .prefix("world")
        .suggester("object_names", move |_| Ok(names.object_names()))
        .method(
            MethodDecl::new_static("spawn_enemy", move |call| {
                let name: String = call.arg(0)?;
                let hp: i32 = call.arg(1)?;
                if hp <= 0 {
                    return Err("hp must be positive".into());
                }
                spawn_scene.spawn(&name, Enemy::new("grunt", hp));
                call.print(&format!("Spawned '{name}' with {hp} hp"));
                Ok(())
            })
            .command(CommandMarker::new().description("Spawn a grunt"))
            .param(ParamDecl::new("name", ParamType::String))
            .param(ParamDecl::new("hp", ParamType::Int).default_value(Value::Int(30))),
        )
        .method(
            MethodDecl::new_static("set_active", move |call| {
                let name: String = call.arg(0)?;
                let active: bool = call.arg(1)?;
                if !active_scene.set_active(&name, active) {
                    return Err(format!("no object named '{name}'"));
                }
                call.print(&format!("'{name}' active: {active}"));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("Activate or deactivate an object")
                    .mode(ExecutionMode::Both),
            )
            .param(ParamDecl::new("name", ParamType::String).suggest_from("object_names"))
            .param(ParamDecl::new("active", ParamType::Bool)),
        )
        .method(
            MethodDecl::new_static("objects", move |call| {
                let names = list_scene.object_names();
                call.print(&format!("{} objects: {}", names.len(), names.join(", ")));
                Ok(())
            })
            .command(
                CommandMarker::new()
                    .description("List scene objects")
                    .mode(ExecutionMode::Both),
            ),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::context::ConsoleContext;
    use crate::events::{LogBuffer, LogKind};
    use crate::registry::declare::CodeSurface;
    use crate::registry::execute::execute;
    use crate::registry::Registry;
    use crate::model::TypeKey;
    use crate::scene::ObjectDirectory;

    fn setup() -> (ConsoleContext, Registry, Arc<Scene>) {
        let scene = Arc::new(Scene::new());
        populate_scene(&scene);
        let ctx = ConsoleContext::new(CodeSurface::new().with_module(module(scene.clone())))
            .with_directory(scene.clone());
        let mut registry = Registry::new();
        registry.discover_commands(&ctx, false);
        (ctx, registry, scene)
    }

    fn run(ctx: &ConsoleContext, registry: &Registry, input: &str) -> LogBuffer {
        let mut buf = LogBuffer::new();
        execute(ctx, registry, input, &mut buf);
        buf
    }

    #[test]
    fn single_binding_heals_player_with_default_amount() {
        let (ctx, registry, scene) = setup();
        let player = scene.find_first(&TypeKey::of::<Player>(), false).unwrap();
        *player.downcast_ref::<Player>().unwrap().health.lock() = 50;

        let buf = run(&ctx, &registry, "player.heal");
        assert_eq!(buf.messages(LogKind::Info), vec!["Player healed to 75/100"]);
        let buf = run(&ctx, &registry, "player.heal 500");
        assert_eq!(buf.messages(LogKind::Info), vec!["Player healed to 100/100"]);
    }

    #[test]
    fn all_skips_dormant_enemies_but_all_inactive_does_not() {
        let (ctx, registry, _) = setup();
        assert_eq!(run(&ctx, &registry, "enemy.kill_all").messages(LogKind::Info).len(), 2);
        assert_eq!(
            run(&ctx, &registry, "enemy.list").messages(LogKind::Info),
            vec!["grunt (hp 0)", "grunt (hp 0)", "brute (hp 80)"]
        );
    }

    #[test]
    fn singleton_is_created_once() {
        let (ctx, registry, scene) = setup();
        run(&ctx, &registry, "settings.difficulty hard");
        let buf = run(&ctx, &registry, "settings.show");
        assert_eq!(buf.messages(LogKind::Info), vec!["Difficulty: Hard | Time scale: 1"]);
        assert_eq!(scene.find_instances(&TypeKey::of::<GameSettings>(), true).len(), 1);
    }

    #[test]
    fn argument_binding_targets_named_component() {
        let (ctx, registry, _) = setup();
        let buf = run(&ctx, &registry, "health.damage crate 4");
        assert_eq!(buf.messages(LogKind::Info), vec!["Health now 6"]);
        let buf = run(&ctx, &registry, "health.damage player 4");
        assert_eq!(buf.count(LogKind::Error), 1);
    }

    #[test]
    fn world_commands_mutate_the_scene() {
        let (ctx, registry, scene) = setup();
        run(&ctx, &registry, "world.spawn_enemy imp 5");
        assert!(scene.object_names().contains(&"imp".to_string()));
        run(&ctx, &registry, "world.set_active imp false");
        assert!(scene.find_object("imp").is_none());
        run(&ctx, &registry, "world.set_active imp on");
        assert!(scene.find_object("imp").is_some());
        assert_eq!(run(&ctx, &registry, "world.set_active ghost on").count(LogKind::Error), 1);
    }

    #[test]
    fn teleport_alias_parses_vector() {
        let (ctx, registry, scene) = setup();
        run(&ctx, &registry, "tp 1,2,3");
        let player = scene.find_first(&TypeKey::of::<Player>(), false).unwrap();
        assert_eq!(*player.downcast_ref::<Player>().unwrap().position.lock(), Vector3::new(1.0, 2.0, 3.0));
    }
}
