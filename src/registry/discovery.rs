//! Walks the allow-listed modules of the code surface and builds a
//! descriptor for every marked method.

use std::collections::HashSet;

use glob::{MatchOptions, Pattern};

use crate::binding::BindingResolver;
use crate::context::ConsoleContext;
use crate::error::DiscoveryError;
use crate::model::TypeKey;

use super::declare::{CommandMarker, MethodDecl, SuggestionDecl, TypeDecl};
use super::validation::{qualify, validate_command_name};
use super::{BindingPolicy, CommandDescriptor, ParameterDescriptor, SuggestionSource};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub commands: Vec<CommandDescriptor>,
    /// Types whose members could not be enumerated, with the reason.
    pub skipped: Vec<(TypeKey, String)>,
}

pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, DiscoveryError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| DiscoveryError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

pub fn module_allowed(patterns: &[Pattern], module: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(module, MATCH_OPTIONS))
}

/// Scan every allow-listed type not yet in `scanned`, adding each one it
/// visits. Per-type problems are logged and skipped; only an unusable
/// allow-list fails the whole scan.
pub fn discover(
    ctx: &ConsoleContext,
    scanned: &mut HashSet<TypeKey>,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let patterns = compile_patterns(&ctx.module_patterns)?;
    let mut outcome = DiscoveryOutcome::default();

    for module in ctx.surface.modules() {
        if !module_allowed(&patterns, &module.name) {
            tracing::trace!(module = %module.name, "module not in allow-list");
            continue;
        }
        for ty in &module.types {
            if ty.ignored || scanned.contains(&ty.key) {
                continue;
            }
            // Unloadable types stay out of `scanned` so a later pass retries them.
            let methods = match &ty.members {
                Ok(methods) => methods,
                Err(reason) => {
                    tracing::warn!(module = %module.name, ty = %ty.key, "skipping type: {reason}");
                    outcome.skipped.push((ty.key.clone(), reason.clone()));
                    continue;
                }
            };
            scanned.insert(ty.key.clone());
            for method in methods {
                let Some(marker) = &method.marker else {
                    continue;
                };
                match build_descriptor(ty, method, marker) {
                    Ok(descriptor) => {
                        bind_eagerly(ctx, ty, &descriptor);
                        outcome.commands.push(descriptor);
                    }
                    Err(reason) => {
                        tracing::warn!(ty = %ty.key, method = %method.name, "skipping command: {reason}");
                    }
                }
            }
        }
    }

    tracing::debug!(
        commands = outcome.commands.len(),
        skipped = outcome.skipped.len(),
        "scan finished"
    );
    Ok(outcome)
}

/// Descriptor for a marked method: canonical lower-cased name (prefixed by
/// the type's namespace), alias, parameters with resolved suggestion sources.
pub(crate) fn build_descriptor(
    ty: &TypeDecl,
    method: &MethodDecl,
    marker: &CommandMarker,
) -> Result<CommandDescriptor, String> {
    let raw_name = marker
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&method.name);
    let name = qualify(ty.prefix.as_deref(), raw_name);
    validate_command_name(&name)?;

    let alias = match marker.alias.as_deref().filter(|a| !a.is_empty()) {
        Some(alias) => {
            validate_command_name(alias)?;
            Some(alias.to_lowercase())
        }
        None => None,
    };

    let parameters = method
        .params
        .iter()
        .map(|p| ParameterDescriptor {
            name: p.name.clone(),
            ty: p.ty.clone(),
            is_optional: p.optional,
            default: p.default.clone(),
            suggestions: resolve_suggestions(ty, &p.name, &p.suggestions),
        })
        .collect();

    Ok(CommandDescriptor {
        name,
        alias,
        description: marker.description.clone(),
        execution_mode: marker.mode,
        binding: marker.binding,
        is_static: method.is_static,
        declaring_type: ty.key.clone(),
        method: method.name.clone(),
        callable: method.callable.clone(),
        parameters,
        factory: ty.factory.clone(),
    })
}

fn resolve_suggestions(ty: &TypeDecl, param: &str, decl: &SuggestionDecl) -> SuggestionSource {
    match decl {
        SuggestionDecl::None => SuggestionSource::None,
        SuggestionDecl::Static(items) => SuggestionSource::Static(items.clone()),
        SuggestionDecl::Provider(provider) => SuggestionSource::Provider(provider.clone()),
        SuggestionDecl::CommandNames => SuggestionSource::CommandNames,
        SuggestionDecl::Method(name) => match ty.suggesters.get(name) {
            Some(func) => SuggestionSource::Method {
                name: name.clone(),
                func: func.clone(),
            },
            None => {
                tracing::warn!(ty = %ty.key, param, method = %name, "suggestion method not found");
                SuggestionSource::None
            }
        },
    }
}

/// Eager binding check. Creates singletons up front and notes commands that
/// have nothing to run against yet; execution always resolves afresh.
fn bind_eagerly(ctx: &ConsoleContext, ty: &TypeDecl, descriptor: &CommandDescriptor) {
    if descriptor.is_static || descriptor.binding == BindingPolicy::Argument {
        return;
    }
    let resolver = BindingResolver::new(ctx.directory.as_ref());
    let targets = resolver.resolve(&ty.key, descriptor.binding, descriptor.factory.as_ref());
    if targets.is_empty() {
        tracing::warn!(
            command = %descriptor.name,
            ty = %ty.key,
            "no instance to bind yet"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ParamType;
    use crate::registry::declare::{CodeSurface, MethodDecl, ModuleDecl, ParamDecl};
    use crate::scene::{ObjectDirectory, Scene};

    struct Cheats;
    struct Hidden;
    #[derive(Default)]
    struct Settings;

    fn marked(name: &str) -> MethodDecl {
        MethodDecl::new_static(name, |_call| Ok(())).command(CommandMarker::new())
    }

    #[test]
    fn allow_list_is_case_insensitive_glob() {
        let patterns = compile_patterns(&["game*".into(), "assembly-csharp".into()]).unwrap();
        assert!(module_allowed(&patterns, "Game.Core"));
        assert!(module_allowed(&patterns, "Assembly-CSharp"));
        assert!(!module_allowed(&patterns, "engine.render"));
    }

    #[test]
    fn invalid_pattern_fails_discovery() {
        let ctx = ConsoleContext::new(CodeSurface::new()).with_module_patterns(["[oops"]);
        let err = discover(&ctx, &mut HashSet::new()).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPattern { .. }));
    }

    #[test]
    fn skips_foreign_ignored_and_broken_types() {
        let surface = CodeSurface::new()
            .with_module(ModuleDecl::new("engine.render").with_type(TypeDecl::new::<Cheats>().method(marked("render"))))
            .with_module(
                ModuleDecl::new("game.core")
                    .with_type(TypeDecl::new::<Hidden>().ignore().method(marked("secret")))
                    .with_type(TypeDecl::unloadable(TypeKey::named("game::Broken"), "bad metadata"))
                    .with_type(
                        TypeDecl::new::<Cheats>()
                            .prefix("Cheat")
                            .method(marked("God"))
                            .method(MethodDecl::new_static("helper", |_call| Ok(()))),
                    ),
            );
        let ctx = ConsoleContext::new(surface);
        let outcome = discover(&ctx, &mut HashSet::new()).unwrap();

        let names: Vec<&str> = outcome.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["cheat.god"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].1, "bad metadata");
    }

    #[test]
    fn scanned_types_are_not_revisited() {
        let surface = CodeSurface::new()
            .with_module(ModuleDecl::new("game").with_type(TypeDecl::new::<Cheats>().method(marked("fly"))));
        let ctx = ConsoleContext::new(surface);
        let mut scanned = HashSet::new();
        assert_eq!(discover(&ctx, &mut scanned).unwrap().commands.len(), 1);
        assert!(discover(&ctx, &mut scanned).unwrap().commands.is_empty());
    }

    #[test]
    fn unloadable_types_are_retried_later() {
        let broken = CodeSurface::new().with_module(
            ModuleDecl::new("game").with_type(TypeDecl::unloadable(TypeKey::of::<Cheats>(), "still loading")),
        );
        let mut scanned = HashSet::new();
        let outcome = discover(&ConsoleContext::new(broken), &mut scanned).unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert!(scanned.is_empty());

        let loaded = CodeSurface::new()
            .with_module(ModuleDecl::new("game").with_type(TypeDecl::new::<Cheats>().method(marked("fly"))));
        let outcome = discover(&ConsoleContext::new(loaded), &mut scanned).unwrap();
        assert_eq!(outcome.commands.len(), 1);
        assert!(scanned.contains(&TypeKey::of::<Cheats>()));
    }

    #[test]
    fn names_with_whitespace_are_skipped() {
        let surface = CodeSurface::new().with_module(
            ModuleDecl::new("game").with_type(
                TypeDecl::new::<Cheats>()
                    .method(MethodDecl::new_static("a", |_call| Ok(())).command(CommandMarker::named("two words")))
                    .method(marked("ok")),
            ),
        );
        let outcome = discover(&ConsoleContext::new(surface), &mut HashSet::new()).unwrap();
        assert_eq!(outcome.commands.len(), 1);
    }

    #[test]
    fn suggestion_methods_resolve_against_siblings() {
        let surface = CodeSurface::new().with_module(
            ModuleDecl::new("game").with_type(
                TypeDecl::new::<Cheats>()
                    .suggester("levels", |_| Ok(vec!["one".into()]))
                    .method(
                        marked("load")
                            .param(ParamDecl::new("level", ParamType::String).suggest_from("levels"))
                            .param(ParamDecl::new("slot", ParamType::String).suggest_from("missing")),
                    ),
            ),
        );
        let outcome = discover(&ConsoleContext::new(surface), &mut HashSet::new()).unwrap();
        let params = &outcome.commands[0].parameters;
        assert!(matches!(&params[0].suggestions, SuggestionSource::Method { name, .. } if name == "levels"));
        assert!(matches!(params[1].suggestions, SuggestionSource::None));
    }

    #[test]
    fn singleton_commands_create_their_instance_at_discovery() {
        let scene = Arc::new(Scene::new());
        let surface = CodeSurface::new().with_module(
            ModuleDecl::new("game").with_type(
                TypeDecl::new::<Settings>().singleton(Settings::default).method(
                    MethodDecl::instance::<Settings, _>("show", |_this, _call| Ok(()))
                        .command(CommandMarker::new().binding(BindingPolicy::Singleton)),
                ),
            ),
        );
        let ctx = ConsoleContext::new(surface).with_directory(scene.clone());
        discover(&ctx, &mut HashSet::new()).unwrap();
        assert_eq!(scene.object_names(), vec!["Settings_Singleton"]);
        assert!(scene.find_first(&TypeKey::of::<Settings>(), false).is_some());
    }
}
