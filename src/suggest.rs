//! Completions for partially typed console input.

use std::panic::{self, AssertUnwindSafe};

use crate::binding::BindingResolver;
use crate::context::ConsoleContext;
use crate::events::LogSink;
use crate::registry::execute::panic_message;
use crate::registry::{BindingPolicy, CommandDescriptor, ParameterDescriptor, Registry, SuggestionSource};
use crate::util::starts_with_ignore_case;

/// Split input into (command, completed args, partial). A trailing
/// whitespace opens a new empty partial token.
fn split_input(input: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = input.split_whitespace().collect();
    if input.ends_with(char::is_whitespace) {
        tokens.push("");
    }
    tokens
}

/// Completions for `input`. One token completes command names; more tokens
/// complete the parameter being typed. Source failures are written to `sink`
/// as warnings and yield no suggestions.
pub fn suggestions(
    ctx: &ConsoleContext,
    registry: &Registry,
    input: &str,
    sink: &mut dyn LogSink,
) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    let tokens = split_input(input);
    let Some((first, rest)) = tokens.split_first() else {
        return Vec::new();
    };

    if rest.is_empty() {
        return registry
            .commands()
            .keys()
            .filter(|name| starts_with_ignore_case(name, first))
            .cloned()
            .collect();
    }

    let Some(descriptor) = registry.get(first) else {
        return Vec::new();
    };
    let index = rest.len() - 1;
    let Some(param) = descriptor.parameters.get(index) else {
        return Vec::new();
    };
    let partial = rest.last().copied().unwrap_or_default();

    match candidates(ctx, registry, descriptor, param, partial) {
        Ok(items) => items
            .into_iter()
            .filter(|s| starts_with_ignore_case(s, partial))
            .collect(),
        Err(message) => {
            tracing::debug!(command = %descriptor.name, param = %param.name, "suggestion source failed: {message}");
            sink.warn(&format!("Suggestion error: {message}"));
            Vec::new()
        }
    }
}

/// Evaluate a parameter's suggestion source, unfiltered.
fn candidates(
    ctx: &ConsoleContext,
    registry: &Registry,
    descriptor: &CommandDescriptor,
    param: &ParameterDescriptor,
    partial: &str,
) -> Result<Vec<String>, String> {
    match &param.suggestions {
        SuggestionSource::None => Ok(Vec::new()),
        SuggestionSource::Static(items) => Ok(items.clone()),
        SuggestionSource::Method { func, .. } => {
            let instance = context_instance(ctx, descriptor);
            guarded(|| func(instance.as_ref()))
        }
        SuggestionSource::Provider(provider) => guarded(|| provider.suggestions(param, partial)),
        SuggestionSource::CommandNames => Ok(registry.commands().keys().cloned().collect()),
    }
}

/// An existing instance of the declaring type, for instance-aware
/// suggestion methods. Never creates one.
fn context_instance(ctx: &ConsoleContext, descriptor: &CommandDescriptor) -> Option<crate::model::Instance> {
    if descriptor.is_static || descriptor.binding == BindingPolicy::Argument {
        return None;
    }
    BindingResolver::new(ctx.directory.as_ref()).peek(&descriptor.declaring_type)
}

fn guarded<F>(f: F) -> Result<Vec<String>, String>
where
    F: FnOnce() -> Result<Vec<String>, String>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(panic_message(payload.as_ref())))
}
