use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;

use crate::binding::BindingResolver;
use crate::context::ConsoleContext;
use crate::convert::ParseContext;
use crate::error::ConsoleError;
use crate::events::LogSink;
use crate::model::{FromValue, Instance, Value};
use crate::util::tokenize;

use super::{BindingPolicy, CommandDescriptor, ExecutionMode, Registry};

/// Follow-up work a command asks the console to do once it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    ClearLogs,
    RefreshCommands,
}

/// What command code sees while it runs.
pub struct Call<'a> {
    command: &'a CommandDescriptor,
    registry: &'a Registry,
    target: Option<Instance>,
    args: &'a [Value],
    sink: &'a mut dyn LogSink,
    actions: &'a mut Vec<ConsoleAction>,
}

impl Call<'_> {
    pub fn command(&self) -> &CommandDescriptor {
        self.command
    }

    /// Read view of the registry the command was dispatched from.
    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn target(&self) -> Option<&Instance> {
        self.target.as_ref()
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Typed argument `index`.
    pub fn arg<T: FromValue>(&self, index: usize) -> Result<T, String> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| format!("missing argument {index}"))?;
        T::from_value(value).ok_or_else(|| format!("argument {index} is not a {}", T::EXPECTED))
    }

    /// Enum argument `index`, deserialized into `T`.
    pub fn enum_arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, String> {
        let value: crate::model::EnumValue = self.arg(index)?;
        value
            .to::<T>()
            .ok_or_else(|| format!("'{}' is not a valid {}", value.variant, value.ty))
    }

    pub fn print(&mut self, message: &str) {
        self.sink.info(message);
    }

    pub fn warn(&mut self, message: &str) {
        self.sink.warn(message);
    }

    pub fn request(&mut self, action: ConsoleAction) {
        if !self.actions.contains(&action) {
            self.actions.push(action);
        }
    }
}

/// Run one line of console input. Every outcome is written to `sink`;
/// nothing is raised to the caller. Returns the follow-up actions the
/// invoked command requested.
pub fn execute(
    ctx: &ConsoleContext,
    registry: &Registry,
    input: &str,
    sink: &mut dyn LogSink,
) -> Vec<ConsoleAction> {
    let mut actions = Vec::new();
    if let Err(e) = dispatch(ctx, registry, input, sink, &mut actions) {
        tracing::debug!(input, "command rejected: {e}");
        sink.error(&e.to_string());
    }
    actions
}

fn dispatch(
    ctx: &ConsoleContext,
    registry: &Registry,
    input: &str,
    sink: &mut dyn LogSink,
    actions: &mut Vec<ConsoleAction>,
) -> Result<(), ConsoleError> {
    let tokens = tokenize(input);
    let Some((name, arg_tokens)) = tokens.split_first() else {
        sink.warn("Empty command.");
        return Ok(());
    };

    let descriptor = registry
        .get(name)
        .ok_or_else(|| ConsoleError::UnknownCommand {
            name: (*name).to_string(),
        })?;

    let live = ctx.host.is_live();
    if !descriptor.execution_mode.allows(live) {
        sink.warn(&mode_rejection(&descriptor.name, descriptor.execution_mode));
        return Ok(());
    }

    let parse_ctx = ParseContext {
        directory: ctx.directory.as_ref(),
    };
    let args = parse_arguments(ctx, &parse_ctx, descriptor, arg_tokens)?;
    if arg_tokens.len() > descriptor.parameters.len() {
        sink.warn(&format!(
            "[{}] ignoring {} extra argument(s)",
            descriptor.name,
            arg_tokens.len() - descriptor.parameters.len()
        ));
    }

    let (targets, args) = resolve_targets(ctx, descriptor, args)?;
    tracing::debug!(command = %descriptor.name, targets = targets.len(), "invoking");
    for target in targets {
        invoke(descriptor, registry, target, &args, sink, actions);
    }
    Ok(())
}

fn mode_rejection(name: &str, mode: ExecutionMode) -> String {
    match mode {
        ExecutionMode::RuntimeOnly => format!("Command '{name}' can only be executed at runtime."),
        ExecutionMode::EditorOnly => format!("Command '{name}' can only be executed in the editor."),
        ExecutionMode::Both => format!("Command '{name}' cannot be executed now."),
    }
}

/// Convert tokens positionally. Too few tokens for the required parameters
/// fails before any converter runs; missing optional parameters take their
/// default.
pub fn parse_arguments(
    ctx: &ConsoleContext,
    parse_ctx: &ParseContext<'_>,
    descriptor: &CommandDescriptor,
    tokens: &[&str],
) -> Result<Vec<Value>, ConsoleError> {
    let required = descriptor.required_count();
    if tokens.len() < required {
        let missing = descriptor
            .parameters
            .iter()
            .skip(tokens.len())
            .find(|p| !p.is_optional)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        return Err(ConsoleError::MissingRequiredParameter {
            command: descriptor.name.clone(),
            parameter: missing,
            required,
            given: tokens.len(),
        });
    }

    let mut values = Vec::with_capacity(descriptor.parameters.len());
    for (index, param) in descriptor.parameters.iter().enumerate() {
        match tokens.get(index) {
            Some(token) => values.push(ctx.converters.parse(token, &param.ty, &param.name, parse_ctx)?),
            None if param.is_optional => values.push(param.fallback_value()),
            None => {
                return Err(ConsoleError::MissingRequiredParameter {
                    command: descriptor.name.clone(),
                    parameter: param.name.clone(),
                    required,
                    given: tokens.len(),
                })
            }
        }
    }
    Ok(values)
}

/// Targets to invoke on (`None` for static calls) and the argument list the
/// callable receives. `Argument` binding consumes the first argument.
fn resolve_targets(
    ctx: &ConsoleContext,
    descriptor: &CommandDescriptor,
    mut args: Vec<Value>,
) -> Result<(Vec<Option<Instance>>, Vec<Value>), ConsoleError> {
    if descriptor.is_static {
        return Ok((vec![None], args));
    }
    let missing = || ConsoleError::NoTargetInstance {
        command: descriptor.name.clone(),
        type_name: descriptor.declaring_type.short_name().to_string(),
    };

    if descriptor.binding == BindingPolicy::Argument {
        if args.is_empty() {
            return Err(missing());
        }
        let first = args.remove(0);
        let instance = first
            .as_object()
            .and_then(|o| o.component.clone())
            .ok_or_else(missing)?;
        return Ok((vec![Some(instance)], args));
    }

    let resolver = BindingResolver::new(ctx.directory.as_ref());
    let instances = resolver.resolve(
        &descriptor.declaring_type,
        descriptor.binding,
        descriptor.factory.as_ref(),
    );
    if instances.is_empty() {
        return Err(missing());
    }
    Ok((instances.into_iter().map(Some).collect(), args))
}

/// Invoke once. A returned error or a panic becomes one error line; other
/// targets of a fan-out still run.
fn invoke(
    descriptor: &CommandDescriptor,
    registry: &Registry,
    target: Option<Instance>,
    args: &[Value],
    sink: &mut dyn LogSink,
    actions: &mut Vec<ConsoleAction>,
) {
    let outcome = {
        let mut call = Call {
            command: descriptor,
            registry,
            target,
            args,
            sink: &mut *sink,
            actions: &mut *actions,
        };
        panic::catch_unwind(AssertUnwindSafe(|| (descriptor.callable)(&mut call)))
    };

    let message = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(message)) => message,
        Err(payload) => panic_message(payload.as_ref()),
    };
    let err = ConsoleError::ExecutionError {
        command: descriptor.name.clone(),
        message,
    };
    tracing::warn!(command = %descriptor.name, "{err}");
    sink.error(&err.to_string());
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}
