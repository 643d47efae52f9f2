//! The declaration surface host code uses to expose commands.
//!
//! Each module registers a `ModuleDecl` describing its types; each type lists
//! its methods, and a method becomes a command when it carries a
//! `CommandMarker`. Discovery walks this surface instead of reflecting over
//! compiled code.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Instance, ParamType, TypeKey, Value};

use super::execute::Call;
use super::{BindingPolicy, ExecutionMode, ParameterDescriptor};

/// The invocable body of a command.
pub type Callable = Arc<dyn Fn(&mut Call<'_>) -> Result<(), String> + Send + Sync>;

/// Creates a fresh instance of a type, for `Singleton` binding.
pub type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// A sibling suggestion method. Receives the bound instance when one exists.
pub type SuggestFn = Arc<dyn Fn(Option<&Instance>) -> Result<Vec<String>, String> + Send + Sync>;

/// A user-supplied completion source for one parameter.
pub trait SuggestionProvider: Send + Sync {
    fn suggestions(&self, parameter: &ParameterDescriptor, input: &str) -> Result<Vec<String>, String>;
}

/// Marks a method as a console command.
#[derive(Debug, Clone, Default)]
pub struct CommandMarker {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub description: String,
    pub mode: ExecutionMode,
    pub binding: BindingPolicy,
}

impl CommandMarker {
    /// Command named after its method.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn binding(mut self, binding: BindingPolicy) -> Self {
        self.binding = binding;
        self
    }
}

/// Declared completion source, before sibling methods are resolved.
#[derive(Clone, Default)]
pub enum SuggestionDecl {
    #[default]
    None,
    Static(Vec<String>),
    Method(String),
    Provider(Arc<dyn SuggestionProvider>),
    CommandNames,
}

#[derive(Clone)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ParamType,
    pub optional: bool,
    pub default: Option<Value>,
    pub suggestions: SuggestionDecl,
}

impl ParamDecl {
    pub fn new(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            optional: false,
            default: None,
            suggestions: SuggestionDecl::None,
        }
    }

    /// Optional, falling back to the type's zero value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Optional with an explicit default.
    pub fn default_value(mut self, value: Value) -> Self {
        self.optional = true;
        self.default = Some(value);
        self
    }

    pub fn suggest<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = SuggestionDecl::Static(items.into_iter().map(Into::into).collect());
        self
    }

    /// Complete from a suggestion method registered on the declaring type.
    pub fn suggest_from(mut self, method: &str) -> Self {
        self.suggestions = SuggestionDecl::Method(method.to_string());
        self
    }

    /// Complete with registered command names.
    pub fn suggest_commands(mut self) -> Self {
        self.suggestions = SuggestionDecl::CommandNames;
        self
    }

    pub fn suggest_with(mut self, provider: impl SuggestionProvider + 'static) -> Self {
        self.suggestions = SuggestionDecl::Provider(Arc::new(provider));
        self
    }
}

#[derive(Clone)]
pub struct MethodDecl {
    pub name: String,
    pub is_static: bool,
    pub marker: Option<CommandMarker>,
    pub params: Vec<ParamDecl>,
    pub callable: Callable,
}

impl std::fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl MethodDecl {
    /// A method that needs no instance.
    pub fn new_static<F>(name: &str, body: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            is_static: true,
            marker: None,
            params: Vec::new(),
            callable: Arc::new(body),
        }
    }

    /// A method invoked on an instance of `T`.
    pub fn instance<T, F>(name: &str, body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &mut Call<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        let callable: Callable = Arc::new(move |call: &mut Call<'_>| {
            let target = call
                .target()
                .cloned()
                .ok_or_else(|| "no target instance".to_string())?;
            let this = target
                .downcast_ref::<T>()
                .ok_or_else(|| format!("target is not a {}", type_name::<T>()))?;
            body(this, call)
        });
        Self {
            name: name.to_string(),
            is_static: false,
            marker: None,
            params: Vec::new(),
            callable,
        }
    }

    pub fn command(mut self, marker: CommandMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn param_identities(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.identity()).collect()
    }
}

#[derive(Clone)]
pub struct TypeDecl {
    pub key: TypeKey,
    /// Namespace prepended to the names of this type's commands.
    pub prefix: Option<String>,
    /// Excluded from discovery.
    pub ignored: bool,
    pub factory: Option<Factory>,
    pub suggesters: HashMap<String, SuggestFn>,
    /// `Err` when the type's members cannot be enumerated; discovery logs
    /// and skips it.
    pub members: Result<Vec<MethodDecl>, String>,
}

impl TypeDecl {
    pub fn new<T: Any>() -> Self {
        Self::named(TypeKey::of::<T>())
    }

    pub fn named(key: TypeKey) -> Self {
        Self {
            key,
            prefix: None,
            ignored: false,
            factory: None,
            suggesters: HashMap::new(),
            members: Ok(Vec::new()),
        }
    }

    /// A type whose members could not be loaded.
    pub fn unloadable(key: TypeKey, reason: &str) -> Self {
        Self {
            members: Err(reason.to_string()),
            ..Self::named(key)
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Factory used when a `Singleton` command finds no live instance.
    pub fn singleton<T, F>(mut self, make: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move || -> Instance { Arc::new(make()) }));
        self
    }

    pub fn suggester<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(Option<&Instance>) -> Result<Vec<String>, String> + Send + Sync + 'static,
    {
        self.suggesters.insert(name.to_string(), Arc::new(func));
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        if let Ok(members) = &mut self.members {
            members.push(method);
        }
        self
    }

    pub fn find_method(&self, name: &str, identities: &[String], is_static: bool) -> Option<&MethodDecl> {
        self.members.as_ref().ok()?.iter().find(|m| {
            m.name == name && m.is_static == is_static && m.param_identities() == identities
        })
    }
}

/// A named unit of host code, matched against the module allow-list.
#[derive(Clone)]
pub struct ModuleDecl {
    pub name: String,
    pub types: Vec<TypeDecl>,
}

impl ModuleDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: TypeDecl) -> Self {
        self.types.push(ty);
        self
    }
}

/// Every module the host has registered.
#[derive(Clone, Default)]
pub struct CodeSurface {
    modules: Vec<ModuleDecl>,
}

impl CodeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: ModuleDecl) {
        self.modules.push(module);
    }

    pub fn with_module(mut self, module: ModuleDecl) -> Self {
        self.register(module);
        self
    }

    pub fn modules(&self) -> &[ModuleDecl] {
        &self.modules
    }

    /// Resolve a type by identity, regardless of module filters.
    pub fn find_type(&self, key: &TypeKey) -> Option<&TypeDecl> {
        self.modules
            .iter()
            .flat_map(|m| m.types.iter())
            .find(|t| &t.key == key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Door;

    #[test]
    fn find_method_matches_parameter_identities() {
        let ty = TypeDecl::new::<Door>().method(
            MethodDecl::new_static("open", |_call| Ok(()))
                .param(ParamDecl::new("speed", ParamType::Float)),
        );
        assert!(ty.find_method("open", &["float".into()], true).is_some());
        assert!(ty.find_method("open", &["int".into()], true).is_none());
        assert!(ty.find_method("open", &["float".into()], false).is_none());
    }

    #[test]
    fn unloadable_type_ignores_methods() {
        let ty = TypeDecl::unloadable(TypeKey::named("broken"), "missing dependency")
            .method(MethodDecl::new_static("x", |_call| Ok(())));
        assert_eq!(ty.members.unwrap_err(), "missing dependency");
    }

    #[test]
    fn surface_finds_types_across_modules() {
        let surface = CodeSurface::new()
            .with_module(ModuleDecl::new("a"))
            .with_module(ModuleDecl::new("b").with_type(TypeDecl::new::<Door>()));
        assert!(surface.find_type(&TypeKey::of::<Door>()).is_some());
        assert!(surface.find_type(&TypeKey::named("nope")).is_none());
    }

    #[test]
    fn default_value_implies_optional() {
        let p = ParamDecl::new("n", ParamType::Int).default_value(Value::Int(3));
        assert!(p.optional);
        assert_eq!(p.default, Some(Value::Int(3)));
    }
}
