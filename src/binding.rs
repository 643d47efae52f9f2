//! Finds the live instance(s) a non-static command runs against.
//!
//! Resolution is a pure function of (declaring type, policy) over the
//! current directory state. Nothing is cached between calls, so a command
//! keeps working after its targets are destroyed and recreated.

use crate::model::{Instance, TypeKey};
use crate::registry::declare::Factory;
use crate::registry::BindingPolicy;
use crate::scene::{Component, ObjectDirectory};

pub struct BindingResolver<'a> {
    directory: &'a dyn ObjectDirectory,
}

impl<'a> BindingResolver<'a> {
    pub fn new(directory: &'a dyn ObjectDirectory) -> Self {
        Self { directory }
    }

    /// Targets for `policy`. Empty when nothing matches; `Argument` always
    /// yields nothing since the caller supplies the instance.
    pub fn resolve(&self, ty: &TypeKey, policy: BindingPolicy, factory: Option<&Factory>) -> Vec<Instance> {
        match policy {
            BindingPolicy::Argument => Vec::new(),
            BindingPolicy::All | BindingPolicy::AllInactive => {
                self.directory.find_instances(ty, policy.includes_inactive())
            }
            BindingPolicy::Single | BindingPolicy::SingleInactive => self
                .directory
                .find_first(ty, policy.includes_inactive())
                .into_iter()
                .collect(),
            BindingPolicy::Singleton => self.singleton(ty, factory).into_iter().collect(),
        }
    }

    /// First instance (inactive included) without creating anything.
    pub fn peek(&self, ty: &TypeKey) -> Option<Instance> {
        self.directory.find_first(ty, true)
    }

    /// Existing instance, or a new one from `factory` registered as
    /// `<Type>_Singleton`.
    fn singleton(&self, ty: &TypeKey, factory: Option<&Factory>) -> Option<Instance> {
        if let Some(existing) = self.directory.find_first(ty, true) {
            return Some(existing);
        }
        let factory = factory?;
        let instance = factory();
        let name = singleton_name(ty);
        tracing::debug!(%ty, object = %name, "created singleton instance");
        self.directory.register(
            &name,
            Component {
                ty: ty.clone(),
                instance: instance.clone(),
            },
        );
        Some(instance)
    }
}

pub fn singleton_name(ty: &TypeKey) -> String {
    format!("{}_Singleton", ty.short_name())
}
