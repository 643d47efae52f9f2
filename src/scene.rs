//! The live-object directory the binding resolver and the object-reference
//! converter query, plus `Scene`, an in-memory implementation.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::{Instance, TypeKey};

/// A component attached to a named object.
#[derive(Debug, Clone)]
pub struct Component {
    pub ty: TypeKey,
    pub instance: Instance,
}

/// Snapshot of one named object returned by directory lookups.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub name: String,
    pub active: bool,
    pub components: Vec<Component>,
}

impl ObjectInfo {
    pub fn component(&self, ty: &TypeKey) -> Option<&Instance> {
        self.components
            .iter()
            .find(|c| &c.ty == ty)
            .map(|c| &c.instance)
    }
}

/// Queries against the host's population of live objects. Implementations
/// must answer from current state on every call: the binding resolver never
/// caches what it gets back.
pub trait ObjectDirectory: Send + Sync {
    /// Every component of type `ty`, in creation order. Components of
    /// inactive objects are included only when `include_inactive` is set.
    fn find_instances(&self, ty: &TypeKey, include_inactive: bool) -> Vec<Instance>;

    fn find_first(&self, ty: &TypeKey, include_inactive: bool) -> Option<Instance> {
        self.find_instances(ty, include_inactive).into_iter().next()
    }

    /// The first active object called `name`.
    fn find_object(&self, name: &str) -> Option<ObjectInfo>;

    /// Add a new active object holding a single component.
    fn register(&self, name: &str, component: Component);
}

/// In-memory object directory. Objects keep their insertion order.
#[derive(Debug, Default)]
pub struct Scene {
    objects: RwLock<Vec<ObjectInfo>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an active object with one component. Returns the typed handle.
    pub fn spawn<T: Any + Send + Sync>(&self, name: &str, component: T) -> Arc<T> {
        let typed = Arc::new(component);
        let instance: Instance = typed.clone();
        self.objects.write().push(ObjectInfo {
            name: name.to_string(),
            active: true,
            components: vec![Component {
                ty: TypeKey::of::<T>(),
                instance,
            }],
        });
        typed
    }

    /// Attach a component to the first object called `name`.
    pub fn attach<T: Any + Send + Sync>(&self, name: &str, component: T) -> Option<Arc<T>> {
        let mut objects = self.objects.write();
        let object = objects.iter_mut().find(|o| o.name == name)?;
        let typed = Arc::new(component);
        let instance: Instance = typed.clone();
        object.components.push(Component {
            ty: TypeKey::of::<T>(),
            instance,
        });
        Some(typed)
    }

    /// Returns false when no object is called `name`.
    pub fn set_active(&self, name: &str, active: bool) -> bool {
        let mut objects = self.objects.write();
        match objects.iter_mut().find(|o| o.name == name) {
            Some(object) => {
                object.active = active;
                true
            }
            None => false,
        }
    }

    /// Remove the first object called `name`.
    pub fn destroy(&self, name: &str) -> bool {
        let mut objects = self.objects.write();
        match objects.iter().position(|o| o.name == name) {
            Some(idx) => {
                objects.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects.read().iter().map(|o| o.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectDirectory for Scene {
    fn find_instances(&self, ty: &TypeKey, include_inactive: bool) -> Vec<Instance> {
        self.objects
            .read()
            .iter()
            .filter(|o| include_inactive || o.active)
            .flat_map(|o| o.components.iter())
            .filter(|c| &c.ty == ty)
            .map(|c| c.instance.clone())
            .collect()
    }

    fn find_object(&self, name: &str) -> Option<ObjectInfo> {
        self.objects
            .read()
            .iter()
            .find(|o| o.active && o.name == name)
            .cloned()
    }

    fn register(&self, name: &str, component: Component) {
        self.objects.write().push(ObjectInfo {
            name: name.to_string(),
            active: true,
            components: vec![component],
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Enemy(u32);
    struct Health(u32);

    #[test]
    fn inactive_objects_are_filtered() {
        let scene = Scene::new();
        scene.spawn("a", Enemy(1));
        scene.spawn("b", Enemy(2));
        scene.set_active("a", false);

        let key = TypeKey::of::<Enemy>();
        assert_eq!(scene.find_instances(&key, false).len(), 1);
        assert_eq!(scene.find_instances(&key, true).len(), 2);

        let first = scene.find_first(&key, false).unwrap();
        assert_eq!(first.downcast_ref::<Enemy>().unwrap().0, 2);
    }

    #[test]
    fn find_object_returns_components() {
        let scene = Scene::new();
        scene.spawn("player", Enemy(0));
        scene.attach("player", Health(40)).unwrap();

        let info = scene.find_object("player").unwrap();
        let health = info.component(&TypeKey::of::<Health>()).unwrap();
        assert_eq!(health.downcast_ref::<Health>().unwrap().0, 40);
        assert!(scene.find_object("ghost").is_none());

        scene.set_active("player", false);
        assert!(scene.find_object("player").is_none());
    }

    #[test]
    fn destroy_removes_object() {
        let scene = Scene::new();
        scene.spawn("a", Enemy(1));
        assert!(scene.destroy("a"));
        assert!(!scene.destroy("a"));
        assert!(scene.is_empty());
    }
}
