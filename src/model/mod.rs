pub mod types;
pub mod value;
pub mod vector;

use std::any::Any;
use std::sync::Arc;

// Re-export commonly used types at the model level.
pub use types::{EnumType, ParamType, TypeKey};
pub use value::{EnumValue, FromValue, ObjectRef, Value};
pub use vector::{Vector2, Vector2Int, Vector3, Vector3Int};

/// A live object a non-static command can run against. Command code
/// downcasts it to its declaring type; state mutation goes through interior
/// mutability on that type.
pub type Instance = Arc<dyn Any + Send + Sync>;
