//! In-process developer console: discovers annotated commands in host code,
//! parses typed arguments, binds commands to live objects and offers
//! completions while the user types.

pub mod binding;
pub mod builtin;
pub mod console;
pub mod context;
pub mod convert;
pub mod demo;
pub mod error;
pub mod events;
pub mod history;
pub mod model;
pub mod paths;
pub mod registry;
pub mod scene;
pub mod settings;
pub mod storage;
pub mod suggest;
pub mod util;

pub use console::Console;
pub use context::ConsoleContext;
pub use error::ConsoleError;
