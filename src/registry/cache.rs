//! Persisted snapshot of discovered commands.
//!
//! The file is a flat JSON list of records. On load each record is matched
//! back to a live method by declaring type, method name, staticness and
//! parameter identities; records whose type or method is gone are dropped
//! with a warning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::TypeKey;
use crate::storage::{read_json, write_json};

use super::declare::CodeSurface;
use super::discovery::build_descriptor;
use super::{BindingPolicy, CommandDescriptor, ExecutionMode};

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCommand {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub description: String,
    pub command_type: ExecutionMode,
    pub declaring_type: TypeKey,
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub is_static: bool,
    /// Older files carry no binding; the method's marker supplies it then.
    #[serde(default)]
    pub binding: Option<BindingPolicy>,
}

impl From<&CommandDescriptor> for CachedCommand {
    fn from(d: &CommandDescriptor) -> Self {
        Self {
            name: d.name.clone(),
            alias: d.alias.clone(),
            description: d.description.clone(),
            command_type: d.execution_mode,
            declaring_type: d.declaring_type.clone(),
            method_name: d.method.clone(),
            parameter_types: d.parameter_types(),
            is_static: d.is_static,
            binding: Some(d.binding),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    commands: Vec<CachedCommand>,
}

#[derive(Debug, Clone)]
pub struct CommandCache {
    path: PathBuf,
}

impl CommandCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records from disk. A missing, unreadable or foreign-version file
    /// yields an empty list, which makes discovery fall back to a scan.
    pub fn load(&self) -> Vec<CachedCommand> {
        if !self.path.exists() {
            return Vec::new();
        }
        match read_json::<CacheFile>(&self.path) {
            Ok(file) if file.version == CACHE_VERSION => file.commands,
            Ok(file) => {
                tracing::warn!(
                    path = %self.path.display(),
                    version = file.version,
                    "ignoring command cache with unknown version"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable command cache: {e}");
                Vec::new()
            }
        }
    }

    /// Overwrite the file with `commands`. Returns how many were written.
    pub fn save<'a>(&self, commands: impl Iterator<Item = &'a CommandDescriptor>) -> Result<usize, StorageError> {
        let file = CacheFile {
            version: CACHE_VERSION,
            commands: commands.map(CachedCommand::from).collect(),
        };
        write_json(&self.path, &file)?;
        Ok(file.commands.len())
    }
}

/// Rebuild descriptors from cached records against the current code surface.
pub fn rehydrate(records: &[CachedCommand], surface: &CodeSurface) -> Vec<CommandDescriptor> {
    records
        .iter()
        .filter_map(|record| match rehydrate_one(record, surface) {
            Ok(descriptor) => Some(descriptor),
            Err(reason) => {
                tracing::warn!(command = %record.name, "dropping cached command: {reason}");
                None
            }
        })
        .collect()
}

fn rehydrate_one(record: &CachedCommand, surface: &CodeSurface) -> Result<CommandDescriptor, String> {
    let ty = surface
        .find_type(&record.declaring_type)
        .ok_or_else(|| format!("missing type {}", record.declaring_type))?;
    let method = ty
        .find_method(&record.method_name, &record.parameter_types, record.is_static)
        .ok_or_else(|| format!("missing method {} in {}", record.method_name, record.declaring_type))?;
    let marker = method
        .marker
        .as_ref()
        .ok_or_else(|| format!("method {} is no longer a command", record.method_name))?;

    let built = build_descriptor(ty, method, marker)?;
    Ok(CommandDescriptor {
        name: record.name.clone(),
        alias: record.alias.clone(),
        description: record.description.clone(),
        execution_mode: record.command_type,
        binding: record.binding.unwrap_or(built.binding),
        ..built
    })
}
