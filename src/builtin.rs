//! Commands every console ships with, under the `console.` prefix.

use crate::model::ParamType;
use crate::registry::catalog;
use crate::registry::declare::{CommandMarker, MethodDecl, ModuleDecl, ParamDecl, TypeDecl};
use crate::registry::execute::ConsoleAction;
use crate::registry::ExecutionMode;

/// Module name the built-ins register under. Matched by the default
/// `devtools*` allow-list entry.
pub const MODULE_NAME: &str = "devtools.console";

/// Declaring type of the built-in commands.
pub struct ConsoleCommands;

pub fn module() -> ModuleDecl {
    ModuleDecl::new(MODULE_NAME).with_type(
        TypeDecl::new::<ConsoleCommands>()
            .prefix("console")
            .method(
                MethodDecl::new_static("clear", |call| {
                    call.request(ConsoleAction::ClearLogs);
                    Ok(())
                })
                .command(
                    CommandMarker::new()
                        .description("Clear the console output")
                        .mode(ExecutionMode::Both),
                ),
            )
            .method(
                MethodDecl::new_static("refresh_commands", |call| {
                    call.request(ConsoleAction::RefreshCommands);
                    Ok(())
                })
                .command(
                    CommandMarker::new()
                        .description("Rescan modules for commands and rewrite the cache")
                        .mode(ExecutionMode::EditorOnly),
                ),
            )
            .method(
                MethodDecl::new_static("help", |call| {
                    let topic: String = call.arg(0)?;
                    let text = catalog::help_text(call.registry(), Some(&topic));
                    for line in text.lines() {
                        call.print(line);
                    }
                    Ok(())
                })
                .command(
                    CommandMarker::new()
                        .description("List command groups, or describe a group or command")
                        .mode(ExecutionMode::Both),
                )
                .param(ParamDecl::new("command", ParamType::String).optional().suggest_commands()),
            )
            .method(
                MethodDecl::new_static("commands", |call| {
                    let mut names: Vec<String> = call.registry().commands().keys().cloned().collect();
                    names.sort();
                    call.print(&format!("{} commands: {}", names.len(), names.join(", ")));
                    Ok(())
                })
                .command(
                    CommandMarker::new()
                        .alias("get_all_commands")
                        .description("Print every registered command name")
                        .mode(ExecutionMode::Both),
                ),
            ),
    )
}
