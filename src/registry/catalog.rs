use serde::Serialize;

use super::{BindingPolicy, CommandDescriptor, ExecutionMode, Registry};

/// Serializable summary of one registered command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRegistryEntry {
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
    pub group: String,
    pub signature: String,
    pub execution_mode: ExecutionMode,
    pub binding: BindingPolicy,
    pub is_static: bool,
}

impl From<&CommandDescriptor> for CommandRegistryEntry {
    fn from(d: &CommandDescriptor) -> Self {
        Self {
            name: d.name.clone(),
            alias: d.alias.clone(),
            description: d.description.clone(),
            group: group_of(&d.name).to_string(),
            signature: d.signature(),
            execution_mode: d.execution_mode,
            binding: d.binding,
            is_static: d.is_static,
        }
    }
}

/// Namespace of a command: the part before the first `.`.
pub fn group_of(name: &str) -> &str {
    name.split_once('.').map_or("general", |(group, _)| group)
}

/// Entries sorted by name.
pub fn command_entries(registry: &Registry) -> Vec<CommandRegistryEntry> {
    let mut entries: Vec<CommandRegistryEntry> = registry
        .commands()
        .values()
        .map(|d| CommandRegistryEntry::from(d.as_ref()))
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Help text in three tiers: no topic → groups, command → full detail,
/// group → command list.
pub fn help_text(registry: &Registry, topic: Option<&str>) -> String {
    let entries = command_entries(registry);

    let Some(topic) = topic.map(str::trim).filter(|t| !t.is_empty()) else {
        let mut groups: Vec<(&str, usize)> = Vec::new();
        for entry in &entries {
            match groups.iter_mut().find(|(g, _)| *g == entry.group) {
                Some((_, count)) => *count += 1,
                None => groups.push((&entry.group, 1)),
            }
        }
        groups.sort_by(|a, b| a.0.cmp(b.0));

        let mut lines = vec!["Available command groups:".to_string()];
        for (group, count) in groups {
            lines.push(format!("  {group} ({count})"));
        }
        lines.push(String::new());
        lines.push("Use 'console.help <group>' to list commands in a group.".to_string());
        lines.push("Use 'console.help <command>' for parameter details.".to_string());
        return lines.join("\n");
    };

    if let Some(descriptor) = registry.get(topic) {
        let mut lines = vec![descriptor.help_line()];
        if let Some(alias) = &descriptor.alias {
            lines.push(format!("Alias: {alias}"));
        }
        lines.push(format!(
            "Mode: {} | Binding: {:?}{}",
            descriptor.execution_mode.label(),
            descriptor.binding,
            if descriptor.is_static { " | static" } else { "" },
        ));
        if !descriptor.parameters.is_empty() {
            lines.push("Parameters:".to_string());
            for param in &descriptor.parameters {
                let mut line = format!("  {}: {}", param.name, param.ty.display_name());
                if param.is_optional {
                    line.push_str(&format!(" (optional, default {})", param.fallback_value()));
                }
                lines.push(line);
            }
        }
        return lines.join("\n");
    }

    let group = topic.to_lowercase();
    let matching: Vec<&CommandRegistryEntry> = entries.iter().filter(|e| e.group == group).collect();
    if matching.is_empty() {
        return format!("Unknown topic: \"{topic}\". Use 'console.help' to see groups.");
    }
    let mut lines = vec![format!("{group} commands:")];
    for entry in matching {
        if entry.description.is_empty() {
            lines.push(format!("  - {}", entry.name));
        } else {
            lines.push(format!("  - {}: {}", entry.name, entry.description));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::ConsoleContext;
    use crate::model::ParamType;
    use crate::registry::declare::{CodeSurface, CommandMarker, MethodDecl, ModuleDecl, ParamDecl, TypeDecl};

    struct Net;
    struct Misc;

    fn registry() -> Registry {
        let surface = CodeSurface::new().with_module(
            ModuleDecl::new("game.net")
                .with_type(
                    TypeDecl::new::<Net>()
                        .prefix("net")
                        .method(
                            MethodDecl::new_static("ping", |_call| Ok(()))
                                .command(CommandMarker::new().description("Round trip").alias("p"))
                                .param(ParamDecl::new("count", ParamType::Int).optional()),
                        )
                        .method(
                            MethodDecl::new_static("drop", |_call| Ok(())).command(CommandMarker::new()),
                        ),
                )
                .with_type(
                    TypeDecl::new::<Misc>()
                        .method(MethodDecl::new_static("quit", |_call| Ok(())).command(CommandMarker::new())),
                ),
        );
        let ctx = ConsoleContext::new(surface);
        let mut registry = Registry::new();
        registry.discover_commands(&ctx, false);
        registry
    }

    #[test]
    fn groups_split_on_first_dot() {
        assert_eq!(group_of("net.ping"), "net");
        assert_eq!(group_of("quit"), "general");
    }

    #[test]
    fn overview_counts_groups() {
        let text = help_text(&registry(), None);
        assert!(text.contains("  general (1)"));
        assert!(text.contains("  net (2)"));
    }

    #[test]
    fn command_topic_shows_parameters() {
        let text = help_text(&registry(), Some("p"));
        assert!(text.starts_with("net.ping [count:int] — Round trip"));
        assert!(text.contains("count: int (optional, default 0)"));
    }

    #[test]
    fn group_topic_lists_commands() {
        let text = help_text(&registry(), Some("NET"));
        assert!(text.contains("  - net.drop"));
        assert!(text.contains("  - net.ping: Round trip"));
        assert!(help_text(&registry(), Some("zzz")).starts_with("Unknown topic"));
    }

    #[test]
    fn entries_are_sorted() {
        let names: Vec<String> = command_entries(&registry()).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["net.drop", "net.ping", "quit"]);
    }
}
