//! Shared validation helpers for discovery and the built-in converters.
//!
//! Centralizes the checks so every rejection reads the same way.

/// A command name or alias must be non-empty and typeable as one token.
pub fn validate_command_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Command name must not be empty".to_string());
    }
    if name.chars().any(char::is_whitespace) {
        return Err(format!("Command name '{name}' must not contain whitespace"));
    }
    Ok(())
}

/// Reject NaN and infinities.
pub fn validate_finite(value: f64, name: &str) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{name} must be finite"));
    }
    Ok(())
}

/// Prefix rule for namespaced commands: `prefix.name`, unless the prefix
/// already ends in a separator.
pub fn qualify(prefix: Option<&str>, name: &str) -> String {
    let name = name.to_lowercase();
    match prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.ends_with('.') || p.ends_with('_') => format!("{}{name}", p.to_lowercase()),
        Some(p) => format!("{}.{name}", p.to_lowercase()),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_with_spaces_are_rejected() {
        assert!(validate_command_name("heal").is_ok());
        assert!(validate_command_name("").is_err());
        assert!(validate_command_name("heal all").is_err());
    }

    #[test]
    fn non_finite_is_rejected() {
        assert!(validate_finite(1.5, "x").is_ok());
        assert_eq!(validate_finite(f64::NAN, "x").unwrap_err(), "x must be finite");
        assert!(validate_finite(f64::INFINITY, "x").is_err());
    }

    #[test]
    fn qualify_inserts_separator_once() {
        assert_eq!(qualify(None, "Heal"), "heal");
        assert_eq!(qualify(Some("Console"), "Clear"), "console.clear");
        assert_eq!(qualify(Some("dbg_"), "fly"), "dbg_fly");
        assert_eq!(qualify(Some("net."), "ping"), "net.ping");
        assert_eq!(qualify(Some("  "), "ping"), "ping");
    }
}
