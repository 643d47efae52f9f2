use serde::Serialize;

/// Get the serde-serialized name of a unit enum variant.
/// Uses serde's own rules (rename_all, rename, etc.) as the single source of truth.
/// Returns `None` for non-string variants (data-carrying variants).
pub fn serde_variant_name<T: Serialize>(val: &T) -> Option<String> {
    match serde_json::to_value(val) {
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Get serde-serialized names for all variants of an enum.
/// Filters out any non-string variants (data-carrying variants).
pub fn serde_variant_names<T: Serialize>(variants: &[T]) -> Vec<String> {
    variants.iter().filter_map(serde_variant_name).collect()
}

/// Deserialize a string into an enum variant using serde's own rules.
/// Single source of truth: uses the same rename/rename_all config as normal deserialization.
pub fn from_serde_str<T: for<'de> serde::Deserialize<'de>>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

/// Case-insensitive `starts_with`, using Unicode lower-casing.
pub fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    let mut rest = s.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| rest.next() == Some(p))
}

/// Split console input on whitespace. No quoting: a token is whatever
/// whitespace-splitting produces.
pub fn tokenize(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Mode {
        Windowed,
        FullScreen,
    }

    #[test]
    fn variant_names_follow_serde() {
        assert_eq!(
            serde_variant_names(&[Mode::Windowed, Mode::FullScreen]),
            vec!["windowed", "full_screen"]
        );
        assert_eq!(from_serde_str::<Mode>("full_screen"), Some(Mode::FullScreen));
        assert_eq!(from_serde_str::<Mode>("FullScreen"), None);
    }

    #[test]
    fn prefix_match_ignores_case() {
        assert!(starts_with_ignore_case("Health", "he"));
        assert!(starts_with_ignore_case("heal", "HEAL"));
        assert!(starts_with_ignore_case("anything", ""));
        assert!(!starts_with_ignore_case("he", "heal"));
    }

    #[test]
    fn prefix_match_folds_non_ascii_case() {
        assert!(starts_with_ignore_case("Énergie", "én"));
        assert!(starts_with_ignore_case("über", "ÜB"));
        assert!(!starts_with_ignore_case("éclair", "ec"));
    }

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  heal   10\tfast "), vec!["heal", "10", "fast"]);
        assert!(tokenize("   ").is_empty());
    }
}
