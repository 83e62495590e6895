//! File name sanitizing
//!
//! Display names become file stems. Characters that are invalid in a file name
//! on any supported platform (control characters plus `:\/<>|"?*`) become `_`.
//! Distinct names may sanitize to the same stem; the later write wins.

use serde_json::Value;

/// Characters replaced in addition to control characters
const RESERVED: &[char] = &[':', '\\', '/', '<', '>', '|', '"', '?', '*'];

/// Map a display name to a file-system-safe file stem
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_invalid(c) { '_' } else { c })
        .collect()
}

fn is_invalid(c: char) -> bool {
    (c as u32) < 0x20 || RESERVED.contains(&c)
}

/// The name an object is filed under
///
/// Most objects carry `displayName`; settings catalog policies use `name`.
/// Objects with neither fall back to their `id`.
pub fn display_name(object: &Value) -> String {
    ["displayName", "name", "id"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_characters_replaced() {
        assert_eq!(
            sanitize_file_name(r#"Win10: Baseline <v2> | "prod"?*"#),
            "Win10_ Baseline _v2_ _ _prod___"
        );
        assert_eq!(sanitize_file_name(r"a/b\c"), "a_b_c");
    }

    #[test]
    fn test_control_characters_replaced() {
        assert_eq!(sanitize_file_name("tab\there\nnull\0"), "tab_here_null_");
    }

    #[test]
    fn test_output_never_contains_invalid_characters() {
        let inputs = [
            "plain",
            ":::",
            "\u{1}\u{1f}",
            "Ünïcødé / ok",
            "<>|\"?*\\/:",
            " ",
        ];

        for input in inputs {
            let out = sanitize_file_name(input);
            assert!(!out.chars().any(is_invalid), "{:?} -> {:?}", input, out);
            assert!(!out.is_empty());
            assert_eq!(out.chars().count(), input.chars().count());
        }
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(sanitize_file_name(""), "");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(&json!({"displayName": "A", "name": "B"})), "A");
        assert_eq!(display_name(&json!({"name": "Catalog", "id": "1"})), "Catalog");
        assert_eq!(display_name(&json!({"displayName": "", "id": "42"})), "42");
        assert_eq!(display_name(&json!({})), "");
    }
}
