use serde_json::Value;

/// Renders a scalar JSON member as text. Strings are returned as-is, numbers
/// in their JSON form; null, missing, and structured values are `None`.
pub(crate) fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Concatenates several optional text members, treating absent ones as empty.
pub(crate) fn joined(value: &Value, keys: &[&str]) -> String {
    keys.iter().filter_map(|key| text(value, key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_renders_numbers_and_strings() {
        let item = json!({"price": 1.29, "name": "Melk", "pages": 3, "image": null});
        assert_eq!(text(&item, "price").as_deref(), Some("1.29"));
        assert_eq!(text(&item, "name").as_deref(), Some("Melk"));
        assert_eq!(text(&item, "pages").as_deref(), Some("3"));
        assert!(text(&item, "image").is_none());
        assert!(text(&item, "missing").is_none());
    }

    #[test]
    fn joined_skips_null_members() {
        let offer = json!({"a": "2 voor ", "b": null, "c": "3.00"});
        assert_eq!(joined(&offer, &["a", "b", "c"]), "2 voor 3.00");
    }
}
