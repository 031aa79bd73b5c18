//! Dotted-path access and `{{ path }}` rendering over JSON payloads.

use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Look up a dotted path (`user.profile.name`, `items.0.id`) in a value.
pub fn get_path_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        match current {
            Value::Object(map) => current = map.get(segment)?,
            Value::Array(items) => {
                let index = segment.parse::<usize>().ok()?;
                current = items.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Mutable variant of [`get_path_value`].
pub fn get_path_mut<'a>(root: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let mut current = root.get_mut(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set a dotted path, creating intermediate objects as needed.
///
/// Numeric segments index into existing arrays; an index equal to the length
/// appends. Any other segment against an array is an error, so siblings are
/// never discarded.
pub fn set_path_value(root: &mut Map<String, Value>, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((first, rest)) = segments.split_first() else {
        return Ok(());
    };
    let child = root.entry((*first).to_string()).or_insert(Value::Null);
    set_in(child, rest, value, path)
}

fn set_in(target: &mut Value, segments: &[&str], value: Value, path: &str) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };

    match target {
        Value::Array(items) => {
            let len = items.len();
            let index = first
                .parse::<usize>()
                .ok()
                .filter(|i| *i <= len)
                .ok_or_else(|| {
                    Error::Executor(format!(
                        "Cannot set '{}': '{}' is not a valid index into an array of length {}",
                        path, first, len
                    ))
                })?;
            if index == len {
                items.push(Value::Null);
            }
            set_in(&mut items[index], rest, value, path)
        }
        Value::Object(map) => {
            let child = map.entry((*first).to_string()).or_insert(Value::Null);
            set_in(child, rest, value, path)
        }
        other => {
            *other = Value::Object(Map::new());
            set_in(other, segments, value, path)
        }
    }
}

/// Payload as an owned object; non-object payloads start from empty.
pub fn object_or_empty(payload: &Value) -> Map<String, Value> {
    match payload {
        Value::Object(obj) => obj.clone(),
        _ => Map::new(),
    }
}

/// Append `item` to the array stored under `key`, creating it when absent.
pub fn push_to_array(root: &mut Map<String, Value>, key: &str, item: Value) {
    match root.get_mut(key) {
        Some(Value::Array(items)) => items.push(item),
        _ => {
            root.insert(key.to_string(), Value::Array(vec![item]));
        }
    }
}

/// String form of a value: strings unquoted, everything else as JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

/// Numeric coercion: numbers, numeric strings and booleans.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn template_regex() -> &'static regex_lite::Regex {
    static TEMPLATE_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();
    TEMPLATE_REGEX.get_or_init(|| {
        regex_lite::Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid regex")
    })
}

/// Replace `{{ path }}` placeholders with values from the payload.
///
/// Missing paths render as an empty string.
pub fn render_template(template: &str, payload: &Value) -> String {
    template_regex()
        .replace_all(template, |caps: &regex_lite::Captures| {
            let path = &caps[1];
            let path = path.strip_prefix("payload.").unwrap_or(path);
            get_path_value(payload, path)
                .map(stringify_value)
                .unwrap_or_default()
        })
        .to_string()
}

/// Render placeholders in every string leaf of a value.
pub fn render_value(value: &Value, payload: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, payload)),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, payload)).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), render_value(v, payload)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path_nested_and_index() {
        let value = json!({"user": {"tags": ["a", "b"]}});
        assert_eq!(get_path_value(&value, "user.tags.1"), Some(&json!("b")));
        assert_eq!(get_path_value(&value, "user.missing"), None);
        assert_eq!(get_path_value(&value, "user.tags.9"), None);
    }

    #[test]
    fn test_set_path_creates_objects() {
        let mut map = Map::new();
        map.insert("meta".into(), json!("scalar"));
        set_path_value(&mut map, "meta.source", json!("bio")).unwrap();
        assert_eq!(Value::Object(map), json!({"meta": {"source": "bio"}}));
    }

    #[test]
    fn test_set_path_indexes_into_arrays() {
        let mut map = Map::new();
        map.insert("tags".into(), json!(["a", "b"]));
        map.insert("items".into(), json!([{"id": 1}, {"id": 2}]));

        set_path_value(&mut map, "tags.0", json!("z")).unwrap();
        set_path_value(&mut map, "tags.2", json!("c")).unwrap();
        set_path_value(&mut map, "items.1.id", json!(20)).unwrap();

        assert_eq!(map["tags"], json!(["z", "b", "c"]));
        assert_eq!(map["items"], json!([{"id": 1}, {"id": 20}]));
    }

    #[test]
    fn test_set_path_rejects_bad_array_segment() {
        let mut map = Map::new();
        map.insert("tags".into(), json!(["a", "b"]));

        assert!(set_path_value(&mut map, "tags.name", json!("x")).is_err());
        assert!(set_path_value(&mut map, "tags.7", json!("x")).is_err());
        assert_eq!(map["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_get_path_mut_through_arrays() {
        let mut map = Map::new();
        map.insert("items".into(), json!([{"name": "ana"}]));
        if let Some(Value::String(s)) = get_path_mut(&mut map, "items.0.name") {
            s.push('!');
        }
        assert_eq!(map["items"][0]["name"], "ana!");
        assert!(get_path_mut(&mut map, "items.3.name").is_none());
    }

    #[test]
    fn test_render_template() {
        let payload = json!({"user": {"name": "Ana"}, "count": 3});
        assert_eq!(
            render_template("https://api.example.com/{{ user.name }}/{{count}}", &payload),
            "https://api.example.com/Ana/3"
        );
        assert_eq!(render_template("x={{ payload.count }}", &payload), "x=3");
        assert_eq!(render_template("{{ nope }}!", &payload), "!");
    }

    #[test]
    fn test_as_f64_coercion() {
        assert_eq!(as_f64(&json!("42.5")), Some(42.5));
        assert_eq!(as_f64(&json!(true)), Some(1.0));
        assert_eq!(as_f64(&json!("abc")), None);
        assert_eq!(as_f64(&Value::Null), None);
    }

    #[test]
    fn test_push_to_array() {
        let mut map = Map::new();
        push_to_array(&mut map, "posts", json!(1));
        push_to_array(&mut map, "posts", json!(2));
        assert_eq!(map["posts"], json!([1, 2]));
    }
}
