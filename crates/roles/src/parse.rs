//! Pulling structured answers out of free-form model output.
//!
//! Models wrap JSON in prose or code fences. We take the outermost
//! `[`..`]` (or `{`..`}`) span and parse that; anything else is a
//! [`RoleError::MalformedResponse`].

use ace_core::{ReflectionResult, RoleError};
use serde_json::Value;

/// The outermost span between `open` and the last `close`, if any.
fn outer_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn malformed(what: &str, text: &str) -> RoleError {
    let preview: String = text.chars().take(120).collect();
    RoleError::MalformedResponse(format!("expected {what}, got: {preview}"))
}

/// Render one JSON value as a line of text.
///
/// Objects with `name`/`description` become `"name: description"`; other
/// objects fall back to compact JSON.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(map) => {
            let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::trim);
            match (field("name"), field("description")) {
                (Some(name), Some(desc)) => Some(format!("{name}: {desc}")),
                (Some(text), None) | (None, Some(text)) => Some(text.to_string()),
                (None, None) => Some(value.to_string()),
            }
        }
        other => Some(other.to_string()),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Parse a strategy list from a response containing a JSON array.
pub fn parse_strategies(text: &str) -> Result<Vec<String>, RoleError> {
    let span = outer_span(text, '[', ']').ok_or_else(|| malformed("a JSON array", text))?;
    let value: Value = serde_json::from_str(span).map_err(|_| malformed("a JSON array", text))?;
    Ok(text_list(Some(&value)))
}

/// Parse a reflection from a response containing a JSON object with
/// `insights`, `patterns`, `failures`, `recommendations`, `context_gaps`.
pub fn parse_reflection(text: &str) -> Result<ReflectionResult, RoleError> {
    let span = outer_span(text, '{', '}').ok_or_else(|| malformed("a JSON object", text))?;
    let value: Value = serde_json::from_str(span).map_err(|_| malformed("a JSON object", text))?;
    let Value::Object(map) = value else {
        return Err(malformed("a JSON object", text));
    };

    Ok(ReflectionResult::new(
        text_list(map.get("insights")),
        text_list(map.get("patterns")),
        text_list(map.get("failures")),
        text_list(map.get("recommendations")),
        text_list(map.get("context_gaps")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_inside_prose() {
        let text = "Here you go:\n```json\n[\"weigh recent form\", \"check injuries\"]\n```\nGood luck.";
        assert_eq!(
            parse_strategies(text).unwrap(),
            vec!["weigh recent form", "check injuries"]
        );
    }

    #[test]
    fn strategy_objects_are_flattened() {
        let text = r#"[{"name": "Form", "description": "weight the last five results", "risk_level": "low"},
                      {"description": "only a description"}, 3]"#;
        assert_eq!(
            parse_strategies(text).unwrap(),
            vec!["Form: weight the last five results", "only a description", "3"]
        );
    }

    #[test]
    fn missing_array_is_malformed() {
        assert!(matches!(
            parse_strategies("no structure here"),
            Err(RoleError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_strategies("[not json"),
            Err(RoleError::MalformedResponse(_))
        ));
    }

    #[test]
    fn reflection_fields_and_defaults() {
        let text = r#"Analysis: {"insights": ["a", "b"], "patterns": [{"name": "p", "description": "d"}],
                      "recommendations": "single"}"#;
        let reflection = parse_reflection(text).unwrap();
        assert_eq!(reflection.insights(), ["a", "b"]);
        assert_eq!(reflection.patterns(), ["p: d"]);
        assert!(reflection.failures().is_empty());
        assert_eq!(reflection.recommendations(), ["single"]);
        assert!(reflection.context_gaps().is_empty());
    }

    #[test]
    fn reflection_requires_object() {
        assert!(matches!(
            parse_reflection("nothing"),
            Err(RoleError::MalformedResponse(_))
        ));
    }
}
