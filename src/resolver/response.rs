//! Decoding of LLM name responses.

use serde_json::Value;

/// Names as returned by a model, before display cleaning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Tokens billed for the call, when the API reports it
    pub tokens_used: Option<u64>,
}

fn string_field(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn from_value(value: Value) -> Result<ParsedName, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;
    Ok(ParsedName {
        first_name: string_field(object, &["first_name", "first", "firstName"]),
        last_name: string_field(object, &["last_name", "last", "lastName"]),
        tokens_used: None,
    })
}

/// Strict contract: the whole content must be one JSON object.
pub fn parse_strict(content: &str) -> Result<ParsedName, String> {
    let value: Value = serde_json::from_str(content.trim()).map_err(|e| format!("malformed JSON: {}", e))?;
    from_value(value)
}

/// Drop `// ...` trailing comments some local models append to JSON lines.
fn strip_line_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| match line.find("//") {
            // keep URLs such as "http://" intact
            Some(idx) if !line[..idx].ends_with(':') => line[..idx].trim_end(),
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lenient contract for local models: the JSON object may be wrapped in prose,
/// code fences or trailing comments. The outermost `{...}` is extracted first.
pub fn parse_embedded(content: &str) -> Result<ParsedName, String> {
    let cleaned = strip_line_comments(content);
    let start = cleaned.find('{').ok_or_else(|| "no JSON object in response".to_string())?;
    let end = cleaned.rfind('}').filter(|end| *end > start);

    let candidate = match end {
        Some(end) => cleaned[start..=end].to_string(),
        // A comment cut the closing brace off: close it ourselves
        None => format!("{}}}", cleaned[start..].trim_end().trim_end_matches(',')),
    };
    // Trailing commas left behind by removed comments
    let candidate = candidate.replace(",\n}", "\n}").replace(", }", " }").replace(",}", "}");

    match serde_json::from_str::<Value>(&candidate) {
        Ok(value) => from_value(value),
        Err(e) => Err(format!("malformed JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strict() {
        let parsed = parse_strict(r#"{"first_name": "Stacy", "last_name": "Rock"}"#).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Stacy"));
        assert_eq!(parsed.last_name.as_deref(), Some("Rock"));

        let parsed = parse_strict(r#"{"first_name": null, "last_name": null}"#).unwrap();
        assert_eq!(parsed, ParsedName::default());

        assert!(parse_strict("Sure! Here is the JSON: {}").is_err());
        assert!(parse_strict("[1, 2]").is_err());
    }

    #[test]
    fn test_parse_embedded_in_prose() {
        let content = "Here you go:\n```json\n{\"first_name\": \"Miriam\", \"last_name\": \"Holland\"}\n```\nHope that helps.";
        let parsed = parse_embedded(content).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Miriam"));
        assert_eq!(parsed.last_name.as_deref(), Some("Holland"));
    }

    #[test]
    fn test_parse_embedded_with_trailing_comment() {
        let content = "{\"first_name\": \"Tamera\", // matched from email\n\"last_name\": \"Garlock\" // initial t\n}";
        let parsed = parse_embedded(content).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Tamera"));
        assert_eq!(parsed.last_name.as_deref(), Some("Garlock"));
    }

    #[test]
    fn test_parse_embedded_comment_swallowed_closing_brace() {
        let content = "{\"first_name\": \"Sandy\", \"last_name\": null, // no last name }";
        let parsed = parse_embedded(content).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Sandy"));
        assert_eq!(parsed.last_name, None);
    }

    #[test]
    fn test_parse_embedded_alternate_keys() {
        let parsed = parse_embedded(r#"{"firstName": "Victor", "lastName": "Han"}"#).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Victor"));
        assert_eq!(parsed.last_name.as_deref(), Some("Han"));

        let parsed = parse_embedded(r#"{"first": "Naha", "last": "Saw"}"#).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Naha"));
    }

    #[test]
    fn test_parse_embedded_rejects_garbage() {
        assert!(parse_embedded("I could not find a name.").is_err());
        assert!(parse_embedded("{not json at all}").is_err());
    }
}
