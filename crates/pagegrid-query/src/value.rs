use serde_json::Value;

/// Render a filter value the way the query protocol expects it.
///
/// The value is stringified as JSON, the surrounding double quotes of string
/// values are dropped, and the result is wrapped in single quotes. `null` is
/// the one exception and is written bare so the server reads it as a null
/// literal rather than the text "null". No further escaping is applied.
///
/// Clients that quote every value uniformly send a null as `'null'`, which
/// a server compares against the four-character string. Only the string
/// value `"null"` renders that way here.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(_) => {
            let json = value.to_string();
            let inner = json
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&json);
            format!("'{inner}'")
        }
        other => format!("'{other}'"),
    }
}
