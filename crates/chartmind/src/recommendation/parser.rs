//! Lenient extraction of the JSON object in a model reply
//!
//! Models wrap the requested object in prose or code fences, so the reply is
//! cut from the first `{` to the last `}` before parsing. A reply holding two
//! separate objects (`{..} and {..}`) therefore fails to parse; it is reported
//! like any other unusable reply.

use super::AnalysisResult;
use crate::prompts::{ACTION_KEY, JUSTIFICATION_KEY};
use serde_json::{Map, Value};
use thiserror::Error;

/// Action label of a reply that could not be parsed
pub const ERROR_ACTION: &str = "Error";

/// Action label when the object has no `action` key
pub const MISSING_ACTION: &str = "N/A";

/// Justification when the object has no `justification` key
pub const MISSING_JUSTIFICATION: &str = "No justification provided.";

/// Why a reply could not be turned into a recommendation
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Value Error: No valid JSON object found in the response")]
    NoJsonObject,

    #[error("JSON Parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a model reply for `ticker`
///
/// Never fails: an unusable reply becomes an [`ERROR_ACTION`] result whose
/// justification carries the diagnostic and the full raw text.
pub fn parse_response(ticker: &str, text: &str) -> AnalysisResult {
    match extract_object(text) {
        Ok(object) => AnalysisResult::new(
            ticker,
            field(&object, ACTION_KEY).unwrap_or_else(|| MISSING_ACTION.to_string()),
            field(&object, JUSTIFICATION_KEY).unwrap_or_else(|| MISSING_JUSTIFICATION.to_string()),
        ),
        Err(e) => AnalysisResult::error(ticker, format!("{e}. Raw response text: {text}")),
    }
}

fn extract_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(serde_json::from_str(&text[start..=end])?),
        _ => Err(ParseError::NoJsonObject),
    }
}

fn field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_inside_prose() {
        let text = r#"Here is the result: {"action": "Hold", "justification": "text"}. Thanks."#;
        let result = parse_response("AAPL", text);
        assert_eq!(result, AnalysisResult::new("AAPL", "Hold", "text"));
        assert!(!result.is_error());
    }

    #[test]
    fn test_object_inside_code_fence() {
        let text = "```json\n{\n  \"action\": \"Strong Buy\",\n  \"justification\": \"Para one.\\n\\nPara two.\"\n}\n```";
        let result = parse_response("MSFT", text);
        assert_eq!(result.action, "Strong Buy");
        assert_eq!(result.justification, "Para one.\n\nPara two.");
    }

    #[test]
    fn test_no_braces_keeps_raw_text() {
        let text = "I cannot analyze this chart.";
        let result = parse_response("GOOG", text);
        assert!(result.is_error());
        assert_eq!(
            result.justification,
            "Value Error: No valid JSON object found in the response. Raw response text: I cannot analyze this chart."
        );
    }

    #[test]
    fn test_reversed_braces_is_not_an_object() {
        let result = parse_response("GOOG", "} nothing here {");
        assert!(result.is_error());
        assert!(result.justification.contains("} nothing here {"));
    }

    #[test]
    fn test_invalid_json_keeps_raw_text() {
        let text = "{'action': 'Buy'}";
        let result = parse_response("TSLA", text);
        assert_eq!(result.action, ERROR_ACTION);
        assert!(result.justification.starts_with("JSON Parsing error: "));
        assert!(result.justification.ends_with("Raw response text: {'action': 'Buy'}"));
    }

    #[test]
    fn test_two_objects_fail_to_parse() {
        let text = r#"{"action": "Buy"} or maybe {"action": "Sell"}"#;
        assert!(parse_response("AMZN", text).is_error());
    }

    #[test]
    fn test_nested_object_parses() {
        let text = r#"{"action": "Buy", "justification": "ok", "levels": {"support": 180}}"#;
        assert_eq!(parse_response("AMZN", text).action, "Buy");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let result = parse_response("NVDA", r#"{"recommendation": "Buy"}"#);
        assert_eq!(result.action, MISSING_ACTION);
        assert_eq!(result.justification, MISSING_JUSTIFICATION);

        let result = parse_response("NVDA", r#"{"action": null, "justification": "x"}"#);
        assert_eq!(result.action, MISSING_ACTION);
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let result = parse_response("NVDA", r#"{"action": 3, "justification": ["a", "b"]}"#);
        assert_eq!(result.action, "3");
        assert_eq!(result.justification, r#"["a","b"]"#);
    }

    #[test]
    fn test_empty_reply() {
        let result = parse_response("META", "");
        assert!(result.is_error());
        assert!(result.justification.ends_with("Raw response text: "));
    }
}
