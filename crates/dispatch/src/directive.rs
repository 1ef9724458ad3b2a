//! Directive wire format and extraction.
//!
//! The model is instructed to reply with a single JSON object:
//! `{"action": "<tool>", "args": {...}}` to request a tool, or
//! `{"action": "done", "result": "<final text>"}` to finish. Models wrap
//! the object in explanatory prose or use Python-style quoting often enough
//! that extraction is two-stage: locate the brace-delimited span, parse it
//! strictly, and on failure retry once after a quote-repair pass.

use serde_json::{Map, Value};
use thiserror::Error;

/// The sentinel action that terminates a dispatch run.
pub const DONE_ACTION: &str = "done";

/// A single directive recovered from a model reply.
///
/// Wraps the parsed JSON object whole, so diagnostics can surface exactly
/// what the model said. Unrecognized fields are retained and ignored, never
/// rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive(Value);

/// What a directive asks the loop to do: the tagged union over `done` and
/// tool invocations.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Terminate the run with the given result text.
    Done { result: String },
    /// Invoke the named tool with the given argument object.
    Invoke {
        name: String,
        args: Map<String, Value>,
    },
}

impl Directive {
    /// The `action` field, when present and a string.
    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    /// Classify the directive. `None` when the `action` field is absent or
    /// not a string; the loop treats that the same as an unknown action.
    pub fn step(&self) -> Option<Step> {
        let action = self.action()?;
        if action == DONE_ACTION {
            let result = self
                .0
                .get("result")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(Step::Done { result })
        } else {
            let args = match self.0.get("args") {
                Some(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            };
            Some(Step::Invoke {
                name: action.to_string(),
                args,
            })
        }
    }

    /// Borrow the underlying JSON object.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the directive, yielding the underlying JSON object.
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Failure to recover a directive from reply text.
#[derive(Debug, Error)]
pub enum MalformedResponse {
    /// No brace-delimited span exists in the reply.
    #[error("no JSON object found in model reply")]
    MissingObject,

    /// The span did not parse, even after the quote-repair pass.
    #[error("directive is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Locate and parse the JSON directive embedded in reply text.
///
/// Takes the span from the first `{` to the last `}` inclusive: the
/// model's single directive is assumed to be the only JSON-shaped content,
/// so anything between the outer braces belongs to it. Parses strictly
/// first; on failure, makes one repair attempt with every single quote
/// replaced by a double quote (recovers Python-style quoting). The repair
/// is purely textual and corrupts legitimate apostrophes inside string
/// values; that is an accepted limitation.
pub fn extract_directive(text: &str) -> Result<Directive, MalformedResponse> {
    let start = text.find('{').ok_or(MalformedResponse::MissingObject)?;
    let end = text.rfind('}').ok_or(MalformedResponse::MissingObject)?;
    if end < start {
        return Err(MalformedResponse::MissingObject);
    }

    let span = &text[start..=end];
    match serde_json::from_str(span) {
        Ok(value) => Ok(Directive(value)),
        Err(_) => {
            let repaired = span.replace('\'', "\"");
            Ok(Directive(serde_json::from_str(&repaired)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = "Sure! Here is my plan:\n{\"action\": \"get_weather\", \"args\": {\"lat\": 41.9, \"lon\": 12.5}}\nLet me know.";
        let directive = extract_directive(text).unwrap();
        assert_eq!(
            *directive.as_value(),
            json!({"action": "get_weather", "args": {"lat": 41.9, "lon": 12.5}})
        );
    }

    #[test]
    fn repairs_single_quoted_json() {
        let text = "{'action': 'done', 'result': 'all set'}";
        let directive = extract_directive(text).unwrap();
        assert_eq!(
            directive.step(),
            Some(Step::Done {
                result: "all set".into()
            })
        );
    }

    #[test]
    fn no_braces_fails_without_repair() {
        let err = extract_directive("no directive here").unwrap_err();
        assert!(matches!(err, MalformedResponse::MissingObject));

        let err = extract_directive("only an opening { brace").unwrap_err();
        assert!(matches!(err, MalformedResponse::MissingObject));

        let err = extract_directive("only a closing } brace").unwrap_err();
        assert!(matches!(err, MalformedResponse::MissingObject));
    }

    #[test]
    fn close_before_open_fails() {
        let err = extract_directive("} reversed {").unwrap_err();
        assert!(matches!(err, MalformedResponse::MissingObject));
    }

    #[test]
    fn unparseable_span_fails_after_repair() {
        let err = extract_directive("{action: done}").unwrap_err();
        assert!(matches!(err, MalformedResponse::InvalidJson(_)));
    }

    #[test]
    fn repair_corrupts_interior_apostrophes() {
        // Known limitation: the quote repair is textual, so an apostrophe
        // inside a single-quoted string value breaks the parse.
        let text = "{'action': 'done', 'result': 'Rome's Colosseum'}";
        assert!(extract_directive(text).is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let text = r#"{"action": "done", "result": "ok", "confidence": 0.9}"#;
        let directive = extract_directive(text).unwrap();
        assert_eq!(
            directive.step(),
            Some(Step::Done {
                result: "ok".into()
            })
        );
    }

    #[test]
    fn done_result_defaults_to_empty() {
        let directive = extract_directive(r#"{"action": "done"}"#).unwrap();
        assert_eq!(
            directive.step(),
            Some(Step::Done {
                result: String::new()
            })
        );
    }

    #[test]
    fn missing_action_yields_no_step() {
        let directive = extract_directive(r#"{"args": {"a": 1}}"#).unwrap();
        assert_eq!(directive.step(), None);

        let directive = extract_directive(r#"{"action": 7}"#).unwrap();
        assert_eq!(directive.step(), None);
    }

    #[test]
    fn invoke_without_args_gets_empty_map() {
        let directive = extract_directive(r#"{"action": "search_hotels"}"#).unwrap();
        match directive.step() {
            Some(Step::Invoke { name, args }) => {
                assert_eq!(name, "search_hotels");
                assert!(args.is_empty());
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }
}
