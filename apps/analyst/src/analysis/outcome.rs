//! Result Parser/Validator — turns a raw model response (or the absence of
//! one) into a usable [`PromptOutcome`] without ever failing.
//!
//! The repeated "catch the failure, substitute synthetic data" pattern is a
//! fault-isolation strategy: `resolve_outcome` has no error path. Schema
//! validation is an observability signal, not a gate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Rationale text attached to every stub outcome.
pub const STUB_RATIONALE: &str =
    "This is a placeholder response generated without a model backend.";

/// The structured verdict produced for one prompt within one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutcome {
    pub score: i64,
    /// Uppercased free text; conventionally BUY, HOLD or SELL but not
    /// validated against that set.
    pub rating: String,
    pub target_buy_price: f64,
    pub rationale: String,
    /// Verbatim model response (or serialized stub) kept for audit.
    pub raw_text: String,
}

/// Resolves raw backend text into an outcome.
///
/// If the text is absent or does not parse to a non-empty JSON object, a
/// randomized stub takes its place. Coercions apply to both paths. A declared
/// schema is validated warn-only and never alters the result.
pub fn resolve_outcome(
    raw_text: Option<String>,
    schema: Option<&Value>,
    prompt_id: &str,
) -> PromptOutcome {
    let (object, raw) = match raw_text {
        Some(text) => match parse_object(&text) {
            Some(object) => (object, text),
            None => stub(),
        },
        None => stub(),
    };

    let outcome = coerce(&object, raw);
    if let Some(schema) = schema {
        validate_against_schema(&outcome, schema, prompt_id);
    }
    outcome
}

/// Parses raw model text into a JSON object, stripping markdown fences first.
/// Anything that is not a non-empty JSON object counts as a parse failure.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let stripped = strip_json_fences(text);
    match serde_json::from_str::<Value>(stripped) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Generates the synthetic fallback: score uniform in [1,100], rating from
/// score thresholds, target price uniform in [10.0,200.0] at 2 decimal
/// places. The serialized stub doubles as the recorded raw text.
fn stub() -> (Map<String, Value>, String) {
    let mut rng = rand::thread_rng();
    let score: i64 = rng.gen_range(1..=100);
    let rating = if score >= 70 {
        "BUY"
    } else if score >= 40 {
        "HOLD"
    } else {
        "SELL"
    };
    let target = (rng.gen_range(10.0_f64..=200.0) * 100.0).round() / 100.0;

    let mut map = Map::new();
    map.insert("score".to_string(), json!(score));
    map.insert("rating".to_string(), json!(rating));
    map.insert("target_buy_price".to_string(), json!(target));
    map.insert("rationale".to_string(), json!(STUB_RATIONALE));

    let raw = Value::Object(map.clone()).to_string();
    (map, raw)
}

fn coerce(object: &Map<String, Value>, raw_text: String) -> PromptOutcome {
    PromptOutcome {
        score: object.get("score").map(coerce_i64).unwrap_or(0),
        rating: object
            .get("rating")
            .map(coerce_string)
            .unwrap_or_default()
            .to_uppercase(),
        target_buy_price: object.get("target_buy_price").map(coerce_f64).unwrap_or(0.0),
        rationale: object.get("rationale").map(coerce_string).unwrap_or_default(),
        raw_text,
    }
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Validates the coerced outcome against the prompt's declared schema.
/// Every violation is logged with the prompt id; the outcome is used
/// regardless.
fn validate_against_schema(outcome: &PromptOutcome, schema: &Value, prompt_id: &str) {
    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => {
            warn!("Prompt {prompt_id}: declared schema does not compile: {e}");
            return;
        }
    };

    let instance = json!({
        "score": outcome.score,
        "rating": outcome.rating,
        "target_buy_price": outcome.target_buy_price,
        "rationale": outcome.rationale,
    });
    for error in validator.iter_errors(&instance) {
        warn!("Prompt {prompt_id}: output failed schema validation: {error}");
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_stub(outcome: &PromptOutcome) {
        assert!((1..=100).contains(&outcome.score));
        let expected = if outcome.score >= 70 {
            "BUY"
        } else if outcome.score >= 40 {
            "HOLD"
        } else {
            "SELL"
        };
        assert_eq!(outcome.rating, expected);
        assert!((10.0..=200.0).contains(&outcome.target_buy_price));
        assert_eq!(outcome.rationale, STUB_RATIONALE);
        // Recorded raw text is the serialized stub itself.
        let raw: Value = serde_json::from_str(&outcome.raw_text).unwrap();
        assert_eq!(raw["score"].as_i64().unwrap(), outcome.score);
    }

    #[test]
    fn test_parse_path_normalizes_rating_case() {
        let raw = r#"{"score": 85, "rating": "buy", "target_buy_price": 42.5, "rationale": "x"}"#;
        let outcome = resolve_outcome(Some(raw.to_string()), None, "p1");
        assert_eq!(outcome.score, 85);
        assert_eq!(outcome.rating, "BUY");
        assert!((outcome.target_buy_price - 42.5).abs() < f64::EPSILON);
        assert_eq!(outcome.rationale, "x");
        assert_eq!(outcome.raw_text, raw);
    }

    #[test]
    fn test_missing_keys_default_without_stubbing() {
        // A non-empty object is a successful parse even when keys are absent.
        let raw = r#"{"score": "91"}"#;
        let outcome = resolve_outcome(Some(raw.to_string()), None, "p1");
        assert_eq!(outcome.score, 91);
        assert_eq!(outcome.rating, "");
        assert_eq!(outcome.target_buy_price, 0.0);
        assert_eq!(outcome.rationale, "");
    }

    #[test]
    fn test_numeric_string_coercions() {
        let raw = r#"{"score": "72", "rating": "hold", "target_buy_price": "19.99", "rationale": "r"}"#;
        let outcome = resolve_outcome(Some(raw.to_string()), None, "p1");
        assert_eq!(outcome.score, 72);
        assert!((outcome.target_buy_price - 19.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_float_score_truncates() {
        let raw = r#"{"score": 85.9, "rating": "buy", "target_buy_price": 1, "rationale": "r"}"#;
        let outcome = resolve_outcome(Some(raw.to_string()), None, "p1");
        assert_eq!(outcome.score, 85);
    }

    #[test]
    fn test_no_raw_text_yields_stub() {
        let outcome = resolve_outcome(None, None, "p1");
        assert_is_stub(&outcome);
    }

    #[test]
    fn test_malformed_text_yields_stub_not_error() {
        let outcome = resolve_outcome(Some("the model rambled instead".to_string()), None, "p1");
        assert_is_stub(&outcome);
    }

    #[test]
    fn test_empty_object_yields_stub() {
        let outcome = resolve_outcome(Some("{}".to_string()), None, "p1");
        assert_is_stub(&outcome);
    }

    #[test]
    fn test_non_object_json_yields_stub() {
        let outcome = resolve_outcome(Some("[1, 2, 3]".to_string()), None, "p1");
        assert_is_stub(&outcome);
    }

    #[test]
    fn test_stub_properties_hold_over_many_draws() {
        for _ in 0..100 {
            assert_is_stub(&resolve_outcome(None, None, "p1"));
        }
    }

    #[test]
    fn test_fenced_json_is_parsed() {
        let raw = "```json\n{\"score\": 60, \"rating\": \"hold\", \"target_buy_price\": 12.0, \"rationale\": \"ok\"}\n```";
        let outcome = resolve_outcome(Some(raw.to_string()), None, "p1");
        assert_eq!(outcome.score, 60);
        assert_eq!(outcome.rating, "HOLD");
    }

    #[test]
    fn test_schema_violation_does_not_alter_outcome() {
        let schema = json!({
            "type": "object",
            "properties": { "score": { "type": "integer", "minimum": 200 } }
        });
        let raw = r#"{"score": 10, "rating": "sell", "target_buy_price": 5.0, "rationale": "r"}"#;
        let outcome = resolve_outcome(Some(raw.to_string()), Some(&schema), "p1");
        // Validation fails (score < 200) but the parsed data is kept as-is.
        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.rating, "SELL");
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
