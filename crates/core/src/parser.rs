use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::{Category, ClassificationResult};

#[derive(Debug, Error)]
#[error("malformed classification response: {reason}")]
pub struct ParseError {
    pub raw: String,
    pub reason: String,
}

impl ParseError {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConfidence {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    category: String,
    confidence: RawConfidence,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    keywords: Option<Value>,
}

/// Keywords are auxiliary, so any scalar the model emits is kept as text.
fn keywords_from(raw: &str, value: Option<Value>) -> Result<Vec<String>, ParseError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(Value::String(text)) => vec![Value::String(text)],
        Some(other) => {
            return Err(ParseError::new(
                raw,
                format!("keywords must be a list, got {other}"),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
        .collect())
}

/// Decodes the model's classification reply.
///
/// The text must be a bare JSON object; `category` and `confidence` are
/// required, `reasoning` and `keywords` default to empty. Confidence values
/// outside `[0, 1]` are passed through unchanged.
pub fn parse_classification(raw: &str) -> Result<ClassificationResult, ParseError> {
    let decoded: RawClassification = serde_json::from_str(raw.trim())
        .map_err(|error| ParseError::new(raw, error.to_string()))?;

    let category = Category::parse(&decoded.category).ok_or_else(|| {
        ParseError::new(raw, format!("unknown category {:?}", decoded.category))
    })?;

    let confidence = match decoded.confidence {
        RawConfidence::Number(value) => value,
        RawConfidence::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseError::new(raw, format!("confidence {text:?} is not a number")))?,
    };
    if !confidence.is_finite() {
        return Err(ParseError::new(raw, "confidence is not finite"));
    }
    if !(0.0..=1.0).contains(&confidence) {
        warn!(confidence, "model returned confidence outside [0, 1]");
    }
    let keywords = keywords_from(raw, decoded.keywords)?;

    Ok(ClassificationResult {
        category,
        confidence,
        reasoning: decoded.reasoning.unwrap_or_default(),
        keywords,
    })
}
