//! Validation of raw AI responses
//!
//! Models wrap JSON in prose or code fences now and then, so the object is
//! located between the first `{` and the last `}` before parsing. Nothing
//! unvalidated gets past this module.

use serde_json::Value;

use crate::error::{Error, Result};

use super::types::RemoteClassification;

/// Confidence assumed when the service omits it or sends garbage
pub const DEFAULT_REMOTE_CONFIDENCE: f64 = 0.5;

const RAW_PREVIEW_LEN: usize = 200;

/// Parse and validate a classification answer
pub fn parse_remote_classification(response: &str) -> Result<RemoteClassification> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            preview(json_str)
        ))
    })?;

    let obj = value
        .as_object()
        .ok_or_else(|| Error::InvalidData("AI response is not a JSON object".into()))?;

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "AI response has no category | Raw: {}",
                preview(json_str)
            ))
        })?
        .to_string();

    let sub_category = obj
        .get("subCategory")
        .or_else(|| obj.get("sub_category"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(RemoteClassification {
        category,
        sub_category,
        confidence: parse_confidence(obj.get("confidence")),
    })
}

/// Validate a free-text advice answer
pub fn parse_advice(response: &str) -> Result<String> {
    let text = response.trim();
    if text.is_empty() {
        return Err(Error::InvalidData("AI returned empty advice".into()));
    }
    Ok(text.to_string())
}

fn parse_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => DEFAULT_REMOTE_CONFIDENCE,
    }
}

/// Slice out the outermost JSON object of a response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    if response.is_empty() {
        return Err(Error::InvalidData("Empty AI response".into()));
    }

    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            preview(response)
        ))),
    }
}

fn preview(s: &str) -> String {
    if s.len() > RAW_PREVIEW_LEN {
        let cut = (0..=RAW_PREVIEW_LEN)
            .rev()
            .find(|i| s.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &s[..cut])
    } else {
        s.to_string()
    }
}
