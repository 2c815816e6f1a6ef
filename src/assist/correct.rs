use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::assist::reply::parse_reply;
use crate::assist::{AssistTask, Assistant};
use crate::core::model::OcrResponse;

/// Key prefixes of layout geometry that the assistant never needs to see.
const GEOMETRY_PREFIXES: [&str; 4] = [
    "bounding_box",
    "confidence",
    "normalized_vertices",
    "dimensions",
];

/// Outcome of correcting one OCR result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Correction {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Assistant reply as received.
    #[serde(default)]
    pub corrected_text: String,
    /// Payload that was sent for correction.
    #[serde(default)]
    pub original_text: String,
}

impl Correction {
    fn failed(error: impl Into<String>, corrected_text: String, original_text: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            corrected_text,
            original_text,
        }
    }
}

/// Drops coordinates and other layout data from an OCR payload.
pub fn text_only(data: &Value) -> Value {
    match data {
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                return json!({ "text": text });
            }
            if map.contains_key("pages") {
                return json!({ "text": "" });
            }
            let kept: Map<String, Value> = map
                .iter()
                .filter(|(key, value)| {
                    let textual = matches!(key.as_str(), "text" | "content")
                        || value.as_str().is_some_and(|s| !s.is_empty());
                    textual && !GEOMETRY_PREFIXES.iter().any(|p| key.starts_with(p))
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Value::Object(kept)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => {
                        let kept: Map<String, Value> = map
                            .iter()
                            .filter(|(_, value)| value.as_str().is_some_and(|s| !s.trim().is_empty()))
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect();
                        (!kept.is_empty()).then_some(Value::Object(kept))
                    }
                    Value::String(_) => Some(item.clone()),
                    _ => None,
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The part of an OCR response that carries recognized content.
fn ocr_data(ocr: &OcrResponse) -> Value {
    match ocr.payload.get("data") {
        Some(data) => data.clone(),
        None => Value::Object(ocr.payload.clone()),
    }
}

pub fn correct_one(
    assistant: &dyn Assistant,
    ocr: &OcrResponse,
    references: &[String],
) -> Correction {
    if !ocr.success {
        return Correction::failed(
            "OCR failed, nothing to correct",
            String::new(),
            String::new(),
        );
    }

    let input = text_only(&ocr_data(ocr));
    let original_text = serde_json::to_string_pretty(&input).unwrap_or_else(|_| input.to_string());
    let payload = json!({ "input": input, "references": references }).to_string();

    let reply = match assistant.complete(AssistTask::Correct, &payload) {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "correction call failed");
            return Correction::failed(format!("{err:#}"), String::new(), original_text);
        }
    };

    match parse_reply(&reply) {
        Ok(data) => Correction {
            success: true,
            data: Some(data),
            error: None,
            corrected_text: reply,
            original_text,
        },
        Err(err) => Correction::failed(err.to_string(), reply, original_text),
    }
}

/// Corrects every OCR result in order. Failed recognitions are not sent.
pub fn correct_all(
    assistant: &dyn Assistant,
    results: &[OcrResponse],
    references: &[String],
) -> Vec<Correction> {
    results
        .iter()
        .enumerate()
        .map(|(i, ocr)| {
            info!(current = i + 1, total = results.len(), "correcting OCR result");
            correct_one(assistant, ocr, references)
        })
        .collect()
}

/// Data of every successful correction; list replies are spliced in.
pub fn successful_records(corrections: &[Correction]) -> Vec<Value> {
    let mut records = Vec::new();
    for correction in corrections.iter().filter(|c| c.success) {
        match &correction.data {
            Some(Value::Array(items)) => records.extend(items.iter().cloned()),
            Some(other) => records.push(other.clone()),
            None => {}
        }
    }
    records
}
