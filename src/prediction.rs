use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

// -- structs

/// Pixel-space box attached by object-detection endpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// One labeled result returned by the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Detected class name, e.g. "bicycle"
    pub label: String,

    /// Confidence score, nominally in [0, 1] (not validated)
    pub score: f32,

    /// Only present for object-detection models
    #[serde(default, rename = "box", skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

// -- public API

/// Count predictions whose label equals `label` exactly (case-sensitive).
pub fn count_predictions(predictions: &[Prediction], label: &str) -> usize {
    predictions.iter().filter(|p| p.label == label).count()
}

/// Count matching records directly on the raw service response.
///
/// # Errors
///
/// Returns `AppError::Schema` if:
/// - `value` is not a JSON array
/// - any element is not an object with a `label` key
///
/// A `label` that is not a string never matches. No partial count is returned.
pub fn count_matching(value: &Value, label: &str) -> Result<usize> {
    let records = value.as_array().ok_or_else(|| {
        AppError::Schema(format!(
            "expected an array of predictions, got {}",
            kind_of(value)
        ))
    })?;

    let mut count = 0;
    for (idx, record) in records.iter().enumerate() {
        let record_label = record
            .get("label")
            .ok_or_else(|| AppError::Schema(format!("record {} has no `label`", idx)))?;
        if record_label.as_str() == Some(label) {
            count += 1;
        }
    }
    Ok(count)
}

/// Convert a raw response into typed predictions.
///
/// An object carrying an `error` key is what the service sends instead of predictions
/// (e.g. while the model is still loading), so it maps to `AppError::Service`.
pub fn parse_predictions(value: Value) -> Result<Vec<Prediction>> {
    if let Some(message) = value.get("error") {
        let message = message
            .as_str()
            .map(str::to_owned)
            .unwrap_or_else(|| message.to_string());
        return Err(AppError::Service {
            status: None,
            message,
        });
    }
    if !value.is_array() {
        return Err(AppError::Schema(format!(
            "expected an array of predictions, got {}",
            kind_of(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| AppError::Schema(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// -- tests
