//! Model output normalization.
//!
//! The model is asked for JSON but may answer with a fenced code block, prose
//! or broken JSON. Valid JSON is passed through as-is, whatever its shape.
//! Anything else becomes one of two fixed fallback payloads that keep the
//! `{ "recommendations": [...] }` shape.

use serde_json::Value;
use tracing::warn;

use crate::error::AdvisoryError;
use crate::models::Recommendations;

/// Fallback entries when the model answered with something that is not JSON
pub const PARSE_FAILURE_CROPS: [&str; 4] = [
    "Error: Unable to parse AI response",
    "Please try again with different inputs",
    "AI model response was invalid",
    "Contact support if issue persists",
];

/// Fallback entries when the model could not be reached
pub const SERVICE_UNAVAILABLE_CROPS: [&str; 4] = [
    "Error: AI service unavailable",
    "Please try again later",
    "System is experiencing issues",
    "Try again in a few moments",
];

/// Remove one surrounding markdown code fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return raw;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return raw;
    };
    // Drop the info string ("json") on the opening fence line
    match body.find('\n') {
        Some(newline) if !body[..newline].contains('{') && !body[..newline].contains('[') => {
            body[newline + 1..].trim()
        }
        _ => body.trim(),
    }
}

/// Parse the model's text as JSON.
pub fn parse_model_output(raw: &str) -> Result<Value, AdvisoryError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        warn!(
            "Failed to parse model output as JSON: {}. Raw: {:?}",
            e,
            raw.chars().take(200).collect::<String>()
        );
        AdvisoryError::MalformedModelOutput(e)
    })
}

/// Fallback recommendations for a failed crop request.
///
/// Parse failures and everything else get textually different payloads so
/// the two can be told apart.
pub fn fallback_recommendations(error: &AdvisoryError) -> Recommendations {
    match error {
        AdvisoryError::MalformedModelOutput(_) => Recommendations::from_crops(&PARSE_FAILURE_CROPS),
        _ => Recommendations::from_crops(&SERVICE_UNAVAILABLE_CROPS),
    }
}
