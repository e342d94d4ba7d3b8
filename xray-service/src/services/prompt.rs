use crate::models::Prediction;
use serde_json::Value;

pub const PROMPT_PREAMBLE: &str =
    "Generate a patient-friendly diagnostic report based on the dental X-ray predictions.\n\n";

pub const NO_FINDINGS_LINE: &str = "- No specific abnormalities detected or predictions missing.";

pub const PROMPT_CLOSING: &str = "\nProvide a brief, patient-friendly summary.";

/// Build the report prompt from the request's `predictions` field.
///
/// A missing, empty or non-array field yields the single no-findings line; the
/// prompt is still sent for generation in that case.
pub fn build_report_prompt(predictions: Option<&Value>) -> String {
    let mut prompt = String::from(PROMPT_PREAMBLE);

    match predictions.and_then(Value::as_array) {
        Some(items) if !items.is_empty() => {
            for item in items {
                prompt.push_str(&Prediction::from_value(item).prompt_line());
                prompt.push('\n');
            }
        }
        _ => {
            prompt.push_str(NO_FINDINGS_LINE);
            prompt.push('\n');
        }
    }

    prompt.push_str(PROMPT_CLOSING);
    prompt
}
