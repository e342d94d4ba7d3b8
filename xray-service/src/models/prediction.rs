use serde_json::Value;

/// Label used when a prediction carries no `class`.
pub const UNKNOWN_LABEL: &str = "unknown";

/// The two fields of an inference-service prediction the report prompt reads.
///
/// Everything else on the record (geometry, ids) is opaque and ignored here; the
/// `/predict` endpoint passes full records through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Fraction in `[0, 1]` as reported upstream; not clamped.
    pub confidence: f64,
}

impl Prediction {
    /// Lenient extraction from an arbitrary JSON value.
    ///
    /// `class`: strings as-is, absent/null as `unknown`, other values rendered as
    /// JSON. `confidence`: numbers as-is, numeric strings parsed, booleans as 1/0,
    /// anything else 0.
    pub fn from_value(value: &Value) -> Self {
        let label = match value.get("class") {
            None | Some(Value::Null) => UNKNOWN_LABEL.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let confidence = match value.get("confidence") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            _ => 0.0,
        };

        Self { label, confidence }
    }

    /// `- cavity detected with 92.00% confidence`
    pub fn prompt_line(&self) -> String {
        format!(
            "- {} detected with {:.2}% confidence",
            self.label,
            self.confidence * 100.0
        )
    }
}
