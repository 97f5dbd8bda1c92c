use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two patient facts the pipeline works from. Anything else the caller
/// sends is dropped before this is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Age>,
    pub condition: String,
}

/// Age as the caller sent it.
///
/// HTTP callers may send a number, a numeric string, or something else
/// entirely. The raw value is kept so prompts echo it back unchanged, and
/// [`Age::years`] gives its loose numeric reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Age(Value);

impl Age {
    pub fn from_json(value: Value) -> Self {
        Self(value)
    }

    /// `false` for `0`, `""`, `null`, `false`, and `NaN`-like readings of those.
    pub fn is_truthy(&self) -> bool {
        is_truthy(&self.0)
    }

    /// Numeric reading of the age; `NaN` when it does not read as a number.
    pub fn years(&self) -> f64 {
        loose_number(&self.0)
    }
}

impl From<u32> for Age {
    fn from(years: u32) -> Self {
        Self(Value::from(years))
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&loose_string(&self.0))
    }
}

impl PatientInput {
    pub fn new(age: u32, condition: impl Into<String>) -> Self {
        Self::with_age(Age::from(age), condition)
    }

    pub fn with_age(age: Age, condition: impl Into<String>) -> Self {
        Self {
            age: Some(age),
            condition: condition.into(),
        }
    }

    /// Age when present and truthy.
    pub fn known_age(&self) -> Option<&Age> {
        self.age.as_ref().filter(|age| age.is_truthy())
    }
}

/// Loose JSON truthiness: `null`, `false`, `0`, and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a JSON value: strings verbatim, arrays comma-joined,
/// objects as `[object Object]`.
pub fn loose_string(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(v), _, _) => v.to_string(),
            (_, Some(v), _) => v.to_string(),
            (_, _, Some(v)) if v.fract() == 0.0 && v.abs() < 1e15 => (v as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => loose_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".into(),
    }
}

/// Numeric reading of a JSON value. Anything that is not a number and does
/// not read as one becomes `NaN`, which compares false against everything.
pub fn loose_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number_text(s),
        Value::Array(_) => parse_number_text(&loose_string(value)),
        Value::Object(_) => f64::NAN,
    }
}

fn parse_number_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    // Rust also accepts "inf" and "nan" spellings; plain decimal only here.
    if text
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}
