//! Late-bound filter parameters.
//!
//! Every filter accepts values through a single string-keyed setter; the value itself is a
//! small tagged union so that declarative (JSON) and programmatic callers share one path.

use serde_json::Value;

use crate::pixels::PixelMap;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f32),
    Text(String),
    Array(Vec<f32>),
    /// Already-decoded image (programmatic callers only).
    Pixels(PixelMap),
    /// Raw RGBA8 bytes; dimensions come from `bufferWidth` / `bufferHeight` unless given here.
    Buffer {
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    },
}

impl ParamValue {
    /// Element count as seen by the setter: arrays report their length, everything else 1.
    pub fn count(&self) -> usize {
        match self {
            ParamValue::Array(v) => v.len(),
            _ => 1,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f32]> {
        match self {
            ParamValue::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "string",
            ParamValue::Array(_) => "array",
            ParamValue::Pixels(_) => "pixelMap",
            ParamValue::Buffer { .. } => "buffer",
        }
    }

    /// Converts a JSON parameter. Numbers, strings and arrays of numbers are accepted;
    /// anything else yields `None`.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_f64().map(|f| ParamValue::Number(f as f32)),
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_f64().map(|f| f as f32))
                .collect::<Option<Vec<f32>>>()
                .map(ParamValue::Array),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(v: Vec<f32>) -> Self {
        ParamValue::Array(v)
    }
}

impl From<PixelMap> for ParamValue {
    fn from(v: PixelMap) -> Self {
        ParamValue::Pixels(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_have_count_one() {
        let n = ParamValue::from_json(&json!(0.5)).unwrap();
        assert_eq!(n, ParamValue::Number(0.5));
        assert_eq!(n.count(), 1);

        let s = ParamValue::from_json(&json!("pixelMap")).unwrap();
        assert_eq!(s.as_str(), Some("pixelMap"));
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn json_arrays_report_their_length() {
        let a = ParamValue::from_json(&json!([0.1, 0.2, 0.3])).unwrap();
        assert_eq!(a.count(), 3);
        assert_eq!(a.as_array(), Some(&[0.1f32, 0.2, 0.3][..]));
    }

    #[test]
    fn unsupported_json_values_are_rejected() {
        assert!(ParamValue::from_json(&json!(true)).is_none());
        assert!(ParamValue::from_json(&json!({"a": 1})).is_none());
        assert!(ParamValue::from_json(&json!([1, "x"])).is_none());
    }
}
