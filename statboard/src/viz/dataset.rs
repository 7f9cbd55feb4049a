//! Tabular rows fed to a chart, taken straight from a JSON payload.

use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Rows from an array of objects, or from the `data` array of an API envelope
    /// (`{"source": .., "data": [..]}`). Anything that is not an object row is skipped.
    pub fn from_json(value: &Value) -> Self {
        let items: &[Value] = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(obj) => match obj.get("data") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
            _ => &[],
        };
        Self {
            rows: items
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Numeric cell; numeric strings (`"12.5"`) count too.
pub fn number(row: &Row, key: &str) -> Option<f64> {
    match row.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Category cell rendered as text; empty when missing.
pub fn label(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
