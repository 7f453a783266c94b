// src/values.rs
use indexmap::IndexMap;
use std::fmt;

/// A field value available to templates
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Floats always show a fractional part, like Python's `str(float)`
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// Substitution context for templates. Updates merge into the existing
/// fields, so values from earlier lines stay visible until overwritten.
///
/// Each pump owns its own instance; nothing here is shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Values {
    store: IndexMap<String, Value>,
}

impl Values {
    pub fn new() -> Self {
        Values {
            store: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.store.insert(name.into(), value.into());
    }

    pub fn merge<I, K>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in fields {
            self.store.insert(name.into(), value);
        }
    }

    /// Field names in first-insertion order
    pub fn keys(&self) -> Vec<&str> {
        self.store.keys().map(String::as_str).collect()
    }
}
