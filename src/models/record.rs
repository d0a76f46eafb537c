use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// A single field value inside a raw device record.
///
/// Terminals disagree on both field names and field types across firmware
/// revisions, so the fetcher hands records over as loose bags of typed
/// values and lets the normalizer sort them out.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Time(NaiveDateTime),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Coerce the value to a subject-identifier string.
    /// `Null` has no string form; everything else stringifies as-is.
    pub fn to_subject_string(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Int(i) => Some(i.to_string()),
            RawValue::Float(f) => Some(f.to_string()),
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Time(t) => Some(t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

/// One raw attendance record as read from the terminal: an ordered map of
/// field name → value, with no schema guarantees whatsoever.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: RawValue) {
        self.fields.insert(key.to_string(), value);
    }

    /// Builder-style variant of [`set`](Self::set), handy in tests.
    pub fn with(mut self, key: &str, value: RawValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
