//! Metric - the record flowing from collectors to outputs
//!
//! A `Metric` is immutable once built. Transformations such as tag
//! stripping produce a new value instead of mutating in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ContractError;

/// Tag set (key -> value), keys are unique and kept sorted
pub type Tags = BTreeMap<String, String>;

/// Field set (key -> value), keys are unique and kept sorted
pub type Fields = BTreeMap<String, FieldValue>;

/// Value of a single metric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Immutable measurement record
///
/// Deserialization goes through the same validation as [`Metric::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetric")]
pub struct Metric {
    name: String,
    tags: Tags,
    fields: Fields,
    timestamp: DateTime<Utc>,
}

impl Metric {
    /// Build a metric from its four parts
    ///
    /// # Errors
    /// - empty name
    /// - no fields
    /// - empty tag or field key
    pub fn new(
        name: impl Into<String>,
        tags: Tags,
        fields: Fields,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ContractError::invalid_metric(name, "name cannot be empty"));
        }
        if fields.is_empty() {
            return Err(ContractError::invalid_metric(
                name,
                "metric cannot be made without any fields",
            ));
        }
        if tags.keys().any(String::is_empty) {
            return Err(ContractError::invalid_metric(name, "empty tag key"));
        }
        if fields.keys().any(String::is_empty) {
            return Err(ContractError::invalid_metric(name, "empty field key"));
        }

        Ok(Self {
            name,
            tags,
            fields,
            timestamp,
        })
    }

    /// Copy this metric with a replacement tag set
    ///
    /// Name, fields and timestamp come from an already valid metric, so the
    /// result is valid as long as no tag key is empty. Empty keys are
    /// discarded.
    pub fn with_tags(&self, mut tags: Tags) -> Self {
        tags.retain(|k, _| !k.is_empty());
        Self {
            name: self.name.clone(),
            tags,
            fields: self.fields.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag set
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Field set
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Unvalidated wire form of a metric
#[derive(Deserialize)]
struct RawMetric {
    name: String,
    #[serde(default)]
    tags: Tags,
    fields: Fields,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawMetric> for Metric {
    type Error = ContractError;

    fn try_from(raw: RawMetric) -> Result<Self, Self::Error> {
        Metric::new(raw.name, raw.tags, raw.fields, raw.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Fields {
        Fields::from([("value".to_string(), FieldValue::Float(1.5))])
    }

    #[test]
    fn test_new_rejects_empty_name() {
        let err = Metric::new("", Tags::new(), fields(), Utc::now()).unwrap_err();
        assert!(matches!(err, ContractError::InvalidMetric { .. }));
    }

    #[test]
    fn test_new_rejects_missing_fields() {
        let result = Metric::new("cpu", Tags::new(), Fields::new(), Utc::now());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("without any fields"));
    }

    #[test]
    fn test_with_tags_keeps_everything_else() {
        let ts = Utc::now();
        let tags = Tags::from([
            ("host".to_string(), "a".to_string()),
            ("region".to_string(), "b".to_string()),
        ]);
        let m = Metric::new("cpu", tags, fields(), ts).unwrap();

        let rewritten = m.with_tags(Tags::from([("region".to_string(), "b".to_string())]));

        assert_eq!(rewritten.name(), "cpu");
        assert_eq!(rewritten.fields(), m.fields());
        assert_eq!(rewritten.timestamp(), ts);
        assert_eq!(rewritten.tags().len(), 1);
        // The source is untouched
        assert_eq!(m.tags().len(), 2);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"name":"mem","tags":{"host":"h1"},"fields":{"used":42,"ratio":0.5,"ok":true}}"#;
        let m: Metric = serde_json::from_str(ok).unwrap();
        assert_eq!(m.fields()["used"], FieldValue::Integer(42));
        assert_eq!(m.fields()["ratio"], FieldValue::Float(0.5));
        assert_eq!(m.fields()["ok"], FieldValue::Boolean(true));

        let bad = r#"{"name":"mem","fields":{}}"#;
        assert!(serde_json::from_str::<Metric>(bad).is_err());
    }
}
