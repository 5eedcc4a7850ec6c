//! Customer record and feature vector data structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One customer record as sent by a client.
///
/// Field names follow the Telco dataset (`gender`, `tenure`, `Contract`, ...).
/// Any JSON object is accepted; fields the model was not trained on are
/// dropped during normalization rather than rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Add a field to the record
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Look up a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterate over all fields
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Model input aligned to the trained column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_deserialization() {
        let record: RawRecord = serde_json::from_value(json!({
            "gender": "Female",
            "tenure": 1,
            "MonthlyCharges": 29.85
        }))
        .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("gender"), Some(&json!("Female")));
        assert_eq!(record.get("tenure"), Some(&json!(1)));
        assert!(record.get("Contract").is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(serde_json::from_value::<RawRecord>(json!([1, 2, 3])).is_err());
        assert!(serde_json::from_value::<RawRecord>(json!("tenure")).is_err());
    }

    #[test]
    fn test_builder() {
        let record = RawRecord::new()
            .with_field("Contract", "Two year")
            .with_field("SeniorCitizen", 1);

        assert_eq!(record.len(), 2);
        assert!(!record.is_empty());
        assert!(RawRecord::new().is_empty());
    }
}
