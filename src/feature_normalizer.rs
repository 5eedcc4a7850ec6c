//! Feature normalization for churn model inference.
//!
//! Turns a raw customer record into the feature vector the classifier was
//! trained on: numeric fields are coerced, categorical fields are expanded
//! into `<field>_<value>` indicator columns, the result is aligned to the
//! trained column list, and the numeric columns are scaled.

use crate::error::{NormalizeError, SchemaError};
use crate::models::scaler::Scaler;
use crate::types::{FeatureVector, RawRecord};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Fields parsed as numbers instead of being expanded into indicators.
pub const NUMERIC_FIELDS: [&str; 3] = ["tenure", "MonthlyCharges", "TotalCharges"];

/// Parse a numeric field, falling back to zero.
///
/// JSON numbers pass through, strings are trimmed and parsed, booleans map to
/// 1/0. Everything else (null, unparsable or blank strings, non-finite
/// results, arrays, objects) yields `0.0`. Never fails.
pub fn parse_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Normalizer bound to one trained column schema and scaler.
///
/// Built once at startup; `normalize` only reads from it, so a single
/// instance is shared by every request.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    /// Trained column names, in model input order
    columns: Vec<String>,
    /// Column name -> position in `columns`
    index: HashMap<String, usize>,
    /// Positions of `NUMERIC_FIELDS`, in the same order
    numeric_positions: [usize; 3],
    /// Positions of the scaler's columns, in scaler parameter order
    scaled_positions: Vec<usize>,
    scaler: Scaler,
}

impl FeatureNormalizer {
    /// Build the column index and check the scaler against it.
    pub fn new(columns: Vec<String>, scaler: Scaler) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumns);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (pos, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), pos).is_some() {
                return Err(SchemaError::DuplicateColumn(column.clone()));
            }
        }

        let position = |column: &str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))
        };

        let numeric_positions = [
            position(NUMERIC_FIELDS[0])?,
            position(NUMERIC_FIELDS[1])?,
            position(NUMERIC_FIELDS[2])?,
        ];

        scaler.validate()?;
        let scaled_positions = scaler
            .columns()
            .iter()
            .map(|c| position(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            columns,
            index,
            numeric_positions,
            scaled_positions,
            scaler,
        })
    }

    /// Normalize one record into a vector aligned to the trained columns.
    ///
    /// Unknown fields and unseen categorical values are dropped, missing
    /// columns stay zero. Array or object values are rejected, as are two
    /// fields that expand to the same column.
    pub fn normalize(&self, record: &RawRecord) -> Result<FeatureVector, NormalizeError> {
        let mut values = vec![0.0_f64; self.columns.len()];
        let mut written = vec![false; self.columns.len()];
        let mut dropped: Vec<String> = Vec::new();

        for (field, value) in record.iter() {
            if NUMERIC_FIELDS.contains(&field.as_str()) {
                continue;
            }

            let (column, x): (Cow<'_, str>, f64) = match value {
                Value::String(s) => (Cow::Owned(format!("{field}_{s}")), 1.0),
                Value::Number(n) => (Cow::Borrowed(field.as_str()), n.as_f64().unwrap_or(0.0)),
                Value::Bool(b) => (Cow::Borrowed(field.as_str()), if *b { 1.0 } else { 0.0 }),
                Value::Null => continue,
                Value::Array(_) => return Err(unsupported(field, "array")),
                Value::Object(_) => return Err(unsupported(field, "object")),
            };

            // e.g. `gender_Female` sent alongside `gender: "Female"`
            match self.index.get(column.as_ref()) {
                Some(&pos) if written[pos] => {
                    return Err(NormalizeError::DuplicateColumn(column.into_owned()))
                }
                Some(&pos) => {
                    values[pos] = x;
                    written[pos] = true;
                }
                None if dropped.iter().any(|d| d == column.as_ref()) => {
                    return Err(NormalizeError::DuplicateColumn(column.into_owned()))
                }
                None => dropped.push(column.into_owned()),
            }
        }

        for (field, &pos) in NUMERIC_FIELDS.iter().zip(&self.numeric_positions) {
            values[pos] = record.get(field).map(parse_or_zero).unwrap_or(0.0);
        }

        self.scaler.transform(&mut values, &self.scaled_positions);

        if !dropped.is_empty() {
            debug!(dropped = ?dropped, "Columns outside the model schema were dropped");
        }

        Ok(values.into_iter().map(|v| v as f32).collect::<Vec<_>>().into())
    }

    /// Number of features produced
    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    /// Feature names, in model input order
    pub fn feature_names(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column in the feature vector
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }
}

fn unsupported(field: &str, kind: &'static str) -> NormalizeError {
    NormalizeError::UnsupportedValue {
        field: field.to_string(),
        kind,
    }
}
