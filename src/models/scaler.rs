//! Fitted numeric scalers
//!
//! Parameters are exported from the training pipeline as JSON and never
//! refitted here.

use crate::error::SchemaError;
use crate::feature_normalizer::NUMERIC_FIELDS;
use serde::{Deserialize, Serialize};

/// Scaler state fitted offline on the numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Standardization: `(x - mean) / scale`
    Standard {
        #[serde(default = "default_columns")]
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// Min-max scaling of `[data_min, data_max]` onto `feature_range`
    MinMax {
        #[serde(default = "default_columns")]
        columns: Vec<String>,
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "default_feature_range")]
        feature_range: [f64; 2],
    },
}

fn default_columns() -> Vec<String> {
    NUMERIC_FIELDS.iter().map(|c| c.to_string()).collect()
}

fn default_feature_range() -> [f64; 2] {
    [0.0, 1.0]
}

/// Constant columns are left unscaled rather than divided by zero.
fn non_zero(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

impl Scaler {
    /// Standard scaler over the default numeric columns
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Scaler::Standard {
            columns: default_columns(),
            mean,
            scale,
        }
    }

    /// Min-max scaler over the default numeric columns, mapped onto `[0, 1]`
    pub fn min_max(data_min: Vec<f64>, data_max: Vec<f64>) -> Self {
        Scaler::MinMax {
            columns: default_columns(),
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Columns the scaler was fitted on, in parameter order
    pub fn columns(&self) -> &[String] {
        match self {
            Scaler::Standard { columns, .. } | Scaler::MinMax { columns, .. } => columns,
        }
    }

    /// Check that every column has a finite parameter of each kind
    pub fn validate(&self) -> Result<(), SchemaError> {
        let columns = self.columns().len();
        let params: Vec<(&'static str, &[f64])> = match self {
            Scaler::Standard { mean, scale, .. } => {
                vec![("mean", mean.as_slice()), ("scale", scale.as_slice())]
            }
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range,
                ..
            } => vec![
                ("data_min", data_min.as_slice()),
                ("data_max", data_max.as_slice()),
                ("feature_range", feature_range.as_slice()),
            ],
        };

        for (name, values) in params {
            if name != "feature_range" && values.len() != columns {
                return Err(SchemaError::ScalerShape {
                    name,
                    columns,
                    params: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(SchemaError::ScalerNotFinite(name));
            }
        }

        Ok(())
    }

    /// Transform the value of the `i`-th scaler column
    pub fn transform_value(&self, i: usize, x: f64) -> f64 {
        match self {
            Scaler::Standard { mean, scale, .. } => (x - mean[i]) / non_zero(scale[i]),
            Scaler::MinMax {
                data_min,
                data_max,
                feature_range: [lo, hi],
                ..
            } => {
                let unit = (x - data_min[i]) / non_zero(data_max[i] - data_min[i]);
                unit * (hi - lo) + lo
            }
        }
    }

    /// Scale `values` in place.
    ///
    /// `positions[i]` is the index in `values` holding the `i`-th scaler column.
    pub fn transform(&self, values: &mut [f64], positions: &[usize]) {
        for (i, &pos) in positions.iter().enumerate() {
            values[pos] = self.transform_value(i, values[pos]);
        }
    }
}
