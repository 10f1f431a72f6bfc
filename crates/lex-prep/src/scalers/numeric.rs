//! Standardization and min-max scaling.
//!
//! Both methods are an affine map `(x - center) / scale`: standardization uses
//! the mean and sample standard deviation, min-max uses the minimum and the
//! range. A zero (or undefined) scale is replaced by 1 so constant columns
//! become exactly 0 instead of NaN.

use crate::config::ScalingMethod;
use crate::error::{PrepError, Result};
use crate::types::{ActionType, PreprocessingAction, PreprocessingReport};
use crate::utils::{mean, min_max, numeric_values, observed, sample_std};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters fitted for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    /// Mean or minimum.
    pub center: f64,
    /// Standard deviation or range.
    pub scale: f64,
}

impl ScalerParams {
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.center) / self.scale
    }
}

/// Fitted numerical scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    method: ScalingMethod,
    params: Vec<ScalerParams>,
}

impl NumericScaler {
    pub fn new(method: ScalingMethod) -> Self {
        Self {
            method,
            params: Vec::new(),
        }
    }

    pub fn method(&self) -> ScalingMethod {
        self.method
    }

    /// Compute per-column parameters over the non-missing values.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params.clear();
        if self.method == ScalingMethod::None {
            return Ok(self);
        }

        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| PrepError::unknown_column(col_name, "scaling"))?
                .as_materialized_series();
            let observed = observed(&numeric_values(series)?);

            let (center, scale) = match self.method {
                ScalingMethod::Standardize => {
                    (mean(&observed).unwrap_or(0.0), sample_std(&observed))
                }
                ScalingMethod::MinMax => match min_max(&observed) {
                    Some((min, max)) => (min, Some(max - min)),
                    None => (0.0, None),
                },
                ScalingMethod::None => (0.0, None),
            };
            let scale = scale.filter(|s| *s != 0.0 && s.is_finite()).unwrap_or(1.0);

            debug!("Scaler params for '{}': center={}, scale={}", col_name, center, scale);
            self.params.push(ScalerParams {
                column: col_name.clone(),
                center,
                scale,
            });
        }

        Ok(self)
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn params_for(&self, column: &str) -> Option<&ScalerParams> {
        self.params.iter().find(|p| p.column == column)
    }

    /// Scale the fitted columns to `Float64`; missing values stay missing.
    pub fn transform(&self, df: &DataFrame, report: &mut PreprocessingReport) -> Result<DataFrame> {
        let mut result = df.clone();

        for params in &self.params {
            let series = df
                .column(&params.column)
                .map_err(|_| PrepError::unknown_column(&params.column, "scaling"))?
                .as_materialized_series();

            let scaled: Vec<Option<f64>> = numeric_values(series)?
                .into_iter()
                .map(|v| v.map(|x| params.apply(x)))
                .collect();
            result.replace(&params.column, Series::new(params.column.as_str().into(), scaled))?;

            report.add_action(PreprocessingAction::new(
                ActionType::DataScaled,
                &params.column,
                format!(
                    "Scaled '{}' with {} (center {:.4}, scale {:.4})",
                    params.column, self.method, params.center, params.scale
                ),
            ));
        }

        Ok(result)
    }
}
