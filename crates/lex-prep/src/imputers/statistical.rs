//! Statistical imputation methods.
//!
//! The imputer is fitted once on the input data and keeps the fill value of
//! every column, so the identical fill can be replayed on new data.

use crate::config::{CategoricalImputation, ImputationConfig, NumericImputation};
use crate::error::{PrepError, Result};
use crate::types::{ActionType, PreprocessingAction, PreprocessingReport};
use crate::utils::{mean, median, numeric_values, observed, string_mode, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Fitted missing-value imputer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalImputer {
    numeric_strategy: NumericImputation,
    categorical_strategy: CategoricalImputation,
    fill_value: String,
    numeric_fills: BTreeMap<String, f64>,
    categorical_fills: BTreeMap<String, String>,
    /// Columns that had no observed values to compute a statistic from.
    unfillable: Vec<String>,
}

impl StatisticalImputer {
    pub fn new(config: &ImputationConfig) -> Self {
        Self {
            numeric_strategy: config.numerical,
            categorical_strategy: config.categorical,
            fill_value: config.fill_value.clone(),
            numeric_fills: BTreeMap::new(),
            categorical_fills: BTreeMap::new(),
            unfillable: Vec::new(),
        }
    }

    /// Learn fill values from the non-missing entries of each column.
    pub fn fit(
        &mut self,
        df: &DataFrame,
        numerical: &[String],
        categorical: &[String],
    ) -> Result<&mut Self> {
        if self.numeric_strategy != NumericImputation::None {
            for col_name in numerical {
                let values = numeric_values(column_series(df, col_name)?)?;
                let observed = observed(&values);
                let fill = match self.numeric_strategy {
                    NumericImputation::Mean => mean(&observed),
                    NumericImputation::Median => median(&observed),
                    NumericImputation::None => None,
                };
                match fill {
                    Some(fill) => {
                        debug!("Fitted {} for '{}': {}", self.numeric_strategy, col_name, fill);
                        self.numeric_fills.insert(col_name.clone(), fill);
                    }
                    None => self.unfillable.push(col_name.clone()),
                }
            }
        }

        if self.categorical_strategy != CategoricalImputation::None {
            for col_name in categorical {
                let fill = match self.categorical_strategy {
                    CategoricalImputation::MostFrequent => {
                        let values = string_values(column_series(df, col_name)?)?;
                        string_mode(values.iter().flatten().map(String::as_str))
                    }
                    CategoricalImputation::Constant => Some(self.fill_value.clone()),
                    CategoricalImputation::None => None,
                };
                match fill {
                    Some(fill) => {
                        debug!("Fitted {} for '{}': '{}'", self.categorical_strategy, col_name, fill);
                        self.categorical_fills.insert(col_name.clone(), fill);
                    }
                    None => self.unfillable.push(col_name.clone()),
                }
            }
        }

        Ok(self)
    }

    /// Fill missing values, returning a new frame.
    ///
    /// Columns without missing values are left untouched, dtype included.
    pub fn transform(&self, df: &DataFrame, report: &mut PreprocessingReport) -> Result<DataFrame> {
        let mut result = df.clone();

        for (col_name, fill) in &self.numeric_fills {
            let values = numeric_values(column_series(df, col_name)?)?;
            let missing = values.iter().filter(|v| v.is_none()).count();
            if missing == 0 {
                continue;
            }

            let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(*fill)).collect();
            result.replace(col_name, Series::new(col_name.as_str().into(), filled))?;

            report.add_action(PreprocessingAction::new(
                ActionType::ValueImputed,
                col_name,
                format!(
                    "Filled {} missing value(s) in '{}' with {}: {:.2}",
                    missing, col_name, self.numeric_strategy, fill
                ),
            ));
        }

        for (col_name, fill) in &self.categorical_fills {
            let values = string_values(column_series(df, col_name)?)?;
            let missing = values.iter().filter(|v| v.is_none()).count();
            if missing == 0 {
                continue;
            }

            let filled: Vec<String> = values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| fill.clone()))
                .collect();
            result.replace(col_name, Series::new(col_name.as_str().into(), filled))?;

            report.add_action(PreprocessingAction::new(
                ActionType::ValueImputed,
                col_name,
                format!(
                    "Filled {} missing value(s) in '{}' with {}: '{}'",
                    missing, col_name, self.categorical_strategy, fill
                ),
            ));
        }

        Ok(result)
    }

    /// Fitted numeric fill value for a column.
    pub fn numeric_fill(&self, column: &str) -> Option<f64> {
        self.numeric_fills.get(column).copied()
    }

    /// Fitted categorical fill value for a column.
    pub fn categorical_fill(&self, column: &str) -> Option<&str> {
        self.categorical_fills.get(column).map(String::as_str)
    }

    /// Columns left with missing values because nothing could be computed.
    pub fn unfillable_columns(&self) -> &[String] {
        &self.unfillable
    }
}

fn column_series<'a>(df: &'a DataFrame, col_name: &str) -> Result<&'a Series> {
    df.column(col_name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PrepError::unknown_column(col_name, "imputation"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(numerical: NumericImputation, categorical: CategoricalImputation) -> ImputationConfig {
        ImputationConfig {
            numerical,
            categorical,
            fill_value: "missing".to_string(),
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fit_transform(
        df: &DataFrame,
        config: &ImputationConfig,
        numerical: &[&str],
        categorical: &[&str],
    ) -> (StatisticalImputer, DataFrame, PreprocessingReport) {
        let mut imputer = StatisticalImputer::new(config);
        imputer.fit(df, &cols(numerical), &cols(categorical)).unwrap();
        let mut report = PreprocessingReport::new();
        let out = imputer.transform(df, &mut report).unwrap();
        (imputer, out, report)
    }

    fn f64_at(df: &DataFrame, col: &str, idx: usize) -> f64 {
        df.column(col).unwrap().get(idx).unwrap().try_extract::<f64>().unwrap()
    }

    // ========================================================================
    // numerical imputation
    // ========================================================================

    #[test]
    fn test_mean_imputation() {
        let df = df!["values" => [Some(10.0), None, Some(20.0)]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let (imputer, out, report) = fit_transform(&df, &cfg, &["values"], &[]);

        assert_eq!(imputer.numeric_fill("values"), Some(15.0));
        assert_eq!(out.column("values").unwrap().null_count(), 0);
        assert_eq!(f64_at(&out, "values", 0), 10.0);
        assert_eq!(f64_at(&out, "values", 1), 15.0);
        assert_eq!(f64_at(&out, "values", 2), 20.0);
        assert!(report.actions[0].description.contains("mean"));
    }

    #[test]
    fn test_median_imputation() {
        let df = df!["values" => [Some(1.0), None, Some(3.0), None, Some(50.0)]].unwrap();
        let cfg = config(NumericImputation::Median, CategoricalImputation::None);
        let (_, out, _) = fit_transform(&df, &cfg, &["values"], &[]);

        assert_eq!(f64_at(&out, "values", 1), 3.0);
        assert_eq!(f64_at(&out, "values", 3), 3.0);
    }

    #[test]
    fn test_nan_is_imputed() {
        let df = df!["values" => [Some(2.0), Some(f64::NAN), Some(4.0)]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let (_, out, _) = fit_transform(&df, &cfg, &["values"], &[]);
        assert_eq!(f64_at(&out, "values", 1), 3.0);
    }

    #[test]
    fn test_integer_column_with_missing_becomes_float() {
        let df = df!["count" => [Some(1i64), None, Some(4)]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let (_, out, _) = fit_transform(&df, &cfg, &["count"], &[]);

        assert_eq!(out.column("count").unwrap().dtype(), &DataType::Float64);
        assert_eq!(f64_at(&out, "count", 1), 2.5);
    }

    #[test]
    fn test_no_missing_values_is_a_no_op() {
        let df = df![
            "count" => [1i64, 2, 3],
            "city" => ["NY", "LA", "NY"],
        ]
        .unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::MostFrequent);
        let (_, out, report) = fit_transform(&df, &cfg, &["count"], &["city"]);

        assert!(out.equals(&df));
        assert!(report.actions.is_empty());
    }

    #[test]
    fn test_numeric_none_keeps_missing() {
        let df = df!["values" => [Some(1.0), None]].unwrap();
        let cfg = config(NumericImputation::None, CategoricalImputation::None);
        let (imputer, out, _) = fit_transform(&df, &cfg, &["values"], &[]);

        assert_eq!(imputer.numeric_fill("values"), None);
        assert_eq!(out.column("values").unwrap().null_count(), 1);
        assert!(imputer.unfillable_columns().is_empty());
    }

    #[test]
    fn test_all_missing_column_is_unfillable() {
        let df = df!["values" => [Option::<f64>::None, None]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let (imputer, out, _) = fit_transform(&df, &cfg, &["values"], &[]);

        assert_eq!(imputer.unfillable_columns(), &["values".to_string()]);
        assert_eq!(out.column("values").unwrap().null_count(), 2);
    }

    // ========================================================================
    // categorical imputation
    // ========================================================================

    #[test]
    fn test_most_frequent_imputation() {
        let df = df!["category" => [Some("A"), Some("B"), Some("A"), None, Some("A")]].unwrap();
        let cfg = config(NumericImputation::None, CategoricalImputation::MostFrequent);
        let (imputer, out, report) = fit_transform(&df, &cfg, &[], &["category"]);

        assert_eq!(imputer.categorical_fill("category"), Some("A"));
        let category = out.column("category").unwrap();
        assert_eq!(category.null_count(), 0);
        assert_eq!(category.str().unwrap().get(3), Some("A"));
        assert!(report.actions[0].description.contains("most_frequent"));
    }

    #[test]
    fn test_constant_imputation() {
        let df = df!["text" => [Some("Hello"), None, Some("World")]].unwrap();
        let mut cfg = config(NumericImputation::None, CategoricalImputation::Constant);
        cfg.fill_value = "unknown".to_string();
        let (_, out, _) = fit_transform(&df, &cfg, &[], &["text"]);

        let text = out.column("text").unwrap();
        assert_eq!(text.str().unwrap().get(1), Some("unknown"));
        assert_eq!(text.str().unwrap().get(0), Some("Hello"));
    }

    #[test]
    fn test_constant_fills_all_missing_column() {
        let df = df!["text" => [Option::<&str>::None, None]].unwrap();
        let cfg = config(NumericImputation::None, CategoricalImputation::Constant);
        let (imputer, out, _) = fit_transform(&df, &cfg, &[], &["text"]);

        assert!(imputer.unfillable_columns().is_empty());
        assert_eq!(out.column("text").unwrap().str().unwrap().get(0), Some("missing"));
    }

    #[test]
    fn test_fitted_values_replay_on_new_data() {
        let train = df!["values" => [Some(10.0), Some(20.0)]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let mut imputer = StatisticalImputer::new(&cfg);
        imputer.fit(&train, &cols(&["values"]), &[]).unwrap();

        let new_data = df!["values" => [None, Some(100.0)]].unwrap();
        let out = imputer
            .transform(&new_data, &mut PreprocessingReport::new())
            .unwrap();
        // Fill comes from the training mean, not the new data
        assert_eq!(f64_at(&out, "values", 0), 15.0);
    }

    #[test]
    fn test_unknown_column() {
        let df = df!["other" => [1.0]].unwrap();
        let cfg = config(NumericImputation::Mean, CategoricalImputation::None);
        let err = StatisticalImputer::new(&cfg)
            .fit(&df, &cols(&["values"]), &[])
            .unwrap_err();
        assert!(matches!(err, PrepError::UnknownColumn { .. }));
    }
}
