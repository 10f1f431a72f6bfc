//! Data profiling for role detection and dataset previews.
//!
//! The profiler summarizes each column (dtype, detected role, missing values,
//! cardinality, a few sample values). Role detection feeds the default
//! [`ColumnRoles`](crate::types::ColumnRoles); the full profile backs the
//! CLI's `--dry-run` preview.

mod role_inference;

use crate::error::Result;
use crate::types::{ColumnProfile, DatasetProfile};
use crate::utils::{collect_sample_values, missing_count};
use polars::prelude::*;

pub(crate) use role_inference::infer_column_role;

/// Number of sample values kept per column.
const SAMPLE_SIZE: usize = 5;

/// Data profiler for analyzing dataset structure.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile every column of a dataset, in column order.
    pub fn profile_dataset(df: &DataFrame) -> Result<DatasetProfile> {
        let column_profiles = df
            .get_columns()
            .iter()
            .map(|column| Self::profile_column(column.as_materialized_series(), df.height()))
            .collect::<Result<Vec<_>>>()?;

        Ok(DatasetProfile {
            shape: (df.height(), df.width()),
            column_profiles,
        })
    }

    fn profile_column(series: &Series, total_rows: usize) -> Result<ColumnProfile> {
        let null_count = missing_count(series)?;
        let null_percentage = if total_rows > 0 {
            (null_count as f64 / total_rows as f64) * 100.0
        } else {
            0.0
        };

        Ok(ColumnProfile {
            name: series.name().to_string(),
            dtype: format!("{}", series.dtype()),
            detected_role: infer_column_role(series.dtype()),
            unique_count: series.drop_nulls().n_unique()?,
            null_count,
            null_percentage,
            sample_values: collect_sample_values(series, SAMPLE_SIZE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnRole;

    #[test]
    fn test_profile_dataset() {
        let df = df![
            "age" => [Some(25.0), None, Some(35.0), Some(35.0)],
            "city" => [Some("NY"), Some("LA"), None, Some("NY")],
        ]
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.shape, (4, 2));

        let age = &profile.column_profiles[0];
        assert_eq!(age.name, "age");
        assert_eq!(age.detected_role, ColumnRole::Numerical);
        assert_eq!(age.null_count, 1);
        assert_eq!(age.null_percentage, 25.0);
        assert_eq!(age.unique_count, 2);

        let city = &profile.column_profiles[1];
        assert_eq!(city.detected_role, ColumnRole::Categorical);
        assert_eq!(city.sample_values, vec!["NY", "LA", "NY"]);

        assert_eq!(profile.columns_with_role(ColumnRole::Numerical), vec!["age"]);
        assert_eq!(profile.columns_with_role(ColumnRole::Categorical), vec!["city"]);
    }

    #[test]
    fn test_profile_counts_nan_as_missing() {
        let df = df!["x" => [Some(1.0), Some(f64::NAN), None]].unwrap();
        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.column_profiles[0].null_count, 2);
    }
}
