//! The fitted transformer set produced by a pipeline run.

use crate::encoders::CategoricalEncoder;
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::pipeline::validation::{check_not_empty, check_roles, normalize_dtypes, output_column_order};
use crate::scalers::NumericScaler;
use crate::types::{ColumnRoles, PreprocessingReport};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything needed to replay a pipeline run on new data.
///
/// Applying [`FittedTransformers::transform`] to the data the set was fitted
/// on reproduces the pipeline output exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformers {
    /// Column roles the transformers were fitted with.
    pub roles: ColumnRoles,
    pub imputer: StatisticalImputer,
    pub encoder: CategoricalEncoder,
    pub scaler: NumericScaler,
    /// Column order of the fitted output.
    pub output_columns: Vec<String>,
}

static_assertions::assert_impl_all!(FittedTransformers: Send, Sync);

impl FittedTransformers {
    /// Apply the stored imputation, encoding and scaling to new data with
    /// the same input schema.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.transform_with_report(df).map(|(data, _)| data)
    }

    /// Like [`transform`](Self::transform), also returning what was done.
    pub fn transform_with_report(&self, df: &DataFrame) -> Result<(DataFrame, PreprocessingReport)> {
        check_not_empty(df)?;
        check_roles(df, &self.roles)?;

        let mut report = PreprocessingReport::new();
        report.rows = df.height();
        report.columns_before = df.width();

        let data = normalize_dtypes(df, &self.roles, &mut report)?;
        let data = self.imputer.transform(&data, &mut report)?;
        let data = self.encoder.transform(&data, &mut report)?;
        let data = self.scaler.transform(&data, &mut report)?;
        let data = self.select_output(df, &data)?;

        report.columns_after = data.width();
        report.column_order = column_names(&data);
        Ok((data, report))
    }

    /// Reorder the transformed frame into the documented output order.
    pub(crate) fn select_output(&self, input: &DataFrame, transformed: &DataFrame) -> Result<DataFrame> {
        let order = output_column_order(&column_names(input), &self.roles, |c| {
            self.encoder.output_columns(c)
        });
        Ok(transformed.select(order)?)
    }
}

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}
