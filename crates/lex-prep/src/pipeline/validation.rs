//! Input validation and dtype normalization.
//!
//! Everything here runs before any transformer is fitted, so a bad
//! configuration fails without doing work.

use crate::config::{EncodingConfig, ScalingConfig};
use crate::error::{PrepError, Result};
use crate::types::{ActionType, ColumnRole, ColumnRoles, PreprocessingAction, PreprocessingReport};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Reject frames with no rows or no columns.
pub(crate) fn check_not_empty(df: &DataFrame) -> Result<()> {
    if df.width() == 0 {
        return Err(PrepError::EmptyInput("dataset has no columns".to_string()));
    }
    if df.height() == 0 {
        return Err(PrepError::EmptyInput("dataset has no rows".to_string()));
    }
    Ok(())
}

/// Check that every role column exists and that no column has two roles.
pub(crate) fn check_roles(df: &DataFrame, roles: &ColumnRoles) -> Result<()> {
    for (columns, role) in [
        (&roles.numerical, "numerical role"),
        (&roles.categorical, "categorical role"),
    ] {
        let mut seen = HashSet::new();
        for col in columns {
            if !has_column(df, col) {
                return Err(PrepError::unknown_column(col, role));
            }
            if !seen.insert(col.as_str()) {
                return Err(PrepError::InvalidConfig(format!(
                    "column '{}' is listed twice in the {}",
                    col, role
                )));
            }
        }
    }

    if let Some(col) = roles
        .numerical
        .iter()
        .find(|c| roles.categorical.contains(c))
    {
        return Err(PrepError::InvalidConfig(format!(
            "column '{}' is assigned to both the numerical and categorical roles",
            col
        )));
    }

    Ok(())
}

/// Reject a column listed twice in one stage's column list.
pub(crate) fn check_no_duplicates(columns: &[String], stage: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for col in columns {
        if !seen.insert(col.as_str()) {
            return Err(PrepError::InvalidConfig(format!(
                "column '{}' is listed twice in the {} columns",
                col, stage
            )));
        }
    }
    Ok(())
}

/// Encoding columns must be categorical-role columns.
pub(crate) fn check_encoding_columns(
    df: &DataFrame,
    roles: &ColumnRoles,
    encoding: &EncodingConfig,
) -> Result<()> {
    for col in &encoding.columns {
        if roles.role_of(col) == ColumnRole::Categorical {
            continue;
        }
        if !has_column(df, col) {
            return Err(PrepError::unknown_column(col, "encoding"));
        }
        return Err(PrepError::RoleMismatch {
            column: col.clone(),
            expected: ColumnRole::Categorical.as_str().to_string(),
            operation: "encoding".to_string(),
        });
    }
    Ok(())
}

/// Scaling columns must be numerical-role columns or one-hot indicators.
pub(crate) fn check_scaling_columns(
    df: &DataFrame,
    roles: &ColumnRoles,
    indicators: &[String],
    scaling: &ScalingConfig,
) -> Result<()> {
    for col in &scaling.columns {
        if roles.role_of(col) == ColumnRole::Numerical || indicators.contains(col) {
            continue;
        }
        if !has_column(df, col) {
            return Err(PrepError::unknown_column(col, "scaling"));
        }
        return Err(PrepError::RoleMismatch {
            column: col.clone(),
            expected: ColumnRole::Numerical.as_str().to_string(),
            operation: "scaling".to_string(),
        });
    }
    Ok(())
}

/// Coerce role columns to the dtype their role needs.
///
/// Numerical columns with a non-numeric dtype are strictly cast to `Float64`;
/// a value that does not parse fails the run. Categorical columns are cast to
/// `String`.
pub(crate) fn normalize_dtypes(
    df: &DataFrame,
    roles: &ColumnRoles,
    report: &mut PreprocessingReport,
) -> Result<DataFrame> {
    let mut result = df.clone();

    for col in &roles.numerical {
        let series = df.column(col)?.as_materialized_series();
        if is_numeric_dtype(series.dtype()) {
            continue;
        }

        let from = series.dtype().to_string();
        let cast = series.strict_cast(&DataType::Float64).map_err(|_| {
            PrepError::InvalidConfig(format!(
                "numerical column '{}' has dtype {} and contains values that are not numbers",
                col, from
            ))
        })?;
        result.replace(col, cast)?;
        debug!("Coerced numerical column '{}' from {} to f64", col, from);
        report.add_action(PreprocessingAction::new(
            ActionType::TypeCoerced,
            col,
            format!("Converted '{}' from {} to f64", col, from),
        ));
    }

    for col in &roles.categorical {
        let series = df.column(col)?.as_materialized_series();
        if series.dtype() == &DataType::String {
            continue;
        }

        let from = series.dtype().to_string();
        let cast = series.cast(&DataType::String).map_err(|_| {
            PrepError::InvalidConfig(format!(
                "categorical column '{}' has dtype {} which cannot be read as text",
                col, from
            ))
        })?;
        result.replace(col, cast)?;
        debug!("Coerced categorical column '{}' from {} to str", col, from);
        report.add_action(PreprocessingAction::new(
            ActionType::TypeCoerced,
            col,
            format!("Converted '{}' from {} to str", col, from),
        ));
    }

    Ok(result)
}

/// Final column order: passthrough columns in input order, then numerical
/// columns in role order, then categorical columns in role order with each
/// one-hot column expanded in place.
pub(crate) fn output_column_order(
    input_columns: &[String],
    roles: &ColumnRoles,
    expand: impl Fn(&str) -> Vec<String>,
) -> Vec<String> {
    let mut order: Vec<String> = input_columns
        .iter()
        .filter(|c| roles.role_of(c) == ColumnRole::Passthrough)
        .cloned()
        .collect();
    order.extend(roles.numerical.iter().cloned());
    order.extend(roles.categorical.iter().flat_map(|c| expand(c)));
    order
}
