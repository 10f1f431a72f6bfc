//! Categorical encoding: one-hot indicators or integer label codes.
//!
//! Categories are the sorted distinct observed values of each column, so the
//! indicator order and the label codes do not depend on row order.

use crate::config::EncodingMethod;
use crate::error::{PrepError, Result};
use crate::types::{ActionType, PreprocessingAction, PreprocessingReport};
use crate::utils::string_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Categories learned for one encoded column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub column: String,
    /// Distinct observed values, sorted.
    pub categories: Vec<String>,
}

impl EncodedColumn {
    /// Indicator column name for a category.
    pub fn indicator_name(&self, category: &str) -> String {
        format!("{}_{}", self.column, category)
    }

    /// Indicator column names in category order.
    pub fn indicator_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| self.indicator_name(c))
            .collect()
    }
}

/// Fitted categorical encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    method: EncodingMethod,
    columns: Vec<EncodedColumn>,
}

impl CategoricalEncoder {
    pub fn new(method: EncodingMethod) -> Self {
        Self {
            method,
            columns: Vec::new(),
        }
    }

    pub fn method(&self) -> EncodingMethod {
        self.method
    }

    /// Learn the sorted category list of each column.
    ///
    /// With one-hot encoding, fails if a generated indicator name collides
    /// with a column that stays in the dataset or with another indicator.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns.clear();
        if self.method == EncodingMethod::None {
            return Ok(self);
        }

        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| PrepError::unknown_column(col_name, "encoding"))?
                .as_materialized_series();

            let categories: BTreeSet<String> =
                string_values(series)?.into_iter().flatten().collect();
            debug!("Column '{}' has {} categories", col_name, categories.len());

            self.columns.push(EncodedColumn {
                column: col_name.clone(),
                categories: categories.into_iter().collect(),
            });
        }

        if self.method == EncodingMethod::OneHot {
            self.check_indicator_names(df)?;
        }

        Ok(self)
    }

    fn check_indicator_names(&self, df: &DataFrame) -> Result<()> {
        let replaced: HashSet<&str> = self.columns.iter().map(|c| c.column.as_str()).collect();
        let mut taken: HashSet<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .filter(|n| !replaced.contains(n.as_str()))
            .collect();

        for name in self.generated_columns() {
            if !taken.insert(name.clone()) {
                return Err(PrepError::InvalidConfig(format!(
                    "one-hot column '{}' would collide with an existing column",
                    name
                )));
            }
        }
        Ok(())
    }

    /// The encoded columns in fit order.
    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    /// Fitted categories of a column.
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.categories.as_slice())
    }

    /// Names of the columns a source column turns into after encoding.
    ///
    /// Columns this encoder does not touch map to themselves.
    pub fn output_columns(&self, column: &str) -> Vec<String> {
        match (self.method, self.columns.iter().find(|c| c.column == column)) {
            (EncodingMethod::OneHot, Some(encoded)) => encoded.indicator_names(),
            _ => vec![column.to_string()],
        }
    }

    /// All indicator columns created by one-hot encoding.
    pub fn generated_columns(&self) -> Vec<String> {
        if self.method != EncodingMethod::OneHot {
            return Vec::new();
        }
        self.columns
            .iter()
            .flat_map(EncodedColumn::indicator_names)
            .collect()
    }

    /// Encode the fitted columns, returning a new frame.
    ///
    /// One-hot indicators take the place of their source column. Values not
    /// seen during fitting become all-zero rows under one-hot encoding and are
    /// rejected under label encoding. An indicator name already used by a
    /// column of `df` is a configuration error.
    pub fn transform(&self, df: &DataFrame, report: &mut PreprocessingReport) -> Result<DataFrame> {
        if self.columns.is_empty() {
            return Ok(df.clone());
        }
        if self.method == EncodingMethod::OneHot {
            self.check_indicator_names(df)?;
        }

        let mut output: Vec<Column> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let Some(encoded) = self.columns.iter().find(|c| c.column == column.name().as_str())
            else {
                output.push(column.clone());
                continue;
            };

            let values = string_values(column.as_materialized_series())?;
            match self.method {
                EncodingMethod::OneHot => {
                    if encoded.categories.is_empty() {
                        warn!("Column '{}' has no observed categories", encoded.column);
                        report.add_warning(format!(
                            "Column '{}' has no observed categories; one-hot encoding removed it",
                            encoded.column
                        ));
                    }
                    output.extend(one_hot(encoded, &values, report));
                    report.add_action(
                        PreprocessingAction::new(
                            ActionType::CategoriesEncoded,
                            &encoded.column,
                            format!(
                                "One-hot encoded '{}' into {} column(s)",
                                encoded.column,
                                encoded.categories.len()
                            ),
                        )
                        .with_details(encoded.indicator_names().join(", ")),
                    );
                }
                EncodingMethod::Label => {
                    output.push(label(encoded, &values)?);
                    let mapping: Vec<String> = encoded
                        .categories
                        .iter()
                        .enumerate()
                        .map(|(idx, cat)| format!("{}={}", cat, idx))
                        .collect();
                    report.add_action(
                        PreprocessingAction::new(
                            ActionType::CategoriesEncoded,
                            &encoded.column,
                            format!(
                                "Label encoded '{}' ({} categories)",
                                encoded.column,
                                encoded.categories.len()
                            ),
                        )
                        .with_details(mapping.join(", ")),
                    );
                }
                EncodingMethod::None => output.push(column.clone()),
            }
        }

        Ok(DataFrame::new(output)?)
    }
}

fn one_hot(
    encoded: &EncodedColumn,
    values: &[Option<String>],
    report: &mut PreprocessingReport,
) -> Vec<Column> {
    let unseen = values
        .iter()
        .flatten()
        .filter(|v| encoded.categories.binary_search(*v).is_err())
        .count();
    if unseen > 0 {
        report.add_warning(format!(
            "Column '{}' has {} value(s) unseen during fitting, encoded as all zeros",
            encoded.column, unseen
        ));
    }

    encoded
        .categories
        .iter()
        .map(|category| {
            let indicator: Vec<i32> = values
                .iter()
                .map(|v| i32::from(v.as_deref() == Some(category.as_str())))
                .collect();
            Column::from(Series::new(
                encoded.indicator_name(category).into(),
                indicator,
            ))
        })
        .collect()
}

fn label(encoded: &EncodedColumn, values: &[Option<String>]) -> Result<Column> {
    let codes = values
        .iter()
        .map(|v| match v {
            Some(value) => encoded
                .categories
                .binary_search(value)
                .map(|idx| Some(idx as i64))
                .map_err(|_| PrepError::UnknownCategory {
                    column: encoded.column.clone(),
                    value: value.clone(),
                }),
            None => Ok(None),
        })
        .collect::<Result<Vec<Option<i64>>>>()?;

    Ok(Column::from(Series::new(encoded.column.as_str().into(), codes)))
}
