//! Preprocessing executor module.
//!
//! Runs the fixed stage sequence (validate, impute, encode, scale) and
//! fits one transformer per stage on the output of the previous one.

use crate::config::{EncodingConfig, ImputationConfig, ScalingConfig};
use crate::encoders::CategoricalEncoder;
use crate::error::Result;
use crate::imputers::StatisticalImputer;
use crate::pipeline::fitted::{FittedTransformers, column_names};
use crate::pipeline::progress::{PreprocessingStage, ProgressReporter, ProgressUpdate};
use crate::pipeline::validation::{
    check_encoding_columns, check_no_duplicates, check_not_empty, check_roles,
    check_scaling_columns, normalize_dtypes,
};
use crate::scalers::NumericScaler;
use crate::types::{ColumnRoles, PreprocessingReport};
use polars::prelude::*;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The transformed dataset.
    pub data: DataFrame,
    /// Fitted transformers, reusable on new data.
    pub transformers: FittedTransformers,
    /// What the run did.
    pub report: PreprocessingReport,
}

impl PipelineOutput {
    pub fn into_parts(self) -> (DataFrame, FittedTransformers, PreprocessingReport) {
        (self.data, self.transformers, self.report)
    }
}

/// Executes the preprocessing stages on a DataFrame.
#[derive(Default, Clone)]
pub struct PreprocessingExecutor {
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PreprocessingExecutor {
    pub fn new(progress_reporter: Option<Arc<dyn ProgressReporter>>) -> Self {
        Self { progress_reporter }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Fit and apply imputation, encoding and scaling.
    ///
    /// The input frame is not modified. On error nothing is returned but the
    /// error; a `Failed` progress update is emitted.
    pub fn execute(
        &self,
        df: &DataFrame,
        roles: &ColumnRoles,
        imputation: &ImputationConfig,
        encoding: &EncodingConfig,
        scaling: &ScalingConfig,
    ) -> Result<PipelineOutput> {
        match self.execute_internal(df, roles, imputation, encoding, scaling) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Preprocessing complete: {} rows, {} columns",
                    output.report.rows, output.report.columns_after
                )));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Preprocessing failed: {}", e);
                Err(e)
            }
        }
    }

    fn execute_internal(
        &self,
        df: &DataFrame,
        roles: &ColumnRoles,
        imputation: &ImputationConfig,
        encoding: &EncodingConfig,
        scaling: &ScalingConfig,
    ) -> Result<PipelineOutput> {
        let mut report = PreprocessingReport::new();
        report.rows = df.height();
        report.columns_before = df.width();

        // Step 1: validation
        self.report_progress(ProgressUpdate::started(
            PreprocessingStage::Validation,
            df.width(),
            "Validating configuration...",
        ));
        info!("Step 1: Validating {} x {} dataset", df.height(), df.width());
        check_not_empty(df)?;
        check_roles(df, roles)?;
        check_no_duplicates(&encoding.columns, "encoding")?;
        check_no_duplicates(&scaling.columns, "scaling")?;
        check_encoding_columns(df, roles, encoding)?;
        let data = normalize_dtypes(df, roles, &mut report)?;
        debug!(
            "Roles: numerical={:?}, categorical={:?}",
            roles.numerical, roles.categorical
        );

        // Step 2: imputation
        let role_columns = roles.numerical.len() + roles.categorical.len();
        self.report_progress(ProgressUpdate::started(
            PreprocessingStage::Imputation,
            role_columns,
            format!(
                "Imputing missing values ({} / {})...",
                imputation.numerical, imputation.categorical
            ),
        ));
        info!("Step 2: Imputing missing values...");
        let mut imputer = StatisticalImputer::new(imputation);
        imputer.fit(&data, &roles.numerical, &roles.categorical)?;
        for col in imputer.unfillable_columns() {
            warn!("Column '{}' has no observed values to impute from", col);
            report.add_warning(format!(
                "Column '{}' has no observed values; missing entries were left in place",
                col
            ));
        }
        let data = imputer.transform(&data, &mut report)?;
        self.report_progress(ProgressUpdate::columns(
            PreprocessingStage::Imputation,
            role_columns,
            role_columns,
            "Imputation complete",
        ));

        // Step 3: encoding
        self.report_progress(ProgressUpdate::started(
            PreprocessingStage::Encoding,
            encoding.columns.len(),
            format!("Encoding categorical columns ({})...", encoding.method),
        ));
        info!("Step 3: Encoding {} column(s)...", encoding.columns.len());
        let mut encoder = CategoricalEncoder::new(encoding.method);
        encoder.fit(&data, &encoding.columns)?;
        let data = encoder.transform(&data, &mut report)?;
        self.report_progress(ProgressUpdate::columns(
            PreprocessingStage::Encoding,
            encoding.columns.len(),
            encoding.columns.len(),
            "Encoding complete",
        ));

        // Step 4: scaling
        self.report_progress(ProgressUpdate::started(
            PreprocessingStage::Scaling,
            scaling.columns.len(),
            format!("Scaling numerical columns ({})...", scaling.method),
        ));
        info!("Step 4: Scaling {} column(s)...", scaling.columns.len());
        check_scaling_columns(df, roles, &encoder.generated_columns(), scaling)?;
        let mut scaler = NumericScaler::new(scaling.method);
        scaler.fit(&data, &scaling.columns)?;
        let data = scaler.transform(&data, &mut report)?;
        self.report_progress(ProgressUpdate::columns(
            PreprocessingStage::Scaling,
            scaling.columns.len(),
            scaling.columns.len(),
            "Scaling complete",
        ));

        let mut transformers = FittedTransformers {
            roles: roles.clone(),
            imputer,
            encoder,
            scaler,
            output_columns: Vec::new(),
        };
        let data = transformers.select_output(df, &data)?;
        transformers.output_columns = column_names(&data);

        report.columns_after = data.width();
        report.column_order = transformers.output_columns.clone();
        info!(
            "Preprocessing finished: {} actions, {} warnings, output shape {:?}",
            report.actions.len(),
            report.warnings.len(),
            data.shape()
        );

        Ok(PipelineOutput {
            data,
            transformers,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CategoricalImputation, EncodingMethod, NumericImputation, ScalingMethod,
    };
    use crate::error::{ErrorKind, PrepError};
    use crate::types::ActionType;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn sample() -> DataFrame {
        df![
            "age" => [Some(25.0), Some(f64::NAN), Some(35.0)],
            "city" => ["NY", "LA", "NY"],
        ]
        .unwrap()
    }

    fn f64_column(df: &DataFrame, col: &str) -> Vec<Option<f64>> {
        df.column(col).unwrap().f64().unwrap().into_iter().collect()
    }

    fn i32_column(df: &DataFrame, col: &str) -> Vec<Option<i32>> {
        df.column(col).unwrap().i32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let output = PreprocessingExecutor::default()
            .execute(
                &sample(),
                &ColumnRoles::new(["age"], ["city"]),
                &ImputationConfig::default(),
                &EncodingConfig::new(["city"], EncodingMethod::OneHot),
                &ScalingConfig::new(["age"], ScalingMethod::Standardize),
            )
            .unwrap();

        assert_eq!(output.report.column_order, vec!["age", "city_LA", "city_NY"]);
        assert_eq!(f64_column(&output.data, "age"), vec![Some(-1.0), Some(0.0), Some(1.0)]);
        assert_eq!(i32_column(&output.data, "city_LA"), vec![Some(0), Some(1), Some(0)]);
        assert_eq!(i32_column(&output.data, "city_NY"), vec![Some(1), Some(0), Some(1)]);
        assert_eq!(output.transformers.imputer.numeric_fill("age"), Some(30.0));
        assert_eq!(output.report.actions_of(ActionType::ValueImputed).count(), 1);
        assert_eq!(output.report.actions_of(ActionType::CategoriesEncoded).count(), 1);
        assert_eq!(output.report.actions_of(ActionType::DataScaled).count(), 1);
    }

    #[test]
    fn test_input_is_not_modified() {
        let df = sample();
        let before = df.clone();
        PreprocessingExecutor::default()
            .execute(
                &df,
                &ColumnRoles::new(["age"], ["city"]),
                &ImputationConfig::default(),
                &EncodingConfig::new(["city"], EncodingMethod::Label),
                &ScalingConfig::new(["age"], ScalingMethod::MinMax),
            )
            .unwrap();
        assert!(df.equals_missing(&before));
    }

    #[test]
    fn test_all_none_is_identity_up_to_order() {
        let df = df![
            "city" => [Some("NY"), None],
            "id" => [1i64, 2],
            "age" => [Some(1.0), None],
        ]
        .unwrap();
        let imputation = ImputationConfig {
            numerical: NumericImputation::None,
            categorical: CategoricalImputation::None,
            ..Default::default()
        };
        let output = PreprocessingExecutor::default()
            .execute(
                &df,
                &ColumnRoles::new(["age"], ["city"]),
                &imputation,
                &EncodingConfig::default(),
                &ScalingConfig::default(),
            )
            .unwrap();

        assert_eq!(output.report.column_order, vec!["id", "age", "city"]);
        let expected = df.select(["id", "age", "city"]).unwrap();
        assert!(output.data.equals_missing(&expected));
        assert!(output.report.actions.is_empty());
    }

    #[test]
    fn test_all_missing_column_warns() {
        let df = df![
            "empty" => [Option::<f64>::None, None],
            "x" => [1.0, 2.0],
        ]
        .unwrap();
        let output = PreprocessingExecutor::default()
            .execute(
                &df,
                &ColumnRoles::new(["empty", "x"], Vec::<String>::new()),
                &ImputationConfig::default(),
                &EncodingConfig::default(),
                &ScalingConfig::default(),
            )
            .unwrap();

        assert_eq!(output.report.warnings.len(), 1);
        assert!(output.report.warnings[0].contains("empty"));
        assert_eq!(output.data.column("empty").unwrap().null_count(), 2);
    }

    #[test]
    fn test_scaling_a_categorical_column_fails() {
        let err = PreprocessingExecutor::default()
            .execute(
                &sample(),
                &ColumnRoles::new(["age"], ["city"]),
                &ImputationConfig::default(),
                &EncodingConfig::new(["city"], EncodingMethod::Label),
                &ScalingConfig::new(["city"], ScalingMethod::Standardize),
            )
            .unwrap_err();
        assert!(matches!(err, PrepError::RoleMismatch { ref column, .. } if column == "city"));
    }

    #[test]
    fn test_empty_dataset_fails() {
        let df = df!["age" => Vec::<f64>::new()].unwrap();
        let err = PreprocessingExecutor::default()
            .execute(
                &df,
                &ColumnRoles::new(["age"], Vec::<String>::new()),
                &ImputationConfig::default(),
                &EncodingConfig::default(),
                &ScalingConfig::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn test_progress_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let reporter: Arc<dyn ProgressReporter> =
            Arc::new(move |update: ProgressUpdate| {
                let mut seen = stages_clone.lock().unwrap();
                if seen.last() != Some(&update.stage) {
                    seen.push(update.stage);
                }
            });

        PreprocessingExecutor::new(Some(reporter))
            .execute(
                &sample(),
                &ColumnRoles::new(["age"], ["city"]),
                &ImputationConfig::default(),
                &EncodingConfig::new(["city"], EncodingMethod::OneHot),
                &ScalingConfig::new(["age"], ScalingMethod::Standardize),
            )
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                PreprocessingStage::Validation,
                PreprocessingStage::Imputation,
                PreprocessingStage::Encoding,
                PreprocessingStage::Scaling,
                PreprocessingStage::Complete,
            ]
        );
    }

    #[test]
    fn test_refit_transform_matches_output() {
        let output = PreprocessingExecutor::default()
            .execute(
                &sample(),
                &ColumnRoles::new(["age"], ["city"]),
                &ImputationConfig::default(),
                &EncodingConfig::new(["city"], EncodingMethod::OneHot),
                &ScalingConfig::new(["age", "city_NY"], ScalingMethod::MinMax),
            )
            .unwrap();

        let replayed = output.transformers.transform(&sample()).unwrap();
        assert!(replayed.equals_missing(&output.data));
        assert_eq!(output.transformers.output_columns, output.report.column_order);
    }
}
