//! Main preprocessing pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder, plus the
//! free [`run`] function for callers that already hold explicit column roles.

use crate::config::{EncodingConfig, ImputationConfig, PipelineConfig, ScalingConfig};
use crate::error::Result;
use crate::pipeline::executor::{PipelineOutput, PreprocessingExecutor};
use crate::pipeline::progress::{ProgressReporter, ProgressUpdate};
use crate::types::ColumnRoles;
use polars::prelude::*;
use std::sync::Arc;
use tracing::info;

/// The main preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_prep::{EncodingMethod, Pipeline, PipelineConfig, ScalingMethod};
///
/// let config = PipelineConfig::builder()
///     .encode(["city"], EncodingMethod::OneHot)
///     .scale(["age"], ScalingMethod::Standardize)
///     .build()?;
///
/// let output = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(&dataframe)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    executor: PreprocessingExecutor,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve column roles for a DataFrame and run the pipeline on it.
    ///
    /// Roles not fixed in the configuration are detected from dtypes.
    pub fn run(&self, df: &DataFrame) -> Result<PipelineOutput> {
        let roles = self.config.roles.resolve(df);
        info!(
            "Running pipeline with {} numerical and {} categorical column(s)",
            roles.numerical.len(),
            roles.categorical.len()
        );
        self.executor.execute(
            df,
            &roles,
            &self.config.imputation,
            &self.config.encoding,
            &self.config.scaling,
        )
    }
}

/// Run the pipeline with explicit column roles and stage configurations.
///
/// Steps are applied in the fixed order impute, encode, scale. The input is
/// not modified.
pub fn run(
    df: &DataFrame,
    roles: &ColumnRoles,
    imputation: &ImputationConfig,
    encoding: &EncodingConfig,
    scaling: &ScalingConfig,
) -> Result<PipelineOutput> {
    PreprocessingExecutor::default().execute(df, roles, imputation, encoding, scaling)
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing progress reporter with this pipeline.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Report progress to a closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(callback));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            executor: PreprocessingExecutor::new(self.progress_reporter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncodingMethod, RoleSelection, ScalingMethod};
    use crate::pipeline::progress::PreprocessingStage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> DataFrame {
        df![
            "id" => ["a", "b", "c"],
            "age" => [Some(25.0), None, Some(35.0)],
            "city" => ["NY", "LA", "NY"],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            roles: RoleSelection {
                numerical: Some(vec!["age".to_string()]),
                categorical: Some(vec!["age".to_string()]),
            },
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_run_detects_roles() {
        let config = PipelineConfig::builder()
            .categorical_columns(["city"])
            .encode(["city"], EncodingMethod::OneHot)
            .scale(["age"], ScalingMethod::Standardize)
            .build()
            .unwrap();

        let output = Pipeline::builder().config(config).build().unwrap().run(&sample()).unwrap();

        // "id" is a string column but was left out of the explicit categorical role
        assert_eq!(output.report.column_order, vec!["id", "age", "city_LA", "city_NY"]);
        assert_eq!(output.transformers.roles.numerical, vec!["age"]);
    }

    #[test]
    fn test_pipeline_reports_progress() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        let completed_clone = completed.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
                if update.stage == PreprocessingStage::Complete {
                    completed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        pipeline.run(&sample()).unwrap();

        assert!(call_count.load(Ordering::SeqCst) > 1);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_stage_reported() {
        let failed = Arc::new(AtomicUsize::new(0));
        let failed_clone = failed.clone();

        let config = PipelineConfig::builder()
            .numerical_columns(["salary"])
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .config(config)
            .on_progress(move |update| {
                if update.stage == PreprocessingStage::Failed {
                    failed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        assert!(pipeline.run(&sample()).is_err());
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_free_function_matches_pipeline() {
        let roles = ColumnRoles::new(["age"], ["city"]);
        let output = run(
            &sample(),
            &roles,
            &ImputationConfig::default(),
            &EncodingConfig::new(["city"], EncodingMethod::Label),
            &ScalingConfig::new(["age"], ScalingMethod::MinMax),
        )
        .unwrap();

        let config = PipelineConfig::builder()
            .numerical_columns(["age"])
            .categorical_columns(["city"])
            .encode(["city"], EncodingMethod::Label)
            .scale(["age"], ScalingMethod::MinMax)
            .build()
            .unwrap();
        let via_pipeline = Pipeline::builder().config(config).build().unwrap().run(&sample()).unwrap();

        assert!(output.data.equals_missing(&via_pipeline.data));
        assert_eq!(output.report, via_pipeline.report);
    }
}
