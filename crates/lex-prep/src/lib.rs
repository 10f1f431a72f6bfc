//! Tabular Preprocessing Pipeline Library
//!
//! Column-level missing-value imputation, categorical encoding and numerical
//! scaling for machine learning data, built on Polars.
//!
//! # Overview
//!
//! A run takes a DataFrame, a partition of its columns into numerical and
//! categorical roles, and one configuration per stage. Stages always apply in
//! the order impute, encode, scale:
//!
//! - **Imputation**: mean / median for numerical columns, most frequent value
//!   or a constant for categorical columns
//! - **Encoding**: one-hot indicator columns or sorted label codes
//! - **Scaling**: standardization (sample standard deviation) or min-max
//!
//! Every run returns the transformed data, the [`FittedTransformers`] that can
//! replay the same transformation on new data, and a [`PreprocessingReport`]
//! describing what was done.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_prep::{EncodingMethod, Pipeline, PipelineConfig, ScalingMethod, load_csv};
//!
//! let df = load_csv("data.csv")?;
//!
//! let config = PipelineConfig::builder()
//!     .encode(["city"], EncodingMethod::OneHot)
//!     .scale(["age"], ScalingMethod::Standardize)
//!     .build()?;
//!
//! let output = Pipeline::builder().config(config).build()?.run(&df)?;
//!
//! for line in output.report.messages() {
//!     println!("{}", line);
//! }
//!
//! // Same means, categories and scaling parameters on new data
//! let next = output.transformers.transform(&load_csv("next.csv")?)?;
//! ```
//!
//! # Explicit roles
//!
//! Callers that already know their column roles can skip detection and use
//! the free [`run`] function:
//!
//! ```rust,ignore
//! use lex_prep::*;
//!
//! let output = run(
//!     &df,
//!     &ColumnRoles::new(["age"], ["city"]),
//!     &ImputationConfig::default(),
//!     &EncodingConfig::new(["city"], EncodingMethod::OneHot),
//!     &ScalingConfig::new(["age"], ScalingMethod::Standardize),
//! )?;
//! let (data, transformers, report) = output.into_parts();
//! ```

pub mod config;
pub mod encoders;
pub mod error;
pub mod export;
pub mod imputers;
pub mod pipeline;
pub mod profiler;
pub mod scalers;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    CategoricalImputation, EncodingConfig, EncodingMethod, ImputationConfig, NumericImputation,
    PipelineConfig, PipelineConfigBuilder, RoleSelection, ScalingConfig, ScalingMethod,
};
pub use encoders::CategoricalEncoder;
pub use error::{ErrorKind, PrepError, Result, ResultExt};
pub use export::{
    PreprocessingArtifact, SerializedTable, load_csv, load_csv_bytes, to_csv_string, write_csv,
};
pub use imputers::StatisticalImputer;
pub use pipeline::{
    FittedTransformers, Pipeline, PipelineBuilder, PipelineOutput,
    PreprocessingExecutor, PreprocessingStage, ProgressReporter, ProgressUpdate, run,
};
pub use profiler::DataProfiler;
pub use scalers::NumericScaler;
pub use types::{
    ActionType, ColumnProfile, ColumnRole, ColumnRoles, DatasetProfile, PreprocessingAction,
    PreprocessingReport,
};
