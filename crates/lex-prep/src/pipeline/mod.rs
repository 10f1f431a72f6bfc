//! Pipeline module.
//!
//! This module provides the main preprocessing pipeline and related components.

mod builder;
mod executor;
mod fitted;
pub mod progress;
pub(crate) mod validation;

pub use builder::{Pipeline, PipelineBuilder, run};
pub use executor::{PipelineOutput, PreprocessingExecutor};
pub use fitted::FittedTransformers;
pub use progress::{PreprocessingStage, ProgressReporter, ProgressUpdate};
