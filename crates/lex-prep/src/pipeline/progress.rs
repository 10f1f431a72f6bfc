//! Progress reporting for the preprocessing pipeline.
//!
//! Each stage owns a fixed slice of the `[0, 1]` progress range. The executor
//! reports when a stage starts and when it has handled all of its columns;
//! reporting never affects the result.
//!
//! Any `Fn(ProgressUpdate) + Send + Sync` closure is a reporter:
//!
//! ```rust,ignore
//! let output = Pipeline::builder()
//!     .on_progress(|update| eprintln!("{:>3.0}% {}", update.progress * 100.0, update.message))
//!     .build()?
//!     .run(&df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the preprocessing pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStage {
    Validation,
    Imputation,
    Encoding,
    Scaling,
    Complete,
    Failed,
}

impl PreprocessingStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation => "Validating input",
            Self::Imputation => "Imputing missing values",
            Self::Encoding => "Encoding categories",
            Self::Scaling => "Scaling values",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Slice of overall progress covered by this stage, as `(start, end)`.
    ///
    /// Validation is cheap and gets a tenth; the three fitting stages split
    /// the rest evenly. Terminal stages are points.
    pub fn span(&self) -> (f32, f32) {
        match self {
            Self::Validation => (0.0, 0.1),
            Self::Imputation => (0.1, 0.4),
            Self::Encoding => (0.4, 0.7),
            Self::Scaling => (0.7, 1.0),
            Self::Complete => (1.0, 1.0),
            Self::Failed => (0.0, 0.0),
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PreprocessingStage,
    /// Overall progress (0.0 - 1.0).
    pub progress: f32,
    pub message: String,
    /// Columns the stage has handled so far.
    pub columns_done: usize,
    /// Columns the stage operates on.
    pub columns_total: usize,
}

impl ProgressUpdate {
    /// Update for `done` of `total` columns handled within `stage`.
    ///
    /// A stage with no columns counts as finished once `done == total`.
    pub fn columns(
        stage: PreprocessingStage,
        done: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let fraction = match (done, total) {
            (_, 0) => 1.0,
            (d, t) => (d.min(t)) as f32 / t as f32,
        };
        let (start, end) = stage.span();
        Self {
            stage,
            progress: (start + (end - start) * fraction).clamp(0.0, 1.0),
            message: message.into(),
            columns_done: done,
            columns_total: total,
        }
    }

    /// Update marking the start of `stage`.
    pub fn started(stage: PreprocessingStage, total: usize, message: impl Into<String>) -> Self {
        let mut update = Self::columns(stage, 0, total, message);
        update.progress = stage.span().0;
        update
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::columns(PreprocessingStage::Complete, 0, 0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::columns(PreprocessingStage::Failed, 0, 0, message)
    }
}

/// Receiver of progress updates.
///
/// Called a handful of times per stage from the thread running the pipeline;
/// implementations should return quickly.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
