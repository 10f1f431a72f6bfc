use crate::error::{PrepError, Result, ResultExt};
use crate::export::table::SerializedTable;
use crate::pipeline::{FittedTransformers, PipelineOutput};
use crate::types::PreprocessingReport;
use chrono::Local;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// A processed dataset bundled with the transformers that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingArtifact {
    /// RFC 3339 creation time.
    pub generated_at: String,
    pub dataset: SerializedTable,
    pub transformers: FittedTransformers,
    pub report: PreprocessingReport,
}

impl PreprocessingArtifact {
    pub fn new(output: &PipelineOutput) -> Result<Self> {
        Ok(Self {
            generated_at: Local::now().to_rfc3339(),
            dataset: SerializedTable::from_dataframe(&output.data)?,
            transformers: output.transformers.clone(),
            report: output.report.clone(),
        })
    }

    pub fn dataset(&self) -> Result<DataFrame> {
        self.dataset.to_dataframe()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)
            .map_err(PrepError::from)
            .context(format!("Failed to write artifact {}", path.display()))?;
        info!("Artifact saved: {}", path.display());
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(PrepError::from)
            .context(format!("Failed to read artifact {}", path.display()))?;
        Self::from_json(&json).context(format!("Invalid artifact {}", path.display()))
    }
}
